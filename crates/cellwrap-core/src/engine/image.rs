use super::action::{Action, FrameOutcome};
use super::config::{ImageConfig, ImageOptions, TriclinicMode};
use super::error::{FrameSkip, ImageError};
use super::partition::{Entity, build_entities};
use super::progress::ProgressReporter;
use super::tasks::{EntityReference, ortho, triclinic};
use crate::core::geometry::cell::{BoxType, UnitCell};
use crate::core::geometry::center::{center_of_mass, geometric_center, total_mass};
use crate::core::models::frame::Frame;
use crate::core::models::topology::ProvidesTopology;
use nalgebra::Point3;
use tracing::{debug, info, instrument, warn};

const HELP: &str = "\
[origin] [center] [triclinic | familiar [com <mask>]] <mask>
  [ bymol | byres | byatom ] [xoffset <x>] [yoffset <y>] [zoffset <z>]
  origin    : center the box on (0,0,0) instead of the box center
  center    : use the center of mass of each unit instead of its first atom
  triclinic : force fractional-coordinate imaging even for orthogonal boxes
  familiar  : image into the truncated-octahedron shape
  com       : center the familiar shape on the center of <mask>
  <mask>    : only image units containing these atoms (default all)
  bymol/byres/byatom : image by molecule (default), residue or atom
  x/y/zoffset : shift imaged units by whole box vectors";

/// Per-topology state computed by [`ImageAction::setup`].
#[derive(Debug, Clone)]
struct ImageSetup {
    topology: String,
    atom_count: usize,
    entities: Vec<Entity>,
    masses: Vec<f64>,
    orthogonal: bool,
    com_atoms: Option<Vec<usize>>,
}

/// Re-images atoms into the primary periodic cell.
#[derive(Debug, Clone, Default)]
pub struct ImageAction {
    config: Option<ImageConfig>,
    setup: Option<ImageSetup>,
}

impl ImageAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips `init` for callers that already hold a validated configuration.
    pub fn with_config(config: ImageConfig) -> Self {
        Self {
            config: Some(config),
            setup: None,
        }
    }

    pub fn config(&self) -> Option<&ImageConfig> {
        self.config.as_ref()
    }

    /// Imaging units of the current topology, empty before `setup`.
    pub fn entities(&self) -> &[Entity] {
        match &self.setup {
            Some(setup) => &setup.entities,
            None => &[],
        }
    }

    /// Point the familiar shape is centered on for this frame.
    fn shape_center(
        config: &ImageConfig,
        setup: &ImageSetup,
        frame: &Frame,
        cell: &UnitCell,
    ) -> Point3<f64> {
        match &setup.com_atoms {
            Some(atoms) if total_mass(&setup.masses, atoms.iter().copied()) > 0.0 => {
                center_of_mass(&frame.coords, &setup.masses, atoms.iter().copied())
            }
            Some(atoms) => geometric_center(&frame.coords, atoms.iter().copied()),
            None if config.origin() => Point3::origin(),
            None => cell.center(),
        }
    }

    fn image_frame(
        config: &ImageConfig,
        setup: &ImageSetup,
        frame: &mut Frame,
    ) -> Result<(), FrameSkip> {
        if frame.atom_count() != setup.atom_count {
            return Err(FrameSkip::AtomCountMismatch {
                expected: setup.atom_count,
                found: frame.atom_count(),
            });
        }
        let reference = EntityReference {
            policy: config.reference_policy(),
            masses: &setup.masses,
        };

        if setup.orthogonal {
            return ortho::run(frame, config.origin(), config.offset(), &setup.entities, reference);
        }

        let cell = frame.cell.unit_cell()?;
        let shape_center = config
            .truncated_octahedron()
            .then(|| Self::shape_center(config, setup, frame, &cell));
        triclinic::run(
            frame,
            &cell,
            config.origin(),
            config.offset(),
            shape_center,
            &setup.entities,
            reference,
        );
        Ok(())
    }
}

impl Action for ImageAction {
    type Options = ImageOptions;
    type Error = ImageError;

    fn help(&self) -> &'static str {
        HELP
    }

    fn init(
        &mut self,
        options: ImageOptions,
        reporter: &ProgressReporter,
    ) -> Result<(), ImageError> {
        let config = options.into_config()?;
        for line in config.summary_lines() {
            info!("{}", line);
            reporter.message(line);
        }
        self.config = Some(config);
        self.setup = None;
        Ok(())
    }

    #[instrument(skip_all, name = "image_setup", fields(topology = topology.name()))]
    fn setup(
        &mut self,
        topology: &dyn ProvidesTopology,
        reporter: &ProgressReporter,
    ) -> Result<(), ImageError> {
        self.setup = None;
        let config = self.config.as_ref().ok_or(ImageError::NotReady("init"))?;
        let name = topology.name().to_string();

        let box_type = topology.box_type();
        if box_type == BoxType::None {
            return Err(ImageError::NoBox { topology: name });
        }
        let orthogonal = box_type == BoxType::Orthogonal && config.triclinic() == TriclinicMode::Off;
        if !orthogonal {
            if let Some(reference_box) = topology.reference_box() {
                reference_box.unit_cell().map_err(|source| ImageError::Cell {
                    topology: name.clone(),
                    source,
                })?;
            }
        }

        let selected = config.mask().select(topology);
        let entities = build_entities(topology, config.mode(), &selected);
        if entities.is_empty() {
            return Err(ImageError::NoAtomsSelected {
                topology: name,
                mask: config.mask().to_string(),
            });
        }

        let masses = topology.masses();
        if config.center() {
            if let Some(entity) = entities
                .iter()
                .find(|e| total_mass(&masses, e.atoms()) <= 0.0)
            {
                return Err(ImageError::ZeroMass {
                    topology: name,
                    first: entity.first + 1,
                    last: entity.last,
                });
            }
        }

        let com_atoms = match config.com_mask() {
            Some(mask) => {
                let atoms = mask.select(topology);
                if atoms.is_empty() {
                    return Err(ImageError::EmptyComMask {
                        topology: name,
                        mask: mask.to_string(),
                    });
                }
                reporter.message(format!("COM: mask [{}] contains {} atoms.", mask, atoms.len()));
                Some(atoms)
            }
            None => None,
        };

        info!(
            entities = entities.len(),
            orthogonal, "Imaging setup complete."
        );
        reporter.message(format!(
            "Number of {}s to be imaged is {}",
            config.mode(),
            entities.len()
        ));
        if box_type == BoxType::Orthogonal && !orthogonal {
            reporter.message("Imaging orthogonal box with triclinic code.");
        }
        for entity in &entities {
            debug!("First-Last atom#: {}", entity);
        }

        self.setup = Some(ImageSetup {
            topology: name,
            atom_count: topology.atom_count(),
            entities,
            masses,
            orthogonal,
            com_atoms,
        });
        Ok(())
    }

    fn do_action(
        &self,
        frame_index: usize,
        frame: &mut Frame,
        reporter: &ProgressReporter,
    ) -> FrameOutcome {
        let (Some(config), Some(setup)) = (&self.config, &self.setup) else {
            return FrameOutcome::Skipped(FrameSkip::NotReady);
        };
        match Self::image_frame(config, setup, frame) {
            Ok(()) => FrameOutcome::Modified,
            Err(reason) => {
                warn!(
                    topology = %setup.topology,
                    frame = frame_index + 1,
                    %reason,
                    "Frame was not imaged."
                );
                reporter.warning(format!("Frame {} imaging failed: {}.", frame_index + 1, reason));
                FrameOutcome::Skipped(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::cell::SimulationBox;
    use crate::core::models::topology::Topology;
    use crate::engine::config::ImageMode;
    use crate::engine::progress::Progress;
    use nalgebra::Vector3;
    use std::sync::Mutex;

    fn waters(n: usize, cell: SimulationBox) -> Topology {
        let mut builder = Topology::builder("waters");
        builder.reference_box(cell);
        for _ in 0..n {
            builder.begin_molecule();
            builder.add_residue("WAT").unwrap();
            builder.add_atom("O", 16.0).unwrap();
            builder.add_atom("H1", 1.0).unwrap();
            builder.add_atom("H2", 1.0).unwrap();
        }
        builder.build().unwrap()
    }

    fn water_at(x: f64, y: f64, z: f64) -> [Point3<f64>; 3] {
        [
            Point3::new(x, y, z),
            Point3::new(x + 0.8, y + 0.6, z),
            Point3::new(x - 0.8, y + 0.6, z),
        ]
    }

    fn scattered_waters() -> Vec<Point3<f64>> {
        [
            (17.0, 8.0, 12.0),
            (-6.0, 21.0, 3.0),
            (33.0, -4.0, 15.5),
            (9.0, 14.0, -11.0),
        ]
        .into_iter()
        .flat_map(|(x, y, z)| water_at(x, y, z))
        .collect()
    }

    /// `point` is at least as close to `anchor` as any of its 26 neighboring lattice images.
    fn assert_nearest_lattice_image(unit: &UnitCell, point: &Point3<f64>, anchor: &Point3<f64>) {
        let best = (-1..=1)
            .flat_map(|i| (-1..=1).flat_map(move |j| (-1..=1).map(move |k| (i, j, k))))
            .map(|(i, j, k)| {
                let shift = unit.to_cartesian(&Vector3::new(i as f64, j as f64, k as f64));
                (point + shift - anchor).norm()
            })
            .fold(f64::INFINITY, f64::min);
        assert!(
            ((point - anchor).norm() - best).abs() < 1e-9,
            "{point:?} is not the nearest image to {anchor:?}"
        );
    }

    fn ready(options: ImageOptions, topology: &Topology) -> ImageAction {
        let reporter = ProgressReporter::new();
        let mut action = ImageAction::new();
        action.init(options, &reporter).unwrap();
        action.setup(topology, &reporter).unwrap();
        action
    }

    #[test]
    fn help_lists_every_option() {
        let help = ImageAction::new().help();
        for word in ["origin", "center", "familiar", "com", "byres", "zoffset"] {
            assert!(help.contains(word), "missing {word}");
        }
    }

    #[test]
    fn images_waters_by_molecule() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(2, cell);
        let action = ready(ImageOptions::default(), &top);
        assert_eq!(action.entities().len(), 2);

        let mut coords = water_at(25.0, 5.0, 5.0).to_vec();
        coords.extend(water_at(-3.0, 10.0, 41.0));
        let mut frame = Frame::new(coords.clone(), cell);

        let outcome = action.do_action(0, &mut frame, &ProgressReporter::new());
        assert_eq!(outcome, FrameOutcome::Modified);
        for i in 0..3 {
            let first = frame.coords[i] - coords[i];
            let second = frame.coords[i + 3] - coords[i + 3];
            assert!((first - Vector3::new(-20.0, 0.0, 0.0)).norm() < 1e-12);
            assert!((second - Vector3::new(20.0, 0.0, -40.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn mask_limits_which_molecules_move() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(2, cell);
        let options = ImageOptions {
            mask: Some("^2".into()),
            ..Default::default()
        };
        let action = ready(options, &top);

        let mut coords = water_at(25.0, 5.0, 5.0).to_vec();
        coords.extend(water_at(25.0, 5.0, 5.0));
        let mut frame = Frame::new(coords.clone(), cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());
        assert_eq!(&frame.coords[..3], &coords[..3]);
        assert_eq!(frame.coords[3].x, 5.0);
    }

    #[test]
    fn by_atom_breaks_molecules_apart() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(1, cell);
        let options = ImageOptions {
            mode: ImageMode::ByAtom,
            center: true,
            ..Default::default()
        };
        let action = ready(options, &top);
        assert!(!action.config().unwrap().center());

        let mut frame = Frame::new(water_at(19.5, 5.0, 5.0).to_vec(), cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());
        assert_eq!(frame.coords[0].x, 19.5);
        assert!((frame.coords[1].x - 0.3).abs() < 1e-12);
        assert!((frame.coords[2].x - 18.7).abs() < 1e-12);
    }

    #[test]
    fn forced_triclinic_on_orthogonal_box_matches_orthogonal_path() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(2, cell);
        let mut coords = water_at(25.0, -5.0, 5.0).to_vec();
        coords.extend(water_at(-13.0, 10.0, 41.0));

        let ortho = ready(ImageOptions::default(), &top);
        let forced = ready(
            ImageOptions {
                triclinic: TriclinicMode::Force,
                ..Default::default()
            },
            &top,
        );
        let mut a = Frame::new(coords.clone(), cell);
        let mut b = Frame::new(coords, cell);
        ortho.do_action(0, &mut a, &ProgressReporter::new());
        forced.do_action(0, &mut b, &ProgressReporter::new());
        for (p, q) in a.coords.iter().zip(&b.coords) {
            assert!((p - q).norm() < 1e-9);
        }
    }

    #[test]
    fn familiar_mode_uses_com_mask_as_shape_center() {
        let cell = SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]);
        let top = waters(2, cell);
        let options = ImageOptions {
            triclinic: TriclinicMode::Familiar,
            com: Some("^1".into()),
            ..Default::default()
        };
        let action = ready(options, &top);

        let mut coords = water_at(1.0, 1.0, 1.0).to_vec();
        coords.extend(water_at(17.0, 8.0, 12.0));
        let mut frame = Frame::new(coords, cell);
        assert_eq!(action.do_action(0, &mut frame, &ProgressReporter::new()), FrameOutcome::Modified);

        let unit = cell.unit_cell().unwrap();
        let masses = top.masses();
        let anchor = triclinic::wrap_point(&unit, false, &center_of_mass(&frame.coords, &masses, 0..3));
        assert_nearest_lattice_image(&unit, &frame.coords[3], &anchor);
    }

    #[test]
    fn familiar_mode_without_com_centers_on_the_cell_center() {
        let cell = SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]);
        let top = waters(4, cell);
        let options = ImageOptions {
            triclinic: TriclinicMode::Familiar,
            ..Default::default()
        };
        let action = ready(options, &top);

        let mut frame = Frame::new(scattered_waters(), cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());

        let unit = cell.unit_cell().unwrap();
        for oxygen in [0, 3, 6, 9] {
            assert_nearest_lattice_image(&unit, &frame.coords[oxygen], &unit.center());
        }
    }

    #[test]
    fn familiar_mode_without_com_centers_on_the_origin_when_requested() {
        let cell = SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]);
        let top = waters(4, cell);
        let options = ImageOptions {
            triclinic: TriclinicMode::Familiar,
            origin: true,
            ..Default::default()
        };
        let action = ready(options, &top);

        let mut frame = Frame::new(scattered_waters(), cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());

        let unit = cell.unit_cell().unwrap();
        for oxygen in [0, 3, 6, 9] {
            assert_nearest_lattice_image(&unit, &frame.coords[oxygen], &Point3::origin());
        }
    }

    #[test]
    fn massless_com_mask_falls_back_to_geometric_center() {
        let cell = SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]);
        let mut builder = Topology::builder("waters+sites");
        builder.reference_box(cell);
        for _ in 0..4 {
            builder.begin_molecule();
            builder.add_residue("WAT").unwrap();
            builder.add_atom("O", 16.0).unwrap();
            builder.add_atom("H1", 1.0).unwrap();
            builder.add_atom("H2", 1.0).unwrap();
        }
        builder.begin_molecule();
        builder.add_residue("EP").unwrap();
        builder.add_atom("EP1", 0.0).unwrap();
        builder.add_atom("EP2", 0.0).unwrap();
        let top = builder.build().unwrap();

        let options = ImageOptions {
            triclinic: TriclinicMode::Familiar,
            com: Some(":EP".into()),
            mask: Some(":WAT".into()),
            ..Default::default()
        };
        let action = ready(options, &top);

        let mut coords = scattered_waters();
        coords.push(Point3::new(4.0, 3.0, 2.0));
        coords.push(Point3::new(6.0, 5.0, 4.0));
        let mut frame = Frame::new(coords, cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());

        // Sites are outside the imaging mask and stay where they were.
        assert_eq!(frame.coords[12], Point3::new(4.0, 3.0, 2.0));
        assert_eq!(frame.coords[13], Point3::new(6.0, 5.0, 4.0));

        let unit = cell.unit_cell().unwrap();
        let anchor = triclinic::wrap_point(&unit, false, &Point3::new(5.0, 4.0, 3.0));
        for oxygen in [0, 3, 6, 9] {
            assert_nearest_lattice_image(&unit, &frame.coords[oxygen], &anchor);
        }
    }

    #[test]
    fn zero_length_frame_box_is_skipped_and_reported() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(1, cell);
        let action = ready(ImageOptions::default(), &top);

        let coords = water_at(25.0, 25.0, 25.0).to_vec();
        let mut frame = Frame::new(coords.clone(), SimulationBox::orthogonal([0.0, 10.0, 10.0]));
        let warnings = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
            if let Progress::Warning(text) = event {
                warnings.lock().unwrap().push(text);
            }
        }));

        let outcome = action.do_action(4, &mut frame, &reporter);
        assert_eq!(outcome, FrameOutcome::Skipped(FrameSkip::ZeroBoxLength));
        assert_eq!(frame.coords, coords);
        drop(reporter);
        let warnings = warnings.into_inner().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Frame 5 imaging failed"));
    }

    #[test]
    fn singular_triclinic_frame_is_skipped() {
        let cell = SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]);
        let top = waters(1, cell);
        let action = ready(ImageOptions::default(), &top);
        let mut frame = Frame::new(
            water_at(25.0, 1.0, 1.0).to_vec(),
            SimulationBox::new([20.0, 20.0, 20.0], [170.0, 10.0, 90.0]),
        );
        let outcome = action.do_action(0, &mut frame, &ProgressReporter::new());
        assert!(matches!(outcome, FrameOutcome::Skipped(FrameSkip::Cell(_))));
    }

    #[test]
    fn atom_count_mismatch_is_skipped() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let action = ready(ImageOptions::default(), &waters(2, cell));
        let mut frame = Frame::new(water_at(25.0, 0.0, 0.0).to_vec(), cell);
        assert_eq!(
            action.do_action(0, &mut frame, &ProgressReporter::new()),
            FrameOutcome::Skipped(FrameSkip::AtomCountMismatch {
                expected: 6,
                found: 3
            })
        );
    }

    #[test]
    fn setup_rejects_topology_without_box() {
        let top = waters(1, SimulationBox::none());
        let mut action = ImageAction::new();
        let reporter = ProgressReporter::new();
        action.init(ImageOptions::default(), &reporter).unwrap();
        let err = action.setup(&top, &reporter).unwrap_err();
        assert!(matches!(err, ImageError::NoBox { .. }));
        assert!(action.entities().is_empty());
    }

    #[test]
    fn setup_rejects_empty_selection_and_empty_com_mask() {
        let top = waters(1, SimulationBox::new([20.0, 20.0, 20.0], [60.0, 60.0, 60.0]));
        let reporter = ProgressReporter::new();

        let mut action = ImageAction::new();
        action
            .init(
                ImageOptions {
                    mask: Some(":LIG".into()),
                    ..Default::default()
                },
                &reporter,
            )
            .unwrap();
        assert!(matches!(
            action.setup(&top, &reporter),
            Err(ImageError::NoAtomsSelected { .. })
        ));

        let mut action = ImageAction::new();
        action
            .init(
                ImageOptions {
                    triclinic: TriclinicMode::Familiar,
                    com: Some(":LIG".into()),
                    ..Default::default()
                },
                &reporter,
            )
            .unwrap();
        assert!(matches!(
            action.setup(&top, &reporter),
            Err(ImageError::EmptyComMask { .. })
        ));
    }

    #[test]
    fn setup_rejects_massless_units_when_centering() {
        let mut builder = Topology::builder("dummy");
        builder.reference_box(SimulationBox::orthogonal([20.0, 20.0, 20.0]));
        builder.begin_molecule();
        builder.add_residue("EP").unwrap();
        builder.add_atom("EP1", 0.0).unwrap();
        builder.add_atom("EP2", 0.0).unwrap();
        let top = builder.build().unwrap();

        let reporter = ProgressReporter::new();
        let mut action = ImageAction::new();
        action
            .init(
                ImageOptions {
                    center: true,
                    ..Default::default()
                },
                &reporter,
            )
            .unwrap();
        let err = action.setup(&top, &reporter).unwrap_err();
        assert!(matches!(err, ImageError::ZeroMass { first: 1, last: 2, .. }));
    }

    #[test]
    fn setup_rejects_unusable_reference_cell_on_triclinic_path() {
        let top = waters(1, SimulationBox::new([20.0, 20.0, 20.0], [170.0, 10.0, 90.0]));
        let reporter = ProgressReporter::new();
        let mut action = ImageAction::new();
        action.init(ImageOptions::default(), &reporter).unwrap();
        assert!(matches!(
            action.setup(&top, &reporter),
            Err(ImageError::Cell { .. })
        ));
    }

    #[test]
    fn action_must_be_initialized_and_set_up() {
        let top = waters(1, SimulationBox::orthogonal([20.0, 20.0, 20.0]));
        let mut action = ImageAction::new();
        let reporter = ProgressReporter::new();
        assert!(matches!(
            action.setup(&top, &reporter),
            Err(ImageError::NotReady("init"))
        ));

        let mut frame = Frame::new(water_at(0.0, 0.0, 0.0).to_vec(), SimulationBox::orthogonal([20.0; 3]));
        assert_eq!(
            action.do_action(0, &mut frame, &reporter),
            FrameOutcome::Skipped(FrameSkip::NotReady)
        );
    }

    #[test]
    fn init_reports_configuration_and_setup_reports_unit_count() {
        let top = waters(3, SimulationBox::orthogonal([20.0, 20.0, 20.0]));
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));
        let mut action = ImageAction::new();
        action.init(ImageOptions::default(), &reporter).unwrap();
        action.setup(&top, &reporter).unwrap();
        drop(reporter);

        let messages = messages.into_inner().unwrap();
        assert_eq!(
            messages,
            vec![
                "IMAGE: By molecule to box center based on first atom position using all atoms"
                    .to_string(),
                "Number of molecules to be imaged is 3".to_string(),
            ]
        );
    }

    #[test]
    fn prebuilt_config_skips_init() {
        let cell = SimulationBox::orthogonal([20.0, 20.0, 20.0]);
        let top = waters(1, cell);
        let config = ImageConfig::builder().origin(true).build().unwrap();
        let mut action = ImageAction::with_config(config);
        action.setup(&top, &ProgressReporter::new()).unwrap();

        let mut frame = Frame::new(water_at(12.0, 0.0, 0.0).to_vec(), cell);
        action.do_action(0, &mut frame, &ProgressReporter::new());
        assert_eq!(frame.coords[0].x, -8.0);
    }

    #[test]
    fn invalid_options_fail_init() {
        let mut action = ImageAction::new();
        let err = action
            .init(
                ImageOptions {
                    mask: Some(":1-".into()),
                    ..Default::default()
                },
                &ProgressReporter::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ImageError::Config(_)));
    }
}
