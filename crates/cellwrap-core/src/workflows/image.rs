use crate::core::models::frame::Frame;
use crate::core::models::topology::ProvidesTopology;
use crate::engine::action::{Action, FrameOutcome};
use crate::engine::config::ImageOptions;
use crate::engine::error::{FrameSkip, ImageError};
use crate::engine::image::ImageAction;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Consecutive frames that share one topology.
pub struct TrajectorySegment<'a> {
    pub topology: &'a dyn ProvidesTopology,
    pub frames: &'a mut [Frame],
}

impl<'a> TrajectorySegment<'a> {
    pub fn new(topology: &'a dyn ProvidesTopology, frames: &'a mut [Frame]) -> Self {
        Self { topology, frames }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSummary {
    pub frames_imaged: usize,
    /// Zero-based trajectory frame numbers that were left untouched, with the reason.
    pub skipped_frames: Vec<(usize, FrameSkip)>,
    /// Topologies whose frames were passed through because setup failed.
    pub skipped_topologies: Vec<String>,
}

/// Re-images every frame of every segment.
///
/// Invalid options abort the run. A topology that cannot be imaged is reported
/// and its frames are passed through unchanged.
#[instrument(skip_all, name = "image_workflow")]
pub fn run(
    segments: &mut [TrajectorySegment<'_>],
    options: ImageOptions,
    reporter: &ProgressReporter,
) -> Result<ImageSummary, ImageError> {
    reporter.report(Progress::PhaseStart {
        name: "Initialization",
    });
    let mut action = ImageAction::new();
    action.init(options, reporter)?;
    reporter.report(Progress::PhaseFinish);

    let mut summary = ImageSummary::default();
    let mut first_frame = 0;

    for segment in segments.iter_mut() {
        let frame_count = segment.frames.len();
        reporter.report(Progress::PhaseStart { name: "Imaging" });

        match action.setup(segment.topology, reporter) {
            Ok(()) => {
                let outcomes = image_frames(&action, segment.frames, first_frame, reporter);
                for (index, outcome) in outcomes.into_iter().enumerate() {
                    match outcome {
                        FrameOutcome::Modified => summary.frames_imaged += 1,
                        FrameOutcome::Skipped(reason) => {
                            summary.skipped_frames.push((first_frame + index, reason))
                        }
                    }
                }
            }
            Err(err) if err.is_topology_error() => {
                warn!(topology = segment.topology.name(), error = %err, "Skipping topology.");
                reporter.warning(format!(
                    "Skipping {} frame(s) of topology '{}': {}",
                    frame_count,
                    segment.topology.name(),
                    err
                ));
                summary
                    .skipped_topologies
                    .push(segment.topology.name().to_string());
            }
            Err(err) => return Err(err),
        }

        reporter.report(Progress::PhaseFinish);
        first_frame += frame_count;
    }

    info!(
        imaged = summary.frames_imaged,
        skipped = summary.skipped_frames.len(),
        "Imaging complete."
    );
    Ok(summary)
}

/// Convenience wrapper for a trajectory with a single topology.
pub fn run_single(
    topology: &dyn ProvidesTopology,
    frames: &mut [Frame],
    options: ImageOptions,
    reporter: &ProgressReporter,
) -> Result<ImageSummary, ImageError> {
    run(&mut [TrajectorySegment::new(topology, frames)], options, reporter)
}

fn image_frames(
    action: &ImageAction,
    frames: &mut [Frame],
    first_frame: usize,
    reporter: &ProgressReporter,
) -> Vec<FrameOutcome> {
    reporter.report(Progress::TaskStart {
        total_steps: frames.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = frames.iter_mut().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = frames.par_iter_mut().enumerate();

    let outcomes = iterator
        .map(|(index, frame)| {
            let outcome = action.do_action(first_frame + index, frame, reporter);
            reporter.report(Progress::TaskIncrement);
            outcome
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    outcomes
}
