use crate::core::geometry::center::ReferencePolicy;
use crate::core::selection::{AtomMask, SelectionError};
use nalgebra::Vector3;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid mask for '{option}': {source}")]
    Mask {
        option: &'static str,
        #[source]
        source: SelectionError,
    },

    #[error("Offset along {axis} must be finite, got {value}")]
    NonFiniteOffset { axis: char, value: f64 },

    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Granularity at which atoms are grouped into rigid imaging units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageMode {
    #[default]
    #[serde(alias = "bymol")]
    ByMolecule,
    #[serde(alias = "byres")]
    ByResidue,
    #[serde(alias = "byatom")]
    ByAtom,
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ImageMode::ByMolecule => "molecule",
                ImageMode::ByResidue => "residue",
                ImageMode::ByAtom => "atom",
            }
        )
    }
}

/// Whether the fractional-coordinate path is used and whether the result is
/// reshaped into the truncated-octahedron form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriclinicMode {
    /// Orthogonal boxes take the axis-aligned path.
    #[default]
    Off,
    /// Always use the fractional-coordinate path.
    Force,
    /// Fractional-coordinate path plus truncated-octahedron shaping.
    Familiar,
}

/// User-facing imaging options, as read from a TOML table or assembled by a host program.
///
/// ```toml
/// mode = "by-residue"
/// origin = true
/// center = true
/// triclinic = "familiar"
/// com = ":1-120"
/// mask = "!:NA,CL"
/// z-offset = 1.0
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ImageOptions {
    pub mode: ImageMode,
    pub origin: bool,
    pub center: bool,
    pub triclinic: TriclinicMode,
    pub com: Option<String>,
    pub mask: Option<String>,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
}

impl ImageOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: "<inline>".to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading imaging options from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    pub fn into_builder(self) -> ImageConfigBuilder {
        let mut builder = ImageConfigBuilder::new()
            .mode(self.mode)
            .origin(self.origin)
            .center(self.center)
            .triclinic(self.triclinic)
            .offset([self.x_offset, self.y_offset, self.z_offset]);
        if let Some(mask) = self.mask {
            builder = builder.mask(mask);
        }
        if let Some(com) = self.com {
            builder = builder.com_mask(com);
        }
        builder
    }

    pub fn into_config(self) -> Result<ImageConfig, ConfigError> {
        self.into_builder().build()
    }
}

/// Validated, immutable imaging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig {
    mode: ImageMode,
    origin: bool,
    center: bool,
    triclinic: TriclinicMode,
    offset: Vector3<f64>,
    mask: AtomMask,
    com_mask: Option<AtomMask>,
}

impl ImageConfig {
    pub fn builder() -> ImageConfigBuilder {
        ImageConfigBuilder::new()
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    /// Cell centered on the world origin rather than spanning `[0, L)`.
    pub fn origin(&self) -> bool {
        self.origin
    }

    /// Entities are referenced by center of mass. Always false for [`ImageMode::ByAtom`].
    pub fn center(&self) -> bool {
        self.center
    }

    pub fn triclinic(&self) -> TriclinicMode {
        self.triclinic
    }

    pub fn truncated_octahedron(&self) -> bool {
        self.triclinic == TriclinicMode::Familiar
    }

    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    pub fn mask(&self) -> &AtomMask {
        &self.mask
    }

    /// Mask whose center anchors the truncated-octahedron shape. Only present
    /// together with [`TriclinicMode::Familiar`].
    pub fn com_mask(&self) -> Option<&AtomMask> {
        self.com_mask.as_ref()
    }

    pub fn reference_policy(&self) -> ReferencePolicy {
        if self.center {
            ReferencePolicy::CenterOfMass
        } else {
            ReferencePolicy::FirstAtom
        }
    }

    /// Human-readable description of the configuration, one line per aspect.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut first = format!(
            "IMAGE: By {} to {}",
            self.mode,
            if self.origin { "origin" } else { "box center" }
        );
        if self.mode != ImageMode::ByAtom {
            first.push_str(if self.center {
                " based on center of mass"
            } else {
                " based on first atom position"
            });
        }
        if self.mask.selects_all() {
            first.push_str(" using all atoms");
        } else {
            first.push_str(&format!(" using atoms in mask {}", self.mask));
        }

        let mut lines = vec![first];
        match self.triclinic {
            TriclinicMode::Off => {}
            TriclinicMode::Force => lines.push("Triclinic On.".to_string()),
            TriclinicMode::Familiar => {
                let mut line = "Triclinic On, familiar shape".to_string();
                if let Some(com) = &self.com_mask {
                    line.push_str(&format!(" centering on atoms in mask {com}"));
                }
                line.push('.');
                lines.push(line);
            }
        }
        if self.offset != Vector3::zeros() {
            lines.push(format!(
                "Offsetting unit cells by factors X={}, Y={}, Z={}",
                self.offset.x, self.offset.y, self.offset.z
            ));
        }
        lines
    }
}

#[derive(Debug, Default)]
pub struct ImageConfigBuilder {
    mode: Option<ImageMode>,
    origin: bool,
    center: bool,
    triclinic: Option<TriclinicMode>,
    offset: [f64; 3],
    mask: Option<String>,
    com_mask: Option<String>,
}

impl ImageConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ImageMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn origin(mut self, origin: bool) -> Self {
        self.origin = origin;
        self
    }
    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }
    pub fn triclinic(mut self, mode: TriclinicMode) -> Self {
        self.triclinic = Some(mode);
        self
    }
    pub fn offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }
    pub fn mask(mut self, expression: impl Into<String>) -> Self {
        self.mask = Some(expression.into());
        self
    }
    pub fn com_mask(mut self, expression: impl Into<String>) -> Self {
        self.com_mask = Some(expression.into());
        self
    }

    pub fn build(self) -> Result<ImageConfig, ConfigError> {
        for (axis, value) in ['x', 'y', 'z'].into_iter().zip(self.offset) {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteOffset { axis, value });
            }
        }

        let mode = self.mode.unwrap_or_default();
        let triclinic = self.triclinic.unwrap_or_default();

        let center = if mode == ImageMode::ByAtom && self.center {
            debug!("Centering is meaningless when imaging by atom; using atom positions.");
            false
        } else {
            self.center
        };

        let mask = match self.mask.as_deref() {
            Some(expression) => AtomMask::parse(expression)
                .map_err(|source| ConfigError::Mask { option: "mask", source })?,
            None => AtomMask::all(),
        };

        let com_mask = match self.com_mask {
            Some(expression) if triclinic == TriclinicMode::Familiar => Some(
                AtomMask::parse(&expression)
                    .map_err(|source| ConfigError::Mask { option: "com", source })?,
            ),
            Some(expression) => {
                warn!(
                    "Ignoring com mask '{}': it only applies to the familiar triclinic mode.",
                    expression
                );
                None
            }
            None => None,
        };

        Ok(ImageConfig {
            mode,
            origin: self.origin,
            center,
            triclinic,
            offset: Vector3::from(self.offset),
            mask,
            com_mask,
        })
    }
}
