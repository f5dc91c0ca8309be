use super::error::FrameSkip;
use super::progress::ProgressReporter;
use crate::core::models::frame::Frame;
use crate::core::models::topology::ProvidesTopology;

/// Result of applying an action to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Modified,
    Skipped(FrameSkip),
}

/// A trajectory transformation driven through four stages.
///
/// `init` validates options once per run, `setup` prepares per-topology state and
/// may be called again whenever the topology changes, and `do_action` is applied
/// to every frame. `do_action` only borrows the action, so frames of one topology
/// can be processed concurrently.
pub trait Action {
    type Options;
    type Error: std::error::Error;

    /// Usage text listing the accepted options.
    fn help(&self) -> &'static str;

    fn init(
        &mut self,
        options: Self::Options,
        reporter: &ProgressReporter,
    ) -> Result<(), Self::Error>;

    fn setup(
        &mut self,
        topology: &dyn ProvidesTopology,
        reporter: &ProgressReporter,
    ) -> Result<(), Self::Error>;

    /// `frame_index` is zero-based and only used for diagnostics.
    fn do_action(
        &self,
        frame_index: usize,
        frame: &mut Frame,
        reporter: &ProgressReporter,
    ) -> FrameOutcome;
}
