//! Progress/status sink consumed by the Data Store

/// Raised by a sink to abort the running operation at the next table boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Implemented by the caller (typically a UI polling a background job)
pub trait StatusSink {
    /// Announce a top-level task
    fn init_task(&mut self, name: &str);

    /// Number of `start_task` stages that will follow
    fn set_num_stages(&mut self, stages: usize);

    /// Announce one stage (table + step) of the current task
    fn start_task(&mut self, name: &str);

    /// Checked between tables, never mid-table
    fn check_for_cancellation(&mut self) -> Result<(), Cancelled>;
}

/// Sink that reports nothing and never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn init_task(&mut self, _name: &str) {}

    fn set_num_stages(&mut self, _stages: usize) {}

    fn start_task(&mut self, _name: &str) {}

    fn check_for_cancellation(&mut self) -> Result<(), Cancelled> {
        Ok(())
    }
}
