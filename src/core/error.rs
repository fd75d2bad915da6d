use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// Gateway or symbol unavailable at startup. The loop never started.
    #[error("initialization failed: {0}")]
    Initialization(String),
    #[error("controller is already running")]
    AlreadyRunning,
    #[error("controller task failed: {0}")]
    Task(String),
}
