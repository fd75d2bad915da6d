use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("invalid symbol constraints: {0}")]
    InvalidConstraints(String),
    #[error("invalid sizing input: {0}")]
    InvalidInput(String),
}
