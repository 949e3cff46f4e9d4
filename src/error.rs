use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymregError {
    #[error("Invalid construction method: {0}")]
    InvalidMethod(String),

    #[error("Invalid arity {arity} for function {symbol}")]
    InvalidArity { symbol: String, arity: usize },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Unknown input variable: {0}")]
    UnknownInput(String),

    #[error("Dataset shape mismatch: {0}")]
    DatasetShapeMismatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, SymregError>;
