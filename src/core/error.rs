//! Error types for the volatility tool

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolToolError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type VolToolResult<T> = Result<T, VolToolError>;

impl VolToolError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for VolToolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
