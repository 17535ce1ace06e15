use thiserror::Error;

use viewmodule_core::GraphError;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("view-model wiring error: {0}")]
    Graph(#[from] GraphError),

    #[error("invalid value for {flag}: {value}")]
    InvalidArgument { flag: &'static str, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument { .. } | Self::UnknownArgument(_) => 2,
            _ => 1,
        }
    }
}

/// Failure of the simulated greeting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("greeting service did not answer in time")]
pub struct GreetTimeout;
