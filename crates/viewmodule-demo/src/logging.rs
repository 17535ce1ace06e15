//! Tracing initialisation for the demo binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{DemoError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. With `json`
/// every event is one JSON line.
///
/// # Errors
///
/// [`DemoError::Logging`] if `default_level` is not a valid directive or a
/// global subscriber is already installed.
pub fn init(json: bool, default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level).map_err(|err| DemoError::Logging {
            message: err.to_string(),
        })?,
    };

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
    };
    installed.map_err(|err| DemoError::Logging {
        message: err.to_string(),
    })
}
