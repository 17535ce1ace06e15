#![forbid(unsafe_code)]

//! Demo: a hello-world form built on `viewmodule-core`.

pub mod cli;
pub mod error;
pub mod hello_world;
pub mod logging;
pub mod session;

pub use error::{DemoError, GreetTimeout, Result};
pub use hello_world::{GreetSettings, HelloWorldViewModel};
pub use session::SessionReport;
