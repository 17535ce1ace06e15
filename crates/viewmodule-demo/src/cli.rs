#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually. Supports environment variable overrides via the
//! `VIEWMODULE_DEMO_*` prefix; explicit flags win over the environment.

use std::env;
use std::process;
use std::time::Duration;

use crate::error::{DemoError, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
viewmodule demo: a scripted hello-world session

USAGE:
    viewmodule-demo [OPTIONS]

OPTIONS:
    --first=NAME           First name to enter (default: keep \"Anton\")
    --last=NAME            Last name to enter (default: keep \"Tcholakov\")
    --delay-ms=N           How long the greeting takes, in ms (default: 2000)
    --cancel-after-ms=N    Run a second greeting and cancel it after N ms
    --fail                 Make the greeting service fail
    --log-level=LEVEL      Default log level when RUST_LOG is unset (default: info)
    --log-json             Emit logs as JSON lines
    --help, -h             Show this help message
    --version, -V          Show version

ENVIRONMENT VARIABLES:
    VIEWMODULE_DEMO_FIRST            Override --first
    VIEWMODULE_DEMO_LAST             Override --last
    VIEWMODULE_DEMO_DELAY_MS         Override --delay-ms
    VIEWMODULE_DEMO_CANCEL_AFTER_MS  Override --cancel-after-ms
    VIEWMODULE_DEMO_FAIL             Override --fail (1/true to enable)
    VIEWMODULE_DEMO_LOG_JSON         Override --log-json (1/true to enable)
    RUST_LOG                         Log filter directives";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// First name to enter before greeting.
    pub first: Option<String>,
    /// Last name to enter before greeting.
    pub last: Option<String>,
    /// Simulated duration of the greeting.
    pub delay_ms: u64,
    /// Cancel a second greeting after this many milliseconds.
    pub cancel_after_ms: Option<u64>,
    /// Make the greeting service fail.
    pub fail: bool,
    /// Default log level.
    pub log_level: String,
    /// JSON log output.
    pub log_json: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            first: None,
            last: None,
            delay_ms: 2000,
            cancel_after_ms: None,
            fail: false,
            log_level: "info".into(),
            log_json: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

fn flag_enabled(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn number(flag: &'static str, val: &str) -> Result<u64> {
    val.parse().map_err(|_| DemoError::InvalidArgument {
        flag,
        value: val.to_string(),
    })
}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version` or a usage error.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("viewmodule-demo {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(i32::from(err.exit_code()));
            }
        }
    }

    /// Parse `args` with `env` as the environment lookup.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags. A malformed environment value is
    /// ignored; a malformed flag is an error.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed> {
        let mut opts = Self::default();

        if let Some(val) = env("VIEWMODULE_DEMO_FIRST") {
            opts.first = Some(val);
        }
        if let Some(val) = env("VIEWMODULE_DEMO_LAST") {
            opts.last = Some(val);
        }
        if let Some(val) = env("VIEWMODULE_DEMO_DELAY_MS")
            && let Ok(n) = val.parse()
        {
            opts.delay_ms = n;
        }
        if let Some(val) = env("VIEWMODULE_DEMO_CANCEL_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.cancel_after_ms = Some(n);
        }
        if let Some(val) = env("VIEWMODULE_DEMO_FAIL") {
            opts.fail = flag_enabled(&val);
        }
        if let Some(val) = env("VIEWMODULE_DEMO_LOG_JSON") {
            opts.log_json = flag_enabled(&val);
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--fail" => opts.fail = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--first=") {
                        opts.first = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--last=") {
                        opts.last = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--delay-ms=") {
                        opts.delay_ms = number("--delay-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--cancel-after-ms=") {
                        opts.cancel_after_ms = Some(number("--cancel-after-ms", val)?);
                    } else if let Some(val) = other.strip_prefix("--log-level=") {
                        opts.log_level = val.to_string();
                    } else {
                        return Err(DemoError::UnknownArgument(other.to_string()));
                    }
                }
            }
        }

        Ok(Parsed::Run(opts))
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    #[must_use]
    pub fn cancel_after(&self) -> Option<Duration> {
        self.cancel_after_ms.map(Duration::from_millis)
    }
}
