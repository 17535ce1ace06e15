#![forbid(unsafe_code)]

//! Failures raised by async command actions.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::cancel::Cancelled;

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// A failure of an async command's action.
///
/// Any `std::error::Error` converts into a fault, so actions can use `?`
/// freely. A fault wrapping [`Cancelled`] is the cancellation signal, not a
/// real failure: the command absorbs it silently.
pub struct CommandFault {
    error: Box<dyn StdError + 'static>,
}

impl CommandFault {
    /// Fault carrying only a message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            error: Box::new(MessageError(message.into())),
        }
    }

    /// The cancellation signal as a fault value.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::from(Cancelled)
    }

    /// Whether this is the cancellation signal rather than a failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.error.is::<Cancelled>()
    }

    /// The underlying error.
    #[must_use]
    pub fn error(&self) -> &(dyn StdError + 'static) {
        self.error.as_ref()
    }

    /// Attempt to view the underlying error as `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::msg(format!("action panicked: {detail}"))
    }
}

impl<E: StdError + 'static> From<E> for CommandFault {
    fn from(error: E) -> Self {
        Self {
            error: Box::new(error),
        }
    }
}

impl fmt::Display for CommandFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl fmt::Debug for CommandFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandFault").field(&self.error).finish()
    }
}
