#![forbid(unsafe_code)]

//! Immutable, composable validators.
//!
//! A [`Validator<T>`] is a persistent list of steps. Each step inspects a value
//! and returns zero or more error messages. Steps run in order and the chain
//! stops at the first step that reports errors, so
//! `not_blank().then(not_equal("Foo"))` never compares a blank string against
//! `"Foo"`.
//!
//! Validators are `Clone + Send + Sync`: combinators return new validators and
//! never touch the ones they were built from, so one validator can be shared by
//! any number of view-models.

use std::fmt;
use std::sync::Arc;

type Step<T> = Arc<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// A short-circuiting chain of validation steps.
pub struct Validator<T: ?Sized> {
    steps: Arc<[Step<T>]>,
}

impl<T: ?Sized> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl<T: ?Sized + 'static> Validator<T> {
    /// A validator that accepts everything.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            steps: Arc::from(Vec::new()),
        }
    }

    /// Single step from an arbitrary error-producing function.
    pub fn custom(step: impl Fn(&T) -> Vec<String> + Send + Sync + 'static) -> Self {
        let step: Step<T> = Arc::new(step);
        Self {
            steps: Arc::from(vec![step]),
        }
    }

    /// Single step that fails with `message` when `predicate` is false.
    pub fn rule(
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self::custom(move |value| {
            if predicate(value) {
                Vec::new()
            } else {
                vec![message.clone()]
            }
        })
    }

    /// Append `next`; it only runs when every step of `self` passed.
    #[must_use]
    pub fn then(&self, next: Validator<T>) -> Self {
        let steps: Vec<Step<T>> = self
            .steps
            .iter()
            .chain(next.steps.iter())
            .cloned()
            .collect();
        Self {
            steps: Arc::from(steps),
        }
    }

    /// Shorthand for `self.then(Validator::rule(predicate, message))`.
    #[must_use]
    pub fn then_check(
        &self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.then(Validator::rule(predicate, message))
    }

    /// Collapse the chain into one step reporting only `message` on failure.
    #[must_use]
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        let inner = self.clone();
        let message = message.into();
        Self::custom(move |value| {
            if inner.is_valid(value) {
                Vec::new()
            } else {
                vec![message.clone()]
            }
        })
    }

    /// Errors of the first failing step, or empty when all pass.
    #[must_use]
    pub fn validate(&self, value: &T) -> Vec<String> {
        for step in self.steps.iter() {
            let errors = step(value);
            if !errors.is_empty() {
                return errors;
            }
        }
        Vec::new()
    }

    #[must_use]
    pub fn is_valid(&self, value: &T) -> bool {
        self.validate(value).is_empty()
    }

    /// Number of steps in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ─── Built-in rules ──────────────────────────────────────────────────────────

/// Rejects empty and whitespace-only strings.
#[must_use]
pub fn not_blank<S: AsRef<str> + ?Sized + 'static>() -> Validator<S> {
    Validator::rule(
        |value: &S| !value.as_ref().trim().is_empty(),
        "Value cannot be empty or whitespace",
    )
}

/// Rejects values equal to `forbidden`.
#[must_use]
pub fn not_equal<T, U>(forbidden: U) -> Validator<T>
where
    T: PartialEq<U> + ?Sized + 'static,
    U: fmt::Debug + Send + Sync + 'static,
{
    let message = format!("Value cannot equal {forbidden:?}");
    Validator::rule(move |value: &T| *value != forbidden, message)
}

/// Rejects strings longer than `max` characters.
#[must_use]
pub fn max_length<S: AsRef<str> + ?Sized + 'static>(max: usize) -> Validator<S> {
    Validator::rule(
        move |value: &S| value.as_ref().chars().count() <= max,
        format!("Length cannot exceed {max} characters"),
    )
}

/// Rejects strings shorter than `min` characters.
#[must_use]
pub fn min_length<S: AsRef<str> + ?Sized + 'static>(min: usize) -> Validator<S> {
    Validator::rule(
        move |value: &S| value.as_ref().chars().count() >= min,
        format!("Length must be at least {min} characters"),
    )
}

/// Requires `value > bound`.
#[must_use]
pub fn greater_than<T>(bound: T) -> Validator<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync + 'static,
{
    let message = format!("Value must be greater than {bound:?}");
    Validator::rule(move |value: &T| *value > bound, message)
}

/// Requires `value < bound`.
#[must_use]
pub fn less_than<T>(bound: T) -> Validator<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync + 'static,
{
    let message = format!("Value must be less than {bound:?}");
    Validator::rule(move |value: &T| *value < bound, message)
}

/// Requires `low <= value <= high`.
#[must_use]
pub fn in_range<T>(low: T, high: T) -> Validator<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync + 'static,
{
    let message = format!("Value must be between {low:?} and {high:?}");
    Validator::rule(move |value: &T| *value >= low && *value <= high, message)
}
