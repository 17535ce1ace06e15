#![forbid(unsafe_code)]

//! Reactive value primitives.
//!
//! - [`ObservableCell`]: a named, version-tracked value that notifies
//!   subscribers when it changes.
//! - [`Computed`]: a lazily-evaluated, memoized value derived from cells or
//!   other computed values.
//!
//! # Architecture
//!
//! Both types use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Cell subscribers are stored as `Weak` function pointers (see
//! [`EventChannel`](crate::event::EventChannel)).
//!
//! # Invariants
//!
//! 1. A cell's version increments exactly once per mutation that changes the
//!    value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. `Computed::get()` never returns a stale value.

pub mod cell;
pub mod computed;

pub use cell::ObservableCell;
pub use computed::Computed;

/// Anything exposing a monotonically increasing change version.
pub trait Tracked {
    /// Current version. Changes whenever the observed value may have changed.
    fn version(&self) -> u64;
}
