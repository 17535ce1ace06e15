#![forbid(unsafe_code)]

//! Memoized values derived from cells and other computed values.
//!
//! # Design
//!
//! [`Computed<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. Instead of subscribing to its sources, it records
//! each source's [`Tracked::version`] at computation time and compares on read.
//! A read after any source moved recomputes; otherwise the cache is returned.
//! This keeps a computed value correct no matter in which order the owning
//! view-model and the computed value observe a cell change.
//!
//! # Invariants
//!
//! 1. `get()` always returns a value consistent with the current state of all
//!    sources (no stale reads after a source mutation completes).
//! 2. The compute function runs at most once per observed source change.
//! 3. `version()` increments by exactly 1 per recomputation.
//!
//! # Failure Modes
//!
//! - **Compute function panics**: the previous cached value is kept and the
//!   next read retries.
//! - **Compute function reads itself**: re-entrant borrow panic.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Tracked;
use super::cell::ObservableCell;

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    cached: Option<T>,
    /// Forced staleness from `invalidate()`.
    dirty: bool,
    version: u64,
    sources: Vec<Box<dyn Tracked>>,
    /// Source versions observed at the last computation.
    seen: Vec<u64>,
}

impl<T> ComputedInner<T> {
    fn is_stale(&self) -> bool {
        self.dirty
            || self.cached.is_none()
            || self
                .sources
                .iter()
                .zip(&self.seen)
                .any(|(source, seen)| source.version() != *seen)
    }
}

/// A lazily-evaluated, memoized derived value.
///
/// Cloning a `Computed` creates a new handle to the **same** inner state.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &inner.dirty)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: 'static> Computed<T> {
    /// Low-level constructor: `compute` is re-run whenever any of `sources`
    /// reports a new version.
    pub fn from_fn(compute: impl Fn() -> T + 'static, sources: Vec<Box<dyn Tracked>>) -> Self {
        let seen = vec![u64::MAX; sources.len()];
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute: Box::new(compute),
                cached: None,
                dirty: true,
                version: 0,
                sources,
                seen,
            })),
        }
    }

    /// Derive from a single cell.
    pub fn from_cell<S: Clone + PartialEq + 'static>(
        source: &ObservableCell<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let reader = source.clone();
        Self::from_fn(
            move || reader.with(|v| map(v)),
            vec![Box::new(source.clone())],
        )
    }

    /// Derive from two cells.
    pub fn from2<S1, S2>(
        s1: &ObservableCell<S1>,
        s2: &ObservableCell<S2>,
        map: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + 'static,
        S2: Clone + PartialEq + 'static,
    {
        let r1 = s1.clone();
        let r2 = s2.clone();
        Self::from_fn(
            move || r1.with(|v1| r2.with(|v2| map(v1, v2))),
            vec![Box::new(s1.clone()), Box::new(s2.clone())],
        )
    }

    /// Derive a new computed value from this one.
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Computed<U> {
        let reader = self.clone();
        Computed::from_fn(move || reader.with(|v| f(v)), vec![Box::new(self.clone())])
    }

    fn refresh(&self) {
        if !self.inner.borrow().is_stale() {
            return;
        }
        let seen: Vec<u64> = {
            let inner = self.inner.borrow();
            inner.sources.iter().map(|s| s.version()).collect()
        };
        let value = {
            let inner = self.inner.borrow();
            (inner.compute)()
        };
        let mut inner = self.inner.borrow_mut();
        inner.cached = Some(value);
        inner.seen = seen;
        inner.dirty = false;
        inner.version += 1;
    }

    /// Access the current value by reference, recomputing first if stale.
    ///
    /// # Panics
    ///
    /// Panics if the closure reads this same `Computed` mutably (re-entrant
    /// recomputation).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        let inner = self.inner.borrow();
        f(inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    /// Whether the next read will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().is_stale()
    }

    /// Force the next read to recompute.
    pub fn invalidate(&self) {
        self.inner.borrow_mut().dirty = true;
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: 'static> Tracked for Computed<T> {
    fn version(&self) -> u64 {
        self.refresh();
        Computed::version(self)
    }
}
