#![forbid(unsafe_code)]

//! View-model composition.
//!
//! A [`ViewModelBuilder`] collects backing cells, computed property names,
//! dependency edges and validation sources, then freezes them into a
//! [`ViewModelCore`]. The core owns the frozen [`DependencyGraph`], the
//! current [`ErrorTable`], the links between properties and commands, and the
//! two aggregate flags [`IS_VALID`] and [`OPERATION_EXECUTING`].
//!
//! # Propagation
//!
//! When a backing cell changes (or [`ViewModelCore::raise_property_changed`]
//! is called) the core walks `source` followed by its propagation closure in
//! topological order. For every name it:
//!
//! 1. re-runs the validation sources attached to that name; each scope they
//!    report (or reported last time) takes the newest list,
//! 2. emits property-changed,
//! 3. emits errors-changed once per scope whose aggregated list changed.
//!
//! Afterwards every linked command with a dependency among the notified
//! names gets executability-changed.
//!
//! # Example
//!
//! ```
//! use viewmodule_core::{PropertyName, ViewModelBuilder, not_blank};
//!
//! const NAME: PropertyName = PropertyName::new("name");
//! const GREETING: PropertyName = PropertyName::new("greeting");
//!
//! let mut builder = ViewModelBuilder::new();
//! let name = builder.backing_validated(NAME, String::from("Ada"), not_blank());
//! builder.property(GREETING);
//! builder.depends_on(GREETING, &[NAME]).unwrap();
//! let vm = builder.build().unwrap();
//!
//! name.set(String::new());
//! assert!(!vm.is_valid());
//! assert_eq!(vm.errors(NAME), ["Value cannot be empty or whitespace"]);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use crate::cancel::CancelToken;
use crate::command::async_command::{AsyncParts, box_action};
use crate::command::{
    AsyncCommand, Command, CommandFault, ExecutabilityNotifier, OperationTracker, TaskSpawner,
    TokioLocalSpawner,
};
use crate::error::{GraphError, Result};
use crate::event::{EventChannel, Subscription};
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::property::{IS_VALID, OPERATION_EXECUTING, PropertyName};
use crate::reactive::ObservableCell;
use crate::validation::{ErrorScope, ErrorTable, ValidationSource, ValidationState, Validator};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Construction options of a view-model.
#[derive(Clone)]
pub struct ViewModelConfig {
    validate_on_build: bool,
    spawner: Rc<dyn TaskSpawner>,
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        Self {
            validate_on_build: true,
            spawner: Rc::new(TokioLocalSpawner),
        }
    }
}

impl fmt::Debug for ViewModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelConfig")
            .field("validate_on_build", &self.validate_on_build)
            .finish_non_exhaustive()
    }
}

impl ViewModelConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every validation source once when the view-model is built, so
    /// initial values are checked before the first change. Default: `true`.
    #[must_use]
    pub fn validate_on_build(mut self, enabled: bool) -> Self {
        self.validate_on_build = enabled;
        self
    }

    /// Executor for async command runs. Default: [`TokioLocalSpawner`].
    #[must_use]
    pub fn with_spawner(mut self, spawner: Rc<dyn TaskSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    #[must_use]
    pub fn validates_on_build(&self) -> bool {
        self.validate_on_build
    }

    #[must_use]
    pub fn spawner(&self) -> Rc<dyn TaskSpawner> {
        Rc::clone(&self.spawner)
    }
}

// ─── Internal state ──────────────────────────────────────────────────────────

type CellValidator = Box<dyn Fn() -> Vec<ValidationState>>;
type Attachment = Box<dyn FnOnce(Weak<CoreInner>) -> Subscription>;

struct ValidationHook {
    triggers: Vec<PropertyName>,
    run: Box<dyn Fn(PropertyName) -> Vec<ValidationState>>,
}

struct CommandLink {
    depends_on: Vec<PropertyName>,
    target: Weak<dyn ExecutabilityNotifier>,
}

struct CoreInner {
    graph: DependencyGraph,
    validators: HashMap<PropertyName, CellValidator>,
    hooks: Vec<ValidationHook>,
    errors: RefCell<ErrorTable>,
    in_flight: Cell<usize>,
    property_changed: EventChannel<PropertyName>,
    errors_changed: EventChannel<ErrorScope>,
    links: RefCell<Vec<CommandLink>>,
    spawner: Rc<dyn TaskSpawner>,
    cell_subscriptions: RefCell<Vec<Subscription>>,
}

impl CoreInner {
    fn participates(&self, name: PropertyName) -> bool {
        self.validators.contains_key(&name) || self.hooks.iter().any(|h| h.triggers.contains(&name))
    }

    /// Re-run every validation source attached to `origin`. Their results
    /// replace the scopes they cover. Returns the scopes whose errors changed.
    fn revalidate(&self, origin: PropertyName) -> Vec<ErrorScope> {
        if !self.participates(origin) {
            return Vec::new();
        }
        let mut changed = BTreeSet::new();
        {
            let mut errors = self.errors.borrow_mut();
            if let Some(validator) = self.validators.get(&origin) {
                changed.extend(errors.replace(origin, validator()));
            }
            for (index, hook) in self.hooks.iter().enumerate() {
                if hook.triggers.contains(&origin) {
                    let states = (hook.run)(origin);
                    changed.extend(errors.replace(ValidationSource::Hook(index), states));
                }
            }
        }
        if !changed.is_empty() {
            tracing::debug!(
                message = "validation.changed",
                origin = %origin,
                scopes = changed.len()
            );
        }
        changed.into_iter().collect()
    }

    fn propagate(&self, source: PropertyName) {
        let mut notified = vec![source];
        notified.extend(self.graph.propagation_order(source));
        tracing::trace!(
            message = "viewmodel.propagate",
            source = %source,
            notified = notified.len()
        );
        for &name in &notified {
            let changed = self.revalidate(name);
            self.property_changed.emit(&name);
            for scope in &changed {
                self.errors_changed.emit(scope);
            }
        }
        self.raise_linked(&notified);
    }

    fn raise_linked(&self, notified: &[PropertyName]) {
        let targets: Vec<Rc<dyn ExecutabilityNotifier>> = {
            let mut links = self.links.borrow_mut();
            links.retain(|link| link.target.strong_count() > 0);
            links
                .iter()
                .filter(|link| link.depends_on.iter().any(|dep| notified.contains(dep)))
                .filter_map(|link| link.target.upgrade())
                .collect()
        };
        for target in targets {
            target.raise_can_execute_changed();
        }
    }

    fn link(&self, target: Weak<dyn ExecutabilityNotifier>, depends_on: &[PropertyName]) {
        if depends_on.is_empty() {
            return;
        }
        self.links.borrow_mut().push(CommandLink {
            depends_on: depends_on.to_vec(),
            target,
        });
    }

    fn validate_all(&self) {
        let was_valid = self.errors.borrow().is_valid();
        let mut changed: Vec<ErrorScope> = Vec::new();
        for name in self.graph.topological_order() {
            for scope in self.revalidate(name) {
                if !changed.contains(&scope) {
                    changed.push(scope);
                }
            }
        }
        for scope in &changed {
            self.errors_changed.emit(scope);
        }
        if self.errors.borrow().is_valid() != was_valid {
            self.propagate(IS_VALID);
        }
    }
}

impl OperationTracker for CoreInner {
    fn enter_operation(&self) {
        let count = self.in_flight.get() + 1;
        self.in_flight.set(count);
        if count == 1 {
            self.propagate(OPERATION_EXECUTING);
        }
    }

    fn exit_operation(&self) {
        let previous = self.in_flight.get();
        let count = previous.saturating_sub(1);
        self.in_flight.set(count);
        if previous > 0 && count == 0 {
            self.propagate(OPERATION_EXECUTING);
        }
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Construction-time declaration of a view-model.
pub struct ViewModelBuilder {
    config: ViewModelConfig,
    graph: DependencyGraphBuilder,
    declared: HashSet<PropertyName>,
    duplicate: Option<PropertyName>,
    validators: Vec<(PropertyName, CellValidator)>,
    hooks: Vec<ValidationHook>,
    attachments: Vec<Attachment>,
}

impl Default for ViewModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelBuilder")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("validators", &self.validators.len())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl ViewModelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ViewModelConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ViewModelConfig) -> Self {
        let mut builder = Self {
            config,
            graph: DependencyGraphBuilder::new(),
            declared: HashSet::new(),
            duplicate: None,
            validators: Vec::new(),
            hooks: Vec::new(),
            attachments: Vec::new(),
        };
        // Reserved, but interned into the graph only at build so that user
        // properties win topological ties.
        builder.declared.insert(IS_VALID);
        builder.declared.insert(OPERATION_EXECUTING);
        builder
    }

    fn declare(&mut self, name: PropertyName) {
        if !self.declared.insert(name) && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self.graph.declare(name);
    }

    /// Create the backing cell of `name`. Changes of the cell propagate
    /// through the view-model once it is built.
    pub fn backing<T: Clone + PartialEq + 'static>(
        &mut self,
        name: PropertyName,
        initial: T,
    ) -> ObservableCell<T> {
        self.declare(name);
        let cell = ObservableCell::new(name, initial);
        let observed = cell.clone();
        self.attachments.push(Box::new(move |core: Weak<CoreInner>| {
            observed.subscribe(move |name| {
                if let Some(core) = core.upgrade() {
                    core.propagate(*name);
                }
            })
        }));
        cell
    }

    /// Like [`backing`](Self::backing), with a validator run on every change
    /// of the cell. Its errors are scoped to `name`.
    pub fn backing_validated<T: Clone + PartialEq + 'static>(
        &mut self,
        name: PropertyName,
        initial: T,
        validator: Validator<T>,
    ) -> ObservableCell<T> {
        let cell = self.backing(name, initial);
        let checked = cell.clone();
        self.validators.push((
            name,
            Box::new(move || {
                let errors = checked.with(|value| validator.validate(value));
                vec![ValidationState::property(name, errors)]
            }),
        ));
        cell
    }

    /// Declare a property without a backing cell (a computed value).
    pub fn property(&mut self, name: PropertyName) -> &mut Self {
        self.declare(name);
        self
    }

    /// Declare that `dependent` is re-notified whenever any of `sources`
    /// changes.
    ///
    /// # Errors
    ///
    /// [`GraphError::CyclicDependency`] if an edge would close a cycle.
    pub fn depends_on(
        &mut self,
        dependent: PropertyName,
        sources: &[PropertyName],
    ) -> Result<&mut Self> {
        self.graph.add_dependencies(dependent, sources)?;
        Ok(self)
    }

    /// Register a validation hook. Whenever one of `triggers` is notified the
    /// hook is called with that name; what it returns replaces everything it
    /// returned for that name before.
    pub fn validate_with<I>(
        &mut self,
        triggers: &[PropertyName],
        hook: impl Fn(PropertyName) -> I + 'static,
    ) -> &mut Self
    where
        I: IntoIterator<Item = ValidationState>,
    {
        self.hooks.push(ValidationHook {
            triggers: triggers.to_vec(),
            run: Box::new(move |name| hook(name).into_iter().collect()),
        });
        self
    }

    fn is_known(&self, name: PropertyName) -> bool {
        self.declared.contains(&name) || !self.graph.sources_of(name).is_empty()
    }

    /// Freeze the declaration.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateProperty`] if a name was declared twice.
    /// - [`GraphError::UnknownProperty`] if a dependency or hook trigger names
    ///   a property that was never declared.
    /// - [`GraphError::CyclicDependency`] if wiring [`IS_VALID`] to its
    ///   validation sources closes a cycle.
    pub fn build(mut self) -> Result<ViewModelCore> {
        if let Some(property) = self.duplicate {
            return Err(GraphError::DuplicateProperty { property });
        }

        for dependent in self.graph.names().collect::<Vec<_>>() {
            for source in self.graph.sources_of(dependent) {
                if !self.is_known(source) {
                    return Err(GraphError::UnknownProperty {
                        dependent,
                        missing: source,
                    });
                }
            }
        }

        let mut validity_sources: Vec<PropertyName> =
            self.validators.iter().map(|(name, _)| *name).collect();
        for hook in &self.hooks {
            for &trigger in &hook.triggers {
                if !self.is_known(trigger) {
                    return Err(GraphError::UnknownProperty {
                        dependent: IS_VALID,
                        missing: trigger,
                    });
                }
                if !validity_sources.contains(&trigger) {
                    validity_sources.push(trigger);
                }
            }
        }
        for source in validity_sources.iter().copied().filter(|s| *s != IS_VALID) {
            self.graph.add_dependency(IS_VALID, source)?;
        }

        self.graph.declare(IS_VALID).declare(OPERATION_EXECUTING);
        let graph = self.graph.build();
        tracing::debug!(
            message = "viewmodel.build",
            properties = graph.len(),
            edges = graph.edge_count(),
            validators = self.validators.len(),
            hooks = self.hooks.len()
        );

        let inner = Rc::new(CoreInner {
            graph,
            validators: self.validators.into_iter().collect(),
            hooks: self.hooks,
            errors: RefCell::new(ErrorTable::new()),
            in_flight: Cell::new(0),
            property_changed: EventChannel::new(),
            errors_changed: EventChannel::new(),
            links: RefCell::new(Vec::new()),
            spawner: self.config.spawner(),
            cell_subscriptions: RefCell::new(Vec::new()),
        });
        let subscriptions: Vec<Subscription> = self
            .attachments
            .into_iter()
            .map(|attach| attach(Rc::downgrade(&inner)))
            .collect();
        *inner.cell_subscriptions.borrow_mut() = subscriptions;

        if self.config.validate_on_build {
            inner.validate_all();
        }
        Ok(ViewModelCore { inner })
    }
}

// ─── Core ────────────────────────────────────────────────────────────────────

/// The composed view-model state. Cloning creates another handle.
#[derive(Clone)]
pub struct ViewModelCore {
    inner: Rc<CoreInner>,
}

impl fmt::Debug for ViewModelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelCore")
            .field("graph", &self.inner.graph)
            .field("is_valid", &self.is_valid())
            .field("operation_executing", &self.operation_executing())
            .finish_non_exhaustive()
    }
}

impl ViewModelCore {
    /// Listen for property-changed notifications.
    pub fn subscribe_property_changed(
        &self,
        callback: impl Fn(&PropertyName) + 'static,
    ) -> Subscription {
        self.inner.property_changed.subscribe(callback)
    }

    /// Listen for errors-changed notifications.
    pub fn subscribe_errors_changed(&self, callback: impl Fn(&ErrorScope) + 'static) -> Subscription {
        self.inner.errors_changed.subscribe(callback)
    }

    /// Notify `name` and everything depending on it, as if a backing cell of
    /// that name had changed.
    pub fn raise_property_changed(&self, name: PropertyName) {
        self.inner.propagate(name);
    }

    /// True iff no property-scoped and no entity-scoped errors are present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.errors.borrow().is_valid()
    }

    /// True while any async command of this view-model is running.
    #[must_use]
    pub fn operation_executing(&self) -> bool {
        self.inner.in_flight.get() > 0
    }

    /// Current errors of `property`.
    #[must_use]
    pub fn errors(&self, property: PropertyName) -> Vec<String> {
        self.inner.errors.borrow().property_errors(property)
    }

    #[must_use]
    pub fn entity_errors(&self) -> Vec<String> {
        self.inner.errors.borrow().entity_errors()
    }

    #[must_use]
    pub fn invalid_properties(&self) -> Vec<PropertyName> {
        self.inner.errors.borrow().invalid_properties()
    }

    /// Snapshot of the error table.
    #[must_use]
    pub fn error_table(&self) -> ErrorTable {
        self.inner.errors.borrow().clone()
    }

    /// Re-run every validation source, in topological order.
    pub fn validate_all(&self) {
        self.inner.validate_all();
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.inner.graph
    }

    fn check_command_deps(&self, depends_on: &[PropertyName]) -> Result<()> {
        match depends_on.iter().find(|dep| !self.inner.graph.contains(**dep)) {
            Some(&property) => Err(GraphError::UnknownCommandDependency { property }),
            None => Ok(()),
        }
    }

    fn tracker(&self) -> Weak<dyn OperationTracker> {
        let weak: Weak<CoreInner> = Rc::downgrade(&self.inner);
        weak
    }

    /// Always-enabled synchronous command.
    pub fn command_sync(&self, action: impl Fn() + 'static) -> Command {
        Command::new(action)
    }

    /// Synchronous command whose executability is re-announced whenever one
    /// of `depends_on` is notified.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownCommandDependency`] for an undeclared dependency.
    pub fn command_sync_checked(
        &self,
        action: impl Fn() + 'static,
        can_execute: impl Fn() -> bool + 'static,
        depends_on: &[PropertyName],
    ) -> Result<Command> {
        self.check_command_deps(depends_on)?;
        let command = Command::checked(action, can_execute);
        self.inner.link(command.notifier(), depends_on);
        Ok(command)
    }

    /// Always-enabled async command counted by [`OPERATION_EXECUTING`].
    pub fn command_async<F, Fut>(&self, action: F) -> AsyncCommand
    where
        F: Fn(CancelToken) -> Fut + 'static,
        Fut: Future<Output = std::result::Result<(), CommandFault>> + 'static,
    {
        AsyncCommand::from_parts(AsyncParts {
            action: box_action(action),
            can_execute: Box::new(|| true),
            on_fault: None,
            spawner: Rc::clone(&self.inner.spawner),
            tracker: Some(self.tracker()),
        })
    }

    /// Async command with an executability predicate, linked dependencies and
    /// an optional fault handler.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownCommandDependency`] for an undeclared dependency.
    pub fn command_async_checked<F, Fut, H>(
        &self,
        action: F,
        can_execute: impl Fn() -> bool + 'static,
        depends_on: &[PropertyName],
        on_fault: Option<H>,
    ) -> Result<AsyncCommand>
    where
        F: Fn(CancelToken) -> Fut + 'static,
        Fut: Future<Output = std::result::Result<(), CommandFault>> + 'static,
        H: Fn(&CommandFault) + 'static,
    {
        self.check_command_deps(depends_on)?;
        let command = AsyncCommand::from_parts(AsyncParts {
            action: box_action(action),
            can_execute: Box::new(can_execute),
            on_fault: on_fault.map(|h| Box::new(h) as Box<dyn Fn(&CommandFault)>),
            spawner: Rc::clone(&self.inner.spawner),
            tracker: Some(self.tracker()),
        });
        self.inner.link(command.notifier(), depends_on);
        Ok(command)
    }

    /// Synchronous command that cancels `target`'s in-flight run. Enabled
    /// while [`operation_executing`](Self::operation_executing).
    pub fn cancel_command(&self, target: &AsyncCommand) -> Command {
        let target = target.clone();
        let core = Rc::downgrade(&self.inner);
        let command = Command::checked(
            move || {
                target.cancel();
            },
            move || core.upgrade().is_some_and(|c| c.in_flight.get() > 0),
        );
        self.inner.link(command.notifier(), &[OPERATION_EXECUTING]);
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{max_length, not_blank};

    const A: PropertyName = PropertyName::new("a");
    const B: PropertyName = PropertyName::new("b");
    const SUM: PropertyName = PropertyName::new("sum");

    fn record(vm: &ViewModelCore) -> (Rc<RefCell<Vec<PropertyName>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = vm.subscribe_property_changed(move |name| l.borrow_mut().push(*name));
        (log, sub)
    }

    #[test]
    fn cell_change_propagates_to_dependents() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing(A, 1);
        let _b = b.backing(B, 2);
        b.property(SUM);
        b.depends_on(SUM, &[A, B]).unwrap();
        let vm = b.build().unwrap();
        let (log, _sub) = record(&vm);

        a.set(5);
        assert_eq!(*log.borrow(), vec![A, SUM]);
        a.set(5);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn duplicate_declaration_fails_at_build() {
        let mut b = ViewModelBuilder::new();
        let _a = b.backing(A, 1);
        b.property(A);
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::DuplicateProperty { property: A }
        );
    }

    #[test]
    fn builtin_names_are_reserved() {
        let mut b = ViewModelBuilder::new();
        b.property(IS_VALID);
        assert!(matches!(
            b.build(),
            Err(GraphError::DuplicateProperty { property }) if property == IS_VALID
        ));
    }

    #[test]
    fn unknown_source_fails_at_build() {
        let mut b = ViewModelBuilder::new();
        b.property(SUM);
        b.depends_on(SUM, &[A]).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::UnknownProperty {
                dependent: SUM,
                missing: A
            }
        );
    }

    #[test]
    fn cycle_is_rejected_on_declaration() {
        let mut b = ViewModelBuilder::new();
        b.property(A).property(B);
        b.depends_on(A, &[B]).unwrap();
        let err = b.depends_on(B, &[A]).unwrap_err();
        assert_eq!(err.cycle(), Some(&[B, A, B][..]));
    }

    #[test]
    fn validation_on_build_and_on_change() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing_validated(A, String::new(), not_blank());
        let vm = b.build().unwrap();
        assert!(!vm.is_valid());
        assert_eq!(vm.invalid_properties(), vec![A]);

        let (log, _sub) = record(&vm);
        a.set("ok".into());
        assert!(vm.is_valid());
        assert_eq!(*log.borrow(), vec![A, IS_VALID]);
    }

    #[test]
    fn validation_deferred_when_disabled() {
        let config = ViewModelConfig::new().validate_on_build(false);
        let mut b = ViewModelBuilder::with_config(config);
        let _a = b.backing_validated(A, String::new(), not_blank());
        let vm = b.build().unwrap();
        assert!(vm.is_valid());
        vm.validate_all();
        assert!(!vm.is_valid());
    }

    #[test]
    fn errors_changed_fires_per_changed_scope() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing_validated(A, String::from("x"), max_length(3));
        let vm = b.build().unwrap();
        let scopes = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&scopes);
        let _sub = vm.subscribe_errors_changed(move |scope| s.borrow_mut().push(*scope));

        a.set("toolong".into());
        a.set("longer!".into());
        a.set("ok".into());
        assert_eq!(
            *scopes.borrow(),
            vec![ErrorScope::Property(A), ErrorScope::Property(A)]
        );
    }

    #[test]
    fn hook_entity_errors_replace_previous() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing(A, 0);
        let reader = a.clone();
        b.validate_with(&[A], move |_| {
            (reader.get() > 10).then(|| ValidationState::entity(vec!["too big".into()]))
        });
        let vm = b.build().unwrap();
        assert!(vm.entity_errors().is_empty());
        a.set(11);
        assert_eq!(vm.entity_errors(), vec!["too big".to_string()]);
        a.set(12);
        assert_eq!(vm.entity_errors(), vec!["too big".to_string()]);
        a.set(1);
        assert!(vm.is_valid());
    }

    #[test]
    fn entity_rule_with_two_triggers_keeps_latest_result() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing(A, 0);
        let other = b.backing(B, 0);
        let (pa, pb) = (a.clone(), other.clone());
        b.validate_with(&[A, B], move |_| {
            (pa.get() + pb.get() > 10).then(|| ValidationState::entity(vec!["sum too big".into()]))
        });
        let vm = b.build().unwrap();

        a.set(6);
        assert!(vm.is_valid());
        other.set(6);
        assert_eq!(vm.entity_errors(), vec!["sum too big".to_string()]);
        a.set(0);
        assert!(vm.entity_errors().is_empty());
        assert!(vm.is_valid());
    }

    #[test]
    fn unknown_hook_trigger_fails_at_build() {
        let mut b = ViewModelBuilder::new();
        b.validate_with(&[A], |_| Vec::<ValidationState>::new());
        assert!(matches!(
            b.build(),
            Err(GraphError::UnknownProperty { missing, .. }) if missing == A
        ));
    }

    #[test]
    fn linked_command_hears_dependency_changes() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing(A, 0);
        let other = b.backing(B, 0);
        let vm = b.build().unwrap();
        let reader = a.clone();
        let cmd = vm
            .command_sync_checked(|| {}, move || reader.get() > 0, &[A])
            .unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = cmd.subscribe_can_execute_changed(move || h.set(h.get() + 1));

        assert!(!cmd.can_execute());
        a.set(1);
        assert_eq!(hits.get(), 1);
        assert!(cmd.can_execute());
        other.set(3);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unknown_command_dependency_is_an_error() {
        let vm = ViewModelBuilder::new().build().unwrap();
        assert_eq!(
            vm.command_sync_checked(|| {}, || true, &[A]).unwrap_err(),
            GraphError::UnknownCommandDependency { property: A }
        );
    }

    #[test]
    fn raise_property_changed_walks_closure() {
        let mut b = ViewModelBuilder::new();
        b.property(A).property(SUM);
        b.depends_on(SUM, &[A]).unwrap();
        let vm = b.build().unwrap();
        let (log, _sub) = record(&vm);
        vm.raise_property_changed(A);
        assert_eq!(*log.borrow(), vec![A, SUM]);
    }

    #[test]
    fn dropped_core_detaches_cells() {
        let mut b = ViewModelBuilder::new();
        let a = b.backing(A, 0);
        let vm = b.build().unwrap();
        assert_eq!(a.subscriber_count(), 1);
        drop(vm);
        assert_eq!(a.subscriber_count(), 0);
        assert!(a.set(1));
    }
}
