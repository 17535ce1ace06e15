#![forbid(unsafe_code)]

//! E2E tests for a name-entry view-model: two validated name cells, derived
//! full name, length and greeting, and a cross-field entity rule.
//!
//! Validates that:
//! 1. One cell change notifies every dependent exactly once, in topological
//!    order.
//! 2. Chained rules short-circuit and report only the first failure.
//! 3. Entity errors appear only when the cross-field condition holds, and go
//!    away when it stops holding.
//! 4. `is_valid` tracks the full error table.

use std::cell::RefCell;
use std::rc::Rc;

use viewmodule_core::{
    Computed, ErrorScope, IS_VALID, OPERATION_EXECUTING, ObservableCell, PropertyName,
    Subscription, ValidationState, ViewModelBuilder, ViewModelCore, not_blank, not_equal,
};

const FIRST: PropertyName = PropertyName::new("first_name");
const LAST: PropertyName = PropertyName::new("last_name");
const FULL: PropertyName = PropertyName::new("full_name");
const LENGTH: PropertyName = PropertyName::new("name_length");
const GREETING: PropertyName = PropertyName::new("greeting");
const READY: PropertyName = PropertyName::new("ready_to_greet");

const POOR_CHOICE: &str = "This is a poor choice of names.";

// ============================================================================
// Fixture
// ============================================================================

struct Names {
    core: ViewModelCore,
    first: ObservableCell<String>,
    last: ObservableCell<String>,
    full: Computed<String>,
    length: Computed<usize>,
}

fn names(first: &str, last: &str) -> Names {
    let mut b = ViewModelBuilder::new();
    let first = b.backing_validated(
        FIRST,
        first.to_string(),
        not_blank().then(not_equal("Foo")),
    );
    let last = b.backing_validated(
        LAST,
        last.to_string(),
        not_blank()
            .then(not_equal("Bar"))
            .then_check(|s: &String| s.chars().count() < 10, "Length cannot exceed 10 characters"),
    );
    let full = Computed::from2(&first, &last, |f, l| format!("{f} {l}"));
    let length = full.map(|s| s.chars().count());

    b.property(FULL).property(LENGTH).property(GREETING).property(READY);
    b.depends_on(FULL, &[FIRST, LAST]).unwrap();
    b.depends_on(LENGTH, &[FULL]).unwrap();
    b.depends_on(GREETING, &[FULL]).unwrap();
    b.depends_on(READY, &[IS_VALID, OPERATION_EXECUTING]).unwrap();

    let reader = full.clone();
    b.validate_with(&[FULL], move |_| {
        let poor = not_equal::<String, _>("Reed Copsey").with_message(POOR_CHOICE);
        let errors = reader.with(|name| poor.validate(name));
        vec![
            ValidationState::property(FULL, errors.clone()),
            ValidationState::entity(errors),
        ]
    });

    Names {
        core: b.build().unwrap(),
        first,
        last,
        full,
        length,
    }
}

fn record(core: &ViewModelCore) -> (Rc<RefCell<Vec<PropertyName>>>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = core.subscribe_property_changed(move |name| sink.borrow_mut().push(*name));
    (log, sub)
}

fn position(log: &[PropertyName], name: PropertyName) -> usize {
    log.iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{name} was not notified: {log:?}"))
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn setting_first_notifies_chain_once_in_order() {
    let vm = names("Anton", "Tcholakov");
    let (log, _sub) = record(&vm.core);

    vm.first.set("Bob".to_string());

    let log = log.borrow();
    assert_eq!(
        *log,
        vec![FIRST, FULL, LENGTH, GREETING, IS_VALID, READY],
        "unexpected propagation order"
    );
    assert!(position(&log, FIRST) < position(&log, FULL));
    assert!(position(&log, FULL) < position(&log, LENGTH));
    assert!(position(&log, IS_VALID) < position(&log, READY));
    assert_eq!(log.iter().filter(|n| **n == FULL).count(), 1);
}

#[test]
fn subscribers_read_fresh_derived_values() {
    let vm = names("Anton", "Tcholakov");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let full = vm.full.clone();
    let length = vm.length.clone();
    let _sub = vm.core.subscribe_property_changed(move |name| {
        if *name == LENGTH {
            sink.borrow_mut().push((full.get(), length.get()));
        }
    });

    vm.first.set("Bob".to_string());
    assert_eq!(*seen.borrow(), vec![("Bob Tcholakov".to_string(), 13)]);
}

#[test]
fn equal_value_notifies_nothing() {
    let vm = names("Anton", "Tcholakov");
    let (log, _sub) = record(&vm.core);
    assert!(!vm.first.set("Anton".to_string()));
    assert!(log.borrow().is_empty());
}

#[test]
fn dropped_subscription_stops_delivery() {
    let vm = names("Anton", "Tcholakov");
    let (log, sub) = record(&vm.core);
    vm.first.set("Bob".to_string());
    let delivered = log.borrow().len();
    drop(sub);
    vm.first.set("Carl".to_string());
    assert_eq!(log.borrow().len(), delivered);
}

// ============================================================================
// Rule chains
// ============================================================================

#[test]
fn blank_first_name_reports_only_blank_error() {
    let vm = names("Anton", "Tcholakov");
    vm.first.set(String::new());
    assert_eq!(vm.core.errors(FIRST), ["Value cannot be empty or whitespace"]);
    assert!(!vm.core.is_valid());
}

#[test]
fn forbidden_first_name_reports_second_rule() {
    let vm = names("Anton", "Tcholakov");
    vm.first.set("Foo".to_string());
    assert_eq!(vm.core.errors(FIRST), [r#"Value cannot equal "Foo""#]);
    vm.first.set("Fooz".to_string());
    assert!(vm.core.errors(FIRST).is_empty());
    assert!(vm.core.is_valid());
}

#[test]
fn long_last_name_hits_third_step() {
    let vm = names("Anton", "Tcholakov");
    vm.last.set("Tcholakovski".to_string());
    assert_eq!(vm.core.errors(LAST), ["Length cannot exceed 10 characters"]);
    assert_eq!(vm.core.invalid_properties(), vec![LAST]);
}

// ============================================================================
// Entity rule
// ============================================================================

#[test]
fn entity_error_needs_both_names() {
    let vm = names("Anton", "Tcholakov");
    vm.first.set("Reed".to_string());
    assert!(vm.core.entity_errors().is_empty());
    assert!(vm.core.is_valid());

    vm.last.set("Copsey".to_string());
    assert_eq!(vm.core.entity_errors(), [POOR_CHOICE]);
    assert_eq!(vm.core.errors(FULL), [POOR_CHOICE]);
    assert!(!vm.core.is_valid());

    vm.last.set("Copse".to_string());
    assert!(vm.core.entity_errors().is_empty());
    assert!(vm.core.is_valid());
}

#[test]
fn entity_error_present_at_build_when_initial_values_match() {
    let vm = names("Reed", "Copsey");
    assert_eq!(vm.core.entity_errors(), [POOR_CHOICE]);
    assert!(!vm.core.is_valid());
}

#[test]
fn errors_changed_reports_property_and_entity_scopes() {
    let vm = names("Reed", "Tcholakov");
    let scopes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&scopes);
    let _sub = vm
        .core
        .subscribe_errors_changed(move |scope| sink.borrow_mut().push(*scope));

    vm.last.set("Copsey".to_string());
    assert_eq!(
        *scopes.borrow(),
        vec![ErrorScope::Property(FULL), ErrorScope::Entity]
    );
}

#[test]
fn validity_flip_is_visible_to_property_subscribers() {
    let vm = names("Anton", "Tcholakov");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let core = vm.core.clone();
    let _sub = vm.core.subscribe_property_changed(move |name| {
        if *name == IS_VALID {
            sink.borrow_mut().push(core.is_valid());
        }
    });

    vm.first.set(" ".to_string());
    vm.first.set("Ann".to_string());
    assert_eq!(*seen.borrow(), vec![false, true]);
}

// ============================================================================
// Cross-field rule triggered by both inputs
// ============================================================================

struct Pair {
    core: ViewModelCore,
    first: ObservableCell<String>,
    last: ObservableCell<String>,
}

fn pair(first: &str, last: &str) -> Pair {
    let mut b = ViewModelBuilder::new();
    let first = b.backing(FIRST, first.to_string());
    let last = b.backing(LAST, last.to_string());
    let (f, l) = (first.clone(), last.clone());
    b.validate_with(&[FIRST, LAST], move |_| {
        let poor = f.with(|f| f == "Reed") && l.with(|l| l == "Copsey");
        [ValidationState::entity(if poor {
            vec![POOR_CHOICE.to_string()]
        } else {
            Vec::new()
        })]
    });
    Pair {
        core: b.build().unwrap(),
        first,
        last,
    }
}

#[test]
fn rule_on_both_names_clears_when_either_changes() {
    let vm = pair("Anton", "Tcholakov");

    vm.first.set("Reed".to_string());
    assert!(vm.core.entity_errors().is_empty());

    vm.last.set("Copsey".to_string());
    assert_eq!(vm.core.entity_errors(), [POOR_CHOICE]);
    assert!(!vm.core.is_valid());

    vm.first.set("Bob".to_string());
    assert!(vm.core.entity_errors().is_empty());
    assert!(vm.core.is_valid());
}

#[test]
fn rule_on_both_names_reports_once_at_build() {
    let vm = pair("Reed", "Copsey");
    assert_eq!(vm.core.entity_errors(), [POOR_CHOICE]);
    assert!(!vm.core.is_valid());

    vm.last.set("Cope".to_string());
    assert!(vm.core.is_valid());
}
