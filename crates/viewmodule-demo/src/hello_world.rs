#![forbid(unsafe_code)]

//! The hello-world view-model.
//!
//! Two validated name cells feed a derived full name, its length and a
//! greeting. `say_hello` is an async command that "talks to a slow service"
//! for a configurable delay and then appends the greeting to the message log.
//! It is enabled only while the form is valid and nothing else is running.
//! `cancel` stops an in-flight greeting.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use viewmodule_core::{
    AsyncCommand, CancelToken, Command, CommandFault, Computed, IS_VALID, OPERATION_EXECUTING,
    ObservableCell, PropertyName, Tracked, ValidationState, ViewModelBuilder, ViewModelConfig,
    ViewModelCore, not_blank, not_equal,
};

use crate::error::{GreetTimeout, Result};

pub const FIRST_NAME: PropertyName = PropertyName::new("first_name");
pub const LAST_NAME: PropertyName = PropertyName::new("last_name");
pub const FULL_NAME: PropertyName = PropertyName::new("full_name");
pub const NAME_LENGTH: PropertyName = PropertyName::new("name_length");
pub const GREETING: PropertyName = PropertyName::new("greeting");
pub const READY_TO_GREET: PropertyName = PropertyName::new("ready_to_greet");

pub const POOR_CHOICE: &str = "This is a poor choice of names.";
pub const TOO_SLOW: &str = "Sorry I was too slow :-(.";

const DEFAULT_FIRST: &str = "Anton";
const DEFAULT_LAST: &str = "Tcholakov";

/// How the simulated greeting service behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreetSettings {
    pub delay: Duration,
    pub fail: bool,
}

impl Default for GreetSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            fail: false,
        }
    }
}

pub struct HelloWorldViewModel {
    core: ViewModelCore,
    first_name: ObservableCell<String>,
    last_name: ObservableCell<String>,
    full_name: Computed<String>,
    name_length: Computed<usize>,
    greeting: Computed<String>,
    messages: Rc<RefCell<Vec<String>>>,
    say_hello: AsyncCommand,
    cancel: Command,
}

impl std::fmt::Debug for HelloWorldViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelloWorldViewModel")
            .field("first_name", &self.first_name.get())
            .field("last_name", &self.last_name.get())
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl HelloWorldViewModel {
    /// Build with the default configuration (tokio local tasks).
    ///
    /// # Errors
    ///
    /// Fails only if the wiring below is inconsistent.
    pub fn new(settings: GreetSettings) -> Result<Self> {
        Self::with_config(settings, ViewModelConfig::default())
    }

    /// Build with an explicit view-model configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the wiring below is inconsistent.
    pub fn with_config(settings: GreetSettings, config: ViewModelConfig) -> Result<Self> {
        let mut b = ViewModelBuilder::with_config(config);

        let first_name = b.backing_validated(
            FIRST_NAME,
            DEFAULT_FIRST.to_string(),
            not_blank().then(not_equal("Foo")),
        );
        let last_name = b.backing_validated(
            LAST_NAME,
            DEFAULT_LAST.to_string(),
            not_blank().then(not_equal("Bar")).then_check(
                |s: &String| s.chars().count() < 10,
                "Length cannot exceed 10 characters",
            ),
        );

        let full_name = Computed::from2(&first_name, &last_name, |f, l| format!("{f} {l}"));
        let name_length = full_name.map(|s| s.chars().count());
        let greeting = {
            let full = full_name.clone();
            let length = name_length.clone();
            let sources: Vec<Box<dyn Tracked>> =
                vec![Box::new(full_name.clone()), Box::new(name_length.clone())];
            Computed::from_fn(
                move || {
                    format!(
                        "Hello, {}. Your name is {} characters long.",
                        full.get(),
                        length.get()
                    )
                },
                sources,
            )
        };

        b.property(FULL_NAME)
            .property(NAME_LENGTH)
            .property(GREETING)
            .property(READY_TO_GREET);
        b.depends_on(FULL_NAME, &[FIRST_NAME, LAST_NAME])?;
        b.depends_on(NAME_LENGTH, &[FULL_NAME])?;
        b.depends_on(GREETING, &[FULL_NAME, NAME_LENGTH])?;
        b.depends_on(READY_TO_GREET, &[IS_VALID, OPERATION_EXECUTING])?;

        let poor_choice = not_equal::<String, _>("Reed Copsey").with_message(POOR_CHOICE);
        let reader = full_name.clone();
        b.validate_with(&[FULL_NAME], move |_| {
            let errors = reader.with(|name| poor_choice.validate(name));
            [
                ValidationState::property(FULL_NAME, errors.clone()),
                ValidationState::entity(errors),
            ]
        });

        let core = b.build()?;
        let messages = Rc::new(RefCell::new(Vec::new()));

        let say_hello = {
            let ready = core.clone();
            let greeting = greeting.clone();
            let log = Rc::clone(&messages);
            let apologies = Rc::clone(&messages);
            core.command_async_checked(
                move |token: CancelToken| {
                    let greeting = greeting.clone();
                    let log = Rc::clone(&log);
                    async move {
                        token.sleep(settings.delay).await?;
                        if settings.fail {
                            return Err(GreetTimeout.into());
                        }
                        let text = greeting.get();
                        tracing::info!(message = "greeting.said", greeting = %text);
                        log.borrow_mut().push(text);
                        Ok::<(), CommandFault>(())
                    }
                },
                move || ready.is_valid() && !ready.operation_executing(),
                &[IS_VALID, OPERATION_EXECUTING],
                Some(move |fault: &CommandFault| {
                    tracing::warn!(message = "greeting.failed", error = %fault);
                    apologies.borrow_mut().push(TOO_SLOW.to_string());
                }),
            )?
        };
        let cancel = core.cancel_command(&say_hello);

        Ok(Self {
            core,
            first_name,
            last_name,
            full_name,
            name_length,
            greeting,
            messages,
            say_hello,
            cancel,
        })
    }

    #[must_use]
    pub fn core(&self) -> &ViewModelCore {
        &self.core
    }

    #[must_use]
    pub fn first_name(&self) -> String {
        self.first_name.get()
    }

    pub fn set_first_name(&self, value: impl Into<String>) -> bool {
        self.first_name.set(value.into())
    }

    #[must_use]
    pub fn last_name(&self) -> String {
        self.last_name.get()
    }

    pub fn set_last_name(&self, value: impl Into<String>) -> bool {
        self.last_name.set(value.into())
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        self.full_name.get()
    }

    #[must_use]
    pub fn name_length(&self) -> usize {
        self.name_length.get()
    }

    #[must_use]
    pub fn greeting(&self) -> String {
        self.greeting.get()
    }

    /// Valid and idle.
    #[must_use]
    pub fn ready_to_greet(&self) -> bool {
        self.core.is_valid() && !self.core.operation_executing()
    }

    /// Greetings and apologies, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    #[must_use]
    pub fn say_hello(&self) -> &AsyncCommand {
        &self.say_hello
    }

    #[must_use]
    pub fn cancel(&self) -> &Command {
        &self.cancel
    }

    /// Every current error as `scope: message`, properties first.
    #[must_use]
    pub fn error_summary(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .core
            .invalid_properties()
            .into_iter()
            .flat_map(|property| {
                self.core
                    .errors(property)
                    .into_iter()
                    .map(move |message| format!("{property}: {message}"))
            })
            .collect();
        lines.extend(
            self.core
                .entity_errors()
                .into_iter()
                .map(|message| format!("entity: {message}")),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> HelloWorldViewModel {
        HelloWorldViewModel::new(GreetSettings::default()).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let vm = vm();
        assert_eq!(vm.full_name(), "Anton Tcholakov");
        assert_eq!(vm.name_length(), 15);
        assert_eq!(
            vm.greeting(),
            "Hello, Anton Tcholakov. Your name is 15 characters long."
        );
        assert!(vm.ready_to_greet());
        assert!(vm.say_hello().can_execute());
        assert!(!vm.cancel().can_execute());
    }

    #[test]
    fn forbidden_first_name() {
        let vm = vm();
        vm.set_first_name("Foo");
        assert!(!vm.ready_to_greet());
        assert!(!vm.say_hello().can_execute());
        assert_eq!(
            vm.error_summary(),
            vec!["first_name: Value cannot equal \"Foo\"".to_string()]
        );
    }

    #[test]
    fn long_last_name_reports_length_rule() {
        let vm = vm();
        vm.set_last_name("Tcholakovski");
        assert_eq!(
            vm.core().errors(LAST_NAME),
            vec!["Length cannot exceed 10 characters".to_string()]
        );
    }

    #[test]
    fn poor_choice_is_property_and_entity_error() {
        let vm = vm();
        vm.set_first_name("Reed");
        vm.set_last_name("Copsey");
        assert_eq!(vm.core().errors(FULL_NAME), vec![POOR_CHOICE.to_string()]);
        assert_eq!(vm.core().entity_errors(), vec![POOR_CHOICE.to_string()]);
        assert_eq!(
            vm.error_summary(),
            vec![
                format!("full_name: {POOR_CHOICE}"),
                format!("entity: {POOR_CHOICE}"),
            ]
        );

        vm.set_last_name("Cope");
        assert!(vm.ready_to_greet());
    }

    #[test]
    fn say_hello_hears_validity_flips() {
        let vm = vm();
        let hits = Rc::new(std::cell::Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = vm
            .say_hello()
            .subscribe_can_execute_changed(move || h.set(h.get() + 1));
        vm.set_first_name("  ");
        assert!(hits.get() >= 1);
        assert!(!vm.say_hello().can_execute());
    }
}
