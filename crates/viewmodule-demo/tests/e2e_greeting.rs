#![forbid(unsafe_code)]

//! E2E tests for the hello-world view-model's commands under tokio local
//! tasks with a paused clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::LocalSet;
use viewmodule_core::{IS_VALID, OPERATION_EXECUTING, PropertyName, RunOutcome};
use viewmodule_demo::hello_world::{GreetSettings, HelloWorldViewModel, READY_TO_GREET};

fn vm(delay_ms: u64) -> HelloWorldViewModel {
    HelloWorldViewModel::new(GreetSettings {
        delay: Duration::from_millis(delay_ms),
        fail: false,
    })
    .expect("wiring")
}

#[tokio::test(start_paused = true)]
async fn greeting_disables_itself_and_enables_cancel() {
    LocalSet::new()
        .run_until(async {
            let vm = vm(100);
            assert!(vm.say_hello().execute());
            tokio::task::yield_now().await;

            assert!(vm.core().operation_executing());
            assert!(!vm.ready_to_greet());
            assert!(!vm.say_hello().can_execute());
            assert!(vm.cancel().can_execute());
            assert!(!vm.say_hello().execute(), "single flight");

            tokio::time::sleep(Duration::from_millis(150)).await;
            assert!(!vm.core().operation_executing());
            assert_eq!(vm.say_hello().last_outcome(), Some(RunOutcome::Completed));
            assert!(vm.ready_to_greet());
            assert!(!vm.cancel().can_execute());
            assert_eq!(vm.messages().len(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn ready_to_greet_is_notified_on_start_and_finish() {
    LocalSet::new()
        .run_until(async {
            let vm = vm(50);
            let log: Rc<RefCell<Vec<PropertyName>>> = Rc::default();
            let sink = Rc::clone(&log);
            let _sub = vm
                .core()
                .subscribe_property_changed(move |name| sink.borrow_mut().push(*name));

            vm.say_hello().execute();
            tokio::time::sleep(Duration::from_millis(100)).await;

            let log = log.borrow();
            let flips: Vec<_> = log
                .iter()
                .filter(|n| **n == OPERATION_EXECUTING || **n == READY_TO_GREET)
                .copied()
                .collect();
            assert_eq!(
                flips,
                vec![
                    OPERATION_EXECUTING,
                    READY_TO_GREET,
                    OPERATION_EXECUTING,
                    READY_TO_GREET
                ]
            );
            assert!(!log.contains(&IS_VALID));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_the_greeting() {
    LocalSet::new()
        .run_until(async {
            let vm = vm(2000);
            vm.say_hello().execute();
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(10)).await;

            assert!(vm.cancel().execute());
            tokio::time::sleep(Duration::from_millis(10)).await;

            assert_eq!(vm.say_hello().last_outcome(), Some(RunOutcome::Cancelled));
            assert!(vm.messages().is_empty());
            assert!(vm.say_hello().can_execute());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn editing_names_mid_run_changes_the_greeting() {
    LocalSet::new()
        .run_until(async {
            let vm = vm(100);
            vm.say_hello().execute();
            tokio::task::yield_now().await;
            vm.set_first_name("Bob");
            tokio::time::sleep(Duration::from_millis(200)).await;

            assert_eq!(
                vm.messages(),
                vec!["Hello, Bob Tcholakov. Your name is 13 characters long.".to_string()]
            );
        })
        .await;
}
