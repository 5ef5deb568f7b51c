//! Property-based tests for dispatch decisions

#[path = "../test_utils/mod.rs"]
mod test_utils;

use portal_launcher::models::{Action, DEFAULT_TERMINALS};
use portal_launcher::DispatchOutcome;
use proptest::prelude::*;
use std::sync::Arc;
use test_utils::{dispatcher_with, test_config, MockBridge, MockPtyBackend, RecordingSink};

fn installed_subset(mask: u8) -> Vec<&'static str> {
    ["ptyxis", "konsole", "gnome-terminal", "xterm"]
        .into_iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, name)| name)
        .collect()
}

proptest! {
    #[test]
    fn test_whitespace_scripts_spawn_nothing(script in "[ \\t\\r\\n]{0,16}") {
        let bridge = Arc::new(MockBridge::with_installed(&["xterm"]));
        let backend = Arc::new(MockPtyBackend::new());
        let sink = RecordingSink::new();
        let (dispatcher, _) =
            dispatcher_with(test_config(), bridge.clone(), backend.clone(), sink.clone());

        let outcome = tokio_test::block_on(dispatcher.run("Blank", &script));

        prop_assert!(matches!(outcome, DispatchOutcome::NothingToRun));
        prop_assert_eq!(sink.count(), 1);
        prop_assert!(sink.results()[0].exit_code.is_none());
        prop_assert!(bridge.probes().is_empty());
        prop_assert_eq!(backend.spawn_count(), 0);
    }

    #[test]
    fn test_probe_count_matches_first_available(mask in 0u8..16) {
        let installed = installed_subset(mask);
        let bridge = Arc::new(MockBridge::with_installed(&installed));
        let backend = Arc::new(MockPtyBackend::exiting_with(0));
        let (dispatcher, _) = dispatcher_with(
            test_config(),
            bridge.clone(),
            backend.clone(),
            RecordingSink::new(),
        );

        let outcome = tokio_test::block_on(dispatcher.run("Probe", "true"));

        let first = DEFAULT_TERMINALS
            .iter()
            .position(|c| installed.iter().any(|name| *name == c.program));
        match first {
            Some(k) => {
                prop_assert_eq!(bridge.probes().len(), k + 1);
                prop_assert_eq!(bridge.launches().len(), 1);
                prop_assert_eq!(backend.spawn_count(), 0);
                prop_assert!(matches!(outcome, DispatchOutcome::HostLaunched { .. }), "expected HostLaunched outcome");
            }
            None => {
                prop_assert_eq!(bridge.probes().len(), DEFAULT_TERMINALS.len());
                prop_assert!(bridge.launches().is_empty());
                prop_assert_eq!(backend.spawn_count(), 1);
                prop_assert!(matches!(outcome, DispatchOutcome::Embedded(_)));
            }
        }
    }

    #[test]
    fn test_launched_script_is_trimmed(
        body in "[a-z][a-z0-9 ]{0,20}[a-z0-9]",
        pad in "[ \\t]{0,4}",
    ) {
        let bridge = Arc::new(MockBridge::with_installed(&["konsole"]));
        let (dispatcher, _) = dispatcher_with(
            test_config(),
            bridge.clone(),
            Arc::new(MockPtyBackend::new()),
            RecordingSink::new(),
        );

        let script = format!("{}{}{}", pad, body, pad);
        tokio_test::block_on(dispatcher.run("Trim", &script));

        let launches = bridge.launches();
        prop_assert_eq!(launches.len(), 1);
        prop_assert_eq!(launches[0].last().unwrap(), &body);
    }

    #[test]
    fn test_title_always_matches_itself(title in "[A-Za-z ]{1,30}") {
        prop_assume!(!title.trim().is_empty());
        let action = Action::new(title.clone(), "true");
        prop_assert!(action.matches(&title.to_uppercase()));
        prop_assert!(action.matches(&title.to_lowercase()));
    }
}
