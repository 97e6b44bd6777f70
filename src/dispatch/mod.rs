use crate::dates::resolve_day_reference;
use crate::intent::{Intent, ParsedCommand};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
#[error("action handler failed: {0}")]
pub struct ActionError(pub String);

// One capability per voice-triggerable action. Adding a new action means
// extending this set, not attaching arbitrary callables.
pub trait JournalActions: Send + Sync {
    fn log_entry(&self) -> Result<Value, ActionError>;
    fn view_entry(&self) -> Result<Value, ActionError>;
    fn search_logs(&self, term: &str) -> Result<Value, ActionError>;
    fn time_tracking(&self) -> Result<Value, ActionError>;
    fn set_goals(&self) -> Result<Value, ActionError>;
    fn mark_goal(&self, identifier: &str) -> Result<Value, ActionError>;
    fn start_pomodoro(&self) -> Result<Value, ActionError>;
    fn log_mood(&self) -> Result<Value, ActionError>;
    fn query_past(&self, date: NaiveDate) -> Result<Value, ActionError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DispatchOutcome {
    Dispatched { intent: Intent, outcome: Value },
    MissingParameter { intent: Intent },
    UnresolvedDate { token: String },
    UnsupportedIntent { intent: Intent },
}

pub struct CommandDispatcher {
    actions: Arc<dyn JournalActions>,
}

impl CommandDispatcher {
    pub fn new(actions: Arc<dyn JournalActions>) -> Self {
        Self { actions }
    }

    pub fn dispatch(
        &self,
        command: &ParsedCommand,
        today: NaiveDate,
    ) -> Result<DispatchOutcome, ActionError> {
        tracing::debug!(intent = ?command.intent, "dispatching voice command");
        let outcome = match command.intent {
            Intent::Unclassified => {
                return Ok(DispatchOutcome::UnsupportedIntent {
                    intent: Intent::Unclassified,
                })
            }
            Intent::LogEntry => self.actions.log_entry()?,
            Intent::ViewEntry => self.actions.view_entry()?,
            Intent::TimeTracking => self.actions.time_tracking()?,
            Intent::SetGoals => self.actions.set_goals()?,
            Intent::StartPomodoro => self.actions.start_pomodoro()?,
            Intent::LogMood => self.actions.log_mood()?,
            Intent::SearchLogs => {
                let Some(term) = first_parameter(command) else {
                    return Ok(DispatchOutcome::MissingParameter {
                        intent: Intent::SearchLogs,
                    });
                };
                self.actions.search_logs(term)?
            }
            Intent::MarkGoal => {
                let Some(identifier) = first_parameter(command) else {
                    return Ok(DispatchOutcome::MissingParameter {
                        intent: Intent::MarkGoal,
                    });
                };
                self.actions.mark_goal(identifier)?
            }
            Intent::QueryPast => {
                let Some(reference) = first_parameter(command) else {
                    return Ok(DispatchOutcome::MissingParameter {
                        intent: Intent::QueryPast,
                    });
                };
                let Some(date) = resolve_day_reference(reference, today) else {
                    return Ok(DispatchOutcome::UnresolvedDate {
                        token: reference.to_string(),
                    });
                };
                self.actions.query_past(date)?
            }
        };
        Ok(DispatchOutcome::Dispatched {
            intent: command.intent,
            outcome,
        })
    }
}

fn first_parameter(command: &ParsedCommand) -> Option<&str> {
    command
        .parameters
        .iter()
        .map(String::as_str)
        .find(|parameter| !parameter.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingActions {
        calls: Mutex<Vec<String>>,
        fail_next: bool,
    }

    impl RecordingActions {
        fn record(&self, call: impl Into<String>) -> Result<Value, ActionError> {
            let call = call.into();
            self.calls
                .lock()
                .expect("calls lock should not be poisoned")
                .push(call.clone());
            if self.fail_next {
                return Err(ActionError(format!("{call} unavailable")));
            }
            Ok(json!({ "handled": call }))
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .expect("calls lock should not be poisoned")
                .clone()
        }
    }

    impl JournalActions for RecordingActions {
        fn log_entry(&self) -> Result<Value, ActionError> {
            self.record("log_entry")
        }
        fn view_entry(&self) -> Result<Value, ActionError> {
            self.record("view_entry")
        }
        fn search_logs(&self, term: &str) -> Result<Value, ActionError> {
            self.record(format!("search_logs:{term}"))
        }
        fn time_tracking(&self) -> Result<Value, ActionError> {
            self.record("time_tracking")
        }
        fn set_goals(&self) -> Result<Value, ActionError> {
            self.record("set_goals")
        }
        fn mark_goal(&self, identifier: &str) -> Result<Value, ActionError> {
            self.record(format!("mark_goal:{identifier}"))
        }
        fn start_pomodoro(&self) -> Result<Value, ActionError> {
            self.record("start_pomodoro")
        }
        fn log_mood(&self) -> Result<Value, ActionError> {
            self.record("log_mood")
        }
        fn query_past(&self, date: NaiveDate) -> Result<Value, ActionError> {
            self.record(format!("query_past:{date}"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
    }

    fn command(intent: Intent, parameters: &[&str]) -> ParsedCommand {
        ParsedCommand {
            intent,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn parameterless_intent_invokes_its_handler() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::LogEntry, &[]), today())
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                intent: Intent::LogEntry,
                outcome: json!({ "handled": "log_entry" }),
            }
        );
        assert_eq!(actions.calls(), vec!["log_entry".to_string()]);
    }

    #[test]
    fn search_logs_passes_the_term_through() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::SearchLogs, &["standup"]), today())
            .expect("dispatch should succeed");
        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(actions.calls(), vec!["search_logs:standup".to_string()]);
    }

    #[test]
    fn mark_goal_without_parameter_skips_the_handler() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::MarkGoal, &[]), today())
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            DispatchOutcome::MissingParameter {
                intent: Intent::MarkGoal
            }
        );
        assert!(actions.calls().is_empty());
    }

    #[test]
    fn blank_parameter_counts_as_missing() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::SearchLogs, &["   "]), today())
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            DispatchOutcome::MissingParameter {
                intent: Intent::SearchLogs
            }
        );
        assert!(actions.calls().is_empty());
    }

    #[test]
    fn query_past_resolves_the_reference_before_invoking() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::QueryPast, &["monday"]), today())
            .expect("dispatch should succeed");
        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(actions.calls(), vec!["query_past:2024-06-10".to_string()]);
    }

    #[test]
    fn unresolvable_reference_reports_the_token() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::QueryPast, &["someday"]), today())
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            DispatchOutcome::UnresolvedDate {
                token: "someday".to_string()
            }
        );
        assert!(actions.calls().is_empty());
    }

    #[test]
    fn unclassified_is_unsupported() {
        let actions = Arc::new(RecordingActions::default());
        let dispatcher = CommandDispatcher::new(actions.clone());
        let outcome = dispatcher
            .dispatch(&command(Intent::Unclassified, &[]), today())
            .expect("dispatch should succeed");
        assert_eq!(
            outcome,
            DispatchOutcome::UnsupportedIntent {
                intent: Intent::Unclassified
            }
        );
        assert!(actions.calls().is_empty());
    }

    #[test]
    fn handler_failure_propagates_as_an_error() {
        let actions = Arc::new(RecordingActions {
            fail_next: true,
            ..RecordingActions::default()
        });
        let dispatcher = CommandDispatcher::new(actions);
        let result = dispatcher.dispatch(&command(Intent::LogMood, &[]), today());
        let err = result.expect_err("handler failure should propagate");
        assert!(err.to_string().contains("log_mood unavailable"));
    }

    #[test]
    fn parameter_requirements_follow_the_capability_set() {
        assert!(Intent::SearchLogs.requires_parameter());
        assert!(Intent::MarkGoal.requires_parameter());
        assert!(Intent::QueryPast.requires_parameter());
        assert!(!Intent::LogEntry.requires_parameter());
        assert!(!Intent::Unclassified.requires_parameter());
    }
}
