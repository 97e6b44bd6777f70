use crate::settings::CustomCommand;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod extract;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Intent {
    LogEntry,
    ViewEntry,
    SearchLogs,
    TimeTracking,
    SetGoals,
    MarkGoal,
    StartPomodoro,
    LogMood,
    QueryPast,
    Unclassified,
}

impl Intent {
    pub fn from_name(name: &str) -> Option<Intent> {
        match name {
            "log_entry" => Some(Intent::LogEntry),
            "view_entry" => Some(Intent::ViewEntry),
            "search_logs" => Some(Intent::SearchLogs),
            "time_tracking" => Some(Intent::TimeTracking),
            "set_goals" => Some(Intent::SetGoals),
            "mark_goal" => Some(Intent::MarkGoal),
            "start_pomodoro" => Some(Intent::StartPomodoro),
            "log_mood" => Some(Intent::LogMood),
            "query_past" => Some(Intent::QueryPast),
            _ => None,
        }
    }

    pub fn requires_parameter(self) -> bool {
        matches!(
            self,
            Intent::SearchLogs | Intent::MarkGoal | Intent::QueryPast
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommand {
    pub intent: Intent,
    pub parameters: Vec<String>,
}

// Declaration order is match order. Group 1 of every pattern is an
// alternation chooser and is discarded; groups 2+ carry data.
pub const BUILTIN_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::LogEntry,
        &[
            r"log (today|an entry|a standup)",
            r"create (a log|an entry|a standup)",
            r"start (logging|a log entry)",
        ],
    ),
    (
        Intent::ViewEntry,
        &[
            r"show (today's log|today's entry|my log|my entry)",
            r"view (today's log|today's entry|my log|my entry)",
            r"display (today's log|today's entry|my log|my entry)",
        ],
    ),
    (
        Intent::SearchLogs,
        &[
            r"search (for|logs|entries) (.+)",
            r"find (logs|entries) (.+)",
            r"look for (logs|entries) (.+)",
        ],
    ),
    (
        Intent::TimeTracking,
        &[
            r"show (time tracking|time stats|time statistics)",
            r"view (time tracking|time stats|time statistics)",
            r"how much time (did i spend|have i spent)",
        ],
    ),
    (
        Intent::SetGoals,
        &[
            r"set (goals|weekly goals)",
            r"create (goals|weekly goals)",
            r"add (goals|weekly goals)",
        ],
    ),
    (
        Intent::MarkGoal,
        &[
            r"(mark) goal (.+?)(?: as done| as complete| done| complete)?$",
            r"(complete|finish) goal (.+)",
        ],
    ),
    (
        Intent::StartPomodoro,
        &[
            r"start (a pomodoro|pomodoro|timer)",
            r"begin (a pomodoro|pomodoro|timer)",
            r"pomodoro (start|begin)",
        ],
    ),
    (
        Intent::LogMood,
        &[
            r"log (my mood|mood)",
            r"set (my mood|mood)",
            r"record (my mood|mood)",
        ],
    ),
    (
        Intent::QueryPast,
        &[
            r"what did i (do|work on) on (.+)",
            r"what did i (do|work on) (last .+)",
            r"show me (what i did|my log|my entry) (?:on|for) (.+)",
            r"find (what i did|my log|my entry) (?:on|for) (.+)",
        ],
    ),
];

#[derive(Debug, Clone)]
struct CompiledPattern {
    intent: Intent,
    regex: Regex,
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    table: Vec<CompiledPattern>,
}

impl IntentClassifier {
    pub fn builtin() -> Self {
        Self::with_custom_commands(&[])
    }

    // Custom commands append after the built-in table and so match with
    // lower priority. Entries naming an unknown intent and patterns that
    // fail to compile are skipped, never matched.
    pub fn with_custom_commands(custom_commands: &[CustomCommand]) -> Self {
        let mut table = Vec::new();
        for (intent, patterns) in BUILTIN_PATTERNS {
            for pattern in *patterns {
                let regex = Regex::new(pattern).expect("built-in pattern must compile");
                table.push(CompiledPattern {
                    intent: *intent,
                    regex,
                });
            }
        }
        for command in custom_commands {
            let Some(intent) = Intent::from_name(&command.intent) else {
                tracing::warn!(
                    intent = %command.intent,
                    "skipping custom command with unknown intent"
                );
                continue;
            };
            for pattern in &command.patterns {
                match Regex::new(pattern) {
                    Ok(regex) => table.push(CompiledPattern { intent, regex }),
                    Err(err) => {
                        tracing::warn!(%pattern, "skipping invalid custom pattern: {err}");
                    }
                }
            }
        }
        Self { table }
    }

    pub fn classify(&self, text: &str) -> (Intent, Vec<String>) {
        let lowered = text.to_lowercase();
        for entry in &self.table {
            if let Some(captures) = entry.regex.captures(&lowered) {
                let raw_captures = captures
                    .iter()
                    .skip(2)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return (entry.intent, raw_captures);
            }
        }
        (Intent::Unclassified, Vec::new())
    }

    pub fn interpret(&self, text: &str) -> ParsedCommand {
        let (intent, raw_captures) = self.classify(text);
        ParsedCommand {
            intent,
            parameters: extract::extract_parameters(intent, &raw_captures),
        }
    }
}
