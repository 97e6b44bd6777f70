use super::Intent;

// Captures may contain empty strings for alternation branches that did not
// participate in the match; the first non-empty capture is the parameter.
pub fn extract_parameters(intent: Intent, raw_captures: &[String]) -> Vec<String> {
    match intent {
        Intent::SearchLogs | Intent::MarkGoal | Intent::QueryPast => {
            first_non_empty(raw_captures)
                .map(|value| vec![value])
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

fn first_non_empty(raw_captures: &[String]) -> Option<String> {
    raw_captures
        .iter()
        .map(|capture| capture.trim())
        .find(|capture| !capture.is_empty())
        .map(str::to_string)
}
