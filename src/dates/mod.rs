use chrono::{Datelike, Days, NaiveDate, Weekday};

// Resolution precedence: exact keyword, bare weekday, "last <weekday>",
// ISO literal, then failure. A bare weekday is the most recent matching
// date strictly before `today`; "last <weekday>" is a further week back.
pub fn resolve_day_reference(reference: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = reference.trim().to_lowercase();

    match token.as_str() {
        "today" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }

    if let Some(weekday) = parse_weekday(&token) {
        return most_recent_weekday(weekday, today);
    }

    if let Some(rest) = token.strip_prefix("last ") {
        if let Some(weekday) = parse_weekday(rest.trim()) {
            return most_recent_weekday(weekday, today)
                .and_then(|date| date.checked_sub_days(Days::new(7)));
        }
    }

    NaiveDate::parse_from_str(&token, "%Y-%m-%d").ok()
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    match token {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

// Never returns `today` itself: a reference to the current weekday steps
// back a full week.
fn most_recent_weekday(weekday: Weekday, today: NaiveDate) -> Option<NaiveDate> {
    let gap = (today.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    let gap = if gap == 0 { 7 } else { gap };
    today.checked_sub_days(Days::new(u64::from(gap)))
}
