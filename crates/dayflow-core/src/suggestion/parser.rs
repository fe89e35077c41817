//! Free-text extraction for natural-language requests.
//!
//! Everything here is a pure function of the input text. Anything that
//! cannot be recognized is reported as absent rather than as an error.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::pillar::Cadence;
use crate::timeline::MAX_BLOCK_SECONDS;

const MAX_MINUTES: f64 = (MAX_BLOCK_SECONDS / 60) as f64;

const INTENT_KEYWORDS: &[&str] = &[
    "schedule",
    "book",
    "plan",
    "add",
    "put",
    "block",
    "reserve",
    "remind me",
    "set up",
    "calendar",
    "appointment",
    "meeting",
];

const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "urgently",
    "asap",
    "immediately",
    "right away",
    "as soon as possible",
    "critical",
    "deadline",
];

/// Relative day mentioned in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayRef {
    Yesterday,
    Today,
    Tomorrow,
}

impl DayRef {
    pub fn offset_days(&self) -> i64 {
        match self {
            Self::Yesterday => -1,
            Self::Today => 0,
            Self::Tomorrow => 1,
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric() && c != ':')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_phrase(text: &str, phrases: &[&str]) -> bool {
    let normalized = format!(" {} ", tokenize(text).join(" "));
    phrases
        .iter()
        .any(|phrase| normalized.contains(&format!(" {phrase} ")))
}

// ── Clock times ─────────────────────────────────────────────────────────

fn parse_hour_minute(value: &str) -> Option<(u32, u32)> {
    match value.split_once(':') {
        Some((h, m)) if m.len() == 2 => Some((h.parse().ok()?, m.parse().ok()?)),
        Some(_) => None,
        None => Some((value.parse().ok()?, 0)),
    }
}

fn twelve_hour(value: &str, meridiem: &str) -> Option<NaiveTime> {
    let (hour, minute) = parse_hour_minute(value)?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match meridiem {
        "am" => hour % 12,
        "pm" => hour % 12 + 12,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn split_meridiem(token: &str) -> Option<(&str, &str)> {
    ["am", "pm"]
        .into_iter()
        .find_map(|m| token.strip_suffix(m).map(|rest| (rest, m)))
        .filter(|(rest, _)| !rest.is_empty())
}

/// Explicit clock time: "3pm", "3:30 pm", "15:30", "noon", "at 9".
///
/// A bare hour after "at" from 1 to 7 is read as afternoon.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let tokens = tokenize(text);
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
            "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
            _ => {}
        }

        if let Some((value, meridiem)) = split_meridiem(token) {
            if let Some(time) = twelve_hour(value, meridiem) {
                return Some(time);
            }
        }

        if let Some(next) = tokens.get(i + 1) {
            if matches!(next.as_str(), "am" | "pm") {
                if let Some(time) = twelve_hour(token, next) {
                    return Some(time);
                }
            }
        }

        if token.contains(':') {
            if let Some((hour, minute)) = parse_hour_minute(token) {
                if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                    return Some(time);
                }
            }
        }

        if i > 0 && tokens[i - 1] == "at" {
            if let Ok(hour) = token.parse::<u32>() {
                let hour = if (1..=7).contains(&hour) { hour + 12 } else { hour };
                if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                    return Some(time);
                }
            }
        }
    }
    None
}

// ── Durations ───────────────────────────────────────────────────────────

fn unit_minutes(unit: &str) -> Option<f64> {
    match unit {
        "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60.0),
        _ => None,
    }
}

fn finite_amount(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|a| a.is_finite() && *a >= 0.0)
}

/// "1h30", "1h30m", "2h", "45min", "90m"
fn compact_minutes(token: &str) -> Option<f64> {
    if let Some((hours, rest)) = token.split_once('h') {
        let hours = finite_amount(hours)?;
        let rest = rest.trim_start_matches('r').trim_start_matches('s');
        let minutes = match rest.trim_end_matches(&['m', 'i', 'n', 's'][..]) {
            "" => 0.0,
            digits => finite_amount(digits)?,
        };
        return Some(hours * 60.0 + minutes);
    }
    ["mins", "min", "m"]
        .into_iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .and_then(finite_amount)
}

/// Requested duration: "for 45 minutes", "1h30", "2 hours", "half an hour".
///
/// Anything longer than a day is not a duration this planner can place and
/// reads as absent.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let tokens = tokenize(text);
    let mut total = 0.0_f64;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);

        if token == "half" && next.is_some_and(|n| n == "an" || n == "a") {
            if tokens.get(i + 2).and_then(|u| unit_minutes(u)) == Some(60.0) {
                total += 30.0;
                i += 3;
                continue;
            }
        }
        if matches!(token, "a" | "an") {
            if let Some(factor) = next.and_then(unit_minutes) {
                total += factor;
                i += 2;
                continue;
            }
        }
        if let Some(amount) = finite_amount(token).filter(|a| *a > 0.0) {
            if let Some(factor) = next.and_then(unit_minutes) {
                total += amount * factor;
                i += 2;
                continue;
            }
        }
        if let Some(minutes) = compact_minutes(token) {
            total += minutes;
        }
        i += 1;
    }

    let total = total.round();
    if !(1.0..=MAX_MINUTES).contains(&total) {
        return None;
    }
    Duration::try_minutes(total as i64)
}

// ── Cadence ─────────────────────────────────────────────────────────────

fn count_word(token: &str) -> Option<u32> {
    match token {
        "once" | "one" => Some(1),
        "twice" | "two" => Some(2),
        "thrice" | "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        other => other.trim_end_matches('x').parse().ok().filter(|n| *n > 0),
    }
}

/// Frequency preceding a period word: "3 times a", "twice per", "3x a".
fn frequency_before(tokens: &[String], period: usize) -> Option<u32> {
    let connector = tokens.get(period.checked_sub(1)?)?;
    if !matches!(connector.as_str(), "a" | "per" | "each" | "every") {
        return None;
    }
    if matches!(connector.as_str(), "each" | "every") {
        return Some(1);
    }
    let before = tokens.get(period.checked_sub(2)?)?;
    if before == "times" {
        return count_word(tokens.get(period.checked_sub(3)?)?);
    }
    count_word(before)
}

/// Recurrence: "daily", "3 times a week", "twice a month", "as needed".
pub fn parse_cadence(text: &str) -> Option<Cadence> {
    let tokens = tokenize(text);
    if contains_phrase(text, &["as needed", "when needed", "as required"]) {
        return Some(Cadence::AsNeeded);
    }
    if contains_phrase(text, &["daily", "every day", "each day", "everyday"]) {
        return Some(Cadence::Daily);
    }
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "week" => return Some(Cadence::Weekly(frequency_before(&tokens, i).unwrap_or(1))),
            "weekly" => return Some(Cadence::Weekly(1)),
            "month" => return Some(Cadence::Monthly(frequency_before(&tokens, i).unwrap_or(1))),
            "monthly" => return Some(Cadence::Monthly(1)),
            _ => {}
        }
    }
    None
}

// ── Keywords ────────────────────────────────────────────────────────────

pub fn parse_day_ref(text: &str) -> Option<DayRef> {
    tokenize(text).iter().find_map(|t| match t.as_str() {
        "yesterday" => Some(DayRef::Yesterday),
        "today" | "tonight" => Some(DayRef::Today),
        "tomorrow" => Some(DayRef::Tomorrow),
        _ => None,
    })
}

pub fn has_scheduling_intent(text: &str) -> bool {
    contains_phrase(text, INTENT_KEYWORDS)
}

pub fn has_urgency(text: &str) -> bool {
    contains_phrase(text, URGENCY_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn clock_times() {
        assert_eq!(parse_time_of_day("Dentist at 3pm"), Some(hm(15, 0)));
        assert_eq!(parse_time_of_day("call at 3:30 pm."), Some(hm(15, 30)));
        assert_eq!(parse_time_of_day("standup 09:15 daily"), Some(hm(9, 15)));
        assert_eq!(parse_time_of_day("lunch at noon"), Some(hm(12, 0)));
        assert_eq!(parse_time_of_day("gym at 6"), Some(hm(18, 0)));
        assert_eq!(parse_time_of_day("12am snack"), Some(hm(0, 0)));
        assert_eq!(parse_time_of_day("review for 45 minutes"), None);
        assert_eq!(parse_time_of_day("at 25:00"), None);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("for 45 minutes"), Some(Duration::minutes(45)));
        assert_eq!(parse_duration("block 1h30 for writing"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("2 hours of focus"), Some(Duration::minutes(120)));
        assert_eq!(parse_duration("1 hour 15 minutes"), Some(Duration::minutes(75)));
        assert_eq!(parse_duration("half an hour walk"), Some(Duration::minutes(30)));
        assert_eq!(parse_duration("an hour"), Some(Duration::minutes(60)));
        assert_eq!(parse_duration("20min break"), Some(Duration::minutes(20)));
        assert_eq!(parse_duration("meet at 3pm"), None);
    }

    #[test]
    fn absurd_durations_read_as_absent() {
        assert_eq!(parse_duration("for 1e300 hours"), None);
        assert_eq!(parse_duration("for 9223372036854775807 minutes"), None);
        assert_eq!(parse_duration("1h9223372036854775807m"), None);
        assert_eq!(parse_duration("inf hours"), None);
        assert_eq!(parse_duration("for 25 hours"), None);
        assert_eq!(parse_duration("for 24 hours"), Some(Duration::hours(24)));
    }

    #[test]
    fn cadences() {
        assert_eq!(parse_cadence("exercise 3 times a week"), Some(Cadence::Weekly(3)));
        assert_eq!(parse_cadence("call mom twice a month"), Some(Cadence::Monthly(2)));
        assert_eq!(parse_cadence("meditate daily"), Some(Cadence::Daily));
        assert_eq!(parse_cadence("run 3x per week"), Some(Cadence::Weekly(3)));
        assert_eq!(parse_cadence("every week review"), Some(Cadence::Weekly(1)));
        assert_eq!(parse_cadence("deep clean as needed"), Some(Cadence::AsNeeded));
        assert_eq!(parse_cadence("read a book"), None);
    }

    #[test]
    fn keywords_and_days() {
        assert!(has_scheduling_intent("Please schedule a dentist visit"));
        assert!(has_scheduling_intent("remind me to stretch"));
        assert!(!has_scheduling_intent("I feel tired"));
        assert!(has_urgency("this is urgent!"));
        assert!(has_urgency("do it right away"));
        assert!(!has_urgency("whenever"));
        assert_eq!(parse_day_ref("what did I do yesterday?"), Some(DayRef::Yesterday));
        assert_eq!(parse_day_ref("Tomorrow at 9am"), Some(DayRef::Tomorrow));
        assert_eq!(parse_day_ref("sometime"), None);
    }
}
