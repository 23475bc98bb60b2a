//! Scheduler action dispatch
//!
//! The oracle's proposal is mapped onto a closed tagged variant before
//! anything executes: reply in text, search for slots, or book one. Any
//! `role_id` in the proposed arguments is deliberately dropped here — role
//! identity always comes from the session, never from the model.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::llm::LlmDecision;

/// Tool names offered to the model
pub const SEARCH_TOOL: &str = "search_slots";
pub const BOOK_TOOL: &str = "book_slot";

/// Coarse time-of-day preference, mapped to a half-open clock range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePreference {
    Morning,
    Afternoon,
    Any,
}

impl TimePreference {
    pub fn parse(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("morning") {
            TimePreference::Morning
        } else if lower.contains("afternoon") {
            TimePreference::Afternoon
        } else {
            TimePreference::Any
        }
    }

    /// Clock range as `[start, end)`. Slots land on whole minutes, so the
    /// one-second slack on the inclusive upper bounds is unobservable.
    pub fn clock_range(&self) -> (NaiveTime, NaiveTime) {
        match self {
            TimePreference::Morning => (hms(9, 0, 0), hms(12, 0, 0)),
            TimePreference::Afternoon => (hms(12, 1, 0), hms(17, 0, 1)),
            TimePreference::Any => (hms(9, 0, 0), hms(17, 0, 1)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePreference::Morning => "morning",
            TimePreference::Afternoon => "afternoon",
            TimePreference::Any => "any",
        }
    }
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    // In-range literals only.
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

/// Arguments for a slot search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    pub date: NaiveDate,
    pub time_preference: TimePreference,
}

/// Arguments for a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookArgs {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// The locally-validated action derived from one oracle proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerAction {
    /// No tool call; the model answered (or asked a question) in text
    Reply(String),
    Search(SearchArgs),
    Book(BookArgs),
}

impl SchedulerAction {
    /// Map an oracle decision onto the closed action set.
    ///
    /// `Err` carries a user-facing re-ask for malformed or unknown
    /// proposals; it never escapes as a protocol error.
    pub fn from_decision(decision: LlmDecision) -> Result<SchedulerAction, String> {
        let Some(call) = decision.tool_call else {
            let text = decision
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| {
                    "Could you share your preferred date and time for the interview?".to_string()
                });
            return Ok(SchedulerAction::Reply(text));
        };

        match call.name.as_str() {
            SEARCH_TOOL => {
                let date = parse_date(&call.arguments, "date_preference")?;
                let time_preference = call
                    .arguments
                    .get("time_preference")
                    .and_then(Value::as_str)
                    .map(TimePreference::parse)
                    .unwrap_or(TimePreference::Any);
                Ok(SchedulerAction::Search(SearchArgs {
                    date,
                    time_preference,
                }))
            }
            BOOK_TOOL => {
                let date = parse_date(&call.arguments, "date")?;
                let time = call
                    .arguments
                    .get("time")
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
                    .ok_or_else(|| {
                        "I didn't catch the exact time of the slot you'd like. Could you confirm \
                         the time, for example 14:00?"
                            .to_string()
                    })?;
                Ok(SchedulerAction::Book(BookArgs { date, time }))
            }
            other => Err(format!(
                "I wasn't able to process that ({other} is not something I can do). Could you \
                 rephrase your scheduling request?"
            )),
        }
    }
}

fn parse_date(arguments: &Value, field: &str) -> Result<NaiveDate, String> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| {
            "I need a specific date to check the schedule. Which day works for you, for example \
             2026-09-01?"
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_preference_ranges() {
        let (start, end) = TimePreference::Morning.clock_range();
        assert_eq!(start, hms(9, 0, 0));
        assert_eq!(end, hms(12, 0, 0));

        let (start, end) = TimePreference::Afternoon.clock_range();
        assert_eq!(start, hms(12, 1, 0));
        assert!(hms(17, 0, 0) < end);

        let (start, end) = TimePreference::Any.clock_range();
        assert_eq!(start, hms(9, 0, 0));
        assert!(hms(17, 0, 0) < end);
    }

    #[test]
    fn test_time_preference_parse() {
        assert_eq!(TimePreference::parse("in the Morning"), TimePreference::Morning);
        assert_eq!(TimePreference::parse("afternoon please"), TimePreference::Afternoon);
        assert_eq!(TimePreference::parse("whenever"), TimePreference::Any);
    }

    #[test]
    fn test_search_proposal_maps_to_search() {
        let decision = LlmDecision::tool(
            SEARCH_TOOL,
            json!({
                "role_id": "python_developer",
                "date_preference": "2026-09-01",
                "time_preference": "morning"
            }),
        );
        let action = SchedulerAction::from_decision(decision).unwrap();
        assert_eq!(
            action,
            SchedulerAction::Search(SearchArgs {
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                time_preference: TimePreference::Morning,
            })
        );
    }

    #[test]
    fn test_book_proposal_maps_to_book() {
        let decision = LlmDecision::tool(
            BOOK_TOOL,
            json!({"role_id": "data_analyst", "date": "2026-09-01", "time": "14:00"}),
        );
        let action = SchedulerAction::from_decision(decision).unwrap();
        assert_eq!(
            action,
            SchedulerAction::Book(BookArgs {
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            })
        );
    }

    #[test]
    fn test_text_only_decision_is_reply() {
        let action = SchedulerAction::from_decision(LlmDecision::text("Which day suits you?"))
            .unwrap();
        assert_eq!(action, SchedulerAction::Reply("Which day suits you?".into()));
    }

    #[test]
    fn test_empty_decision_falls_back_to_reask() {
        let action = SchedulerAction::from_decision(LlmDecision {
            text: None,
            tool_call: None,
        })
        .unwrap();
        let SchedulerAction::Reply(text) = action else {
            panic!("expected a reply");
        };
        assert!(text.contains("preferred date and time"));
    }

    #[test]
    fn test_malformed_date_is_user_facing_error() {
        let decision = LlmDecision::tool(SEARCH_TOOL, json!({"date_preference": "tomorrow"}));
        let err = SchedulerAction::from_decision(decision).unwrap_err();
        assert!(err.contains("specific date"));
    }

    #[test]
    fn test_unknown_tool_is_user_facing_error() {
        let decision = LlmDecision::tool("cancel_everything", json!({}));
        let err = SchedulerAction::from_decision(decision).unwrap_err();
        assert!(err.contains("rephrase"));
    }
}
