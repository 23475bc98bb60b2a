//! Scheduling agent
//!
//! Drives the slot-discovery-and-booking dialogue. Each turn is one oracle
//! call proposing at most one action, which is validated and executed
//! locally. The only durable side effect in the whole assistant — flipping
//! a slot to taken — happens here, and so does the only mutation of the
//! session's `booking_status`.

use std::sync::Arc;

use serde_json::json;

use crate::catalog::RoleCatalog;
use crate::core::{AssistantError, AssistantResult};
use crate::llm::{LlmProvider, ToolDefinition};
use crate::session::{BookingStatus, Session};

use super::action::{SchedulerAction, SearchArgs, BOOK_TOOL, SEARCH_TOOL};
use super::slots::SlotStore;

/// Cap on slots returned for the requested window
const SEARCH_LIMIT: usize = 10;
/// Cap on the full-day fallback listing
const FALLBACK_LIMIT: usize = 5;

const ALREADY_BOOKED: &str =
    "It looks like you already have an interview booked. Can I help with anything else?";

const NO_ROLE: &str = "My apologies, I need to know which role we're discussing before I can \
schedule an interview. Could you remind me?";

const SLOT_TAKEN: &str = "It seems that slot was just taken or does not exist. Please try \
searching for another time.";

const STORE_TROUBLE: &str = "I'm having trouble accessing the interview schedule right now. \
Please try again in a moment.";

/// Multi-turn scheduling dialogue over the slot store
pub struct SchedulingAgent {
    llm: Arc<dyn LlmProvider>,
    slots: Arc<dyn SlotStore>,
    catalog: RoleCatalog,
}

impl SchedulingAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, slots: Arc<dyn SlotStore>, catalog: RoleCatalog) -> Self {
        Self {
            llm,
            slots,
            catalog,
        }
    }

    /// Handle one scheduling turn.
    ///
    /// The session's role and booking status gate the oracle call; the
    /// oracle only ever contributes date/time extraction and action
    /// selection, never role identity. Slot store problems come back as
    /// user-facing text, not as errors.
    pub async fn handle(
        &self,
        session: &mut Session,
        message: &str,
        trace: &mut Vec<String>,
    ) -> AssistantResult<String> {
        trace.push("Executing scheduling agent...".to_string());

        if session.is_booked() {
            trace.push("Interview already booked. Informing user.".to_string());
            return Ok(ALREADY_BOOKED.to_string());
        }

        let Some(role) = session.current_role else {
            trace.push("No role state available for scheduling".to_string());
            return Ok(NO_ROLE.to_string());
        };
        trace.push(format!("Reading role state: '{role}'"));

        let info = self.catalog.info(role);
        let system = build_system_prompt(info.friendly_name, role.as_str());
        let tools = tool_definitions();

        // The latest user turn is passed separately; everything before it
        // is the conversation context.
        let prior = session.history.len().saturating_sub(1);
        let decision = self
            .llm
            .propose_action(&system, &session.history[..prior], message, &tools)
            .await
            .map_err(|e| AssistantError::Generation(e.to_string()))?;

        if let Some(call) = &decision.tool_call {
            trace.push(format!(
                "Scheduling agent decided to call tool '{}' with arguments: {}",
                call.name, call.arguments
            ));
            // The executed action always uses the session's role, whatever
            // the model put in the arguments.
            trace.push(format!("Forcing role_id to: '{role}'"));
        }

        let action = match SchedulerAction::from_decision(decision) {
            Ok(action) => action,
            Err(reask) => {
                trace.push("Proposed action was malformed; asking the user again.".to_string());
                return Ok(reask);
            }
        };

        match action {
            SchedulerAction::Reply(text) => Ok(text),
            SchedulerAction::Search(args) => Ok(self
                .search(info.position_name, info.friendly_name, &args, trace)
                .await),
            SchedulerAction::Book(args) => {
                match self
                    .slots
                    .book_slot(info.position_name, args.date, args.time)
                    .await
                {
                    Ok(true) => {
                        trace.push(
                            "Booking successful. Updating session state to 'confirmed'.".to_string(),
                        );
                        session.booking_status = BookingStatus::Confirmed;
                        Ok(format!(
                            "Success! Your interview for the {} role has been booked for {} at {}. \
                             Would you like to ask any more questions about the role?",
                            info.friendly_name,
                            args.date.format("%Y-%m-%d"),
                            args.time.format("%H:%M"),
                        ))
                    }
                    Ok(false) => {
                        trace.push("Booking failed: slot taken or nonexistent.".to_string());
                        Ok(SLOT_TAKEN.to_string())
                    }
                    Err(e) => {
                        trace.push(format!("Slot store error during booking: {e}"));
                        Ok(STORE_TROUBLE.to_string())
                    }
                }
            }
        }
    }

    async fn search(
        &self,
        position: &str,
        friendly_name: &str,
        args: &SearchArgs,
        trace: &mut Vec<String>,
    ) -> String {
        let (start, end) = args.time_preference.clock_range();
        let date = args.date.format("%Y-%m-%d");

        let found = match self
            .slots
            .find_slots(position, args.date, start, end, SEARCH_LIMIT)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                trace.push(format!("Slot store error during search: {e}"));
                return STORE_TROUBLE.to_string();
            }
        };

        if !found.is_empty() {
            let lines: Vec<String> = found.iter().map(|s| s.display()).collect();
            return format!(
                "Great! I found these available slots for {date} {}:\n{}",
                args.time_preference.label(),
                lines.join("\n"),
            );
        }

        // Nothing in the requested window; offer anything else that day,
        // with no time filter at all.
        let alternatives = match self
            .slots
            .find_day_slots(position, args.date, FALLBACK_LIMIT)
            .await
        {
            Ok(alternatives) => alternatives,
            Err(e) => {
                trace.push(format!("Slot store error during fallback search: {e}"));
                return STORE_TROUBLE.to_string();
            }
        };

        if !alternatives.is_empty() {
            let lines: Vec<String> = alternatives.iter().map(|s| s.display()).collect();
            format!(
                "Unfortunately, there are no slots available in the {} on {date}. However, I did \
                 find these other times on that day:\n{}",
                args.time_preference.label(),
                lines.join("\n"),
            )
        } else {
            format!(
                "I'm sorry, but there are no available interview slots at all on {date} for the \
                 {friendly_name} role."
            )
        }
    }
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            SEARCH_TOOL,
            "Finds available interview slots for the role on a given date and time preference.",
            json!({
                "type": "object",
                "properties": {
                    "role_id": {
                        "type": "string",
                        "description": "The canonical ID for the job role."
                    },
                    "date_preference": {
                        "type": "string",
                        "description": "The desired date in YYYY-MM-DD format."
                    },
                    "time_preference": {
                        "type": "string",
                        "description": "A string such as 'morning', 'afternoon', or 'any'."
                    }
                },
                "required": ["role_id", "date_preference"]
            }),
        ),
        ToolDefinition::new(
            BOOK_TOOL,
            "Books an interview slot by marking it taken.",
            json!({
                "type": "object",
                "properties": {
                    "role_id": {
                        "type": "string",
                        "description": "The canonical ID for the job role."
                    },
                    "date": {
                        "type": "string",
                        "description": "The exact date of the slot to book in YYYY-MM-DD format."
                    },
                    "time": {
                        "type": "string",
                        "description": "The exact time of the slot to book in HH:MM format."
                    }
                },
                "required": ["role_id", "date", "time"]
            }),
        ),
    ]
}

fn build_system_prompt(friendly_name: &str, role_id: &str) -> String {
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d");
    format!(
        r#"You are a helpful and precise Scheduling Assistant. Your only goal is to get an interview booked for the user.

**CRITICAL:** You are scheduling for the **{friendly_name}** role (role_id: '{role_id}').
Today's date is {today}.
**Booking Status:** An interview has **not yet** been booked.

**IMPORTANT:** When calling tools, ALWAYS use role_id = '{role_id}' for the {friendly_name} position.

Follow this process strictly:
1.  **Gather Information:** If you don't know the user's desired date and time preference, ask for it.
2.  **Search for Slots:** Once you have preferences, use the `search_slots` tool with role_id = '{role_id}'.
3.  **Present Options:** Clearly present the available slots.
4.  **Await Confirmation:** The user must explicitly confirm which slot they want.
5.  **Book the Slot:** Once confirmed, you must call the `book_slot` tool with role_id = '{role_id}' and the exact date and time.
6.  **Handle Declines:** If the user declines, ask for a different preference and restart from Step 2.
"#
    )
}
