//! Conversation termination
//!
//! Pure classification of sign-off phrasing into a closing message. No
//! tool calls, no retrieval; firing this always retires the session.

use crate::session::BookingStatus;

const FAREWELL_PHRASES: [&str; 6] = [
    "thank you, that's all",
    "goodbye",
    "no more questions",
    "that's it",
    "thanks, bye",
    "end of conversation",
];

const DISINTEREST_PHRASES: [&str; 4] = [
    "not interested",
    "no interest",
    "not for me",
    "not what i'm looking for",
];

const NOTHING_ELSE_PHRASES: [&str; 3] = ["no more questions", "that's all", "nothing else"];

const FAREWELL: &str = "Thank you for your time. Have a great day!";

const DECLINED: &str = "I understand. Thank you for your interest in our company. If you change \
your mind or have any questions in the future, feel free to reach out. Have a great day!";

const BOOKED_SEND_OFF: &str = "Perfect! Your interview has been confirmed. We look forward to \
meeting you. Have a great day!";

/// Select the closing message for a terminating turn.
///
/// Matches the message against the fixed phrase sets; anything
/// unrecognized falls back to the generic farewell.
pub fn closing_message(message: &str, booking_status: BookingStatus) -> &'static str {
    let lower = message.to_lowercase();

    // Sign-off phrases win outright, even for a booked candidate; the
    // confirmation send-off only covers nothing-else phrasings that are
    // not themselves sign-offs.
    if FAREWELL_PHRASES.iter().any(|p| lower.contains(p)) {
        return FAREWELL;
    }

    if DISINTEREST_PHRASES.iter().any(|p| lower.contains(p)) {
        return DECLINED;
    }

    if booking_status == BookingStatus::Confirmed
        && NOTHING_ELSE_PHRASES.iter().any(|p| lower.contains(p))
    {
        return BOOKED_SEND_OFF;
    }

    FAREWELL
}
