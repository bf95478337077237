//! # Inbound Response Classification
//!
//! Free-text responses arrive over an unauthenticated, at-least-once
//! channel (the SMS provider webhook). This module turns a raw message
//! body into an accept/reject intent; correlating the message to an
//! outstanding offer is the coordinator's job, because it needs the
//! store.
//!
//! ## Rule order
//!
//! 1. Exact digit replies — `"1"` accepts, `"2"` rejects — take priority
//!    over everything else, because outbound dispatch messages instruct
//!    the driver to "reply 1 to accept, 2 to decline".
//! 2. The accept keyword family, then the reject keyword family. The
//!    first family with any match wins.
//! 3. No match → [`ResponseIntent::Unrecognized`], which must never
//!    mutate state and is queued for manual follow-up.
//!
//! Matching is word-boundary-aware over normalized tokens so that "now"
//! never matches "no" and "broken" never matches "ok".

use serde::{Deserialize, Serialize};

/// The classified intent of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseIntent {
    /// The actor is taking the offer.
    Accept,
    /// The actor is declining the offer.
    Reject,
    /// The message could not be classified. No state change permitted.
    Unrecognized,
}

impl ResponseIntent {
    /// The canonical intent name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for ResponseIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw inbound message as delivered by the SMS provider.
///
/// Nothing here is trusted: `from` is normalized and matched against
/// registered driver numbers by the coordinator, and `body` goes through
/// [`classify_intent`]. The provider message id is carried into the
/// audit trail for traceability but is not used for deduplication —
/// idempotency is state-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Source address (the responding phone number).
    pub from: String,
    /// Destination address (the brokerage's provisioned number).
    pub to: String,
    /// Free-text message body.
    pub body: String,
    /// Provider-assigned message id, if the provider sent one.
    pub provider_message_id: Option<String>,
}

/// Single accept/reject words, matched against whole tokens.
const ACCEPT_WORDS: &[&str] = &[
    "confirm", "confirmed", "accept", "accepted", "yes", "ok", "okay", "yep",
];
const REJECT_WORDS: &[&str] = &[
    "reject", "rejected", "decline", "declined", "no", "cant", "cannot", "busy", "unavailable",
];

/// Multi-word phrases, matched against the normalized token sequence.
const ACCEPT_PHRASES: &[&str] = &["got it", "on my way"];
const REJECT_PHRASES: &[&str] = &["not available", "can not", "no thanks"];

/// Classify a message body into an accept/reject intent.
pub fn classify_intent(body: &str) -> ResponseIntent {
    let trimmed = body.trim();

    // Exact digit replies take priority over keyword matching.
    match trimmed {
        "1" => return ResponseIntent::Accept,
        "2" => return ResponseIntent::Reject,
        _ => {}
    }

    // Normalize: lowercase, drop apostrophes ("can't" -> "cant"), turn
    // all other punctuation into separators, then tokenize.
    let mut normalized = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '\'' | '’' => {}
            c if c.is_alphanumeric() => {
                for lower in c.to_lowercase() {
                    normalized.push(lower);
                }
            }
            _ => normalized.push(' '),
        }
    }
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.is_empty() {
        return ResponseIntent::Unrecognized;
    }
    let token_stream = tokens.join(" ");

    let family_matches = |words: &[&str], phrases: &[&str]| {
        tokens.iter().any(|t| words.contains(t))
            || phrases.iter().any(|p| contains_phrase(&token_stream, p))
    };

    // First matching family wins; accept is checked first.
    if family_matches(ACCEPT_WORDS, ACCEPT_PHRASES) {
        ResponseIntent::Accept
    } else if family_matches(REJECT_WORDS, REJECT_PHRASES) {
        ResponseIntent::Reject
    } else {
        ResponseIntent::Unrecognized
    }
}

/// Whether `stream` (space-joined tokens) contains `phrase` on token
/// boundaries.
fn contains_phrase(stream: &str, phrase: &str) -> bool {
    let padded = format!(" {stream} ");
    let needle = format!(" {phrase} ");
    padded.contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_intent(body: &str, expected: ResponseIntent) {
        assert_eq!(classify_intent(body), expected, "body: {body:?}");
    }

    // ── Digit replies ────────────────────────────────────────────────

    #[test]
    fn test_digit_replies() {
        assert_intent("1", ResponseIntent::Accept);
        assert_intent("2", ResponseIntent::Reject);
        assert_intent("  1  ", ResponseIntent::Accept);
    }

    #[test]
    fn test_other_digits_are_unrecognized() {
        assert_intent("3", ResponseIntent::Unrecognized);
        assert_intent("12", ResponseIntent::Unrecognized);
    }

    // ── Accept family ────────────────────────────────────────────────

    #[test]
    fn test_accept_keywords() {
        assert_intent("accept", ResponseIntent::Accept);
        assert_intent("Confirm", ResponseIntent::Accept);
        assert_intent("YES", ResponseIntent::Accept);
        assert_intent("ok", ResponseIntent::Accept);
        assert_intent("Okay, confirmed.", ResponseIntent::Accept);
    }

    #[test]
    fn test_accept_phrases() {
        assert_intent("got it", ResponseIntent::Accept);
        assert_intent("On my way!", ResponseIntent::Accept);
        assert_intent("Got it, leaving now", ResponseIntent::Accept);
    }

    // ── Reject family ────────────────────────────────────────────────

    #[test]
    fn test_reject_keywords() {
        assert_intent("reject", ResponseIntent::Reject);
        assert_intent("Decline", ResponseIntent::Reject);
        assert_intent("No", ResponseIntent::Reject);
        assert_intent("busy", ResponseIntent::Reject);
    }

    #[test]
    fn test_reject_phrases_and_apostrophes() {
        assert_intent("can't", ResponseIntent::Reject);
        assert_intent("Can't today, sorry", ResponseIntent::Reject);
        assert_intent("not available", ResponseIntent::Reject);
        assert_intent("I'm not available this week", ResponseIntent::Reject);
    }

    // ── Word boundaries ──────────────────────────────────────────────

    #[test]
    fn test_substrings_do_not_match() {
        // "now" must not match "no"; "broken" must not match "ok".
        assert_intent("now leaving the yard", ResponseIntent::Unrecognized);
        assert_intent("truck is broken down", ResponseIntent::Unrecognized);
        assert_intent("nothing", ResponseIntent::Unrecognized);
    }

    // ── Family priority ──────────────────────────────────────────────

    #[test]
    fn test_accept_family_wins_when_both_match() {
        assert_intent("yes no", ResponseIntent::Accept);
    }

    // ── Unrecognized ─────────────────────────────────────────────────

    #[test]
    fn test_unrecognized() {
        assert_intent("maybe", ResponseIntent::Unrecognized);
        assert_intent("", ResponseIntent::Unrecognized);
        assert_intent("   ", ResponseIntent::Unrecognized);
        assert_intent("who is this?", ResponseIntent::Unrecognized);
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(ResponseIntent::Accept.to_string(), "ACCEPT");
        assert_eq!(ResponseIntent::Unrecognized.to_string(), "UNRECOGNIZED");
    }
}
