//! WhatsApp one-time-password rules: phone normalization, rate limiting,
//! and code generation.

use chrono::Duration;
use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Seconds an OTP stays valid.
pub const OTP_TTL_SECS: i64 = 300;
/// Minimum seconds between two OTP sends to the same phone.
pub const RESEND_COOLDOWN_SECS: i64 = 60;
/// Failed verifications within [`BLOCK_WINDOW_SECS`] that block a phone.
pub const MAX_FAILED_ATTEMPTS: i64 = 3;
/// Length of the failure window and of the resulting block.
pub const BLOCK_WINDOW_SECS: i64 = 24 * 60 * 60;

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Dialling prefixes recognised when splitting a number for the WhatsApp
/// gateway. Longer prefixes are matched first.
const COUNTRY_CODES: &[&str] = &[
    "212", "213", "216", "218", "220", "221", "234", "249", "254", "255", "256", "260", "263",
    "351", "352", "353", "354", "355", "358", "370", "371", "372", "380", "381", "385", "420",
    "421", "852", "853", "855", "856", "880", "886", "960", "961", "962", "963", "964", "965",
    "966", "967", "968", "971", "972", "973", "974", "975", "976", "977", //
    "20", "27", "30", "31", "32", "33", "34", "36", "39", "40", "41", "43", "44", "45", "46",
    "47", "48", "49", "51", "52", "53", "54", "55", "56", "57", "58", "60", "61", "62", "63",
    "64", "65", "66", "81", "82", "84", "86", "90", "91", "92", "93", "94", "95", "98", //
    "1", "7",
];

/// Strip everything but ASCII digits. The country code is expected to be
/// part of the input already.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize and check the digit count.
pub fn validate_phone(raw: &str) -> Result<String, CoreError> {
    let phone = normalize_phone(raw);
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&phone.len()) {
        return Err(CoreError::Validation(
            "Invalid WhatsApp number format".into(),
        ));
    }
    Ok(phone)
}

/// Split a normalized phone into `(country_code, local_number)` using the
/// longest matching known prefix. An unknown prefix yields an empty
/// country code and the whole number.
pub fn split_country_code(phone: &str) -> (&str, &str) {
    let mut codes: Vec<&&str> = COUNTRY_CODES.iter().collect();
    codes.sort_by_key(|c| std::cmp::Reverse(c.len()));
    codes
        .into_iter()
        .find(|code| phone.starts_with(**code))
        .map(|code| phone.split_at(code.len()))
        .unwrap_or(("", phone))
}

/// `6281****5678`-style mask: first four and last four digits kept.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}****{tail}")
}

/// Random six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

/// Remove whitespace from a user-typed code.
pub fn normalize_code(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Verification attempts left after a wrong code, given the failures
/// recorded before this one.
pub fn attempts_left_after_failure(prior_failures: i64) -> i64 {
    (MAX_FAILED_ATTEMPTS - (prior_failures + 1)).max(0)
}

pub fn message_text(code: &str) -> String {
    format!(
        "*Sparkfluence Verification*\n\nYour OTP code is: *{code}*\n\n\
         This code expires in 5 minutes.\n\nDon't share this code with anyone."
    )
}

/// Failed-verification state of a phone within the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStatus {
    pub fail_count: i64,
    /// Seconds until the block lifts; zero when not blocked.
    pub remaining_seconds: i64,
}

impl BlockStatus {
    /// `last_failure` is the most recent failure inside the window. The
    /// block lasts [`BLOCK_WINDOW_SECS`] from that failure.
    pub fn evaluate(fail_count: i64, last_failure: Option<Timestamp>, now: Timestamp) -> Self {
        let remaining_seconds = match last_failure {
            Some(at) if fail_count >= MAX_FAILED_ATTEMPTS => {
                let lifts_at = at + Duration::seconds(BLOCK_WINDOW_SECS);
                (lifts_at - now).num_seconds().max(0)
            }
            _ => 0,
        };
        Self {
            fail_count,
            remaining_seconds,
        }
    }

    pub fn blocked(&self) -> bool {
        self.remaining_seconds > 0
    }

    /// Human-readable wait, e.g. `"Too many attempts. Try again in 3 hours"`.
    pub fn message(&self) -> String {
        let hours = (self.remaining_seconds + 3599) / 3600;
        if hours > 1 {
            format!("Too many attempts. Try again in {hours} hours")
        } else {
            let minutes = ((self.remaining_seconds + 59) / 60).max(1);
            format!("Too many attempts. Try again in {minutes} minutes")
        }
    }
}

/// Seconds left before another code may be sent, if still cooling down.
pub fn cooldown_remaining(last_sent: Option<Timestamp>, now: Timestamp) -> Option<i64> {
    let elapsed = (now - last_sent?).num_seconds();
    let remaining = RESEND_COOLDOWN_SECS - elapsed;
    (remaining > 0).then_some(remaining)
}
