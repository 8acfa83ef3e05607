//! Join-code and entity-id generation.
//!
//! Identifiers are generated eagerly at the service layer; stores never
//! assign ids on write. Neither generator guarantees uniqueness on its own:
//! join codes are re-checked against the event store before they are
//! committed, and entity ids rely on the suffix space being large enough
//! that the storage-level primary key closes the residual window.

use rand::Rng;
use rand::distr::Alphanumeric;
use std::fmt;
use std::str::FromStr;

/// Length of a join code in decimal digits.
pub const JOIN_CODE_LEN: usize = 8;

const ENTITY_ID_SUFFIX_LEN: usize = 16;

/// Id prefix for participants.
pub const PARTICIPANT_ID_PREFIX: &str = "participant";
/// Id prefix for user-level connections.
pub const USER_CONNECTION_ID_PREFIX: &str = "userConnection";
/// Id prefix for participant-level connections.
pub const PARTICIPANT_CONNECTION_ID_PREFIX: &str = "participantConnection";

/// An 8-digit decimal join code in `[10000000, 99999999]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinCode(String);

impl JoinCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("join code must be exactly {JOIN_CODE_LEN} decimal digits with a nonzero first digit")]
pub struct InvalidJoinCode;

impl FromStr for JoinCode {
    type Err = InvalidJoinCode;

    fn from_str(s: &str) -> Result<Self, InvalidJoinCode> {
        let well_formed = s.len() == JOIN_CODE_LEN
            && s.bytes().all(|b| b.is_ascii_digit())
            && !s.starts_with('0');
        if well_formed {
            Ok(JoinCode(s.to_owned()))
        } else {
            Err(InvalidJoinCode)
        }
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draw a join code uniformly from the 8-digit range.
pub fn generate_join_code() -> JoinCode {
    let code: u32 = rand::rng().random_range(10_000_000..=99_999_999);
    JoinCode(code.to_string())
}

/// Produce a prefixed opaque id, e.g. `participant_h1Xw9c0DqTzR5aKe`.
pub fn generate_entity_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ENTITY_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}

/// Check that `id` is `{prefix}_{suffix}` with a non-empty alphanumeric suffix.
pub fn is_well_formed_entity_id(id: &str, prefix: &str) -> bool {
    match id.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('_')) {
        Some(suffix) => !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_alphanumeric()),
        None => false,
    }
}
