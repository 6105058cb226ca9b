use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ContentId;

// ── CheckCode ────────────────────────────────────────────────────────────────

/// Kind of pre-flight check, numbered as the validation service reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum CheckCode {
    MessageSerialize,
    MessageSize,
    MessageValidity,
    MessageMinGas,
    MessageMinBaseFee,
    /// Fee cap below the current base fee.
    MessageBaseFee,
    /// Fee cap below the lower bound of the projected base fee.
    MessageBaseFeeLowerBound,
    /// Fee cap below the upper bound of the projected base fee.
    MessageBaseFeeUpperBound,
    MessageGetStateNonce,
    MessageNonce,
    MessageGetStateBalance,
    MessageBalance,
    Unknown(u64),
}

impl CheckCode {
    pub fn label(self) -> &'static str {
        match self {
            CheckCode::MessageSerialize => "serialize",
            CheckCode::MessageSize => "size",
            CheckCode::MessageValidity => "validity",
            CheckCode::MessageMinGas => "min-gas",
            CheckCode::MessageMinBaseFee => "min-base-fee",
            CheckCode::MessageBaseFee => "base-fee",
            CheckCode::MessageBaseFeeLowerBound => "base-fee-lower-bound",
            CheckCode::MessageBaseFeeUpperBound => "base-fee-upper-bound",
            CheckCode::MessageGetStateNonce => "get-state-nonce",
            CheckCode::MessageNonce => "nonce",
            CheckCode::MessageGetStateBalance => "get-state-balance",
            CheckCode::MessageBalance => "balance",
            CheckCode::Unknown(_) => "unknown",
        }
    }
}

impl From<u64> for CheckCode {
    fn from(n: u64) -> Self {
        match n {
            1 => CheckCode::MessageSerialize,
            2 => CheckCode::MessageSize,
            3 => CheckCode::MessageValidity,
            4 => CheckCode::MessageMinGas,
            5 => CheckCode::MessageMinBaseFee,
            6 => CheckCode::MessageBaseFee,
            7 => CheckCode::MessageBaseFeeLowerBound,
            8 => CheckCode::MessageBaseFeeUpperBound,
            9 => CheckCode::MessageGetStateNonce,
            10 => CheckCode::MessageNonce,
            11 => CheckCode::MessageGetStateBalance,
            12 => CheckCode::MessageBalance,
            other => CheckCode::Unknown(other),
        }
    }
}

impl From<CheckCode> for u64 {
    fn from(code: CheckCode) -> u64 {
        match code {
            CheckCode::MessageSerialize => 1,
            CheckCode::MessageSize => 2,
            CheckCode::MessageValidity => 3,
            CheckCode::MessageMinGas => 4,
            CheckCode::MessageMinBaseFee => 5,
            CheckCode::MessageBaseFee => 6,
            CheckCode::MessageBaseFeeLowerBound => 7,
            CheckCode::MessageBaseFeeUpperBound => 8,
            CheckCode::MessageGetStateNonce => 9,
            CheckCode::MessageNonce => 10,
            CheckCode::MessageGetStateBalance => 11,
            CheckCode::MessageBalance => 12,
            CheckCode::Unknown(n) => n,
        }
    }
}

impl fmt::Display for CheckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label(), u64::from(*self))
    }
}

// ── CheckOutcome ─────────────────────────────────────────────────────────────

/// One pass/fail verdict from message validation.
///
/// Passing outcomes carry nothing actionable and are skipped everywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    #[serde(rename = "OK")]
    pub ok: bool,

    /// The message this verdict is about: the one being sent or one of its
    /// dependencies.
    #[serde(rename = "Cid")]
    pub subject: ContentId,

    #[serde(rename = "Code")]
    pub code: CheckCode,

    #[serde(rename = "Err", default)]
    pub message: String,

    /// Server-supplied auxiliary data, e.g. `baseFee`.
    #[serde(rename = "Hint", default, deserialize_with = "null_as_empty")]
    pub hints: HashMap<String, serde_json::Value>,
}

impl CheckOutcome {
    pub fn passed(subject: ContentId, code: CheckCode) -> Self {
        Self {
            ok: true,
            subject,
            code,
            message: String::new(),
            hints: HashMap::new(),
        }
    }

    pub fn failed(subject: ContentId, code: CheckCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            subject,
            code,
            message: message.into(),
            hints: HashMap::new(),
        }
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.hints.insert(key.into(), value);
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

// ── CheckBatch ───────────────────────────────────────────────────────────────

/// Outcomes of one validation run for one message, in display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckBatch(pub Vec<CheckOutcome>);

impl CheckBatch {
    pub fn new(outcomes: Vec<CheckOutcome>) -> Self {
        Self(outcomes)
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.0
    }

    /// Failing outcomes, in order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.0.iter().filter(|c| !c.ok)
    }
}

impl From<Vec<CheckOutcome>> for CheckBatch {
    fn from(outcomes: Vec<CheckOutcome>) -> Self {
        Self(outcomes)
    }
}

/// Id of the message the run was for. The node answers for the submitted
/// message first, so this is the subject of the first outcome.
pub fn candidate_id(batches: &[CheckBatch]) -> Option<&ContentId> {
    batches
        .iter()
        .flat_map(|b| b.outcomes())
        .map(|c| &c.subject)
        .next()
}

/// True when no outcome in any batch failed.
pub fn all_ok(batches: &[CheckBatch]) -> bool {
    batches.iter().all(|b| b.failures().next().is_none())
}
