use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;

/// Draft of an outgoing message, before signing.
///
/// Field names follow the node's JSON-RPC encoding. The node derives the
/// message's [`ContentId`](crate::ContentId) from these fields, so any edit
/// (including the fee cap) yields a new id in the next check run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessagePrototype {
    pub version: u64,

    /// Recipient address.
    pub to: String,

    /// Sender address.
    pub from: String,

    /// Sender's sequence number.
    pub nonce: u64,

    /// Amount transferred, in attoFIL.
    pub value: TokenAmount,

    /// Maximum gas units the message may consume.
    pub gas_limit: i64,

    /// Maximum price per gas unit the sender authorizes. The only field the
    /// check resolver ever writes.
    pub gas_fee_cap: TokenAmount,

    /// Priority fee per gas unit.
    pub gas_premium: TokenAmount,

    pub method: u64,

    /// Method parameters; base64 on the wire, `null` read as empty.
    #[serde(with = "base64_bytes", default)]
    pub params: Vec<u8>,
}

impl MessagePrototype {
    /// Total fee the sender is willing to pay: `gas_fee_cap * gas_limit`.
    pub fn max_fee(&self) -> TokenAmount {
        &self.gas_fee_cap * self.gas_limit
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(text) => BASE64.decode(text).map_err(de::Error::custom),
        }
    }
}
