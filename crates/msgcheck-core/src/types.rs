use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── ContentId ────────────────────────────────────────────────────────────────

/// Content identifier as issued by the node (a multibase CID string such as
/// `bafy2…`). Opaque: only compared and displayed, never parsed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.0.chars().take(16).collect();
        if short.len() < self.0.len() {
            write!(f, "ContentId({short}…)")
        } else {
            write!(f, "ContentId({short})")
        }
    }
}

/// Nodes send ids either bare or in the linked form `{"/": "<cid>"}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireId {
    Linked {
        #[serde(rename = "/")]
        link: String,
    },
    Bare(String),
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireId::Linked { link: self.0.clone() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = match WireId::deserialize(deserializer)? {
            WireId::Bare(s) => s,
            WireId::Linked { link } => link,
        };
        if id.is_empty() {
            return Err(serde::de::Error::custom("empty content id"));
        }
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOTUS_CID: &str = "bafy2bzacedjfsbbn3ggqmw6u2xyhbpgwhrcshmzlgfaapfgiq5mo3pp2x2h2y";

    #[test]
    fn accepts_linked_and_bare_json() {
        let id = ContentId::new(LOTUS_CID);
        let linked = serde_json::json!({ "/": LOTUS_CID });
        let bare = serde_json::json!(LOTUS_CID);
        assert_eq!(serde_json::from_value::<ContentId>(linked.clone()).unwrap(), id);
        assert_eq!(serde_json::from_value::<ContentId>(bare).unwrap(), id);
        assert_eq!(serde_json::to_value(&id).unwrap(), linked);
    }

    #[test]
    fn rejects_empty_id() {
        assert!(serde_json::from_value::<ContentId>(serde_json::json!({ "/": "" })).is_err());
        assert!(serde_json::from_value::<ContentId>(serde_json::json!(7)).is_err());
    }

    #[test]
    fn debug_is_shortened() {
        assert_eq!(format!("{:?}", ContentId::new(LOTUS_CID)), "ContentId(bafy2bzacedjfsbbn…)");
        assert_eq!(format!("{:?}", ContentId::new("bafyshort")), "ContentId(bafyshort)");
        assert_eq!(ContentId::new(LOTUS_CID).to_string(), LOTUS_CID);
    }
}
