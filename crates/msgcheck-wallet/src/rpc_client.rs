use anyhow::{bail, Context};
use tokio::runtime::Runtime;
use tracing::debug;

use msgcheck_core::{BoxError, CheckBatch, MessagePrototype};
use msgcheck_resolver::ValidationService;

/// Simple JSON-RPC 2.0 client used by the wallet to talk to a running node.
///
/// Uses raw HTTP POST with serde_json rather than a generated client.
pub struct WalletRpcClient {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl WalletRpcClient {
    pub fn new(url: &str, token: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }

    /// Run the node's pre-flight checks for one message prototype.
    pub async fn check_messages(&self, proto: &MessagePrototype) -> anyhow::Result<Vec<CheckBatch>> {
        let result = self
            .call("Filecoin.MpoolCheckMessages", check_params(proto))
            .await?;

        if result.is_null() {
            return Ok(Vec::new());
        }

        serde_json::from_value(result).context("parsing check results")
    }

    /// Hand the message to the node for signing and publishing. Returns the
    /// id of the published message.
    pub async fn push_message(&self, proto: &MessagePrototype) -> anyhow::Result<String> {
        let result = self
            .call(
                "Filecoin.MpoolPushMessage",
                serde_json::json!([proto, serde_json::Value::Null]),
            )
            .await?;

        message_id(&result)
    }
}

fn check_params(proto: &MessagePrototype) -> serde_json::Value {
    serde_json::json!([[{ "Message": proto, "ValidNonce": true }]])
}

/// Accepts `{"CID": {"/": id}}`, `{"CID": id}` or a bare id string.
fn message_id(result: &serde_json::Value) -> anyhow::Result<String> {
    let cid = result.get("CID").unwrap_or(result);
    cid.get("/")
        .unwrap_or(cid)
        .as_str()
        .map(|s| s.to_string())
        .context("expected message id from MpoolPushMessage")
}

/// [`ValidationService`] backed by the node, driven synchronously on a
/// current-thread runtime.
pub struct NodeChecks<'a> {
    rt: &'a Runtime,
    client: &'a WalletRpcClient,
}

impl<'a> NodeChecks<'a> {
    pub fn new(rt: &'a Runtime, client: &'a WalletRpcClient) -> Self {
        Self { rt, client }
    }
}

impl ValidationService for NodeChecks<'_> {
    fn run_checks(&mut self, proto: &MessagePrototype) -> Result<Vec<CheckBatch>, BoxError> {
        debug!(url = %self.client.url, "requesting message checks");
        self.rt
            .block_on(self.client.check_messages(proto))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgcheck_core::{candidate_id, CheckCode, ContentId, TokenAmount};
    use serde_json::json;

    #[test]
    fn reads_message_id_shapes() {
        assert_eq!(message_id(&json!({"CID": {"/": "bafy1"}})).unwrap(), "bafy1");
        assert_eq!(message_id(&json!({"CID": "bafy2"})).unwrap(), "bafy2");
        assert_eq!(message_id(&json!("bafy3")).unwrap(), "bafy3");
        assert!(message_id(&json!({"Message": {}})).is_err());
    }

    #[test]
    fn check_results_decode_from_node_json() {
        let cid = "bafy2bzacedjfsbbn3ggqmw6u2xyhbpgwhrcshmzlgfaapfgiq5mo3pp2x2h2y";
        let raw = json!([[
            {"Cid": {"/": cid}, "Code": 1, "OK": true, "Err": "", "Hint": null},
            {"Cid": {"/": cid}, "Code": 6, "OK": false, "Err": "fee cap too low",
             "Hint": {"baseFee": "100"}}
        ]]);
        let batches: Vec<CheckBatch> = serde_json::from_value(raw).unwrap();
        let failures: Vec<_> = batches[0].failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code, CheckCode::MessageBaseFee);
        assert_eq!(failures[0].hints["baseFee"], json!("100"));
        assert_eq!(candidate_id(&batches), Some(&ContentId::new(cid)));
    }

    #[test]
    fn check_request_uses_node_encoding() {
        let proto = MessagePrototype {
            version: 0,
            to: "f01000".into(),
            from: "f01001".into(),
            nonce: 2,
            value: TokenAmount::from(5),
            gas_limit: 1_000_000,
            gas_fee_cap: TokenAmount::from(100),
            gas_premium: TokenAmount::from(1),
            method: 2,
            params: vec![0x0a, 0x0b],
        };
        let params = check_params(&proto);
        let message = &params[0][0]["Message"];
        assert_eq!(message["Params"], "Cgs=");
        assert_eq!(message["GasFeeCap"], "100");
        assert_eq!(message["Nonce"], 2);
        assert_eq!(params[0][0]["ValidNonce"], true);
    }
}
