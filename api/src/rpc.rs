//! JSON-RPC over HTTP. This is the default read-only provider: it serves
//! every read made before a wallet is connected, and it works the same on
//! wasm (browser fetch) and natively.

use serde_json::{json, Value};

use crate::error::ReadError;

#[derive(Clone, Debug)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ReadError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(ReadError::Rpc(err.to_string()));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// `eth_call` against `to` with the given call data, at the latest block.
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String, ReadError> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ReadError::Decode(format!("non-string eth_call result: {result}")))
    }
}
