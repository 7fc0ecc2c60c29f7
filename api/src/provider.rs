//! Binding to the injected EIP-1193 wallet provider (`window.ethereum`).
//!
//! Only compiled for the browser. Native builds never have an injected
//! provider; [`crate::wallet::Wallet`] reports `NoWallet` there instead.

#[cfg(target_arch = "wasm32")]
pub use wasm32::InjectedProvider;

#[cfg(target_arch = "wasm32")]
mod wasm32 {
    use js_sys::{Function, Promise, Reflect};
    use serde_json::Value;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    /// Handle to `window.ethereum`. Cloning is cheap; all clones refer to
    /// the same injected object.
    #[derive(Clone, Debug)]
    pub struct InjectedProvider {
        ethereum: JsValue,
    }

    impl InjectedProvider {
        /// Probes the window for an injected provider.
        pub fn detect() -> Option<Self> {
            let window = web_sys::window()?;
            let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
            if ethereum.is_undefined() || ethereum.is_null() {
                return None;
            }
            Some(Self { ethereum })
        }

        /// One `provider.request({ method, params })` round trip. The result
        /// comes back as JSON so callers never touch `JsValue`.
        pub async fn request(&self, method: &str, params: Value) -> Result<Value, String> {
            let payload = serde_json::json!({ "method": method, "params": params });
            let arg = js_sys::JSON::parse(&payload.to_string())
                .map_err(|e| js_error_message(&e))?;

            let request_fn: Function = Reflect::get(&self.ethereum, &JsValue::from_str("request"))
                .map_err(|e| js_error_message(&e))?
                .dyn_into()
                .map_err(|_| "provider has no request() method".to_string())?;

            let promise: Promise = request_fn
                .call1(&self.ethereum, &arg)
                .map_err(|e| js_error_message(&e))?
                .dyn_into()
                .map_err(|_| "provider request() did not return a promise".to_string())?;

            let result = JsFuture::from(promise)
                .await
                .map_err(|e| js_error_message(&e))?;
            js_value_to_json(&result)
        }
    }

    fn js_value_to_json(value: &JsValue) -> Result<Value, String> {
        if value.is_undefined() {
            return Ok(Value::Null);
        }
        let text: String = js_sys::JSON::stringify(value)
            .map_err(|e| js_error_message(&e))?
            .into();
        serde_json::from_str(&text).map_err(|e| format!("unparseable provider result: {e}"))
    }

    /// Best-effort extraction of a human-readable message from a thrown
    /// JS value (an `Error`, a provider error object, or anything else).
    fn js_error_message(value: &JsValue) -> String {
        if let Some(err) = value.dyn_ref::<js_sys::Error>() {
            return String::from(err.message());
        }
        if let Ok(message) = Reflect::get(value, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return text;
            }
        }
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"))
    }
}
