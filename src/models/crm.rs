use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Trait defining the calls the portal makes against the remote CRM
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Get the name of the CRM backend
    fn name(&self) -> &'static str;

    /// Fetch a resource or collection. Fails on transport or HTTP errors.
    async fn get(&self, path: &str) -> anyhow::Result<Value>;
    /// Create a resource. Fails on transport or HTTP errors.
    async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value>;
}

/// The CRM client as seen by the handlers: either ready to use, or the
/// reason it could not be constructed at startup.
#[derive(Clone)]
pub enum CrmHandle {
    Ready(Arc<dyn CrmClient>),
    Unavailable(String),
}

impl CrmHandle {
    pub fn client(&self) -> Result<&dyn CrmClient, &str> {
        match self {
            CrmHandle::Ready(client) => Ok(client.as_ref()),
            CrmHandle::Unavailable(reason) => Err(reason),
        }
    }
}

/// Decode a CRM payload, naming the offending field path on failure.
pub fn decode<T: DeserializeOwned>(value: Value) -> anyhow::Result<T> {
    serde_path_to_error::deserialize(value)
        .map_err(|e| anyhow::anyhow!("Failed to parse CRM response: {}", e))
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub method: &'static str,
        pub path: String,
        pub body: Option<Value>,
    }

    type Responder = Box<dyn Fn(&Call) -> Result<Value, String> + Send + Sync>;

    /// Records every call and answers from a scripted responder.
    pub struct FakeCrm {
        responder: Responder,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeCrm {
        pub fn new(
            responder: impl Fn(&Call) -> Result<Value, String> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: Call) -> anyhow::Result<Value> {
            let result = (self.responder)(&call);
            self.calls.lock().unwrap().push(call);
            result.map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[async_trait]
    impl CrmClient for FakeCrm {
        fn name(&self) -> &'static str {
            "Fake"
        }

        async fn get(&self, path: &str) -> anyhow::Result<Value> {
            self.answer(Call {
                method: "GET",
                path: path.to_string(),
                body: None,
            })
        }

        async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
            self.answer(Call {
                method: "POST",
                path: path.to_string(),
                body: Some(body.clone()),
            })
        }
    }
}
