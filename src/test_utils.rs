//! Shared fixtures for unit tests

use crate::credential::Credential;
use crate::envelope::TransactionEnvelope;
use crate::template::{TemplateRegistry, TransactionTemplate};
use crate::types::PayloadEncoding;
use serde_json::{json, Value};
use std::sync::Arc;

/// Admin key from a `user.sk` generated by cardano-cli
pub const ADMIN_SECRET_KEY_HEX: &str =
    "88c48ee7d969d49a161e469added3af9c4a337064c7a79734fa1d1094decf0e4";
pub const ADMIN_PUBLIC_KEY_HEX: &str =
    "6a524809f1a1c7cbd98a521e2b46b4bd67866ce706938b97aafc392bb776f280";
/// Enterprise address of the admin key
pub const ADMIN_ADDRESS: &str = "addr_test1vz5yzy8fttld8yprtzhsz5kuwk46xs9npnfdh3ajaggm5ccyg00d6";
pub const ADMIN_SIGNING_KEY_JSON: &str = r#"{
    "type": "PaymentSigningKeyShelley_ed25519",
    "description": "Payment Signing Key",
    "cborHex": "582088c48ee7d969d49a161e469added3af9c4a337064c7a79734fa1d1094decf0e4"
}"#;

/// Conway transaction spending one input to the admin address, no witnesses:
/// `[{0: 258([[txid, 0]]), 1: [[admin, 1000000]], 2: 170000}, {}, true, null]`
pub const SAMPLE_TX_HEX: &str = "84a300d90102818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b700018182581d60a84110e95afed3902358af0152dc75aba340b30cd2dbc7b2ea11ba631a000f4240021a00029810a0f5f6";
pub const SAMPLE_TX_BODY_HEX: &str = "a300d90102818258203b40265111d8bb3c3c608d95b3a0bf83461ace32d79336579a1939b3aad1c0b700018182581d60a84110e95afed3902358af0152dc75aba340b30cd2dbc7b2ea11ba631a000f4240021a00029810";
/// Blake2b-256 of the sample body
pub const SAMPLE_TX_HASH_HEX: &str =
    "c55c257151d7062525dda5feaacf4de470748fefaa52db89b89464a439a089b6";

pub const VENDING_MACHINE_MANIFEST: &str = include_str!("../templates/vending-machine.json");

pub fn registry() -> TemplateRegistry {
    TemplateRegistry::from_manifest_str(VENDING_MACHINE_MANIFEST).unwrap()
}

pub fn transfer_template() -> Arc<TransactionTemplate> {
    registry().lookup("transfer", "v1alpha7").unwrap()
}

pub fn transfer_args() -> Value {
    json!({
        "quantity": 1_000_000,
        "receiver": ADMIN_ADDRESS,
        "sender": ADMIN_ADDRESS,
    })
}

pub fn admin_credential() -> Credential {
    crate::credential::parse_admin_credential(ADMIN_SIGNING_KEY_JSON, ADMIN_ADDRESS).unwrap()
}

pub fn sample_envelope() -> TransactionEnvelope {
    TransactionEnvelope::from_wire(SAMPLE_TX_HEX, PayloadEncoding::Hex, "v1alpha7").unwrap()
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::*;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use crate::error::TransportError;
    use crate::resolver::{ClientOptions, RetryPolicy, Transport};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    type Handler = dyn Fn(&str, usize) -> Result<Value, TransportError> + Send + Sync;

    /// Scripted transport that records every request body
    #[derive(Clone)]
    pub struct MockTransport {
        handler: Arc<Handler>,
        requests: Arc<Mutex<Vec<Value>>>,
        per_method: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl MockTransport {
        /// `handler` receives the 0-based index of the call
        pub fn new(
            handler: impl Fn(usize) -> Result<Value, TransportError> + Send + Sync + 'static,
        ) -> Self {
            let requests: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
            let recorded = requests.clone();
            // the request is recorded before the handler runs
            let handler = move |_: &str, _: usize| handler(recorded.lock().len() - 1);
            MockTransport {
                handler: Arc::new(handler),
                requests,
                per_method: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        /// `handler` receives the method name and the 0-based index of calls to it
        pub fn by_method(
            handler: impl Fn(&str, usize) -> Result<Value, TransportError> + Send + Sync + 'static,
        ) -> Self {
            MockTransport {
                handler: Arc::new(handler),
                requests: Arc::new(Mutex::new(Vec::new())),
                per_method: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        pub fn requests(&self) -> Vec<Value> {
            self.requests.lock().clone()
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().len()
        }

        pub fn calls_to(&self, method: &str) -> usize {
            self.per_method.lock().get(method).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, body: Value) -> Result<Value, TransportError> {
            let method = body["method"].as_str().unwrap_or_default().to_string();
            self.requests.lock().push(body);
            let index = {
                let mut counts = self.per_method.lock();
                let count = counts.entry(method.clone()).or_insert(0);
                *count += 1;
                *count - 1
            };
            (self.handler)(&method, index)
        }
    }

    /// Client options with millisecond backoff
    pub fn fast_options() -> ClientOptions {
        ClientOptions {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 2,
                retry_ambiguous_submits: false,
            },
            ..ClientOptions::default()
        }
    }
}
