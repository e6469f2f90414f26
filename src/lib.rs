//! wasm-trp: transaction intent resolution and signing
//!
//! An application names a versioned transaction template and supplies
//! arguments; a remote resolver compiles them into an unsigned transaction over
//! the TRP JSON-RPC protocol, and this crate signs and submits it.
//!
//! This crate provides:
//! - Template registry and protocol manifests
//! - Strict argument binding against parameter schemas
//! - Cardano transaction hashing, witness signing and assembly
//! - Session and admin credentials
//! - The resolver client and the resolve → sign → submit pipeline (native only)
//!
//! # Architecture
//!
//! The crate follows a three-layer architecture:
//! - **Core layer** (`src/*.rs`): Pure Rust logic, no network or WASM dependencies
//! - **Native layer** (`resolver`, `orchestrator`): async client and pipeline on tokio + reqwest
//! - **WASM layer** (`src/wasm/*.rs`): Thin wrappers with `#[wasm_bindgen]`

pub mod address;
pub mod binder;
pub mod codec;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod signer;
pub mod template;
pub mod types;
pub mod wasm;
pub mod wire;

#[cfg(not(target_arch = "wasm32"))]
pub mod orchestrator;
#[cfg(not(target_arch = "wasm32"))]
pub mod resolver;

#[cfg(test)]
mod test_utils;

// Re-export main types for convenience
pub use address::{validate_address, Address};
pub use binder::{bind, ArgumentValue, BoundArguments};
pub use codec::{CardanoCodec, LedgerCodec};
pub use credential::{
    load_admin_credential, Credential, CredentialManager, CredentialRef, MemorySessionStore,
    SessionStore,
};
pub use envelope::{SignedTransaction, TransactionEnvelope, Witness};
pub use error::WasmTrpError;
pub use signer::Signer;
pub use template::{ParamType, ParameterSchema, TemplateRegistry, TransactionTemplate};
pub use types::{NetworkTag, PayloadEncoding, TemplateId};

#[cfg(not(target_arch = "wasm32"))]
pub use orchestrator::{Orchestrator, PipelineError, Receipt, Stage, TrpService};
#[cfg(not(target_arch = "wasm32"))]
pub use resolver::{ClientOptions, ResolverClient, RetryPolicy};
