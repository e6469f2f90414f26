//! Network argument type for CLI commands

use clap::ValueEnum;
use wasm_trp::NetworkTag;

/// CLI argument type for network selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NetworkArg {
    Mainnet,
    Preprod,
    Preview,
    Testnet,
}

impl From<NetworkArg> for NetworkTag {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Mainnet => NetworkTag::Mainnet,
            NetworkArg::Preprod | NetworkArg::Preview | NetworkArg::Testnet => NetworkTag::Testnet,
        }
    }
}
