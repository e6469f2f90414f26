use anyhow::{Context, Result};
use clap::Subcommand;
use wasm_trp::{Address, NetworkTag};

use crate::network::NetworkArg;

#[derive(Subcommand)]
pub enum AddressCommand {
    /// Decode a bech32 address to its raw bytes (hex)
    Decode {
        /// The address to decode
        address: String,
    },
    /// Encode raw address bytes (hex) as bech32
    Encode {
        /// Address bytes as hex
        bytes: String,
    },
    /// Derive the base address of an Ed25519 public key
    FromKey {
        /// Public key as hex
        public_key: String,
        #[arg(short, long, value_enum, default_value = "testnet")]
        network: NetworkArg,
    },
}

pub fn handle_command(command: AddressCommand) -> Result<()> {
    match command {
        AddressCommand::Decode { address } => {
            let decoded = Address::parse(&address).context("Failed to decode address")?;
            println!("{}", decoded.to_hex());
            Ok(())
        }
        AddressCommand::Encode { bytes } => {
            let address = Address::from_hex(&bytes).context("Invalid address bytes")?;
            println!("{}", address.to_bech32()?);
            Ok(())
        }
        AddressCommand::FromKey {
            public_key,
            network,
        } => {
            let key = hex::decode(public_key.trim_start_matches("0x"))
                .context("Invalid hex string for public key")?;
            let network: NetworkTag = network.into();
            let address = Address::from_public_key(network, &key)?;
            println!("{}", address.to_bech32()?);
            Ok(())
        }
    }
}
