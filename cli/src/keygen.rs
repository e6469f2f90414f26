use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use wasm_trp::credential::write_admin_credential;
use wasm_trp::Credential;

use crate::network::NetworkArg;

#[derive(Args)]
pub struct KeygenArgs {
    /// Directory to write user.sk and user.addr into
    #[arg(long, env = "ADMIN_CREDENTIAL_PATH")]
    out: PathBuf,
    #[arg(short, long, value_enum, default_value = "testnet")]
    network: NetworkArg,
    /// Overwrite an existing key
    #[arg(long)]
    force: bool,
}

pub fn handle_command(args: KeygenArgs) -> Result<()> {
    let key_path = args.out.join("user.sk");
    if key_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists, pass --force to replace it",
            key_path.display()
        );
    }

    let credential =
        Credential::generate(args.network.into()).context("Failed to generate credential")?;
    write_admin_credential(&args.out, &credential)
        .with_context(|| format!("Failed to write credential to {}", args.out.display()))?;
    tracing::info!(dir = %args.out.display(), "wrote admin credential");
    println!("{}", credential.address().to_bech32()?);
    Ok(())
}
