use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use wasm_trp::credential::load_admin_credential;
use wasm_trp::resolver::DEFAULT_ENDPOINT;
use wasm_trp::{
    bind, ClientOptions, CredentialManager, CredentialRef, MemorySessionStore, Orchestrator,
    ResolverClient, RetryPolicy, Signer, TemplateRegistry, TrpService,
};

/// Resolver connection flags
#[derive(Args)]
pub struct ResolverArgs {
    /// TRP endpoint
    #[arg(long, env = "TRP_URL", default_value = DEFAULT_ENDPOINT)]
    trp_url: String,
    /// Extra request header, `name=value` (repeatable)
    #[arg(long = "header", value_parser = parse_key_val)]
    headers: Vec<(String, String)>,
    /// HTTP timeout for individual RPC calls
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
    /// Attempts per call, including the first
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    /// Also retry submits that timed out
    #[arg(long)]
    retry_ambiguous_submits: bool,
}

impl ResolverArgs {
    fn options(&self) -> ClientOptions {
        ClientOptions {
            endpoint: self.trp_url.clone(),
            headers: self.headers.iter().cloned().collect(),
            timeout_ms: self.timeout_ms,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                retry_ambiguous_submits: self.retry_ambiguous_submits,
                ..RetryPolicy::default()
            },
            ..ClientOptions::default()
        }
    }
}

/// Template selection and arguments
#[derive(Args)]
pub struct TemplateArgs {
    /// Template name, e.g. `transfer`
    name: String,
    /// Template IR version, e.g. `v1alpha7`
    #[arg(long)]
    version: String,
    /// Protocol manifest
    #[arg(long, default_value = "templates/vending-machine.json")]
    templates: PathBuf,
    /// Argument `name=value`; values parse as JSON, falling back to a string
    #[arg(long = "arg", value_parser = parse_key_val)]
    args: Vec<(String, String)>,
    /// All arguments as one JSON object
    #[arg(long = "args", conflicts_with = "args")]
    args_json: Option<String>,
}

impl TemplateArgs {
    fn registry(&self) -> Result<TemplateRegistry> {
        let json = std::fs::read_to_string(&self.templates)
            .with_context(|| format!("Failed to read {}", self.templates.display()))?;
        TemplateRegistry::from_manifest_str(&json).context("Invalid template manifest")
    }

    fn raw_args(&self) -> Result<Value> {
        if let Some(json) = &self.args_json {
            return serde_json::from_str(json).context("--args is not valid JSON");
        }
        let object: Map<String, Value> = self
            .args
            .iter()
            .map(|(k, v)| {
                let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.clone()));
                (k.clone(), value)
            })
            .collect();
        Ok(Value::Object(object))
    }
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    template: TemplateArgs,
    #[command(flatten)]
    resolver: ResolverArgs,
}

#[derive(Args)]
pub struct ExecuteArgs {
    #[command(flatten)]
    template: TemplateArgs,
    #[command(flatten)]
    resolver: ResolverArgs,
    /// Directory holding user.sk and user.addr
    #[arg(long, env = "ADMIN_CREDENTIAL_PATH")]
    admin_dir: PathBuf,
}

/// Resolve a template and print the unsigned transaction
pub async fn handle_resolve(args: ResolveArgs) -> Result<()> {
    let registry = args.template.registry()?;
    let template = registry.lookup(&args.template.name, &args.template.version)?;
    let bound = bind(&template, &args.template.raw_args()?)?;

    let client = ResolverClient::connect(args.resolver.options())?;
    let envelope = client
        .resolve(&template, &bound)
        .await
        .context("Failed to resolve transaction")?;
    let hash = Signer::cardano().hash(&envelope)?;

    let output = json!({
        "tx": envelope.payload_text(),
        "encoding": envelope.encoding(),
        "version": envelope.version(),
        "hash": hex::encode(hash),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Resolve, sign with the admin credential, and submit
pub async fn handle_execute(args: ExecuteArgs) -> Result<()> {
    let admin = load_admin_credential(&args.admin_dir).context("Admin credential unavailable")?;
    let registry = Arc::new(args.template.registry()?);
    let client = Arc::new(ResolverClient::connect(args.resolver.options())?);
    let service = TrpService::new(
        Orchestrator::new(registry, client),
        CredentialManager::new(MemorySessionStore::new()).with_admin(admin),
    );

    let receipt = service
        .execute_transaction(
            &args.template.name,
            &args.template.version,
            &args.template.raw_args()?,
            &CredentialRef::Admin,
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

/// Query the resolver's health method
pub async fn handle_health(args: ResolverArgs) -> Result<()> {
    let client = ResolverClient::connect(args.options())?;
    let healthy = client.health().await.context("Health check failed")?;
    println!("{}", healthy);
    if !healthy {
        anyhow::bail!("resolver reports unhealthy");
    }
    Ok(())
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{}`", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}
