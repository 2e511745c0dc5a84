// Vault Dump - export a Vault KV v2 engine to local JSON files
//
// This is the main entry point for the application.

use anyhow::{Context, Result};
use clap::Parser;
use vault_dump::config::{CredentialSources, Credentials};
use vault_dump::dump;
use vault_dump::export::{Exporter, DEFAULT_MOUNT};
use vault_dump::vault::VaultClient;

/// Dump every secret stored in a Vault KV v2 engine to timestamped JSON files
#[derive(Parser, Debug)]
#[command(name = "vault-dump")]
#[command(about = "Dump every secret stored in a Vault KV v2 engine to timestamped JSON files", long_about = None)]
struct Cli {
    /// Vault server address (default: $VAULT_ADDR, then http://127.0.0.1)
    #[arg(short, long, value_name = "URL")]
    address: Option<String>,

    /// Vault token (default: $VAULT_TOKEN, then ~/.vault-token)
    #[arg(short, long, value_name = "TOKEN")]
    token: Option<String>,
}

fn init_tracing() {
    // stdout carries progress output; diagnostics go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_dump(cli: Cli) -> Result<()> {
    let credentials = Credentials::resolve(CredentialSources::from_env(cli.address, cli.token))
        .context("Failed to resolve Vault credentials")?;

    let dump_root = dump::default_dump_root()?;

    println!("Dumping contents of Vault server at {}", credentials.address);
    println!("Output directory is {}/", dump_root.display());
    println!();

    let client = VaultClient::new(&credentials)?;
    client.check_token().await?;

    dump::create_dump_root(&dump_root, DEFAULT_MOUNT)
        .with_context(|| format!("Failed to create output directory: {}", dump_root.display()))?;

    let summary = Exporter::new(&client, &dump_root)
        .export(DEFAULT_MOUNT, "")
        .await
        .with_context(|| format!("Failed to export mount '{}'", DEFAULT_MOUNT))?;

    println!();
    println!(
        "✓ Exported {} secret(s) across {} directory(ies)",
        summary.secrets, summary.directories
    );

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
        .and_then(|runtime| runtime.block_on(run_dump(cli)));

    if let Err(e) = result {
        eprintln!("\nError: {:?}", e);
        std::process::exit(1);
    }
}
