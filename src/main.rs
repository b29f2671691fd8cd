//! Gateway - southbound trust material service
//!
//! Loads the key store used for outbound TLS once at startup and exposes its
//! certificate chain as PEM. Startup aborts if a configured key store cannot
//! be loaded.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gateway_api::{ApiServer, ApiServerConfig};
use gateway_trust::{
    generate_dev_keystore, FileKeyStoreLoader, SouthboundTrust, TracingObserver,
    TrustInitializer,
};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{GatewayConfig, SslSettings};

/// Gateway - southbound trust material service
#[derive(Parser, Debug)]
#[command(name = "gateway")]
#[command(about = "Gateway - load and export southbound TLS trust material")]
#[command(version)]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    ssl: SslArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Key store selection; flags and environment override the config file
#[derive(Args, Debug)]
struct SslArgs {
    /// YAML configuration file with an `ssl:` section
    #[arg(long, env = "GATEWAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Key store location (unset means no southbound trust material)
    #[arg(long, env = "GATEWAY_KEYSTORE", global = true)]
    key_store: Option<PathBuf>,

    /// Key store password
    #[arg(long, env = "GATEWAY_KEYSTORE_PASSWORD", hide_env_values = true, global = true)]
    key_store_password: Option<String>,

    /// Private key password
    #[arg(long, env = "GATEWAY_KEY_PASSWORD", hide_env_values = true, global = true)]
    key_password: Option<String>,

    /// Key store type (PKCS12 or PEM, default PKCS12)
    #[arg(long, env = "GATEWAY_KEYSTORE_TYPE", global = true)]
    key_store_type: Option<String>,

    /// Alias of the key store entry holding the chain
    #[arg(long, env = "GATEWAY_KEY_ALIAS", global = true)]
    key_alias: Option<String>,
}

impl From<&SslArgs> for SslSettings {
    fn from(args: &SslArgs) -> Self {
        SslSettings {
            key_store: args.key_store.clone(),
            key_store_password: args.key_store_password.clone().map(Into::into),
            key_password: args.key_password.clone().map(Into::into),
            key_store_type: args.key_store_type.clone().map(Into::into),
            key_alias: args.key_alias.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load trust material and serve it over HTTP
    #[command(long_about = r#"
Load the southbound key store and serve its certificate chain over HTTP.
The server only starts once the key store has been loaded successfully.

ENDPOINTS:
  GET /api/certificates       Certificate chain as PEM (empty if unconfigured)
  GET /api/certificates/info  Subject, issuer and validity per certificate
  GET /api/health             Health check

EXAMPLES:
  gateway serve --key-store keystore.p12 --key-store-password changeit
  GATEWAY_KEYSTORE=keystore.p12 GATEWAY_KEYSTORE_PASSWORD=changeit gateway serve
    "#)]
    Serve {
        /// Address to bind the HTTP server
        #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:10010")]
        bind: SocketAddr,
    },

    /// Write the certificate chain as PEM
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print subject, issuer and expiry of each certificate
    Inspect,

    /// Generate a development PKCS#12 key store (NOT for production)
    GenerateDevKeystore {
        /// Where to write the key store
        #[arg(short, long)]
        output: PathBuf,

        /// Key store password
        #[arg(long)]
        password: String,

        /// Alias for the generated chain
        #[arg(long, default_value = "gateway")]
        alias: String,

        /// Domain names for the leaf certificate
        #[arg(long = "domain", default_value = "localhost")]
        domains: Vec<String>,
    },
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Resolve the key store configuration and load it exactly once
fn initialize_trust(args: &SslArgs) -> Result<SouthboundTrust> {
    let file_settings = match &args.config {
        Some(path) => GatewayConfig::load(path)?.ssl,
        None => SslSettings::default(),
    };
    let key_store = file_settings
        .merge(SslSettings::from(args))
        .into_key_store_config();

    let mut initializer = TrustInitializer::new(key_store, FileKeyStoreLoader, TracingObserver);
    let trust = initializer
        .initialize()
        .context("Southbound trust material could not be loaded, aborting startup")?;

    if !trust.is_configured() {
        warn!("No key store configured, southbound certificate chain is empty");
    }
    Ok(trust)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}

fn serve(trust: SouthboundTrust, bind: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let server = ApiServer::new(ApiServerConfig { bind_addr: bind }, trust);
    runtime.block_on(server.start(shutdown_signal()))?;

    info!("Gateway stopped");
    Ok(())
}

fn export(trust: &SouthboundTrust, output: Option<PathBuf>) -> Result<()> {
    let pem = trust
        .certificates_in_pem_format()
        .context("Failed to convert the certificate chain to PEM")?;

    match output {
        Some(path) => {
            std::fs::write(&path, pem.as_str())
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!(
                "Wrote {} certificate(s) to {}",
                pem.block_count(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(pem.as_str().as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn inspect(trust: &SouthboundTrust) -> Result<()> {
    if !trust.is_configured() {
        println!("No southbound certificates configured");
        return Ok(());
    }

    let certificates = trust
        .certificate_info()
        .context("Failed to read southbound certificates")?;
    for (index, info) in certificates.iter().enumerate() {
        println!("[{}] subject: {}", index, info.subject);
        println!("    issuer:  {}", info.issuer);
        println!("    serial:  {}", info.serial);
        println!("    valid:   {} - {}", info.not_before, info.not_after);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve { bind } => {
            info!("Gateway starting...");
            let trust = initialize_trust(&cli.ssl)?;
            serve(trust, bind)
        }
        Commands::Export { output } => export(&initialize_trust(&cli.ssl)?, output),
        Commands::Inspect => inspect(&initialize_trust(&cli.ssl)?),
        Commands::GenerateDevKeystore {
            output,
            password,
            alias,
            domains,
        } => {
            let store = generate_dev_keystore(&alias, &password, &domains)
                .context("Failed to generate development key store")?;
            store
                .save_to_file(&output)
                .with_context(|| format!("Failed to write {:?}", output))?;

            info!(
                "Development key store written to {} (alias {})",
                output.display(),
                store.alias
            );
            warn!("Development key stores are self-signed, do not use them in production");
            Ok(())
        }
    }
}
