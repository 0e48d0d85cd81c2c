//! Secure Listener command line tool
//!
//! Usage: `secure-listener <credential-store-path> <port> [OPTIONS]`

use clap::Parser;
use log::{debug, error, info, warn};
use std::error::Error as _;
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use secure_listener::common::{init_logger, ListenerError, Result};
use secure_listener::config::{validate_config, CliOverrides, ClientCertMode, ListenerConfig, LogMode};
use secure_listener::tls::{create_tls_acceptor, load_keystore, prompt_passphrase};
use secure_listener::{Listener, APP_NAME, VERSION};

/// Secure Listener: single-connection TLS relay with session transcript
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// PKCS#12 credential store holding the server key and certificate
    keystore: PathBuf,

    /// TCP port to listen on
    port: u16,

    /// Interface address to bind
    #[clap(long)]
    bind: Option<IpAddr>,

    /// Directory receiving the session transcript
    #[clap(long)]
    log_dir: Option<PathBuf>,

    /// Transcript open mode (overwrite, append)
    #[clap(long)]
    log_mode: Option<LogMode>,

    /// Log level
    #[clap(long)]
    log_level: Option<String>,

    /// Pump buffer size in bytes
    #[clap(long)]
    buffer_size: Option<usize>,

    /// Client certificate verification mode (required, optional, none)
    #[clap(long)]
    client_cert_mode: Option<ClientCertMode>,

    /// Load configuration from a JSON file
    #[clap(long)]
    config_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            keystore: Some(self.keystore.clone()),
            port: Some(self.port),
            bind_address: self.bind,
            log_dir: self.log_dir.clone(),
            log_mode: self.log_mode,
            log_level: self.log_level.clone(),
            buffer_size: self.buffer_size,
            client_cert_mode: self.client_cert_mode,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    };

    // stdin is read on a blocking thread that cannot be interrupted; exit
    // explicitly instead of waiting for the runtime to wind down
    std::process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let config = ListenerConfig::load(args.config_file.as_deref())?.merge(args.overrides());

    init_logger(&config.log_level);
    info!("Starting {} v{}", APP_NAME, VERSION);
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    validate_config(&config)?;

    let keystore = config.keystore.clone();
    let passphrase = tokio::task::spawn_blocking(move || prompt_passphrase(&keystore))
        .await
        .map_err(|e| ListenerError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

    let identity = load_keystore(&config.keystore, passphrase)?;
    info!("Certificate subject: {}", identity.subject());
    match identity.fingerprint() {
        Ok(fingerprint) => info!("Certificate fingerprint: {}", fingerprint),
        Err(e) => warn!("Unable to get certificate fingerprint: {}", e),
    }

    let tls_acceptor = create_tls_acceptor(&identity, &config.client_cert_mode)?;
    info!("Client certificate mode: {}", config.client_cert_mode);

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    Listener::new(config, tls_acceptor)
        .run(tokio::io::stdin(), tokio::io::stdout(), cancel)
        .await
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
        }

        cancel.cancel();
    });
}

/// Print the failure and its causes to stderr
fn report(err: &ListenerError) {
    if let ListenerError::Cancelled = err {
        info!("Cancelled, exiting");
        return;
    }

    error!("{}", err);
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
    eprintln!("Failure. Goodbye.");
}
