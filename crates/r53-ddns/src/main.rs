// # r53-dns-updater
//
// Thin command-line wrapper around `r53-ddns-core`:
// 1. Parse arguments (with `R53_DDNS_*` environment fallbacks)
// 2. Install logging
// 3. Build the Route 53 directory, HTTP lookup and optional SNS notifier
// 4. Run one reconciliation pass on a current-thread runtime
//
// All decision logic lives in `r53-ddns-core`; nothing here retries or
// inspects records.
//
// ## Example
//
// ```bash
// export AWS_PROFILE=dns-admin
// r53-dns-updater -v --sns arn:aws:sns:us-west-2:123456789012:dns-changes home.example.com
// ```
//
// AWS credentials and the Route 53 signing region come from the standard
// AWS configuration chain.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use r53_ddns_core::{
    AddressLookup, DEFAULT_MAX_ATTEMPTS, Notifier, Reconciler, UpdaterConfig, ZoneDirectory,
};
use r53_ddns_ip_http::{DEFAULT_LOOKUP_URL, HttpAddressLookup};
use r53_ddns_notify_sns::SnsNotifier;
use r53_ddns_provider_route53::Route53Directory;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Record up to date (written or not)
/// - 1: Invalid arguments or startup failure
/// - 2: Reconciliation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdaterExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<UpdaterExitCode> for ExitCode {
    fn from(code: UpdaterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep a Route 53 A record pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "r53-dns-updater", version, about)]
struct Cli {
    /// Fully qualified name of the A record to manage
    #[arg(value_name = "TARGET_RECORD", env = "R53_DDNS_TARGET_RECORD")]
    target_record: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TTL to apply, overriding the record's current TTL
    #[arg(short, long, env = "R53_DDNS_TTL")]
    ttl: Option<u32>,

    /// Attempts at discovering the public address
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ATTEMPTS, env = "R53_DDNS_MAX_TRIES")]
    max_tries: u32,

    /// SNS topic ARN to notify when the record changes
    #[arg(long = "sns", value_name = "TOPIC_ARN", env = "R53_DDNS_SNS_TOPIC")]
    sns_topic: Option<String>,

    /// Plain-text "what is my IP" endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_LOOKUP_URL, env = "R53_DDNS_LOOKUP_URL")]
    lookup_url: String,

    /// Seconds to wait between address discovery attempts
    #[arg(long, value_name = "SECS", default_value_t = 0, env = "R53_DDNS_RETRY_DELAY")]
    retry_delay: u64,

    /// Read everything and log the intended change without writing it
    #[arg(
        long,
        env = "R53_DDNS_DRY_RUN",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    dry_run: bool,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig::new(&self.target_record)
            .with_ttl_override(self.ttl)
            .with_max_attempts(self.max_tries)
            .with_notify_topic(self.sns_topic.clone())
            .with_retry_delay_secs(self.retry_delay)
            .with_dry_run(self.dry_run)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                UpdaterExitCode::ConfigError.into()
            } else {
                UpdaterExitCode::Success.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpdaterExitCode::ConfigError.into();
    }

    let config = cli.updater_config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return UpdaterExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(&cli.lookup_url, config)).into()
}

/// Wire the collaborators and run one pass
async fn run(lookup_url: &str, config: UpdaterConfig) -> UpdaterExitCode {
    let reconciler = match build_reconciler(lookup_url, config).await {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return UpdaterExitCode::ConfigError;
        }
    };

    match reconciler.reconcile().await {
        Ok(outcome) => {
            info!("{}", outcome);
            UpdaterExitCode::Success
        }
        Err(e) => {
            error!("{}", e);
            UpdaterExitCode::RuntimeError
        }
    }
}

async fn build_reconciler(lookup_url: &str, config: UpdaterConfig) -> Result<Reconciler> {
    let directory = Route53Directory::from_env().await;
    let lookup = HttpAddressLookup::new(lookup_url);

    let notifier: Option<Box<dyn Notifier>> = match &config.notify_topic {
        Some(topic) => {
            let notifier = SnsNotifier::for_topic(topic)
                .await
                .context("Failed to set up the SNS notifier")?;
            Some(Box::new(notifier))
        }
        None => None,
    };

    info!(
        "Managing {} via {} (lookup {})",
        config.record_name,
        directory.provider_name(),
        lookup.endpoint()
    );

    Reconciler::new(Box::new(directory), Box::new(lookup), notifier, config)
        .context("Failed to build the reconciler")
}
