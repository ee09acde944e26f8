use clap::Parser;
use directories::ProjectDirs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod aws;
mod cache;
mod error;
mod instance;
mod query;
mod session;
mod settings;
mod ssh_config;
mod synth;
mod username;

pub use error::{AsshError, Result};

use crate::aws::client::AwsClients;
use crate::cache::InstanceCache;
use crate::instance::Instance;
use crate::settings::Settings;
use crate::synth::{ConnectMode, JumpHost};

#[derive(Parser)]
#[command(name = "assh")]
#[command(about = "Fuzzy-find EC2 instances and connect over SSH, SSM, or SSH-over-SSM")]
#[command(version)]
struct Cli {
    /// Instance query: substring of an instance id, or case-insensitive
    /// substring of its Name tag. Multiple tokens are joined with spaces.
    #[arg(required = true)]
    query: Vec<String>,

    /// Connection mode
    #[arg(short, long, value_enum, default_value_t = ConnectMode::Ssh)]
    mode: ConnectMode,

    /// Proxy SSH via this instance (same query syntax)
    #[arg(short, long)]
    via: Option<String>,

    /// Login name override (applies to destination and jump host)
    #[arg(short, long = "login_name")]
    login_name: Option<String>,

    /// SSH private key override
    #[arg(short, long = "identity_file")]
    identity_file: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // The external session's exit status passes through verbatim.
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let query = cli.query.join(" ");

    let dirs = ProjectDirs::from("", "", "assh")
        .ok_or_else(|| AsshError::Config("cannot determine home directory".to_string()))?;
    let cache = InstanceCache::new(dirs.cache_dir());

    let clients = AwsClients::new().await;
    debug!("using AWS region '{}'", clients.region);

    let instances = cache.fetch(&clients).await?;

    let target = query::resolve(&instances, &query)?.clone();
    info!(
        "resolved query '{}' to instance {} ({})",
        query,
        target.id,
        target.name()
    );

    // A plain SSM session needs no username, key, or SSH configuration.
    if cli.mode == ConnectMode::Ssm {
        return session::start_ssm(&target.id).await;
    }

    let username = resolve_username(&cli, &clients, &target).await?;
    info!("resolved username as '{username}'");

    let settings = Settings::load()?;
    let profile = std::env::var("AWS_PROFILE")
        .ok()
        .or_else(|| std::env::var("AWS_DEFAULT_PROFILE").ok());
    let identity_file = cli.identity_file.clone().or_else(|| {
        settings
            .identity_file(profile.as_deref(), target.keyname.as_deref())
            .map(str::to_string)
    });

    let jump = match &cli.via {
        Some(via) => {
            let instance = query::resolve(&instances, via)?.clone();
            let username = resolve_username(&cli, &clients, &instance).await?;
            Some((instance, username))
        }
        None => None,
    };
    let jump = jump.as_ref().map(|(instance, username)| JumpHost {
        instance,
        username: username.clone(),
    });

    let config = synth::synthesize(
        &target,
        cli.mode,
        &username,
        identity_file.as_deref(),
        jump.as_ref(),
    )?;
    debug!("synthesized ssh configuration:\n{}", config.render());

    session::start_ssh(&config).await
}

/// `--login_name` overrides the image heuristic, for both the destination and
/// any jump host.
async fn resolve_username(cli: &Cli, clients: &AwsClients, instance: &Instance) -> Result<String> {
    match &cli.login_name {
        Some(name) => Ok(name.clone()),
        None => username::default_username(clients, instance).await,
    }
}
