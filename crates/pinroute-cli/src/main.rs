//! # pinroute CLI entry point
//!
//! Two operational modes:
//!
//! ```bash
//! # Run one directory replica (settings default from the environment:
//! # PORT, SERVICE_PREFIX, SERVICE_SUFFIX, REPLICAS, INDEX_MODE,
//! # INDEX_BASE, SERVER_PEERS; flags override)
//! pinroute serve --port 8081 --service-prefix poc-routing-server --replicas 2
//!
//! # Issue one join through a gateway and print the response
//! pinroute call http://localhost:10000 --client-id 123
//!
//! # Same, but run the two-phase dispatch locally against a pool member
//! pinroute call http://localhost:8081 --client-id 123 --two-phase
//! ```

use anyhow::Result;
use argh::FromArgs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pinroute_selector::{split_peers, AddressTemplate, IndexMode, RoutingConfig};

#[derive(FromArgs)]
/// pinroute - deterministic client-to-replica routing
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Operational modes: serve a directory replica, or send a join.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
}

/// Arguments for running one directory replica.
///
/// Every flag defaults from the corresponding environment key, so a
/// containerized deployment can configure the process entirely through
/// the environment and a local run can override per-invocation.
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run a directory service replica
struct ServeArgs {
    /// port to listen on and report in this replica's identity
    /// (env: PORT, default 8081)
    #[argh(option)]
    port: Option<u16>,

    /// service name prefix enabling templated scaled addressing
    /// (env: SERVICE_PREFIX)
    #[argh(option)]
    service_prefix: Option<String>,

    /// suffix appended after the index in formatted addresses
    /// (env: SERVICE_SUFFIX)
    #[argh(option)]
    service_suffix: Option<String>,

    /// replica count for the selector; values below 1 are clamped
    /// (env: REPLICAS, default 1)
    #[argh(option)]
    replicas: Option<i64>,

    /// indexing mode, "hash" or "numeric" (env: INDEX_MODE)
    #[argh(option)]
    index_mode: Option<String>,

    /// offset added to the computed remainder (env: INDEX_BASE,
    /// default 1)
    #[argh(option)]
    index_base: Option<i64>,

    /// comma-separated legacy peer list, used only without a prefix
    /// (env: SERVER_PEERS)
    #[argh(option)]
    peers: Option<String>,
}

/// Arguments for issuing one join request.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// send a join request and print the response
struct CallArgs {
    /// gateway URL (or a pool member URL with --two-phase)
    #[argh(positional)]
    url: String,

    /// client identifier to join as
    #[argh(option, default = "\"123\".into()")]
    client_id: String,

    /// run the two-phase dispatch protocol locally instead of relying
    /// on an external gateway
    #[argh(switch)]
    two_phase: bool,
}

/// Environment-derived configuration with flag overrides applied.
fn build_config(args: &ServeArgs) -> RoutingConfig {
    let mut config = RoutingConfig::from_env();

    if let Some(port) = args.port {
        config.identity.port = port;
        if let Some(template) = &mut config.template {
            template.port = port;
        }
    }
    if let Some(prefix) = &args.service_prefix {
        let suffix = args
            .service_suffix
            .clone()
            .or_else(|| config.template.as_ref().map(|t| t.suffix.clone()))
            .unwrap_or_default();
        config.template = Some(AddressTemplate {
            prefix: prefix.clone(),
            suffix,
            port: config.identity.port,
        });
    } else if let (Some(suffix), Some(template)) = (&args.service_suffix, &mut config.template) {
        template.suffix = suffix.clone();
    }
    if let Some(replicas) = args.replicas {
        config.replica_set.replicas = if replicas > 0 { replicas as u32 } else { 1 };
    }
    if let Some(mode) = &args.index_mode {
        config.replica_set.mode = IndexMode::parse(mode);
    }
    if let Some(base) = args.index_base {
        config.replica_set.base = base;
    }
    if let Some(peers) = &args.peers {
        config.peers = split_peers(peers);
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // `call` keeps stdout clean for piping; only `serve` logs.
    if matches!(cli.command, Commands::Serve(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args);
    let port = config.identity.port;
    tracing::info!(
        "starting directory replica (identity {}, mode {:?}, replicas {})",
        config.identity.host_port(),
        config.replica_set.mode,
        config.replica_set.replicas
    );

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let server = pinroute_directory::HttpServer::new(Arc::new(config));
    server.run(addr).await?;
    Ok(())
}

async fn run_call(args: CallArgs) -> Result<()> {
    if args.two_phase {
        let dispatcher = pinroute_dispatch::Dispatcher::new(args.url)?;
        let receipt = dispatcher.dispatch_join(&args.client_id).await?;
        println!(
            "status={} client_id={} assigned={}",
            receipt.status, receipt.client_id, receipt.assigned
        );
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = client
        .get(format!("{}/join", args.url.trim_end_matches('/')))
        .query(&[("client_id", &args.client_id)])
        .send()
        .await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    println!("status={} body={}", status, body);
    Ok(())
}
