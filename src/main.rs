use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use versioned_cluster::coordinator::CoordinatorConfig;
use versioned_cluster::manager::DataManager;
use versioned_cluster::manager::handlers::gateway_router;
use versioned_cluster::storage::handlers::replica_router;
use versioned_cluster::storage::http::{HttpReplicatedStore, peer_id};
use versioned_cluster::storage::MemoryReplica;

const DEFAULT_REPLICATION_FACTOR: usize = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} --bind <addr:port> [--peer <addr:port>]... [--replication <n>] \
         [--put-retries <n>] [--remove-retries <n>] [--confirm-retries <n>] [--timeout-ms <ms>]",
        program
    );
    eprintln!("Example: {} --bind 127.0.0.1:7000", program);
    eprintln!(
        "Example: {} --bind 127.0.0.1:7001 --peer 127.0.0.1:7000 --peer 127.0.0.1:7002",
        program
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "versioned-node".to_string());

    let mut bind_addr: Option<SocketAddr> = None;
    let mut peers: Vec<SocketAddr> = vec![];
    let mut replication_factor = DEFAULT_REPLICATION_FACTOR;
    let mut timeout = DEFAULT_TIMEOUT;
    let mut config = CoordinatorConfig::default();

    let mut rest = args.iter().skip(1);
    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .ok_or_else(|| anyhow::anyhow!("Missing value for {}", flag))
        };
        match flag.as_str() {
            "--bind" => bind_addr = Some(value()?.parse()?),
            "--peer" => peers.push(value()?.parse()?),
            "--replication" => replication_factor = value()?.parse()?,
            "--put-retries" => config = config.with_put_retries(value()?.parse()?),
            "--remove-retries" => config = config.with_remove_retries(value()?.parse()?),
            "--confirm-retries" => config = config.with_confirm_retries(value()?.parse()?),
            "--timeout-ms" => timeout = Duration::from_millis(value()?.parse()?),
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
    }

    let Some(bind_addr) = bind_addr else {
        print_usage(&program);
        std::process::exit(1);
    };

    if !peers.contains(&bind_addr) {
        peers.push(bind_addr);
    }

    tracing::info!("Starting replica node {}", bind_addr);
    tracing::info!(
        "Replica set: {:?} (replication factor {})",
        peers,
        replication_factor
    );
    tracing::info!(
        "Retries: put={} remove={} confirm={}, replica timeout {:?}",
        config.max_put_retries,
        config.max_remove_retries,
        config.max_confirm_retries,
        timeout
    );

    // 1. Local replica:
    let replica = Arc::new(MemoryReplica::new(peer_id(&bind_addr)));

    // 2. Replicated store over every peer, this node included:
    let store = Arc::new(HttpReplicatedStore::new(peers, replication_factor, timeout));

    // 3. Coordinators:
    let manager = DataManager::new(store, config, tokio::runtime::Handle::current());

    // 4. HTTP Router:
    let app = Router::new()
        .merge(replica_router(replica.clone()))
        .merge(gateway_router(manager));

    // 5. Spawn stats reporter:
    let stats_replica = replica.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            tracing::info!(
                "Replica {} holds {} version(s)",
                stats_replica.id(),
                stats_replica.local_entry_count()
            );
        }
    });

    // 6. Start HTTP server:
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
