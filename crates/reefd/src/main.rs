//! `reefd`: the Reef daemon.
//!
//! Binary entrypoint that wires shard stores, the engine and the HTTP API
//! together, plus a few offline commands.
//!
//! # Usage
//!
//! ```text
//! reefd start                                  # serve the HTTP API
//! reefd start -c reef.toml -l 127.0.0.1:4821   # with a config file
//! reefd encode photo.jpg --key photo.jpg       # store shards, print manifest
//! reefd decode photo.json -o photo.jpg         # rebuild from a manifest
//! reefd check photo.json                       # which shards survive
//! reefd sign AKEXAMPLE --ttl 3600              # print an access token
//! reefd benchmark -n 200 -s 65536              # encode/lose/decode loop
//! ```

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reef_api::{ApiServer, ApiServerConfig};
use reef_auth::{Policy, TokenVerifier};
use reef_engine::{NodeRouter, ReefNode, ReefNodeConfig};
use reef_store::{FileStore, MemoryStore, ShardStore};
use reef_types::ShardManifest;
use tracing::{info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "reefd",
    version,
    about = "Reef erasure-coded object storage daemon"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Start {
        /// Override data directory.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Override HTTP listen address (e.g. "127.0.0.1:4821").
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,

        /// Keep shards in memory only.
        #[arg(short, long)]
        memory: bool,
    },

    /// Encode a file into shards and print its manifest.
    Encode {
        /// File to store.
        input: PathBuf,

        /// Object key; shard `i` is stored as `<key>.<i>`.
        #[arg(short, long)]
        key: String,

        /// Write the manifest here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebuild a file from its manifest.
    Decode {
        /// Manifest JSON produced by `encode` or the HTTP API.
        manifest: PathBuf,

        /// Where to write the recovered payload.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Report which of a manifest's shards are still stored.
    Check {
        /// Manifest JSON produced by `encode` or the HTTP API.
        manifest: PathBuf,
    },

    /// Print an access token for a configured key.
    Sign {
        /// Access key id from the `[auth.keys]` table.
        access_key_id: String,

        /// Token lifetime in seconds.
        #[arg(long, default_value = "3600")]
        ttl: u64,
    },

    /// Run an in-memory encode / lose / decode benchmark.
    Benchmark {
        /// Number of objects to write and read.
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        /// Size of each object in bytes.
        #[arg(short, long, default_value = "10240")]
        size: usize,

        /// Shards to delete before each read (at most the parity count).
        #[arg(long, default_value = "0")]
        lose: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Start {
            data_dir,
            listen_addr,
            memory,
        } => {
            // CLI args override config file values.
            if let Some(dir) = data_dir {
                config.node.data_dir = dir;
            }
            if let Some(addr) = listen_addr {
                config.node.listen_addr = addr;
            }
            if memory {
                config.storage.backend = "memory".to_string();
            }
            cmd_start(config).await
        }
        Commands::Encode { input, key, output } => {
            cmd_encode(&config, &input, &key, output.as_deref()).await
        }
        Commands::Decode { manifest, output } => cmd_decode(&config, &manifest, &output).await,
        Commands::Check { manifest } => {
            let recoverable = cmd_check(&config, &manifest).await?;
            if !recoverable {
                bail!("object is not recoverable");
            }
            Ok(())
        }
        Commands::Sign { access_key_id, ttl } => {
            let token = cmd_sign(&config, &access_key_id, Duration::from_secs(ttl))?;
            println!("{token}");
            Ok(())
        }
        Commands::Benchmark { count, size, lose } => cmd_benchmark(&config, count, size, lose).await,
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// -----------------------------------------------------------------------
// Node assembly
// -----------------------------------------------------------------------

/// Open one store per configured node and build the engine over them.
fn build_node(config: &CliConfig) -> Result<ReefNode> {
    let router = NodeRouter::new();
    let nodes = config.node_names();

    for name in &nodes {
        let store: Arc<dyn ShardStore> = match config.storage.backend.as_str() {
            "memory" => Arc::new(MemoryStore::new(config.max_bytes())),
            "file" => {
                let dir = config.node_dir(name);
                Arc::new(
                    FileStore::with_max_bytes(&dir, config.max_bytes())
                        .with_context(|| format!("failed to open store at {}", dir.display()))?,
                )
            }
            other => bail!("unknown storage backend {other:?} (expected \"file\" or \"memory\")"),
        };
        router.insert(name.clone(), store);
    }

    let node = ReefNode::new(
        ReefNodeConfig {
            erasure: config.erasure_config(),
            fetch: config.fetch_config(),
            nodes,
        },
        Arc::new(router),
    )
    .context("invalid erasure configuration")?;
    Ok(node)
}

// -----------------------------------------------------------------------
// reefd start
// -----------------------------------------------------------------------

async fn cmd_start(config: CliConfig) -> Result<()> {
    info!("starting reefd");
    info!(
        data_dir = %config.node.data_dir.display(),
        addr = %config.node.listen_addr,
        backend = %config.storage.backend,
        erasure = %config.erasure_config(),
        nodes = config.node_names().len(),
        "node configuration"
    );

    let engine = Arc::new(build_node(&config)?);

    let keys = config.key_store();
    if keys.is_empty() {
        warn!("no access keys configured: every object request will be denied");
    }

    let server = ApiServer::new(ApiServerConfig::new(
        engine,
        TokenVerifier::new(Arc::new(keys)),
    ));

    server
        .serve_with_shutdown(&config.node.listen_addr, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("reefd stopped");
    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// -----------------------------------------------------------------------
// reefd encode / decode
// -----------------------------------------------------------------------

async fn cmd_encode(
    config: &CliConfig,
    input: &Path,
    key: &str,
    output: Option<&Path>,
) -> Result<()> {
    if config.memory_mode() {
        warn!("memory backend: shards will be lost when reefd exits");
    }

    let data =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let node = build_node(config)?;
    let manifest = node
        .put_object(key, &data)
        .await
        .with_context(|| format!("failed to store {key}"))?;
    let json = manifest.to_json().context("failed to serialize manifest")?;

    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

async fn cmd_decode(config: &CliConfig, manifest: &Path, output: &Path) -> Result<()> {
    let json = std::fs::read(manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;
    let manifest = ShardManifest::from_slice(&json).context("invalid manifest")?;

    let node = build_node(config)?;
    let payload = node
        .get_object(&manifest)
        .await
        .context("failed to decode object")?;

    std::fs::write(output, &payload)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(size = payload.len(), output = %output.display(), "object decoded");
    Ok(())
}

// -----------------------------------------------------------------------
// reefd check
// -----------------------------------------------------------------------

/// Print the shard survey for a manifest. Returns whether enough shards
/// remain to decode it.
async fn cmd_check(config: &CliConfig, manifest: &Path) -> Result<bool> {
    let json = std::fs::read(manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;
    let manifest = ShardManifest::from_slice(&json).context("invalid manifest")?;

    let node = build_node(config)?;
    let presence = node
        .check_object(&manifest)
        .await
        .context("failed to check shards")?;

    let erasure = config.erasure_config();
    let missing: Vec<usize> = presence.absent_indices().collect();
    println!("Shards: {}/{}", presence.count_present(), presence.len());
    if !missing.is_empty() {
        println!("  missing: {missing:?}");
    }

    let recoverable = presence.count_present() >= erasure.data_shards;
    if recoverable {
        println!(
            "  recoverable: yes ({} more losses tolerated)",
            presence.count_present() - erasure.data_shards
        );
    } else {
        println!("  recoverable: no (need {})", erasure.data_shards);
    }
    Ok(recoverable)
}

// -----------------------------------------------------------------------
// reefd sign
// -----------------------------------------------------------------------

fn cmd_sign(config: &CliConfig, access_key_id: &str, ttl: Duration) -> Result<String> {
    let Some(key) = config.auth.keys.get(access_key_id) else {
        bail!("access key {access_key_id:?} is not configured under [auth.keys]");
    };
    let policy = Policy::expires_in(reef_auth::unix_now(), ttl);
    Ok(reef_auth::sign(access_key_id, &key.secret, &policy)?)
}

// -----------------------------------------------------------------------
// reefd benchmark
// -----------------------------------------------------------------------

async fn cmd_benchmark(config: &CliConfig, count: usize, size: usize, lose: usize) -> Result<()> {
    let erasure = config.erasure_config();
    if lose > erasure.parity_shards {
        bail!(
            "cannot lose {lose} shards with only {} parity shards",
            erasure.parity_shards
        );
    }

    println!("Reef Benchmark");
    println!("  objects:    {count}");
    println!("  size:       {size} bytes each");
    println!("  erasure:    {erasure}");
    println!("  lost/read:  {lose}");
    println!();

    // In-memory setup: measures pure coding throughput.
    let mut bench_config = CliConfig::default();
    bench_config.storage.backend = "memory".to_string();
    bench_config.erasure.data_shards = Some(erasure.data_shards);
    bench_config.erasure.parity_shards = Some(erasure.parity_shards);
    let node = build_node(&bench_config)?;

    let data = generate_bench_data(size);
    let total_bytes = count as u64 * size as u64;

    // --- Write ---
    print!("Encoding {count} objects... ");
    let start = Instant::now();
    let mut manifests = Vec::with_capacity(count);
    for i in 0..count {
        manifests.push(node.put_object(&format!("obj-{i}"), &data).await?);
    }
    let write_dur = start.elapsed();
    let write_mbs = total_bytes as f64 / write_dur.as_secs_f64() / 1_048_576.0;
    println!("{:.2}s ({write_mbs:.1} MB/s)", write_dur.as_secs_f64());

    // Drop the first `lose` data shards: the worst case for reconstruction.
    for manifest in &manifests {
        for descriptor in manifest.descriptors().iter().take(lose) {
            node.router()
                .delete_shard(&descriptor.node, &descriptor.path)
                .await?;
        }
    }

    // --- Read ---
    print!("Decoding {count} objects... ");
    let start = Instant::now();
    for manifest in &manifests {
        let payload = node.get_object(manifest).await?;
        if payload.len() != size {
            bail!("decoded {} bytes, expected {size}", payload.len());
        }
    }
    let read_dur = start.elapsed();
    let read_mbs = total_bytes as f64 / read_dur.as_secs_f64() / 1_048_576.0;
    println!("{:.2}s ({read_mbs:.1} MB/s)", read_dur.as_secs_f64());

    println!();
    println!("Summary:");
    println!("  Encode throughput: {write_mbs:.1} MB/s");
    println!("  Decode throughput: {read_mbs:.1} MB/s");
    println!(
        "  Total data:        {:.1} MB",
        total_bytes as f64 / 1_048_576.0
    );

    Ok(())
}

/// Generate deterministic test data for benchmarking.
fn generate_bench_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
