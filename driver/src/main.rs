use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use dnsload_driver::config::DriverConfig;
use dnsload_driver::{ramp, split, supervisor};

#[derive(Parser)]
#[command(name = "dnsload")]
#[command(about = "dnsload - dnsperf/resperf driver for DNS resolver load runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "/etc/dnsload/config.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a ranking CSV into dnsperf input shards
    Split {
        /// Ranking CSV (rank,domain per row)
        ranking: Option<PathBuf>,
        /// Directory for the shard files
        output_dir: Option<PathBuf>,
    },
    /// Run dnsperf against one shard with periodic hard restarts
    Run {
        /// Shard number (as produced by `split`)
        file_number: Option<u32>,
        /// Target DNS server address
        server: Option<String>,
        /// Parallel worker count
        workers: Option<usize>,
    },
    /// Ramp resperf up until the resolver's breaking point
    Ramp {
        /// Target DNS server address
        server: Option<String>,
        /// Ranking CSV (rank,domain per row)
        ranking: Option<PathBuf>,
    },
    /// Validate configuration
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Version => {
            println!("dnsload {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Validate { config } => {
            let config_path = config.as_ref().unwrap_or(&cli.config);
            let cfg = DriverConfig::load(config_path)?;
            println!("Configuration valid: {:?}", config_path);
            println!("{:#?}", cfg);
            return Ok(());
        }
        _ => {}
    }

    let cfg = DriverConfig::load_or_default(&cli.config)?;

    // Initialize logging
    let filter = if cli.debug {
        "dnsload=debug,dnsload_driver=debug".to_string()
    } else {
        format!(
            "dnsload={level},dnsload_driver={level}",
            level = cfg.logging.level
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Split {
            ranking,
            output_dir,
        } => {
            let input = ranking.unwrap_or_else(|| PathBuf::from(&cfg.split.input));
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&cfg.split.output_dir));
            let summary = split::split_ranking(
                &input,
                &output_dir,
                cfg.split.shard_size,
                cfg.split.max_domains,
            )?;
            println!("Total domains processed: {}", summary.domains);
            println!("Total files created: {}", summary.files.len());
            println!("Output directory: {}", output_dir.display());
        }
        Commands::Run {
            file_number,
            server,
            workers,
        } => {
            let Some(number) = file_number else {
                eprintln!("Usage: dnsload run <file_number> [dns_server] [workers]");
                eprintln!("Example: dnsload run 1 8.8.8.8 2");
                list_shards(&cfg.dnsperf.shard_dir);
                std::process::exit(1);
            };
            let server = server.unwrap_or_else(|| cfg.dnsperf.server.clone());
            let workers = workers.unwrap_or(cfg.dnsperf.workers);

            let shard_dir = PathBuf::from(&cfg.dnsperf.shard_dir);
            let shard = split::find_shard(&shard_dir, number)?.ok_or_else(|| {
                anyhow::anyhow!(
                    "no shard file matching number {} under {}",
                    number,
                    shard_dir.display()
                )
            })?;

            info!("using shard {}", shard.display());
            supervisor::run_parallel(&cfg.dnsperf, &server, &shard, workers).await?;
        }
        Commands::Ramp { server, ranking } => {
            let server = server.unwrap_or_else(|| cfg.resperf.server.clone());
            let ranking = ranking.unwrap_or_else(|| PathBuf::from(&cfg.split.input));
            info!("ramping against {} with {}", server, ranking.display());
            let _peak = ramp::run_ramp(&cfg.resperf, &server, &ranking).await?;
        }
        Commands::Validate { .. } | Commands::Version => unreachable!("handled above"),
    }

    Ok(())
}

fn list_shards(dir: &str) {
    let shards = split::list_shards(Path::new(dir));
    if shards.is_empty() {
        eprintln!("No shard files found in {}/", dir);
    } else {
        eprintln!("Available shards:");
        for shard in shards {
            eprintln!("  {}", shard.display());
        }
    }
}
