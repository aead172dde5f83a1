use std::path::PathBuf;
use clap::{Parser, Subcommand};
use crate::service::worker::WorkerConfig;

#[derive(Parser)]
pub struct Args {
    /// Log lines go here in addition to stdout.
    #[clap(long, global = true, default_value = "output.log")]
    pub log_file: PathBuf,
    #[clap(subcommand)]
    pub subcommand: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    Run {
        #[clap(long)]
        http_port: u16,
        #[clap(long)]
        http_host: String,
        #[clap(flatten)]
        collection: CollectionArgs,
        /// Used when a fetch does not say how many articles it wants.
        #[clap(long, default_value_t = 10, allow_negative_numbers = true)]
        default_fetch_size: i64,
        #[clap(flatten)]
        workers: WorkerArgs,
        /// Origin allowed by CORS. Can be given more than once.
        #[clap(long = "cors-origin")]
        cors_origins: Vec<String>,
        #[clap(long = "cloudflare")]
        cloudflare_support: bool,
    },
    /// Creates the article collection. Refuses to overwrite an existing one.
    Init {
        #[clap(flatten)]
        collection: CollectionArgs,
        /// JSON array of articles to start with.
        #[clap(long)]
        seed: Option<PathBuf>,
    },
    /// Appends every article of a JSON array file, in file order.
    Import {
        #[clap(long)]
        file_path: PathBuf,
        #[clap(flatten)]
        collection: CollectionArgs,
        #[clap(flatten)]
        workers: WorkerArgs,
    },
    Version {
        #[clap(long)]
        plain: bool,
    }
}

#[derive(clap::Args)]
pub struct CollectionArgs {
    #[clap(long, default_value = "data/articles.json")]
    pub data_file: PathBuf,
}

#[derive(clap::Args)]
pub struct WorkerArgs {
    /// Submissions waiting per worker before callers start to wait for room.
    #[clap(long, default_value_t = WorkerConfig::default().queue_capacity)]
    pub queue_capacity: usize,
    #[clap(long, default_value_t = WorkerConfig::default().max_concurrent_fetches)]
    pub max_concurrent_fetches: usize,
}

impl From<WorkerArgs> for WorkerConfig {
    fn from(value: WorkerArgs) -> Self {
        Self {
            queue_capacity: value.queue_capacity,
            max_concurrent_fetches: value.max_concurrent_fetches,
        }
    }
}
