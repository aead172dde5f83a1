#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery)]
// This fires on HttpRequest, which is not FP.
// But causes ICE; it will block CI.
// Let's disable this until the fix land on 1.71.0. See https://github.com/rust-lang/rust-clippy/issues/10645 for more info.
#![allow(clippy::future_not_send)]

mod service;

use std::fs;
use std::path::Path;
use anyhow::{Context as _, Result};
use clap::Parser;
use fern::colors::ColoredLevelConfig;
use log::info;

use crate::service::cli::{Args, Commands};
use crate::service::import::{import, read_articles};
use crate::service::persistence::CollectionStore;
use crate::service::rest::{boot_http_server, ServerSettings};

fn setup_logger(log_file: &Path) -> Result<()> {
    let colors = ColoredLevelConfig::new();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ));
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file(log_file)?)
        .apply()?;
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args: Args = Args::parse();
    if let Err(e) = setup_logger(&args.log_file) {
        eprintln!("logging to {} is unavailable: {e}", args.log_file.display());
    }

    match args.subcommand {
        Commands::Run {
            http_port,
            http_host,
            collection,
            default_fetch_size,
            workers,
            cors_origins,
            cloudflare_support,
        } => {
            boot_http_server(ServerSettings {
                http_host,
                http_port,
                data_file: collection.data_file,
                default_fetch_size,
                workers: workers.into(),
                cors_origins,
                proxied_by_cloudflare: cloudflare_support,
            }).await
        }
        Commands::Init { collection, seed } => {
            let seed = seed
                .map(|path| read_articles(&path).with_context(|| format!("while reading {}", path.display())))
                .transpose()?
                .unwrap_or_default();

            if let Some(parent) = collection.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("while creating {}", parent.display()))?;
            }

            CollectionStore::init(&collection.data_file, &seed)
                .with_context(|| format!("while creating {}", collection.data_file.display()))?;
            info!("created {} with {} articles", collection.data_file.display(), seed.len());

            Ok(())
        }
        Commands::Import { file_path, collection, workers } => {
            import(&file_path, &collection.data_file, workers.into()).await?;

            Ok(())
        }
        Commands::Version { plain } => {
            const VERSION: &str = env!("CARGO_PKG_VERSION");
            const NAME: &str = env!("CARGO_PKG_NAME");
            if plain {
                println!("{VERSION}");
            } else {
                println!("{NAME} {VERSION}");
            }

            Ok(())
        }
    }
}
