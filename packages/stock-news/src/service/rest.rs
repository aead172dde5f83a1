pub mod api;
pub mod cors;
pub mod exposed_representation_format;

use std::path::PathBuf;
use std::sync::Arc;
use actix_web::{App, HttpServer};
use actix_web::middleware::Logger;
use actix_web::web::{scope as prefixed_service, Data, ServiceConfig};
use anyhow::Context;
use log::{info, warn};
use crate::service::persistence::{CollectionLock, CollectionStore};
use crate::service::rest::api::article;
use crate::service::worker::{self, WorkerConfig};

pub(in self) use inner_no_leak::ComposeInternalError;

mod inner_no_leak {
    use std::error::Error;
    use thiserror::Error;

    pub type ComposeInternalError<T> = Result<T, UnhandledError>;

    #[derive(Error, Debug)]
    #[error("Internal error: {_0}")]
    pub struct UnhandledError(pub Box<dyn Error>);

    impl UnhandledError {
        pub fn new<E: Error + 'static>(error: E) -> Self {
            Self(Box::new(error) as _)
        }
    }
}

/// Used when `GET /api/v1/articles` comes without `size`.
#[derive(Debug, Clone, Copy)]
pub struct FetchDefaults {
    pub size: i64,
}

pub struct ServerSettings {
    pub http_host: String,
    pub http_port: u16,
    pub data_file: PathBuf,
    pub default_fetch_size: i64,
    pub workers: WorkerConfig,
    pub cors_origins: Vec<String>,
    pub proxied_by_cloudflare: bool,
}

pub fn configure(config: &mut ServiceConfig) {
    config.service(
        prefixed_service("/api")
            .service(
                prefixed_service("/v1")
                    .service((article::save, article::fetch))
            )
    );
}

pub async fn boot_http_server(settings: ServerSettings) -> Result<(), anyhow::Error> {
    let _lock = CollectionLock::try_acquire(&settings.data_file)
        .context("while locking the article collection")?;

    let store = CollectionStore::new(&settings.data_file);
    match store.load_all() {
        Ok(articles) => info!("serving {} ({} articles)", store.path().display(), articles.len()),
        Err(e) => warn!("{e}; requests will fail until it becomes available"),
    }

    let (service, workers) = worker::start(store, settings.workers);
    let service_data = Data::new(service.clone());
    let fetch_defaults = Data::new(FetchDefaults { size: settings.default_fetch_size });
    let cors_origins = Arc::new(settings.cors_origins);
    let proxied_by_cloudflare = settings.proxied_by_cloudflare;

    let http_server = HttpServer::new(move || {
        let logger_format = if proxied_by_cloudflare {
            r#"%a (CF '%{CF-Connecting-IP}i') %t "%r" %s "%{Referer}i" "%{User-Agent}i" "#
        } else {
            r#"%a %t "%r" %s "%{Referer}i" "%{User-Agent}i" "#
        };

        App::new()
            .app_data(service_data.clone())
            .app_data(fetch_defaults.clone())
            .configure(configure)
            .wrap(Logger::new(logger_format))
            .wrap(cors::middleware_factory(&cors_origins))
    });

    let served = match http_server.bind((settings.http_host.as_str(), settings.http_port)) {
        Ok(bound) => {
            info!("running!");
            bound.run().await.context("while running server")
        }
        Err(e) => Err(e).context("while binding server"),
    };

    // the server has stopped taking requests; finish what the workers already accepted
    service.close();
    workers.drain().await;

    served
}
