//! Request/reply plumbing between callers and the two workers.
//!
//! Callers hold an [`ArticleService`]; every save or fetch becomes one message on a
//! bounded queue, carrying a `oneshot` slot the worker answers through.
mod query;
mod serializer;

use std::sync::{Arc, PoisonError, RwLock};
use log::{info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use stock_news_endpoint_model::{Article, Symbol};
use crate::service::persistence::{CollectionStore, StoreError};
use self::query::{FetchCommand, QueryWorker};
use self::serializer::{SaveCommand, WriteSerializer};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
    pub max_concurrent_fetches: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_concurrent_fetches: 4,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("the service is shutting down")]
    ShuttingDown,
    #[error("the worker stopped without replying")]
    WorkerGone,
}

/// Cloneable submission handle. Once [`ArticleService::close`] has been called on
/// any clone, every clone rejects new work with [`ServiceError::ShuttingDown`].
#[derive(Clone, Debug)]
pub struct ArticleService {
    queues: Arc<Queues>,
}

#[derive(Debug)]
struct Queues {
    save: RwLock<Option<mpsc::Sender<SaveCommand>>>,
    fetch: RwLock<Option<mpsc::Sender<FetchCommand>>>,
}

impl ArticleService {
    /// Appends `article` to the collection and returns once it has been written.
    pub async fn save(&self, article: Article) -> Result<(), ServiceError> {
        let (reply, answer) = oneshot::channel();
        submit(&self.queues.save, SaveCommand { article, reply }).await?;

        answer.await.map_err(|_| ServiceError::WorkerGone)?.map_err(ServiceError::from)
    }

    /// Up to `size` articles for `symbol`, oldest first. `size <= 0` yields nothing.
    pub async fn fetch(&self, symbol: Symbol, size: i64) -> Result<Vec<Article>, ServiceError> {
        let (reply, answer) = oneshot::channel();
        submit(&self.queues.fetch, FetchCommand { symbol, size, reply }).await?;

        answer.await.map_err(|_| ServiceError::WorkerGone)?.map_err(ServiceError::from)
    }

    /// Stops accepting submissions. Already queued work is still processed.
    ///
    /// A caller still waiting for room on a full queue is refused with
    /// [`ServiceError::ShuttingDown`] once room frees up; nothing enters a queue after this returns.
    pub fn close(&self) {
        let save = self.queues.save.write().unwrap_or_else(PoisonError::into_inner).take();
        let fetch = self.queues.fetch.write().unwrap_or_else(PoisonError::into_inner).take();
        if save.is_some() || fetch.is_some() {
            info!("no longer accepting submissions");
        }
    }
}

async fn submit<T>(slot: &RwLock<Option<mpsc::Sender<T>>>, command: T) -> Result<(), ServiceError> {
    let queue = sender_of(slot)?;
    let permit = queue.reserve().await.map_err(|_| ServiceError::ShuttingDown)?;

    // close() may have run while this caller was waiting for room
    let open = slot.read().unwrap_or_else(PoisonError::into_inner);
    if open.is_none() {
        return Err(ServiceError::ShuttingDown);
    }
    permit.send(command);

    Ok(())
}

fn sender_of<T>(slot: &RwLock<Option<mpsc::Sender<T>>>) -> Result<mpsc::Sender<T>, ServiceError> {
    slot.read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(ServiceError::ShuttingDown)
}

/// The running workers. Dropping this does not stop them; call [`Workers::drain`].
#[derive(Debug)]
pub struct Workers {
    serializer: JoinHandle<()>,
    query: JoinHandle<()>,
}

impl Workers {
    /// Waits until both workers have answered everything they accepted.
    /// Only finishes after every [`ArticleService`] clone is closed or dropped.
    pub async fn drain(self) {
        if let Err(e) = self.serializer.await {
            warn!("write serializer ended abnormally: {e}");
        }
        if let Err(e) = self.query.await {
            warn!("query worker ended abnormally: {e}");
        }
        info!("workers drained");
    }
}

/// Spawns both workers on the current tokio runtime.
pub fn start(store: CollectionStore, config: WorkerConfig) -> (ArticleService, Workers) {
    let (save_tx, save_rx) = mpsc::channel(config.queue_capacity.max(1));
    let (fetch_tx, fetch_rx) = mpsc::channel(config.queue_capacity.max(1));

    let workers = Workers {
        serializer: tokio::spawn(WriteSerializer::new(store.clone()).run(save_rx)),
        query: tokio::spawn(QueryWorker::new(store, config.max_concurrent_fetches).run(fetch_rx)),
    };

    let service = ArticleService {
        queues: Arc::new(Queues {
            save: RwLock::new(Some(save_tx)),
            fetch: RwLock::new(Some(fetch_tx)),
        }),
    };

    (service, workers)
}
