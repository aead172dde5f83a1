use std::io;
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use stock_news_endpoint_model::Article;
use crate::service::persistence::{CollectionStore, StoreError};

pub(in crate::service) struct SaveCommand {
    pub(in crate::service) article: Article,
    pub(in crate::service) reply: oneshot::Sender<Result<(), StoreError>>,
}

/// Sole writer of the collection. Each command is one load→append→replace cycle,
/// and the next command is not taken off the queue until the cycle has finished.
pub(super) struct WriteSerializer {
    store: CollectionStore,
}

impl WriteSerializer {
    pub(super) const fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub(super) async fn run(self, mut rx: mpsc::Receiver<SaveCommand>) {
        info!("write serializer started for {}", self.store.path().display());
        let mut appended = 0_u64;

        while let Some(SaveCommand { article, reply }) = rx.recv().await {
            let store = self.store.clone();
            let result = tokio::task::spawn_blocking(move || append(&store, article))
                .await
                .unwrap_or_else(|e| Err(StoreError::Unavailable(io::Error::other(e))));

            match &result {
                Ok(()) => appended += 1,
                Err(e) => error!("save failed: {e}"),
            }

            if reply.send(result).is_err() {
                debug!("the caller went away before the save was acknowledged");
            }
        }

        info!("write serializer drained ({appended} articles appended)");
    }
}

fn append(store: &CollectionStore, article: Article) -> Result<(), StoreError> {
    let mut articles = store.load_all()?;
    debug!("appending {} as #{}", article.symbol, articles.len());
    articles.push(article);
    store.replace_all(&articles)
}
