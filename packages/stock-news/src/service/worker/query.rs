use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use stock_news_endpoint_model::{Article, Symbol};
use crate::service::persistence::{CollectionStore, StoreError};

pub(in crate::service) struct FetchCommand {
    pub(in crate::service) symbol: Symbol,
    pub(in crate::service) size: i64,
    pub(in crate::service) reply: oneshot::Sender<Result<Vec<Article>, StoreError>>,
}

/// Answers fetches with load→filter→bound. Fetches never write, so up to
/// `max_in_flight` of them run at the same time.
pub(super) struct QueryWorker {
    store: CollectionStore,
    max_in_flight: usize,
}

impl QueryWorker {
    pub(super) fn new(store: CollectionStore, max_in_flight: usize) -> Self {
        Self {
            store,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub(super) async fn run(self, mut rx: mpsc::Receiver<FetchCommand>) {
        info!("query worker started for {} ({} in flight at most)", self.store.path().display(), self.max_in_flight);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                command = rx.recv(), if in_flight.len() < self.max_in_flight => {
                    let Some(command) = command else { break };
                    let store = self.store.clone();
                    in_flight.spawn_blocking(move || answer(&store, command));
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("fetch task failed: {e}");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("fetch task failed: {e}");
            }
        }

        info!("query worker drained");
    }
}

fn answer(store: &CollectionStore, FetchCommand { symbol, size, reply }: FetchCommand) {
    let result = store.load_all().map(|articles| select_by_symbol(articles, &symbol, size));

    match &result {
        Ok(found) => debug!("fetch {symbol} (size {size}): {} articles", found.len()),
        Err(e) => error!("fetch {symbol} failed: {e}"),
    }

    if reply.send(result).is_err() {
        debug!("the caller went away before fetch {symbol} was answered");
    }
}

/// Keeps the articles whose symbol is exactly `symbol`, in collection order, and
/// truncates to the first `size` of them. `size <= 0` selects nothing.
fn select_by_symbol(articles: Vec<Article>, symbol: &Symbol, size: i64) -> Vec<Article> {
    let Ok(size) = usize::try_from(size) else {
        return vec![];
    };

    articles
        .into_iter()
        .filter(|article| &article.symbol == symbol)
        .take(size)
        .collect()
}
