use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::string::FromUtf8Error;
use anyhow::Context;
use log::{debug, info};
use thiserror::Error;
use stock_news_endpoint_model::Article;
use crate::service::persistence::{CollectionLock, CollectionStore};
use crate::service::worker::{self, WorkerConfig};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("You can not import non-existent file")]
    NotFound,
    #[error("Non-file paths are not supported")]
    NotAFile,
    #[error("I/O Error: {_0}")]
    Io(#[from] io::Error),
    #[error("The file is not UTF-8: {_0}\n\
    Please review following list:\n\
    - The file is not binary\n\
    - The text is encoded with UTF-8\n\
    Especially, importing Shift-JIS texts are NOT supported.")]
    NotUtf8(#[from] FromUtf8Error),
    #[error("The file is not a JSON array of articles: {_0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reads a JSON array of articles, as written by the server itself.
pub fn read_articles(file_path: &Path) -> Result<Vec<Article>, ImportError> {
    if !file_path.exists() {
        return Err(ImportError::NotFound)
    }

    if !file_path.is_file() {
        debug!("is_dir: {}", file_path.is_dir());
        debug!("is_symlink: {}", file_path.is_symlink());
        debug!("metadata: {:?}", file_path.metadata()?);
        return Err(ImportError::NotAFile)
    }

    let content = {
        let mut fd = BufReader::new(File::open(file_path)?);
        let mut buf = vec![];
        fd.read_to_end(&mut buf)?;
        String::from_utf8(buf)?
    };

    Ok(serde_json::from_str(&content)?)
}

/// Appends the articles of `file_path` to the collection through the write serializer.
/// Stops at the first failed save; everything before it stays appended.
pub async fn import(file_path: &Path, data_file: &Path, config: WorkerConfig) -> Result<usize, anyhow::Error> {
    let articles = read_articles(file_path)?;
    let _lock = CollectionLock::try_acquire(data_file)
        .context("while locking the article collection")?;

    let (service, workers) = worker::start(CollectionStore::new(data_file), config);

    let mut imported = 0_usize;
    let mut failure = None;
    for article in articles {
        match service.save(article).await {
            Ok(()) => imported += 1,
            Err(e) => {
                failure = Some(e);
                break
            }
        }
    }

    service.close();
    workers.drain().await;

    if let Some(e) = failure {
        return Err(e).with_context(|| format!("imported {imported} articles before failing"));
    }

    info!("Successfully imported {imported} articles.");
    Ok(imported)
}
