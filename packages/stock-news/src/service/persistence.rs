use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use fs2::FileExt;
use log::{debug, error, info, trace};
use tempfile::NamedTempFile;
use thiserror::Error;
use stock_news_endpoint_model::Article;

/// The persisted article collection: one JSON array, rewritten in full on every replace.
///
/// This type does no synchronization of its own. Appends must go through the write
/// serializer; concurrent `load_all` calls are fine because `replace_all` swaps the
/// file in with a rename.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    path: Arc<PathBuf>,
}

impl CollectionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the collection with `seed` as its initial contents.
    /// An existing collection is never overwritten.
    pub fn init(path: impl AsRef<Path>, seed: &[Article]) -> Result<(), StoreError> {
        let store = Self::new(path);
        info!("creating article collection at {}", store.path().display());
        let staged = store.stage(|writer| write_collection(writer, seed))?;
        staged.persist_noclobber(store.path()).map_err(|e| e.error)?;

        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<Article>, StoreError> {
        let mut buf = vec![];
        BufReader::new(File::open(self.path())?).read_to_end(&mut buf)?;
        trace!("read {len} bytes from {path}", len = buf.len(), path = self.path().display());

        // `null` is what an empty collection looked like to older writers.
        let articles: Option<Vec<Article>> = serde_json::from_slice(&buf).map_err(|e| {
            error!("{path} is not an article collection: {e}", path = self.path().display());
            e
        })?;

        Ok(articles.unwrap_or_default())
    }

    pub fn replace_all(&self, items: &[Article]) -> Result<(), StoreError> {
        self.replace_with(|writer| write_collection(writer, items))?;
        debug!("replaced collection with {len} articles", len = items.len());

        Ok(())
    }

    fn replace_with<F>(&self, fill: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), StoreError>,
    {
        let staged = self.stage(fill)?;
        staged.persist(self.path()).map_err(|e| e.error)?;

        Ok(())
    }

    /// Writes a complete document into a synced temporary file next to the collection.
    /// The temporary file is removed if `fill` fails.
    fn stage<F>(&self, fill: F) -> Result<NamedTempFile, StoreError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), StoreError>,
    {
        let directory = match self.path().parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(directory)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let sink: &mut dyn Write = &mut writer;
            fill(sink)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        Ok(temp)
    }
}

fn write_collection(writer: &mut dyn Write, items: &[Article]) -> Result<(), StoreError> {
    // a failing sink surfaces as a serde_json error too; that is still the medium's fault
    serde_json::to_writer(writer, items).map_err(|e| {
        if e.is_io() {
            StoreError::Unavailable(e.into())
        } else {
            StoreError::Corrupt(e)
        }
    })
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("article collection is unavailable: {_0}")]
    Unavailable(#[from] io::Error),
    #[error("article collection is corrupt: {_0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Exclusive advisory lock held next to the collection, so that only one process
/// serves a given collection at a time.
#[derive(Debug)]
pub struct CollectionLock {
    file: File,
    path: PathBuf,
}

impl CollectionLock {
    pub fn lock_path_for(collection: &Path) -> PathBuf {
        let mut name = collection.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn try_acquire(collection: &Path) -> Result<Self, FileLockError> {
        let path = Self::lock_path_for(collection);
        if let Some(directory) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(directory)?;
        }
        let file = File::options().read(true).write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                FileLockError::Contended(path.clone())
            } else {
                FileLockError::Io(e)
            }
        })?;
        debug!("locked {}", path.display());

        Ok(Self {
            file,
            path,
        })
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        if let Some(x) = self.file.unlock().err() {
            error!("unable to unlock {path}, ignoring error. detail: {x:?}", path = self.path.display());
        }
    }
}

impl Deref for CollectionLock {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

#[derive(Debug, Error)]
pub enum FileLockError {
    #[error("IO: {0:?}")]
    Io(#[from] io::Error),
    #[error("{} is held by another process", .0.display())]
    Contended(PathBuf),
}
