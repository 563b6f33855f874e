//! FileModelStore - one JSON file per document on local disk.
//!
//! Layout is `<root>/<collection>/<id>.json`. Every write lands in a hidden
//! `.<id>.<nonce>.tmp` file first and is only published once complete: inserts
//! hard-link the temp file into place, which fails if the id is taken, and
//! replacements rename over the old document. Readers never see a
//! half-written document, and temp files left behind by an interrupted write
//! are skipped by listings and swept on `open`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{from_document, merge_into, to_document, Document, Model, ModelError, ModelStore};

const EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Document store rooted at a directory.
#[derive(Clone)]
pub struct FileModelStore {
    root: PathBuf,
    // Serializes read-modify-write merges.
    write_lock: Arc<Mutex<()>>,
}

impl FileModelStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|err| {
            ModelError::Unavailable(format!(
                "cannot create data directory {}: {}",
                root.display(),
                err
            ))
        })?;

        let store = Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.sweep_temp_files().await?;
        Ok(store)
    }

    /// Remove temp files orphaned by writes that never finished.
    async fn sweep_temp_files(&self) -> Result<(), ModelError> {
        let mut collections = fs::read_dir(&self.root)
            .await
            .map_err(|err| io_error("list", &self.root, err))?;

        while let Some(collection) = collections
            .next_entry()
            .await
            .map_err(|err| io_error("list", &self.root, err))?
        {
            let is_dir = collection
                .file_type()
                .await
                .map(|kind| kind.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            let dir = collection.path();
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|err| io_error("list", &dir, err))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|err| io_error("list", &dir, err))?
            {
                let path = entry.path();
                if !is_temp_file(&path) {
                    continue;
                }
                match fs::remove_file(&path).await {
                    Ok(()) => log::info!("removed stale temp file {}", path.display()),
                    Err(err) => log::warn!("cannot remove {}: {}", path.display(), err),
                }
            }
        }
        Ok(())
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    /// File path for a document, or None when the id cannot name a file.
    fn document_path(&self, collection: &str, id: &str) -> Option<PathBuf> {
        if !is_safe_id(id) {
            return None;
        }
        Some(
            self.collection_dir(collection)
                .join(format!("{}.{}", id, EXTENSION)),
        )
    }

    fn writable_path(&self, collection: &str, id: &str) -> Result<PathBuf, ModelError> {
        self.document_path(collection, id).ok_or_else(|| {
            ModelError::Storage(format!("id {:?} is not a valid document key", id))
        })
    }

    async fn read_document(path: &Path) -> Result<Option<Document>, ModelError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error("read", path, err)),
        }
    }

    /// Write `doc` in full to a fresh temp file next to the document `id`.
    async fn write_temp(dir: &Path, id: &str, doc: &Document) -> Result<TempFile, ModelError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = TempFile(dir.join(format!(
            ".{}.{}.{}",
            id,
            Uuid::new_v4().simple(),
            TEMP_EXTENSION
        )));

        let mut file = fs::File::create(&tmp.0)
            .await
            .map_err(|err| io_error("create", &tmp.0, err))?;
        file.write_all(&bytes)
            .await
            .map_err(|err| io_error("write", &tmp.0, err))?;
        file.sync_all()
            .await
            .map_err(|err| io_error("sync", &tmp.0, err))?;
        Ok(tmp)
    }

    async fn replace_document(
        dir: &Path,
        id: &str,
        path: &Path,
        doc: &Document,
    ) -> Result<(), ModelError> {
        let tmp = Self::write_temp(dir, id, doc).await?;
        fs::rename(&tmp.0, path)
            .await
            .map_err(|err| io_error("rename", path, err))
    }
}

/// Temp file path, removed on drop unless it was renamed away.
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("cannot remove {}: {}", self.0.display(), err),
        }
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXTENSION)
}

/// Ids become file names, so anything that could escape the collection
/// directory or collide with temp files is refused.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn io_error(action: &str, path: &Path, err: io::Error) -> ModelError {
    ModelError::Storage(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl ModelStore for FileModelStore {
    async fn ping(&self) -> Result<(), ModelError> {
        let attr = fs::metadata(&self.root).await.map_err(|err| {
            ModelError::Unavailable(format!("{}: {}", self.root.display(), err))
        })?;

        if !attr.is_dir() {
            return Err(ModelError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        if attr.permissions().readonly() {
            return Err(ModelError::Unavailable(format!(
                "{} is not writable",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn find_models<M: Model>(&self) -> Result<Vec<M>, ModelError> {
        let dir = self.collection_dir(M::COLLECTION);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error("list", &dir, err)),
        };

        let mut results = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| io_error("list", &dir, err))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Deleted between listing and reading.
            if let Some(doc) = Self::read_document(&path).await? {
                results.push(from_document(doc)?);
            }
        }

        Ok(results)
    }

    async fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ModelError> {
        let Some(path) = self.document_path(M::COLLECTION, id) else {
            return Ok(None);
        };

        match Self::read_document(&path).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn insert_model<M: Model>(&self, model: &M) -> Result<(), ModelError> {
        let path = self.writable_path(M::COLLECTION, model.id())?;
        let doc = to_document(model)?;

        let dir = self.collection_dir(M::COLLECTION);
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| io_error("create", &dir, err))?;

        // Linking never overwrites, so the filesystem enforces key uniqueness.
        let tmp = Self::write_temp(&dir, model.id(), &doc).await?;
        match fs::hard_link(&tmp.0, &path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(ModelError::duplicate(M::COLLECTION, model.id()))
            }
            Err(err) => Err(io_error("link", &path, err)),
        }
    }

    async fn merge_model<M: Model>(&self, id: &str, changes: Document) -> Result<M, ModelError> {
        let path = self
            .document_path(M::COLLECTION, id)
            .ok_or_else(|| ModelError::not_found(M::COLLECTION, id))?;

        let _guard = self.write_lock.lock().await;

        let mut doc = Self::read_document(&path)
            .await?
            .ok_or_else(|| ModelError::not_found(M::COLLECTION, id))?;
        merge_into(&mut doc, changes);

        let model: M = from_document(doc.clone())?;
        if model.id() != id {
            return Err(ModelError::Storage(format!(
                "merge would change primary key {}:{}",
                M::COLLECTION,
                id
            )));
        }

        let dir = self.collection_dir(M::COLLECTION);
        Self::replace_document(&dir, id, &path, &doc).await?;
        Ok(model)
    }

    async fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let Some(path) = self.document_path(M::COLLECTION, id) else {
            return Ok(false);
        };

        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error("delete", &path, err)),
        }
    }
}
