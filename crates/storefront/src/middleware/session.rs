//! Session middleware configuration.
//!
//! The session only carries the visitor id; everything else a visitor owns
//! lives in its own store. With the file backend, session records are kept
//! as JSON files next to the visitor stores so a browser keeps its visitor
//! across restarts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{debug, warn};
use uuid::Uuid;

use super::visitor::VISITOR_ID_KEY;
use crate::config::StorefrontConfig;
use crate::storage::StorageBackend;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gallery_session";

/// Directory under the data directory holding session records.
pub const SESSIONS_DIR: &str = "sessions";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    store: VisitorSessionStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<VisitorSessionStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Session store matching a [`StorageBackend`].
#[derive(Debug, Clone)]
pub enum VisitorSessionStore {
    /// Sessions end with the process.
    Memory(MemoryStore),
    /// Sessions survive restarts.
    Files(FileSessionStore),
}

impl VisitorSessionStore {
    /// The store for `backend`: in memory, or files under `<dir>/sessions`.
    #[must_use]
    pub fn for_backend(backend: &StorageBackend) -> Self {
        match backend {
            StorageBackend::Memory => Self::Memory(MemoryStore::default()),
            StorageBackend::Files(dir) => Self::Files(FileSessionStore::new(dir.join(SESSIONS_DIR))),
        }
    }

    /// Delete expired session records and return the visitors they pointed to.
    ///
    /// In-memory sessions are never swept, so the list is empty for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be listed.
    pub async fn delete_expired(&self) -> session_store::Result<Vec<Uuid>> {
        match self {
            Self::Memory(_) => Ok(Vec::new()),
            Self::Files(store) => store.delete_expired().await,
        }
    }
}

#[async_trait]
impl SessionStore for VisitorSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            Self::Memory(store) => store.create(record).await,
            Self::Files(store) => store.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            Self::Memory(store) => store.save(record).await,
            Self::Files(store) => store.save(record).await,
        }
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            Self::Memory(store) => store.load(session_id).await,
            Self::Files(store) => store.load(session_id).await,
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        match self {
            Self::Memory(store) => store.delete(session_id).await,
            Self::Files(store) => store.delete(session_id).await,
        }
    }
}

/// Session records stored as `<dir>/<session id>.json`.
///
/// Records are written via a temporary file and rename. Expired records
/// load as absent.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &Id) -> PathBuf {
        // Ids render as URL-safe base64, which is a valid file name.
        self.dir.join(format!("{id}.json"))
    }

    async fn read_record(path: &Path) -> session_store::Result<Option<Record>> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(backend_error(&e)),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| session_store::Error::Decode(e.to_string()))
    }

    async fn remove(path: &Path) -> session_store::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend_error(&e)),
        }
    }

    /// Delete expired records and return the visitor ids they carried.
    ///
    /// Unreadable records are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub async fn delete_expired(&self) -> session_store::Result<Vec<Uuid>> {
        let mut listing = match tokio::fs::read_dir(&self.dir).await {
            Ok(listing) => listing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(backend_error(&e)),
        };

        let now = OffsetDateTime::now_utc();
        let mut visitors = Vec::new();
        while let Some(entry) = listing.next_entry().await.map_err(|e| backend_error(&e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let record = match Self::read_record(&path).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable session record");
                    continue;
                }
            };
            if record.expiry_date > now {
                continue;
            }

            Self::remove(&path).await?;
            if let Some(id) = record
                .data
                .get(VISITOR_ID_KEY)
                .and_then(|value| serde_json::from_value::<Uuid>(value.clone()).ok())
            {
                visitors.push(id);
            }
        }

        debug!(expired = visitors.len(), "swept session records");
        Ok(visitors)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while tokio::fs::try_exists(self.record_path(&record.id))
            .await
            .map_err(|e| backend_error(&e))?
        {
            record.id = Id::default();
        }
        self.save(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let content =
            serde_json::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| backend_error(&e))?;

        let path = self.record_path(&record.id);
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", record.id, Uuid::new_v4().simple()));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&content).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(backend_error(&e));
        }
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let path = self.record_path(session_id);
        let Some(record) = Self::read_record(&path).await? else {
            return Ok(None);
        };
        if record.expiry_date <= OffsetDateTime::now_utc() {
            Self::remove(&path).await?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        Self::remove(&self.record_path(session_id)).await
    }
}

fn backend_error(err: &std::io::Error) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}
