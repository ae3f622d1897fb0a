//! File-based Session Repository
//!
//! Stores each session as a YAML document at `<base_path>/<session_id>.yaml`.
//! Writes go to a temporary sibling and are renamed into place, so a reader
//! never sees a half-written file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionUpdate};
use crate::ports::{RepositoryError, SessionRepository};

/// YAML-file session store
#[derive(Debug)]
pub struct FileSessionRepository {
    base_path: PathBuf,
    // Serializes read-modify-write cycles across all sessions.
    write_lock: Mutex<()>,
}

impl FileSessionRepository {
    /// Create a store rooted at `base_path`. The directory is created lazily.
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileSessionRepository::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    async fn read(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let path = self.session_path(id);
        let yaml = match fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepositoryError::Unavailable(e.to_string())),
        };

        serde_yaml::from_str(&yaml)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn write(&self, session: &Session) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        let yaml = serde_yaml::to_string(session)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let path = self.session_path(session.session_id());
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        self.read(id).await
    }

    async fn insert(&self, session: &Session) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        if self.read(session.session_id()).await?.is_some() {
            return Err(RepositoryError::AlreadyExists(*session.session_id()));
        }
        self.write(session).await
    }

    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
        upsert: bool,
    ) -> Result<Session, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut session = match self.read(id).await? {
            Some(session) => session,
            None if upsert => Session::new(*id),
            None => return Err(RepositoryError::NotFound(*id)),
        };
        session.apply(update);
        self.write(&session).await?;
        Ok(session)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
