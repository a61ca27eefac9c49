use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::repository::{keep_share_token, newest_first, MatchRepository};
use super::StorageError;
use crate::scoring::MatchSummary;

/// Keeps every match in a single JSON array on disk. Reads and writes are
/// serialized through one lock so concurrent saves never interleave.
#[derive(Debug)]
pub struct FileMatchRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMatchRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<MatchSummary>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        let mut matches = Vec::with_capacity(documents.len());
        for document in documents {
            let parsed = serde_json::from_value::<MatchSummary>(document)
                .map_err(StorageError::from)
                .and_then(|summary| {
                    summary.validate()?;
                    Ok(summary)
                });
            match parsed {
                Ok(summary) => matches.push(summary),
                Err(e) => warn!(path = %self.path.display(), error = %e, "Skipping unreadable match"),
            }
        }
        Ok(matches)
    }

    async fn write_all(&self, matches: &[MatchSummary]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(matches)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for FileMatchRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self, match_id: &str) -> Result<Option<MatchSummary>, StorageError> {
        let _guard = self.lock.lock().await;
        let found = self
            .read_all()
            .await?
            .into_iter()
            .find(|summary| summary.id == match_id);
        debug!(match_id = %match_id, found = found.is_some(), "Loaded match from file");
        Ok(found)
    }

    #[instrument(skip(self, summary), fields(path = %self.path.display()))]
    async fn save(&self, summary: &MatchSummary) -> Result<(), StorageError> {
        summary.validate()?;
        let _guard = self.lock.lock().await;
        let mut matches = self.read_all().await?;
        match matches.iter_mut().find(|m| m.id == summary.id) {
            Some(existing) => *existing = keep_share_token(summary, Some(existing)),
            None => matches.push(summary.clone()),
        }
        self.write_all(&matches).await?;
        debug!(match_id = %summary.id, total = matches.len(), "Saved match to file");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn delete(&self, match_id: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut matches = self.read_all().await?;
        let before = matches.len();
        matches.retain(|m| m.id != match_id);
        if matches.len() == before {
            warn!(match_id = %match_id, "Match not found for deletion in file");
            return Err(StorageError::NotFound(format!("match {match_id}")));
        }
        self.write_all(&matches).await?;
        debug!(match_id = %match_id, "Deleted match from file");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn list_all(&self) -> Result<Vec<MatchSummary>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut matches = self.read_all().await?;
        newest_first(&mut matches);
        Ok(matches)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn set_share_token(
        &self,
        match_id: &str,
        token: Option<&str>,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut matches = self.read_all().await?;
        let summary = matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| StorageError::NotFound(format!("match {match_id}")))?;
        summary.share_token = token.map(str::to_string);
        self.write_all(&matches).await?;
        debug!(match_id = %match_id, shared = token.is_some(), "Updated share token in file");
        Ok(())
    }
}
