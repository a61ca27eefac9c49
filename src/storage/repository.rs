use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::StorageError;
use crate::scoring::MatchSummary;

/// Persistence collaborator. Implementations are interchangeable; the engine
/// only ever sees `MatchSummary` values.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn load(&self, match_id: &str) -> Result<Option<MatchSummary>, StorageError>;
    async fn save(&self, summary: &MatchSummary) -> Result<(), StorageError>;
    async fn delete(&self, match_id: &str) -> Result<(), StorageError>;
    /// Most recently updated first.
    async fn list_all(&self) -> Result<Vec<MatchSummary>, StorageError>;

    /// Stores or clears the share token of a stored match. `save` never
    /// changes the token of a match that already exists.
    async fn set_share_token(
        &self,
        match_id: &str,
        token: Option<&str>,
    ) -> Result<(), StorageError>;

    async fn find_by_share_token(
        &self,
        token: &str,
    ) -> Result<Option<MatchSummary>, StorageError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|summary| summary.share_token.as_deref() == Some(token)))
    }
}

pub(crate) fn newest_first(matches: &mut [MatchSummary]) {
    matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// The summary as it should be stored over `stored`: everything from the
/// incoming summary except the share token.
pub(crate) fn keep_share_token(
    summary: &MatchSummary,
    stored: Option<&MatchSummary>,
) -> MatchSummary {
    let mut summary = summary.clone();
    if let Some(stored) = stored {
        summary.share_token = stored.share_token.clone();
    }
    summary
}

/// In-memory implementation of MatchRepository for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryMatchRepository {
    matches: Arc<RwLock<HashMap<String, MatchSummary>>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self {
            matches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    #[instrument(skip(self))]
    async fn load(&self, match_id: &str) -> Result<Option<MatchSummary>, StorageError> {
        let matches = self.matches.read().await;
        let found = matches.get(match_id).cloned();
        debug!(match_id = %match_id, found = found.is_some(), "Loaded match from memory");
        Ok(found)
    }

    #[instrument(skip(self, summary))]
    async fn save(&self, summary: &MatchSummary) -> Result<(), StorageError> {
        summary.validate()?;
        let mut matches = self.matches.write().await;
        let stored = keep_share_token(summary, matches.get(&summary.id));
        matches.insert(summary.id.clone(), stored);
        debug!(match_id = %summary.id, "Saved match in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, match_id: &str) -> Result<(), StorageError> {
        let mut matches = self.matches.write().await;
        if matches.remove(match_id).is_none() {
            warn!(match_id = %match_id, "Match not found for deletion in memory");
            return Err(StorageError::NotFound(format!("match {match_id}")));
        }
        debug!(match_id = %match_id, "Deleted match from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<MatchSummary>, StorageError> {
        let matches = self.matches.read().await;
        let mut all: Vec<MatchSummary> = matches.values().cloned().collect();
        newest_first(&mut all);
        Ok(all)
    }

    #[instrument(skip(self))]
    async fn set_share_token(
        &self,
        match_id: &str,
        token: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut matches = self.matches.write().await;
        let summary = matches
            .get_mut(match_id)
            .ok_or_else(|| StorageError::NotFound(format!("match {match_id}")))?;
        summary.share_token = token.map(str::to_string);
        debug!(match_id = %match_id, shared = token.is_some(), "Updated share token in memory");
        Ok(())
    }
}
