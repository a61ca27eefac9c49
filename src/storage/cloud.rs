use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::repository::{keep_share_token, newest_first, MatchRepository};
use super::StorageError;
use crate::scoring::{MatchSummary, Sport};

/// One row of the shared match table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudMatchRecord {
    pub id: String,
    pub user_id: String,
    pub match_data: MatchSummary,
    pub finished: bool,
    pub sport: Sport,
    pub updated_at: DateTime<Utc>,
}

impl CloudMatchRecord {
    pub fn new(user_id: impl Into<String>, summary: MatchSummary) -> Self {
        Self {
            id: summary.id.clone(),
            user_id: user_id.into(),
            finished: summary.finished,
            sport: summary.sport,
            updated_at: summary.updated_at,
            match_data: summary,
        }
    }
}

/// Backing table shared by every user's repository handle.
#[derive(Debug, Clone, Default)]
pub struct CloudStore {
    records: Arc<RwLock<HashMap<String, CloudMatchRecord>>>,
}

impl CloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(&self, user_id: impl Into<String>) -> CloudMatchRepository {
        CloudMatchRepository {
            store: self.clone(),
            user_id: user_id.into(),
        }
    }

    pub async fn record(&self, match_id: &str) -> Option<CloudMatchRecord> {
        self.records.read().await.get(match_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// User-scoped view over a [`CloudStore`]. Rows owned by other users are
/// invisible to reads and refused on writes.
#[derive(Debug, Clone)]
pub struct CloudMatchRepository {
    store: CloudStore,
    user_id: String,
}

impl CloudMatchRepository {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Inserts unless a row with the same id already exists. Returns whether
    /// a row was written.
    #[instrument(skip(self, summary), fields(user_id = %self.user_id, match_id = %summary.id))]
    pub async fn insert_if_absent(&self, summary: &MatchSummary) -> Result<bool, StorageError> {
        summary.validate()?;
        let mut records = self.store.records.write().await;
        if records.contains_key(&summary.id) {
            debug!("Match already in cloud, skipping");
            return Ok(false);
        }
        records.insert(
            summary.id.clone(),
            CloudMatchRecord::new(self.user_id.clone(), summary.clone()),
        );
        debug!("Inserted match into cloud");
        Ok(true)
    }
}

#[async_trait]
impl MatchRepository for CloudMatchRepository {
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn load(&self, match_id: &str) -> Result<Option<MatchSummary>, StorageError> {
        let records = self.store.records.read().await;
        Ok(records
            .get(match_id)
            .filter(|record| record.user_id == self.user_id)
            .map(|record| record.match_data.clone()))
    }

    #[instrument(skip(self, summary), fields(user_id = %self.user_id, match_id = %summary.id))]
    async fn save(&self, summary: &MatchSummary) -> Result<(), StorageError> {
        summary.validate()?;
        let mut records = self.store.records.write().await;
        let existing = records.get(&summary.id);
        if let Some(existing) = existing {
            if existing.user_id != self.user_id {
                warn!(owner = %existing.user_id, "Refusing to overwrite another user's match");
                return Err(StorageError::Forbidden(format!("match {}", summary.id)));
            }
        }
        let stored = keep_share_token(summary, existing.map(|record| &record.match_data));
        records.insert(
            summary.id.clone(),
            CloudMatchRecord::new(self.user_id.clone(), stored),
        );
        debug!("Upserted match in cloud");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn delete(&self, match_id: &str) -> Result<(), StorageError> {
        let mut records = self.store.records.write().await;
        match records.get(match_id) {
            None => Err(StorageError::NotFound(format!("match {match_id}"))),
            Some(record) if record.user_id != self.user_id => {
                Err(StorageError::Forbidden(format!("match {match_id}")))
            }
            Some(_) => {
                records.remove(match_id);
                debug!(match_id = %match_id, "Deleted match from cloud");
                Ok(())
            }
        }
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn list_all(&self) -> Result<Vec<MatchSummary>, StorageError> {
        let records = self.store.records.read().await;
        let mut matches: Vec<MatchSummary> = records
            .values()
            .filter(|record| record.user_id == self.user_id)
            .map(|record| record.match_data.clone())
            .collect();
        newest_first(&mut matches);
        Ok(matches)
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn set_share_token(
        &self,
        match_id: &str,
        token: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut records = self.store.records.write().await;
        match records.get_mut(match_id) {
            None => Err(StorageError::NotFound(format!("match {match_id}"))),
            Some(record) if record.user_id != self.user_id => {
                Err(StorageError::Forbidden(format!("match {match_id}")))
            }
            Some(record) => {
                record.match_data.share_token = token.map(str::to_string);
                debug!(match_id = %match_id, shared = token.is_some(), "Updated share token in cloud");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Pushes every local match to the cloud without overwriting rows that are
/// already there, then clears the local copies. Local data is left untouched
/// if any cloud write fails.
#[instrument(skip(local, cloud), fields(user_id = %cloud.user_id()))]
pub async fn sync_local_matches_to_cloud(
    local: &dyn MatchRepository,
    cloud: &CloudMatchRepository,
) -> Result<SyncReport, StorageError> {
    let matches = local.list_all().await?;
    let mut report = SyncReport::default();

    for summary in &matches {
        if cloud.insert_if_absent(summary).await? {
            report.inserted += 1;
        } else {
            report.skipped += 1;
        }
    }

    for summary in &matches {
        local.delete(&summary.id).await?;
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Synced local matches to cloud"
    );
    Ok(report)
}
