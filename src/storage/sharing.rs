use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::{MatchRepository, StorageError};
use crate::scoring::MatchSummary;

/// Trait for generating share tokens
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// Pet name-based token generator, e.g. `brave-otter-4821`
pub struct PetNameTokenGenerator;

impl PetNameTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PetNameTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenGenerator for PetNameTokenGenerator {
    async fn generate(&self) -> String {
        let words = petname::Petnames::default().generate_one(2, "-");
        let suffix: u32 = rand::rng().random_range(1000..10000);
        format!("{words}-{suffix}")
    }
}

/// Hands out read-only tokens for matches. The token is stored with the
/// match, so sharing the same match twice returns the same token from any
/// service built on the same repository.
pub struct ShareService {
    repository: Arc<dyn MatchRepository>,
    generator: Arc<dyn TokenGenerator>,
    // Serializes token allocation so two matches never get the same token.
    issuing: Mutex<()>,
}

impl ShareService {
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self::with_generator(repository, Arc::new(PetNameTokenGenerator::new()))
    }

    pub fn with_generator(
        repository: Arc<dyn MatchRepository>,
        generator: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            repository,
            generator,
            issuing: Mutex::new(()),
        }
    }

    #[instrument(skip(self))]
    pub async fn share(&self, match_id: &str) -> Result<String, StorageError> {
        let _guard = self.issuing.lock().await;
        let summary = self
            .repository
            .load(match_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("match {match_id}")))?;

        if let Some(token) = summary.share_token {
            debug!(match_id = %match_id, "Reusing existing share token");
            return Ok(token);
        }

        let mut token = self.generator.generate().await;
        while self.repository.find_by_share_token(&token).await?.is_some() {
            token = self.generator.generate().await;
        }
        self.repository
            .set_share_token(match_id, Some(&token))
            .await?;
        info!(match_id = %match_id, token = %token, "Shared match");
        Ok(token)
    }

    /// Current state of the shared match, or `None` for unknown or revoked
    /// tokens and for matches that have since been deleted.
    #[instrument(skip(self))]
    pub async fn resolve(&self, token: &str) -> Result<Option<MatchSummary>, StorageError> {
        self.repository.find_by_share_token(token).await
    }

    /// Clears the match's token. Returns whether it had one.
    #[instrument(skip(self))]
    pub async fn revoke(&self, match_id: &str) -> Result<bool, StorageError> {
        let shared = match self.repository.load(match_id).await? {
            Some(summary) => summary.share_token.is_some(),
            None => return Ok(false),
        };
        if shared {
            self.repository.set_share_token(match_id, None).await?;
        }
        debug!(match_id = %match_id, removed = shared, "Revoked share token");
        Ok(shared)
    }
}
