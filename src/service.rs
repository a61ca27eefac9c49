use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::config::TrackerConfig;
use crate::scoring::{
    CommandOutcome, MatchCommand, MatchEngine, MatchSummary, Score, SystemTimeSource, Team,
    TimeSource,
};
use crate::shared::AppError;
use crate::stats::{MatchStats, StatsAggregator};
use crate::storage::MatchRepository;

/// Live view of a match for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatus {
    pub match_id: String,
    pub set_number: u32,
    pub score: Score,
    pub sets_score: Score,
    /// Team that has met the set win condition; the set stays open until
    /// `end_set`.
    pub set_winner: Option<Team>,
    pub match_winner: Option<Team>,
    pub chrono_seconds: u64,
    pub chrono_running: bool,
    pub finished: bool,
}

struct OpenMatch {
    engine: Arc<AsyncMutex<MatchEngine>>,
    // Serializes snapshot+save so a stale write never lands after a newer one.
    persist: Arc<AsyncMutex<()>>,
}

impl OpenMatch {
    fn new(engine: MatchEngine) -> Self {
        Self {
            engine: Arc::new(AsyncMutex::new(engine)),
            persist: Arc::new(AsyncMutex::new(())),
        }
    }
}

/// Keeps one engine per open match. Commands against the same match run one
/// at a time; different matches never block each other.
pub struct MatchService {
    repository: Arc<dyn MatchRepository>,
    config: TrackerConfig,
    aggregator: StatsAggregator,
    time: Arc<dyn TimeSource>,
    matches: RwLock<HashMap<String, Arc<OpenMatch>>>,
    pending: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl MatchService {
    pub fn builder(repository: Arc<dyn MatchRepository>) -> MatchServiceBuilder {
        MatchServiceBuilder::new(repository)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Starts a fresh match with the configured rules and persists it.
    #[instrument(skip(self))]
    pub async fn create_match(&self) -> Result<MatchSummary, AppError> {
        let engine = self
            .config
            .engine_builder()
            .aggregator(self.aggregator.clone())
            .time_source(self.time.clone())
            .build();
        let summary = engine.to_snapshot();
        self.repository.save(&summary).await?;

        self.matches
            .write()
            .await
            .insert(summary.id.clone(), Arc::new(OpenMatch::new(engine)));
        info!(match_id = %summary.id, "Match created");
        Ok(summary)
    }

    /// Loads a match from the repository unless it is already open.
    #[instrument(skip(self))]
    pub async fn open_match(&self, match_id: &str) -> Result<MatchSummary, AppError> {
        if let Some(open) = self.get(match_id).await {
            return Ok(open.engine.lock().await.to_snapshot());
        }

        let summary = self
            .repository
            .load(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("match {match_id}")))?;
        let engine = self
            .config
            .engine_builder()
            .aggregator(self.aggregator.clone())
            .time_source(self.time.clone())
            .restore(summary)?;

        let mut matches = self.matches.write().await;
        // Another task may have opened it while we were loading.
        let open = matches
            .entry(match_id.to_string())
            .or_insert_with(|| Arc::new(OpenMatch::new(engine)))
            .clone();
        drop(matches);

        debug!(match_id = %match_id, "Match opened");
        let summary = open.engine.lock().await.to_snapshot();
        Ok(summary)
    }

    /// Runs one command atomically. Applied commands are persisted in the
    /// background; failures there are logged and never reach the caller.
    #[instrument(skip(self, command))]
    pub async fn apply(
        &self,
        match_id: &str,
        command: MatchCommand,
    ) -> Result<CommandOutcome, AppError> {
        let open = self.require(match_id).await?;
        let outcome = open.engine.lock().await.apply(command);

        match &outcome {
            CommandOutcome::Applied => self.spawn_persist(match_id, open).await,
            CommandOutcome::Ignored(reason) => {
                debug!(match_id = %match_id, reason = %reason, "Command ignored")
            }
        }
        Ok(outcome)
    }

    /// Persists the current state and waits for the write.
    #[instrument(skip(self))]
    pub async fn save_match(&self, match_id: &str) -> Result<MatchSummary, AppError> {
        let open = self.require(match_id).await?;
        Ok(persist(self.repository.as_ref(), &open).await?)
    }

    pub async fn summary(&self, match_id: &str) -> Result<MatchSummary, AppError> {
        let open = self.require(match_id).await?;
        let summary = open.engine.lock().await.to_snapshot();
        Ok(summary)
    }

    pub async fn stats(&self, match_id: &str) -> Result<MatchStats, AppError> {
        let open = self.require(match_id).await?;
        let stats = open.engine.lock().await.stats();
        Ok(stats)
    }

    pub async fn status(&self, match_id: &str) -> Result<MatchStatus, AppError> {
        let open = self.require(match_id).await?;
        let engine = open.engine.lock().await;
        Ok(MatchStatus {
            match_id: engine.id().to_string(),
            set_number: engine.current_set_number(),
            score: engine.score(),
            sets_score: engine.sets_score(),
            set_winner: engine.evaluation().winner,
            match_winner: engine.match_winner(),
            chrono_seconds: engine.chrono_seconds(),
            chrono_running: engine.chrono_running(),
            finished: engine.is_finished(),
        })
    }

    /// Saves and forgets an open match.
    #[instrument(skip(self))]
    pub async fn close_match(&self, match_id: &str) -> Result<MatchSummary, AppError> {
        let open = self.require(match_id).await?;
        let summary = persist(self.repository.as_ref(), &open).await?;
        self.matches.write().await.remove(match_id);
        info!(match_id = %match_id, "Match closed");
        Ok(summary)
    }

    #[instrument(skip(self))]
    pub async fn delete_match(&self, match_id: &str) -> Result<(), AppError> {
        self.matches.write().await.remove(match_id);
        // In-flight writes must land before the record goes away.
        self.flush().await;
        self.repository.delete(match_id).await?;
        info!(match_id = %match_id, "Match deleted");
        Ok(())
    }

    pub async fn list_matches(&self) -> Result<Vec<MatchSummary>, AppError> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn open_match_ids(&self) -> Vec<String> {
        self.matches.read().await.keys().cloned().collect()
    }

    /// Waits for every background write started so far.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = self.pending.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Background persistence task panicked");
            }
        }
    }

    async fn get(&self, match_id: &str) -> Option<Arc<OpenMatch>> {
        self.matches.read().await.get(match_id).cloned()
    }

    async fn require(&self, match_id: &str) -> Result<Arc<OpenMatch>, AppError> {
        self.get(match_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("match {match_id}")))
    }

    async fn spawn_persist(&self, match_id: &str, open: Arc<OpenMatch>) {
        let repository = self.repository.clone();
        let match_id = match_id.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = persist(repository.as_ref(), &open).await {
                error!(match_id = %match_id, error = %e, "Failed to persist match");
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

async fn persist(
    repository: &dyn MatchRepository,
    open: &OpenMatch,
) -> Result<MatchSummary, crate::storage::StorageError> {
    let _guard = open.persist.lock().await;
    let summary = open.engine.lock().await.to_snapshot();
    repository.save(&summary).await?;
    Ok(summary)
}

pub struct MatchServiceBuilder {
    repository: Arc<dyn MatchRepository>,
    config: TrackerConfig,
    aggregator: StatsAggregator,
    time: Arc<dyn TimeSource>,
}

impl MatchServiceBuilder {
    fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self {
            repository,
            config: TrackerConfig::default(),
            aggregator: StatsAggregator::default(),
            time: Arc::new(SystemTimeSource),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_aggregator(mut self, aggregator: StatsAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    pub fn build(self) -> MatchService {
        MatchService {
            repository: self.repository,
            config: self.config,
            aggregator: self.aggregator,
            time: self.time,
            matches: RwLock::new(HashMap::new()),
            pending: AsyncMutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ActionType, CommandRejection, ManualTimeSource, PointType};
    use crate::shared::test_utils::FailingMatchRepository;
    use crate::storage::InMemoryMatchRepository;
    use chrono::DateTime;

    fn service(repo: Arc<dyn MatchRepository>) -> MatchService {
        let time = Arc::new(ManualTimeSource::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        MatchService::builder(repo).with_time_source(time).build()
    }

    fn select(team: Team) -> MatchCommand {
        MatchCommand::SelectAction {
            team,
            point_type: PointType::Scored,
            action: ActionType::Other,
        }
    }

    fn add_point() -> MatchCommand {
        MatchCommand::AddPoint {
            x: Some(0.5),
            y: Some(0.5),
        }
    }

    #[tokio::test]
    async fn created_match_is_persisted_immediately() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let service = service(repo.clone());

        let summary = service.create_match().await.unwrap();

        assert_eq!(repo.load(&summary.id).await.unwrap(), Some(summary));
    }

    #[tokio::test]
    async fn applied_commands_reach_the_repository() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let service = service(repo.clone());
        let id = service.create_match().await.unwrap().id;

        service.apply(&id, select(Team::A)).await.unwrap();
        let outcome = service.apply(&id, add_point()).await.unwrap();
        service.flush().await;

        assert!(outcome.is_applied());
        let stored = repo.load(&id).await.unwrap().unwrap();
        assert_eq!(stored.points.len(), 1);
    }

    #[tokio::test]
    async fn rejected_commands_are_reported_not_raised() {
        let service = service(Arc::new(InMemoryMatchRepository::new()));
        let id = service.create_match().await.unwrap().id;

        let outcome = service.apply(&id, MatchCommand::Undo).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Ignored(CommandRejection::EmptyLedger));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let service = service(Arc::new(InMemoryMatchRepository::new()));
        let result = service.apply("ghost", MatchCommand::Undo).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.open_match("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn background_failures_do_not_disturb_the_engine() {
        let repo = Arc::new(FailingMatchRepository::default());
        let service = service(repo.clone());
        assert!(matches!(
            service.create_match().await,
            Err(AppError::Storage(_))
        ));

        let engine = MatchEngine::builder().id("m1").build();
        service
            .matches
            .write()
            .await
            .insert("m1".to_string(), Arc::new(OpenMatch::new(engine)));

        service.apply("m1", select(Team::B)).await.unwrap();
        let outcome = service.apply("m1", add_point()).await.unwrap();
        service.flush().await;

        assert!(outcome.is_applied());
        assert_eq!(service.status("m1").await.unwrap().score, Score::new(0, 1));
        // One failed create plus one write per applied command.
        assert_eq!(repo.attempts(), 3);
    }

    #[tokio::test]
    async fn reopening_restores_state() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let id = {
            let first = service(repo.clone());
            let id = first.create_match().await.unwrap().id;
            first.apply(&id, select(Team::A)).await.unwrap();
            first.apply(&id, add_point()).await.unwrap();
            first.close_match(&id).await.unwrap();
            assert!(first.open_match_ids().await.is_empty());
            id
        };

        let second = service(repo);
        let summary = second.open_match(&id).await.unwrap();

        assert_eq!(summary.points.len(), 1);
        assert_eq!(second.status(&id).await.unwrap().score, Score::new(1, 0));
    }

    #[tokio::test]
    async fn concurrent_commands_are_serialized() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let service = Arc::new(service(repo.clone()));
        let id = service.create_match().await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let team = if i % 2 == 0 { Team::A } else { Team::B };
                // Select and add must not interleave with another task's pair.
                let open = service.require(&id).await.unwrap();
                let mut engine = open.engine.lock().await;
                engine.apply(select(team));
                engine.apply(add_point());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let saved = service.save_match(&id).await.unwrap();
        assert_eq!(saved.points.len(), 10);
        assert_eq!(service.status(&id).await.unwrap().score, Score::new(5, 5));
        assert_eq!(repo.load(&id).await.unwrap().unwrap().points.len(), 10);
    }

    #[tokio::test]
    async fn delete_removes_open_and_stored_match() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let service = service(repo.clone());
        let id = service.create_match().await.unwrap().id;

        service.delete_match(&id).await.unwrap();

        assert!(service.summary(&id).await.is_err());
        assert!(service.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_cover_open_match() {
        let service = service(Arc::new(InMemoryMatchRepository::new()));
        let id = service.create_match().await.unwrap().id;
        service.apply(&id, select(Team::A)).await.unwrap();
        service.apply(&id, add_point()).await.unwrap();

        let stats = service.stats(&id).await.unwrap();
        assert_eq!(stats.overall.totals.a.scored, 1);
    }
}
