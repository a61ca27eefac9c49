use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, info};
use uuid::Uuid;

use super::clock::{ClockState, MatchClock, SystemTimeSource, TimeSource};
use super::command::{CommandOutcome, MatchCommand};
use super::errors::{CommandRejection, SnapshotError};
use super::evaluator::{evaluate, sets_won, SetEvaluation};
use super::ledger::{PointLedger, SelectionCursor};
use super::rules::{ActionPolicy, ScoringRules, SideSwapPolicy, Sport};
use super::snapshot::MatchSummary;
use super::types::{
    ActionType, CourtPosition, Player, Point, PointType, Score, SetData, Team, TeamNames,
};
use crate::stats::{MatchStats, SetStats, StatsAggregator};

/// Owns the state of one match and is its only mutator. Every command runs
/// to completion before the next; callers sharing an engine across tasks
/// wrap it in a mutex (see `MatchService`).
pub struct MatchEngine {
    id: String,
    sport: Sport,
    rules: ScoringRules,
    policy: ActionPolicy,
    side_swap: SideSwapPolicy,
    team_names: TeamNames,
    players: Vec<Player>,
    completed_sets: Vec<SetData>,
    current_set_number: u32,
    ledger: PointLedger,
    cursor: SelectionCursor,
    sides_swapped: bool,
    clock: MatchClock,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished: bool,
    aggregator: StatsAggregator,
    time: Arc<dyn TimeSource>,
}

impl fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchEngine")
            .field("id", &self.id)
            .field("current_set_number", &self.current_set_number)
            .field("score", &self.score())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    pub fn builder() -> MatchEngineBuilder {
        MatchEngineBuilder::new()
    }

    // ------------------------------------------------------------------
    // Selection cursor
    // ------------------------------------------------------------------

    /// Stages team, point type and action in one go. Actions listed in the
    /// policy table override the requested point type.
    pub fn select_action(&mut self, team: Team, point_type: PointType, action: ActionType) {
        self.cursor.stage(team, point_type, action, &self.policy);
    }

    pub fn select_team(&mut self, team: Team) {
        self.cursor.team = Some(team);
    }

    pub fn select_point_type(&mut self, point_type: PointType) {
        self.cursor.point_type = Some(point_type);
    }

    pub fn select_action_type(&mut self, action: ActionType) {
        self.cursor.set_action(action, &self.policy);
    }

    pub fn select_player(&mut self, player_id: Option<String>) -> Result<(), CommandRejection> {
        if let Some(id) = &player_id {
            if !self.players.iter().any(|p| &p.id == id) {
                return Err(CommandRejection::UnknownPlayer);
            }
        }
        self.cursor.player_id = player_id;
        Ok(())
    }

    pub fn cancel_selection(&mut self) {
        self.cursor.clear();
    }

    // ------------------------------------------------------------------
    // Point ledger
    // ------------------------------------------------------------------

    /// Commits the staged selection as a point of the current set.
    pub fn add_point(
        &mut self,
        position: Option<CourtPosition>,
    ) -> Result<&Point, CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        let staged = self
            .cursor
            .staged(&self.policy)
            .ok_or(CommandRejection::IncompleteSelection)?;

        match position {
            Some(p) if !p.is_valid() => return Err(CommandRejection::InvalidPosition),
            None if staged.point_type == PointType::Scored => {
                return Err(CommandRejection::MissingPosition)
            }
            _ => {}
        }

        let now = self.time.now();
        let point = Point {
            id: Uuid::new_v4().to_string(),
            team: staged.team,
            point_type: staged.point_type,
            action: staged.action,
            position,
            timestamp: self.ledger.next_timestamp(now.timestamp_millis()),
            player_id: staged.player_id,
            point_value: None,
        };

        debug!(
            match_id = %self.id,
            set = self.current_set_number,
            team = %point.team,
            point_type = %point.point_type,
            action = %point.action,
            "Point recorded"
        );

        self.cursor.clear();
        self.touch(now);
        Ok(self.ledger.append(point))
    }

    pub fn add_point_at(&mut self, x: f64, y: f64) -> Result<&Point, CommandRejection> {
        let position = CourtPosition::new(x, y).ok_or(CommandRejection::InvalidPosition)?;
        self.add_point(Some(position))
    }

    /// Removes the last point of the current set. Completed sets are never
    /// reopened.
    pub fn undo(&mut self) -> Result<Point, CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        let point = self.ledger.pop().ok_or(CommandRejection::EmptyLedger)?;
        debug!(match_id = %self.id, point_id = %point.id, "Point undone");
        self.touch(self.time.now());
        Ok(point)
    }

    // ------------------------------------------------------------------
    // Sets and match lifecycle
    // ------------------------------------------------------------------

    /// Freezes the current set whatever its score and opens the next one.
    pub fn end_set(&mut self) -> Result<&SetData, CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        let now = self.time.now();
        let evaluation = self.evaluation();
        let set = SetData {
            id: Uuid::new_v4().to_string(),
            number: self.current_set_number,
            points: self.ledger.take(),
            score: evaluation.score,
            winner: evaluation.winner,
            duration: self.clock.lap_seconds(now),
        };

        info!(
            match_id = %self.id,
            set = set.number,
            score = %set.score,
            winner = ?set.winner,
            duration = set.duration,
            "Set completed"
        );

        self.completed_sets.push(set);
        self.current_set_number += 1;
        self.clock.start_lap(now);
        self.cursor.clear();
        self.touch(now);

        let index = self.completed_sets.len() - 1;
        Ok(&self.completed_sets[index])
    }

    /// Closes the match: a set holding points is completed first and the
    /// clock stops for good.
    pub fn finish_match(&mut self) -> Result<(), CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        if !self.ledger.is_empty() {
            self.end_set()?;
        }
        let now = self.time.now();
        self.clock.stop(now);
        self.cursor.clear();
        self.finished = true;
        self.touch(now);
        info!(match_id = %self.id, sets = %self.sets_score(), "Match finished");
        Ok(())
    }

    /// Back to set 1 with an empty history. Team names, roster and match id
    /// are kept.
    pub fn reset_match(&mut self) {
        self.completed_sets.clear();
        self.current_set_number = 1;
        self.ledger = PointLedger::default();
        self.cursor.clear();
        self.sides_swapped = false;
        self.clock = MatchClock::new();
        self.finished = false;
        self.touch(self.time.now());
        info!(match_id = %self.id, "Match reset");
    }

    /// Toggles court sides. Scores and ledger are untouched.
    pub fn switch_sides(&mut self) -> Result<bool, CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        if self.side_swap == SideSwapPolicy::BetweenSets && !self.ledger.is_empty() {
            return Err(CommandRejection::SetInProgress);
        }
        self.sides_swapped = !self.sides_swapped;
        self.touch(self.time.now());
        Ok(self.sides_swapped)
    }

    /// Renames the teams. Blank names keep the current one.
    pub fn set_team_names(&mut self, a: &str, b: &str) {
        if !a.trim().is_empty() {
            self.team_names.a = a.trim().to_string();
        }
        if !b.trim().is_empty() {
            self.team_names.b = b.trim().to_string();
        }
        self.touch(self.time.now());
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    pub fn start_chrono(&mut self) -> Result<(), CommandRejection> {
        if self.finished {
            return Err(CommandRejection::MatchFinished);
        }
        let now = self.time.now();
        if !self.clock.start(now) {
            return Err(CommandRejection::ClockUnchanged);
        }
        self.touch(now);
        Ok(())
    }

    pub fn pause_chrono(&mut self) -> Result<(), CommandRejection> {
        let now = self.time.now();
        if !self.clock.pause(now) {
            return Err(CommandRejection::ClockUnchanged);
        }
        self.touch(now);
        Ok(())
    }

    pub fn chrono_seconds(&self) -> u64 {
        self.clock.seconds(self.time.now())
    }

    pub fn chrono_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    /// Seconds the current set has been on the clock.
    pub fn set_seconds(&self) -> u64 {
        self.clock.lap_seconds(self.time.now())
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn add_player(
        &mut self,
        name: &str,
        team: Team,
        number: Option<u8>,
    ) -> Result<&Player, CommandRejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CommandRejection::EmptyName);
        }
        self.players.push(Player {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            team,
            number,
        });
        self.touch(self.time.now());
        let index = self.players.len() - 1;
        Ok(&self.players[index])
    }

    /// Players referenced by a recorded point cannot be removed.
    pub fn remove_player(&mut self, player_id: &str) -> Result<Player, CommandRejection> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(CommandRejection::UnknownPlayer)?;
        if self
            .all_points()
            .any(|p| p.player_id.as_deref() == Some(player_id))
        {
            return Err(CommandRejection::PlayerHasPoints);
        }
        if self.cursor.player_id.as_deref() == Some(player_id) {
            self.cursor.player_id = None;
        }
        self.touch(self.time.now());
        Ok(self.players.remove(index))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn apply(&mut self, command: MatchCommand) -> CommandOutcome {
        match command {
            MatchCommand::SelectAction {
                team,
                point_type,
                action,
            } => {
                self.select_action(team, point_type, action);
                CommandOutcome::Applied
            }
            MatchCommand::SelectTeam { team } => {
                self.select_team(team);
                CommandOutcome::Applied
            }
            MatchCommand::SelectPointType { point_type } => {
                self.select_point_type(point_type);
                CommandOutcome::Applied
            }
            MatchCommand::SelectActionType { action } => {
                self.select_action_type(action);
                CommandOutcome::Applied
            }
            MatchCommand::SelectPlayer { player_id } => self.select_player(player_id).into(),
            MatchCommand::CancelSelection => {
                self.cancel_selection();
                CommandOutcome::Applied
            }
            MatchCommand::AddPoint { x, y } => match (x, y) {
                (Some(x), Some(y)) => self.add_point_at(x, y).into(),
                (None, None) => self.add_point(None).into(),
                _ => CommandOutcome::Ignored(CommandRejection::InvalidPosition),
            },
            MatchCommand::Undo => self.undo().into(),
            MatchCommand::EndSet => self.end_set().into(),
            MatchCommand::ResetMatch => {
                self.reset_match();
                CommandOutcome::Applied
            }
            MatchCommand::SwitchSides => self.switch_sides().into(),
            MatchCommand::SetTeamNames { a, b } => {
                self.set_team_names(&a, &b);
                CommandOutcome::Applied
            }
            MatchCommand::StartChrono => self.start_chrono().into(),
            MatchCommand::PauseChrono => self.pause_chrono().into(),
            MatchCommand::FinishMatch => self.finish_match().into(),
            MatchCommand::AddPlayer { name, team, number } => {
                self.add_player(&name, team, number).into()
            }
            MatchCommand::RemovePlayer { player_id } => self.remove_player(&player_id).into(),
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn team_names(&self) -> &TeamNames {
        &self.team_names
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn cursor(&self) -> &SelectionCursor {
        &self.cursor
    }

    /// Points of the current set.
    pub fn points(&self) -> &[Point] {
        self.ledger.points()
    }

    /// Every point of the match, oldest set first.
    pub fn all_points(&self) -> impl Iterator<Item = &Point> {
        self.completed_sets
            .iter()
            .flat_map(|set| set.points.iter())
            .chain(self.ledger.points().iter())
    }

    pub fn completed_sets(&self) -> &[SetData] {
        &self.completed_sets
    }

    pub fn current_set_number(&self) -> u32 {
        self.current_set_number
    }

    pub fn sides_swapped(&self) -> bool {
        self.sides_swapped
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn score(&self) -> Score {
        self.ledger.score()
    }

    /// Score of the current set and the team that has already met the win
    /// condition, if any. The set is never closed automatically.
    pub fn evaluation(&self) -> SetEvaluation {
        evaluate(
            self.ledger.points(),
            self.rules.target_for_set(self.current_set_number),
            self.rules.margin(),
        )
    }

    /// Sets won by each team.
    pub fn sets_score(&self) -> Score {
        sets_won(&self.completed_sets)
    }

    pub fn match_winner(&self) -> Option<Team> {
        let sets = self.sets_score();
        Team::iter().find(|team| *sets.get(*team) >= self.rules.sets_to_win)
    }

    pub fn stats(&self) -> MatchStats {
        self.aggregator.aggregate(
            &self.completed_sets,
            self.ledger.points(),
            self.current_set_number,
        )
    }

    pub fn set_stats(&self, number: u32) -> Option<SetStats> {
        self.stats().sets.into_iter().find(|set| set.number == number)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn to_snapshot(&self) -> MatchSummary {
        let now = self.time.now();
        MatchSummary {
            id: self.id.clone(),
            sport: self.sport,
            rules: Some(self.rules),
            team_names: self.team_names.clone(),
            completed_sets: self.completed_sets.clone(),
            current_set_number: self.current_set_number,
            points: self.ledger.points().to_vec(),
            sides_swapped: self.sides_swapped,
            chrono_seconds: self.clock.seconds(now),
            current_set_started_at: Some(self.clock.lap_started_at()),
            created_at: self.created_at,
            updated_at: self.updated_at,
            finished: self.finished,
            players: self.players.clone(),
            share_token: None,
        }
    }

    /// Replaces all working state with the snapshot. A snapshot that fails
    /// validation leaves the engine untouched.
    pub fn load_snapshot(&mut self, summary: MatchSummary) -> Result<(), SnapshotError> {
        summary.validate()?;

        self.rules = summary.effective_rules();
        self.clock = MatchClock::restore(
            summary.chrono_seconds,
            summary.set_started_at(),
            summary.finished,
        );
        self.id = summary.id;
        self.sport = summary.sport;
        self.team_names = summary.team_names;
        self.players = summary.players;
        self.completed_sets = summary.completed_sets;
        self.current_set_number = summary.current_set_number;
        self.ledger = PointLedger::from_points(summary.points);
        self.cursor.clear();
        self.sides_swapped = summary.sides_swapped;
        self.created_at = summary.created_at;
        self.updated_at = summary.updated_at;
        self.finished = summary.finished;

        debug!(match_id = %self.id, set = self.current_set_number, "Snapshot loaded");
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.updated_at.max(now);
    }
}

pub struct MatchEngineBuilder {
    id: Option<String>,
    sport: Sport,
    rules: Option<ScoringRules>,
    policy: ActionPolicy,
    side_swap: SideSwapPolicy,
    team_names: TeamNames,
    aggregator: StatsAggregator,
    time: Arc<dyn TimeSource>,
}

impl Default for MatchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngineBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            sport: Sport::default(),
            rules: None,
            policy: ActionPolicy::default(),
            side_swap: SideSwapPolicy::default(),
            team_names: TeamNames::with_defaults(),
            aggregator: StatsAggregator::default(),
            time: Arc::new(SystemTimeSource),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sport(mut self, sport: Sport) -> Self {
        self.sport = sport;
        self
    }

    /// Overrides the sport's default rules.
    pub fn rules(mut self, rules: ScoringRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn action_policy(mut self, policy: ActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn side_swap(mut self, side_swap: SideSwapPolicy) -> Self {
        self.side_swap = side_swap;
        self
    }

    pub fn team_names(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.team_names = TeamNames::new(a.into(), b.into());
        self
    }

    pub fn aggregator(mut self, aggregator: StatsAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    pub fn build(self) -> MatchEngine {
        let now = self.time.now();
        MatchEngine {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            sport: self.sport,
            rules: self.rules.unwrap_or_else(|| self.sport.default_rules()),
            policy: self.policy,
            side_swap: self.side_swap,
            team_names: self.team_names,
            players: Vec::new(),
            completed_sets: Vec::new(),
            current_set_number: 1,
            ledger: PointLedger::default(),
            cursor: SelectionCursor::default(),
            sides_swapped: false,
            clock: MatchClock::new(),
            created_at: now,
            updated_at: now,
            finished: false,
            aggregator: self.aggregator,
            time: self.time,
        }
    }

    /// Builds an engine resumed from a persisted snapshot. Sport and rules
    /// come from the snapshot, not from the builder.
    pub fn restore(self, summary: MatchSummary) -> Result<MatchEngine, SnapshotError> {
        let sport = summary.sport;
        let mut engine = self.sport(sport).build();
        engine.load_snapshot(summary)?;
        Ok(engine)
    }
}
