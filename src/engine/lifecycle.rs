//! MatchLifecycle: point-by-point play of one match with undo and early termination.

use super::{index_of, settle, Finish, ResultReport};
use crate::config::EngineConfig;
use crate::logic::{apply_point, set_majority};
use crate::models::{
    BracketMatch, EngineError, EngineResult, LiveMatch, MatchId, MatchScore, MatchStats,
    MatchStatus, PlayerId, PointEvent, PointType, Side, TennisScore,
};
use crate::notify::{NoopNotifier, Notifier};
use crate::repository::{ChangeSet, Repository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What one awarded point did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointReport {
    pub bracket_match: BracketMatch,
    pub game_won: Option<PlayerId>,
    pub set_won: Option<PlayerId>,
    /// Present when the point finished the match.
    pub result: Option<ResultReport>,
}

pub struct MatchLifecycle<R: Repository> {
    repo: Arc<R>,
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
}

impl<R: Repository> MatchLifecycle<R> {
    pub fn new(repo: Arc<R>, config: EngineConfig) -> Self {
        Self {
            repo,
            config,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Put a match in progress with `first_server` serving (player1 if not given).
    pub fn start_match(&self, match_id: MatchId, first_server: Option<PlayerId>) -> EngineResult<BracketMatch> {
        let mut m = self.playable(match_id)?;
        if m.status != MatchStatus::Pending {
            return Err(EngineError::State(format!("match {match_id} has already started")));
        }
        let server = match first_server {
            Some(id) => m.side_of(id).ok_or_else(|| {
                EngineError::Validation(format!("player {id} is not in match {match_id}"))
            })?,
            None => Side::One,
        };
        m.status = MatchStatus::InProgress;
        m.score = MatchScore::Tennis(TennisScore::new(server));
        self.repo.save_match(m)?;
        self.repo.bracket_match(match_id)
    }

    /// Award a point. When it decides the match, the match is finalized in the same commit:
    /// bracket advanced, ratings updated, tournament completion re-checked.
    pub fn award_point(&self, match_id: MatchId, winner_id: PlayerId, point_type: PointType) -> EngineResult<PointReport> {
        let mut m = self.playable(match_id)?;
        let side = m.side_of(winner_id).ok_or_else(|| {
            EngineError::Validation(format!("player {winner_id} is not in match {match_id}"))
        })?;
        let current = current_score(&m)?;
        let rules = self.config.scoring_rules();
        let outcome = apply_point(&current, &rules, side, point_type)?;
        log::debug!(
            "match {match_id}: {point_type:?} to {side:?}, score {}",
            outcome.score
        );

        let mut live = self
            .repo
            .live_match(match_id)?
            .unwrap_or_else(|| LiveMatch::new(match_id));
        live.push(
            m.score.clone(),
            PointEvent {
                point_type,
                winner_id,
                timestamp: Utc::now(),
            },
        );

        m.status = MatchStatus::InProgress;
        m.score = MatchScore::Tennis(outcome.score.clone());
        let game_won = outcome.game_won.and_then(|s| m.slot(s).player());
        let set_won = outcome.set_won.and_then(|s| m.slot(s).player());

        let Some(match_winner) = outcome.match_won else {
            self.repo.commit(ChangeSet::new().bracket_match(m).live(live))?;
            return Ok(PointReport {
                bracket_match: self.repo.bracket_match(match_id)?,
                game_won,
                set_won,
                result: None,
            });
        };

        let tournament = self.repo.tournament(m.tournament_id)?;
        let mut matches = self.repo.tournament_matches(m.tournament_id)?;
        let idx = index_of(&matches, match_id)?;
        let winner = m.slot(match_winner).player();
        let score = m.score.clone();
        matches[idx] = m;
        let mut settlement = settle(
            self.repo.as_ref(),
            &self.config,
            tournament,
            matches,
            idx,
            Finish {
                winner,
                score,
                ended_early: false,
            },
        )?;
        settlement.changes.live.push(live);
        self.repo.commit(std::mem::take(&mut settlement.changes))?;
        settlement.publish(self.notifier.as_ref());
        Ok(PointReport {
            bracket_match: self.repo.bracket_match(match_id)?,
            game_won,
            set_won,
            result: Some(settlement.report),
        })
    }

    /// Restore the score from before the most recent point. Undoing the first point of a
    /// match that was never started puts it back to pending.
    pub fn undo_last_point(&self, match_id: MatchId) -> EngineResult<BracketMatch> {
        let mut m = self.repo.bracket_match(match_id)?;
        if m.status.is_final() {
            return Err(EngineError::AlreadyFinalized(match_id));
        }
        let mut live = self
            .repo
            .live_match(match_id)?
            .ok_or(EngineError::EmptyHistory(match_id))?;
        let prior = live.pop().ok_or(EngineError::EmptyHistory(match_id))?;
        if prior == MatchScore::NotStarted {
            m.status = MatchStatus::Pending;
        }
        m.score = prior;
        self.repo.commit(ChangeSet::new().bracket_match(m).live(live))?;
        self.repo.bracket_match(match_id)
    }

    /// End a match early. Without an override the winner is whoever leads on sets;
    /// level on sets leaves the match without a winner (and without rating changes).
    pub fn force_end_match(&self, match_id: MatchId, winner_override: Option<PlayerId>) -> EngineResult<ResultReport> {
        let m = self.repo.bracket_match(match_id)?;
        if m.status.is_final() {
            return Err(EngineError::AlreadyFinalized(match_id));
        }
        if m.players().is_none() {
            return Err(EngineError::State(format!(
                "match {match_id} does not have both players yet"
            )));
        }
        let winner = match winner_override {
            Some(id) => {
                m.side_of(id).ok_or_else(|| {
                    EngineError::Validation(format!("player {id} is not in match {match_id}"))
                })?;
                Some(id)
            }
            None => match m.score.tennis() {
                Some(score) => set_majority(&m, score.sets_won(&self.config.scoring_rules())),
                None => None,
            },
        };
        log::info!("match {match_id} ended early, winner {winner:?}");

        let tournament = self.repo.tournament(m.tournament_id)?;
        let matches = self.repo.tournament_matches(m.tournament_id)?;
        let idx = index_of(&matches, match_id)?;
        let mut settlement = settle(
            self.repo.as_ref(),
            &self.config,
            tournament,
            matches,
            idx,
            Finish {
                winner,
                score: m.score.clone(),
                ended_early: true,
            },
        )?;
        self.repo.commit(std::mem::take(&mut settlement.changes))?;
        settlement.publish(self.notifier.as_ref());
        Ok(settlement.report)
    }

    /// Point log of a match (empty before the first point).
    pub fn live_match(&self, match_id: MatchId) -> EngineResult<LiveMatch> {
        self.repo.bracket_match(match_id)?;
        Ok(self
            .repo
            .live_match(match_id)?
            .unwrap_or_else(|| LiveMatch::new(match_id)))
    }

    pub fn match_stats(&self, match_id: MatchId) -> EngineResult<MatchStats> {
        let m = self.repo.bracket_match(match_id)?;
        let live = self.live_match(match_id)?;
        let Some(player1) = m.player1.player() else {
            return Ok(MatchStats::default());
        };
        Ok(MatchStats::from_points(&live.points, player1))
    }

    /// Load a match that can take points: not finished, both players known.
    fn playable(&self, match_id: MatchId) -> EngineResult<BracketMatch> {
        let m = self.repo.bracket_match(match_id)?;
        if m.status.is_final() {
            return Err(EngineError::State(format!("match {match_id} is already completed")));
        }
        if m.players().is_none() {
            return Err(EngineError::State(format!(
                "match {match_id} does not have both players yet"
            )));
        }
        Ok(m)
    }
}

fn current_score(m: &BracketMatch) -> EngineResult<TennisScore> {
    match &m.score {
        MatchScore::Tennis(score) => Ok(score.clone()),
        MatchScore::NotStarted => Ok(TennisScore::new(Side::One)),
        other => Err(EngineError::CorruptState(format!(
            "match {} carries a non-live score ({other})",
            m.id
        ))),
    }
}
