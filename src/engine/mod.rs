//! Engines over an injected repository: tournament administration and live match scoring.
//!
//! Each operation loads what it needs, computes the new state with the pure functions in
//! [`crate::logic`], and writes everything in a single [`ChangeSet`]. A failure before the
//! commit leaves storage untouched.

mod lifecycle;
mod tournament;

pub use lifecycle::{MatchLifecycle, PointReport};
pub use tournament::TournamentEngine;

use crate::config::EngineConfig;
use crate::logic::{advance_winner, check_completion, rating, Completion, RatingChange};
use crate::models::{
    BracketMatch, EngineError, EngineResult, MatchId, MatchScore, MatchStatus, PlayerId,
    Tournament, TournamentStatus,
};
use crate::notify::{MatchCompleted, Notifier, TournamentCompleted};
use crate::repository::{ChangeSet, Repository};
use serde::{Deserialize, Serialize};

/// What finishing a match did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    pub match_id: MatchId,
    pub winner: Option<PlayerId>,
    /// None for byes and matches without a determined winner.
    pub rating_change: Option<RatingChange>,
    /// Other matches that received a player or were auto-completed.
    pub advanced: Vec<MatchId>,
    pub completion: Completion,
}

/// A settled match ready to commit, plus the events to publish once it is.
pub(crate) struct Settlement {
    pub changes: ChangeSet,
    pub report: ResultReport,
    match_event: MatchCompleted,
    tournament_event: Option<TournamentCompleted>,
}

impl Settlement {
    pub fn publish(&self, notifier: &dyn Notifier) {
        notifier.match_completed(&self.match_event);
        if let Some(event) = &self.tournament_event {
            notifier.tournament_completed(event);
        }
    }
}

/// Result to record on a match being finished.
pub(crate) struct Finish {
    pub winner: Option<PlayerId>,
    pub score: MatchScore,
    pub ended_early: bool,
}

/// Complete `matches[idx]`, advance the bracket, update ratings and re-check completion.
///
/// `matches` must be the tournament's full match list as loaded (with `matches[idx]`
/// possibly carrying unsaved score changes).
pub(crate) fn settle<R: Repository>(
    repo: &R,
    config: &EngineConfig,
    mut tournament: Tournament,
    mut matches: Vec<BracketMatch>,
    idx: usize,
    finish: Finish,
) -> EngineResult<Settlement> {
    if tournament.status != TournamentStatus::InProgress {
        return Err(EngineError::State(format!(
            "tournament {} is {:?}, not in progress",
            tournament.id, tournament.status
        )));
    }
    {
        let m = &mut matches[idx];
        m.status = MatchStatus::Completed;
        m.winner = finish.winner;
        m.score = finish.score;
        m.ended_early = finish.ended_early;
    }

    let touched = advance_winner(tournament.format, &mut matches, idx)?;

    let mut changes = ChangeSet::new();
    let finished = &matches[idx];
    // Both slots hold players, so this was a played match and not a bye.
    let rating_change = match (finished.winner, finished.players()) {
        (Some(winner), Some((p1, p2))) => {
            let a = repo.player(p1)?;
            let b = repo.player(p2)?;
            let (a, b, change) = rating::update(&a, &b, winner, config.k_factor)?;
            log::info!(
                "ratings: {} {} -> {}, {} {} -> {}",
                a.name,
                change.old_a,
                change.new_a,
                b.name,
                change.old_b,
                change.new_b
            );
            changes.players.push(a);
            changes.players.push(b);
            Some(change)
        }
        _ => None,
    };

    let completion = check_completion(&tournament, &matches);
    let mut tournament_event = None;
    if completion.complete {
        tournament.status = TournamentStatus::Completed;
        tournament.winner = completion.winner;
        tournament_event = Some(TournamentCompleted {
            tournament_id: tournament.id,
            winner: completion.winner,
        });
        log::info!("tournament {} completed, winner {:?}", tournament.id, completion.winner);
    }

    let match_event = MatchCompleted::from_match(&matches[idx], rating_change);
    let report = ResultReport {
        match_id: matches[idx].id,
        winner: matches[idx].winner,
        rating_change,
        advanced: touched
            .iter()
            .filter(|&&i| i != idx)
            .map(|&i| matches[i].id)
            .collect(),
        completion,
    };

    // The tournament is always written so concurrent results in one tournament conflict.
    changes.tournaments.push(tournament);
    changes.matches = touched.into_iter().map(|i| matches[i].clone()).collect();

    Ok(Settlement {
        changes,
        report,
        match_event,
        tournament_event,
    })
}

/// Position of a match in its tournament's match list.
pub(crate) fn index_of(matches: &[BracketMatch], id: MatchId) -> EngineResult<usize> {
    matches.iter().position(|m| m.id == id).ok_or_else(|| {
        EngineError::CorruptState(format!("match {id} missing from its tournament"))
    })
}
