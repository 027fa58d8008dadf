//! Notifications for completed matches and tournaments.

use crate::logic::RatingChange;
use crate::models::{BracketMatch, MatchId, MatchScore, PlayerId, TournamentId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchCompleted {
    pub tournament_id: TournamentId,
    pub match_id: MatchId,
    pub winner: Option<PlayerId>,
    pub score: MatchScore,
    pub ended_early: bool,
    pub rating_change: Option<RatingChange>,
}

impl MatchCompleted {
    pub fn from_match(m: &BracketMatch, rating_change: Option<RatingChange>) -> Self {
        Self {
            tournament_id: m.tournament_id,
            match_id: m.id,
            winner: m.winner,
            score: m.score.clone(),
            ended_early: m.ended_early,
            rating_change,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentCompleted {
    pub tournament_id: TournamentId,
    pub winner: Option<PlayerId>,
}

/// Receives events after they are committed. Delivery is up to the implementation.
pub trait Notifier: Send + Sync {
    fn match_completed(&self, _event: &MatchCompleted) {}

    fn tournament_completed(&self, _event: &TournamentCompleted) {}
}

/// Drops every event.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}

/// Writes events to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn match_completed(&self, event: &MatchCompleted) {
        log::info!(
            "match {} completed: winner {:?}, score {}",
            event.match_id,
            event.winner,
            event.score
        );
    }

    fn tournament_completed(&self, event: &TournamentCompleted) {
        log::info!(
            "tournament {} completed: winner {:?}",
            event.tournament_id,
            event.winner
        );
    }
}
