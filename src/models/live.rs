//! LiveMatch (undo history + point log) and MatchStats derived from point metadata.

use crate::models::bracket::{MatchId, MatchScore};
use crate::models::player::PlayerId;
use crate::models::score::{PointEvent, PointType};
use serde::{Deserialize, Serialize};

/// Point-by-point record of a match being scored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LiveMatch {
    pub match_id: MatchId,
    /// Match score before each awarded point, most recent last.
    pub history: Vec<MatchScore>,
    /// Points in the order they were awarded (parallel to `history`).
    pub points: Vec<PointEvent>,
    #[serde(default)]
    pub version: u64,
}

impl LiveMatch {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            ..Self::default()
        }
    }

    pub fn push(&mut self, prior: MatchScore, event: PointEvent) {
        self.history.push(prior);
        self.points.push(event);
    }

    /// Remove the latest point, returning the score from before it.
    pub fn pop(&mut self) -> Option<MatchScore> {
        let prior = self.history.pop()?;
        self.points.pop();
        Some(prior)
    }
}

/// Per-player counts derived from the point log.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    pub points_won: u32,
    pub aces: u32,
    pub winners: u32,
    /// Double faults committed (the opponent won the point).
    pub double_faults: u32,
    /// Forced errors committed.
    pub forced_errors: u32,
    /// Unforced errors committed.
    pub unforced_errors: u32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub player1: PlayerMatchStats,
    pub player2: PlayerMatchStats,
}

impl MatchStats {
    /// Tally a point log. Error-type points are charged to the player who lost the point.
    pub fn from_points(points: &[PointEvent], player1: PlayerId) -> Self {
        let mut stats = Self::default();
        for event in points {
            let (won, lost) = if event.winner_id == player1 {
                (&mut stats.player1, &mut stats.player2)
            } else {
                (&mut stats.player2, &mut stats.player1)
            };
            won.points_won += 1;
            match event.point_type {
                PointType::PointWon => {}
                PointType::Ace => won.aces += 1,
                PointType::Winner => won.winners += 1,
                PointType::DoubleFault => lost.double_faults += 1,
                PointType::ForcedError => lost.forced_errors += 1,
                PointType::UnforcedError => lost.unforced_errors += 1,
            }
        }
        stats
    }
}
