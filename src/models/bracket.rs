//! BracketMatch, its player slots, and the score it carries.

use crate::models::player::PlayerId;
use crate::models::score::{Side, TennisScore};
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which part of the bracket a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    /// Single elimination, the winners bracket of double elimination, or round robin.
    Main,
    Losers,
    GrandFinal,
    /// Second grand final, played only if the losers-bracket champion wins the first.
    GrandFinalReset,
}

/// A player position in a match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "player_id", rename_all = "snake_case")]
pub enum Slot {
    /// Waiting for a result elsewhere in the bracket.
    #[default]
    Open,
    Player(PlayerId),
    /// Nobody will ever fill this position.
    Bye,
}

impl Slot {
    pub fn player(self) -> Option<PlayerId> {
        match self {
            Slot::Player(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        self == Slot::Open
    }

    /// Player if present, otherwise a bye (used when forwarding results).
    pub fn from_player(player: Option<PlayerId>) -> Self {
        player.map_or(Slot::Bye, Slot::Player)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Never needed (an unplayed grand final reset).
    Cancelled,
}

impl MatchStatus {
    pub fn is_final(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }
}

/// Score attached to a match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatchScore {
    #[default]
    NotStarted,
    /// Auto-advanced without play.
    Bye,
    Tennis(TennisScore),
    /// Result reported from outside the live scorer (e.g. "6-4 6-3").
    Reported(String),
}

impl MatchScore {
    pub fn tennis(&self) -> Option<&TennisScore> {
        match self {
            MatchScore::Tennis(score) => Some(score),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchScore::NotStarted => f.write_str("-"),
            MatchScore::Bye => f.write_str("Bye"),
            MatchScore::Tennis(score) => write!(f, "{score}"),
            MatchScore::Reported(text) => f.write_str(text),
        }
    }
}

/// A single match in a tournament bracket or round-robin schedule.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub side: BracketSide,
    /// 1-based round within its side of the bracket.
    pub round: u32,
    /// 1-based position within the round.
    pub match_number: u32,
    pub player1: Slot,
    pub player2: Slot,
    pub status: MatchStatus,
    pub winner: Option<PlayerId>,
    pub score: MatchScore,
    /// Ended by force rather than played out.
    #[serde(default)]
    pub ended_early: bool,
    #[serde(default)]
    pub version: u64,
}

impl BracketMatch {
    pub fn new(
        tournament_id: TournamentId,
        side: BracketSide,
        round: u32,
        match_number: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            side,
            round,
            match_number,
            player1: Slot::Open,
            player2: Slot::Open,
            status: MatchStatus::Pending,
            winner: None,
            score: MatchScore::NotStarted,
            ended_early: false,
            version: 0,
        }
    }

    pub fn with_slots(mut self, player1: Slot, player2: Slot) -> Self {
        self.player1 = player1;
        self.player2 = player2;
        self
    }

    pub fn slot(&self, side: Side) -> Slot {
        match side {
            Side::One => self.player1,
            Side::Two => self.player2,
        }
    }

    /// Both players when the pairing is fully known.
    pub fn players(&self) -> Option<(PlayerId, PlayerId)> {
        Some((self.player1.player()?, self.player2.player()?))
    }

    /// Slot a player occupies in this match.
    pub fn side_of(&self, player_id: PlayerId) -> Option<Side> {
        if self.player1.player() == Some(player_id) {
            Some(Side::One)
        } else if self.player2.player() == Some(player_id) {
            Some(Side::Two)
        } else {
            None
        }
    }

    /// The player who did not win (None for byes and undecided matches).
    pub fn loser(&self) -> Option<PlayerId> {
        let winner = self.winner?;
        let (p1, p2) = self.players()?;
        Some(if winner == p1 { p2 } else { p1 })
    }

    /// Player currently serving, resolved from the live score.
    pub fn server_id(&self) -> Option<PlayerId> {
        let score = self.score.tennis()?;
        self.slot(score.server).player()
    }

    /// Fill the first open slot. Returns false when both are taken.
    pub fn fill_open_slot(&mut self, slot: Slot) -> bool {
        if self.player1.is_open() {
            self.player1 = slot;
            true
        } else if self.player2.is_open() {
            self.player2 = slot;
            true
        } else {
            false
        }
    }

    pub fn has_open_slot(&self) -> bool {
        self.player1.is_open() || self.player2.is_open()
    }
}
