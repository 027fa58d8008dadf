//! Data structures for the club engine: players, tournaments, matches, scores.

mod bracket;
mod error;
mod live;
mod player;
mod roster;
mod score;
mod tournament;

pub use bracket::{BracketMatch, BracketSide, MatchId, MatchScore, MatchStatus, Slot};
pub use error::{EngineError, EngineResult, EntityKind};
pub use live::{LiveMatch, MatchStats, PlayerMatchStats};
pub use player::{Player, PlayerId, SkillTier, DEFAULT_RATING};
pub use roster::read_roster;
pub use score::{
    FinalSetRule, GamePoints, GameRecord, PointEvent, PointType, ScoringRules, SetScore, Side,
    TennisScore,
};
pub use tournament::{
    CreateTournament, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
