//! Tennis club engine: library with models, bracket/scoring/rating logic and engines.

pub mod config;
pub mod engine;
pub mod logic;
pub mod models;
pub mod notify;
pub mod repository;
pub mod service;

pub use config::{ConfigError, EngineConfig};
pub use engine::{MatchLifecycle, PointReport, ResultReport, TournamentEngine};
pub use logic::{
    apply_point, check_completion, generate_bracket, seed_participants, Completion, PointOutcome,
    RatingChange, Standing,
};
pub use models::{
    BracketMatch, BracketSide, CreateTournament, EngineError, EngineResult, EntityKind,
    FinalSetRule, LiveMatch, MatchId, MatchScore, MatchStats, MatchStatus, Player, PlayerId,
    PointEvent, PointType, ScoringRules, Side, SkillTier, Slot, TennisScore, Tournament,
    TournamentFormat, TournamentId, TournamentStatus,
};
pub use notify::{LogNotifier, MatchCompleted, NoopNotifier, Notifier, TournamentCompleted};
pub use repository::{ChangeSet, MemoryRepository, Repository};
pub use service::ClubService;
