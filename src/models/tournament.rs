//! Tournament, TournamentFormat and TournamentStatus.

use crate::models::error::{EngineError, EngineResult};
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Bracket format chosen at creation time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl std::str::FromStr for TournamentFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_elimination" => Ok(TournamentFormat::SingleElimination),
            "double_elimination" => Ok(TournamentFormat::DoubleElimination),
            "round_robin" => Ok(TournamentFormat::RoundRobin),
            other => Err(EngineError::Validation(format!("unknown format '{other}'"))),
        }
    }
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Participants may register or withdraw.
    #[default]
    RegistrationOpen,
    /// Field is frozen; bracket not generated yet.
    RegistrationClosed,
    /// Bracket generated, matches being played.
    InProgress,
    Completed,
}

/// Input for creating a tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTournament {
    pub name: String,
    pub format: TournamentFormat,
    pub max_participants: usize,
    #[serde(default)]
    pub participants: Vec<PlayerId>,
}

/// A tournament: field, seeds and phase. Matches are stored separately.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub max_participants: usize,
    pub status: TournamentStatus,
    /// Registered players in registration order.
    pub participants: Vec<PlayerId>,
    /// Players ordered by seed (filled when the bracket is generated).
    pub seeds: Vec<PlayerId>,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Tournament {
    /// Create a tournament open for registration, with any initial participants registered.
    pub fn new(input: CreateTournament) -> EngineResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("tournament name is empty".into()));
        }
        if input.max_participants < 2 {
            return Err(EngineError::Validation(format!(
                "max participants must be at least 2 (got {})",
                input.max_participants
            )));
        }
        let mut tournament = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            format: input.format,
            max_participants: input.max_participants,
            status: TournamentStatus::RegistrationOpen,
            participants: Vec::new(),
            seeds: Vec::new(),
            winner: None,
            created_at: Utc::now(),
            version: 0,
        };
        for player_id in input.participants {
            tournament.register(player_id)?;
        }
        Ok(tournament)
    }

    /// Register a participant (only while registration is open).
    pub fn register(&mut self, player_id: PlayerId) -> EngineResult<()> {
        self.expect_status(TournamentStatus::RegistrationOpen, "register")?;
        if self.participants.contains(&player_id) {
            return Err(EngineError::Validation(format!(
                "player {player_id} is already registered"
            )));
        }
        if self.participants.len() >= self.max_participants {
            return Err(EngineError::State(format!(
                "tournament is full ({} participants)",
                self.max_participants
            )));
        }
        self.participants.push(player_id);
        Ok(())
    }

    /// Withdraw a participant (only while registration is open).
    pub fn withdraw(&mut self, player_id: PlayerId) -> EngineResult<()> {
        self.expect_status(TournamentStatus::RegistrationOpen, "withdraw")?;
        let idx = self
            .participants
            .iter()
            .position(|p| *p == player_id)
            .ok_or_else(|| EngineError::Validation(format!("player {player_id} is not registered")))?;
        self.participants.remove(idx);
        Ok(())
    }

    pub fn close_registration(&mut self) -> EngineResult<()> {
        self.expect_status(TournamentStatus::RegistrationOpen, "close registration")?;
        self.status = TournamentStatus::RegistrationClosed;
        Ok(())
    }

    /// True once the bracket exists (generation moves the tournament to InProgress).
    pub fn bracket_generated(&self) -> bool {
        matches!(
            self.status,
            TournamentStatus::InProgress | TournamentStatus::Completed
        )
    }

    fn expect_status(&self, expected: TournamentStatus, action: &str) -> EngineResult<()> {
        if self.status != expected {
            return Err(EngineError::State(format!(
                "cannot {action}: tournament is {:?}, expected {:?}",
                self.status, expected
            )));
        }
        Ok(())
    }
}
