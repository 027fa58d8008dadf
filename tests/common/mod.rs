//! Shared setup for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tennis_club::models::SetScore;
use tennis_club::{
    BracketMatch, BracketSide, CreateTournament, EngineConfig, MatchCompleted, MatchLifecycle,
    MemoryRepository, Notifier, Player, Side, TennisScore, Tournament, TournamentCompleted,
    TournamentEngine, TournamentFormat,
};

pub struct Club {
    pub repo: Arc<MemoryRepository>,
    pub engine: TournamentEngine<MemoryRepository>,
    pub lifecycle: MatchLifecycle<MemoryRepository>,
    pub events: Arc<RecordingNotifier>,
}

pub fn club() -> Club {
    let repo = Arc::new(MemoryRepository::new());
    let events = Arc::new(RecordingNotifier::default());
    Club {
        engine: TournamentEngine::new(repo.clone(), EngineConfig::default())
            .with_notifier(events.clone()),
        lifecycle: MatchLifecycle::new(repo.clone(), EngineConfig::default())
            .with_notifier(events.clone()),
        repo,
        events,
    }
}

impl Club {
    /// Players named P0.. with the given ratings, registered in that order; registration closed.
    pub fn tournament(&self, format: TournamentFormat, ratings: &[i32]) -> (Tournament, Vec<Player>) {
        let players: Vec<Player> = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| self.engine.create_player(&format!("P{i}"), Some(*r)).unwrap())
            .collect();
        let tournament = self
            .engine
            .create_tournament(CreateTournament {
                name: "Club Open".to_string(),
                format,
                max_participants: ratings.len().max(2),
                participants: players.iter().map(|p| p.id).collect(),
            })
            .unwrap();
        let tournament = self.engine.close_registration(tournament.id).unwrap();
        (tournament, players)
    }
}

/// Collects every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    pub matches: Mutex<Vec<MatchCompleted>>,
    pub tournaments: Mutex<Vec<TournamentCompleted>>,
}

impl Notifier for RecordingNotifier {
    fn match_completed(&self, event: &MatchCompleted) {
        self.matches.lock().unwrap().push(event.clone());
    }

    fn tournament_completed(&self, event: &TournamentCompleted) {
        self.tournaments.lock().unwrap().push(event.clone());
    }
}

pub fn find(matches: &[BracketMatch], side: BracketSide, round: u32, number: u32) -> BracketMatch {
    matches
        .iter()
        .find(|m| m.side == side && m.round == round && m.match_number == number)
        .cloned()
        .unwrap_or_else(|| panic!("no {side:?} round {round} match {number}"))
}

/// Finished score from set results given as (player1 games, player2 games).
pub fn finished_score(sets: &[(u8, u8)]) -> TennisScore {
    TennisScore {
        sets: sets
            .iter()
            .map(|&(a, b)| SetScore {
                player1_games: a,
                player2_games: b,
                games: Vec::new(),
            })
            .collect(),
        current_game: Default::default(),
        server: Side::One,
        is_tiebreak: false,
    }
}
