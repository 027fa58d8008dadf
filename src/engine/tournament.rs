//! TournamentEngine: registration, seeding, bracket generation and result registration.

use super::{index_of, settle, Finish, ResultReport};
use crate::config::EngineConfig;
use crate::logic::{self, Completion, Standing};
use crate::models::{
    BracketMatch, CreateTournament, EngineError, EngineResult, MatchId, MatchScore, Player,
    PlayerId, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
use crate::notify::{NoopNotifier, Notifier};
use crate::repository::{ChangeSet, Repository};
use std::sync::Arc;

pub struct TournamentEngine<R: Repository> {
    repo: Arc<R>,
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
}

impl<R: Repository> TournamentEngine<R> {
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

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Add a player to the club. Rating defaults to the configured starting rating.
    pub fn create_player(&self, name: &str, rating: Option<i32>) -> EngineResult<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("player name is empty".into()));
        }
        let player = Player::with_rating(name, rating.unwrap_or(self.config.default_rating));
        self.repo.save_player(player.clone())?;
        self.repo.player(player.id)
    }

    /// Create a tournament open for registration. Initial participants must exist.
    pub fn create_tournament(&self, input: CreateTournament) -> EngineResult<Tournament> {
        for id in &input.participants {
            self.repo.player(*id)?;
        }
        let tournament = Tournament::new(input)?;
        self.repo.save_tournament(tournament.clone())?;
        log::info!(
            "created {:?} tournament '{}' ({})",
            tournament.format,
            tournament.name,
            tournament.id
        );
        self.repo.tournament(tournament.id)
    }

    pub fn register_participant(&self, tournament_id: TournamentId, player_id: PlayerId) -> EngineResult<Tournament> {
        self.repo.player(player_id)?;
        let mut tournament = self.repo.tournament(tournament_id)?;
        tournament.register(player_id)?;
        self.repo.save_tournament(tournament)?;
        self.repo.tournament(tournament_id)
    }

    pub fn withdraw_participant(&self, tournament_id: TournamentId, player_id: PlayerId) -> EngineResult<Tournament> {
        let mut tournament = self.repo.tournament(tournament_id)?;
        tournament.withdraw(player_id)?;
        self.repo.save_tournament(tournament)?;
        self.repo.tournament(tournament_id)
    }

    pub fn close_registration(&self, tournament_id: TournamentId) -> EngineResult<Tournament> {
        let mut tournament = self.repo.tournament(tournament_id)?;
        tournament.close_registration()?;
        self.repo.save_tournament(tournament)?;
        self.repo.tournament(tournament_id)
    }

    /// Participants in seed order (rating descending, ties by registration order).
    pub fn seeded_participants(&self, tournament_id: TournamentId) -> EngineResult<Vec<Player>> {
        let tournament = self.repo.tournament(tournament_id)?;
        let players = tournament
            .participants
            .iter()
            .map(|id| self.repo.player(*id))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(logic::seed_participants(&players))
    }

    /// Seed the field and create all matches. Runs once: the tournament moves from
    /// RegistrationClosed to InProgress in the same commit, guarded by its version.
    pub fn generate_bracket(&self, tournament_id: TournamentId) -> EngineResult<Vec<BracketMatch>> {
        let mut tournament = self.repo.tournament(tournament_id)?;
        let seeds: Vec<PlayerId> = self
            .seeded_participants(tournament_id)?
            .iter()
            .map(|p| p.id)
            .collect();
        let matches = logic::generate_bracket(&tournament, &seeds)?;

        tournament.seeds = seeds;
        tournament.status = TournamentStatus::InProgress;
        let changes = ChangeSet {
            tournaments: vec![tournament],
            matches,
            ..ChangeSet::default()
        };
        let count = changes.matches.len();
        if let Err(e) = self.repo.commit(changes) {
            if e.is_conflict() && self.repo.tournament(tournament_id)?.bracket_generated() {
                return Err(EngineError::AlreadyGenerated(tournament_id));
            }
            return Err(e);
        }
        log::info!("generated {count} matches for tournament {tournament_id}");
        self.repo.tournament_matches(tournament_id)
    }

    /// Record the result of a match played outside the live scorer.
    pub fn register_result(&self, match_id: MatchId, winner_id: PlayerId, score: MatchScore) -> EngineResult<ResultReport> {
        let m = self.repo.bracket_match(match_id)?;
        if m.status.is_final() {
            return Err(EngineError::State(format!("match {match_id} is already completed")));
        }
        let side = match m.players() {
            Some(_) => m.side_of(winner_id).ok_or_else(|| {
                EngineError::Validation(format!("player {winner_id} is not in match {match_id}"))
            })?,
            None => {
                return Err(EngineError::State(format!(
                    "match {match_id} does not have both players yet"
                )))
            }
        };
        match &score {
            MatchScore::Tennis(tennis) => {
                let rules = self.config.scoring_rules();
                tennis.validate(&rules)?;
                if tennis.match_winner(&rules).is_some_and(|w| w != side) {
                    return Err(EngineError::Validation(
                        "score does not agree with the reported winner".into(),
                    ));
                }
            }
            MatchScore::Reported(_) => {}
            MatchScore::NotStarted | MatchScore::Bye => {
                return Err(EngineError::Validation(format!(
                    "{score:?} is not a result for match {match_id}"
                )));
            }
        }

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
                winner: Some(winner_id),
                score,
                ended_early: false,
            },
        )?;
        self.repo.commit(std::mem::take(&mut settlement.changes))?;
        settlement.publish(self.notifier.as_ref());
        Ok(settlement.report)
    }

    pub fn check_completion(&self, tournament_id: TournamentId) -> EngineResult<Completion> {
        let tournament = self.repo.tournament(tournament_id)?;
        let matches = self.repo.tournament_matches(tournament_id)?;
        Ok(logic::check_completion(&tournament, &matches))
    }

    /// Round-robin table. Other formats have no table.
    pub fn standings(&self, tournament_id: TournamentId) -> EngineResult<Vec<Standing>> {
        let tournament = self.repo.tournament(tournament_id)?;
        if tournament.format != TournamentFormat::RoundRobin {
            return Err(EngineError::State(format!(
                "{:?} tournaments have no standings table",
                tournament.format
            )));
        }
        let matches = self.repo.tournament_matches(tournament_id)?;
        Ok(logic::round_robin_standings(&tournament.seeds, &matches))
    }

    pub fn matches(&self, tournament_id: TournamentId) -> EngineResult<Vec<BracketMatch>> {
        self.repo.tournament_matches(tournament_id)
    }

    /// Matches with both players known that still need a result.
    pub fn playable_matches(&self, tournament_id: TournamentId) -> EngineResult<Vec<BracketMatch>> {
        Ok(self
            .repo
            .tournament_matches(tournament_id)?
            .into_iter()
            .filter(|m| !m.status.is_final() && m.players().is_some())
            .collect())
    }
}
