//! Repository trait for storage-agnostic engines, plus the in-memory implementation.
//!
//! Writes go through [`Repository::commit`], which applies a whole [`ChangeSet`] or nothing.
//! Every saved entity carries the `version` it was loaded at; a commit fails with
//! [`EngineError::Conflict`] if any stored version has moved on since.

use crate::models::{
    BracketMatch, EngineError, EngineResult, EntityKind, LiveMatch, MatchId, Player, PlayerId,
    Tournament, TournamentId,
};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Entities to write atomically.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    pub tournaments: Vec<Tournament>,
    pub matches: Vec<BracketMatch>,
    pub players: Vec<Player>,
    pub live: Vec<LiveMatch>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tournament(mut self, tournament: Tournament) -> Self {
        self.tournaments.push(tournament);
        self
    }

    pub fn bracket_match(mut self, m: BracketMatch) -> Self {
        self.matches.push(m);
        self
    }

    pub fn player(mut self, player: Player) -> Self {
        self.players.push(player);
        self
    }

    pub fn live(mut self, live: LiveMatch) -> Self {
        self.live.push(live);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
            && self.matches.is_empty()
            && self.players.is_empty()
            && self.live.is_empty()
    }
}

/// Storage used by the engines. Loads return [`EngineError::NotFound`] for unknown ids.
pub trait Repository: Send + Sync {
    fn tournament(&self, id: TournamentId) -> EngineResult<Tournament>;

    fn player(&self, id: PlayerId) -> EngineResult<Player>;

    fn bracket_match(&self, id: MatchId) -> EngineResult<BracketMatch>;

    /// All matches of a tournament in generation order.
    fn tournament_matches(&self, id: TournamentId) -> EngineResult<Vec<BracketMatch>>;

    fn live_match(&self, id: MatchId) -> EngineResult<Option<LiveMatch>>;

    /// Apply every write in `changes` or none of them.
    fn commit(&self, changes: ChangeSet) -> EngineResult<()>;

    fn save_player(&self, player: Player) -> EngineResult<()> {
        self.commit(ChangeSet::new().player(player))
    }

    fn save_tournament(&self, tournament: Tournament) -> EngineResult<()> {
        self.commit(ChangeSet::new().tournament(tournament))
    }

    fn save_match(&self, m: BracketMatch) -> EngineResult<()> {
        self.commit(ChangeSet::new().bracket_match(m))
    }
}

#[derive(Default)]
struct Store {
    tournaments: HashMap<TournamentId, Tournament>,
    players: HashMap<PlayerId, Player>,
    matches: HashMap<MatchId, BracketMatch>,
    /// Match ids per tournament in insertion order.
    match_order: HashMap<TournamentId, Vec<MatchId>>,
    live: HashMap<MatchId, LiveMatch>,
}

/// In-memory repository.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> EngineResult<T> {
        let guard = self
            .store
            .read()
            .map_err(|_| EngineError::Storage("lock poisoned".into()))?;
        Ok(f(&guard))
    }
}

/// Stored version must equal the version the caller loaded (absent counts as 0).
fn check_version(kind: EntityKind, id: Uuid, stored: Option<u64>, loaded: u64) -> EngineResult<()> {
    if stored.unwrap_or(0) != loaded {
        return Err(EngineError::Conflict { kind, id });
    }
    Ok(())
}

impl Repository for MemoryRepository {
    fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.read(|s| s.tournaments.get(&id).cloned())?
            .ok_or(EngineError::not_found(EntityKind::Tournament, id))
    }

    fn player(&self, id: PlayerId) -> EngineResult<Player> {
        self.read(|s| s.players.get(&id).cloned())?
            .ok_or(EngineError::not_found(EntityKind::Player, id))
    }

    fn bracket_match(&self, id: MatchId) -> EngineResult<BracketMatch> {
        self.read(|s| s.matches.get(&id).cloned())?
            .ok_or(EngineError::not_found(EntityKind::Match, id))
    }

    fn tournament_matches(&self, id: TournamentId) -> EngineResult<Vec<BracketMatch>> {
        self.read(|s| {
            if !s.tournaments.contains_key(&id) {
                return Err(EngineError::not_found(EntityKind::Tournament, id));
            }
            Ok(s.match_order
                .get(&id)
                .map(|ids| ids.iter().filter_map(|m| s.matches.get(m).cloned()).collect())
                .unwrap_or_default())
        })?
    }

    fn live_match(&self, id: MatchId) -> EngineResult<Option<LiveMatch>> {
        self.read(|s| s.live.get(&id).cloned())
    }

    fn commit(&self, changes: ChangeSet) -> EngineResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut store = self
            .store
            .write()
            .map_err(|_| EngineError::Storage("lock poisoned".into()))?;

        for t in &changes.tournaments {
            check_version(EntityKind::Tournament, t.id, store.tournaments.get(&t.id).map(|s| s.version), t.version)?;
        }
        for m in &changes.matches {
            check_version(EntityKind::Match, m.id, store.matches.get(&m.id).map(|s| s.version), m.version)?;
            let owner_known = store.tournaments.contains_key(&m.tournament_id)
                || changes.tournaments.iter().any(|t| t.id == m.tournament_id);
            if !owner_known {
                return Err(EngineError::not_found(EntityKind::Tournament, m.tournament_id));
            }
        }
        for p in &changes.players {
            check_version(EntityKind::Player, p.id, store.players.get(&p.id).map(|s| s.version), p.version)?;
        }
        for l in &changes.live {
            check_version(EntityKind::LiveMatch, l.match_id, store.live.get(&l.match_id).map(|s| s.version), l.version)?;
        }

        for mut t in changes.tournaments {
            t.version += 1;
            store.tournaments.insert(t.id, t);
        }
        for mut m in changes.matches {
            m.version += 1;
            if !store.matches.contains_key(&m.id) {
                store.match_order.entry(m.tournament_id).or_default().push(m.id);
            }
            store.matches.insert(m.id, m);
        }
        for mut p in changes.players {
            p.version += 1;
            store.players.insert(p.id, p);
        }
        for mut l in changes.live {
            l.version += 1;
            store.live.insert(l.match_id, l);
        }
        Ok(())
    }
}
