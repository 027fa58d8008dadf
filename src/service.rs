//! Async facade over the engines.
//!
//! Scoring on one match is serialized by a per-match lock. Generation, reported results and
//! forced ends also take the tournament lock (always after the match lock). Different
//! matches run in parallel. Operations that lose an optimistic-concurrency race are re-run against
//! fresh state up to `max_commit_retries` times.

use crate::config::EngineConfig;
use crate::engine::{MatchLifecycle, PointReport, ResultReport, TournamentEngine};
use crate::models::{
    BracketMatch, EngineResult, MatchId, MatchScore, PlayerId, PointType, TournamentId,
};
use crate::notify::Notifier;
use crate::repository::Repository;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lazily created async locks keyed by id. An entry lives only while someone holds or waits on it.
#[derive(Default)]
struct LockMap {
    locks: std::sync::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl LockMap {
    async fn acquire(&self, id: Uuid) -> LockGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };
        LockGuard {
            map: self,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct LockGuard<'a> {
    map: &'a LockMap,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.map.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under the map lock, so a count of 1 means no other holder or waiter.
        if locks.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.id);
        }
    }
}

pub struct ClubService<R: Repository> {
    tournaments: TournamentEngine<R>,
    lifecycle: MatchLifecycle<R>,
    match_locks: LockMap,
    tournament_locks: LockMap,
    max_retries: u32,
}

impl<R: Repository> ClubService<R> {
    pub fn new(repo: Arc<R>, config: EngineConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tournaments: TournamentEngine::new(repo.clone(), config.clone())
                .with_notifier(notifier.clone()),
            lifecycle: MatchLifecycle::new(repo, config.clone()).with_notifier(notifier),
            match_locks: LockMap::default(),
            tournament_locks: LockMap::default(),
            max_retries: config.max_commit_retries,
        }
    }

    /// Synchronous tournament operations (registration, queries).
    pub fn tournaments(&self) -> &TournamentEngine<R> {
        &self.tournaments
    }

    /// Synchronous match operations (stats, point log).
    pub fn lifecycle(&self) -> &MatchLifecycle<R> {
        &self.lifecycle
    }

    pub async fn generate_bracket(&self, tournament_id: TournamentId) -> EngineResult<Vec<BracketMatch>> {
        let _guard = self.tournament_locks.acquire(tournament_id).await;
        self.retry("generate bracket", || self.tournaments.generate_bracket(tournament_id))
            .await
    }

    pub async fn register_result(&self, match_id: MatchId, winner_id: PlayerId, score: MatchScore) -> EngineResult<ResultReport> {
        let _match_guard = self.match_locks.acquire(match_id).await;
        let tournament_id = self.tournament_of(match_id)?;
        let _guard = self.tournament_locks.acquire(tournament_id).await;
        self.retry("register result", || {
            self.tournaments
                .register_result(match_id, winner_id, score.clone())
        })
        .await
    }

    pub async fn start_match(&self, match_id: MatchId, first_server: Option<PlayerId>) -> EngineResult<BracketMatch> {
        let _match_guard = self.match_locks.acquire(match_id).await;
        self.retry("start match", || self.lifecycle.start_match(match_id, first_server))
            .await
    }

    pub async fn award_point(&self, match_id: MatchId, winner_id: PlayerId, point_type: PointType) -> EngineResult<PointReport> {
        // Only the deciding point touches the rest of the bracket; it commits under the
        // tournament version and is retried if another result landed first.
        let _match_guard = self.match_locks.acquire(match_id).await;
        self.retry("award point", || {
            self.lifecycle.award_point(match_id, winner_id, point_type)
        })
        .await
    }

    pub async fn undo_last_point(&self, match_id: MatchId) -> EngineResult<BracketMatch> {
        let _match_guard = self.match_locks.acquire(match_id).await;
        self.retry("undo point", || self.lifecycle.undo_last_point(match_id))
            .await
    }

    pub async fn force_end_match(&self, match_id: MatchId, winner_override: Option<PlayerId>) -> EngineResult<ResultReport> {
        let _match_guard = self.match_locks.acquire(match_id).await;
        let tournament_id = self.tournament_of(match_id)?;
        let _guard = self.tournament_locks.acquire(tournament_id).await;
        self.retry("force end", || {
            self.lifecycle.force_end_match(match_id, winner_override)
        })
        .await
    }

    fn tournament_of(&self, match_id: MatchId) -> EngineResult<TournamentId> {
        Ok(self
            .tournaments
            .repository()
            .bracket_match(match_id)?
            .tournament_id)
    }

    async fn retry<T>(&self, what: &str, mut op: impl FnMut() -> EngineResult<T>) -> EngineResult<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Err(e) if e.is_conflict() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!("{what}: {e}, retrying ({attempt}/{})", self.max_retries);
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = LockMap::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        {
            let _first = locks.acquire(a).await;
            let _second = locks.acquire(b).await;
            assert_eq!(locks.len(), 2);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_the_entry() {
        let locks = Arc::new(LockMap::default());
        let id = Uuid::new_v4();
        let held = locks.acquire(id).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::task::yield_now().await;
        drop(held);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
