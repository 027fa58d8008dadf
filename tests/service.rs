//! Concurrent use of the async service.

mod common;

use common::find;
use std::sync::Arc;
use tennis_club::{
    BracketSide, ClubService, CreateTournament, EngineConfig, EngineError, MemoryRepository,
    NoopNotifier, PointType, Slot, TournamentFormat, TournamentId,
};

fn service() -> Arc<ClubService<MemoryRepository>> {
    Arc::new(ClubService::new(
        Arc::new(MemoryRepository::new()),
        EngineConfig::default(),
        Arc::new(NoopNotifier),
    ))
}

fn closed_tournament(service: &ClubService<MemoryRepository>, players: usize) -> TournamentId {
    let engine = service.tournaments();
    let ids = (0..players)
        .map(|i| engine.create_player(&format!("P{i}"), None).unwrap().id)
        .collect();
    let t = engine
        .create_tournament(CreateTournament {
            name: "Night Session".to_string(),
            format: TournamentFormat::SingleElimination,
            max_participants: players,
            participants: ids,
        })
        .unwrap();
    engine.close_registration(t.id).unwrap().id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_generation_runs_once() {
    let service = service();
    let t = closed_tournament(&service, 8);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.generate_bracket(t).await })
        })
        .collect();
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| r == &Err(EngineError::AlreadyGenerated(t))));
    assert_eq!(service.tournaments().matches(t).unwrap().len(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn semifinals_scored_in_parallel_both_reach_the_final() {
    let service = service();
    let t = closed_tournament(&service, 4);
    let matches = service.generate_bracket(t).await.unwrap();
    let semis = [
        find(&matches, BracketSide::Main, 1, 1),
        find(&matches, BracketSide::Main, 1, 2),
    ];

    let handles: Vec<_> = semis
        .iter()
        .map(|semi| {
            let service = service.clone();
            let (id, winner) = (semi.id, semi.player1.player().unwrap());
            tokio::spawn(async move {
                let mut last = None;
                for _ in 0..48 {
                    last = Some(service.award_point(id, winner, PointType::PointWon).await);
                }
                last.unwrap()
            })
        })
        .collect();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert!(report.result.is_some());
    }

    let final_match = find(&service.tournaments().matches(t).unwrap(), BracketSide::Main, 2, 1);
    assert_eq!(final_match.player1, Slot::Player(semis[0].player1.player().unwrap()));
    assert_eq!(final_match.player2, Slot::Player(semis[1].player1.player().unwrap()));
}

#[tokio::test]
async fn service_undo_and_force_end() {
    let service = service();
    let t = closed_tournament(&service, 2);
    let m = service.generate_bracket(t).await.unwrap()[0].clone();
    let (a, b) = m.players().unwrap();

    service.start_match(m.id, Some(b)).await.unwrap();
    service.award_point(m.id, a, PointType::Ace).await.unwrap();
    let undone = service.undo_last_point(m.id).await.unwrap();
    assert_eq!(undone.server_id(), Some(b));
    assert!(service.lifecycle().live_match(m.id).unwrap().points.is_empty());

    let report = service.force_end_match(m.id, Some(a)).await.unwrap();
    assert_eq!(report.winner, Some(a));
    assert!(report.completion.complete);
    assert!(matches!(
        service.register_result(m.id, a, Default::default()).await,
        Err(EngineError::State(_))
    ));
}
