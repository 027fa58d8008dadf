//! Integration tests for seeding, bracket generation and advancement.

mod common;

use common::{club, find};
use std::collections::HashSet;
use tennis_club::logic::bracket_size;
use tennis_club::{
    generate_bracket, seed_participants, BracketSide, CreateTournament, EngineError, MatchScore,
    MatchStatus, Player, Repository, Slot, Tournament, TournamentFormat, TournamentStatus,
};
use uuid::Uuid;

fn closed_tournament(format: TournamentFormat, n: usize) -> (Tournament, Vec<Uuid>) {
    let mut t = Tournament::new(CreateTournament {
        name: "Spring Cup".to_string(),
        format,
        max_participants: n.max(2),
        participants: Vec::new(),
    })
    .unwrap();
    let ids: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
    for id in &ids {
        t.register(*id).unwrap();
    }
    t.close_registration().unwrap();
    (t, ids)
}

#[test]
fn seeding_orders_by_rating_then_registration() {
    let players = vec![
        Player::with_rating("A", 1400),
        Player::with_rating("B", 1600),
        Player::with_rating("C", 1600),
        Player::with_rating("D", 1500),
    ];
    let seeded: Vec<String> = seed_participants(&players)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(seeded, vec!["B", "C", "D", "A"]);
}

#[test]
fn single_elimination_has_bracket_size_minus_one_matches() {
    for n in 2..=17 {
        let (t, ids) = closed_tournament(TournamentFormat::SingleElimination, n);
        let matches = generate_bracket(&t, &ids).unwrap();
        assert_eq!(matches.len(), bracket_size(n) - 1, "n = {n}");
    }
}

#[test]
fn later_rounds_halve() {
    let (t, ids) = closed_tournament(TournamentFormat::SingleElimination, 8);
    let matches = generate_bracket(&t, &ids).unwrap();
    let per_round = |r| matches.iter().filter(|m| m.round == r).count();
    assert_eq!((per_round(1), per_round(2), per_round(3)), (4, 2, 1));
}

#[test]
fn bye_auto_completes_and_advances() {
    let (t, ids) = closed_tournament(TournamentFormat::SingleElimination, 3);
    let matches = generate_bracket(&t, &ids).unwrap();

    let first = find(&matches, BracketSide::Main, 1, 1);
    assert_eq!(first.status, MatchStatus::Pending);
    assert_eq!(first.player1, Slot::Player(ids[0]));
    assert_eq!(first.player2, Slot::Player(ids[1]));

    let bye = find(&matches, BracketSide::Main, 1, 2);
    assert_eq!(bye.status, MatchStatus::Completed);
    assert_eq!(bye.winner, Some(ids[2]));
    assert_eq!(bye.score, MatchScore::Bye);
    assert_eq!(bye.score.to_string(), "Bye");

    let final_match = find(&matches, BracketSide::Main, 2, 1);
    assert_eq!(final_match.player1, Slot::Open);
    assert_eq!(final_match.player2, Slot::Player(ids[2]));
}

#[test]
fn empty_pairing_passes_a_bye_forward() {
    // 5 players in 8 slots: round-1 match 4 has nobody, so match 3's winner walks through round 2.
    let (t, ids) = closed_tournament(TournamentFormat::SingleElimination, 5);
    let matches = generate_bracket(&t, &ids).unwrap();

    let empty = find(&matches, BracketSide::Main, 1, 4);
    assert_eq!(empty.status, MatchStatus::Completed);
    assert_eq!(empty.winner, None);

    let walkover = find(&matches, BracketSide::Main, 2, 2);
    assert_eq!(walkover.status, MatchStatus::Completed);
    assert_eq!(walkover.winner, Some(ids[4]));

    let final_match = find(&matches, BracketSide::Main, 3, 1);
    assert_eq!(final_match.player2, Slot::Player(ids[4]));
}

#[test]
fn round_robin_pairs_everyone_once() {
    let (t, ids) = closed_tournament(TournamentFormat::RoundRobin, 5);
    let matches = generate_bracket(&t, &ids).unwrap();
    assert_eq!(matches.len(), 10);

    let mut pairs = HashSet::new();
    for (i, m) in matches.iter().enumerate() {
        assert_eq!(m.round, 1);
        assert_eq!(m.match_number as usize, i + 1);
        let (a, b) = m.players().unwrap();
        assert_ne!(a, b);
        assert!(pairs.insert(if a < b { (a, b) } else { (b, a) }));
    }
}

#[test]
fn fewer_than_two_participants_is_rejected() {
    let (t, ids) = closed_tournament(TournamentFormat::RoundRobin, 1);
    assert!(matches!(
        generate_bracket(&t, &ids),
        Err(EngineError::Validation(_))
    ));
}

#[test]
fn generation_requires_closed_registration() {
    let t = Tournament::new(CreateTournament {
        name: "Open".to_string(),
        format: TournamentFormat::SingleElimination,
        max_participants: 4,
        participants: Vec::new(),
    })
    .unwrap();
    let ids = [Uuid::new_v4(), Uuid::new_v4()];
    assert!(matches!(
        generate_bracket(&t, &ids),
        Err(EngineError::State(_))
    ));
}

#[test]
fn generating_twice_fails() {
    let club = club();
    let (t, _) = club.tournament(TournamentFormat::SingleElimination, &[1500, 1500, 1500]);
    club.engine.generate_bracket(t.id).unwrap();
    assert_eq!(
        club.engine.generate_bracket(t.id),
        Err(EngineError::AlreadyGenerated(t.id))
    );
    assert_eq!(club.engine.matches(t.id).unwrap().len(), 3);
}

#[test]
fn generation_stores_seeds_and_starts_tournament() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::SingleElimination, &[1400, 1700, 1550]);
    club.engine.generate_bracket(t.id).unwrap();
    let t = club.repo.tournament(t.id).unwrap();
    assert_eq!(t.status, TournamentStatus::InProgress);
    assert_eq!(t.seeds, vec![players[1].id, players[2].id, players[0].id]);
}

#[test]
fn winners_fill_next_round_by_match_number() {
    let club = club();
    let (t, _) = club.tournament(TournamentFormat::SingleElimination, &[1500; 4]);
    let matches = club.engine.generate_bracket(t.id).unwrap();

    let m1 = find(&matches, BracketSide::Main, 1, 1);
    let m2 = find(&matches, BracketSide::Main, 1, 2);
    let w1 = m1.player1.player().unwrap();
    let w2 = m2.player2.player().unwrap();
    club.engine
        .register_result(m2.id, w2, MatchScore::Reported("6-3 6-3".into()))
        .unwrap();
    club.engine
        .register_result(m1.id, w1, MatchScore::Reported("6-4 6-4".into()))
        .unwrap();

    let final_match = find(&club.engine.matches(t.id).unwrap(), BracketSide::Main, 2, 1);
    assert_eq!(final_match.player1, Slot::Player(w1));
    assert_eq!(final_match.player2, Slot::Player(w2));
}

#[test]
fn registering_a_result_twice_fails() {
    let club = club();
    let (t, _) = club.tournament(TournamentFormat::SingleElimination, &[1500; 4]);
    let matches = club.engine.generate_bracket(t.id).unwrap();
    let m = find(&matches, BracketSide::Main, 1, 1);
    let winner = m.player1.player().unwrap();
    club.engine
        .register_result(m.id, winner, MatchScore::Reported("6-0 6-0".into()))
        .unwrap();
    assert!(matches!(
        club.engine
            .register_result(m.id, winner, MatchScore::Reported("6-0 6-0".into())),
        Err(EngineError::State(_))
    ));
}

#[test]
fn result_for_unknown_match_or_player_fails() {
    let club = club();
    let (t, _) = club.tournament(TournamentFormat::SingleElimination, &[1500; 2]);
    let matches = club.engine.generate_bracket(t.id).unwrap();
    assert!(matches!(
        club.engine
            .register_result(Uuid::new_v4(), Uuid::new_v4(), MatchScore::NotStarted),
        Err(EngineError::NotFound { .. })
    ));
    assert!(matches!(
        club.engine
            .register_result(matches[0].id, Uuid::new_v4(), MatchScore::NotStarted),
        Err(EngineError::Validation(_))
    ));
}

#[test]
fn bye_leaves_rating_untouched() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::SingleElimination, &[1600, 1500, 1400]);
    club.engine.generate_bracket(t.id).unwrap();
    // Lowest seed has the bye.
    let p = club.repo.player(players[2].id).unwrap();
    assert_eq!(p.rating, 1400);
    assert_eq!(p.matches_played, 0);
    assert!(club.events.matches.lock().unwrap().is_empty());
}

#[test]
fn double_elimination_match_counts() {
    for (n, expected) in [(2, 3), (3, 7), (4, 7), (8, 15), (9, 31)] {
        let (t, ids) = closed_tournament(TournamentFormat::DoubleElimination, n);
        let matches = generate_bracket(&t, &ids).unwrap();
        assert_eq!(matches.len(), expected, "n = {n}");
    }
}

#[test]
fn double_elimination_routes_losers_and_completes() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::DoubleElimination, &[1800, 1700, 1600, 1500]);
    let s: Vec<Uuid> = players.iter().map(|p| p.id).collect();
    club.engine.generate_bracket(t.id).unwrap();
    let result = |side, round, number, winner: Uuid| {
        let m = find(&club.engine.matches(t.id).unwrap(), side, round, number);
        club.engine
            .register_result(m.id, winner, MatchScore::Reported("6-2 6-2".into()))
            .unwrap()
    };

    result(BracketSide::Main, 1, 1, s[0]);
    result(BracketSide::Main, 1, 2, s[2]);
    let lr1 = find(&club.engine.matches(t.id).unwrap(), BracketSide::Losers, 1, 1);
    assert_eq!(lr1.players(), Some((s[1], s[3])));

    result(BracketSide::Losers, 1, 1, s[1]);
    result(BracketSide::Main, 2, 1, s[0]);
    let lr2 = find(&club.engine.matches(t.id).unwrap(), BracketSide::Losers, 2, 1);
    assert_eq!(lr2.players(), Some((s[1], s[2])));

    result(BracketSide::Losers, 2, 1, s[1]);
    let gf = find(&club.engine.matches(t.id).unwrap(), BracketSide::GrandFinal, 1, 1);
    assert_eq!(gf.players(), Some((s[0], s[1])));

    let report = result(BracketSide::GrandFinal, 1, 1, s[0]);
    assert!(report.completion.complete);
    assert_eq!(report.completion.winner, Some(s[0]));
    let reset = find(&club.engine.matches(t.id).unwrap(), BracketSide::GrandFinalReset, 1, 1);
    assert_eq!(reset.status, MatchStatus::Cancelled);
}

#[test]
fn winners_champion_survives_first_grand_final_loss() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::DoubleElimination, &[1600, 1500]);
    let (a, b) = (players[0].id, players[1].id);
    club.engine.generate_bracket(t.id).unwrap();
    let play = |side, winner| {
        let m = find(&club.engine.matches(t.id).unwrap(), side, 1, 1);
        club.engine
            .register_result(m.id, winner, MatchScore::Reported("7-5 7-5".into()))
            .unwrap()
    };

    play(BracketSide::Main, a);
    let report = play(BracketSide::GrandFinal, b);
    assert!(!report.completion.complete);

    let reset = find(&club.engine.matches(t.id).unwrap(), BracketSide::GrandFinalReset, 1, 1);
    assert_eq!(reset.players(), Some((a, b)));
    assert_eq!(reset.status, MatchStatus::Pending);

    let report = play(BracketSide::GrandFinalReset, b);
    assert!(report.completion.complete);
    assert_eq!(report.completion.winner, Some(b));
    assert_eq!(
        club.engine.check_completion(t.id).unwrap().winner,
        Some(b)
    );
}

#[test]
fn double_elimination_byes_reach_the_losers_bracket() {
    let (t, ids) = closed_tournament(TournamentFormat::DoubleElimination, 3);
    let matches = generate_bracket(&t, &ids).unwrap();
    // The round-1 bye sends a bye into the losers bracket to meet the first real loser.
    let lr1 = find(&matches, BracketSide::Losers, 1, 1);
    assert_eq!(lr1.player1, Slot::Bye);
    assert_eq!(lr1.player2, Slot::Open);
    assert_eq!(lr1.status, MatchStatus::Pending);
}

#[test]
fn losers_bye_walks_the_first_loser_through() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::DoubleElimination, &[1700, 1600, 1500]);
    let matches = club.engine.generate_bracket(t.id).unwrap();
    let opener = find(&matches, BracketSide::Main, 1, 1);
    club.engine
        .register_result(opener.id, players[0].id, MatchScore::Reported("6-1 6-1".into()))
        .unwrap();

    let matches = club.engine.matches(t.id).unwrap();
    let lr1 = find(&matches, BracketSide::Losers, 1, 1);
    assert_eq!(lr1.status, MatchStatus::Completed);
    assert_eq!(lr1.winner, Some(players[1].id));
    let lr2 = find(&matches, BracketSide::Losers, 2, 1);
    assert_eq!(lr2.player1, Slot::Player(players[1].id));
    assert_eq!(lr1.score, MatchScore::Bye);
    // Only the opener was rated.
    assert_eq!(club.repo.player(players[1].id).unwrap().matches_played, 1);
}

#[test]
fn stale_commit_applies_nothing() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::SingleElimination, &[1500, 1500]);
    let mut stale = club.repo.tournament(t.id).unwrap();
    club.engine.generate_bracket(t.id).unwrap();

    let mut renamed = club.repo.player(players[0].id).unwrap();
    renamed.name = "Renamed".into();
    stale.name = "Stale".into();
    let result = club
        .repo
        .commit(tennis_club::ChangeSet::new().player(renamed).tournament(stale));
    assert!(matches!(result, Err(EngineError::Conflict { .. })));
    assert_eq!(club.repo.player(players[0].id).unwrap().name, "P0");
    assert_eq!(club.repo.tournament(t.id).unwrap().name, "Club Open");
}

#[test]
fn registration_rules() {
    let club = club();
    let a = club.engine.create_player("Ana", None).unwrap();
    let b = club.engine.create_player("Bea", Some(1850)).unwrap();
    let c = club.engine.create_player("Cid", Some(1100)).unwrap();
    assert_eq!(a.rating, 1500);
    assert_eq!(b.skill_tier, tennis_club::SkillTier::Pro);
    assert_eq!(c.skill_tier, tennis_club::SkillTier::Beginner);

    let t = club
        .engine
        .create_tournament(CreateTournament {
            name: "Ladder".to_string(),
            format: TournamentFormat::RoundRobin,
            max_participants: 2,
            participants: vec![a.id],
        })
        .unwrap();
    assert!(matches!(
        club.engine.register_participant(t.id, a.id),
        Err(EngineError::Validation(_))
    ));
    club.engine.register_participant(t.id, b.id).unwrap();
    assert!(matches!(
        club.engine.register_participant(t.id, c.id),
        Err(EngineError::State(_))
    ));

    let t = club.engine.withdraw_participant(t.id, a.id).unwrap();
    assert_eq!(t.participants, vec![b.id]);
    club.engine.register_participant(t.id, c.id).unwrap();
    club.engine.close_registration(t.id).unwrap();
    assert!(matches!(
        club.engine.register_participant(t.id, a.id),
        Err(EngineError::State(_))
    ));
    assert!(matches!(
        club.engine.create_player("  ", None),
        Err(EngineError::Validation(_))
    ));
}

#[test]
fn played_match_cannot_be_recorded_as_a_bye() {
    let club = club();
    let (t, players) = club.tournament(TournamentFormat::SingleElimination, &[1500, 1500]);
    let m = club.engine.generate_bracket(t.id).unwrap()[0].clone();
    for score in [MatchScore::Bye, MatchScore::NotStarted] {
        assert!(matches!(
            club.engine.register_result(m.id, players[0].id, score),
            Err(EngineError::Validation(_))
        ));
    }
    let stored = club.repo.bracket_match(m.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);

    let report = club
        .engine
        .register_result(m.id, players[0].id, MatchScore::Reported("6-2 6-2".into()))
        .unwrap();
    assert!(report.rating_change.is_some());
    let winner = club.repo.player(players[0].id).unwrap();
    assert_eq!((winner.rating, winner.matches_played), (1516, 1));
}
