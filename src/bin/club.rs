//! Club tournament driver: reads a roster, plays a whole tournament point by point, prints the result.
//! Run with: cargo run --bin club -- roster.csv [single_elimination|double_elimination|round_robin]
//! Env: CLUB_ROSTER, CLUB_FORMAT, CLUB_NAME, CLUB_SEED (point feed seed), TENNIS_* (engine config).
//! Points are drawn from a seeded RNG weighted by the players' ratings.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fs::File;
use std::sync::Arc;
use tennis_club::logic::rating::expected_score;
use tennis_club::models::read_roster;
use tennis_club::{
    BracketMatch, ClubService, CreateTournament, EngineConfig, LogNotifier, MemoryRepository,
    PointType, Repository, TournamentFormat,
};

/// Relative frequency of each point type in the simulated feed.
const POINT_MIX: [(PointType, u32); 6] = [
    (PointType::PointWon, 40),
    (PointType::Winner, 20),
    (PointType::UnforcedError, 18),
    (PointType::ForcedError, 12),
    (PointType::Ace, 7),
    (PointType::DoubleFault, 3),
];

fn default_format() -> TournamentFormat {
    TournamentFormat::SingleElimination
}

fn default_seed() -> u64 {
    7
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let roster_path = args
        .next()
        .or_else(|| std::env::var("CLUB_ROSTER").ok())
        .ok_or("usage: club <roster.csv> [format]")?;
    let format = match args.next().or_else(|| std::env::var("CLUB_FORMAT").ok()) {
        Some(f) => f.parse()?,
        None => default_format(),
    };
    let name = std::env::var("CLUB_NAME").unwrap_or_else(|_| "Club Championship".to_string());
    let seed = std::env::var("CLUB_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_seed);

    let config = EngineConfig::from_env()?;
    log::info!(
        "best of {}, final set {:?}, K={}",
        config.best_of,
        config.final_set,
        config.k_factor
    );

    let repo = Arc::new(MemoryRepository::new());
    let players = read_roster(File::open(&roster_path)?, config.default_rating)?;
    log::info!("loaded {} players from {}", players.len(), roster_path);
    for p in &players {
        repo.save_player(p.clone())?;
    }

    let service = ClubService::new(repo.clone(), config, Arc::new(LogNotifier));
    let tournament = service.tournaments().create_tournament(CreateTournament {
        name,
        format,
        max_participants: players.len(),
        participants: players.iter().map(|p| p.id).collect(),
    })?;
    service.tournaments().close_registration(tournament.id)?;
    service.generate_bracket(tournament.id).await?;

    let mut rng = StdRng::seed_from_u64(seed);
    loop {
        let playable = service.tournaments().playable_matches(tournament.id)?;
        if playable.is_empty() {
            break;
        }
        for m in playable {
            play_match(&service, &m, &mut rng).await?;
        }
    }

    let tournament = repo.tournament(tournament.id)?;
    let winner = match tournament.winner {
        Some(id) => Some(repo.player(id)?),
        None => None,
    };
    let ratings = players
        .iter()
        .map(|p| repo.player(p.id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut summary = serde_json::json!({
        "tournament": tournament,
        "winner": winner.map(|p| p.name),
        "ratings": ratings,
    });
    if format == TournamentFormat::RoundRobin {
        summary["standings"] = serde_json::to_value(service.tournaments().standings(tournament.id)?)?;
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Feed points into one match until it is decided.
async fn play_match(
    service: &ClubService<MemoryRepository>,
    m: &BracketMatch,
    rng: &mut StdRng,
) -> Result<(), Box<dyn Error>> {
    let (p1, p2) = m.players().ok_or("match is not ready")?;
    let repo = service.tournaments().repository();
    let (r1, r2) = (repo.player(p1)?.rating, repo.player(p2)?.rating);
    // Flatten the match-level expectation to a per-point edge.
    let p1_point = 0.5 + (expected_score(r1, r2) - 0.5) * 0.2;

    loop {
        let winner = if rng.gen_bool(p1_point) { p1 } else { p2 };
        let point_type = POINT_MIX
            .choose_weighted(rng, |(_, weight)| *weight)
            .map(|(t, _)| *t)?;
        let report = service.award_point(m.id, winner, point_type).await?;
        if let Some(result) = report.result {
            let stats = service.lifecycle().match_stats(m.id)?;
            log::info!(
                "{:?} round {} match {}: {} ({} aces / {} aces)",
                m.side,
                m.round,
                m.match_number,
                report.bracket_match.score,
                stats.player1.aces,
                stats.player2.aces
            );
            if result.completion.complete {
                log::info!("tournament decided");
            }
            return Ok(());
        }
    }
}
