//! Tournament completion and round-robin standings.

use crate::models::{
    BracketMatch, BracketSide, MatchStatus, PlayerId, Side, Tournament, TournamentFormat,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether the tournament is over, and who won it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub complete: bool,
    pub winner: Option<PlayerId>,
}

impl Completion {
    fn done(winner: Option<PlayerId>) -> Self {
        Self {
            complete: true,
            winner,
        }
    }
}

/// One row of a round-robin table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    /// 1-based seed.
    pub seed: usize,
    pub wins: u32,
    pub losses: u32,
    pub games_won: u32,
    pub games_lost: u32,
}

impl Standing {
    pub fn game_differential(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }
}

pub fn check_completion(tournament: &Tournament, matches: &[BracketMatch]) -> Completion {
    if matches.is_empty() {
        return Completion::default();
    }
    match tournament.format {
        TournamentFormat::SingleElimination => {
            let final_match = matches
                .iter()
                .filter(|m| m.side == BracketSide::Main)
                .max_by_key(|m| m.round);
            match final_match {
                Some(m) if m.status == MatchStatus::Completed => Completion::done(m.winner),
                _ => Completion::default(),
            }
        }
        TournamentFormat::DoubleElimination => {
            let on_side = |side| matches.iter().find(|m| m.side == side);
            match (on_side(BracketSide::GrandFinal), on_side(BracketSide::GrandFinalReset)) {
                (Some(gf), Some(reset)) => match reset.status {
                    MatchStatus::Cancelled if gf.status == MatchStatus::Completed => {
                        Completion::done(gf.winner)
                    }
                    MatchStatus::Completed => Completion::done(reset.winner),
                    _ => Completion::default(),
                },
                _ => Completion::default(),
            }
        }
        TournamentFormat::RoundRobin => {
            if matches.iter().all(|m| m.status.is_final()) {
                let table = round_robin_standings(&tournament.seeds, matches);
                Completion::done(table.first().map(|s| s.player_id))
            } else {
                Completion::default()
            }
        }
    }
}

/// Round-robin table over the finished matches, best first.
///
/// Ordered by wins, then head-to-head wins among players level on wins, then game
/// differential, then seed.
pub fn round_robin_standings(seeds: &[PlayerId], matches: &[BracketMatch]) -> Vec<Standing> {
    let mut table: Vec<Standing> = seeds
        .iter()
        .enumerate()
        .map(|(i, id)| Standing {
            player_id: *id,
            seed: i + 1,
            wins: 0,
            losses: 0,
            games_won: 0,
            games_lost: 0,
        })
        .collect();
    let index: HashMap<PlayerId, usize> = seeds.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    // (winner, loser) pairs for head-to-head
    let mut results: Vec<(PlayerId, PlayerId)> = Vec::new();

    for m in matches.iter().filter(|m| m.status == MatchStatus::Completed) {
        let Some((p1, p2)) = m.players() else { continue };
        if let (Some(score), Some(&i1), Some(&i2)) = (m.score.tennis(), index.get(&p1), index.get(&p2)) {
            let (g1, g2) = score.games_won();
            table[i1].games_won += g1;
            table[i1].games_lost += g2;
            table[i2].games_won += g2;
            table[i2].games_lost += g1;
        }
        let (Some(winner), Some(loser)) = (m.winner, m.loser()) else { continue };
        if let (Some(&w), Some(&l)) = (index.get(&winner), index.get(&loser)) {
            table[w].wins += 1;
            table[l].losses += 1;
            results.push((winner, loser));
        }
    }

    table.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.seed.cmp(&b.seed)));

    let mut start = 0;
    while start < table.len() {
        let wins = table[start].wins;
        let end = start + table[start..].iter().take_while(|s| s.wins == wins).count();
        if end - start > 1 {
            let group: Vec<PlayerId> = table[start..end].iter().map(|s| s.player_id).collect();
            let head_to_head = |id: PlayerId| {
                results
                    .iter()
                    .filter(|(w, l)| *w == id && group.contains(l))
                    .count()
            };
            table[start..end].sort_by(|a, b| {
                head_to_head(b.player_id)
                    .cmp(&head_to_head(a.player_id))
                    .then(b.game_differential().cmp(&a.game_differential()))
                    .then(a.seed.cmp(&b.seed))
            });
        }
        start = end;
    }
    table
}

/// Winner of a match by sets, when one side leads (used to settle forced ends).
pub fn set_majority(m: &BracketMatch, sets_won: (u8, u8)) -> Option<PlayerId> {
    match sets_won.0.cmp(&sets_won.1) {
        std::cmp::Ordering::Greater => m.slot(Side::One).player(),
        std::cmp::Ordering::Less => m.slot(Side::Two).player(),
        std::cmp::Ordering::Equal => None,
    }
}
