//! Bracket generation for single elimination, double elimination and round robin.

use crate::logic::advance::{advance_winner, resolve_bye};
use crate::models::{
    BracketMatch, BracketSide, EngineError, EngineResult, PlayerId, Slot, Tournament,
    TournamentFormat, TournamentId, TournamentStatus,
};
use std::collections::HashSet;

/// Build every match of the tournament from the seeded field.
///
/// Byes in the opening round are completed and forwarded before returning, so the
/// result is the bracket as it stands when play begins.
pub fn generate_bracket(tournament: &Tournament, seeds: &[PlayerId]) -> EngineResult<Vec<BracketMatch>> {
    if tournament.bracket_generated() {
        return Err(EngineError::AlreadyGenerated(tournament.id));
    }
    if tournament.status != TournamentStatus::RegistrationClosed {
        return Err(EngineError::State(format!(
            "bracket can only be generated once registration is closed (tournament is {:?})",
            tournament.status
        )));
    }
    if seeds.len() < 2 {
        return Err(EngineError::Validation(format!(
            "need at least 2 participants, have {}",
            seeds.len()
        )));
    }
    let unique: HashSet<_> = seeds.iter().collect();
    if unique.len() != seeds.len() {
        return Err(EngineError::Validation("a participant is seeded twice".into()));
    }

    let mut matches = match tournament.format {
        TournamentFormat::SingleElimination => main_bracket(tournament.id, seeds),
        TournamentFormat::DoubleElimination => {
            let mut matches = main_bracket(tournament.id, seeds);
            let winners_rounds = rounds_for(seeds.len());
            matches.extend(losers_bracket(tournament.id, winners_rounds));
            matches.push(BracketMatch::new(tournament.id, BracketSide::GrandFinal, 1, 1));
            matches.push(BracketMatch::new(tournament.id, BracketSide::GrandFinalReset, 1, 1));
            matches
        }
        TournamentFormat::RoundRobin => return Ok(round_robin(tournament.id, seeds)),
    };

    for idx in 0..matches.len() {
        if resolve_bye(&mut matches[idx]) {
            advance_winner(tournament.format, &mut matches, idx)?;
        }
    }
    Ok(matches)
}

/// Slot count: next power of two at or above the field size.
pub fn bracket_size(participants: usize) -> usize {
    participants.next_power_of_two()
}

/// Rounds in an elimination bracket for `participants`.
pub fn rounds_for(participants: usize) -> u32 {
    bracket_size(participants).trailing_zeros()
}

/// Single-elimination tree (also the winners bracket of double elimination).
/// Seeds fill slots positionally; round 1 pairs slots (2i, 2i+1).
fn main_bracket(tournament_id: TournamentId, seeds: &[PlayerId]) -> Vec<BracketMatch> {
    let size = bracket_size(seeds.len());
    let slot = |i: usize| seeds.get(i).map_or(Slot::Bye, |id| Slot::Player(*id));

    let mut matches: Vec<BracketMatch> = (0..size / 2)
        .map(|i| {
            BracketMatch::new(tournament_id, BracketSide::Main, 1, i as u32 + 1)
                .with_slots(slot(2 * i), slot(2 * i + 1))
        })
        .collect();
    for round in 2..=rounds_for(seeds.len()) {
        let count = size >> round;
        matches.extend(
            (1..=count).map(|n| BracketMatch::new(tournament_id, BracketSide::Main, round, n as u32)),
        );
    }
    matches
}

/// Empty losers bracket: (winners_rounds - 1) * 2 rounds, halving every second round.
fn losers_bracket(tournament_id: TournamentId, winners_rounds: u32) -> Vec<BracketMatch> {
    let rounds = winners_rounds.saturating_sub(1) * 2;
    let mut matches = Vec::new();
    for round in 1..=rounds {
        let count = 1usize << (winners_rounds - 1 - round.div_ceil(2));
        matches.extend(
            (1..=count).map(|n| BracketMatch::new(tournament_id, BracketSide::Losers, round, n as u32)),
        );
    }
    matches
}

/// One match per unordered pair, all in round 1.
fn round_robin(tournament_id: TournamentId, seeds: &[PlayerId]) -> Vec<BracketMatch> {
    let mut matches = Vec::with_capacity(seeds.len() * (seeds.len() - 1) / 2);
    for (i, a) in seeds.iter().enumerate() {
        for b in &seeds[i + 1..] {
            let number = matches.len() as u32 + 1;
            matches.push(
                BracketMatch::new(tournament_id, BracketSide::Main, 1, number)
                    .with_slots(Slot::Player(*a), Slot::Player(*b)),
            );
        }
    }
    matches
}
