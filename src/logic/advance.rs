//! Advancing results through a bracket: winners forward, losers into the losers bracket,
//! byes auto-completed along the way.

use crate::models::{
    BracketMatch, BracketSide, EngineError, EngineResult, MatchScore, MatchStatus, Side, Slot,
    TournamentFormat,
};
use std::collections::VecDeque;

/// Forward the result of the finished match at `idx`.
///
/// Any match that becomes a bye as a consequence is completed and forwarded too.
/// Returns the indices of every match changed, `idx` included. Round robin is a no-op.
pub fn advance_winner(
    format: TournamentFormat,
    matches: &mut [BracketMatch],
    idx: usize,
) -> EngineResult<Vec<usize>> {
    let mut touched = vec![idx];
    if format == TournamentFormat::RoundRobin {
        return Ok(touched);
    }
    let layout = Layout::of(matches);

    let mut queue = VecDeque::from([idx]);
    while let Some(current) = queue.pop_front() {
        for target in forward(format, &layout, matches, current)? {
            touched.push(target);
            if resolve_bye(&mut matches[target]) {
                log::debug!(
                    "bye: {:?} round {} match {} auto-completed",
                    matches[target].side,
                    matches[target].round,
                    matches[target].match_number
                );
                queue.push_back(target);
            }
        }
    }

    touched.sort_unstable();
    touched.dedup();
    Ok(touched)
}

/// Complete a pending match that has a bye in one or both slots.
/// Returns true when the match was completed here and needs forwarding.
pub fn resolve_bye(m: &mut BracketMatch) -> bool {
    if m.status != MatchStatus::Pending || m.player1.is_open() || m.player2.is_open() {
        return false;
    }
    if m.player1 != Slot::Bye && m.player2 != Slot::Bye {
        return false;
    }
    m.winner = m.player1.player().or(m.player2.player());
    m.status = MatchStatus::Completed;
    m.score = MatchScore::Bye;
    true
}

/// Round counts of the bracket sides.
struct Layout {
    winners_rounds: u32,
    losers_rounds: u32,
}

impl Layout {
    fn of(matches: &[BracketMatch]) -> Self {
        let max_round = |side| {
            matches
                .iter()
                .filter(|m| m.side == side)
                .map(|m| m.round)
                .max()
                .unwrap_or(0)
        };
        Self {
            winners_rounds: max_round(BracketSide::Main),
            losers_rounds: max_round(BracketSide::Losers),
        }
    }
}

/// Place the finished match's winner (and loser, in double elimination). Returns targets.
fn forward(
    format: TournamentFormat,
    layout: &Layout,
    matches: &mut [BracketMatch],
    idx: usize,
) -> EngineResult<Vec<usize>> {
    let m = &matches[idx];
    if m.status == MatchStatus::Cancelled {
        return Ok(Vec::new());
    }
    if m.status != MatchStatus::Completed {
        return Err(EngineError::State(format!("match {} is not completed", m.id)));
    }
    let double = format == TournamentFormat::DoubleElimination;
    let (side, round, number) = (m.side, m.round, m.match_number);
    let winner = Slot::from_player(m.winner);
    let loser = Slot::from_player(m.loser());

    let mut targets = Vec::new();
    match side {
        BracketSide::Main => {
            if round < layout.winners_rounds {
                let position = if number % 2 == 1 { Side::One } else { Side::Two };
                targets.push(place_at(matches, BracketSide::Main, round + 1, number.div_ceil(2), position, winner)?);
            } else if double {
                targets.push(place_at(matches, BracketSide::GrandFinal, 1, 1, Side::One, winner)?);
            }
            if double {
                if layout.losers_rounds == 0 {
                    targets.push(place_at(matches, BracketSide::GrandFinal, 1, 1, Side::Two, loser)?);
                } else {
                    let floor = if round == 1 { 1 } else { 2 * (round - 1) };
                    targets.push(place_in_losers(matches, floor, loser)?);
                }
            }
        }
        BracketSide::Losers => {
            if round == layout.losers_rounds {
                targets.push(place_at(matches, BracketSide::GrandFinal, 1, 1, Side::Two, winner)?);
            } else {
                targets.push(place_in_losers(matches, round + 1, winner)?);
            }
        }
        BracketSide::GrandFinal => {
            let reset = find(matches, BracketSide::GrandFinalReset, 1, 1)?;
            let champion_won = m.winner.is_none() || m.winner == m.player1.player();
            let (p1, p2) = (m.player1, m.player2);
            let reset_match = &mut matches[reset];
            if champion_won {
                reset_match.status = MatchStatus::Cancelled;
            } else {
                reset_match.player1 = p1;
                reset_match.player2 = p2;
            }
            targets.push(reset);
        }
        BracketSide::GrandFinalReset => {}
    }
    Ok(targets)
}

fn find(matches: &[BracketMatch], side: BracketSide, round: u32, number: u32) -> EngineResult<usize> {
    matches
        .iter()
        .position(|m| m.side == side && m.round == round && m.match_number == number)
        .ok_or_else(|| {
            EngineError::CorruptState(format!(
                "bracket has no {side:?} round {round} match {number}"
            ))
        })
}

fn place_at(
    matches: &mut [BracketMatch],
    side: BracketSide,
    round: u32,
    number: u32,
    position: Side,
    slot: Slot,
) -> EngineResult<usize> {
    let idx = find(matches, side, round, number)?;
    let target = &mut matches[idx];
    let current = match position {
        Side::One => &mut target.player1,
        Side::Two => &mut target.player2,
    };
    if !current.is_open() {
        return Err(EngineError::CorruptState(format!(
            "{side:?} round {round} match {number} {position:?} slot is already filled"
        )));
    }
    *current = slot;
    Ok(idx)
}

/// Earliest losers-bracket match (generation order) in round `floor` or later with an open slot.
fn place_in_losers(matches: &mut [BracketMatch], floor: u32, slot: Slot) -> EngineResult<usize> {
    let idx = matches
        .iter()
        .position(|m| m.side == BracketSide::Losers && m.round >= floor && m.has_open_slot())
        .ok_or_else(|| {
            EngineError::CorruptState(format!("no open losers-bracket slot from round {floor}"))
        })?;
    matches[idx].fill_open_slot(slot);
    Ok(idx)
}
