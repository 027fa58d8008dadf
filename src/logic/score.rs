//! Score state machine: apply one point to a tennis score.
//!
//! Points are counted as integers. A regular game is won at 4+ points with a two-point
//! lead; deuce is kept canonical (40-40 is always stored as 3-3) so the label form
//! round-trips. A tiebreak is won at 7+ points with a two-point lead.

use crate::models::{
    EngineError, EngineResult, GameRecord, PointType, ScoringRules, SetScore, Side, TennisScore,
};

/// Result of applying a point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PointOutcome {
    pub score: TennisScore,
    pub point_type: PointType,
    pub game_won: Option<Side>,
    pub set_won: Option<Side>,
    /// Set when the point decided the match; the caller must finalize it.
    pub match_won: Option<Side>,
}

/// Apply a point won by `winner`. `point_type` is carried through untouched.
pub fn apply_point(
    score: &TennisScore,
    rules: &ScoringRules,
    winner: Side,
    point_type: PointType,
) -> EngineResult<PointOutcome> {
    score.validate(rules)?;
    if score.match_winner(rules).is_some() {
        return Err(EngineError::State("match is already decided".into()));
    }

    let mut next = score.clone();
    let mut outcome = PointOutcome {
        score: TennisScore::default(),
        point_type,
        game_won: None,
        set_won: None,
        match_won: None,
    };

    next.current_game.add(winner);
    let (won, lost) = (next.current_game.get(winner), next.current_game.get(winner.other()));

    if next.is_tiebreak {
        if won >= 7 && won >= lost + 2 {
            finish_game(&mut next, rules, winner, &mut outcome);
        } else if next.current_game.total() % 2 == 1 {
            next.server = next.server.other();
        }
    } else if won >= 4 && won >= lost + 2 {
        finish_game(&mut next, rules, winner, &mut outcome);
    } else if won == 4 && lost == 4 {
        // back to deuce
        next.current_game.player1 = 3;
        next.current_game.player2 = 3;
    }

    outcome.score = next;
    Ok(outcome)
}

fn finish_game(score: &mut TennisScore, rules: &ScoringRules, winner: Side, outcome: &mut PointOutcome) {
    outcome.game_won = Some(winner);

    let game_server = if score.is_tiebreak {
        tiebreak_first_server(score)
    } else {
        score.server
    };
    let record = GameRecord {
        player1_points: score.current_game.player1,
        player2_points: score.current_game.player2,
        server: game_server,
    };

    let won_before = won_before_current(score, rules);
    let tiebreak_set = rules.tiebreak_applies(won_before);
    let set = match score.sets.last_mut() {
        Some(set) => set,
        None => return,
    };
    set.games.push(record);
    set.add_game(winner);
    let set_over = set.winner(tiebreak_set);
    let six_all = set.player1_games == 6 && set.player2_games == 6;

    score.current_game = Default::default();
    score.is_tiebreak = false;
    score.server = game_server.other();

    match set_over {
        Some(set_winner) => {
            outcome.set_won = Some(set_winner);
            match score.match_winner(rules) {
                Some(match_winner) => outcome.match_won = Some(match_winner),
                None => score.sets.push(SetScore::default()),
            }
        }
        None if six_all && tiebreak_set => score.is_tiebreak = true,
        None => {}
    }
}

fn won_before_current(score: &TennisScore, rules: &ScoringRules) -> (u8, u8) {
    let finished = &score.sets[..score.sets.len().saturating_sub(1)];
    let mut won = (0, 0);
    for set in finished {
        match set.winner(rules.tiebreak_applies(won)) {
            Some(Side::One) => won.0 += 1,
            Some(Side::Two) => won.1 += 1,
            None => {}
        }
    }
    won
}

/// Who served the first point of the tiebreak that just ended.
///
/// Serve passes after the first point and then every two points, so point `i` is served
/// by the first server when `((i + 1) / 2)` is even. `score.server` served the final point.
fn tiebreak_first_server(score: &TennisScore) -> Side {
    let last_point = score.current_game.total().saturating_sub(1);
    if ((last_point + 1) / 2) % 2 == 0 {
        score.server
    } else {
        score.server.other()
    }
}
