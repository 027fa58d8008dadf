//! Elo rating updates after a decided match.

use crate::models::{EngineError, EngineResult, Player, PlayerId};
use serde::{Deserialize, Serialize};

/// K-factor for Elo updates (higher = more volatile)
pub const K_FACTOR: f64 = 32.0;

/// Rating movement for both players of one match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_a: PlayerId,
    pub old_a: i32,
    pub new_a: i32,
    pub player_b: PlayerId,
    pub old_b: i32,
    pub new_b: i32,
}

/// Expected score for a player rated `rating_a` against `rating_b`.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(f64::from(rating_b - rating_a) / 400.0))
}

/// New ratings for A and B after a match A won (`a_won`) or lost.
pub fn new_ratings(rating_a: i32, rating_b: i32, a_won: bool, k: f64) -> (i32, i32) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;
    let (actual_a, actual_b) = if a_won { (1.0, 0.0) } else { (0.0, 1.0) };
    let new_a = (f64::from(rating_a) + k * (actual_a - expected_a)).round() as i32;
    let new_b = (f64::from(rating_b) + k * (actual_b - expected_b)).round() as i32;
    (new_a, new_b)
}

/// Updated copies of both players: ratings, matches played, matches won.
pub fn update(a: &Player, b: &Player, winner: PlayerId, k: f64) -> EngineResult<(Player, Player, RatingChange)> {
    if winner != a.id && winner != b.id {
        return Err(EngineError::Validation(format!(
            "winner {winner} did not play in this match"
        )));
    }
    let a_won = winner == a.id;
    let (new_a, new_b) = new_ratings(a.rating, b.rating, a_won, k);
    let change = RatingChange {
        player_a: a.id,
        old_a: a.rating,
        new_a,
        player_b: b.id,
        old_b: b.rating,
        new_b,
    };
    let mut a = a.clone();
    let mut b = b.clone();
    a.record_match(new_a, a_won);
    b.record_match(new_b, !a_won);
    Ok((a, b, change))
}
