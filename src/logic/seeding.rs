//! Seeding: order the field by rating.

use crate::models::Player;

/// Order players by rating descending. `players` must be in registration order;
/// equal ratings keep that order (stable sort).
pub fn seed_participants(players: &[Player]) -> Vec<Player> {
    let mut seeded = players.to_vec();
    seeded.sort_by(|a, b| b.rating.cmp(&a.rating));
    seeded
}
