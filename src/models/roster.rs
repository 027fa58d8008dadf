//! Roster import: `name,rating` CSV rows into players.

use crate::models::error::{EngineError, EngineResult};
use crate::models::player::Player;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    rating: Option<i32>,
}

/// Read players from CSV with a `name,rating` header. Missing ratings use `default_rating`.
/// Names must be non-empty and unique (case-insensitive).
pub fn read_roster<R: Read>(reader: R, default_rating: i32) -> EngineResult<Vec<Player>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut players: Vec<Player> = Vec::new();
    for (line, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = row.map_err(|e| EngineError::Roster(e.to_string()))?;
        if row.name.is_empty() {
            return Err(EngineError::Roster(format!("row {}: empty name", line + 1)));
        }
        if players.iter().any(|p| p.name.eq_ignore_ascii_case(&row.name)) {
            return Err(EngineError::Roster(format!(
                "row {}: duplicate name '{}'",
                line + 1,
                row.name
            )));
        }
        players.push(Player::with_rating(row.name, row.rating.unwrap_or(default_rating)));
    }
    Ok(players)
}
