//! Tennis score: sets, games, point labels and the wire format they serialize to.

use crate::models::error::{EngineError, EngineResult};
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a match (player1 or player2 slot).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Side {
    #[default]
    #[serde(rename = "player1")]
    One,
    #[serde(rename = "player2")]
    Two,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// How the deciding set is settled at 6-6.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSetRule {
    /// Tiebreak at 6-6 like every other set.
    #[default]
    Tiebreak,
    /// No tiebreak in the deciding set: play on until one side leads by two games.
    Advantage,
}

/// Match format parameters used by the score state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Best-of-N sets (odd).
    pub best_of: u8,
    pub final_set: FinalSetRule,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            best_of: 3,
            final_set: FinalSetRule::Tiebreak,
        }
    }
}

impl ScoringRules {
    /// Sets needed to win the match.
    pub fn sets_to_win(&self) -> u8 {
        self.best_of / 2 + 1
    }

    /// Whether a set started with `won_before` sets already decided is played with a tiebreak at 6-6.
    pub fn tiebreak_applies(&self, won_before: (u8, u8)) -> bool {
        let last = self.sets_to_win() - 1;
        let deciding = won_before.0 == last && won_before.1 == last;
        !(deciding && self.final_set == FinalSetRule::Advantage)
    }
}

/// Point counters for the game in progress (raw integers; labels are derived).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GamePoints {
    pub player1: u16,
    pub player2: u16,
}

impl GamePoints {
    pub fn get(&self, side: Side) -> u16 {
        match side {
            Side::One => self.player1,
            Side::Two => self.player2,
        }
    }

    pub fn add(&mut self, side: Side) {
        match side {
            Side::One => self.player1 += 1,
            Side::Two => self.player2 += 1,
        }
    }

    pub fn total(&self) -> u16 {
        self.player1 + self.player2
    }

    /// Display labels: 0/15/30/40/AD in a regular game, raw counts in a tiebreak.
    pub fn labels(&self, is_tiebreak: bool) -> (String, String) {
        if is_tiebreak {
            return (self.player1.to_string(), self.player2.to_string());
        }
        (point_label(self.player1).to_string(), point_label(self.player2).to_string())
    }

    fn from_labels(player1: &str, player2: &str, is_tiebreak: bool) -> EngineResult<Self> {
        let parse = |label: &str| -> EngineResult<u16> {
            if is_tiebreak {
                return label
                    .trim()
                    .parse()
                    .map_err(|_| EngineError::CorruptState(format!("bad tiebreak count '{label}'")));
            }
            match label.trim() {
                "0" => Ok(0),
                "15" => Ok(1),
                "30" => Ok(2),
                "40" => Ok(3),
                "AD" => Ok(4),
                other => Err(EngineError::CorruptState(format!("bad point label '{other}'"))),
            }
        };
        Ok(Self {
            player1: parse(player1)?,
            player2: parse(player2)?,
        })
    }
}

fn point_label(points: u16) -> &'static str {
    match points {
        0 => "0",
        1 => "15",
        2 => "30",
        3 => "40",
        _ => "AD",
    }
}

/// A finished game: final point counts and who served it (first server for a tiebreak).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub player1_points: u16,
    pub player2_points: u16,
    #[serde(rename = "server_id")]
    pub server: Side,
}

/// Games in one set. The last set of a score is the one in play until the match ends.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub player1_games: u8,
    pub player2_games: u8,
    #[serde(default)]
    pub games: Vec<GameRecord>,
}

impl SetScore {
    pub fn add_game(&mut self, side: Side) {
        match side {
            Side::One => self.player1_games += 1,
            Side::Two => self.player2_games += 1,
        }
    }

    /// Winner of this set, if it is over.
    pub fn winner(&self, tiebreak_at_six_all: bool) -> Option<Side> {
        let (a, b) = (self.player1_games, self.player2_games);
        if tiebreak_at_six_all {
            return match (a, b) {
                (6, 0..=4) | (7, 5) | (7, 6) => Some(Side::One),
                (0..=4, 6) | (5, 7) | (6, 7) => Some(Side::Two),
                _ => None,
            };
        }
        if a >= 6 && a >= b + 2 {
            Some(Side::One)
        } else if b >= 6 && b >= a + 2 {
            Some(Side::Two)
        } else {
            None
        }
    }
}

/// Live tennis score. Serializes to the wire shape
/// `{sets, current_game: {player1, player2}, server_id, is_tiebreak}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoreRecord", into = "ScoreRecord")]
pub struct TennisScore {
    pub sets: Vec<SetScore>,
    pub current_game: GamePoints,
    /// Slot currently serving.
    pub server: Side,
    pub is_tiebreak: bool,
}

impl Default for TennisScore {
    fn default() -> Self {
        Self::new(Side::One)
    }
}

impl TennisScore {
    /// Fresh score: one empty set, `server` to serve the first game.
    pub fn new(server: Side) -> Self {
        Self {
            sets: vec![SetScore::default()],
            current_game: GamePoints::default(),
            server,
            is_tiebreak: false,
        }
    }

    /// Sets won by each side so far.
    pub fn sets_won(&self, rules: &ScoringRules) -> (u8, u8) {
        let mut won = (0, 0);
        for set in &self.sets {
            match set.winner(rules.tiebreak_applies(won)) {
                Some(Side::One) => won.0 += 1,
                Some(Side::Two) => won.1 += 1,
                None => {}
            }
        }
        won
    }

    pub fn match_winner(&self, rules: &ScoringRules) -> Option<Side> {
        let (a, b) = self.sets_won(rules);
        let needed = rules.sets_to_win();
        if a >= needed {
            Some(Side::One)
        } else if b >= needed {
            Some(Side::Two)
        } else {
            None
        }
    }

    /// Total games won by each side across all sets (used for standings).
    pub fn games_won(&self) -> (u32, u32) {
        self.sets.iter().fold((0, 0), |(a, b), set| {
            (a + u32::from(set.player1_games), b + u32::from(set.player2_games))
        })
    }

    /// Check the score against the scoring invariants for `rules`.
    pub fn validate(&self, rules: &ScoringRules) -> EngineResult<()> {
        let corrupt = |msg: String| Err(EngineError::CorruptState(msg));
        if self.sets.is_empty() {
            return corrupt("score has no sets".into());
        }
        if self.sets.len() > usize::from(rules.best_of) {
            return corrupt(format!(
                "{} sets recorded in a best-of-{} match",
                self.sets.len(),
                rules.best_of
            ));
        }

        let needed = rules.sets_to_win();
        let mut won = (0u8, 0u8);
        let last = self.sets.len() - 1;
        for (idx, set) in self.sets.iter().enumerate() {
            if won.0 >= needed || won.1 >= needed {
                return corrupt(format!("set {} recorded after the match was decided", idx + 1));
            }
            let tiebreak_set = rules.tiebreak_applies(won);
            match set.winner(tiebreak_set) {
                Some(Side::One) => won.0 += 1,
                Some(Side::Two) => won.1 += 1,
                None if idx < last => {
                    return corrupt(format!(
                        "set {} ({}-{}) is unfinished but not the current set",
                        idx + 1,
                        set.player1_games,
                        set.player2_games
                    ));
                }
                None => self.validate_current_set(set, tiebreak_set)?,
            }
        }

        let decided = won.0 >= needed || won.1 >= needed;
        if decided && (self.current_game.total() > 0 || self.is_tiebreak) {
            return corrupt("points recorded after the match was decided".into());
        }
        if !decided && self.sets[last].winner(rules.tiebreak_applies(self.won_before_last(rules))).is_some() {
            return corrupt("finished set without a following set".into());
        }
        self.validate_current_game()
    }

    fn won_before_last(&self, rules: &ScoringRules) -> (u8, u8) {
        let mut won = (0, 0);
        for set in &self.sets[..self.sets.len() - 1] {
            match set.winner(rules.tiebreak_applies(won)) {
                Some(Side::One) => won.0 += 1,
                Some(Side::Two) => won.1 += 1,
                None => {}
            }
        }
        won
    }

    fn validate_current_set(&self, set: &SetScore, tiebreak_set: bool) -> EngineResult<()> {
        let (a, b) = (set.player1_games, set.player2_games);
        if tiebreak_set {
            if a > 6 || b > 6 {
                return Err(EngineError::CorruptState(format!("impossible set score {a}-{b}")));
            }
            if (a == 6 && b == 6) != self.is_tiebreak {
                return Err(EngineError::CorruptState(format!(
                    "tiebreak flag {} does not match set score {a}-{b}",
                    self.is_tiebreak
                )));
            }
        } else if self.is_tiebreak {
            return Err(EngineError::CorruptState(
                "tiebreak flagged in an advantage set".into(),
            ));
        }
        Ok(())
    }

    fn validate_current_game(&self) -> EngineResult<()> {
        let (a, b) = (self.current_game.player1, self.current_game.player2);
        let finished = if self.is_tiebreak {
            (a >= 7 || b >= 7) && a.abs_diff(b) >= 2
        } else {
            !matches!((a, b), (0..=3, 0..=3) | (4, 3) | (3, 4))
        };
        if finished {
            return Err(EngineError::CorruptState(format!(
                "game score {a}-{b} should already be over"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for TennisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sets: Vec<String> = self
            .sets
            .iter()
            .filter(|s| s.player1_games + s.player2_games > 0)
            .map(|s| format!("{}-{}", s.player1_games, s.player2_games))
            .collect();
        let (p1, p2) = self.current_game.labels(self.is_tiebreak);
        write!(f, "{} ({p1}-{p2})", sets.join(" "))
    }
}

/// Wire shape of a point-label pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct GameLabels {
    player1: String,
    player2: String,
}

/// Wire shape of [`TennisScore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScoreRecord {
    sets: Vec<SetScore>,
    current_game: GameLabels,
    server_id: Side,
    is_tiebreak: bool,
}

impl From<TennisScore> for ScoreRecord {
    fn from(score: TennisScore) -> Self {
        let (player1, player2) = score.current_game.labels(score.is_tiebreak);
        Self {
            sets: score.sets,
            current_game: GameLabels { player1, player2 },
            server_id: score.server,
            is_tiebreak: score.is_tiebreak,
        }
    }
}

impl TryFrom<ScoreRecord> for TennisScore {
    type Error = EngineError;

    fn try_from(record: ScoreRecord) -> Result<Self, Self::Error> {
        if record.sets.is_empty() {
            return Err(EngineError::CorruptState("score has no sets".into()));
        }
        let current_game = GamePoints::from_labels(
            &record.current_game.player1,
            &record.current_game.player2,
            record.is_tiebreak,
        )?;
        if !record.is_tiebreak && current_game.player1 == 4 && current_game.player2 == 4 {
            return Err(EngineError::CorruptState("both players on advantage".into()));
        }
        // Checks that hold under any scoring rules; the rest is `validate`.
        for set in &record.sets {
            let (a, b) = (set.player1_games, set.player2_games);
            let (high, low) = (a.max(b), a.min(b));
            if high > 6 && (low < 5 || high - low > 2) {
                return Err(EngineError::CorruptState(format!("impossible set score {a}-{b}")));
            }
        }
        let last = &record.sets[record.sets.len() - 1];
        if record.is_tiebreak && (last.player1_games, last.player2_games) != (6, 6) {
            return Err(EngineError::CorruptState("tiebreak outside a 6-6 set".into()));
        }
        let (p1, p2) = (current_game.player1, current_game.player2);
        if record.is_tiebreak && p1.max(p2) >= 7 && p1.abs_diff(p2) >= 2 {
            return Err(EngineError::CorruptState(format!("tiebreak {p1}-{p2} is already over")));
        }
        Ok(Self {
            sets: record.sets,
            current_game,
            server: record.server_id,
            is_tiebreak: record.is_tiebreak,
        })
    }
}

/// Kind of point, recorded as metadata only.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    #[default]
    #[serde(alias = "generic")]
    PointWon,
    Ace,
    Winner,
    DoubleFault,
    ForcedError,
    UnforcedError,
}

/// One awarded point.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointEvent {
    pub point_type: PointType,
    pub winner_id: PlayerId,
    pub timestamp: DateTime<Utc>,
}
