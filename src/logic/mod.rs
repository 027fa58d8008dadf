//! Pure engine logic: seeding, bracket generation and advancement, completion, scoring, ratings.

mod advance;
mod bracket;
mod completion;
pub mod rating;
mod score;
mod seeding;

pub use advance::{advance_winner, resolve_bye};
pub use bracket::{bracket_size, generate_bracket, rounds_for};
pub use completion::{check_completion, round_robin_standings, set_majority, Completion, Standing};
pub use rating::RatingChange;
pub use score::{apply_point, PointOutcome};
pub use seeding::seed_participants;
