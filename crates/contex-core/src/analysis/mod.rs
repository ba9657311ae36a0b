//! Gap analysis and completeness scoring over the final field map.

pub mod gaps;
pub mod score;

pub use gaps::GapAnalyzer;
pub use score::ScoreCalculator;
