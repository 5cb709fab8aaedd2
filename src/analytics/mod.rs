pub mod dispersion;
pub mod extractor;
pub mod frequency;
pub mod season_stats;

pub use dispersion::{mean, stddev};
pub use extractor::values;
pub use frequency::frequency;
pub use season_stats::season_stats;
