pub mod daily_picks;

pub use daily_picks::rank;
