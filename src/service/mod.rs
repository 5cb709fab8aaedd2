pub mod daily_lines;
pub mod players;

pub use daily_lines::DailyLineService;
pub use players::PlayerService;
