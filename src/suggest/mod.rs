pub mod engine;

pub use engine::suggest;
