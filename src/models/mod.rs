pub mod cache;
pub mod clock;
pub mod grid;
pub mod record;
