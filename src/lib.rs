pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use config::AppConfig;
pub use error::{BoardError, BoardResult};
pub use services::board_service::BoardService;
