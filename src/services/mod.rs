pub mod aggregator;
pub mod board_service;
