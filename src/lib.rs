pub mod app;
pub mod catalog;
pub mod constants;
pub mod engine;
pub mod leaderboard;
pub mod narrator;
pub mod rng;
pub mod rules;
pub mod server_protocol;
pub mod server_utils;
pub mod session;
pub mod session_store;
pub mod stats;
pub mod types;
