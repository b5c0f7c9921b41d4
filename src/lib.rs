pub mod api;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod inference;
pub mod reply;
