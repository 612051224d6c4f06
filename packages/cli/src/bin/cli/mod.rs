pub mod auth;
pub mod catalog;
pub mod config;
pub mod library;
pub mod player;
