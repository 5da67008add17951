pub mod agent;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod packaging;
pub mod utils;
