pub mod config;
pub mod errors;
pub mod models;
pub mod plugins;
pub mod services;
pub mod utils;
