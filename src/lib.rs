pub mod config;
pub mod console;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
