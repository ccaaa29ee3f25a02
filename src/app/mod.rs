pub mod adb;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod scan;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod tools;
pub mod transfer;
