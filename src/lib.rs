pub mod app;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod output;
