pub mod access;
pub mod cancel;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod journal;
pub mod outcome;
pub mod record;
pub mod utils;
pub mod views;
pub mod wire;
pub mod workflow;
