pub mod annotations;
pub mod config;
pub mod controller;
pub mod health;
pub mod observability;
pub mod server;
pub mod version;
pub mod warmup;
