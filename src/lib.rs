pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod enrollment;
pub mod error;
pub mod fixture;
pub mod handlers;
pub mod middleware;
