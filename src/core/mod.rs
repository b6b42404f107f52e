pub mod config;
pub mod events;
pub mod hub;
pub mod models;
pub mod service;
pub mod status;
pub mod validation;
