pub mod auth;
pub mod config;
pub mod curriculum;
pub mod history;
pub mod learn;
pub mod topics;
