//! Data models for deployments

pub mod config;
pub mod record;
