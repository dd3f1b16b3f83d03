//! Shared LLM plumbing: provider configs, chat/embedding clients, health probes.
//!
//! The service answers through two profiles:
//! - **chat**: refines a retrieved FAQ answer into a direct reply
//! - **embedding**: turns FAQ entries and user questions into vectors
//!
//! Build both with [`config::default_config`] and share a single
//! [`service_profiles::LlmServiceProfiles`] behind an `Arc`.

pub mod chat_message;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;
