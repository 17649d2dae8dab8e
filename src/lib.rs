//! Echo Web Marketing Site API Library
//!
//! This library provides the core functionality for the Echo Web agency
//! site's backend: lead-capture intake, bot-check verification, gated
//! resource access, and the third-party relays (EmailJS, Turnstile).
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `data`: Data access layer.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `emailjs`: Email-delivery provider client.
//! - `errors`: Error handling types.
//! - `form`: Form collection and boundary validation.
//! - `gate`: Gated-resource access tokens.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `relay`: Dual-channel submission relayer.
//! - `storage`: Lead storage operations.
//! - `turnstile`: Bot-verification service client.

pub mod api;
pub mod core;
pub mod data;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod emailjs;
pub mod errors;
pub mod form;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod storage;
pub mod turnstile;
