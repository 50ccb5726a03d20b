//! services/api/src/lib.rs
//!
//! The HTTP and WebSocket service of the tutor marketplace: storage adapters,
//! configuration and the axum web layer around `tutors_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
