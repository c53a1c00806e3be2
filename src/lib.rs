//! Pipe Monitor - sensor charting dashboard for instrumented pipes
//!
//! This library exposes the core modules for testing and reuse.

pub mod analyze;
pub mod common;
pub mod config;
pub mod domain;
pub mod error;
pub mod render;
pub mod routes;
pub mod session;
