//! Ripple - blast radius analysis and coordinated package rollouts.
//!
//! This crate provides both a CLI application and a library for planning and
//! executing an update of one shared package across many independently
//! versioned repositories.
//!
//! The library is organised leaves-first:
//!
//! - [`graph`]: the read-only dependency graph (nodes and edges) maintained by
//!   an external ingestion pipeline
//! - [`analysis`]: blast radius computation and risk scoring
//! - [`planner`]: builds update plans and materializes execution units
//! - [`executor`]: drives a plan's units to completion, one at a time
//! - [`storage`]: persistence for plans and their execution units
//! - [`service`]: the operator-facing facade tying the pieces together

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod analysis;
pub mod domain;
pub mod error;
pub mod executor;
pub mod graph;
pub mod id_generation;
pub mod planner;
pub mod service;
pub mod storage;

// Public CLI module (needed by binary)
pub mod app;
pub mod cli;
pub mod output;

// Command implementations
pub mod commands;

// Internal modules (not exposed as public API)
pub(crate) mod jsonl;
