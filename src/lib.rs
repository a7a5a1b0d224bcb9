//! wishsync - Incremental importer for gacha wish history
//!
//! This crate provides the core functionality for the `wishsync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (User, Wish, BannerType)
//! - [`provider`] - Remote wish history API (identity lookup, paged gacha log)
//! - [`storage`] - SQLite database layer
//! - [`sync`] - Incremental import and history queries
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
