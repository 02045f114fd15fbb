//! PR Reviewer - pull request reviewer assignment and lifecycle service.
//!
//! Reviewers are drawn at random from the author's team, pull requests move
//! from `OPEN` to `MERGED` exactly once, and assignment statistics are
//! derived from stored pull requests on every query.

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod store;
