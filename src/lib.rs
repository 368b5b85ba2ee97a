//! Election results dashboard backend.
//!
//! Vote tallies are read from a SQLite store, summarized per region, candidate
//! and polling station, and served over HTTP behind a time-boxed cache that
//! keeps serving the last good answer while the store is unreachable.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod results;
