//! Sport → Event → Selection catalog.
//!
//! Writes go through the repositories in [`catalog`], which keep the derived
//! `active` flags of events and sports consistent inside the same transaction.
//! List reads compile their query-string filters with [`filter::compile`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod slug;
pub mod types;
