//! Tariff resolution and pricing formula engine for freight billing.
//!
//! Given a route, a client, a unit type and a billing date, this crate selects
//! the applicable time-versioned tariff record, interprets the client's pricing
//! formula and computes a rounded monetary breakdown.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod formula;
pub mod models;
