//! Warehouse Finder - nearby warehouse matching and ranking
//!
//! This library resolves an origin postal code, narrows the facility
//! catalog with a great-circle prefilter, routes the survivors with
//! bounded concurrency, and returns them ordered by tier, driving time
//! and driving distance, each annotated with the fields it is missing.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{haversine, tier_rank, FindNearbyError, RankingEngine};
pub use crate::models::{CandidateFacility, Coordinate, DistanceResult, NearbyResult, RankedCandidate};
