//! # CampusTrace Engine
//!
//! Time-series derivation and playback engine for a campus occupancy
//! dashboard.
//!
//! The engine ingests raw per-location session counts from an upstream
//! occupancy service and derives everything an interactive map needs:
//! interval-bucketed series over a fixed inclusive time grid, cumulative
//! overlays, total/average summaries, per-user contact exposure, movement
//! trajectories with trailing history, session-overlap contact lists and
//! outbreak-simulation series. A freshness state machine tracks which
//! derived entities are stale relative to the analysis range and user
//! selection, and a playback clock animates the time cursor across the grid.
//!
//! ## Architecture
//!
//! - [`models`]: timestamps, ranges, series, buildings, trajectories
//! - [`state`]: the authoritative [`DataBank`](state::DataBank) store and
//!   per-entity freshness tracking
//! - [`services`]: derivation algorithms, the sync orchestrator and the
//!   playback driver
//! - [`source`]: the upstream [`DataProvider`](source::DataProvider) trait
//!   and its local fixture implementation
//! - [`http`]: Axum-based REST surface for the frontend
//!
//! All derivation is pure and bucket-grid aligned: the grid spans the
//! analysis range inclusively on both ends, so derived series always cover
//! the same set of timestamps regardless of where records fall.

pub mod error;

pub mod models;

pub mod services;

pub mod source;

pub mod state;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{EngineError, EngineResult};
