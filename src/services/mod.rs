//! Service layer: series derivation and orchestration.
//!
//! The pure derivation services (bucketing, reduction, exposure, trajectory,
//! simulation) transform raw session records into the series the dashboard
//! renders. [`sync`] orchestrates refreshes against the data provider and
//! [`driver`] runs the playback ticker.

pub mod bucketing;

pub mod driver;

pub mod exposure;

pub mod playback;

pub mod reduce;

pub mod simulation;

pub mod sync;

pub mod trajectory;

pub mod view;

pub use bucketing::{bucket, cumulativize};
pub use driver::PlaybackDriver;
pub use exposure::{compute_exposure, ExposureViews};
pub use playback::{PlaybackClock, PlaybackPhase};
pub use reduce::reduce;
pub use simulation::{prepare_simulation, SimulationParams};
pub use sync::SyncEngine;
pub use trajectory::build_trajectory;
pub use view::{current_slice, DisplayMode};
