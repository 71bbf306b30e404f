//! Domain model types: timestamps and bucket grids, session-count series,
//! building metadata, trajectories and overlap data.

pub mod building;
pub mod overlap;
pub mod series;
pub mod time;
pub mod trajectory;

pub use building::{BuildingData, Coordinates, LayerFeature};
pub use overlap::{OverlapData, OverlapInterval, OverlapTotal};
pub use series::{
    BucketedSeries, CumulativeSeries, ExposureSeries, LayerCounts, LayerMode, Layered,
    SeriesSummary, SessionRecord, EXPOSURE_SENTINEL,
};
pub use time::{TimeRange, Timestamp, TIMESTAMP_FORMAT};
pub use trajectory::{Trajectory, Waypoint, TRAIL_LENGTH};
