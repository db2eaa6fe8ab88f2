//! Display module
//!
//! The chart-surface capability the engine renders into: data sinks,
//! surfaces with axes and line series, mount points, and the readiness
//! future that waits for a surface to exist.

pub mod readiness;
pub mod series;
pub mod surface;

pub use readiness::{wait_for_surface, DEFAULT_POLL_INTERVAL};
pub use series::{DataSink, XyDataSeries};
pub use surface::{
    AxisConfig, AxisKind, AxisRange, Series, SeriesConfig, SeriesId, SharedSurface, Surface,
    SurfaceRegistry,
};
