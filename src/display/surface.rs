//! Chart surfaces and their mount points.
//!
//! A [`Surface`] is the rendering capability the engine draws into: one x
//! axis, one y axis and any number of line series, each backed by an
//! [`XyDataSeries`]. Surfaces live in a [`SurfaceRegistry`] keyed by
//! container id. The UI mounts a container when its widget is first laid
//! out; until then `create_surface` reports [`ScopeError::SurfaceNotReady`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eframe::egui::Color32;

use super::series::XyDataSeries;
use crate::error::{ScopeError, ScopeResult};

/// A numeric axis span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Which axis an [`AxisConfig`] applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisKind {
    X,
    Y,
}

/// Axis configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisConfig {
    /// Title drawn next to the axis.
    pub title: String,
    /// Currently visible span.
    pub visible_range: AxisRange,
    /// Whether the renderer may rescale the axis to fit the data.
    pub auto_range: bool,
}

impl AxisConfig {
    pub fn new(title: impl Into<String>, visible_range: AxisRange) -> Self {
        Self {
            title: title.into(),
            visible_range,
            auto_range: false,
        }
    }

    /// Time axis used by every display.
    pub fn time(visible_range: AxisRange) -> Self {
        Self::new("Time (s)", visible_range)
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::new("", AxisRange::new(0.0, 1.0))
    }
}

/// Line series styling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesConfig {
    pub stroke: Color32,
    pub stroke_thickness: f32,
}

impl SeriesConfig {
    pub fn new(stroke: Color32, stroke_thickness: f32) -> Self {
        Self {
            stroke,
            stroke_thickness,
        }
    }
}

/// Handle to a series on a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeriesId(usize);

/// A line series: styling plus its data buffer.
#[derive(Clone, Debug)]
pub struct Series {
    pub config: SeriesConfig,
    pub data: XyDataSeries,
}

/// A chart surface.
#[derive(Clone, Debug)]
pub struct Surface {
    id: String,
    x_axis: AxisConfig,
    y_axis: AxisConfig,
    series: Vec<Series>,
}

impl Surface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x_axis: AxisConfig::default(),
            y_axis: AxisConfig::default(),
            series: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Install the configuration for one axis.
    pub fn add_axis(&mut self, kind: AxisKind, config: AxisConfig) {
        match kind {
            AxisKind::X => self.x_axis = config,
            AxisKind::Y => self.y_axis = config,
        }
    }

    pub fn axis(&self, kind: AxisKind) -> &AxisConfig {
        match kind {
            AxisKind::X => &self.x_axis,
            AxisKind::Y => &self.y_axis,
        }
    }

    /// Move the visible x span, e.g. to follow a scrolling window.
    pub fn set_visible_x(&mut self, range: AxisRange) {
        self.x_axis.visible_range = range;
    }

    /// Add an empty line series and return its handle.
    pub fn add_series(&mut self, config: SeriesConfig) -> SeriesId {
        self.series.push(Series {
            config,
            data: XyDataSeries::new(),
        });
        SeriesId(self.series.len() - 1)
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn data(&self, id: SeriesId) -> ScopeResult<&XyDataSeries> {
        self.series
            .get(id.0)
            .map(|s| &s.data)
            .ok_or(ScopeError::UnknownSeries(id.0))
    }

    pub fn data_mut(&mut self, id: SeriesId) -> ScopeResult<&mut XyDataSeries> {
        self.series
            .get_mut(id.0)
            .map(|s| &mut s.data)
            .ok_or(ScopeError::UnknownSeries(id.0))
    }
}

/// A surface shared between the engine thread (writer) and the UI (reader).
#[derive(Clone, Debug)]
pub struct SharedSurface(Arc<Mutex<Surface>>);

impl SharedSurface {
    pub fn new(surface: Surface) -> Self {
        Self(Arc::new(Mutex::new(surface)))
    }

    /// Lock the surface. A panic on another holder does not leave the
    /// buffer unusable, so a poisoned lock is taken over.
    pub fn lock(&self) -> MutexGuard<'_, Surface> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ptr_eq(&self, other: &SharedSurface) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Mount points and their surfaces, keyed by container id.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    containers: Mutex<HashMap<String, Option<SharedSurface>>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn containers(&self) -> MutexGuard<'_, HashMap<String, Option<SharedSurface>>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a container id. Idempotent.
    pub fn mount(&self, id: &str) {
        let mut containers = self.containers();
        if !containers.contains_key(id) {
            tracing::debug!(container = id, "container mounted");
            containers.insert(id.to_string(), None);
        }
    }

    /// Remove a container and release its surface.
    pub fn unmount(&self, id: &str) {
        if self.containers().remove(id).is_some() {
            tracing::debug!(container = id, "container unmounted");
        }
    }

    pub fn is_mounted(&self, id: &str) -> bool {
        self.containers().contains_key(id)
    }

    /// Create the surface for a mounted container, or return the existing
    /// one. Fails with `SurfaceNotReady` while the container is missing.
    pub fn create_surface(&self, id: &str) -> ScopeResult<SharedSurface> {
        let mut containers = self.containers();
        let slot = containers
            .get_mut(id)
            .ok_or_else(|| ScopeError::SurfaceNotReady(id.to_string()))?;
        let surface = slot.get_or_insert_with(|| SharedSurface::new(Surface::new(id)));
        Ok(surface.clone())
    }

    /// The surface currently attached to a container, if any.
    pub fn surface(&self, id: &str) -> Option<SharedSurface> {
        self.containers().get(id).and_then(Clone::clone)
    }

    /// Drop the surface of a container but keep the container mounted.
    pub fn release(&self, id: &str) {
        if let Some(slot) = self.containers().get_mut(id) {
            if slot.take().is_some() {
                tracing::debug!(container = id, "surface released");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::series::DataSink;

    #[test]
    fn test_surface_axes_and_series() {
        let mut surface = Surface::new("scope");
        surface.add_axis(AxisKind::X, AxisConfig::time(AxisRange::new(0.0, 0.1)));
        surface.add_axis(AxisKind::Y, AxisConfig::new("Voltage (V)", AxisRange::new(-6.0, 6.0)));
        let id = surface.add_series(SeriesConfig::new(Color32::RED, 1.5));

        surface.data_mut(id).unwrap().append(0.0, 1.0);
        assert_eq!(surface.data(id).unwrap().len(), 1);
        assert_eq!(surface.axis(AxisKind::Y).visible_range, AxisRange::new(-6.0, 6.0));

        surface.set_visible_x(AxisRange::new(0.5, 0.6));
        assert_eq!(surface.axis(AxisKind::X).visible_range.min, 0.5);
        assert_eq!(surface.axis(AxisKind::X).title, "Time (s)");
    }

    #[test]
    fn test_unknown_series() {
        let mut other = Surface::new("other");
        other.add_series(SeriesConfig::new(Color32::RED, 1.0));
        let id = other.add_series(SeriesConfig::new(Color32::RED, 1.0));

        let surface = Surface::new("scope");
        assert!(matches!(surface.data(id), Err(ScopeError::UnknownSeries(1))));
    }

    #[test]
    fn test_registry_requires_mount() {
        let registry = SurfaceRegistry::new();
        assert!(matches!(
            registry.create_surface("scope"),
            Err(ScopeError::SurfaceNotReady(_))
        ));

        registry.mount("scope");
        let first = registry.create_surface("scope").unwrap();
        let second = registry.create_surface("scope").unwrap();
        assert!(first.ptr_eq(&second));
        assert!(registry.surface("scope").is_some());
    }

    #[test]
    fn test_registry_release_and_unmount() {
        let registry = SurfaceRegistry::new();
        registry.mount("scope");
        registry.create_surface("scope").unwrap();

        registry.release("scope");
        assert!(registry.is_mounted("scope"));
        assert!(registry.surface("scope").is_none());

        registry.unmount("scope");
        assert!(!registry.is_mounted("scope"));
    }
}
