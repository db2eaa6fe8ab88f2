//! The displays the engine drives and how each one is laid out.
//!
//! Scrolling displays regenerate their samples every tick; static displays
//! show the leading part of a backend response.

use crate::config::ScopeConfig;
use crate::display::{
    AxisConfig, AxisKind, AxisRange, DataSink, SeriesConfig, SeriesId, SharedSurface, Surface,
};
use crate::dsp::{clip, expand, DigitalSample, SampleSequence};
use crate::error::ScopeResult;

/// Trace colours.
pub mod trace_colors {
    use egui::Color32;

    pub const CARRIER: Color32 = Color32::from_rgb(0xFF, 0x57, 0x22);
    pub const MODULATING: Color32 = Color32::from_rgb(0x21, 0x96, 0xF3);
    pub const MODULATED: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);
    pub const DIGITAL: Color32 = Color32::from_rgb(0xF4, 0x43, 0x36);
}

/// Every display the engine knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayId {
    /// Scrolling carrier oscilloscope.
    Carrier,
    /// Scrolling modulating-signal oscilloscope.
    Modulating,
    /// AM/FM/PM result.
    AnalogModulated,
    /// Carrier returned with a digital response.
    DigitalCarrier,
    /// Bit stream drawn as square steps.
    DigitalBits,
    /// ASK/FSK/PSK result.
    DigitalModulated,
}

impl DisplayId {
    pub const ALL: [DisplayId; 6] = [
        DisplayId::Carrier,
        DisplayId::Modulating,
        DisplayId::AnalogModulated,
        DisplayId::DigitalCarrier,
        DisplayId::DigitalBits,
        DisplayId::DigitalModulated,
    ];

    /// Displays on the analog page.
    pub const ANALOG: [DisplayId; 3] = [
        DisplayId::Carrier,
        DisplayId::Modulating,
        DisplayId::AnalogModulated,
    ];

    /// Displays on the digital page.
    pub const DIGITAL: [DisplayId; 3] = [
        DisplayId::DigitalCarrier,
        DisplayId::DigitalBits,
        DisplayId::DigitalModulated,
    ];

    /// Mount-point id of the display's container.
    pub fn container_id(&self) -> &'static str {
        match self {
            DisplayId::Carrier => "carrier-oscilloscope",
            DisplayId::Modulating => "modulating-oscilloscope",
            DisplayId::AnalogModulated => "modulated-signal-chart",
            DisplayId::DigitalCarrier => "digital-carrier-chart",
            DisplayId::DigitalBits => "digital-bits-chart",
            DisplayId::DigitalModulated => "digital-modulated-chart",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DisplayId::Carrier => "Carrier",
            DisplayId::Modulating => "Modulating Signal",
            DisplayId::AnalogModulated => "Modulated Signal",
            DisplayId::DigitalCarrier => "Carrier",
            DisplayId::DigitalBits => "Digital Signal",
            DisplayId::DigitalModulated => "Modulated Signal",
        }
    }

    /// Whether the display is driven by a scroll controller.
    pub fn is_scrolling(&self) -> bool {
        matches!(self, DisplayId::Carrier | DisplayId::Modulating)
    }

    pub fn layout(&self, config: &ScopeConfig) -> DisplayLayout {
        let (x_max, y_range, y_title, stroke) = match self {
            DisplayId::Carrier => (
                config.scroll.window_duration,
                AxisRange::new(-6.0, 6.0),
                "Voltage (V)",
                trace_colors::CARRIER,
            ),
            DisplayId::Modulating => (
                config.scroll.window_duration,
                AxisRange::new(-6.0, 6.0),
                "Voltage (V)",
                trace_colors::MODULATING,
            ),
            DisplayId::AnalogModulated => (
                config.display.analog_x_max,
                AxisRange::new(-8.0, 8.0),
                "Amplitude",
                trace_colors::MODULATED,
            ),
            DisplayId::DigitalCarrier | DisplayId::DigitalModulated => (
                config.display.digital_x_max,
                AxisRange::new(-8.0, 8.0),
                "Amplitude",
                trace_colors::MODULATED,
            ),
            DisplayId::DigitalBits => (
                config.display.digital_x_max,
                AxisRange::new(-0.1, 1.1),
                "Amplitude",
                trace_colors::DIGITAL,
            ),
        };
        DisplayLayout {
            x_axis: AxisConfig::time(AxisRange::new(0.0, x_max)),
            y_axis: AxisConfig::new(y_title, y_range),
            series: SeriesConfig::new(stroke, 2.0),
        }
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.container_id())
    }
}

/// Axes and series styling of one display.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayLayout {
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub series: SeriesConfig,
}

impl DisplayLayout {
    /// Reset `surface` to this layout and return its single series.
    pub fn apply(&self, surface: &SharedSurface) -> SeriesId {
        let mut surface = surface.lock();
        let id = surface.id().to_string();
        *surface = Surface::new(id);
        surface.add_axis(AxisKind::X, self.x_axis.clone());
        surface.add_axis(AxisKind::Y, self.y_axis.clone());
        surface.add_series(self.series)
    }
}

/// Replace a series with the part of `samples` that lies before `x_max`.
///
/// Empty input leaves the buffer untouched. Returns whether the buffer was
/// replaced.
pub fn render_clipped(
    surface: &SharedSurface,
    series: SeriesId,
    samples: &SampleSequence,
    x_max: f64,
) -> ScopeResult<bool> {
    if samples.is_empty() {
        return Ok(false);
    }
    let visible = clip(samples.view(), x_max);

    let mut surface = surface.lock();
    let data = surface.data_mut(series)?;
    data.clear();
    data.append_range(visible.times(), visible.values());
    Ok(true)
}

/// Replace a series with `samples` drawn as square steps.
///
/// Empty input leaves the buffer untouched.
pub fn render_steps(
    surface: &SharedSurface,
    series: SeriesId,
    samples: &[DigitalSample],
) -> ScopeResult<bool> {
    if samples.is_empty() {
        return Ok(false);
    }
    let steps = expand(samples);

    let mut surface = surface.lock();
    let data = surface.data_mut(series)?;
    data.clear();
    data.append_range(steps.times(), steps.values());
    Ok(true)
}
