//! Oscilloscope display widget for chart surfaces.
//!
//! Draws one [`Surface`]: dark background, grid with graticules, every
//! line series mapped through the surface's visible x/y ranges, and the
//! axis titles and range labels.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

use crate::app::theme;
use crate::display::{AxisKind, AxisRange, Surface};

/// Configuration for the oscilloscope display widget.
#[derive(Clone)]
pub struct OscilloscopeConfig {
    /// Size of the display (width x height).
    pub size: Vec2,
    /// Whether to show glow effect.
    pub glow: bool,
    /// Number of grid divisions.
    pub grid_divisions: usize,
    /// Whether to draw axis titles and range labels.
    pub show_labels: bool,
}

impl Default for OscilloscopeConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(600.0, 250.0),
            glow: true,
            grid_divisions: 10,
            show_labels: true,
        }
    }
}

impl OscilloscopeConfig {
    /// Create a new oscilloscope config with the specified size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Default::default()
        }
    }
}

/// Draw a surface. An absent surface (container mounted, engine not ready
/// yet) draws the empty graticule.
pub fn oscilloscope_display(
    ui: &mut Ui,
    title: &str,
    surface: Option<&Surface>,
    config: &OscilloscopeConfig,
) -> Response {
    let (rect, response) = ui.allocate_exact_size(config.size, Sense::hover());

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        let plot = plot_area(rect, config);

        painter.rect_filled(rect, theme::ROUNDING_SMALL, theme::scope::BACKGROUND);
        draw_grid(painter, plot, config);

        if let Some(surface) = surface {
            let x_range = surface.axis(AxisKind::X).visible_range;
            let y_range = surface.axis(AxisKind::Y).visible_range;
            let columns = plot.width().max(1.0) as usize;

            let clipped = painter.with_clip_rect(plot);
            for series in surface.series() {
                let points = decimate(
                    series.data.x_values(),
                    series.data.y_values(),
                    x_range,
                    columns,
                );
                let screen: Vec<Pos2> = points
                    .into_iter()
                    .map(|(x, y)| to_screen(x, y, x_range, y_range, plot))
                    .collect();
                draw_trace(
                    &clipped,
                    screen,
                    series.config.stroke,
                    series.config.stroke_thickness,
                    config.glow,
                );
            }

            if config.show_labels {
                draw_labels(painter, rect, plot, surface);
            }
        }

        painter.text(
            rect.left_top() + Vec2::new(8.0, 6.0),
            Align2::LEFT_TOP,
            title,
            FontId::proportional(13.0),
            theme::scope::LABEL,
        );

        painter.rect_stroke(
            rect,
            theme::ROUNDING_SMALL,
            Stroke::new(1.0, Color32::from_rgb(60, 65, 80)),
        );
    }

    response
}

/// Inner rectangle the traces are drawn in, leaving room for labels.
fn plot_area(rect: Rect, config: &OscilloscopeConfig) -> Rect {
    if config.show_labels {
        Rect::from_min_max(
            rect.left_top() + Vec2::new(44.0, 24.0),
            rect.right_bottom() - Vec2::new(10.0, 28.0),
        )
    } else {
        rect.shrink(4.0)
    }
}

fn draw_grid(painter: &egui::Painter, rect: Rect, config: &OscilloscopeConfig) {
    let grid_color = Color32::from_rgba_unmultiplied(120, 120, 140, 35);
    let major_grid_color = Color32::from_rgba_unmultiplied(120, 120, 140, 70);
    let divisions = config.grid_divisions.max(1);

    for i in 1..divisions {
        let t = i as f32 / divisions as f32;
        let color = if i * 2 == divisions {
            major_grid_color
        } else {
            grid_color
        };

        let x = rect.left() + rect.width() * t;
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(0.5, color),
        );

        let y = rect.top() + rect.height() * t;
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(0.5, color),
        );
    }

    painter.rect_stroke(rect, 0.0, Stroke::new(0.5, major_grid_color));
}

fn draw_labels(painter: &egui::Painter, rect: Rect, plot: Rect, surface: &Surface) {
    let font = FontId::proportional(10.0);
    let color = theme::scope::LABEL;
    let x_axis = surface.axis(AxisKind::X);
    let y_axis = surface.axis(AxisKind::Y);

    painter.text(
        Pos2::new(plot.left(), plot.bottom() + 4.0),
        Align2::LEFT_TOP,
        format_tick(x_axis.visible_range.min),
        font.clone(),
        color,
    );
    painter.text(
        Pos2::new(plot.right(), plot.bottom() + 4.0),
        Align2::RIGHT_TOP,
        format_tick(x_axis.visible_range.max),
        font.clone(),
        color,
    );
    painter.text(
        Pos2::new(plot.center().x, rect.bottom() - 4.0),
        Align2::CENTER_BOTTOM,
        &x_axis.title,
        font.clone(),
        color,
    );

    painter.text(
        Pos2::new(plot.left() - 4.0, plot.top()),
        Align2::RIGHT_TOP,
        format_tick(y_axis.visible_range.max),
        font.clone(),
        color,
    );
    painter.text(
        Pos2::new(plot.left() - 4.0, plot.bottom()),
        Align2::RIGHT_BOTTOM,
        format_tick(y_axis.visible_range.min),
        font.clone(),
        color,
    );
    painter.text(
        Pos2::new(rect.left() + 4.0, plot.center().y),
        Align2::LEFT_CENTER,
        &y_axis.title,
        font,
        color,
    );
}

/// Short label for an axis bound.
fn format_tick(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() < 0.01 || value.abs() >= 1000.0 {
        format!("{:.2e}", value)
    } else {
        format!("{:.3}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Map a data point into the plot rectangle.
fn to_screen(x: f64, y: f64, x_range: AxisRange, y_range: AxisRange, plot: Rect) -> Pos2 {
    let x_span = x_range.span();
    let y_span = y_range.span();
    let tx = if x_span > 0.0 {
        (x - x_range.min) / x_span
    } else {
        0.0
    };
    let ty = if y_span > 0.0 {
        (y - y_range.min) / y_span
    } else {
        0.5
    };
    Pos2::new(
        plot.left() + tx as f32 * plot.width(),
        plot.bottom() - ty as f32 * plot.height(),
    )
}

/// Reduce a series to at most two points per pixel column, keeping each
/// column's minimum and maximum so peaks stay visible.
///
/// Short series are returned unchanged.
fn decimate(xs: &[f64], ys: &[f64], x_range: AxisRange, columns: usize) -> Vec<(f64, f64)> {
    let len = xs.len().min(ys.len());
    if len <= columns.saturating_mul(2) || columns == 0 || x_range.span() <= 0.0 {
        return xs.iter().copied().zip(ys.iter().copied()).take(len).collect();
    }

    let column_of = |x: f64| -> usize {
        let t = (x - x_range.min) / x_range.span();
        (t * columns as f64).floor().clamp(0.0, (columns - 1) as f64) as usize
    };

    let mut out = Vec::with_capacity(columns * 2);
    let mut start = 0;
    while start < len {
        let column = column_of(xs[start]);
        let mut end = start + 1;
        while end < len && column_of(xs[end]) == column {
            end += 1;
        }

        let (mut min_i, mut max_i) = (start, start);
        for i in start..end {
            if ys[i] < ys[min_i] {
                min_i = i;
            }
            if ys[i] > ys[max_i] {
                max_i = i;
            }
        }
        // Keep time order inside the column.
        let (first, second) = if min_i <= max_i {
            (min_i, max_i)
        } else {
            (max_i, min_i)
        };
        out.push((xs[first], ys[first]));
        if second != first {
            out.push((xs[second], ys[second]));
        }
        start = end;
    }
    out
}

/// Draw a single trace.
fn draw_trace(
    painter: &egui::Painter,
    points: Vec<Pos2>,
    color: Color32,
    thickness: f32,
    glow: bool,
) {
    if points.len() < 2 {
        return;
    }

    // Glow: wider, semi-transparent line underneath
    if glow {
        let glow_color = Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), 40);
        painter.add(egui::Shape::line(
            points.clone(),
            Stroke::new(thickness * 3.0, glow_color),
        ));
    }

    painter.add(egui::Shape::line(points, Stroke::new(thickness, color)));
}
