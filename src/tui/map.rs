//! Terminal map surface.
//!
//! The map is always centred on the pending coordinate. Scale follows the
//! slippy-map convention (a 256px tile spans 360/2^zoom degrees of longitude)
//! with one terminal cell taken as 8x16 px.

use crate::model::{Coordinate, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::view::{MarkerStyle, SessionView};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::canvas::{Canvas, Context, Line as CanvasLine, Map, MapResolution},
    widgets::{Block, Borders},
    Frame,
};

const TILE_PX: f64 = 256.0;
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// [west, east]
    pub lon: [f64; 2],
    /// [south, north]
    pub lat: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSurface {
    zoom: u8,
}

impl Default for MapSurface {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM)
    }
}

impl MapSurface {
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Returns false when already at the limit.
    pub fn zoom_in(&mut self) -> bool {
        if self.zoom < MAX_ZOOM {
            self.zoom += 1;
            true
        } else {
            false
        }
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.zoom > MIN_ZOOM {
            self.zoom -= 1;
            true
        } else {
            false
        }
    }

    fn degrees_per_px(&self) -> f64 {
        360.0 / (TILE_PX * 2f64.powi(self.zoom as i32))
    }

    /// Geographic extent of `inner` (the canvas area without borders).
    pub fn bounds(&self, center: Coordinate, inner: Rect) -> Bounds {
        let d = self.degrees_per_px();
        let half_w = inner.width as f64 * CELL_WIDTH_PX * d / 2.0;
        let half_h =
            inner.height as f64 * CELL_HEIGHT_PX * d * center.lat.to_radians().cos().abs() / 2.0;
        Bounds {
            lon: [center.lon - half_w, center.lon + half_w],
            lat: [center.lat - half_h, center.lat + half_h],
        }
    }

    /// Coordinate under the middle of terminal cell (`column`, `row`), or None
    /// when the cell lies outside `inner`.
    pub fn coordinate_at(
        &self,
        center: Coordinate,
        inner: Rect,
        column: u16,
        row: u16,
    ) -> Option<Coordinate> {
        let inside = column >= inner.x
            && column < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        if !inside {
            return None;
        }
        let b = self.bounds(center, inner);
        let fx = ((column - inner.x) as f64 + 0.5) / inner.width as f64;
        let fy = ((row - inner.y) as f64 + 0.5) / inner.height as f64;
        Some(clamped(Coordinate::new(
            b.lat[1] - fy * (b.lat[1] - b.lat[0]),
            b.lon[0] + fx * (b.lon[1] - b.lon[0]),
        )))
    }

    /// The point one cell away from `center` in direction (`dx`, `dy`);
    /// positive `dy` is south, matching screen rows.
    pub fn step(&self, center: Coordinate, inner: Rect, dx: i32, dy: i32) -> Coordinate {
        let b = self.bounds(center, inner);
        let cell_lon = (b.lon[1] - b.lon[0]) / inner.width.max(1) as f64;
        let cell_lat = (b.lat[1] - b.lat[0]) / inner.height.max(1) as f64;
        clamped(Coordinate::new(
            center.lat - dy as f64 * cell_lat,
            center.lon + dx as f64 * cell_lon,
        ))
    }
}

fn clamped(c: Coordinate) -> Coordinate {
    Coordinate::new(c.lat.clamp(-90.0, 90.0), c.lon.clamp(-180.0, 180.0)).rounded(6)
}

/// Round grid spacing (1, 2 or 5 times a power of ten) giving about four lines.
fn grid_step(span: f64) -> f64 {
    let raw = span / 4.0;
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm < 1.5 {
        1.0
    } else if norm < 3.5 {
        2.0
    } else if norm < 7.5 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn draw_line(ctx: &mut Context, x1: f64, y1: f64, x2: f64, y2: f64, color: Color) {
    ctx.draw(&CanvasLine {
        x1,
        y1,
        x2,
        y2,
        color,
    });
}

fn draw_graticule(ctx: &mut Context, b: &Bounds) {
    let step = grid_step(b.lon[1] - b.lon[0]);
    let mut lon = (b.lon[0] / step).ceil() * step;
    while lon < b.lon[1] {
        draw_line(ctx, lon, b.lat[0], lon, b.lat[1], Color::DarkGray);
        lon += step;
    }
    let mut lat = (b.lat[0] / step).ceil() * step;
    while lat < b.lat[1] {
        draw_line(ctx, b.lon[0], lat, b.lon[1], lat, Color::DarkGray);
        lat += step;
    }
}

pub fn draw_map(f: &mut Frame, area: Rect, view: &SessionView, surface: &MapSurface) {
    let block = Block::default().borders(Borders::ALL).title(Line::from(vec![
        Span::raw("Map (zoom "),
        Span::styled(
            surface.zoom().to_string(),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(")  "),
        Span::styled("◎", Style::default().fg(Color::Cyan)),
        Span::raw(" selected  "),
        Span::styled("●", Style::default().fg(Color::Red)),
        Span::raw(" saved"),
    ]));
    let inner = block.inner(area);
    let b = surface.bounds(view.pending, inner);

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds(b.lon)
        .y_bounds(b.lat)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::Gray,
            });
            draw_graticule(ctx, &b);
            ctx.layer();

            for m in view.markers.iter().filter(|m| m.style == MarkerStyle::Saved) {
                ctx.print(
                    m.coordinate.lon,
                    m.coordinate.lat,
                    Line::from(vec![
                        Span::styled("●", Style::default().fg(Color::Red)),
                        Span::styled(format!(" {}", m.label), Style::default().fg(Color::White)),
                    ]),
                );
            }
            // Pending last so it stays visible on top of a saved marker.
            for m in view.markers.iter().filter(|m| m.style == MarkerStyle::Pending) {
                ctx.print(
                    m.coordinate.lon,
                    m.coordinate.lat,
                    Span::styled(
                        "◎",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });
    f.render_widget(canvas, area);
}
