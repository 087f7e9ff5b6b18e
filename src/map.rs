// This module draws delivery areas over a Web-Mercator map and turns clicks into coordinates

use std::f64::consts::PI;

use anyhow::{anyhow, bail};
use egui::{
    epaint::Mesh, Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2,
};
use lyon::{
    math::point,
    path::Path,
    tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers},
};
use serde::{Deserialize, Serialize};

use crate::{
    area::{HexColor, LatLng},
    modal::{Overlay, AREA_FILL_OPACITY, REFERENCE_OPACITY},
};

/// The store the delivery areas are drawn around.
pub const ANCHOR: LatLng = LatLng::new(-23.5505, -46.6333);

const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 19.0;
// Web-Mercator is undefined at the poles
const MAX_LAT: f64 = 85.051_128_78;

const BACKGROUND: Color32 = Color32::from_rgb(233, 230, 223);
const GRID: Color32 = Color32::from_rgb(205, 201, 192);
const TEXT: Color32 = Color32::from_rgb(60, 60, 60);

/// Position on the unit square, (0, 0) being the north-west corner of the world.
fn world(p: LatLng) -> (f64, f64) {
    let lat = p.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (p.lng + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn unworld(x: f64, y: f64) -> LatLng {
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLng::new(lat, x * 360.0 - 180.0)
}

/// Which part of the world is visible. Persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: ANCHOR,
            zoom: 12.0,
        }
    }
}

impl MapView {
    /// Centred on the middle of `points`, or on the store when there are none.
    pub fn around(points: &[LatLng]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let n = points.len() as f64;
        let (lat, lng) = points
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        Self {
            center: LatLng::new(lat / n, lng / n),
            ..Default::default()
        }
    }

    /// Pixels across the whole world at the current zoom.
    fn scale(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    pub fn to_screen(&self, rect: Rect, p: LatLng) -> Pos2 {
        let (x, y) = world(p);
        let (cx, cy) = world(self.center);
        let s = self.scale();
        rect.center() + Vec2::new(((x - cx) * s) as f32, ((y - cy) * s) as f32)
    }

    pub fn to_lat_lng(&self, rect: Rect, pos: Pos2) -> LatLng {
        let d = pos - rect.center();
        let (cx, cy) = world(self.center);
        let s = self.scale();
        unworld(cx + d.x as f64 / s, cy + d.y as f64 / s)
    }

    /// Moves the map along with the pointer.
    pub fn pan(&mut self, delta: Vec2) {
        let (cx, cy) = world(self.center);
        let s = self.scale();
        let x = (cx - delta.x as f64 / s).rem_euclid(1.0);
        let y = (cy - delta.y as f64 / s).clamp(0.0, 1.0);
        self.center = unworld(x, y);
    }

    /// Zooms by `steps` levels while keeping the coordinate under `pos` in place.
    pub fn zoom_at(&mut self, rect: Rect, pos: Pos2, steps: f64) {
        let target = self.to_lat_lng(rect, pos);
        self.zoom = (self.zoom + steps).clamp(MIN_ZOOM, MAX_ZOOM);
        let moved = self.to_screen(rect, target);
        self.pan(pos - moved);
    }

    /// Degrees between grid lines, roughly `min_px` pixels apart.
    fn grid_spacing(&self, min_px: f64) -> f64 {
        let px_per_degree = self.scale() / 360.0;
        [
            0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 45.0,
        ]
        .into_iter()
        .find(|step| step * px_per_degree >= min_px)
        .unwrap_or(90.0)
    }
}

/// Draws the map and its overlays. Returns where the map was clicked, if it was.
pub fn ui(
    ui: &mut Ui,
    size: Vec2,
    view: &mut MapView,
    overlays: &[Overlay<'_>],
    drawing: bool,
) -> Option<LatLng> {
    let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
    let rect = response.rect;

    if response.dragged() {
        view.pan(response.drag_delta());
    }
    if let Some(pos) = response.hover_pos() {
        let steps = ui.input(|i| i.scroll_delta.y as f64 / 120.0 + (i.zoom_delta() as f64).log2());
        if steps != 0.0 {
            view.zoom_at(rect, pos, steps);
        }
    }

    painter.rect_filled(rect, 0.0, BACKGROUND);
    paint_grid(&painter, rect, view);

    for overlay in overlays {
        paint_overlay(&painter, rect, view, overlay);
    }

    let anchor = view.to_screen(rect, ANCHOR);
    painter.circle(anchor, 7.0, Color32::from_rgb(220, 50, 47), Stroke::new(2.0, Color32::WHITE));
    painter.text(
        anchor - Vec2::new(0.0, 9.0),
        Align2::CENTER_BOTTOM,
        "Store",
        FontId::proportional(13.0),
        TEXT,
    );

    if let Some(pos) = response.hover_pos() {
        painter.text(
            rect.left_bottom() + Vec2::new(6.0, -6.0),
            Align2::LEFT_BOTTOM,
            view.to_lat_lng(rect, pos).to_string(),
            FontId::monospace(12.0),
            TEXT,
        );
    }

    let clicked = if response.clicked() {
        response.interact_pointer_pos().map(|pos| view.to_lat_lng(rect, pos))
    } else {
        None
    };

    if drawing {
        response.on_hover_cursor(CursorIcon::Crosshair);
    } else if response.dragged() {
        response.on_hover_cursor(CursorIcon::Grabbing);
    }

    clicked
}

// stands in for a tile basemap
fn paint_grid(painter: &egui::Painter, rect: Rect, view: &MapView) {
    let step = view.grid_spacing(80.0);
    let north_west = view.to_lat_lng(rect, rect.left_top());
    let south_east = view.to_lat_lng(rect, rect.right_bottom());
    let stroke = Stroke::new(1.0, GRID);

    let mut lng = (north_west.lng / step).floor() * step;
    while lng <= south_east.lng {
        let x = view.to_screen(rect, LatLng::new(view.center.lat, lng)).x;
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        lng += step;
    }

    let mut lat = (south_east.lat / step).floor() * step;
    while lat <= north_west.lat {
        let y = view.to_screen(rect, LatLng::new(lat, view.center.lng)).y;
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        lat += step;
    }
}

fn with_opacity(color: HexColor, opacity: f32) -> Color32 {
    let [r, g, b] = color.0;
    Color32::from_rgba_unmultiplied(r, g, b, (opacity * 255.0).round() as u8)
}

fn paint_overlay(painter: &egui::Painter, rect: Rect, view: &MapView, overlay: &Overlay<'_>) {
    let screen = |points: &[LatLng]| -> Vec<Pos2> {
        points.iter().map(|p| view.to_screen(rect, *p)).collect()
    };

    match *overlay {
        Overlay::Area { points, color } => {
            let points = screen(points);
            painter.add(fill_polygon(&points, with_opacity(color, AREA_FILL_OPACITY)));
            painter.add(Shape::closed_line(points, Stroke::new(2.0, color.to_color32())));
        }
        Overlay::Reference { points, color } => {
            let mut points = screen(points);
            painter.add(fill_polygon(&points, with_opacity(color, REFERENCE_OPACITY)));
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
            painter.extend(Shape::dashed_line(
                &points,
                Stroke::new(1.5, with_opacity(color, 0.5)),
                6.0,
                4.0,
            ));
        }
        Overlay::Draft { points, color, closed } => {
            let points = screen(points);
            let stroke = Stroke::new(2.0, color.to_color32());
            if closed {
                painter.add(fill_polygon(&points, with_opacity(color, AREA_FILL_OPACITY)));
                painter.add(Shape::closed_line(points.clone(), stroke));
            } else {
                painter.add(Shape::line(points.clone(), stroke));
            }
            for p in points {
                painter.circle(p, 4.0, Color32::WHITE, stroke);
            }
        }
    }
}

/// Fills the outline with the non-zero rule, so concave shapes, repeated
/// clicks and self-intersections all fill the way they are drawn.
fn fill_polygon(points: &[Pos2], color: Color32) -> Shape {
    match tessellate(points) {
        Ok(buffers) => {
            let mut mesh = Mesh::default();
            for p in buffers.vertices {
                mesh.colored_vertex(p, color);
            }
            mesh.indices = buffers.indices;
            Shape::mesh(mesh)
        }
        // callers always stroke the outline, so the area stays visible unfilled
        Err(e) => {
            log::debug!("Not filling polygon: {e:#}");
            Shape::Noop
        }
    }
}

pub fn tessellate(points: &[Pos2]) -> anyhow::Result<VertexBuffers<Pos2, u32>> {
    let [first, rest @ ..] = points else {
        bail!("Cannot fill an empty outline");
    };

    let mut builder = Path::builder();
    builder.begin(point(first.x, first.y));
    for p in rest {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(true);
    let path = builder.build();

    let mut buffers: VertexBuffers<Pos2, u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::non_zero(),
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex<'_>| {
                let p = v.position();
                Pos2::new(p.x, p.y)
            }),
        )
        .map_err(|e| anyhow!("Failed to tessellate outline: {e:?}"))?;

    Ok(buffers)
}

#[cfg(test)]
mod tests {
    use egui::{Pos2, Rect, Vec2};
    use lyon::tessellation::VertexBuffers;

    use crate::area::LatLng;

    use super::{tessellate, MapView, ANCHOR};

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(800.0, 600.0))
    }

    fn close(a: LatLng, b: LatLng) -> bool {
        (a.lat - b.lat).abs() < 1e-4 && (a.lng - b.lng).abs() < 1e-4
    }

    #[test]
    fn test_center_is_middle_of_rect() {
        let view = MapView::default();
        assert_eq!(view.to_screen(rect(), ANCHOR), rect().center());
        assert!(close(view.to_lat_lng(rect(), rect().center()), ANCHOR));
    }

    #[test]
    fn test_projection_round_trip() {
        let view = MapView {
            center: LatLng::new(51.5, -0.12),
            zoom: 10.0,
        };
        let p = LatLng::new(51.52, -0.2);
        let back = view.to_lat_lng(rect(), view.to_screen(rect(), p));
        assert!(close(p, back), "{p} became {back}");
    }

    #[test]
    fn test_north_is_up() {
        let view = MapView::default();
        let north = view.to_screen(rect(), LatLng::new(ANCHOR.lat + 0.01, ANCHOR.lng));
        let east = view.to_screen(rect(), LatLng::new(ANCHOR.lat, ANCHOR.lng + 0.01));
        assert!(north.y < rect().center().y);
        assert!(east.x > rect().center().x);
    }

    #[test]
    fn test_pan_follows_pointer() {
        let mut view = MapView::default();
        let under = view.to_lat_lng(rect(), Pos2::new(300.0, 200.0));
        view.pan(Vec2::new(50.0, -30.0));
        assert!(close(view.to_lat_lng(rect(), Pos2::new(350.0, 170.0)), under));
    }

    #[test]
    fn test_zoom_keeps_pointer_fixed() {
        let mut view = MapView::default();
        let pos = Pos2::new(600.0, 100.0);
        let under = view.to_lat_lng(rect(), pos);
        view.zoom_at(rect(), pos, 1.5);
        assert_eq!(view.zoom, 13.5);
        assert!(close(view.to_lat_lng(rect(), pos), under));

        view.zoom_at(rect(), pos, 100.0);
        assert_eq!(view.zoom, 19.0);
    }

    fn filled_area(points: &[Pos2]) -> f32 {
        triangles_area(&tessellate(points).unwrap())
    }

    fn triangles_area(buffers: &VertexBuffers<Pos2, u32>) -> f32 {
        buffers
            .indices
            .chunks(3)
            .map(|t| {
                let [a, b, c] = [0, 1, 2].map(|i| buffers.vertices[t[i] as usize]);
                ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() / 2.0
            })
            .sum()
    }

    fn l_shape() -> Vec<Pos2> {
        vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(20.0, 0.0),
            Pos2::new(20.0, 10.0),
            Pos2::new(10.0, 10.0),
            Pos2::new(10.0, 20.0),
            Pos2::new(0.0, 20.0),
        ]
    }

    #[test]
    fn test_fill_convex() {
        let square = [
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(10.0, 10.0),
            Pos2::new(0.0, 10.0),
        ];
        assert!((filled_area(&square) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_fill_concave_either_winding() {
        let mut outline = l_shape();
        assert!((filled_area(&outline) - 300.0).abs() < 1e-3);
        outline.reverse();
        assert!((filled_area(&outline) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_fill_concave_with_repeated_click() {
        let mut outline = l_shape();
        outline.insert(4, Pos2::new(10.0, 20.0));
        assert!((filled_area(&outline) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_fill_degenerate() {
        assert!(tessellate(&[]).is_err());
        let line = [Pos2::ZERO, Pos2::new(1.0, 1.0), Pos2::new(2.0, 2.0)];
        if let Ok(buffers) = tessellate(&line) {
            assert!(triangles_area(&buffers).abs() < 1e-3);
        }
    }

    #[test]
    fn test_view_around_points() {
        assert_eq!(MapView::around(&[]), MapView::default());
        let view = MapView::around(&[LatLng::new(1.0, 10.0), LatLng::new(3.0, 20.0)]);
        assert_eq!(view.center, LatLng::new(2.0, 15.0));
        assert_eq!(view.zoom, MapView::default().zoom);
    }
}
