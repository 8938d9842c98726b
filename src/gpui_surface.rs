//! [`PaintSurface`] backed by a gpui window.

use glam::DVec2;
use gpui::*;

use crate::rendering::{ImageBlit, PaintSurface, Style};
use crate::view_range::Viewport;

fn to_point(p: DVec2) -> Point<Pixels> {
    Point::new(px(p.x as f32), px(p.y as f32))
}

fn to_color(c: [f32; 4]) -> Hsla {
    Rgba {
        r: c[0],
        g: c[1],
        b: c[2],
        a: c[3],
    }
    .into()
}

/// Adapts a gpui `Window` during the paint phase. Device coordinates are
/// window pixels, so the view's viewport should be the element bounds.
pub struct GpuiSurface<'a> {
    window: &'a mut Window,
    bounds: Bounds<Pixels>,
}

impl<'a> GpuiSurface<'a> {
    pub fn new(window: &'a mut Window, bounds: Bounds<Pixels>) -> Self {
        Self { window, bounds }
    }

    /// Viewport matching the element bounds.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            f32::from(self.bounds.origin.x) as f64,
            f32::from(self.bounds.origin.y) as f64,
            f32::from(self.bounds.size.width) as f64,
            f32::from(self.bounds.size.height) as f64,
        )
    }
}

impl PaintSurface for GpuiSurface<'_> {
    fn is_drawable(&self) -> bool {
        self.bounds.size.width > px(0.0) && self.bounds.size.height > px(0.0)
    }

    fn draw_polyline(&mut self, points: &[DVec2], style: &Style) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut builder = PathBuilder::stroke(px(style.width));
        builder.move_to(to_point(*first));
        for p in rest {
            builder.line_to(to_point(*p));
        }
        if let Ok(path) = builder.build() {
            self.window.paint_path(path, to_color(style.color));
        }
    }

    fn draw_points(&mut self, points: &[DVec2], style: &Style) {
        let size = style.point_size.max(1.0);
        let half = size / 2.0;
        let color = to_color(style.color);
        for p in points {
            let rect = Bounds::new(
                Point::new(px(p.x as f32 - half), px(p.y as f32 - half)),
                Size::new(px(size), px(size)),
            );
            self.window.paint_quad(fill(rect, color).corner_radii(px(half)));
        }
    }

    fn draw_image(&mut self, image: &ImageBlit<'_>) {
        let grid = image.grid;
        if grid.cols == 0 || grid.rows == 0 {
            return;
        }
        let (lo, hi) = image.levels.unwrap_or((0.0, 1.0));
        let scale = if hi > lo { 1.0 / (hi - lo) } else { 0.0 };

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let Some(v) = grid.get(col, row).filter(|v| v.is_finite()) else {
                    continue;
                };
                let level = ((v - lo) * scale).clamp(0.0, 1.0) as f32;
                let (origin, size) = image.cell_rect(col, row);
                let rect = Bounds::new(
                    to_point(origin),
                    Size::new(px(size.x.ceil() as f32), px(size.y.ceil() as f32)),
                );
                self.window.paint_quad(fill(rect, to_color([level, level, level, 1.0])));
            }
        }
    }
}
