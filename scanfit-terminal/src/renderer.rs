/// Half-block pixel canvas for terminal rendering
use crossterm::{
    cursor,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use scanfit_core::{Canvas, Color};
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom one
const HALF_BLOCK: char = '▀';

/// Pixels stacked per terminal cell
pub const PIXELS_PER_ROW: usize = 2;

/// RGB pixel buffer drawn two pixels per terminal cell
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; width * height],
        }
    }

    /// Size the canvas for a terminal of `columns` × `rows` cells
    pub fn for_terminal(columns: u16, rows: u16) -> Self {
        Self::new(columns as usize, rows as usize * PIXELS_PER_ROW)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Color::BLACK; width * height];
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    fn blend(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }

        let idx = y as usize * self.width + x as usize;
        let dst = self.pixels[idx];
        let alpha = color.a as f32 / 255.0;
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;

        self.pixels[idx] = Color::rgb(mix(color.r, dst.r), mix(color.g, dst.g), mix(color.b, dst.b));
    }

    /// Scan-convert a convex polygon, blending each covered pixel once
    fn fill_convex(&mut self, points: &[(f32, f32)], color: Color) {
        let area: f32 = edges(points).map(|(a, b)| a.0 * b.1 - b.0 * a.1).sum();
        if area.abs() < f32::EPSILON {
            return;
        }
        let winding = area.signum();

        // Bounding box
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        // Clip to screen bounds
        let min_x = (min_x.floor() as i32).max(0);
        let max_x = (max_x.ceil() as i32).min(self.width as i32 - 1);
        let min_y = (min_y.floor() as i32).max(0);
        let max_y = (max_y.ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let inside = edges(points).all(|(a, b)| {
                    let side = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
                    side * winding >= 0.0
                });

                if inside {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        let pen = width.round().max(1.0) as i32;
        let offset = (pen - 1) / 2;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t).floor() as i32 - offset;
            let y = (from.1 + dy * t).floor() as i32 - offset;
            for oy in 0..pen {
                for ox in 0..pen {
                    self.blend(x + ox, y + oy, color);
                }
            }
        }
    }

    /// Write the canvas to the terminal starting at the top-left cell
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let rows = self.height / PIXELS_PER_ROW;
        let mut current: Option<(Color, Color)> = None;

        for row in 0..rows {
            writer.queue(cursor::MoveTo(0, row as u16))?;
            for x in 0..self.width {
                let top = self.pixels[(row * PIXELS_PER_ROW) * self.width + x];
                let bottom = self.pixels[(row * PIXELS_PER_ROW + 1) * self.width + x];

                if current != Some((top, bottom)) {
                    writer.queue(SetForegroundColor(term_color(top)))?;
                    writer.queue(SetBackgroundColor(term_color(bottom)))?;
                    current = Some((top, bottom));
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Canvas for PixelCanvas {
    fn clear(&mut self, color: Color) {
        self.pixels.fill(color.with_alpha(u8::MAX));
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        if points.len() >= 3 {
            self.fill_convex(points, color);
        }
    }

    fn stroke_polygon(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
        for (i, &from) in points.iter().enumerate() {
            let to = points[(i + 1) % points.len()];
            self.line(from, to, color, width);
        }
    }
}

/// Consecutive vertex pairs of a closed polygon
fn edges(points: &[(f32, f32)]) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&a, &b)| (a, b))
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn test_fill_triangle_covers_interior_only() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.clear(Color::BLACK);
        canvas.fill_polygon(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], RED);

        assert_eq!(canvas.pixel(1, 1), Some(RED));
        assert_eq!(canvas.pixel(8, 8), Some(Color::BLACK));
    }

    #[test]
    fn test_fill_quad() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.clear(Color::BLACK);
        canvas.fill_polygon(&[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)], RED);

        for (x, y) in [(2, 2), (5, 2), (5, 5), (2, 5), (3, 4)] {
            assert_eq!(canvas.pixel(x, y), Some(RED), "pixel {x},{y}");
        }
        assert_eq!(canvas.pixel(1, 1), Some(Color::BLACK));
        assert_eq!(canvas.pixel(6, 6), Some(Color::BLACK));
    }

    #[test]
    fn test_alpha_blending() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.clear(Color::rgb(0, 0, 200));
        canvas.fill_polygon(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], Color::rgba(0, 128, 0, 128));

        let blended = canvas.pixel(1, 1).unwrap();
        assert_eq!(blended.g, 64);
        assert_eq!(blended.b, 100);
        assert_eq!(blended.a, 255);

        // No seam: every pixel, including the quad's diagonal, is blended once
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.pixel(x, y), Some(blended), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_fill_ignores_winding_and_degenerate_polygons() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.clear(Color::BLACK);
        canvas.fill_polygon(&[(2.0, 6.0), (6.0, 6.0), (6.0, 2.0), (2.0, 2.0)], RED);
        assert_eq!(canvas.pixel(3, 3), Some(RED));

        let mut canvas = PixelCanvas::new(8, 8);
        canvas.clear(Color::BLACK);
        canvas.fill_polygon(&[(1.0, 1.0), (4.0, 4.0), (7.0, 7.0)], RED);
        canvas.fill_polygon(&[(1.0, 1.0), (7.0, 7.0)], RED);
        assert!((0..8).all(|i| canvas.pixel(i, i) == Some(Color::BLACK)));
    }

    #[test]
    fn test_stroke_outline() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.clear(Color::BLACK);
        canvas.stroke_polygon(&[(1.0, 1.0), (8.0, 1.0), (8.0, 8.0)], RED, 1.0);

        assert_eq!(canvas.pixel(4, 1), Some(RED));
        assert_eq!(canvas.pixel(8, 5), Some(RED));
        assert_eq!(canvas.pixel(3, 6), Some(Color::BLACK));
    }

    #[test]
    fn test_draw_emits_half_blocks() {
        let mut canvas = PixelCanvas::for_terminal(3, 2);
        assert_eq!((canvas.width(), canvas.height()), (3, 4));
        canvas.clear(RED);

        let mut out = Vec::new();
        canvas.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HALF_BLOCK).count(), 6);
    }
}
