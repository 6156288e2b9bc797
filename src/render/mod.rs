use crate::model::{Rgba, Triangle};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia as sk;

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("Cannot allocate a {width}x{height} canvas")]
    InvalidCanvas { width: u32, height: u32 },
}

/// Straight-alpha RGBA image of shape (height, width, 4), row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes. Returns `None` when the byte count does not match the shape.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shape(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns the RGBA value at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Rasterizes an ordered list of triangles.
///
/// Implementations hold only read-only configuration; `render` is called
/// concurrently from the fitness worker pool.
pub trait Renderer: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Paints `triangles` in order (later over earlier) onto a fresh canvas.
    fn render(&self, triangles: &[Triangle]) -> Result<PixelBuffer, RenderError>;
}

/// Renderer options read from the `[renderer]` table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RendererConfig {
    #[serde(default = "default_background")]
    pub background: Rgba,
    #[serde(default = "default_anti_alias")]
    pub anti_alias: bool,
}

fn default_background() -> Rgba {
    [255, 255, 255, 255]
}

fn default_anti_alias() -> bool {
    true
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            anti_alias: default_anti_alias(),
        }
    }
}

/// CPU rasterizer backed by tiny-skia.
#[derive(Debug, Clone)]
pub struct TinySkiaRenderer {
    width: u32,
    height: u32,
    background: Rgba,
    anti_alias: bool,
}

impl TinySkiaRenderer {
    /// Creates a renderer for a `width` x `height` canvas.
    ///
    /// # Returns
    /// * `Err(RenderError::InvalidCanvas)` - if either dimension is zero or too large
    pub fn new(width: u32, height: u32, config: &RendererConfig) -> Result<Self, RenderError> {
        // tiny-skia rejects zero and oversized dimensions
        sk::Pixmap::new(width, height).ok_or(RenderError::InvalidCanvas { width, height })?;
        Ok(Self {
            width,
            height,
            background: config.background,
            anti_alias: config.anti_alias,
        })
    }

    fn draw_triangle(&self, pix: &mut sk::Pixmap, tri: &Triangle) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut pb = sk::PathBuilder::new();
        pb.move_to(tri.p1[0] as f32 * w, tri.p1[1] as f32 * h);
        pb.line_to(tri.p2[0] as f32 * w, tri.p2[1] as f32 * h);
        pb.line_to(tri.p3[0] as f32 * w, tri.p3[1] as f32 * h);
        pb.close();
        // non-finite coordinates produce no path
        let Some(path) = pb.finish() else {
            return;
        };

        let [r, g, b, a] = tri.color;
        let mut paint = sk::Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.anti_alias;

        pix.fill_path(
            &path,
            &paint,
            sk::FillRule::Winding,
            sk::Transform::identity(),
            None,
        );
    }
}

impl Renderer for TinySkiaRenderer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn render(&self, triangles: &[Triangle]) -> Result<PixelBuffer, RenderError> {
        let mut pix = sk::Pixmap::new(self.width, self.height).ok_or(
            RenderError::InvalidCanvas {
                width: self.width,
                height: self.height,
            },
        )?;
        let [r, g, b, a] = self.background;
        pix.fill(sk::Color::from_rgba8(r, g, b, a));

        for tri in triangles {
            self.draw_triangle(&mut pix, tri);
        }

        // tiny-skia stores premultiplied pixels
        let data = pix
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();

        Ok(PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(width: u32, height: u32) -> TinySkiaRenderer {
        TinySkiaRenderer::new(width, height, &RendererConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_candidate_renders_background() {
        let img = renderer(8, 6).render(&[]).unwrap();
        assert_eq!(img.shape(), (6, 8));
        assert_eq!(img, PixelBuffer::filled(8, 6, [255, 255, 255, 255]));
    }

    #[test]
    fn test_zero_sized_canvas_is_rejected() {
        let err = TinySkiaRenderer::new(0, 10, &RendererConfig::default()).unwrap_err();
        assert_eq!(
            err,
            RenderError::InvalidCanvas {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn test_later_triangles_paint_over_earlier_ones() {
        let red = [255, 0, 0, 255];
        let blue = [0, 0, 255, 255];
        let cover = |color| Triangle::new([-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0], color, 0.0);
        let genes = [cover(red), cover(blue)];

        let img = renderer(4, 4).render(&genes).unwrap();
        assert_eq!(img.pixel(2, 2), blue);
        assert_eq!(img.pixel(0, 3), blue);
    }

    #[test]
    fn test_translucent_triangle_blends_with_background() {
        let tri = Triangle::new([-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0], [0, 0, 0, 128], 0.0);
        let img = renderer(4, 4).render(&[tri]).unwrap();
        let [r, g, b, a] = img.pixel(1, 1);
        assert_eq!(a, 255);
        assert!(r > 110 && r < 145, "expected mid gray, got {r}");
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let tri = Triangle::new([0.5, 0.5], [0.5, 0.5], [0.5, 0.5], [0, 0, 0, 255], 0.0);
        let img = renderer(5, 5).render(&[tri]).unwrap();
        assert_eq!(img, PixelBuffer::filled(5, 5, [255, 255, 255, 255]));
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
    }
}
