//! Rendering surfaces.
//!
//! An [`Axes`] is a stack of transparent RGBA layers sharing one projection
//! and one projected-to-pixel transform. Each plot call paints into a new
//! layer; layers are composited by z-order (then call order) onto a white
//! background when the surface is rendered or encoded.

use geo::{Coord, LineString, Polygon, Rect};
use image::{imageops, DynamicImage, ImageBuffer, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, BresenhamLineIter};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::colormaps::Legend;
use crate::error::{GeotourError, Result};
use crate::projection::Projection;

/// Default figure size in inches
pub const DEFAULT_FIGSIZE: (f64, f64) = (8.0, 6.0);

/// Default pixels per inch
pub const DEFAULT_DPI: u32 = 100;

/// Fraction of the shorter image side kept free around the data
const MARGIN_FRACTION: f64 = 0.04;

const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const OUTLINE_COLOR: [u8; 4] = [0, 0, 0, 255];
const LEGEND_BORDER: [u8; 4] = [90, 90, 90, 255];

/// Mapping from projected coordinates to pixel coordinates (y flipped)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Transform {
    /// Fit `extent` into a `width` x `height` image with equal aspect,
    /// centered, leaving a margin.
    pub fn fit(extent: Rect<f64>, width: u32, height: u32) -> Self {
        let extent = non_degenerate(extent);
        let margin = MARGIN_FRACTION * width.min(height) as f64;
        let avail_w = (width as f64 - 2.0 * margin).max(1.0);
        let avail_h = (height as f64 - 2.0 * margin).max(1.0);

        let scale = (avail_w / extent.width()).min(avail_h / extent.height());
        let center = extent.center();
        Self {
            scale,
            offset_x: width as f64 / 2.0 - center.x * scale,
            offset_y: height as f64 / 2.0 + center.y * scale,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.offset_x + x * self.scale, self.offset_y - y * self.scale)
    }

    /// Pixels per projected unit
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

fn non_degenerate(extent: Rect<f64>) -> Rect<f64> {
    let pad_x = if extent.width() > 0.0 { 0.0 } else { 0.5 };
    let pad_y = if extent.height() > 0.0 { 0.0 } else { 0.5 };
    if pad_x == 0.0 && pad_y == 0.0 {
        return extent;
    }
    Rect::new(
        Coord {
            x: extent.min().x - pad_x,
            y: extent.min().y - pad_y,
        },
        Coord {
            x: extent.max().x + pad_x,
            y: extent.max().y + pad_y,
        },
    )
}

struct Layer {
    zorder: i32,
    image: RgbaImage,
}

/// A drawable map surface
pub struct Axes {
    width: u32,
    height: u32,
    projection: Projection,
    transform: Option<Transform>,
    layers: Vec<Layer>,
    legend: Option<Legend>,
    outline: bool,
}

impl Axes {
    /// Create an empty surface of `figsize` inches at `dpi` for an already
    /// centered projection
    pub fn new(figsize: (f64, f64), dpi: u32, projection: Projection) -> Result<Self> {
        let (w_in, h_in) = figsize;
        if !(w_in > 0.0 && h_in > 0.0) || dpi == 0 {
            return Err(GeotourError::invalid(
                "figsize",
                format!("figure size must be positive, got {}x{} at {} dpi", w_in, h_in, dpi),
            ));
        }
        let width = (w_in * dpi as f64).round().max(1.0) as u32;
        let height = (h_in * dpi as f64).round().max(1.0) as u32;

        debug!(
            width = width,
            height = height,
            projection = projection.name(),
            "Created axes"
        );

        Ok(Self {
            width,
            height,
            projection,
            transform: None,
            layers: Vec::new(),
            legend: None,
            outline: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Fix the view on `extent` (projected units). Only the first call has
    /// an effect; later plots share the same view. Projections with a
    /// natural outline are shown whole.
    pub fn fit(&mut self, extent: Option<Rect<f64>>) -> Result<Transform> {
        if let Some(transform) = self.transform {
            return Ok(transform);
        }
        let extent = match self.projection.outline() {
            Some(outline) => outline_rect(&outline),
            None => extent,
        }
        .ok_or_else(|| GeotourError::EmptyInput {
            message: "nothing visible to plot".to_string(),
        })?;

        let transform = Transform::fit(extent, self.width, self.height);
        self.transform = Some(transform);
        Ok(transform)
    }

    /// Start a new layer and return a painter for it
    pub fn painter(&mut self, zorder: i32) -> Result<Painter<'_>> {
        let transform = self.transform.ok_or_else(|| GeotourError::ImageGeneration {
            message: "axes have no view yet".to_string(),
        })?;
        self.layers.push(Layer {
            zorder,
            image: ImageBuffer::new(self.width, self.height),
        });
        let layer = self
            .layers
            .last_mut()
            .ok_or_else(|| GeotourError::ImageGeneration {
                message: "layer allocation failed".to_string(),
            })?;
        Ok(Painter {
            image: &mut layer.image,
            transform,
        })
    }

    pub fn set_legend(&mut self, legend: Legend) {
        self.legend = Some(legend);
    }

    /// Draw the projection's outline (the rim of the globe) on render
    pub fn draw_outline(&mut self, visible: bool) {
        self.outline = visible;
    }

    /// Composite all layers onto the background
    pub fn render(&self) -> RgbaImage {
        let mut base: RgbaImage =
            ImageBuffer::from_pixel(self.width, self.height, Rgba(BACKGROUND));

        let mut order: Vec<&Layer> = self.layers.iter().collect();
        order.sort_by_key(|layer| layer.zorder);
        for layer in order {
            imageops::overlay(&mut base, &layer.image, 0, 0);
        }

        if let Some(transform) = self.transform {
            if self.outline {
                if let Some(outline) = self.projection.outline() {
                    let mut painter = Painter {
                        image: &mut base,
                        transform,
                    };
                    painter.stroke_line(&outline, OUTLINE_COLOR, 1.0);
                }
            }
        }

        if let Some(legend) = &self.legend {
            draw_legend(&mut base, legend);
        }

        base
    }

    /// Encode the rendered surface as png or jpeg
    pub fn encode(&self, format: &str) -> Result<Vec<u8>> {
        let image = DynamicImage::ImageRgba8(self.render());
        let mut buffer = Cursor::new(Vec::new());

        match format.to_lowercase().as_str() {
            "png" => image.write_to(&mut buffer, image::ImageFormat::Png)?,
            "jpeg" | "jpg" => {
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_to(&mut buffer, image::ImageFormat::Jpeg)?
            }
            other => {
                return Err(GeotourError::invalid(
                    "format",
                    format!("Format must be 'png' or 'jpeg', got '{}'", other),
                ))
            }
        }

        Ok(buffer.into_inner())
    }

    /// Save to `path`, choosing the format from its extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), "Saved figure");
        Ok(())
    }
}

fn outline_rect(outline: &LineString<f64>) -> Option<Rect<f64>> {
    use geo::BoundingRect;
    outline.bounding_rect()
}

/// Draws projected geometry into one layer
pub struct Painter<'a> {
    image: &'a mut RgbaImage,
    transform: Transform,
}

impl<'a> Painter<'a> {
    pub fn transform(&self) -> Transform {
        self.transform
    }

    fn to_pixels(&self, ring: &LineString<f64>) -> Vec<(f64, f64)> {
        ring.coords()
            .map(|c| self.transform.apply(c.x, c.y))
            .collect()
    }

    fn polygon_pixel_rings(&self, polygon: &Polygon<f64>) -> Vec<Vec<(f64, f64)>> {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| self.to_pixels(ring))
            .collect()
    }

    /// Fill a projected polygon (holes honored)
    pub fn fill_polygon(&mut self, polygon: &Polygon<f64>, color: [u8; 4]) {
        let rings = self.polygon_pixel_rings(polygon);
        let (width, height) = self.image.dimensions();
        for_each_covered_pixel(&rings, width, height, |x, y| {
            self.image.get_pixel_mut(x, y).blend(&Rgba(color));
        });
    }

    /// Stroke every ring of a projected polygon
    pub fn stroke_polygon(&mut self, polygon: &Polygon<f64>, color: [u8; 4], linewidth: f32) {
        self.stroke_line(polygon.exterior(), color, linewidth);
        for ring in polygon.interiors() {
            self.stroke_line(ring, color, linewidth);
        }
    }

    /// Stroke a projected line string
    pub fn stroke_line(&mut self, line: &LineString<f64>, color: [u8; 4], linewidth: f32) {
        let pixels = self.to_pixels(line);
        for pair in pixels.windows(2) {
            self.stroke_segment(pair[0], pair[1], color, linewidth);
        }
    }

    /// Stroke a single segment given in projected coordinates
    pub fn stroke_projected_segment(
        &mut self,
        a: (f64, f64),
        b: (f64, f64),
        color: [u8; 4],
        linewidth: f32,
    ) {
        let a = self.transform.apply(a.0, a.1);
        let b = self.transform.apply(b.0, b.1);
        self.stroke_segment(a, b, color, linewidth);
    }

    fn stroke_segment(&mut self, a: (f64, f64), b: (f64, f64), color: [u8; 4], linewidth: f32) {
        if linewidth <= 0.0 || !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
            return;
        }
        let (width, height) = self.image.dimensions();
        let radius = ((linewidth - 1.0) / 2.0).max(0.0).round() as i32;
        // Only the part that can touch the image is walked
        let reach = radius as f64 + 1.0;
        let Some((a, b)) = clip_segment(
            a,
            b,
            (-reach, -reach),
            (width as f64 + reach, height as f64 + reach),
        ) else {
            return;
        };
        let line = BresenhamLineIter::new((a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32));
        for (x, y) in line {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (px, py) = (x + dx, y + dy);
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        // Overwrite: overlapping brush stamps must not stack alpha
                        self.image.put_pixel(px as u32, py as u32, Rgba(color));
                    }
                }
            }
        }
    }

    /// Draw a filled marker at a projected point
    pub fn fill_point(&mut self, x: f64, y: f64, radius: i32, color: [u8; 4]) {
        let (px, py) = self.transform.apply(x, y);
        if px.is_finite() && py.is_finite() {
            draw_filled_circle_mut(
                &mut *self.image,
                (px.round() as i32, py.round() as i32),
                radius,
                Rgba(color),
            );
        }
    }

    /// Erase everything in this layer outside the given projected polygons
    pub fn clip_to(&mut self, polygons: &[Polygon<f64>]) {
        let (width, height) = self.image.dimensions();
        let mut mask = vec![false; (width as usize) * (height as usize)];
        for polygon in polygons {
            let rings = self.polygon_pixel_rings(polygon);
            for_each_covered_pixel(&rings, width, height, |x, y| {
                mask[(y as usize) * (width as usize) + x as usize] = true;
            });
        }
        for (x, y, pixel) in self.image.enumerate_pixels_mut() {
            if !mask[(y as usize) * (width as usize) + x as usize] {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }
}

/// Liang-Barsky clip of segment `a`-`b` to the box `min`..`max`; `None`
/// when the segment misses the box
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, a.0 - min.0),
        (dx, max.0 - a.0),
        (-dy, a.1 - min.1),
        (dy, max.1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Call `visit` for every pixel whose center lies inside `rings` under the
/// even-odd rule.
fn for_each_covered_pixel<F>(rings: &[Vec<(f64, f64)>], width: u32, height: u32, mut visit: F)
where
    F: FnMut(u32, u32),
{
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in rings.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let first_row = (min_y - 0.5).ceil().max(0.0) as i64;
    let last_row = ((max_y - 0.5).floor() as i64).min(height as i64 - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for row in first_row..=last_row {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            let n = ring.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if (y0 <= yc && y1 > yc) || (y1 <= yc && y0 > yc) {
                    crossings.push(x0 + (yc - y0) / (y1 - y0) * (x1 - x0));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0) as i64;
            let end = ((span[1] - 0.5).ceil() as i64).min(width as i64);
            for x in start..end {
                visit(x as u32, row as u32);
            }
        }
    }
}

fn draw_legend(image: &mut RgbaImage, legend: &Legend) {
    let (width, height) = image.dimensions();
    let pad = (width.min(height) / 40).max(4);

    match legend {
        Legend::Swatches(colors) => {
            let size = (height / 30).clamp(6, 18);
            let x = width.saturating_sub(pad + size);
            for (i, color) in colors.iter().enumerate() {
                let y = pad + i as u32 * (size + 2);
                if y + size > height {
                    break;
                }
                draw_filled_rect_mut(
                    image,
                    imageproc::rect::Rect::at(x as i32 - 1, y as i32 - 1).of_size(size + 2, size + 2),
                    Rgba(LEGEND_BORDER),
                );
                draw_filled_rect_mut(
                    image,
                    imageproc::rect::Rect::at(x as i32, y as i32).of_size(size, size),
                    Rgba(*color),
                );
            }
        }
        Legend::ColorBar(colors) => {
            if colors.is_empty() {
                return;
            }
            let bar_w = (width / 60).clamp(6, 16);
            let bar_h = (height * 2 / 5).max(colors.len() as u32);
            let x = width.saturating_sub(pad + bar_w);
            let y = pad;
            draw_filled_rect_mut(
                image,
                imageproc::rect::Rect::at(x as i32 - 1, y as i32 - 1).of_size(bar_w + 2, bar_h + 2),
                Rgba(LEGEND_BORDER),
            );
            // High values at the top
            for row in 0..bar_h {
                let t = 1.0 - row as f64 / (bar_h - 1).max(1) as f64;
                let index = (t * (colors.len() - 1) as f64).round() as usize;
                draw_filled_rect_mut(
                    image,
                    imageproc::rect::Rect::at(x as i32, (y + row) as i32).of_size(bar_w, 1),
                    Rgba(colors[index]),
                );
            }
        }
    }
}
