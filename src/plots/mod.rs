//! Map plotting calls.
//!
//! Every plot takes a [`GeoFrame`], a [`PlotOptions`] style bundle and an
//! optional existing [`Axes`]. Passing the axes returned by an earlier plot
//! layers the new drawing on top of it with the same projection and view.

pub mod cartogram;
pub mod choropleth;
pub mod kdeplot;
pub mod polyplot;
pub mod voronoi;

pub use cartogram::{cartogram, CartogramOptions};
pub use choropleth::choropleth;
pub use kdeplot::{kdeplot, KdeOptions};
pub use polyplot::polyplot;
pub use voronoi::voronoi;

use geo::{BoundingRect, MultiPolygon, Polygon, Rect};
use tracing::warn;

use crate::canvas::{Axes, DEFAULT_DPI, DEFAULT_FIGSIZE};
use crate::colormaps::{get_colormap, parse_color, Classifier, HueScale};
use crate::error::{GeotourError, Result};
use crate::frame::{merge_rects, GeoFrame};
use crate::projection::Projection;

/// Edge color used when none is given
pub const DEFAULT_EDGECOLOR: [u8; 4] = [0, 0, 0, 255];

/// Where hue values come from
#[derive(Debug, Clone, PartialEq)]
pub enum Hue {
    /// A numeric column of the frame
    Column(String),
    /// A precomputed series, one entry per row
    Values(Vec<Option<f64>>),
}

impl Hue {
    /// Hue value of every row of `frame`
    pub fn resolve(&self, frame: &GeoFrame) -> Result<Vec<Option<f64>>> {
        match self {
            Hue::Column(name) => frame.column(name),
            Hue::Values(values) => {
                if values.len() != frame.len() {
                    return Err(GeotourError::invalid(
                        "hue",
                        format!(
                            "hue has {} values but the frame has {} rows",
                            values.len(),
                            frame.len()
                        ),
                    ));
                }
                Ok(values.clone())
            }
        }
    }
}

/// How `k` buckets are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Quantiles,
    EqualInterval,
}

/// Style and layout shared by all plots
#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Target projection; ignored when drawing onto existing axes
    pub projection: Option<Projection>,
    /// Figure size in inches
    pub figsize: (f64, f64),
    pub dpi: u32,
    pub hue: Option<Hue>,
    pub cmap: String,
    /// Bucket count; `None` colors continuously
    pub k: Option<usize>,
    pub scheme: Scheme,
    pub legend: bool,
    /// Edge color; `"none"` disables edges
    pub edgecolor: Option<String>,
    /// Face color for plots without a hue; `"none"` leaves faces empty
    pub facecolor: Option<String>,
    pub linewidth: f32,
    pub alpha: f32,
    pub zorder: i32,
    /// Lon/lat geometry the drawing is cut to (density and tessellation)
    pub clip: Option<MultiPolygon<f64>>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            projection: None,
            figsize: DEFAULT_FIGSIZE,
            dpi: DEFAULT_DPI,
            hue: None,
            cmap: "viridis".to_string(),
            k: Some(5),
            scheme: Scheme::Quantiles,
            legend: false,
            edgecolor: None,
            facecolor: None,
            linewidth: 1.0,
            alpha: 1.0,
            zorder: 0,
            clip: None,
        }
    }
}

impl PlotOptions {
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn figsize(mut self, width: f64, height: f64) -> Self {
        self.figsize = (width, height);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn hue_column(mut self, column: &str) -> Self {
        self.hue = Some(Hue::Column(column.to_string()));
        self
    }

    pub fn hue_values(mut self, values: Vec<Option<f64>>) -> Self {
        self.hue = Some(Hue::Values(values));
        self
    }

    pub fn cmap(mut self, cmap: &str) -> Self {
        self.cmap = cmap.to_string();
        self
    }

    pub fn k(mut self, k: Option<usize>) -> Self {
        self.k = k;
        self
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    pub fn edgecolor(mut self, color: &str) -> Self {
        self.edgecolor = Some(color.to_string());
        self
    }

    pub fn facecolor(mut self, color: &str) -> Self {
        self.facecolor = Some(color.to_string());
        self
    }

    pub fn linewidth(mut self, linewidth: f32) -> Self {
        self.linewidth = linewidth;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn zorder(mut self, zorder: i32) -> Self {
        self.zorder = zorder;
        self
    }

    pub fn clip(mut self, clip: MultiPolygon<f64>) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Classifier implied by `k` and `scheme`
    pub fn classifier(&self) -> Result<Classifier> {
        match (Classifier::from_k(self.k)?, self.scheme) {
            (Classifier::Quantiles(k), Scheme::EqualInterval) => Ok(Classifier::EqualInterval(k)),
            (classifier, _) => Ok(classifier),
        }
    }

    /// Edge color, falling back to `default`
    pub(crate) fn edge(&self, default: Option<[u8; 4]>) -> Result<Option<[u8; 4]>> {
        resolve_color(self.edgecolor.as_deref(), default)
    }

    /// Face color, falling back to `default`
    pub(crate) fn face(&self, default: Option<[u8; 4]>) -> Result<Option<[u8; 4]>> {
        Ok(resolve_color(self.facecolor.as_deref(), default)?.map(|c| with_alpha(c, self.alpha)))
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(GeotourError::invalid(
                "alpha",
                format!("alpha must be within [0, 1], got {}", self.alpha),
            ));
        }
        if !(self.linewidth >= 0.0) {
            return Err(GeotourError::invalid(
                "linewidth",
                format!("linewidth cannot be negative, got {}", self.linewidth),
            ));
        }
        Ok(())
    }
}

/// Reuse `ax`, or create axes whose projection is centered on `frame`
pub(crate) fn open_axes(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    opts.validate()?;
    match ax {
        Some(ax) => {
            if let Some(requested) = &opts.projection {
                if requested.name() != ax.projection().name() {
                    warn!(
                        requested = requested.name(),
                        existing = ax.projection().name(),
                        "Ignoring projection: drawing onto existing axes"
                    );
                }
            }
            Ok(ax)
        }
        None => {
            let projection = opts
                .projection
                .clone()
                .unwrap_or_default()
                .centered_on(frame.bounds());
            Axes::new(opts.figsize, opts.dpi, projection)
        }
    }
}

/// Build the hue scale for `frame`, if a hue is set
pub(crate) fn hue_scale(frame: &GeoFrame, opts: &PlotOptions) -> Result<Option<HueScale>> {
    let Some(hue) = &opts.hue else {
        return Ok(None);
    };
    let values = hue.resolve(frame)?;
    let cmap = get_colormap(&opts.cmap)?;
    HueScale::new(&values, opts.classifier()?, cmap.as_ref()).map(Some)
}

fn resolve_color(spec: Option<&str>, default: Option<[u8; 4]>) -> Result<Option<[u8; 4]>> {
    match spec {
        Some(spec) => parse_color(spec),
        None => Ok(default),
    }
}

/// Scale a color's alpha channel
pub(crate) fn with_alpha(color: [u8; 4], alpha: f32) -> [u8; 4] {
    let a = (color[3] as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
    [color[0], color[1], color[2], a]
}

/// Bounding rectangle of projected polygons
pub(crate) fn polygons_extent<'a, I>(polygons: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = &'a Polygon<f64>>,
{
    polygons
        .into_iter()
        .filter_map(|p| p.bounding_rect())
        .reduce(merge_rects)
}

/// Bounding rectangle of projected points
pub(crate) fn points_extent(points: &[(f64, f64)]) -> Option<Rect<f64>> {
    points
        .iter()
        .map(|&(x, y)| Rect::new((x, y), (x, y)))
        .reduce(merge_rects)
}

/// Extent of the union of two optional rectangles
pub(crate) fn union_extent(a: Option<Rect<f64>>, b: Option<Rect<f64>>) -> Option<Rect<f64>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(merge_rects(a, b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Record;
    use geo::{Geometry, Point};
    use serde_json::Map;

    fn two_rows() -> GeoFrame {
        GeoFrame::new(vec![
            Record {
                geometry: Geometry::Point(Point::new(0.0, 0.0)),
                properties: Map::new(),
            },
            Record {
                geometry: Geometry::Point(Point::new(1.0, 1.0)),
                properties: Map::new(),
            },
        ])
    }

    #[test]
    fn test_hue_values_length_checked() {
        let frame = two_rows();
        assert!(Hue::Values(vec![Some(1.0)]).resolve(&frame).is_err());
        assert_eq!(
            Hue::Values(vec![Some(1.0), None]).resolve(&frame).unwrap(),
            vec![Some(1.0), None]
        );
        assert!(Hue::Column("missing".into()).resolve(&frame).is_err());
    }

    #[test]
    fn test_classifier_from_options() {
        let opts = PlotOptions::default();
        assert_eq!(opts.classifier().unwrap(), Classifier::Quantiles(5));
        let opts = PlotOptions::default().scheme(Scheme::EqualInterval).k(Some(3));
        assert_eq!(opts.classifier().unwrap(), Classifier::EqualInterval(3));
        let opts = PlotOptions::default().k(None);
        assert_eq!(opts.classifier().unwrap(), Classifier::Continuous);
    }

    #[test]
    fn test_colors_and_alpha() {
        let opts = PlotOptions::default().edgecolor("None").facecolor("red").alpha(0.5);
        assert_eq!(opts.edge(Some(DEFAULT_EDGECOLOR)).unwrap(), None);
        assert_eq!(opts.face(None).unwrap(), Some([255, 0, 0, 128]));
        assert_eq!(
            PlotOptions::default().edge(Some(DEFAULT_EDGECOLOR)).unwrap(),
            Some(DEFAULT_EDGECOLOR)
        );
    }

    #[test]
    fn test_open_axes_validates_and_centers() {
        let frame = two_rows();
        assert!(open_axes(&frame, &PlotOptions::default().alpha(2.0), None).is_err());

        let opts = PlotOptions::default().projection(Projection::orthographic());
        let ax = open_axes(&frame, &opts, None).unwrap();
        assert_eq!(
            ax.projection(),
            &Projection::Orthographic {
                central_longitude: Some(0.5),
                central_latitude: Some(0.5),
            }
        );
    }

    #[test]
    fn test_union_extent() {
        let a = points_extent(&[(0.0, 0.0), (1.0, 2.0)]);
        let b = points_extent(&[(-1.0, 5.0)]);
        let u = union_extent(a, b).unwrap();
        assert_eq!((u.min().x, u.min().y, u.max().x, u.max().y), (-1.0, 0.0, 1.0, 5.0));
        assert!(union_extent(None, None).is_none());
    }
}
