//! Binning of hue values into color classes.

use super::colormap::{Colormap, NO_DATA_COLOR};
use crate::error::{GeotourError, Result};

/// How hue values are turned into colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classifier {
    /// `k` buckets holding (roughly) equal numbers of values
    Quantiles(usize),
    /// `k` buckets of equal width between min and max
    EqualInterval(usize),
    /// No buckets: colors follow the value directly
    Continuous,
}

impl Classifier {
    /// Classifier for a bucket count; `None` means continuous
    pub fn from_k(k: Option<usize>) -> Result<Self> {
        match k {
            None => Ok(Classifier::Continuous),
            Some(0) => Err(GeotourError::invalid("k", "bucket count must be at least 1")),
            Some(k) => Ok(Classifier::Quantiles(k)),
        }
    }
}

/// Upper bin edges (ascending, deduplicated) for `values`
pub fn bin_edges(values: &[f64], classifier: Classifier) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    let mut edges: Vec<f64> = match classifier {
        Classifier::Quantiles(k) => (1..=k)
            .map(|i| quantile(&sorted, i as f64 / k as f64))
            .collect(),
        Classifier::EqualInterval(k) => (1..=k)
            .map(|i| min + (max - min) * i as f64 / k as f64)
            .collect(),
        Classifier::Continuous => vec![max],
    };
    edges.dedup_by(|a, b| (*a - *b).abs() <= f64::EPSILON * a.abs().max(1.0));
    if let Some(last) = edges.last_mut() {
        *last = max;
    }
    edges
}

/// Linearly interpolated quantile of sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Index of the bin holding `value`
pub fn bin_of(value: f64, edges: &[f64]) -> usize {
    edges
        .iter()
        .position(|edge| value <= *edge)
        .unwrap_or(edges.len().saturating_sub(1))
}

/// Bucket of every value plus the bin edges; missing or non-finite values
/// have no bucket
pub fn classify(values: &[Option<f64>], classifier: Classifier) -> (Vec<Option<usize>>, Vec<f64>) {
    let finite: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let edges = bin_edges(&finite, classifier);
    let buckets = values
        .iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => Some(bin_of(*v, &edges)),
            _ => None,
        })
        .collect();
    (buckets, edges)
}

/// A legend to draw for a hue scale
#[derive(Debug, Clone, PartialEq)]
pub enum Legend {
    /// One swatch per bucket
    Swatches(Vec<[u8; 4]>),
    /// A continuous bar sampled from low to high
    ColorBar(Vec<[u8; 4]>),
}

/// Colors for a hue series under a classifier and colormap
pub struct HueScale {
    colors: Vec<[u8; 4]>,
    legend: Legend,
    pub min: f64,
    pub max: f64,
    pub edges: Vec<f64>,
}

impl HueScale {
    pub fn new(values: &[Option<f64>], classifier: Classifier, cmap: &dyn Colormap) -> Result<Self> {
        let finite: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if finite.is_empty() {
            return Err(GeotourError::EmptyInput {
                message: "hue has no numeric values".to_string(),
            });
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (buckets, edges) = classify(values, classifier);

        let (colors, legend) = match classifier {
            Classifier::Continuous => {
                let colors = values
                    .iter()
                    .map(|v| match v {
                        Some(v) if v.is_finite() => cmap.map(*v as f32, min as f32, max as f32),
                        _ => NO_DATA_COLOR,
                    })
                    .collect();
                let bar = (0..64)
                    .map(|i| cmap.map_normalized(i as f32 / 63.0))
                    .collect();
                (colors, Legend::ColorBar(bar))
            }
            _ => {
                let palette = bucket_palette(edges.len(), cmap);
                let colors = buckets
                    .iter()
                    .map(|b| b.map_or(NO_DATA_COLOR, |b| palette[b]))
                    .collect();
                (colors, Legend::Swatches(palette))
            }
        };

        Ok(Self {
            colors,
            legend,
            min,
            max,
            edges,
        })
    }

    /// Color of the value at `index` in the series this scale was built from
    pub fn color(&self, index: usize) -> [u8; 4] {
        self.colors.get(index).copied().unwrap_or(NO_DATA_COLOR)
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }
}

/// `n` colors evenly spaced along the colormap
pub fn bucket_palette(n: usize, cmap: &dyn Colormap) -> Vec<[u8; 4]> {
    match n {
        0 => Vec::new(),
        1 => vec![cmap.map_normalized(0.5)],
        n => (0..n)
            .map(|i| cmap.map_normalized(i as f32 / (n - 1) as f32))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormaps::get_colormap;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quantile_edges() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(
            bin_edges(&values, Classifier::Quantiles(4)),
            vec![2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_equal_interval_edges() {
        let values = [0.0, 1.0, 10.0];
        assert_eq!(
            bin_edges(&values, Classifier::EqualInterval(2)),
            vec![5.0, 10.0]
        );
    }

    #[test]
    fn test_repeated_values_collapse_buckets() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 2.0];
        let edges = bin_edges(&values, Classifier::Quantiles(5));
        assert_eq!(edges, vec![1.0, 2.0]);
        assert_eq!(bin_of(1.0, &edges), 0);
        assert_eq!(bin_of(2.0, &edges), 1);
    }

    #[test]
    fn test_classify_skips_missing() {
        let values = [Some(0.0), None, Some(10.0), Some(f64::NAN), Some(4.0)];
        let (buckets, edges) = classify(&values, Classifier::EqualInterval(2));
        assert_eq!(edges, vec![5.0, 10.0]);
        assert_eq!(buckets, vec![Some(0), None, Some(1), None, Some(0)]);
    }

    #[test]
    fn test_from_k() {
        assert_eq!(Classifier::from_k(None).unwrap(), Classifier::Continuous);
        assert_eq!(Classifier::from_k(Some(5)).unwrap(), Classifier::Quantiles(5));
        assert!(Classifier::from_k(Some(0)).is_err());
    }

    #[test]
    fn test_hue_scale_buckets_and_missing() {
        let cmap = get_colormap("greens").unwrap();
        let values = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)];
        let scale = HueScale::new(&values, Classifier::Quantiles(2), cmap.as_ref()).unwrap();

        assert_eq!(scale.edges, vec![2.5, 4.0]);
        assert_eq!(scale.color(0), scale.color(1));
        assert_eq!(scale.color(3), scale.color(4));
        assert_ne!(scale.color(0), scale.color(4));
        assert_eq!(scale.color(2), NO_DATA_COLOR);
        assert_eq!(
            scale.legend(),
            &Legend::Swatches(vec![cmap.map_normalized(0.0), cmap.map_normalized(1.0)])
        );
    }

    #[test]
    fn test_hue_scale_continuous() {
        let cmap = get_colormap("reds").unwrap();
        let values = [Some(0.0), Some(5.0), Some(10.0)];
        let scale = HueScale::new(&values, Classifier::Continuous, cmap.as_ref()).unwrap();
        assert_eq!(scale.color(0), cmap.map_normalized(0.0));
        assert_eq!(scale.color(1), cmap.map_normalized(0.5));
        assert!(matches!(scale.legend(), Legend::ColorBar(bar) if bar.len() == 64));
    }

    #[test]
    fn test_hue_scale_rejects_empty() {
        let cmap = get_colormap("reds").unwrap();
        assert!(HueScale::new(&[None, None], Classifier::Continuous, cmap.as_ref()).is_err());
    }
}
