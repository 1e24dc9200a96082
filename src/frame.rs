//! In-memory geometric tables.
//!
//! A [`GeoFrame`] is an ordered list of records, each a geometry plus a JSON
//! property bag. Frames are read-only after load: filters and transforms
//! return new frames.

use geo::{BoundingRect, Centroid, Coord, Geometry, MultiPolygon, Point, Polygon, Rect, Simplify};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::{GeotourError, Result};

/// One row: a geometry and its attributes
#[derive(Debug, Clone)]
pub struct Record {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

/// A collection of records with column-style access
#[derive(Debug, Clone, Default)]
pub struct GeoFrame {
    records: Vec<Record>,
}

impl GeoFrame {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted union of property keys across all records
    pub fn columns(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .records
            .iter()
            .flat_map(|r| r.properties.keys())
            .collect();
        names.into_iter().cloned().collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.properties.contains_key(name))
    }

    fn check_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(GeotourError::ColumnNotFound {
                column: name.to_string(),
            })
        }
    }

    /// Numeric view of a column.
    ///
    /// Numbers and numeric strings convert; anything else (including a
    /// missing key on an individual record) is `None`.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.check_column(name)?;
        Ok(self
            .records
            .iter()
            .map(|r| r.properties.get(name).and_then(numeric_value))
            .collect())
    }

    /// String view of a column
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        self.check_column(name)?;
        Ok(self
            .records
            .iter()
            .map(|r| match r.properties.get(name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
            .collect())
    }

    /// Rows whose `column` equals `value` as a string
    pub fn query_eq(&self, column: &str, value: &str) -> Result<GeoFrame> {
        let texts = self.text_column(column)?;
        let records = self
            .records
            .iter()
            .zip(texts)
            .filter(|(_, text)| text.as_deref() == Some(value))
            .map(|(record, _)| record.clone())
            .collect();
        Ok(GeoFrame::new(records))
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> GeoFrame {
        GeoFrame::new(self.records.iter().take(n).cloned().collect())
    }

    /// Simplify every line and polygon geometry with tolerance `epsilon`
    /// (in coordinate units). Points are left as they are.
    pub fn simplify(&self, epsilon: f64) -> GeoFrame {
        let records = self
            .records
            .iter()
            .map(|r| Record {
                geometry: simplify_geometry(&r.geometry, epsilon),
                properties: r.properties.clone(),
            })
            .collect();
        GeoFrame::new(records)
    }

    /// Element-wise `numerator / denominator`; zero or missing denominators
    /// give `None`.
    pub fn ratio(&self, numerator: &str, denominator: &str) -> Result<Vec<Option<f64>>> {
        let num = self.column(numerator)?;
        let den = self.column(denominator)?;
        Ok(num
            .into_iter()
            .zip(den)
            .map(|(n, d)| match (n, d) {
                (Some(n), Some(d)) if d != 0.0 => Some(n / d),
                _ => None,
            })
            .collect())
    }

    /// Bounding rectangle of all geometry
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.records
            .iter()
            .filter_map(|r| r.geometry.bounding_rect())
            .reduce(merge_rects)
    }

    /// All polygonal geometry flattened into a single multipolygon
    pub fn polygons(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(
            self.records
                .iter()
                .flat_map(|r| geometry_polygons(&r.geometry))
                .collect(),
        )
    }

    /// Polygons of each record, in row order
    pub fn polygons_per_record(&self) -> Vec<Vec<Polygon<f64>>> {
        self.records
            .iter()
            .map(|r| geometry_polygons(&r.geometry))
            .collect()
    }

    /// Representative point of each record: the point itself, otherwise
    /// the centroid. Records without one are skipped, so the returned
    /// indices refer back into the frame.
    pub fn points(&self) -> Vec<(usize, Point<f64>)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| match &r.geometry {
                Geometry::Point(p) => Some((i, *p)),
                other => other.centroid().map(|c| (i, c)),
            })
            .collect()
    }
}

/// Short name of a geometry variant, for logging
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Polygons contained in a geometry (recursing into collections)
pub fn geometry_polygons(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(geometry_polygons).collect(),
        _ => Vec::new(),
    }
}

fn simplify_geometry(geometry: &Geometry<f64>, epsilon: f64) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&epsilon)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(mls.simplify(&epsilon)),
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify(&epsilon)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify(&epsilon)),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
            gc.iter().map(|g| simplify_geometry(g, epsilon)).collect(),
        ),
        other => other.clone(),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Smallest rectangle covering both
pub fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn sample() -> GeoFrame {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ];
        let shifted = polygon![
            (x: 10.0, y: -5.0),
            (x: 12.0, y: -5.0),
            (x: 12.0, y: -1.0),
        ];
        GeoFrame::new(vec![
            Record {
                geometry: Geometry::Polygon(square),
                properties: props(json!({"continent": "Africa", "pop_est": 100, "gdp_md_est": 50.0})),
            },
            Record {
                geometry: Geometry::Polygon(shifted),
                properties: props(json!({"continent": "Europe", "pop_est": "0", "gdp_md_est": 7.5})),
            },
            Record {
                geometry: Geometry::Point(Point::new(3.0, 4.0)),
                properties: props(json!({"continent": "Africa", "pop_est": null})),
            },
        ])
    }

    #[test]
    fn test_columns_are_sorted_union() {
        assert_eq!(
            sample().columns(),
            vec!["continent", "gdp_md_est", "pop_est"]
        );
    }

    #[test]
    fn test_numeric_column() {
        let pop = sample().column("pop_est").unwrap();
        assert_eq!(pop, vec![Some(100.0), Some(0.0), None]);
        assert!(sample().column("missing").is_err());
    }

    #[test]
    fn test_query_and_head() {
        let frame = sample();
        let africa = frame.query_eq("continent", "Africa").unwrap();
        assert_eq!(africa.len(), 2);
        assert_eq!(frame.head(1).len(), 1);
        assert_eq!(frame.head(10).len(), 3);
        assert!(frame.query_eq("nope", "Africa").is_err());
    }

    #[test]
    fn test_ratio_skips_zero_denominator() {
        let ratio = sample().ratio("gdp_md_est", "pop_est").unwrap();
        assert_eq!(ratio, vec![Some(0.5), None, None]);
    }

    #[test]
    fn test_bounds_and_points() {
        let frame = sample();
        let bounds = frame.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: -5.0 });
        assert_eq!(bounds.max(), Coord { x: 12.0, y: 4.0 });

        let points = frame.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].1, Point::new(1.0, 1.0));
        assert_eq!(points[2], (2, Point::new(3.0, 4.0)));
        assert_eq!(frame.polygons().0.len(), 2);
    }

    #[test]
    fn test_simplify_drops_collinear_vertices() {
        let wobbly = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0001),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ];
        let frame = GeoFrame::new(vec![Record {
            geometry: Geometry::Polygon(wobbly),
            properties: Map::new(),
        }]);
        let simplified = frame.simplify(0.001);
        let polys = simplified.polygons();
        // 4 corners plus the closing coordinate
        assert_eq!(polys.0[0].exterior().0.len(), 5);
    }
}
