use geo::Centroid;
use geo_types::{Coord, LineString, MultiLineString};
use ordered_float::OrderedFloat;
use std::collections::BTreeSet;
use tracing::debug;

use super::_structs::{RouteFeature, RouteGeometry};

/// Una línea es válida si todas sus coordenadas son finitas y tiene al menos
/// dos puntos distintos (extensión no nula).
pub fn is_valid_line(line: &LineString<f64>) -> bool {
    if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return false;
    }
    match line.0.first() {
        Some(first) => line.0.iter().any(|c| c != first),
        None => false,
    }
}

impl RouteGeometry {
    pub fn is_empty(&self) -> bool {
        match self {
            RouteGeometry::Line(line) => line.0.is_empty(),
            RouteGeometry::MultiLine(lines) => lines.0.iter().all(|line| line.0.is_empty()),
        }
    }

    /// Una multilínea es válida si no está vacía y todas sus partes lo son.
    pub fn is_valid(&self) -> bool {
        match self {
            RouteGeometry::Line(line) => is_valid_line(line),
            RouteGeometry::MultiLine(lines) => {
                !lines.0.is_empty() && lines.0.iter().all(is_valid_line)
            }
        }
    }

    /// Aplana la geometría en una sola secuencia de puntos.
    ///
    /// Las partes de una multilínea se concatenan en orden, así que dos partes
    /// disjuntas quedan unidas por un segmento recto.
    pub fn flatten(&self) -> Vec<Coord<f64>> {
        match self {
            RouteGeometry::Line(line) => line.0.clone(),
            RouteGeometry::MultiLine(lines) => lines
                .0
                .iter()
                .flat_map(|line| line.0.iter().copied())
                .collect(),
        }
    }

    pub fn lines(&self) -> Vec<&LineString<f64>> {
        match self {
            RouteGeometry::Line(line) => vec![line],
            RouteGeometry::MultiLine(lines) => lines.0.iter().collect(),
        }
    }
}

type Vertex = (OrderedFloat<f64>, OrderedFloat<f64>);

fn vertex(coord: Coord<f64>) -> Vertex {
    (OrderedFloat(coord.x), OrderedFloat(coord.y))
}

/// Centroide de la unión de todas las geometrías.
///
/// Los segmentos repetidos (p. ej. tramos compartidos entre versiones de una
/// misma línea) cuentan una sola vez, sin importar su sentido.
pub fn centroid_of(features: &[RouteFeature]) -> Option<Coord<f64>> {
    let segments: BTreeSet<(Vertex, Vertex)> = features
        .iter()
        .flat_map(|feature| feature.geometry.lines())
        .flat_map(|line| line.lines())
        .map(|segment| {
            let (a, b) = (vertex(segment.start), vertex(segment.end));
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        })
        .filter(|(a, b)| a != b)
        .collect();

    if segments.is_empty() {
        debug!("No geometries available for centroid");
        return None;
    }
    debug!("Centroid over {} unique segments", segments.len());

    let lines = segments
        .into_iter()
        .map(|((ax, ay), (bx, by))| {
            LineString::new(vec![
                Coord { x: ax.into_inner(), y: ay.into_inner() },
                Coord { x: bx.into_inner(), y: by.into_inner() },
            ])
        })
        .collect();

    MultiLineString::new(lines).centroid().map(|point| point.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    fn feature(geometry: RouteGeometry) -> RouteFeature {
        RouteFeature {
            route_id: "10".into(),
            version: "original".into(),
            geometry,
        }
    }

    #[test]
    fn test_line_validity() {
        assert!(is_valid_line(&line_string![(x: -43.0, y: -22.9), (x: -43.1, y: -22.95)]));
        assert!(!is_valid_line(&LineString::new(vec![])));
        assert!(!is_valid_line(&line_string![(x: -43.0, y: -22.9)]));
        // todos los puntos iguales: extensión nula
        assert!(!is_valid_line(&line_string![(x: -43.0, y: -22.9), (x: -43.0, y: -22.9)]));
        assert!(!is_valid_line(&line_string![(x: f64::NAN, y: -22.9), (x: -43.1, y: -22.95)]));
    }

    #[test]
    fn test_multi_line_validity() {
        let valid = RouteGeometry::MultiLine(MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0)],
        ]));
        assert!(valid.is_valid());
        assert!(!valid.is_empty());

        let empty = RouteGeometry::MultiLine(MultiLineString::new(vec![]));
        assert!(!empty.is_valid());
        assert!(empty.is_empty());

        let with_bad_part = RouteGeometry::MultiLine(MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 2.0, y: 0.0)],
        ]));
        assert!(!with_bad_part.is_valid());
    }

    #[test]
    fn test_flatten_concatenates_parts_in_order() {
        let geometry = RouteGeometry::MultiLine(MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0)],
        ]));

        let xs: Vec<f64> = geometry.flatten().iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 5.0, 6.0]);
    }

    #[test]
    fn test_centroid_of_features() {
        let features = vec![
            feature(RouteGeometry::Line(line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)])),
            feature(RouteGeometry::Line(line_string![(x: 0.0, y: 2.0), (x: 2.0, y: 2.0)])),
        ];

        let center = centroid_of(&features).unwrap();
        assert!((center.x - 1.0).abs() < 1e-9);
        assert!((center.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_counts_shared_segments_once() {
        let mut features: Vec<RouteFeature> = ["original", "licitada", "ajustada"]
            .into_iter()
            .map(|version| RouteFeature {
                route_id: "A".into(),
                version: version.into(),
                geometry: RouteGeometry::Line(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]),
            })
            .collect();
        features.push(RouteFeature {
            route_id: "B".into(),
            version: "original".into(),
            geometry: RouteGeometry::Line(line_string![(x: 10.0, y: 0.0), (x: 11.0, y: 0.0)]),
        });

        let center = centroid_of(&features).unwrap();
        assert!((center.x - 5.5).abs() < 1e-9);
        assert!(center.y.abs() < 1e-9);
    }

    #[test]
    fn test_centroid_ignores_segment_direction() {
        let features = vec![
            feature(RouteGeometry::Line(line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)])),
            feature(RouteGeometry::Line(line_string![(x: 2.0, y: 0.0), (x: 0.0, y: 0.0)])),
            feature(RouteGeometry::Line(line_string![(x: 4.0, y: 0.0), (x: 6.0, y: 0.0)])),
        ];

        let center = centroid_of(&features).unwrap();
        assert!((center.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_of_nothing() {
        assert_eq!(centroid_of(&[]), None);
    }
}
