use crate::config::DataConfig;
use crate::viewer::_structs::*;
use crate::viewer::dataset::Dataset;
use geo_types::{Coord, LineString, MultiLineString};
use geojson::{Feature, FeatureCollection};
use log::{debug, error, info, warn};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lee un archivo de líneas y construye el [`Dataset`].
pub struct DataLoader {
    route_field: String,
    version_fields: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GeoJSON parsing error: {0}")]
    GeoJson(String),
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),
}

/// Formato del archivo de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Un `FeatureCollection` completo.
    FeatureCollection,
    /// Un `Feature` por línea.
    LineDelimited,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "geojson" | "json" => Ok(SourceFormat::FeatureCollection),
            "geojsonl" | "geojsons" | "ndjson" | "jsonl" => Ok(SourceFormat::LineDelimited),
            _ => Err(LoaderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Motivo por el que un feature queda fuera del dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    MissingRouteId,
    MissingVersion,
    UnsupportedGeometry,
    InvalidGeometry,
}

impl DataLoader {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            route_field: config.route_field.clone(),
            version_fields: config.version_fields.clone(),
        }
    }

    /// Carga el archivo completo. Cualquier error aquí impide arrancar el servidor.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset, LoaderError> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;
        info!("Loading {}", path.display());

        let file = File::open(path).map_err(|e| {
            error!("Failed to open {}: {}", path.display(), e);
            LoaderError::Io(e)
        })?;

        self.load_from_reader(BufReader::new(file), format)
    }

    pub fn load_from_reader<R: BufRead>(
        &self,
        reader: R,
        format: SourceFormat,
    ) -> Result<Dataset, LoaderError> {
        let features = match format {
            SourceFormat::FeatureCollection => read_feature_collection(reader)?,
            SourceFormat::LineDelimited => read_line_delimited(reader)?,
        };
        let total = features.len();
        debug!("Found {} features", total);

        let mut kept = Vec::with_capacity(total);
        let mut discarded = 0;
        for (idx, feature) in features.iter().enumerate() {
            match self.to_route_feature(feature) {
                Ok(route) => kept.push(route),
                Err(reason) => {
                    warn!("Discarding feature #{}: {:?}", idx, reason);
                    discarded += 1;
                }
            }
        }

        let dataset = Dataset::from_features(kept, discarded);
        info!(
            "Loaded {} features ({} discarded), {} routes, {} versions",
            dataset.len(),
            discarded,
            dataset.route_ids().len(),
            dataset.versions().len()
        );

        Ok(dataset)
    }

    fn to_route_feature(&self, feature: &Feature) -> Result<RouteFeature, Discard> {
        let properties = feature.properties.as_ref();

        let route_id = properties
            .and_then(|props| props.get(&self.route_field))
            .and_then(property_text)
            .ok_or(Discard::MissingRouteId)?;

        let version = self
            .version_fields
            .iter()
            .find_map(|field| properties.and_then(|props| props.get(field)).and_then(property_text))
            .ok_or(Discard::MissingVersion)?;

        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(Discard::UnsupportedGeometry)
            .and_then(|geometry| to_route_geometry(&geometry.value))?;

        if geometry.is_empty() || !geometry.is_valid() {
            return Err(Discard::InvalidGeometry);
        }

        Ok(RouteFeature {
            route_id,
            version,
            geometry,
        })
    }
}

fn read_feature_collection<R: BufRead>(reader: R) -> Result<Vec<Feature>, LoaderError> {
    let collection: FeatureCollection = serde_json::from_reader(reader).map_err(|e| {
        error!("Failed to parse FeatureCollection: {}", e);
        LoaderError::Json(e)
    })?;
    Ok(collection.features)
}

fn read_line_delimited<R: BufRead>(reader: R) -> Result<Vec<Feature>, LoaderError> {
    let mut features = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        // GeoJSON text sequences (RFC 8142) anteponen un RS a cada registro
        let text = line.trim().trim_start_matches('\u{1e}');
        if text.is_empty() {
            continue;
        }
        let feature: Feature = serde_json::from_str(text).map_err(|e| {
            error!("Failed to parse feature on line {}: {}", idx + 1, e);
            LoaderError::GeoJson(format!("line {}: {}", idx + 1, e))
        })?;
        features.push(feature);
    }
    Ok(features)
}

/// Texto de un atributo; los números enteros se escriben sin decimales.
fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) if !text.is_empty() => Some(text.clone()),
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if let Some(uint) = number.as_u64() {
                Some(uint.to_string())
            } else {
                number.as_f64().map(|float| {
                    if float.fract() == 0.0 && float.abs() < 1e15 {
                        format!("{}", float as i64)
                    } else {
                        float.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

fn to_route_geometry(value: &geojson::Value) -> Result<RouteGeometry, Discard> {
    match value {
        geojson::Value::LineString(positions) => line_from_positions(positions)
            .map(RouteGeometry::Line)
            .ok_or(Discard::InvalidGeometry),
        geojson::Value::MultiLineString(parts) => parts
            .iter()
            .map(|positions| line_from_positions(positions))
            .collect::<Option<Vec<_>>>()
            .map(|lines| RouteGeometry::MultiLine(MultiLineString::new(lines)))
            .ok_or(Discard::InvalidGeometry),
        _ => Err(Discard::UnsupportedGeometry),
    }
}

fn line_from_positions(positions: &[Vec<f64>]) -> Option<LineString<f64>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::Builder;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "route_id": 10, "versao": "original" },
                "geometry": { "type": "LineString", "coordinates": [[-43.0, -22.9], [-43.1, -22.95]] }
            },
            {
                "type": "Feature",
                "properties": { "route_id": "10", "versao": "ajustada" },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[-43.0, -22.9], [-43.2, -23.0]], [[-43.3, -23.1], [-43.4, -23.2]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "route_id": "11", "versao": "licitada" },
                "geometry": { "type": "LineString", "coordinates": [[-43.0, -22.9], [-43.0, -22.9]] }
            },
            {
                "type": "Feature",
                "properties": { "route_id": "12", "versao": "original" },
                "geometry": { "type": "Point", "coordinates": [-43.0, -22.9] }
            },
            {
                "type": "Feature",
                "properties": { "route_id": "13", "versao": "original" },
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": { "versao": "original" },
                "geometry": { "type": "LineString", "coordinates": [[-43.0, -22.9], [-43.1, -22.95]] }
            }
        ]
    }"#;

    fn loader() -> DataLoader {
        DataLoader::new(&DataConfig::default())
    }

    #[test]
    fn test_load_feature_collection_discards_invalid_rows() {
        let dataset = loader()
            .load_from_reader(Cursor::new(COLLECTION), SourceFormat::FeatureCollection)
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.discarded(), 4);
        assert_eq!(dataset.route_ids(), ["10"]);
        assert_eq!(dataset.versions(), ["ajustada", "original"]);
        assert!(dataset.features().iter().all(|f| f.geometry.is_valid()));
        assert!(dataset.centroid().is_some());
    }

    #[test]
    fn test_version_field_fallback() {
        let line = r#"{"type":"Feature","properties":{"route_id":"A1","version":"licitada"},"geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#;
        let dataset = loader()
            .load_from_reader(Cursor::new(line), SourceFormat::LineDelimited)
            .unwrap();

        assert_eq!(dataset.features()[0].version, "licitada");
    }

    #[test]
    fn test_blank_version_falls_through_to_next_field() {
        let text = concat!(
            r#"{"type":"Feature","properties":{"route_id":"A1","versao":null,"version":"ajustada"},"geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#,
            "\n",
            r#"{"type":"Feature","properties":{"route_id":"A2","versao":"","version":"original"},"geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#,
            "\n",
            r#"{"type":"Feature","properties":{"route_id":"A3","versao":"","version":null},"geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#,
        );
        let dataset = loader()
            .load_from_reader(Cursor::new(text), SourceFormat::LineDelimited)
            .unwrap();

        let versions: Vec<&str> = dataset.features().iter().map(|f| f.version.as_str()).collect();
        assert_eq!(versions, vec!["ajustada", "original"]);
        assert_eq!(dataset.discarded(), 1);
    }

    #[test]
    fn test_line_delimited_skips_blank_lines() {
        let text = "\n{\"type\":\"Feature\",\"properties\":{\"route_id\":\"1\",\"versao\":\"original\"},\"geometry\":{\"type\":\"LineString\",\"coordinates\":[[0.0,0.0],[1.0,0.0]]}}\n\n\u{1e}{\"type\":\"Feature\",\"properties\":{\"route_id\":\"2\",\"versao\":\"original\"},\"geometry\":{\"type\":\"LineString\",\"coordinates\":[[0.0,1.0],[1.0,1.0]]}}\n";
        let dataset = loader()
            .load_from_reader(Cursor::new(text), SourceFormat::LineDelimited)
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.route_ids(), ["1", "2"]);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let result = loader().load_from_reader(Cursor::new("{not json}\n"), SourceFormat::LineDelimited);
        assert!(matches!(result, Err(LoaderError::GeoJson(_))));
    }

    #[test]
    fn test_malformed_collection_is_an_error() {
        let result = loader().load_from_reader(Cursor::new("[1, 2"), SourceFormat::FeatureCollection);
        assert!(matches!(result, Err(LoaderError::Json(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(COLLECTION.as_bytes()).unwrap();

        let dataset = loader().load(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_load_sample_dataset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join("linhas_exemplo.geojson");

        let dataset = loader().load(path).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.discarded(), 0);
        assert_eq!(dataset.route_ids(), ["10", "25"]);
        assert_eq!(dataset.versions(), ["ajustada", "licitada", "original"]);
    }

    #[test]
    fn test_missing_file() {
        let result = loader().load("/nonexistent/linhas.geojson");
        assert!(matches!(result, Err(LoaderError::Io(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = loader().load("data/linhas_fiocruz.gpkg");
        assert!(matches!(result, Err(LoaderError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_property_text() {
        assert_eq!(property_text(&serde_json::json!(10)), Some("10".to_string()));
        assert_eq!(property_text(&serde_json::json!(10.0)), Some("10".to_string()));
        assert_eq!(property_text(&serde_json::json!(10.5)), Some("10.5".to_string()));
        assert_eq!(property_text(&serde_json::json!("")), None);
        assert_eq!(property_text(&serde_json::json!(null)), None);
    }
}
