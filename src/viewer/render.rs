use std::collections::HashSet;
use tracing::{debug, trace};

use super::_structs::*;
use super::dataset::Dataset;
use crate::config::{ColorScheme, MapConfig, StyleConfig};

/// Convierte una selección en la vista completa del mapa.
///
/// No guarda estado entre llamadas: la misma entrada produce siempre la
/// misma vista (orden, colores y anchos).
#[derive(Debug, Clone)]
pub struct ViewController {
    map: MapConfig,
    style: StyleConfig,
}

impl ViewController {
    pub fn new(map: MapConfig, style: StyleConfig) -> Self {
        Self { map, style }
    }

    pub fn render(&self, dataset: &Dataset, selection: &Selection) -> View {
        let mut view = self.base_view(dataset);

        if selection.is_empty() {
            debug!("Empty selection, returning map without traces");
            return view;
        }

        let routes: HashSet<&str> = selection.route_ids.iter().map(String::as_str).collect();
        let versions: HashSet<&str> = selection.versions.iter().map(String::as_str).collect();

        view.traces = dataset
            .features()
            .iter()
            .filter(|f| routes.contains(f.route_id.as_str()) && versions.contains(f.version.as_str()))
            .filter(|f| {
                let usable = !f.geometry.is_empty() && f.geometry.is_valid();
                if !usable {
                    debug!("Skipping {} / {}: invalid or empty geometry", f.route_id, f.version);
                }
                usable
            })
            .filter_map(|f| self.build_trace(dataset, f))
            .collect();

        debug!(
            "Rendered {} traces for {} routes x {} versions",
            view.traces.len(),
            routes.len(),
            versions.len()
        );
        view
    }

    /// Mapa base sin trazos. El centro es siempre el del dataset completo.
    fn base_view(&self, dataset: &Dataset) -> View {
        let [default_lon, default_lat] = self.map.default_center;
        let center = dataset
            .centroid()
            .map(|c| LatLon { lat: c.y, lon: c.x })
            .unwrap_or(LatLon {
                lat: default_lat,
                lon: default_lon,
            });

        View {
            basemap: Basemap {
                style: self.map.style.clone(),
                zoom: self.map.zoom,
                center,
            },
            traces: Vec::new(),
            legend: self.style.legend.clone(),
            font: self.style.font.clone(),
            margin: Margin::default(),
        }
    }

    fn build_trace(&self, dataset: &Dataset, feature: &RouteFeature) -> Option<LineTrace> {
        let coords = feature.geometry.flatten();
        if coords.is_empty() {
            debug!(
                "Skipping {} / {}: geometry has no points",
                feature.route_id, feature.version
            );
            return None;
        }
        trace!("{} / {}: {} points", feature.route_id, feature.version, coords.len());

        let (lon, lat) = coords.iter().map(|c| (c.x, c.y)).unzip();

        Some(LineTrace {
            route_id: feature.route_id.clone(),
            version: feature.version.clone(),
            name: format!("{} - {}", feature.route_id, feature.version),
            hover_text: format!("{} / {}", feature.route_id, feature.version),
            color: self.color_for(dataset, feature),
            width: self.width_for(&feature.version),
            lon,
            lat,
        })
    }

    pub fn color_for(&self, dataset: &Dataset, feature: &RouteFeature) -> String {
        let color = match self.style.color_scheme {
            ColorScheme::ByRoute => dataset.route_index(&feature.route_id).and_then(|idx| {
                let size = self.style.palette.len().max(1);
                self.style.palette.get(idx % size)
            }),
            ColorScheme::ByVersion => self.style.version_colors.get(&feature.version),
        };
        color.unwrap_or(&self.style.default_color).clone()
    }

    pub fn width_for(&self, version: &str) -> f64 {
        self.style
            .widths
            .get(version)
            .copied()
            .unwrap_or(self.style.default_width)
    }
}
