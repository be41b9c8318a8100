use crate::config::{FontStyle, LegendStyle};
use geo_types::{LineString, MultiLineString};
use serde::{Deserialize, Serialize};

/// Geometría de una versión de línea: simple o multiparte.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteGeometry {
    Line(LineString<f64>),
    MultiLine(MultiLineString<f64>),
}

/// Una fila del dataset: una línea en una versión concreta.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    pub route_id: String,
    pub version: String,
    pub geometry: RouteGeometry,
}

/// Selección del usuario. Nunca se guarda entre peticiones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub route_ids: Vec<String>,
    pub versions: Vec<String>,
}

impl Selection {
    pub fn new<R, V>(route_ids: R, versions: V) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            route_ids: route_ids.into_iter().map(Into::into).collect(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// Vacía si falta cualquiera de los dos conjuntos.
    pub fn is_empty(&self) -> bool {
        self.route_ids.is_empty() || self.versions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basemap {
    pub style: String,
    pub zoom: f64,
    pub center: LatLon,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub r: u32,
    pub t: u32,
    pub l: u32,
    pub b: u32,
}

/// Polilínea lista para dibujar, derivada de un [`RouteFeature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTrace {
    pub route_id: String,
    pub version: String,
    pub name: String,
    pub hover_text: String,
    pub color: String,
    pub width: f64,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

/// Estado completo del mapa para una selección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub basemap: Basemap,
    pub traces: Vec<LineTrace>,
    pub legend: LegendStyle,
    pub font: FontStyle,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOption {
    pub label: String,
    pub value: String,
}

/// Opciones y valores iniciales de los dos controles de la página.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub routes: Vec<ControlOption>,
    pub versions: Vec<ControlOption>,
    pub default_routes: Vec<String>,
    pub default_versions: Vec<String>,
}
