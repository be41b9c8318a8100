use geo_types::Coord;
use std::collections::{BTreeSet, HashMap};

use super::_structs::RouteFeature;
use super::geo_validation::centroid_of;
use crate::utils::natural_cmp;

/// Dataset en memoria, inmutable después de la carga.
///
/// Se comparte entre todas las peticiones; solo expone lectura.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Vec<RouteFeature>,
    route_ids: Vec<String>,
    versions: Vec<String>,
    route_index: HashMap<String, usize>,
    centroid: Option<Coord<f64>>,
    discarded: usize,
}

impl Dataset {
    /// Construye el dataset a partir de features ya validados, en orden de carga.
    pub fn from_features(features: Vec<RouteFeature>, discarded: usize) -> Self {
        let mut route_ids: Vec<String> = features
            .iter()
            .map(|f| f.route_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        route_ids.sort_by(|a, b| natural_cmp(a, b));

        let versions: Vec<String> = features
            .iter()
            .map(|f| f.version.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let route_index = route_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();

        let centroid = centroid_of(&features);

        Self {
            features,
            route_ids,
            versions,
            route_index,
            centroid,
            discarded,
        }
    }

    pub fn features(&self) -> &[RouteFeature] {
        &self.features
    }

    pub fn route_ids(&self) -> &[String] {
        &self.route_ids
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.centroid
    }

    /// Posición de la línea en la lista ordenada de líneas distintas.
    pub fn route_index(&self, route_id: &str) -> Option<usize> {
        self.route_index.get(route_id).copied()
    }

    /// Features descartados durante la carga.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
