use super::_structs::{ControlOption, Controls};
use super::dataset::Dataset;
use crate::config::LabelConfig;

/// Cuántas líneas vienen seleccionadas al abrir la página.
pub const DEFAULT_ROUTE_COUNT: usize = 2;

/// Opciones de los dos controles: líneas (multiselección) y versiones.
pub fn build_controls(dataset: &Dataset, labels: &LabelConfig) -> Controls {
    let routes = dataset
        .route_ids()
        .iter()
        .map(|id| ControlOption {
            label: format!("{} {}", labels.route_prefix, id).trim().to_string(),
            value: id.clone(),
        })
        .collect();

    let versions = dataset
        .versions()
        .iter()
        .map(|version| ControlOption {
            label: capitalize(version),
            value: version.clone(),
        })
        .collect();

    Controls {
        routes,
        versions,
        default_routes: dataset
            .route_ids()
            .iter()
            .take(DEFAULT_ROUTE_COUNT)
            .cloned()
            .collect(),
        default_versions: dataset.versions().to_vec(),
    }
}

/// Primera letra en mayúscula, el resto en minúscula.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
