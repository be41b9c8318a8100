use dotenv::dotenv;
use route_map::config::AppConfig;
use route_map::viewer::{DataLoader, Dataset};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    // Inicializar el sistema de logging
    tracing_subscriber::fmt::init();
    dotenv().ok();

    let config = match AppConfig::load_settings() {
        Ok(config) => config,
        Err(e) => {
            error!("Error al cargar la configuración: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data.path.clone());

    let loader = DataLoader::new(&config.data);
    match loader.load(&path) {
        Ok(dataset) => {
            report(&dataset);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error al cargar {}: {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn report(dataset: &Dataset) {
    info!(
        "Features: {} válidos, {} descartados",
        dataset.len(),
        dataset.discarded()
    );
    info!("Líneas ({}): {}", dataset.route_ids().len(), dataset.route_ids().join(", "));
    info!("Versiones ({}): {}", dataset.versions().len(), dataset.versions().join(", "));

    match dataset.centroid() {
        Some(center) => info!("Centroide: lon {:.6}, lat {:.6}", center.x, center.y),
        None => info!("Centroide: sin geometrías válidas"),
    }

    for route_id in dataset.route_ids() {
        let versions: Vec<&str> = dataset
            .features()
            .iter()
            .filter(|f| &f.route_id == route_id)
            .map(|f| f.version.as_str())
            .collect();
        info!("  {}: {}", route_id, versions.join(", "));
    }
}
