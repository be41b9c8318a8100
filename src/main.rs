use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};
use route_map::api::{self, AppState};
use route_map::config::AppConfig;
use route_map::middlewares::{BasicAuth, RequestLogger};
use route_map::viewer::DataLoader;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Cargar las variables desde el archivo .env
    dotenv().ok();

    let config = AppConfig::load();
    init_logging(config.as_ref().map(|c| c.server.debug).unwrap_or(false));

    let config = config.map_err(|e| {
        error!("Error al cargar la configuración: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // La carga es bloqueante y ocurre una sola vez, antes de aceptar peticiones
    let loader = DataLoader::new(&config.data);
    let data_path = config.data.path.clone();
    let dataset = tokio::task::spawn_blocking(move || loader.load(&data_path))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        .map_err(|e| {
            error!("No se pudo cargar {}: {}", config.data.path.display(), e);
            io::Error::new(io::ErrorKind::InvalidData, e.to_string())
        })?;

    if dataset.centroid().is_none() {
        warn!("El dataset no tiene geometrías válidas; se usará el centro por defecto");
    }

    let state = web::Data::new(AppState::new(dataset, &config));
    let credentials = config.auth.clone();
    let realm = config.server.realm.clone();

    info!("Starting server on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::config)
            .wrap(BasicAuth::new(credentials.clone(), &realm))
            .wrap(RequestLogger)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
