use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const USER_VAR: &str = "MAP_AUTH_USER";
pub const PASSWORD_VAR: &str = "MAP_AUTH_PASSWORD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Credentials not configured: set MAP_AUTH_USER and MAP_AUTH_PASSWORD")]
    MissingCredentials,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuración completa de la aplicación.
///
/// Se lee de un archivo TOML (todas las secciones son opcionales) y luego se
/// sobrescribe con variables de entorno. Las credenciales solo se leen del
/// entorno.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub map: MapConfig,
    pub style: StyleConfig,
    pub labels: LabelConfig,
    #[serde(skip)]
    pub auth: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub realm: String,
    pub title: String,
    pub heading: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: false,
            realm: "Mapa de Linhas".to_string(),
            title: "Mapa Interativo de Linhas".to_string(),
            heading: "Mapa Interativo de Linhas de Transporte Público".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub route_field: String,
    /// Se prueban en orden; gana el primero con un valor no vacío.
    pub version_fields: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/linhas_exemplo.geojson"),
            route_field: "route_id".to_string(),
            version_fields: vec!["versao".to_string(), "version".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub style: String,
    pub zoom: f64,
    /// `[lon, lat]` usado cuando el dataset no tiene centroide.
    pub default_center: [f64; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: "carto-positron".to_string(),
            zoom: 12.0,
            default_center: [-43.2437, -22.8758],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Un color por línea, tomado de la paleta.
    #[default]
    ByRoute,
    /// Un color por versión (`version_colors`).
    ByVersion,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub color_scheme: ColorScheme,
    pub palette: Vec<String>,
    pub default_color: String,
    pub version_colors: BTreeMap<String, String>,
    pub widths: BTreeMap<String, f64>,
    pub default_width: f64,
    pub legend: LegendStyle,
    pub font: FontStyle,
}

pub const DEFAULT_PALETTE: [&str; 13] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
    "#bcbd22", "#393b79", "#637939", "#8c6d31", "#843c39",
];

impl Default for StyleConfig {
    fn default() -> Self {
        let version_colors = [("original", "blue"), ("licitada", "green"), ("ajustada", "red")]
            .into_iter()
            .map(|(version, color)| (version.to_string(), color.to_string()))
            .collect();
        let widths = [("original", 2.0), ("licitada", 3.5), ("ajustada", 5.0)]
            .into_iter()
            .map(|(version, width)| (version.to_string(), width))
            .collect();

        Self {
            color_scheme: ColorScheme::default(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            default_color: "#808080".to_string(),
            version_colors,
            widths,
            default_width: 3.0,
            legend: LegendStyle::default(),
            font: FontStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendStyle {
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub bgcolor: String,
    pub bordercolor: String,
    pub borderwidth: f64,
}

impl Default for LegendStyle {
    fn default() -> Self {
        Self {
            title: "Linhas e Versões".to_string(),
            x: 0.01,
            y: 0.99,
            bgcolor: "rgba(255,255,255,0.7)".to_string(),
            bordercolor: "black".to_string(),
            borderwidth: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyle {
    pub family: String,
    pub size: f64,
    pub color: String,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            family: "Roboto, Arial, sans-serif".to_string(),
            size: 14.0,
            color: "#333".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub route_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            route_prefix: "Linha".to_string(),
        }
    }
}

/// Par de credenciales compartidas para la autenticación básica.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Lee las credenciales; ambas son obligatorias y no pueden estar vacías.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USER_VAR).filter(|v| !v.is_empty());
        let password = lookup(PASSWORD_VAR).filter(|v| !v.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl AppConfig {
    /// Configuración para el servidor: archivo, entorno y credenciales obligatorias.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_settings()?;
        config.auth = Credentials::from_lookup(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Igual que [`AppConfig::load`] pero sin exigir credenciales.
    pub fn load_settings() -> Result<Self, ConfigError> {
        let mut config = match env::var("MAP_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::from_optional_file(Path::new(DEFAULT_CONFIG_PATH))?,
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Un archivo inexistente equivale a la configuración por defecto.
    pub fn from_optional_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "PORT", value: port.clone() })?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = parse_flag(&debug)
                .ok_or(ConfigError::InvalidEnv { name: "DEBUG", value: debug.clone() })?;
        }
        if let Some(path) = lookup("DATA_PATH") {
            self.data.path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.style.palette.is_empty() {
            return Err(ConfigError::Invalid("style.palette must not be empty".into()));
        }
        if self.data.version_fields.is_empty() {
            return Err(ConfigError::Invalid("data.version_fields must not be empty".into()));
        }
        if !self.map.zoom.is_finite() || self.map.zoom < 0.0 {
            return Err(ConfigError::Invalid(format!("map.zoom out of range: {}", self.map.zoom)));
        }
        if let Some((version, width)) = self
            .style
            .widths
            .iter()
            .find(|(_, width)| !(width.is_finite() && **width > 0.0))
        {
            return Err(ConfigError::Invalid(format!("style.widths.{version} must be positive, got {width}")));
        }
        if !(self.style.default_width.is_finite() && self.style.default_width > 0.0) {
            return Err(ConfigError::Invalid("style.default_width must be positive".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
