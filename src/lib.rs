pub mod api;
pub mod config;
pub mod middlewares;
pub mod utils;
pub mod viewer;

pub use config::AppConfig;
pub use viewer::{build_controls, DataLoader, Dataset, Selection, View, ViewController};
