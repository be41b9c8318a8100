pub mod _structs;
pub mod controls;
pub mod data_loader;
pub mod dataset;
pub mod geo_validation;
pub mod render;

pub use _structs::*;
pub use controls::build_controls;
pub use data_loader::{DataLoader, LoaderError, SourceFormat};
pub use dataset::Dataset;
pub use render::ViewController;
