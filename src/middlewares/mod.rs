pub mod basic_auth;
pub mod logger;

pub use basic_auth::BasicAuth;
pub use logger::RequestLogger;
