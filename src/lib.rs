pub mod config;
pub mod error;
pub mod form_server;
pub mod forms;
pub mod listing;
pub mod submission;

pub use config::Config;
pub use error::RequestError;
pub use form_server::FormServer;
