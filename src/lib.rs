pub mod auth;
pub mod database;
pub mod settings;
pub mod smoke;
pub mod user_cli;
pub mod web;

pub use settings::Settings;
pub use web::start_web_server;
