pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use db::sqlite::JournalStorage;
pub use error::RollcallError;
pub use service::token::TokenService;
