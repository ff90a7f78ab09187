pub mod attendance;
pub mod auth;
pub mod groups;
pub mod lessons;
pub mod stats;
