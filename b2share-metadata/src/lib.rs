pub mod cli;
pub mod load_config;
pub mod schema_client;

pub use cli::{run, Cli, Commands};
