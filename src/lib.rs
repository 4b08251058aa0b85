pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod prompt;
pub mod render;
pub mod split;
mod utils;


pub use config::{Config, RenderSettings};
pub use error::Error;
pub use error::Result;
