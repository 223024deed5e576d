pub mod config;
pub mod error;
pub mod facade;
pub mod models;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use facade::{EngineFacade, EngineHandle, EngineRequest, EngineResponse};
pub use services::{BackendKind, RankingBackend, ReferenceBackend, VectorizedBackend};
