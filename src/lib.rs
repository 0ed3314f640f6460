pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::ReqwestTransport;
pub use config::{EndpointConfig, ParameterSpec, ViewerConfig};
pub use core::controller::{ActionOutcome, Key, ViewController, ViewPhase, HEALTH_ACTION};
pub use core::surface::ViewSurface;
pub use utils::error::{Result, ViewerError};
