pub mod controller;
pub mod decoder;
pub mod format;
pub mod messages;
pub mod normalizer;
pub mod paginator;
pub mod renderer;
pub mod surface;

pub use crate::domain::model::{DecodedBody, RawResponse, RequestIdentity, ResultSet, Row, Severity, StatusMessage};
pub use crate::domain::ports::Transport;
pub use crate::utils::error::Result;
