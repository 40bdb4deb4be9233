pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod replay;
pub mod source;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use pipeline::*;
pub use replay::*;
pub use source::*;
