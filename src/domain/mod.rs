//! Domain layer for sumo-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `Record` / `Chunk`: the pipeline's input types
//! - `RoutingMetadata` / `RoutingKey`: per-record destination resolution
//! - `DeliveryUnit`: one HTTP request body plus its header metadata
//! - `SinkError`: top-level error type

pub mod error;
pub mod record;
pub mod routing;

pub use error::SinkError;
pub use record::{Chunk, Record, METADATA_KEY};
pub use routing::{DeliveryUnit, RoutingKey, RoutingMetadata};
