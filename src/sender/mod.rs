pub mod client;
pub mod publish;

pub use client::HttpConnection;
pub use publish::{DeliveryError, Publisher};
