//! Broker renderers.

mod template;

pub use template::{DEFAULT_BROKER_TEMPLATE, TeraBrokerRenderer};
