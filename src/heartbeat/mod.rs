//! Metrics heartbeat engine.
//!
//! Firmware declares a fixed set of named metrics once, updates them freely
//! between reporting intervals, and lets the periodic trigger serialize a
//! snapshot into the storage sink:
//!
//! ```rust,ignore
//! static DEFS: &[MetricDef] = &[
//!     MetricDef::new("battery_level", MetricType::Unsigned),
//!     MetricDef::new("ble_connected_ms", MetricType::Timer),
//! ];
//! static REGISTRY: MetricRegistry = MetricRegistry::new(DEFS);
//! const BATTERY_LEVEL: MetricId = REGISTRY.key("battery_level");
//!
//! manager.set_unsigned(BATTERY_LEVEL, 93)?;
//! // ... every interval, from the platform timer:
//! manager.collect()?;
//! ```
//!
//! A heartbeat is either committed whole or not at all: if the event does
//! not fit the sink, the transaction rolls back and the accumulated values
//! carry over to the next attempt.

mod estimator;
mod manager;
mod registry;
mod serializer;
mod store;

pub use estimator::worst_case_event_size;
pub use manager::HeartbeatManager;
pub use registry::{MetricDef, MetricId, MetricRegistry, MetricType};
pub use serializer::serialize_heartbeat;
pub use store::{HeartbeatStore, MetricIter, MetricSnapshot, MetricValue};

/// Maximum number of metrics a registry may declare; one value slot and one
/// timer slot are reserved per metric.
pub const MAX_METRICS: usize = 32;
