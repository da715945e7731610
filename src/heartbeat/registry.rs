//! Static registry of declared metrics.
//!
//! The registry is an immutable table built once from a static declaration
//! list. Declaring it in const context turns duplicate or unknown metric
//! names into build failures:
//!
//! ```rust
//! use vitals_rs::heartbeat::{MetricDef, MetricId, MetricRegistry, MetricType};
//!
//! static DEFS: &[MetricDef] = &[
//!     MetricDef::new("battery_level", MetricType::Unsigned),
//!     MetricDef::new("ambient_temperature_celsius", MetricType::Signed),
//!     MetricDef::new("bluetooth_active_ms", MetricType::Timer),
//! ];
//! static REGISTRY: MetricRegistry = MetricRegistry::new(DEFS);
//!
//! const BATTERY_LEVEL: MetricId = REGISTRY.key("battery_level");
//! ```

use crate::error::MetricsError;

/// Type of a metric value.
///
/// The numeric values recover the type on the remote decoder and must never
/// be renumbered once shipped; new variants may only be appended.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Unsigned integer, max. 32 bits.
    Unsigned = 0,
    /// Signed integer, max. 32 bits.
    Signed = 1,
    /// Accumulated duration between paired start/stop calls, in ms.
    Timer = 2,
}

impl MetricType {
    /// Number of valid types.
    pub const COUNT: usize = 3;

    /// The frozen wire value for this type.
    pub const fn wire_value(self) -> u8 {
        self as u8
    }
}

/// Opaque, dense, zero-based identifier of one registered metric, assigned
/// in declaration order. Stable for the life of a firmware image that
/// shares a decoder schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricId(u16);

impl MetricId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u16)
    }

    /// Slot index of this metric in the value store.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One declared metric: a stable name and its value type.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub ty: MetricType,
}

impl MetricDef {
    pub const fn new(name: &'static str, ty: MetricType) -> Self {
        Self { name, ty }
    }
}

const fn names_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Immutable name → id → type table over a static declaration list.
#[derive(Debug, Clone, Copy)]
pub struct MetricRegistry {
    defs: &'static [MetricDef],
}

impl MetricRegistry {
    /// Builds the registry. Panics on duplicate names; constructing the
    /// registry in const context turns that into a build failure.
    pub const fn new(defs: &'static [MetricDef]) -> Self {
        let mut i = 0;
        while i < defs.len() {
            let mut j = i + 1;
            while j < defs.len() {
                if names_equal(defs[i].name, defs[j].name) {
                    panic!("metric name declared twice");
                }
                j += 1;
            }
            i += 1;
        }
        Self { defs }
    }

    /// Resolves a declared name to its id. Panics on unknown names; using
    /// the result as a `const` turns that into a build failure.
    pub const fn key(&self, name: &str) -> MetricId {
        let mut i = 0;
        while i < self.defs.len() {
            if names_equal(self.defs[i].name, name) {
                return MetricId(i as u16);
            }
            i += 1;
        }
        panic!("metric name is not declared in the registry");
    }

    /// Runtime name lookup.
    pub fn resolve(&self, name: &str) -> Result<MetricId, MetricsError> {
        self.defs
            .iter()
            .position(|def| def.name == name)
            .map(|i| MetricId(i as u16))
            .ok_or(MetricsError::UnknownMetric)
    }

    /// The declared type of `id`, or `None` for an out-of-range id.
    pub fn type_of(&self, id: MetricId) -> Option<MetricType> {
        self.defs.get(id.index()).map(|def| def.ty)
    }

    /// Number of registered metrics.
    pub const fn count(&self) -> usize {
        self.defs.len()
    }

    /// The declaration list, in registration order.
    pub const fn defs(&self) -> &'static [MetricDef] {
        self.defs
    }
}
