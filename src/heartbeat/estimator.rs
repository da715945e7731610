//! Worst-case heartbeat event size.
//!
//! Sizes a storage buffer ahead of time: for a given registry the encoded
//! event can never exceed the value computed here, whatever the store
//! holds. The bound is computed by running the real envelope encoder
//! against a byte-counting sink with every metric pinned to its widest
//! value, so serializer and estimator cannot drift apart.

use crate::cbor::{CborWriter, SizeSink};
use crate::device::DeviceInfo;
use crate::heartbeat::registry::{MetricRegistry, MetricType};
use crate::heartbeat::serializer::encode_event;
use crate::heartbeat::store::MetricValue;

/// Widest possible value for a metric of type `ty`: five encoded bytes for
/// each of the three types.
const fn widest_value(ty: MetricType) -> MetricValue {
    match ty {
        MetricType::Unsigned => MetricValue::Unsigned(u32::MAX),
        // The negative bound carries the full 32-bit magnitude.
        MetricType::Signed => MetricValue::Signed(i32::MIN),
        MetricType::Timer => MetricValue::Timer(u32::MAX),
    }
}

/// Maximum number of bytes a heartbeat event for `registry` can occupy,
/// given the identity strings and sequence number it will be stamped with.
///
/// For any reachable store state, the actual encoded size is less than or
/// equal to this value; equality requires every metric to hit its widest
/// encoding. Registry changes change the result, so recompute after adding
/// or removing metrics.
pub fn worst_case_event_size(
    registry: &MetricRegistry,
    info: &DeviceInfo,
    sequence: u32,
) -> usize {
    let mut writer = CborWriter::new(SizeSink::new());
    let widest = registry.defs().iter().map(|def| widest_value(def.ty));
    // The counting sink never reports exhaustion.
    let _ = encode_event(&mut writer, info, sequence, widest, registry.count());
    writer.into_inner().total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbor::CborSink;
    use crate::clock::testing::FakeClock;
    use crate::heartbeat::registry::{MetricDef, MetricRegistry};
    use crate::heartbeat::store::HeartbeatStore;

    static DEFS: &[MetricDef] = &[
        MetricDef::new("unsigned_int", MetricType::Unsigned),
        MetricDef::new("signed_int", MetricType::Signed),
        MetricDef::new("timer_key", MetricType::Timer),
    ];
    static REGISTRY: MetricRegistry = MetricRegistry::new(DEFS);

    fn device_info() -> DeviceInfo {
        DeviceInfo::new("DAABBCCDD", "1.2.3", "main").unwrap()
    }

    struct VecSink(Vec<u8>);

    impl CborSink for VecSink {
        fn write(&mut self, bytes: &[u8]) -> Result<(), crate::cbor::SinkFull> {
            self.0.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn actual_encoded_size(store: &HeartbeatStore<FakeClock>, sequence: u32) -> usize {
        let mut writer = CborWriter::new(VecSink(Vec::new()));
        encode_event(
            &mut writer,
            &device_info(),
            sequence,
            store.iter().map(|s| s.value),
            REGISTRY.count(),
        )
        .unwrap();
        writer.into_inner().0.len()
    }

    #[test]
    fn test_reference_registry_worst_case() {
        assert_eq!(worst_case_event_size(&REGISTRY, &device_info(), 24), 56);
    }

    #[test]
    fn test_estimate_bounds_every_store_state() {
        let estimate = worst_case_event_size(&REGISTRY, &device_info(), 24);
        let clock = FakeClock::default();
        let mut store = HeartbeatStore::new(&REGISTRY, clock.clone());

        let states: &[(u32, i32, u32)] = &[
            (0, 0, 0),
            (1000, -1000, 1234),
            (23, 23, 23),
            (u32::MAX, i32::MIN, u32::MAX),
            (u32::MAX, i32::MAX, 0),
        ];
        for &(u, s, t) in states {
            store
                .set_unsigned(REGISTRY.key("unsigned_int"), u)
                .unwrap();
            store.set_signed(REGISTRY.key("signed_int"), s).unwrap();
            store.timer_start(REGISTRY.key("timer_key")).unwrap();
            clock.advance(t);
            store.timer_stop(REGISTRY.key("timer_key")).unwrap();

            assert!(actual_encoded_size(&store, 24) <= estimate);
            store.reset_all();
        }
    }

    #[test]
    fn test_estimate_is_tight_only_at_widest_values() {
        let estimate = worst_case_event_size(&REGISTRY, &device_info(), 24);
        let clock = FakeClock::default();
        let mut store = HeartbeatStore::new(&REGISTRY, clock.clone());

        // Mid-range values strictly undershoot the bound.
        store
            .set_unsigned(REGISTRY.key("unsigned_int"), 1000)
            .unwrap();
        store.set_signed(REGISTRY.key("signed_int"), -1000).unwrap();
        assert!(actual_encoded_size(&store, 24) < estimate);

        // Widest values meet it exactly.
        store
            .set_unsigned(REGISTRY.key("unsigned_int"), u32::MAX)
            .unwrap();
        store
            .set_signed(REGISTRY.key("signed_int"), i32::MIN)
            .unwrap();
        store.timer_start(REGISTRY.key("timer_key")).unwrap();
        clock.advance(u32::MAX);
        store.timer_stop(REGISTRY.key("timer_key")).unwrap();
        assert_eq!(actual_encoded_size(&store, 24), estimate);
    }
}
