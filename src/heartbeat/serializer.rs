//! Heartbeat event serialization: walks the store, encodes the canonical
//! CBOR event, and drives the storage transaction.
//!
//! The envelope layout and every numeric key below are a fixed wire
//! contract shared with the remote decoder. Changing a key number, the key
//! order, or the schema version breaks decoding for every fielded device.

use core::fmt::Write as _;

use heapless::String;

use crate::cbor::{CborSink, CborWriter, SinkFull};
use crate::clock::Clock;
use crate::device::DeviceInfo;
use crate::error::MetricsError;
use crate::heartbeat::store::{HeartbeatStore, MetricValue};
use crate::storage::EventStorage;

/// Top-level map keys, in emission order.
const KEY_SCHEMA_VERSION: u32 = 2;
const KEY_EVENT_TYPE: u32 = 3;
const KEY_DEVICE_SERIAL: u32 = 7;
const KEY_SOFTWARE_TYPE: u32 = 10;
const KEY_SOFTWARE_VERSION: u32 = 9;
const KEY_SEQUENCE_ID: u32 = 6;
const KEY_METRICS: u32 = 4;

/// Key of the value array inside the metrics container.
const KEY_METRIC_VALUES: u32 = 1;

/// Number of top-level key/value pairs.
const EVENT_KEY_COUNT: usize = 7;

const SCHEMA_VERSION: u32 = 1;
const EVENT_TYPE_HEARTBEAT: u32 = 1;

/// Fixed prefix of the serialized sequence id string.
const SEQUENCE_ID_PREFIX: &str = "evt_";

/// Widest sequence id string: the prefix plus 10 decimal digits.
pub(crate) const MAX_SEQUENCE_ID_LEN: usize = SEQUENCE_ID_PREFIX.len() + 10;

fn format_sequence_id(sequence: u32) -> String<MAX_SEQUENCE_ID_LEN> {
    let mut out = String::new();
    // Cannot exceed capacity: prefix plus at most 10 decimal digits.
    let _ = write!(out, "{SEQUENCE_ID_PREFIX}{sequence}");
    out
}

/// Encodes one complete heartbeat event into `writer`.
///
/// Shared between the serializer (writing into a storage transaction) and
/// the worst-case estimator (writing into a byte-counting sink), so both
/// always agree on the envelope.
pub(crate) fn encode_event<S: CborSink>(
    writer: &mut CborWriter<S>,
    info: &DeviceInfo,
    sequence: u32,
    values: impl Iterator<Item = MetricValue>,
    metric_count: usize,
) -> Result<(), SinkFull> {
    writer.map_header(EVENT_KEY_COUNT)?;
    writer.unsigned(KEY_SCHEMA_VERSION)?;
    writer.unsigned(SCHEMA_VERSION)?;
    writer.unsigned(KEY_EVENT_TYPE)?;
    writer.unsigned(EVENT_TYPE_HEARTBEAT)?;
    writer.unsigned(KEY_DEVICE_SERIAL)?;
    writer.text(&info.serial)?;
    writer.unsigned(KEY_SOFTWARE_TYPE)?;
    writer.text(&info.software_type)?;
    writer.unsigned(KEY_SOFTWARE_VERSION)?;
    writer.text(&info.software_version)?;
    writer.unsigned(KEY_SEQUENCE_ID)?;
    writer.text(&format_sequence_id(sequence))?;
    writer.unsigned(KEY_METRICS)?;
    writer.map_header(1)?;
    writer.unsigned(KEY_METRIC_VALUES)?;
    writer.array_header(metric_count)?;
    for value in values {
        match value {
            // Timer durations share the unsigned encoding on the wire.
            MetricValue::Unsigned(v) | MetricValue::Timer(v) => writer.unsigned(v)?,
            MetricValue::Signed(v) => writer.signed(v)?,
        }
    }
    Ok(())
}

/// Sink staging encoded bytes into an open storage transaction.
struct TxSink<'a, S: EventStorage> {
    storage: &'a mut S,
}

impl<S: EventStorage> CborSink for TxSink<'_, S> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkFull> {
        // Appends only fail for capacity; the transaction is rolled back
        // by the caller.
        self.storage.append(bytes).map_err(|_| SinkFull)
    }
}

/// Runs one complete heartbeat capture-and-commit cycle.
///
/// On success the event is committed and the store is zeroed for the next
/// interval. On any failure the store is left bit-identical to its
/// pre-attempt state and nothing is committed, so the next scheduled
/// attempt retries with the accumulated data intact.
pub fn serialize_heartbeat<C: Clock, S: EventStorage>(
    store: &mut HeartbeatStore<C>,
    storage: &mut S,
    info: &DeviceInfo,
    sequence: u32,
) -> Result<(), MetricsError> {
    storage.begin_write().map_err(MetricsError::StorageBegin)?;

    let metric_count = store.registry().count();
    let result = {
        let mut writer = CborWriter::new(TxSink {
            storage: &mut *storage,
        });
        encode_event(
            &mut writer,
            info,
            sequence,
            store.iter().map(|snapshot| snapshot.value),
            metric_count,
        )
    };

    match result {
        Ok(()) => {
            storage
                .finish_write(false)
                .map_err(MetricsError::StorageCommit)?;
            store.reset_all();
            Ok(())
        }
        Err(SinkFull) => {
            // The sink discards staged bytes on rollback regardless of the
            // outcome here; the capacity failure is what the caller acts on.
            let _ = storage.finish_write(true);
            Err(MetricsError::StorageCapacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::FakeClock;
    use crate::error::StorageError;
    use crate::heartbeat::registry::{MetricDef, MetricId, MetricRegistry, MetricType};
    use crate::storage::RamEventStorage;

    static DEFS: &[MetricDef] = &[
        MetricDef::new("unsigned_int", MetricType::Unsigned),
        MetricDef::new("signed_int", MetricType::Signed),
        MetricDef::new("timer_key", MetricType::Timer),
    ];
    static REGISTRY: MetricRegistry = MetricRegistry::new(DEFS);

    const UNSIGNED_INT: MetricId = REGISTRY.key("unsigned_int");
    const SIGNED_INT: MetricId = REGISTRY.key("signed_int");
    const TIMER_KEY: MetricId = REGISTRY.key("timer_key");

    // {
    //   "2": 1,
    //   "3": 1,
    //   "7": "DAABBCCDD",
    //   "10": "main",
    //   "9": "1.2.3",
    //   "6": "evt_24",
    //   "4": { "1": [ 1000, -1000, 1234 ] }
    // }
    const EXPECTED_EVENT: &[u8] = &[
        0xa7, 0x02, 0x01, 0x03, 0x01, 0x07, 0x69, 0x44, 0x41, 0x41, 0x42, 0x42, 0x43, 0x43, 0x44,
        0x44, 0x0a, 0x64, 0x6d, 0x61, 0x69, 0x6e, 0x09, 0x65, 0x31, 0x2e, 0x32, 0x2e, 0x33, 0x06,
        0x66, 0x65, 0x76, 0x74, 0x5f, 0x32, 0x34, 0x04, 0xa1, 0x01, 0x83, 0x19, 0x03, 0xe8, 0x39,
        0x03, 0xe7, 0x19, 0x04, 0xd2,
    ];

    fn device_info() -> DeviceInfo {
        DeviceInfo::new("DAABBCCDD", "1.2.3", "main").unwrap()
    }

    fn populated_store() -> HeartbeatStore<FakeClock> {
        let clock = FakeClock::default();
        let mut store = HeartbeatStore::new(&REGISTRY, clock.clone());
        store.set_unsigned(UNSIGNED_INT, 1000).unwrap();
        store.set_signed(SIGNED_INT, -1000).unwrap();
        store.timer_start(TIMER_KEY).unwrap();
        clock.advance(1234);
        store.timer_stop(TIMER_KEY).unwrap();
        store
    }

    #[test]
    fn test_serialized_event_matches_expected_bytes() {
        let mut store = populated_store();
        let mut storage = RamEventStorage::<64>::new();

        serialize_heartbeat(&mut store, &mut storage, &device_info(), 24).unwrap();

        assert_eq!(storage.committed(), EXPECTED_EVENT);
    }

    #[test]
    fn test_successful_commit_starts_next_interval() {
        let mut store = populated_store();
        let mut storage = RamEventStorage::<64>::new();

        serialize_heartbeat(&mut store, &mut storage, &device_info(), 24).unwrap();

        assert_eq!(store.read_unsigned(UNSIGNED_INT).unwrap(), 0);
        assert_eq!(store.read_signed(SIGNED_INT).unwrap(), 0);
        assert_eq!(store.read_timer(TIMER_KEY).unwrap(), 0);
    }

    #[test]
    fn test_sequence_id_formatting() {
        assert_eq!(format_sequence_id(24).as_str(), "evt_24");
        assert_eq!(format_sequence_id(0).as_str(), "evt_0");
        assert_eq!(format_sequence_id(u32::MAX).as_str(), "evt_4294967295");
    }

    #[test]
    fn test_every_undersized_capacity_rolls_back() {
        // Sweep every capacity one byte short of the exact encoding down to
        // zero: each attempt must report a capacity failure, commit nothing,
        // and leave the store untouched.
        for capacity in 0..EXPECTED_EVENT.len() {
            let mut store = populated_store();
            let mut storage = RamEventStorage::<64>::new();
            storage.set_capacity_limit(capacity);

            let result = serialize_heartbeat(&mut store, &mut storage, &device_info(), 24);

            assert_eq!(result, Err(MetricsError::StorageCapacity));
            assert_eq!(storage.committed(), &[]);
            assert_eq!(store.read_unsigned(UNSIGNED_INT).unwrap(), 1000);
            assert_eq!(store.read_signed(SIGNED_INT).unwrap(), -1000);
            assert_eq!(store.read_timer(TIMER_KEY).unwrap(), 1234);
        }
    }

    #[test]
    fn test_exact_capacity_succeeds() {
        let mut store = populated_store();
        let mut storage = RamEventStorage::<64>::new();
        storage.set_capacity_limit(EXPECTED_EVENT.len());

        serialize_heartbeat(&mut store, &mut storage, &device_info(), 24).unwrap();

        assert_eq!(storage.committed(), EXPECTED_EVENT);
    }

    struct BeginFails;

    impl EventStorage for BeginFails {
        fn begin_write(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Busy)
        }

        fn append(&mut self, _bytes: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::NoTransaction)
        }

        fn finish_write(&mut self, _rollback: bool) -> Result<(), StorageError> {
            Err(StorageError::NoTransaction)
        }
    }

    #[test]
    fn test_begin_failure_aborts_with_state_intact() {
        let mut store = populated_store();
        let result = serialize_heartbeat(&mut store, &mut BeginFails, &device_info(), 24);
        assert_eq!(
            result,
            Err(MetricsError::StorageBegin(StorageError::Busy))
        );
        assert_eq!(store.read_unsigned(UNSIGNED_INT).unwrap(), 1000);
    }

    /// Accepts every append but refuses to commit.
    struct CommitFails {
        inner: RamEventStorage<64>,
    }

    impl EventStorage for CommitFails {
        fn begin_write(&mut self) -> Result<(), StorageError> {
            self.inner.begin_write()
        }

        fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
            self.inner.append(bytes)
        }

        fn finish_write(&mut self, rollback: bool) -> Result<(), StorageError> {
            self.inner.finish_write(true)?;
            if rollback {
                Ok(())
            } else {
                Err(StorageError::CommitFailed)
            }
        }
    }

    #[test]
    fn test_commit_failure_keeps_accumulated_values() {
        let mut store = populated_store();
        let mut storage = CommitFails {
            inner: RamEventStorage::new(),
        };

        let result = serialize_heartbeat(&mut store, &mut storage, &device_info(), 24);

        assert_eq!(
            result,
            Err(MetricsError::StorageCommit(StorageError::CommitFailed))
        );
        assert_eq!(store.read_unsigned(UNSIGNED_INT).unwrap(), 1000);
        assert_eq!(store.read_timer(TIMER_KEY).unwrap(), 1234);
    }
}
