//! Shared heartbeat service: the store and storage sink behind a critical
//! section, plus the debug surface.
//!
//! The store is shared between at least two execution contexts: foreground
//! code updating metrics and the periodic trigger collecting them. Every
//! operation here runs inside one critical section, and `collect` holds it
//! across the whole iterate-then-reset sequence so an update can never land
//! between snapshot and reset and be lost or double-counted.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{debug, error, info};

use crate::clock::Clock;
use crate::device::{DeviceInfoSource, SequenceSource};
use crate::error::MetricsError;
use crate::heartbeat::estimator::worst_case_event_size;
use crate::heartbeat::registry::MetricId;
use crate::heartbeat::serializer::serialize_heartbeat;
use crate::heartbeat::store::HeartbeatStore;
use crate::storage::EventStorage;

struct Inner<C: Clock, S: EventStorage> {
    store: HeartbeatStore<C>,
    storage: S,
}

/// Owns the heartbeat state and drives collection cycles.
///
/// All methods take `&self` and are safe to call from any context the
/// underlying critical-section implementation supports; none of them block
/// or suspend.
pub struct HeartbeatManager<C, S, I, Q>
where
    C: Clock,
    S: EventStorage,
    I: DeviceInfoSource,
    Q: SequenceSource,
{
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<C, S>>>,
    identity: I,
    sequence: Q,
}

impl<C, S, I, Q> HeartbeatManager<C, S, I, Q>
where
    C: Clock,
    S: EventStorage,
    I: DeviceInfoSource,
    Q: SequenceSource,
{
    pub const fn new(store: HeartbeatStore<C>, storage: S, identity: I, sequence: Q) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner { store, storage })),
            identity,
            sequence,
        }
    }

    /// See [`HeartbeatStore::set_unsigned`].
    pub fn set_unsigned(&self, id: MetricId, value: u32) -> Result<(), MetricsError> {
        self.inner
            .lock(|cell| cell.borrow_mut().store.set_unsigned(id, value))
    }

    /// See [`HeartbeatStore::set_signed`].
    pub fn set_signed(&self, id: MetricId, value: i32) -> Result<(), MetricsError> {
        self.inner
            .lock(|cell| cell.borrow_mut().store.set_signed(id, value))
    }

    /// See [`HeartbeatStore::add`].
    pub fn add(&self, id: MetricId, delta: i32) -> Result<(), MetricsError> {
        self.inner.lock(|cell| cell.borrow_mut().store.add(id, delta))
    }

    /// See [`HeartbeatStore::timer_start`].
    pub fn timer_start(&self, id: MetricId) -> Result<(), MetricsError> {
        self.inner
            .lock(|cell| cell.borrow_mut().store.timer_start(id))
    }

    /// See [`HeartbeatStore::timer_stop`].
    pub fn timer_stop(&self, id: MetricId) -> Result<(), MetricsError> {
        self.inner
            .lock(|cell| cell.borrow_mut().store.timer_stop(id))
    }

    /// See [`HeartbeatStore::read_unsigned`].
    pub fn read_unsigned(&self, id: MetricId) -> Result<u32, MetricsError> {
        self.inner.lock(|cell| cell.borrow().store.read_unsigned(id))
    }

    /// See [`HeartbeatStore::read_signed`].
    pub fn read_signed(&self, id: MetricId) -> Result<i32, MetricsError> {
        self.inner.lock(|cell| cell.borrow().store.read_signed(id))
    }

    /// See [`HeartbeatStore::read_timer`].
    pub fn read_timer(&self, id: MetricId) -> Result<u32, MetricsError> {
        self.inner.lock(|cell| cell.borrow().store.read_timer(id))
    }

    /// Runs one capture-and-commit cycle: serializes the current values
    /// into the storage sink and, on commit, zeroes the store for the next
    /// interval. The periodic trigger calls this once per heartbeat.
    pub fn collect(&self) -> Result<(), MetricsError> {
        let info = self.identity.device_info();
        let sequence = self.sequence.sequence();
        self.inner.lock(|cell| {
            let inner = &mut *cell.borrow_mut();
            serialize_heartbeat(&mut inner.store, &mut inner.storage, &info, sequence)
        })
    }

    /// Largest event the current registry can produce, for sizing the sink.
    /// Repeated capacity failures from [`collect`](Self::collect) mean the
    /// sink is smaller than this.
    pub fn worst_case_event_size(&self) -> usize {
        let info = self.identity.device_info();
        let sequence = self.sequence.sequence();
        self.inner
            .lock(|cell| worst_case_event_size(cell.borrow().store.registry(), &info, sequence))
    }

    /// Forces an out-of-schedule collection attempt, logging the outcome.
    pub fn debug_trigger(&self) {
        match self.collect() {
            Ok(()) => info!("heartbeat collected"),
            Err(e) => error!("heartbeat collection failed: {e}"),
        }
    }

    /// Logs the current value of every metric.
    pub fn debug_print(&self) {
        self.inner.lock(|cell| {
            let inner = cell.borrow();
            debug!("heartbeat values:");
            for snapshot in inner.store.iter() {
                debug!("  {}: {:?}", snapshot.name, snapshot.value);
            }
        });
    }
}
