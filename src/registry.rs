// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Identity resolution, capture-stream IDs, and the tracking record store.

The registry is the front door of the capture core. For every object handle
the interception layer observes it resolves a canonical
[`ResourceIdentity`], then looks up or lazily creates the
[`ResourceTrackingRecord`] that owns the object's capture state.

Records are labeled with a [`ResourceId`], a monotonically increasing value
unique within the registry. Driver names are recycled after deletion, so they
cannot label resources in a capture stream; these IDs can. The counter is
registry-scoped rather than a process global so independent capture sessions
(and tests) stay isolated.

During replay the registry is switched into identity-preserving mode with
[`Registry::set_replay_resource_ids`]: record creation then takes the ID
recorded in the capture stream instead of allocating a fresh one, which
reconstructs the exact identity graph the capture observed, including
deletion and reuse patterns.

One registry serves one sharing group's serialized call stream; independent
groups get independent registries and never synchronize.
*/

use crate::error::Error;
use crate::handles::{ContextHandle, ResourceIdentity, ResourceKind, ShareConfig};
use crate::tracking::record::ResourceTrackingRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Capture-stream label for one resource, unique within a [`Registry`].
///
/// `0` is reserved for "no resource".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceId(u64);

impl ResourceId {
    pub const NULL: ResourceId = ResourceId(0);

    pub fn from_raw(raw: u64) -> Self {
        ResourceId(raw)
    }
    pub fn raw(self) -> u64 {
        self.0
    }
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdMode {
    Capture,
    Replay,
}

/// Owns every tracking record of one sharing group, keyed by identity.
#[derive(Debug)]
pub struct Registry {
    config: ShareConfig,
    next_id: u64,
    mode: IdMode,
    /// IDs currently backed by a live replay-time object.
    live_replay_ids: BTreeSet<ResourceId>,
    records: BTreeMap<ResourceIdentity, ResourceTrackingRecord>,
}

impl Registry {
    pub fn new(config: ShareConfig) -> Self {
        Registry {
            config,
            next_id: 1,
            mode: IdMode::Capture,
            live_replay_ids: BTreeSet::new(),
            records: BTreeMap::new(),
        }
    }

    /// Resolves a raw (context, kind, name) triple to its canonical identity.
    ///
    /// Pure function of the inputs and the injected [`ShareConfig`]; never
    /// creates a record. Names `0` and all-bits-set resolve to the null
    /// identity.
    pub fn resolve(
        &self,
        ctx: ContextHandle,
        kind: ResourceKind,
        name: u32,
    ) -> ResourceIdentity {
        ResourceIdentity::new(&self.config, ctx, kind, name)
    }

    /// Issues the next capture-stream ID. Monotonic, never recycled.
    pub fn new_unique_id(&mut self) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Switches the registry into replay identity-preserving mode.
    ///
    /// From here on records are created through
    /// [`Self::record_for_replay`] with the IDs recorded at capture time.
    pub fn set_replay_resource_ids(&mut self) {
        self.mode = IdMode::Replay;
    }

    pub fn is_replaying(&self) -> bool {
        self.mode == IdMode::Replay
    }

    /// Looks up the record for `identity`, creating it on first touch.
    ///
    /// Creation is lazy: the interception layer may first observe a handle
    /// long after the application created it. The store holds at most one
    /// record per identity. The null identity is never tracked.
    pub fn record_for(
        &mut self,
        identity: ResourceIdentity,
    ) -> Result<&mut ResourceTrackingRecord, Error> {
        if identity.is_null() {
            return Err(Error::NullResource);
        }
        if !self.records.contains_key(&identity) {
            let id = self.new_unique_id();
            self.records
                .insert(identity, ResourceTrackingRecord::new(identity, id));
        }
        Ok(self
            .records
            .get_mut(&identity)
            .expect("record inserted above"))
    }

    /// Replay-mode record creation carrying the recorded capture-stream ID.
    ///
    /// Fails with [`Error::ReplayIdCollision`] if `recorded` is already
    /// backed by a live replay object — the capture stream and the replay
    /// state have diverged irreconcilably and the session must stop.
    pub fn record_for_replay(
        &mut self,
        identity: ResourceIdentity,
        recorded: ResourceId,
    ) -> Result<&mut ResourceTrackingRecord, Error> {
        if self.mode != IdMode::Replay {
            return Err(Error::NotReplaying);
        }
        if identity.is_null() || recorded.is_null() {
            return Err(Error::NullResource);
        }
        if let Some(existing) = self.records.get(&identity) {
            if existing.id() != recorded {
                return Err(Error::ReplayIdCollision(recorded));
            }
            return Ok(self.records.get_mut(&identity).expect("checked above"));
        }
        if !self.live_replay_ids.insert(recorded) {
            return Err(Error::ReplayIdCollision(recorded));
        }
        self.records
            .insert(identity, ResourceTrackingRecord::new(identity, recorded));
        Ok(self
            .records
            .get_mut(&identity)
            .expect("record inserted above"))
    }

    pub fn lookup(&self, identity: ResourceIdentity) -> Option<&ResourceTrackingRecord> {
        self.records.get(&identity)
    }

    pub fn lookup_mut(
        &mut self,
        identity: ResourceIdentity,
    ) -> Option<&mut ResourceTrackingRecord> {
        self.records.get_mut(&identity)
    }

    /// Drops the record when the application destroys the underlying handle.
    ///
    /// Shadow storage is released with the record. In replay mode the
    /// recorded ID is retired so a later replayed creation may reuse it,
    /// matching the driver's own name recycling.
    pub fn destroy(&mut self, identity: ResourceIdentity) -> bool {
        match self.records.remove(&identity) {
            Some(record) => {
                self.live_replay_ids.remove(&record.id());
                true
            }
            None => false,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
