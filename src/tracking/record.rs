// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-resource tracking record and its map state machine.

One record exists per distinct [`ResourceIdentity`] ever observed; the
[`Registry`](crate::registry::Registry) owns it for the lifetime of the
underlying driver object. The record carries everything capture needs to
reconstruct what the application did to the object: which binding it was
first attached to, the usage hint, and the map state machine below.

Map states:

| State             | Meaning                                                      |
|-------------------|--------------------------------------------------------------|
| `Unmapped`        | No live mapping.                                             |
| `MappedRead`      | Read-only mapping; nothing to capture at unmap.              |
| `MappedWrite`     | Writable mapping; full range read back at unmap.             |
| `MappedIgnoreReal`| Coherent persistent mapping; content comes from the shadow diff engine, never from readback through the real pointer. |

Shadow storage outlives individual maps on purpose: a coherent persistent
mapping can be dropped and re-entered without the application reallocating
the store, and the baseline must survive across that. It is only released
when the record dies or the store itself is reallocated.
*/

use crate::error::Error;
use crate::handles::{BindCategory, BindTarget, ResourceIdentity};
use crate::registry::ResourceId;
use crate::tracking::shadow::{CaptureDelta, ShadowPair};

bitflags::bitflags! {
    /// Access bits of a map request, as the interception layer saw them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MapAccess: u32 {
        const READ              = 1 << 0;
        const WRITE             = 1 << 1;
        const INVALIDATE_RANGE  = 1 << 2;
        const INVALIDATE_BUFFER = 1 << 3;
        const FLUSH_EXPLICIT    = 1 << 4;
        const UNSYNCHRONIZED    = 1 << 5;
        const PERSISTENT        = 1 << 6;
        const COHERENT          = 1 << 7;
    }
}

/// Current mapping status of the tracked store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStatus {
    #[default]
    Unmapped,
    MappedRead,
    MappedWrite,
    /// Mapped coherent+persistent; the real pointer is not trusted for
    /// capture readback, the shadow diff engine supplies content instead.
    MappedIgnoreReal,
}

/// How the capture layer will obtain this mapping's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Content is read back through the direct pointer at unmap (or not at
    /// all for read-only maps).
    Direct,
    /// Content is produced by shadow diffing at each diff point.
    Shadowed,
    /// Shadow allocation failed; the map proceeds as `MappedWrite` with a
    /// full-range capture at unmap. Degraded, never lossy.
    DegradedFullRange,
}

/// Buffer usage hint the application declared at allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum UsageHint {
    #[default]
    Unknown,
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

/// Mutable mapping state of one tracked store.
#[derive(Debug)]
pub struct MapState {
    pub offset: usize,
    pub length: usize,
    pub access: MapAccess,
    pub status: MapStatus,
    /// The map request carried an invalidate bit; prior content is garbage.
    pub invalidate: bool,
    pub(crate) direct_ptr: *mut u8,
    pub(crate) persistent_ptr: *mut u8,
    /// Live coherent persistent mappings of the same store. Shadow storage
    /// must not be released while this is non-zero.
    pub persistent_maps: u32,
}

impl MapState {
    fn new() -> Self {
        MapState {
            offset: 0,
            length: 0,
            access: MapAccess::empty(),
            status: MapStatus::Unmapped,
            invalidate: false,
            direct_ptr: std::ptr::null_mut(),
            persistent_ptr: std::ptr::null_mut(),
            persistent_maps: 0,
        }
    }

    /// Clears per-map metadata after an unmap. Persistent bookkeeping is
    /// kept: a re-entered coherent map continues against the same baseline.
    fn clear(&mut self) {
        self.offset = 0;
        self.length = 0;
        self.access = MapAccess::empty();
        self.status = MapStatus::Unmapped;
        self.invalidate = false;
        self.direct_ptr = std::ptr::null_mut();
        if self.persistent_maps == 0 {
            self.persistent_ptr = std::ptr::null_mut();
        }
    }
}

/// One long-lived tracking record per driver object.
#[derive(Debug)]
pub struct ResourceTrackingRecord {
    identity: ResourceIdentity,
    id: ResourceId,
    binding_kind: Option<BindCategory>,
    usage_hint: UsageHint,
    map: MapState,
    shadow: Option<ShadowPair>,
}

//safety: the raw pointers are only dereferenced by the interception thread
//that owns the record's sharing group; independent groups never alias a store
unsafe impl Send for ResourceTrackingRecord {}

impl ResourceTrackingRecord {
    pub(crate) fn new(identity: ResourceIdentity, id: ResourceId) -> Self {
        ResourceTrackingRecord {
            identity,
            id,
            binding_kind: None,
            usage_hint: UsageHint::Unknown,
            map: MapState::new(),
            shadow: None,
        }
    }

    pub fn identity(&self) -> ResourceIdentity {
        self.identity
    }

    /// The capture-stream ID labeling this resource, independent of the
    /// driver's recycled name namespace.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn map_state(&self) -> &MapState {
        &self.map
    }

    pub fn has_shadow_storage(&self) -> bool {
        self.shadow.is_some()
    }

    pub fn set_usage_hint(&mut self, hint: UsageHint) {
        self.usage_hint = hint;
    }

    pub fn usage_hint(&self) -> UsageHint {
        self.usage_hint
    }

    /// Records the binding this object attaches through and checks it stays
    /// consistent across rebinds.
    ///
    /// The first named target fixes the binding kind. A later mismatch is a
    /// consistency violation: fatal in validation builds, logged and
    /// tolerated in release builds (the capture stays usable, the resource
    /// may just be mis-classified). [`BindTarget::None`] (handle-free
    /// addressing, no target named) is exempt.
    pub fn verify_data_type(&mut self, target: BindTarget) {
        let Some(binding) = target.binding() else {
            return;
        };
        match self.binding_kind {
            None => self.binding_kind = Some(binding),
            Some(existing) => {
                if existing != binding {
                    logwise::warn_sync!(
                        "resource {id} rebound to an incompatible target",
                        id = self.id.raw()
                    );
                    debug_assert_eq!(
                        existing, binding,
                        "inconsistent bind target for resource {:?}",
                        self.identity
                    );
                }
            }
        }
    }

    /// Non-failing form of [`Self::verify_data_type`]: does `target` match
    /// the binding this record already settled on?
    ///
    /// [`BindTarget::None`] never matches, even before any binding has been
    /// recorded: a raw "unset == unset" comparison would report a fresh
    /// record as already classified, and callers branching on that would
    /// skip recording the real binding.
    pub fn already_data_type(&self, target: BindTarget) -> bool {
        match target.binding() {
            Some(binding) => self.binding_kind == Some(binding),
            None => false,
        }
    }

    pub fn binding_kind(&self) -> Option<BindCategory> {
        self.binding_kind
    }

    /// Enters a mapped state for `length` bytes at `offset` within the store.
    ///
    /// Coherent persistent requests enter `MappedIgnoreReal` and lazily
    /// allocate the shadow pair, seeded from `ptr` (idempotent while storage
    /// already exists). If that allocation fails the map is downgraded to
    /// `MappedWrite` with full-range capture at unmap and
    /// [`MapMode::DegradedFullRange`] is returned.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `length` bytes from now
    /// until the matching [`Self::close_map`], and for coherent persistent
    /// maps until `persistent_maps` drops back to zero.
    pub unsafe fn open_map(
        &mut self,
        offset: usize,
        length: usize,
        access: MapAccess,
        ptr: *mut u8,
    ) -> Result<MapMode, Error> {
        if self.map.status != MapStatus::Unmapped {
            return Err(Error::AlreadyMapped);
        }
        if length == 0 || ptr.is_null() {
            return Err(Error::EmptyMap);
        }
        self.map.offset = offset;
        self.map.length = length;
        self.map.access = access;
        self.map.invalidate = access
            .intersects(MapAccess::INVALIDATE_RANGE | MapAccess::INVALIDATE_BUFFER);
        self.map.direct_ptr = ptr;

        if access.contains(MapAccess::PERSISTENT | MapAccess::COHERENT) {
            // the store may have been reallocated at a different size while
            // no coherent map was live; the stale baseline is useless then
            if self.map.persistent_maps == 0
                && self.shadow.as_ref().is_some_and(|s| s.len() != length)
            {
                self.shadow = None;
            }
            if self.shadow.is_none() {
                //safety: caller guarantees ptr is readable for length bytes
                self.shadow = unsafe { ShadowPair::alloc(ptr, length, 16) };
            }
            if self.shadow.is_none() {
                logwise::warn_sync!(
                    "shadow allocation of {length} bytes failed for resource {id}; degrading to full-range capture",
                    length = length,
                    id = self.id.raw()
                );
                self.map.status = MapStatus::MappedWrite;
                return Ok(MapMode::DegradedFullRange);
            }
            self.map.status = MapStatus::MappedIgnoreReal;
            self.map.persistent_ptr = ptr;
            self.map.persistent_maps += 1;
            Ok(MapMode::Shadowed)
        } else if access.contains(MapAccess::WRITE) {
            self.map.status = MapStatus::MappedWrite;
            Ok(MapMode::Direct)
        } else {
            self.map.status = MapStatus::MappedRead;
            Ok(MapMode::Direct)
        }
    }

    /// Leaves the mapped state, emitting whatever capture content the final
    /// byte state requires.
    ///
    /// `MappedRead` emits nothing. `MappedWrite` emits one full-range delta
    /// read back through the direct pointer. `MappedIgnoreReal` runs a final
    /// diff point and drops one live coherent map. Afterwards the record is
    /// `Unmapped` with per-map metadata cleared; shadow storage stays.
    pub fn close_map(&mut self, mut sink: impl FnMut(CaptureDelta)) -> Result<(), Error> {
        match self.map.status {
            MapStatus::Unmapped => return Err(Error::NotMapped),
            MapStatus::MappedRead => {}
            MapStatus::MappedWrite => {
                //safety: open_map's contract keeps direct_ptr valid for
                //length bytes until this call
                let bytes = unsafe {
                    std::slice::from_raw_parts(self.map.direct_ptr, self.map.length)
                };
                sink(CaptureDelta {
                    offset: self.map.offset,
                    bytes,
                });
            }
            MapStatus::MappedIgnoreReal => {
                self.run_diff(&mut sink);
                self.map.persistent_maps -= 1;
            }
        }
        self.map.clear();
        Ok(())
    }

    /// Runs a diff point for a live coherent persistent mapping.
    ///
    /// Called by the interception layer before a command consumes the store
    /// (draw, dispatch) and at frame boundaries. A no-op in every other
    /// state; the diff engine only ever runs for `MappedIgnoreReal`.
    pub fn diff_point(&mut self, mut sink: impl FnMut(CaptureDelta)) {
        if self.map.status == MapStatus::MappedIgnoreReal {
            self.run_diff(&mut sink);
        }
    }

    fn run_diff(&mut self, sink: &mut dyn FnMut(CaptureDelta)) {
        let Some(shadow) = self.shadow.as_mut() else {
            return;
        };
        let base = self.map.offset;
        //safety: open_map's contract keeps persistent_ptr valid while a
        //coherent map is live, which MappedIgnoreReal implies
        unsafe {
            shadow.diff_point(self.map.persistent_ptr, |delta| {
                sink(CaptureDelta {
                    offset: base + delta.offset,
                    bytes: delta.bytes,
                })
            });
        }
    }

    /// Releases shadow storage after the application reallocated or orphaned
    /// the underlying store.
    ///
    /// Never called from unmap: a coherent persistent mapping may be
    /// re-entered without a fresh allocation, and the baseline must survive.
    /// Refused (validation assert) while coherent maps are still live.
    pub fn invalidate_store(&mut self) {
        if self.map.persistent_maps != 0 {
            logwise::warn_sync!(
                "store of resource {id} invalidated with {live} coherent maps live",
                id = self.id.raw(),
                live = self.map.persistent_maps
            );
            debug_assert_eq!(
                self.map.persistent_maps, 0,
                "shadow storage released under a live coherent map"
            );
            return;
        }
        self.shadow = None;
        self.map.persistent_ptr = std::ptr::null_mut();
    }
}
