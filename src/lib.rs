/*! frames_and_names is the resource-identity and state-tracking core of a
graphics-API capture/replay tool.

A capture tool sits between an application and its rendering driver, watching
every call. To replay what it saw, it has to answer two questions the driver
makes deliberately hard:

1. **Which object is this?** Drivers hand out integer names and recycle them
   after deletion, and the same name can mean one shared object or several
   per-context ones depending on the object kind and the vendor's sharing
   behavior.
2. **What did the application do to it?** Most state changes arrive through
   calls we can observe; the exception is coherent persistently mapped
   memory, which the application writes whenever it likes with no API call
   at all.

Here is a quick chart of the strategies for the second problem:

| Strategy                     | Observability needed      | Portability | Cost                                  |
|------------------------------|---------------------------|-------------|---------------------------------------|
| Hook explicit flush/unmap    | Application cooperates    | Excellent   | Free, but coherent maps never flush   |
| OS write-watch / page faults | Memory-protection tricks  | Poor        | Cheap, fragile, hard to test          |
| Double-buffered compare      | None                      | Excellent   | One copy + one compare per diff point |

This crate takes the third option, deliberately: it is portable and testable
in isolation, and the copy cost only applies to the (rare) coherently mapped
resources.

# What's here

* [`handles`] — [`ResourceKind`](handles::ResourceKind) and
  [`ResourceIdentity`](handles::ResourceIdentity): the canonical,
  context-aware identity of a driver object, normalized under the vendor's
  sharing rules.
* [`registry`] — [`Registry`]: resolves identities, issues replay-safe
  [`ResourceId`]s, and owns one
  [`ResourceTrackingRecord`](tracking::ResourceTrackingRecord) per tracked
  object. Supports replay identity restoration, so a replayed session
  reconstructs the exact identity graph the capture observed.
* [`tracking`] — the per-record map state machine and the shadow diff engine
  that turns unobservable coherent writes into byte-range deltas.

Everything here is in-memory and synchronous. The interception hooks, format
tables, serializer, and replay engine live elsewhere and talk to this core
through the types above.

# Example

```
use frames_and_names::handles::{ContextHandle, ResourceKind, ShareConfig};
use frames_and_names::registry::Registry;
use frames_and_names::tracking::MapAccess;

let mut registry = Registry::new(ShareConfig::default());
let ctx = ContextHandle::from_raw(0x7000);

// the interception layer saw the application touch buffer 3
let identity = registry.resolve(ctx, ResourceKind::Buffer, 3);
let record = registry.record_for(identity)?;

// the application maps it persistent+coherent
let mut store = vec![0u8; 4096];
let ptr = store.as_mut_ptr();
let access = MapAccess::WRITE | MapAccess::PERSISTENT | MapAccess::COHERENT;
// SAFETY: store outlives the mapping
unsafe { record.open_map(0, store.len(), access, ptr)? };

// ...the application writes through ptr with no API call...
unsafe { *ptr.add(100) = 0xFF };

// before the next draw, ask the diff engine what changed
let mut captured = Vec::new();
record.diff_point(|delta| captured.push((delta.offset, delta.bytes.to_vec())));
assert_eq!(captured, vec![(100, vec![0xFF])]);

record.close_map(|_delta| { /* hand final content to the serializer */ })?;
# Ok::<(), frames_and_names::Error>(())
```

# Concurrency

A rendering context's call stream is serialized by the interception layer,
so nothing here locks. One [`Registry`] serves one context-sharing group;
independent groups run fully in parallel with independent registries.
*/

pub mod handles;
pub mod registry;
pub mod tracking;

mod error;

pub use error::Error;
pub use registry::{Registry, ResourceId};
