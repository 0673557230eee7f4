//! Replay identity restoration: a replayed session must rebuild the exact
//! identity graph the capture observed, deletion/reuse patterns included.

use frames_and_names::{Error, Registry, ResourceId};
use frames_and_names::handles::{ContextHandle, ResourceKind, ShareConfig};

#[test]
fn replay_reconstructs_recorded_ids() {
    let ctx = ContextHandle::from_raw(0xAB);

    // capture session: three buffers, whatever IDs the allocator issued
    let mut capture = Registry::new(ShareConfig::default());
    let mut recorded = Vec::new();
    for name in [4u32, 8, 15] {
        let identity = capture.resolve(ctx, ResourceKind::Buffer, name);
        let id = capture.record_for(identity).expect("capture record").id();
        recorded.push((name, id));
    }

    // replay session: creations are fed back through the same resolve/create
    // path, carrying the recorded IDs
    let mut replay = Registry::new(ShareConfig::default());
    replay.set_replay_resource_ids();
    for (name, id) in &recorded {
        let identity = replay.resolve(ctx, ResourceKind::Buffer, *name);
        let record = replay
            .record_for_replay(identity, *id)
            .expect("replay record");
        assert_eq!(record.id(), *id, "replay must not allocate fresh IDs");
    }
    assert_eq!(replay.record_count(), recorded.len());
}

#[test]
fn recorded_ids_survive_driver_name_reuse() {
    let ctx = ContextHandle::from_raw(1);

    // capture: create name 5, destroy it, driver recycles name 5
    let mut capture = Registry::new(ShareConfig::default());
    let identity = capture.resolve(ctx, ResourceKind::Buffer, 5);
    let first = capture.record_for(identity).expect("first").id();
    capture.destroy(identity);
    let second = capture.record_for(identity).expect("second").id();
    assert_ne!(first, second, "recycled names must get distinct stream IDs");

    // replay the same lifetime: id collision only if the capture diverged
    let mut replay = Registry::new(ShareConfig::default());
    replay.set_replay_resource_ids();
    let replay_identity = replay.resolve(ctx, ResourceKind::Buffer, 5);
    replay
        .record_for_replay(replay_identity, first)
        .expect("first life");
    replay.destroy(replay_identity);
    replay
        .record_for_replay(replay_identity, second)
        .expect("second life");
}

#[test]
fn diverged_capture_stream_is_fatal() {
    let ctx = ContextHandle::from_raw(1);
    let mut replay = Registry::new(ShareConfig::default());
    replay.set_replay_resource_ids();

    let a = replay.resolve(ctx, ResourceKind::Buffer, 1);
    let b = replay.resolve(ctx, ResourceKind::Buffer, 2);
    replay
        .record_for_replay(a, ResourceId::from_raw(7))
        .expect("live");

    // a second live object claiming ID 7 means capture and replay diverged
    match replay.record_for_replay(b, ResourceId::from_raw(7)) {
        Err(Error::ReplayIdCollision(id)) => assert_eq!(id.raw(), 7),
        other => panic!("expected ReplayIdCollision, got {other:?}"),
    }
}
