mod common;

use std::{
    sync::{Arc, Barrier},
    thread,
    time::Duration,
};

use common::{wait_for, Fixture, TEXT};
use lgn_asset_ref::{AssetHandle, AssetManager, LoadBehavior, LoadStatus, Resolution};

#[test]
fn concurrent_resolutions_dispatch_one_load() {
    const CALLERS: usize = 16;

    let fixture = Fixture::with_delay(Duration::from_millis(50));
    let id = fixture.add_asset("shared.txt", "shared");
    let resolver = Arc::new(fixture.resolver());
    let barrier = Arc::new(Barrier::new(CALLERS));

    let callers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut handle =
                    AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::QueueLoad);
                barrier.wait();
                let resolution = resolver.resolve(&mut handle, None).unwrap();
                (handle, resolution)
            })
        })
        .collect();

    let handles: Vec<AssetHandle> = callers
        .into_iter()
        .map(|caller| {
            let (handle, resolution) = caller.join().unwrap();
            assert!(matches!(
                resolution,
                Resolution::Queued | Resolution::AlreadyResident
            ));
            handle
        })
        .collect();

    assert_eq!(fixture.dispatch_count(), 1);
    for handle in &handles {
        assert!(handle.same_data(&handles[0]));
        assert_eq!(handle.block_until_load_complete(), LoadStatus::Ready);
    }
    assert_eq!(fixture.handler.load_count(), 1);
    assert_eq!(handles[0].get::<String>().unwrap().as_str(), "shared");
}

#[test]
fn concurrent_blocking_resolutions_all_wait() {
    const CALLERS: usize = 8;

    let fixture = Fixture::with_delay(Duration::from_millis(50));
    let id = fixture.add_asset("blocking.txt", "blocking");
    let resolver = Arc::new(fixture.resolver());
    let barrier = Arc::new(Barrier::new(CALLERS));

    let callers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut handle =
                    AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::PreLoad);
                barrier.wait();
                let resolution = resolver.resolve(&mut handle, None).unwrap();
                (handle.status(), resolution)
            })
        })
        .collect();

    for caller in callers {
        let (status, resolution) = caller.join().unwrap();
        assert_eq!(status, LoadStatus::Ready);
        assert!(matches!(
            resolution,
            Resolution::Loaded | Resolution::AlreadyResident
        ));
    }
    assert_eq!(fixture.dispatch_count(), 1);
}

#[test]
fn in_flight_load_keeps_record_alive() {
    let fixture = Fixture::with_delay(Duration::from_millis(100));
    let id = fixture.add_asset("orphan.txt", "orphan");

    let mut handle = AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::QueueLoad);
    assert_eq!(
        fixture.resolver().resolve(&mut handle, None).unwrap(),
        Resolution::Queued
    );
    drop(handle);

    // The queued request still holds the record.
    assert_eq!(fixture.registry.resident_count(), 1);
    assert!(wait_for(Duration::from_secs(5), || fixture.handler.load_count() == 1));
    assert!(wait_for(Duration::from_secs(5), || fixture.registry.resident_count() == 0));
    // The id is posted while the record is being dropped.
    assert!(wait_for(Duration::from_secs(5), || fixture.registry.collect_dropped() == 1));
    assert_eq!(fixture.dispatch_count(), 1);
}

#[test]
fn released_asset_is_loaded_again_on_next_request() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("cycle.txt", "cycle");
    let resolver = fixture.resolver();

    let mut first = AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::PreLoad);
    assert_eq!(resolver.resolve(&mut first, None).unwrap(), Resolution::Loaded);
    let clone = first.clone();
    drop(first);
    assert_eq!(fixture.registry.resident_count(), 1);
    drop(clone);

    assert!(wait_for(Duration::from_secs(5), || fixture.registry.resident_count() == 0));
    assert!(!fixture
        .registry
        .find_asset(id, LoadBehavior::Default)
        .is_bound());

    let mut second = AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::PreLoad);
    assert_eq!(resolver.resolve(&mut second, None).unwrap(), Resolution::Loaded);
    assert_eq!(fixture.dispatch_count(), 2);
    assert_eq!(fixture.handler.load_count(), 2);
}

#[test]
fn reload_runs_a_new_cycle_on_the_same_record() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("reload.txt", "before");
    let mut handle = AssetHandle::new(id, TEXT).with_load_behavior(LoadBehavior::PreLoad);
    assert_eq!(
        fixture.resolver().resolve(&mut handle, None).unwrap(),
        Resolution::Loaded
    );

    fixture.device.insert(id, "after");
    assert!(fixture.registry.reload(id));
    let data = handle.data().unwrap().clone();
    assert_eq!(data.wait(), LoadStatus::Ready);
    assert_eq!(handle.get::<String>().unwrap().as_str(), "after");
    assert_eq!(fixture.dispatch_count(), 2);

    assert!(!fixture.registry.reload(lgn_asset_ref::AssetId::generate(0)));
}
