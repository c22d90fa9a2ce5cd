mod common;

use common::{Fixture, TEXT, UNHANDLED};
use lgn_asset_ref::{
    filters,
    serializer::{
        binary, text, AssetReference, AssetSerializer, Endianness, LoadFlags, CURRENT_VERSION,
        MAX_HINT_LENGTH,
    },
    AssetHandle, AssetId, DecodeError, LoadBehavior, LoadStatus, Resolution, SerializeError,
};

fn encoded(id: AssetId, hint: &str, load_behavior: LoadBehavior) -> Vec<u8> {
    binary::encode(
        &AssetReference {
            id,
            asset_type: TEXT,
            hint: hint.to_owned(),
            load_behavior,
        },
        Endianness::Little,
    )
}

#[test]
fn load_resolves_decoded_reference() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("level/intro.txt", "intro");
    let serializer = fixture.serializer();
    let data = encoded(id, "level/intro.txt", LoadBehavior::PreLoad);

    let mut target = AssetHandle::default();
    let resolution = serializer
        .load(&mut target, &data, CURRENT_VERSION, Endianness::Little)
        .unwrap();

    assert_eq!(resolution, Resolution::Loaded);
    assert_eq!(target.id(), id);
    assert_eq!(target.auto_load_behavior(), LoadBehavior::PreLoad);
    assert_eq!(target.get::<String>().unwrap().as_str(), "intro");
}

#[test]
fn save_then_load_recovers_reference() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("save.txt", "saved");
    let serializer = fixture.serializer();
    let source = AssetHandle::new(id, TEXT)
        .with_hint("save.txt")
        .with_load_behavior(LoadBehavior::NoLoad);

    let data = serializer.save(&source, Endianness::Big);
    let mut target = AssetHandle::default();
    let resolution = serializer
        .load(&mut target, &data, CURRENT_VERSION, Endianness::Big)
        .unwrap();

    assert_eq!(resolution, Resolution::Deferred);
    assert!(AssetSerializer::compare_value_data(&source, &target));
    assert_eq!(target.hint(), "save.txt");
    assert_eq!(target.auto_load_behavior(), LoadBehavior::NoLoad);
}

#[test]
fn old_version_keeps_runtime_load_behavior() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("old.txt", "old");
    let serializer = fixture.serializer();
    let data = encoded(id, "old.txt", LoadBehavior::QueueLoad);

    let mut target = AssetHandle::new(AssetId::INVALID, TEXT)
        .with_hint("runtime hint")
        .with_load_behavior(LoadBehavior::NoLoad);
    let resolution = serializer.load(&mut target, &data, 0, Endianness::Little).unwrap();

    assert_eq!(resolution, Resolution::Deferred);
    assert_eq!(target.id(), id);
    assert_eq!(target.hint(), "runtime hint");
    assert_eq!(target.auto_load_behavior(), LoadBehavior::NoLoad);

    let resolution = serializer.load(&mut target, &data, 1, Endianness::Little).unwrap();
    assert_eq!(resolution, Resolution::Deferred);
    assert_eq!(target.hint(), "old.txt");
}

#[test]
fn short_stream_leaves_target_untouched() {
    let fixture = Fixture::new();
    let serializer = fixture.serializer();
    let original = AssetId::generate(0);
    let data = encoded(AssetId::generate(0), "x", LoadBehavior::QueueLoad);

    let mut target = AssetHandle::new(original, TEXT).with_hint("kept");
    let result = serializer.load(&mut target, &data[..data.len() - 1], 2, Endianness::Little);

    assert!(matches!(
        result,
        Err(SerializeError::Decode(DecodeError::StreamTooShort { .. }))
    ));
    assert_eq!(target.id(), original);
    assert_eq!(target.hint(), "kept");
    assert_eq!(fixture.dispatch_count(), 0);
}

#[test]
fn oversized_hint_does_not_fail_the_load() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("long.txt", "long");
    let serializer = fixture.serializer();
    let long_hint = "h".repeat(MAX_HINT_LENGTH * 2);
    let data = encoded(id, &long_hint, LoadBehavior::QueueLoad);

    let mut target = AssetHandle::default();
    let resolution = serializer
        .load(&mut target, &data, CURRENT_VERSION, Endianness::Little)
        .unwrap();

    assert_eq!(resolution, Resolution::Queued);
    assert_eq!(target.auto_load_behavior(), LoadBehavior::QueueLoad);
    assert_eq!(target.block_until_load_complete(), LoadStatus::Ready);
    // The catalog path replaces the truncated hint once the asset is requested.
    assert_eq!(target.hint(), "long.txt");
}

#[test]
fn filtered_load_skips_dispatch() {
    let fixture = Fixture::new();
    let id = fixture.add_asset("filtered.txt", "filtered");
    let serializer = fixture.serializer();
    let data = encoded(id, "filtered.txt", LoadBehavior::PreLoad);
    let filter = filters::no_asset_loading();

    let mut target = AssetHandle::default();
    let resolution = serializer
        .load_with_filter(
            &mut target,
            &data,
            CURRENT_VERSION,
            Endianness::Little,
            Some(&filter),
        )
        .unwrap();

    assert_eq!(resolution, Resolution::Filtered { bound: false });
    assert_eq!(target.id(), id);
    assert_eq!(fixture.dispatch_count(), 0);
}

#[test]
fn text_load_remaps_legacy_id() {
    let fixture = Fixture::new();
    let canonical = fixture.add_asset("new/place.txt", "moved");
    let legacy = fixture.add_legacy_id(canonical);
    let serializer = fixture.serializer();

    let reference = AssetReference {
        id: legacy,
        asset_type: TEXT,
        hint: "old/place.txt".to_owned(),
        load_behavior: LoadBehavior::PreLoad,
    };
    let mut target = AssetHandle::default();
    let resolution = serializer
        .load_text(&mut target, &text::to_text(&reference, 2), 2, None)
        .unwrap();

    assert_eq!(resolution, Resolution::Loaded);
    assert_eq!(target.id(), canonical);
    assert_eq!(target.hint(), "new/place.txt");
    assert_eq!(target.get::<String>().unwrap().as_str(), "moved");
}

#[test]
fn malformed_text_is_reported() {
    let fixture = Fixture::new();
    let serializer = fixture.serializer();
    let mut target = AssetHandle::default();

    let result = serializer.load_text(&mut target, "id={nonsense", 2, None);
    assert!(matches!(result, Err(SerializeError::Text(_))));
    assert!(!target.id().is_valid());
}

#[test]
fn binary_and_text_forms_convert() {
    let fixture = Fixture::new();
    let serializer = fixture.serializer();
    let id = AssetId::generate(5);
    let data = encoded(id, "convert/me.txt", LoadBehavior::QueueLoad);

    let text_form = serializer
        .data_to_text(&data, CURRENT_VERSION, Endianness::Little)
        .unwrap();
    assert!(text_form.ends_with(",hint={convert/me.txt},loadBehavior=1"));

    let back = serializer
        .text_to_data(&text_form, CURRENT_VERSION, Endianness::Little)
        .unwrap();
    assert_eq!(back, data);

    // Converting older data fills the missing fields with defaults.
    let v0_text = serializer.data_to_text(&data, 0, Endianness::Little).unwrap();
    assert!(v0_text.ends_with(",hint={},loadBehavior=3"));
}

#[test]
fn batch_strictness_decides_overall_success() {
    let fixture = Fixture::new();
    let serializer = fixture.serializer();
    let good = fixture.add_asset("good.txt", "good");
    let good_data = encoded(good, "good.txt", LoadBehavior::PreLoad);
    let unhandled_data = binary::encode(
        &AssetReference {
            id: AssetId::generate(0),
            asset_type: UNHANDLED,
            hint: String::new(),
            load_behavior: LoadBehavior::QueueLoad,
        },
        Endianness::Little,
    );
    let short_data = good_data[..10].to_vec();

    for strict in [false, true] {
        let mut targets = vec![AssetHandle::default(); 3];
        let inputs = [&good_data, &unhandled_data, &short_data];
        let report = serializer.load_batch(
            targets
                .iter_mut()
                .zip(inputs.iter().map(|data| data.as_slice())),
            CURRENT_VERSION,
            Endianness::Little,
            None,
            LoadFlags { strict },
        );

        assert_eq!(report.resolutions.len(), 1);
        assert_eq!(report.resolutions[0], (0, Resolution::Loaded));
        let failed: Vec<usize> = report.failures.iter().map(|(index, _)| *index).collect();
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(report.is_success(), !strict);
        assert!(targets[0].is_ready());
        assert!(!targets[1].id().is_valid());
    }
}
