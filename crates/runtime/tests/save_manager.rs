mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Tracked, next_load, next_save, start};
use save_runtime::{
    BlobPath, Event, FragmentError, FragmentPayload, InMemoryStorage, PipelineIssue, SaveError,
    SaveHeader, SaveKind, SaveStorage, SaveableSystem, Topic, UserSettings,
};

/// System whose gather always fails.
struct Broken;

impl SaveableSystem for Broken {
    fn fragment_name(&self) -> String {
        "Broken".into()
    }

    fn gather_save_data(&self) -> Result<Option<FragmentPayload>, FragmentError> {
        Err(FragmentError::Encode("refusing to serialize".into()))
    }

    fn restore_from_save_data(&self, _: &FragmentPayload) -> Result<(), FragmentError> {
        Ok(())
    }
}

fn header_at(memory: &InMemoryStorage, slot: u32) -> Option<SaveHeader> {
    memory
        .blob(&BlobPath::header(slot))
        .map(|bytes| SaveHeader::from_json(&bytes).expect("header should decode"))
}

async fn seed_slot(memory: &InMemoryStorage, slot: u32, name: &str, fragments: &[(&str, Vec<u8>)]) {
    let header = SaveHeader::new(slot, name, Duration::from_secs(10));
    memory
        .write_blob(&BlobPath::header(slot), &header.to_json().unwrap())
        .await
        .unwrap();
    for (fragment, bytes) in fragments {
        memory
            .write_blob(&BlobPath::fragment(slot, *fragment), bytes)
            .await
            .unwrap();
    }
}

fn items(list: &[&str]) -> Vec<u8> {
    let list: Vec<String> = list.iter().map(|s| s.to_string()).collect();
    FragmentPayload::encode(&list).unwrap().into_bytes()
}

#[tokio::test(start_paused = true)]
async fn test_requests_while_pending_fail_with_busy() {
    let memory = Arc::new(InMemoryStorage::new().with_latency(Duration::from_millis(50)));
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &["sword"]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(1, "Aria").await.unwrap();
    assert!(handle.is_busy().await.unwrap());

    assert!(matches!(
        handle.request_new_game_save(2, "Brann").await,
        Err(SaveError::Busy)
    ));
    assert!(matches!(handle.request_save_progress().await, Err(SaveError::Busy)));
    assert!(matches!(
        handle.request_save_specific_fragment(&inventory).await,
        Err(SaveError::Busy)
    ));
    assert!(matches!(handle.request_load_from_slot(1).await, Err(SaveError::Busy)));
    assert!(matches!(handle.request_delete_slot(1).await, Err(SaveError::Busy)));
    assert!(matches!(
        handle.set_active_save_slot(Some(3)).await,
        Err(SaveError::Busy)
    ));

    // Rejected requests left no trace.
    assert_eq!(handle.active_save_slot().await.unwrap(), Some(1));
    assert!(memory.blob(&BlobPath::header(2)).is_none());

    let report = next_save(&mut saves).await;
    assert_eq!(report.slot, 1);
    assert!(report.success());
    assert!(!handle.is_busy().await.unwrap());

    handle.request_save_progress().await.unwrap();
    assert!(next_save(&mut saves).await.success());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_save_progress_writes_every_fragment_and_current_playtime() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    let quests = Tracked::new("Quests", &[]);
    handle.register(&inventory).await.unwrap();
    handle.register(&quests).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(0, "Brann").await.unwrap();
    next_save(&mut saves).await;

    tokio::time::advance(Duration::from_secs(90)).await;
    inventory.set_items(&["sword", "shield"]);
    quests.set_items(&["find the well"]);
    let before = handle.current_total_play_time().await.unwrap();

    handle.request_save_progress().await.unwrap();
    let report = next_save(&mut saves).await;

    assert!(report.success());
    assert_eq!(report.kind, SaveKind::Full);
    assert_eq!(report.written, vec!["Inventory", "Quests"]);
    for participant in [&inventory, &quests] {
        assert_eq!(
            memory.blob(&BlobPath::fragment(0, participant.fragment_name())),
            Some(participant.payload().into_bytes())
        );
    }

    let header = header_at(&memory, 0).unwrap();
    assert_eq!(header.slot_name, "Brann");
    assert!(header.play_time >= before);
    assert!(before >= Duration::from_secs(90));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_saving_one_fragment_twice_is_byte_identical() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);
    let mut slots = system.subscribe(Topic::Slots);

    handle.request_new_game_save(0, "Aria").await.unwrap();
    next_save(&mut saves).await;
    assert_eq!(slots.recv().await.unwrap(), Event::SlotListChanged);
    let header_before = memory.blob(&BlobPath::header(0));

    inventory.set_items(&["potion"]);
    let path = BlobPath::fragment(0, "Inventory");

    handle.request_save_specific_fragment(&inventory).await.unwrap();
    let first_report = next_save(&mut saves).await;
    let first = memory.blob(&path);

    handle.request_save_specific_fragment(&inventory).await.unwrap();
    let second_report = next_save(&mut saves).await;
    let second = memory.blob(&path);

    assert_eq!(first_report.kind, SaveKind::Fragment);
    assert!(first_report.success() && second_report.success());
    assert!(first.is_some());
    assert_eq!(first, second);
    // Fragment saves leave the header and the slot list alone.
    assert_eq!(memory.blob(&BlobPath::header(0)), header_before);
    assert!(slots.try_recv().is_err());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_save_then_load_restores_gathered_state() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);
    let mut loads = system.subscribe(Topic::Load);

    handle.request_new_game_save(0, "Aria").await.unwrap();
    next_load(&mut loads).await;
    next_save(&mut saves).await;

    inventory.set_items(&["sword", "rope"]);
    handle.request_save_progress().await.unwrap();
    next_save(&mut saves).await;

    inventory.set_items(&["nothing"]);
    handle.request_load_from_slot(0).await.unwrap();
    let report = next_load(&mut loads).await;

    assert!(report.success);
    assert_eq!(report.delivered, vec!["Inventory"]);
    assert_eq!(inventory.items(), vec!["sword", "rope"]);
    assert_eq!(inventory.restores(), 1);
    assert_eq!(handle.active_save_slot().await.unwrap(), Some(0));
    assert_eq!(
        handle.active_save_header().await.unwrap().unwrap().slot_name,
        "Aria"
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_fragment_write_does_not_stop_the_others() {
    let memory = Arc::new(InMemoryStorage::new());
    memory.fail_writes_to(BlobPath::fragment(0, "B"));
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let a = Tracked::new("A", &[]);
    let b = Tracked::new("B", &[]);
    let c = Tracked::new("C", &[]);
    for participant in [&a, &b, &c] {
        handle.register(participant).await.unwrap();
    }
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(0, "Aria").await.unwrap();
    let report = next_save(&mut saves).await;

    assert!(!report.success());
    assert_eq!(report.failed_fragments(), vec!["B"]);
    assert_eq!(report.written, vec!["A", "C"]);
    assert!(memory.blob(&BlobPath::fragment(0, "A")).is_some());
    assert!(memory.blob(&BlobPath::fragment(0, "B")).is_none());
    assert!(memory.blob(&BlobPath::fragment(0, "C")).is_some());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unclaimed_fragment_stays_cached_for_late_registration() {
    let memory = Arc::new(InMemoryStorage::new());
    let quests_payload = FragmentPayload::encode(&vec!["slay the drake".to_string()]).unwrap();
    let header = SaveHeader::new(0, "Aria", Duration::from_secs(10));
    memory
        .write_blob(&BlobPath::header(0), &header.to_json().unwrap())
        .await
        .unwrap();
    memory
        .write_blob(&BlobPath::fragment(0, "Quests"), quests_payload.as_bytes())
        .await
        .unwrap();

    let system = start(memory.clone()).await;
    let handle = system.handle();
    let mut loads = system.subscribe(Topic::Load);

    handle.request_load_from_slot(0).await.unwrap();
    let report = next_load(&mut loads).await;

    assert!(report.success);
    assert!(report.delivered.is_empty());
    assert!(report.issues.contains(&PipelineIssue::UnmatchedFragment {
        fragment: "Quests".into()
    }));
    assert!(handle.has_loaded_fragment("Quests").await.unwrap());

    let quests = Tracked::new("Quests", &[]);
    handle.register(&quests).await.unwrap();

    assert_eq!(quests.restores(), 0);
    assert_eq!(
        handle.loaded_fragment("Quests").await.unwrap(),
        Some(quests_payload)
    );
    assert_eq!(
        handle.current_total_play_time().await.unwrap().as_secs(),
        10
    );

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_new_game_creates_named_slot_with_fresh_clock() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &["old sword"]);
    handle.register(&inventory).await.unwrap();
    handle
        .load_play_time_from_header(Duration::from_secs(5_000))
        .await
        .unwrap();

    let mut session = system.subscribe(Topic::Session);
    let mut loads = system.subscribe(Topic::Load);
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(2, "Aria").await.unwrap();

    assert_eq!(session.recv().await.unwrap(), Event::ClearActiveSaveData);
    assert_eq!(inventory.clears(), 1);
    let load = next_load(&mut loads).await;
    assert!(load.success);
    assert_eq!(load.slot, 2);
    assert!(next_save(&mut saves).await.success());

    assert_eq!(handle.active_save_slot().await.unwrap(), Some(2));
    assert!(handle.current_total_play_time().await.unwrap() < Duration::from_secs(1));

    let header = header_at(&memory, 2).unwrap();
    assert_eq!(header.slot_index, 2);
    assert_eq!(header.slot_name, "Aria");
    assert!(header.play_time < Duration::from_secs(1));
    assert_eq!(handle.active_save_header().await.unwrap(), Some(header));
    assert_eq!(
        handle.slot_name_by_index(2).await.unwrap().as_deref(),
        Some("Aria")
    );
    // Cleared state is what got saved.
    assert!(inventory.items().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deleting_active_slot_clears_it() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(2, "Aria").await.unwrap();
    next_save(&mut saves).await;
    assert!(memory.blob(&BlobPath::fragment(2, "Inventory")).is_some());

    let mut slots = system.subscribe(Topic::Slots);
    assert!(handle.request_delete_slot(2).await.unwrap());

    assert_eq!(slots.recv().await.unwrap(), Event::SlotListChanged);
    assert_eq!(handle.active_save_slot().await.unwrap(), None);
    assert_eq!(handle.active_save_header().await.unwrap(), None);
    assert!(memory.blob(&BlobPath::header(2)).is_none());
    assert!(memory.blob(&BlobPath::fragment(2, "Inventory")).is_none());
    assert!(handle.all_save_slot_headers().await.unwrap().is_empty());

    // Deleting again is not an error.
    assert!(!handle.request_delete_slot(2).await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_request_validation_errors() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&inventory).await.unwrap();

    assert!(matches!(
        handle.request_new_game_save(5, "Aria").await,
        Err(SaveError::InvalidSlot {
            slot: 5,
            max_slots: 5
        })
    ));
    assert!(matches!(
        handle.request_load_from_slot(9).await,
        Err(SaveError::InvalidSlot { slot: 9, .. })
    ));
    assert!(matches!(
        handle.request_save_progress().await,
        Err(SaveError::NoActiveSlot)
    ));
    assert!(matches!(
        handle.request_save_specific_fragment(&inventory).await,
        Err(SaveError::NoActiveSlot)
    ));

    handle.set_active_save_slot(Some(1)).await.unwrap();
    assert!(matches!(
        handle.request_save_specific_fragment(&inventory).await,
        Err(SaveError::NoActiveSession)
    ));

    assert!(!handle.is_busy().await.unwrap());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_gather_failures() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let broken = Arc::new(Broken);
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&broken).await.unwrap();
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(0, "Aria").await.unwrap();
    let report = next_save(&mut saves).await;

    assert!(!report.success());
    assert!(report.header_written);
    assert_eq!(report.failed_fragments(), vec!["Broken"]);
    assert!(memory.blob(&BlobPath::fragment(0, "Inventory")).is_some());

    match handle.request_save_specific_fragment(&broken).await {
        Err(SaveError::Gather { fragment, .. }) => assert_eq!(fragment, "Broken"),
        other => panic!("expected gather error, got {:?}", other),
    }
    assert!(!handle.is_busy().await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_load_keeps_previous_slot() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory).await;
    let handle = system.handle();
    let mut saves = system.subscribe(Topic::Save);
    let mut loads = system.subscribe(Topic::Load);

    handle.request_new_game_save(1, "Aria").await.unwrap();
    next_load(&mut loads).await;
    next_save(&mut saves).await;

    handle.request_load_from_slot(3).await.unwrap();
    let report = next_load(&mut loads).await;

    assert!(!report.success);
    assert!(matches!(
        report.issues.as_slice(),
        [PipelineIssue::HeaderMissing { .. }]
    ));
    assert_eq!(handle.active_save_slot().await.unwrap(), Some(1));
    assert_eq!(
        handle.active_save_header().await.unwrap().unwrap().slot_name,
        "Aria"
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unregistered_and_dropped_systems_are_not_saved() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let kept = Tracked::new("Kept", &[]);
    let removed = Tracked::new("Removed", &[]);
    let dropped = Tracked::new("Dropped", &[]);
    for participant in [&kept, &removed, &dropped] {
        assert!(handle.register(participant).await.unwrap());
    }
    assert!(!handle.register(&kept).await.unwrap());
    assert!(handle.unregister(&removed).await.unwrap());
    assert!(!handle.unregister(&removed).await.unwrap());
    drop(dropped);
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(0, "Aria").await.unwrap();
    let report = next_save(&mut saves).await;

    assert_eq!(report.written, vec!["Kept"]);
    assert!(memory.blob(&BlobPath::fragment(0, "Removed")).is_none());
    assert!(memory.blob(&BlobPath::fragment(0, "Dropped")).is_none());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_slot_listing_skips_broken_headers() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(3, "Aria").await.unwrap();
    next_save(&mut saves).await;
    handle.request_new_game_save(0, "Brann").await.unwrap();
    next_save(&mut saves).await;
    memory
        .write_blob(&BlobPath::header(1), b"not a header")
        .await
        .unwrap();

    let headers = handle.all_save_slot_headers().await.unwrap();

    let slots: Vec<_> = headers
        .iter()
        .map(|h| (h.slot_index, h.slot_name.as_str()))
        .collect();
    assert_eq!(slots, vec![(0, "Brann"), (3, "Aria")]);
    assert_eq!(handle.slot_name_by_index(1).await.unwrap(), None);
    assert_eq!(handle.slot_name_by_index(4).await.unwrap(), None);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_lets_pending_save_finish() {
    let memory = Arc::new(InMemoryStorage::new().with_latency(Duration::from_millis(200)));
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(4, "Aria").await.unwrap();
    system.shutdown().await.unwrap();

    assert!(next_save(&mut saves).await.success());
    assert!(memory.blob(&BlobPath::fragment(4, "Inventory")).is_some());
    assert!(header_at(&memory, 4).is_some());
    assert!(matches!(
        handle.request_save_progress().await,
        Err(SaveError::CommandChannelClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_settings_can_change_while_save_is_running() {
    let memory = Arc::new(InMemoryStorage::new().with_latency(Duration::from_millis(50)));
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &["sword"]);
    handle.register(&inventory).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);

    handle.request_new_game_save(1, "Aria").await.unwrap();
    assert!(handle.is_busy().await.unwrap());

    handle.set_last_selected_save_slot(3).await.unwrap();
    handle.set_should_auto_load_last_save(false).await.unwrap();
    assert_eq!(handle.last_selected_save_slot().await.unwrap(), 3);

    assert!(next_save(&mut saves).await.success());
    let stored = UserSettings::from_json(&memory.blob(&BlobPath::UserSettings).unwrap()).unwrap();
    assert_eq!(stored.last_selected_slot, 3);
    assert!(!stored.auto_load_last_save);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_huge_play_time_saturates_instead_of_stopping_worker() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let mut saves = system.subscribe(Topic::Save);

    handle.load_play_time_from_header(Duration::MAX).await.unwrap();
    tokio::time::advance(Duration::from_secs(5)).await;

    assert_eq!(handle.current_total_play_time().await.unwrap(), Duration::MAX);
    assert!(!handle.is_busy().await.unwrap());

    handle.set_active_save_slot(Some(1)).await.unwrap();
    handle.request_save_progress().await.unwrap();
    assert!(next_save(&mut saves).await.success());
    assert_eq!(header_at(&memory, 1).unwrap().play_time, Duration::MAX);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cache_never_shows_another_slot_during_a_load() {
    let memory = Arc::new(InMemoryStorage::new().with_latency(Duration::from_millis(50)));
    seed_slot(&memory, 1, "Aria", &[("Quests", items(&["find the well"]))]).await;
    seed_slot(&memory, 2, "Brann", &[("Inventory", items(&["axe"]))]).await;
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let mut loads = system.subscribe(Topic::Load);

    handle.request_load_from_slot(1).await.unwrap();
    assert!(next_load(&mut loads).await.success);
    assert!(handle.has_loaded_fragment("Quests").await.unwrap());

    handle.request_load_from_slot(2).await.unwrap();
    assert!(handle.is_busy().await.unwrap());
    assert_eq!(handle.active_save_slot().await.unwrap(), Some(2));
    assert!(!handle.has_loaded_fragment("Quests").await.unwrap());
    assert_eq!(handle.loaded_fragment("Quests").await.unwrap(), None);

    assert!(next_load(&mut loads).await.success);
    assert!(handle.has_loaded_fragment("Inventory").await.unwrap());
    assert!(!handle.has_loaded_fragment("Quests").await.unwrap());

    // A failed load hides the cache while running, then puts it back.
    handle.request_load_from_slot(3).await.unwrap();
    assert!(!handle.has_loaded_fragment("Inventory").await.unwrap());
    assert!(!next_load(&mut loads).await.success);
    assert_eq!(handle.active_save_slot().await.unwrap(), Some(2));
    assert!(handle.has_loaded_fragment("Inventory").await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listing_failure_fails_the_load() {
    let memory = Arc::new(InMemoryStorage::new());
    seed_slot(&memory, 1, "Aria", &[("Inventory", items(&["sword"]))]).await;
    memory.fail_listing_of(1);
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &["stick"]);
    handle.register(&inventory).await.unwrap();
    let mut loads = system.subscribe(Topic::Load);

    handle.request_load_from_slot(1).await.unwrap();
    let report = next_load(&mut loads).await;

    assert!(!report.success);
    assert!(matches!(
        report.issues.as_slice(),
        [PipelineIssue::EnumerationFailed { .. }]
    ));
    assert!(report.loaded.is_empty());
    assert_eq!(inventory.items(), vec!["stick"]);
    assert_eq!(handle.active_save_slot().await.unwrap(), None);
    assert!(!handle.has_loaded_fragment("Inventory").await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restore_failure_is_reported_and_others_still_restore() {
    let memory = Arc::new(InMemoryStorage::new());
    seed_slot(
        &memory,
        0,
        "Aria",
        &[("Inventory", b"bad".to_vec()), ("Quests", items(&["slay the drake"]))],
    )
    .await;
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &["stick"]);
    let quests = Tracked::new("Quests", &[]);
    handle.register(&inventory).await.unwrap();
    handle.register(&quests).await.unwrap();
    let mut loads = system.subscribe(Topic::Load);

    handle.request_load_from_slot(0).await.unwrap();
    let report = next_load(&mut loads).await;

    assert!(report.success);
    assert_eq!(report.delivered, vec!["Quests"]);
    assert!(report.issues.iter().any(|issue| matches!(
        issue,
        PipelineIssue::RestoreFailed { fragment, .. } if fragment == "Inventory"
    )));
    assert_eq!(inventory.restores(), 0);
    assert_eq!(inventory.items(), vec!["stick"]);
    assert_eq!(quests.items(), vec!["slay the drake"]);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_systems_leaving_mid_load_are_skipped() {
    let memory = Arc::new(InMemoryStorage::new().with_latency(Duration::from_millis(50)));
    seed_slot(
        &memory,
        0,
        "Aria",
        &[
            ("Inventory", items(&["sword"])),
            ("Map", items(&["north"])),
            ("Quests", items(&["find the well"])),
        ],
    )
    .await;
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    let map = Tracked::new("Map", &[]);
    let quests = Tracked::new("Quests", &[]);
    for participant in [&inventory, &map, &quests] {
        handle.register(participant).await.unwrap();
    }
    let mut loads = system.subscribe(Topic::Load);

    handle.request_load_from_slot(0).await.unwrap();
    assert!(handle.is_busy().await.unwrap());
    assert!(handle.unregister(&map).await.unwrap());
    drop(quests);

    let report = next_load(&mut loads).await;

    assert!(report.success);
    assert_eq!(report.loaded, vec!["Inventory", "Map", "Quests"]);
    assert_eq!(report.delivered, vec!["Inventory"]);
    for name in ["Map", "Quests"] {
        assert!(report.issues.contains(&PipelineIssue::UnmatchedFragment {
            fragment: name.into()
        }));
    }
    assert_eq!(map.restores(), 0);
    assert_eq!(inventory.items(), vec!["sword"]);
    assert!(handle.has_loaded_fragment("Quests").await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_new_game_replaces_previous_slot_contents() {
    let memory = Arc::new(InMemoryStorage::new());
    let system = start(memory.clone()).await;
    let handle = system.handle();
    let inventory = Tracked::new("Inventory", &[]);
    let quests = Tracked::new("Quests", &["find the well"]);
    handle.register(&inventory).await.unwrap();
    handle.register(&quests).await.unwrap();
    let mut saves = system.subscribe(Topic::Save);
    let mut loads = system.subscribe(Topic::Load);

    handle.request_new_game_save(1, "Aria").await.unwrap();
    next_save(&mut saves).await;
    assert!(memory.blob(&BlobPath::fragment(1, "Quests")).is_some());

    handle.unregister(&quests).await.unwrap();
    handle.request_new_game_save(1, "Brann").await.unwrap();
    assert!(next_save(&mut saves).await.success());

    assert!(memory.blob(&BlobPath::fragment(1, "Quests")).is_none());
    assert_eq!(memory.list_fragments(1).await.unwrap(), vec!["Inventory"]);
    assert_eq!(header_at(&memory, 1).unwrap().slot_name, "Brann");

    while loads.try_recv().is_ok() {}
    handle.request_load_from_slot(1).await.unwrap();
    assert!(next_load(&mut loads).await.success);
    assert!(!handle.has_loaded_fragment("Quests").await.unwrap());

    system.shutdown().await.unwrap();
}
