mod common;

use std::sync::Arc;

use common::{MockEngine, album, catalog, config, playlist, track};
use proptest::prelude::*;
use queue_player_controls::{QueueCoordinator, TrackRef};

fn expand(submitted: &TrackRef) -> Vec<TrackRef> {
    if *submitted == album("two") {
        vec![track("2a"), track("2b")]
    } else if *submitted == playlist("mix") {
        vec![track("m1"), track("m2"), track("m3")]
    } else {
        vec![submitted.clone()]
    }
}

fn arbitrary_ref() -> impl Strategy<Value = TrackRef> {
    prop_oneof![
        6 => "[a-z0-9]{1,6}".prop_map(|id| track(&id)),
        1 => Just(album("two")),
        1 => Just(playlist("mix")),
    ]
}

fn arbitrary_batches() -> impl Strategy<Value = Vec<Vec<TrackRef>>> {
    prop::collection::vec(prop::collection::vec(arbitrary_ref(), 0..6), 1..8)
}

proptest! {
    /// Pending tracks come out in submission order, collections expanded
    /// where they were submitted.
    #[test]
    fn pending_queue_preserves_submission_order(batches in arbitrary_batches()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (engine, _commands) = MockEngine::new();
        let coordinator = QueueCoordinator::new(engine, Arc::new(catalog()), config(false));

        let mut expected = Vec::new();
        let mut largest = 0;
        for batch in &batches {
            let queued = runtime.block_on(coordinator.enqueue(batch)).unwrap();
            let expanded: Vec<TrackRef> = batch.iter().flat_map(expand).collect();
            prop_assert_eq!(queued, expanded.len());
            expected.extend(expanded);
            largest = largest.max(expected.len());
        }

        let pending: Vec<TrackRef> = coordinator.current_queue().pending_tracks().cloned().collect();
        prop_assert_eq!(&pending, &expected);

        let status = coordinator.queue_status();
        prop_assert_eq!(status.current_queue_size, expected.len());
        prop_assert_eq!(status.max_queue_size, largest);
        prop_assert!(status.tracks_played >= status.tracks_skipped);
    }
}
