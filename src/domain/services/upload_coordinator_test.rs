use std::time::Duration;

use tokio::time::Instant;

use super::MicDecision;
use super::RecordingState;
use super::UploadCoordinator;
use super::UploadKind;

fn ms(millis: u64) -> Duration {
    return Duration::from_millis(millis);
}

fn recording_since(start: Instant) -> UploadCoordinator {
    let mut uploads = UploadCoordinator::default();
    assert_eq!(uploads.toggle_mic(start, true), MicDecision::Start);
    assert!(uploads.recording_started(start));
    return uploads;
}

#[test]
fn it_allows_one_submission_at_a_time() {
    let mut uploads = UploadCoordinator::default();
    assert!(uploads.try_begin(UploadKind::Text, "m1"));
    assert!(!uploads.try_begin(UploadKind::File, "m2"));
    assert!(!uploads.try_begin(UploadKind::Text, "m3"));
    assert_eq!(uploads.in_flight(), Some(UploadKind::Text));

    assert!(uploads.finish("m1"));
    assert!(uploads.try_begin(UploadKind::File, "m4"));
    assert_eq!(uploads.in_flight(), Some(UploadKind::File));
}

#[test]
fn it_only_releases_the_slot_for_the_message_holding_it() {
    let mut uploads = UploadCoordinator::default();
    assert!(uploads.try_begin(UploadKind::Text, "second"));

    assert!(!uploads.finish("first"));
    assert_eq!(uploads.in_flight(), Some(UploadKind::Text));
    assert!(!uploads.try_begin(UploadKind::Text, "third"));

    assert!(uploads.finish("second"));
    assert!(!uploads.is_busy());
}

#[test]
fn it_requires_a_session_to_record() {
    let mut uploads = UploadCoordinator::default();
    assert_eq!(
        uploads.toggle_mic(Instant::now(), false),
        MicDecision::NoSession
    );
    assert_eq!(uploads.recording_state(), RecordingState::Idle);
}

#[test]
fn it_debounces_toggles_within_a_second() {
    let start = Instant::now();
    let mut uploads = recording_since(start);

    assert_eq!(uploads.toggle_mic(start + ms(400), true), MicDecision::Debounced);
    assert_eq!(uploads.toggle_mic(start + ms(999), true), MicDecision::Debounced);
    assert!(uploads.is_recording());

    assert_eq!(
        uploads.toggle_mic(start + ms(2000), true),
        MicDecision::Stop { elapsed: ms(2000) }
    );
}

#[test]
fn it_discards_recordings_shorter_than_the_minimum() {
    let start = Instant::now();
    let mut uploads = recording_since(start);

    assert_eq!(
        uploads.toggle_mic(start + ms(1200), true),
        MicDecision::Stop { elapsed: ms(1200) }
    );
    assert_eq!(uploads.in_flight(), Some(UploadKind::Audio));

    assert_eq!(uploads.recording_stopped(), None);
    assert_eq!(uploads.in_flight(), None);
    assert_eq!(uploads.recording_state(), RecordingState::Idle);
}

#[test]
fn it_keeps_the_slot_for_long_recordings() {
    let start = Instant::now();
    let mut uploads = recording_since(start);

    uploads.toggle_mic(start + ms(1500), true);
    assert_eq!(uploads.recording_stopped(), Some(ms(1500)));
    assert_eq!(uploads.in_flight(), Some(UploadKind::Audio));
    assert!(!uploads.try_begin(UploadKind::Text, "m1"));

    uploads.assign("placeholder");
    assert!(!uploads.finish("m1"));
    assert!(uploads.finish("placeholder"));
    assert!(!uploads.is_busy());
}

#[test]
fn it_blocks_submissions_while_recording() {
    let uploads_start = Instant::now();
    let mut uploads = recording_since(uploads_start);
    assert!(!uploads.try_begin(UploadKind::Text, "m1"));
    assert!(uploads.is_busy());
}

#[test]
fn it_refuses_to_record_during_an_upload() {
    let mut uploads = UploadCoordinator::default();
    assert!(uploads.try_begin(UploadKind::File, "m1"));
    assert_eq!(uploads.toggle_mic(Instant::now(), true), MicDecision::Busy);
    assert_eq!(uploads.recording_state(), RecordingState::Idle);
}

#[test]
fn it_returns_to_idle_when_the_microphone_fails() {
    let start = Instant::now();
    let mut uploads = UploadCoordinator::default();
    assert_eq!(uploads.toggle_mic(start, true), MicDecision::Start);

    uploads.recording_failed();
    assert_eq!(uploads.recording_state(), RecordingState::Idle);
    assert!(!uploads.is_busy());
    assert!(!uploads.recording_started(start));
}

#[test]
fn it_ignores_stop_results_when_not_stopping() {
    let mut uploads = UploadCoordinator::default();
    assert_eq!(uploads.recording_stopped(), None);
}

#[test]
fn it_assembles_chunks_in_order() {
    let blob = UploadCoordinator::assemble(vec![vec![1, 2], vec![], vec![3]]);
    assert_eq!(blob, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn it_measures_elapsed_time_with_the_runtime_clock() {
    let start = Instant::now();
    let mut uploads = recording_since(start);

    tokio::time::advance(ms(1600)).await;
    assert_eq!(
        uploads.toggle_mic(Instant::now(), true),
        MicDecision::Stop { elapsed: ms(1600) }
    );
    assert_eq!(uploads.recording_stopped(), Some(ms(1600)));
}
