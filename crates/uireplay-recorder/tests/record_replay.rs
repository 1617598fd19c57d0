//! End-to-end capture and replay scenarios

use uireplay_core::prelude::*;
use uireplay_recorder::prelude::*;

/// A form page: a text input with a button 50px right and 20px below it.
fn form_page() -> (PageTree, NodeId, NodeId) {
    let mut page = PageTree::new().with_viewport(1280.0, 720.0);
    let body = page.insert(page.root(), Element::new("body"));
    let input = page.insert(
        body,
        Element::new("input")
            .with_id("name")
            .with_input_type("text")
            .at(100.0, 100.0, 120.0, 24.0),
    );
    let button = page.insert(
        body,
        Element::new("button")
            .with_id("go")
            .with_text("Go")
            .at(150.0, 120.0, 60.0, 24.0),
    );
    (page, input, button)
}

fn immediate_replayer() -> Replayer {
    Replayer::new().with_config(ReplayConfig::immediate())
}

#[test]
fn captured_sequence_replays_with_fidelity() {
    let (mut page, input, button) = form_page();

    // Record: type "hello" into the field, then click the button.
    let session = RecorderSession::new();
    session.start();
    page.set_value(input, "hello").unwrap();
    session.on_signal(&page, Signal::Input { target: input, genuine: true });
    let center = page.element(button).unwrap().bounds.center();
    session.on_signal(
        &page,
        Signal::PointerDown { x: center.0, y: center.1, target: button },
    );
    let recording = session.stop();
    assert_eq!(recording.events.len(), 2);

    // Replay against an unmodified copy of the page.
    let (mut fresh, fresh_input, fresh_button) = form_page();
    let stats = immediate_replayer().play(&recording, &mut fresh);

    assert_eq!(stats.inputs, 1);
    assert_eq!(stats.clicks, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(
        fresh.element(fresh_input).unwrap().value.as_deref(),
        Some("hello")
    );
    assert!(fresh
        .dispatched()
        .contains(&SyntheticSignal::Click { node: fresh_button }));
}

#[test]
fn moved_element_is_still_found_by_identifier() {
    let (mut page, _, button) = form_page();

    let session = RecorderSession::new();
    session.start();
    session.on_signal(&page, Signal::PointerDown { x: 120.0, y: 80.0, target: button });
    let recording = session.stop();
    assert_eq!(recording.events[0].path.as_deref(), Some("//*[@id=\"go\"]"));

    // The button moved far away from the recorded coordinates.
    page.element_mut(button).unwrap().bounds = Bounds::new(500.0, 500.0, 60.0, 24.0);

    let stats = immediate_replayer().play(&recording, &mut page);
    assert_eq!(stats.clicks, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(page.dispatched(), &[SyntheticSignal::Click { node: button }]);
}

#[test]
fn replaying_twice_produces_identical_signal_sequences() {
    let (mut page, input, button) = form_page();

    let session = RecorderSession::new();
    session.start();
    page.set_value(input, "abc").unwrap();
    session.on_signal(&page, Signal::Input { target: input, genuine: true });
    session.on_signal(&page, Signal::PointerDown { x: 160.0, y: 130.0, target: button });
    session.on_signal(&page, Signal::KeyDown { target: input, key: "Enter".to_string() });
    let recording = session.stop();

    let replayer = immediate_replayer();
    replayer.play(&recording, &mut page);
    let first = page.take_dispatched();
    replayer.play(&recording, &mut page);
    let second = page.take_dispatched();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn capture_resumes_after_replay_finishes() {
    let (mut page, input, _) = form_page();

    let session = RecorderSession::new();
    session.start();
    page.set_value(input, "x").unwrap();
    session.on_signal(&page, Signal::Input { target: input, genuine: true });
    let recording = session.stop();

    // Shared flags: replay disables capture while playing, and releases
    // the mode when done.
    let replayer = Replayer::with_flags(session.flags()).with_config(ReplayConfig::immediate());
    session.start();
    replayer.play(&recording, &mut page);
    assert!(!replayer.is_playing());

    session.on_signal(&page, Signal::Input { target: input, genuine: true });
    let second = session.stop();
    assert_eq!(second.events.len(), 1);
}

#[test]
fn network_calls_flow_through_the_seam_into_the_recording() {
    let (mut transport, rx) = InterceptingTransport::new(
        |_: &NetworkRequest| -> anyhow::Result<NetworkResponse> {
            Ok(NetworkResponse { status: 200, body: Some("ok".to_string()) })
        },
    );

    let session = RecorderSession::new().with_network_source(rx);

    // Completed before capture starts: dropped when drained while idle.
    transport.send(&NetworkRequest::get("https://example.com/early")).unwrap();
    session.drain_network();

    session.start();
    transport.send(&NetworkRequest::post("https://example.com/save", "{}")).unwrap();
    let recording = session.stop();

    assert_eq!(recording.http_events.len(), 1);
    assert_eq!(recording.http_events[0].url, "https://example.com/save");
}

#[test]
fn recording_survives_storage_and_replays_from_disk() {
    let (mut page, input, button) = form_page();

    let session = RecorderSession::new();
    session.start();
    page.set_value(input, "persisted").unwrap();
    session.on_signal(&page, Signal::Input { target: input, genuine: true });
    session.on_signal(&page, Signal::PointerDown { x: 160.0, y: 130.0, target: button });
    let recording = session.stop();

    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::with_dir(dir.path()).unwrap();
    let path = store.save(&recording).unwrap();
    let loaded = store
        .load(path.file_name().unwrap().to_str().unwrap())
        .unwrap();

    let (mut fresh, fresh_input, _) = form_page();
    let stats = immediate_replayer().play(&loaded, &mut fresh);
    assert_eq!(stats.inputs, 1);
    assert_eq!(stats.clicks, 1);
    assert_eq!(
        fresh.element(fresh_input).unwrap().value.as_deref(),
        Some("persisted")
    );
}
