//! End-to-end bridge tests: a real call server on a Unix socket, external
//! sessions on one side, the live host graph on the other.

#![cfg(unix)]

use dawlink::{
    BridgeConfig, BridgeError, MemoryHost, NoteSpec, Session, SessionMode, SharedHost,
};
use dawlink_server::CallServer;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct TestServer {
    config: BridgeConfig,
    host: Arc<Mutex<MemoryHost>>,
    // Keeps the socket directory alive for the duration of the test.
    _dir: TempDir,
}

fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let socket: PathBuf = dir.path().join("host.sock");
    let config = BridgeConfig {
        socket_path: socket.clone(),
        ..BridgeConfig::default()
    };

    let host = Arc::new(Mutex::new(MemoryHost::new()));
    let shared_host: SharedHost = host.clone();
    let server_config = config.clone();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let _ = CallServer::new(server_config, shared_host).run().await;
        });
    });

    // The socket file appears once the listener is bound.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !socket.exists() {
        assert!(Instant::now() < deadline, "server did not come up");
        thread::sleep(Duration::from_millis(10));
    }

    TestServer {
        config,
        host,
        _dir: dir,
    }
}

fn note(start: f64, pitch: u8) -> NoteSpec {
    NoteSpec {
        start,
        end: start + 0.25,
        channel: 0,
        pitch,
        velocity: 100,
        selected: false,
        muted: false,
    }
}

#[test]
fn test_set_volume_roundtrip_across_both_modes() {
    let server = start_server();
    let external = Session::connect(server.config.clone()).unwrap();
    assert_eq!(external.mode(), SessionMode::Connected);

    let track = external
        .current_project()
        .unwrap()
        .add_track(0, "Lead")
        .unwrap();
    track.set_volume(0.8).unwrap();
    assert_eq!(track.volume().unwrap(), 0.8);

    // The same locator read through an in-host session over the same
    // graph observes the externally written value.
    let in_host = Session::in_host(server.host.clone() as SharedHost);
    let same_track = in_host.current_project().unwrap().track(0).unwrap();
    assert_eq!(same_track.volume().unwrap(), 0.8);
}

#[test]
fn test_read_only_sequence_is_identical_in_both_modes() {
    let server = start_server();
    let external = Session::connect(server.config.clone()).unwrap();
    let in_host = Session::in_host(server.host.clone() as SharedHost);

    // Build some state through the in-host side.
    let project = in_host.current_project().unwrap();
    let track = project.add_track(0, "Keys").unwrap();
    track.set_volume(0.7).unwrap();
    track.set_color((10, 20, 30)).unwrap();
    let take = track.add_item(1.0, 4.0).unwrap().active_take().unwrap();
    take.add_note(note(0.0, 60)).unwrap();
    take.add_note(note(1.0, 64)).unwrap();

    let observe = |session: &Session| -> Vec<String> {
        let project = session.current_project().unwrap();
        let track = project.track(0).unwrap();
        let take = track.item(0).unwrap().active_take().unwrap();
        vec![
            project.name().unwrap(),
            format!("{}", project.track_count().unwrap()),
            track.name().unwrap(),
            format!("{:?}", track.volume().unwrap()),
            format!("{:?}", track.color().unwrap()),
            format!("{:?}", take.notes().fetch_all().unwrap()),
        ]
    };

    assert_eq!(observe(&external), observe(&in_host));
}

#[test]
fn test_deleted_track_raises_over_the_wire() {
    let server = start_server();
    let session = Session::connect(server.config.clone()).unwrap();

    let track = session
        .current_project()
        .unwrap()
        .add_track(0, "Doomed")
        .unwrap();
    track.delete().unwrap();

    let err = track.volume().unwrap_err();
    assert!(matches!(err, BridgeError::LocatorResolution { .. }));
}

#[test]
fn test_host_failure_message_survives_the_wire() {
    let server = start_server();
    let session = Session::connect(server.config.clone()).unwrap();

    let err = session.current_project().unwrap().undo().unwrap_err();
    match err {
        BridgeError::RemoteExecution { message } => assert_eq!(message, "Can't undo."),
        other => panic!("expected RemoteExecution, got {other:?}"),
    }
}

#[test]
fn test_bulk_fetch_matches_sequential_fetches_externally() {
    let server = start_server();
    let session = Session::connect(server.config.clone()).unwrap();

    let take = session
        .current_project()
        .unwrap()
        .add_track(0, "MIDI")
        .unwrap()
        .add_item(0.0, 8.0)
        .unwrap()
        .active_take()
        .unwrap();
    for (i, pitch) in [60u8, 62, 64, 65, 67, 69].iter().enumerate() {
        take.add_note(note(i as f64, *pitch)).unwrap();
    }

    let list = take.notes();
    let bulk = list.fetch_all().unwrap();
    let sequential: Vec<NoteSpec> = (0..list.len().unwrap())
        .map(|i| list.get(i).unwrap().info().unwrap())
        .collect();
    assert_eq!(bulk, sequential);
}

#[test]
fn test_concurrent_clients_queue_on_the_host() {
    let server = start_server();

    let mut workers = Vec::new();
    for worker in 0..2 {
        let config = server.config.clone();
        workers.push(thread::spawn(move || {
            let session = Session::connect(config).unwrap();
            let project = session.current_project().unwrap();
            for i in 0..10 {
                project
                    .add_track(u32::MAX, &format!("w{worker}-t{i}"))
                    .unwrap();
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    let session = Session::connect(server.config.clone()).unwrap();
    assert_eq!(
        session.current_project().unwrap().track_count().unwrap(),
        20
    );
}

#[test]
fn test_scoped_accessor_releases_exactly_once_externally() {
    let server = start_server();
    let session = Session::connect(server.config.clone()).unwrap();

    let item = session
        .current_project()
        .unwrap()
        .add_track(0, "Audio")
        .unwrap()
        .add_item(0.0, 2.0)
        .unwrap();

    let samples = item
        .with_audio_accessor(|accessor| accessor.read(0.0, 32))
        .unwrap();
    assert_eq!(samples.len(), 32);
    assert_eq!(server.host.lock().release_count(), 1);
    assert_eq!(server.host.lock().live_accessor_count(), 0);

    // Failure inside the scope still releases.
    let err = item
        .with_audio_accessor(|accessor| accessor.read(-1.0, 4))
        .unwrap_err();
    assert!(matches!(err, BridgeError::RemoteExecution { .. }));
    assert_eq!(server.host.lock().release_count(), 2);
}

#[test]
fn test_disconnected_session_never_reaches_the_host() {
    let server = start_server();
    let disconnected = Session::disconnected();

    let err = disconnected.current_project().unwrap_err();
    assert!(matches!(err, BridgeError::Connection(_)));

    // No mutation happened anywhere.
    let session = Session::connect(server.config.clone()).unwrap();
    assert_eq!(session.current_project().unwrap().track_count().unwrap(), 0);
}

#[test]
fn test_batched_note_insert_over_the_wire() {
    let server = start_server();
    let session = Session::connect(server.config.clone()).unwrap();

    let take = session
        .current_project()
        .unwrap()
        .add_track(0, "MIDI")
        .unwrap()
        .add_item(0.0, 8.0)
        .unwrap()
        .active_take()
        .unwrap();

    let notes = take.add_notes(&[note(0.0, 60), note(1.0, 62)]).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(take.notes().len().unwrap(), 2);
    assert_eq!(notes[0].pitch().unwrap(), 60);
}
