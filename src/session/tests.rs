use super::handshake;
use super::*;
use crate::camera::{MockCamera, MockCameraProbe};
use crate::communicator::{Communicator, Message, Role, WorkItem};
use crate::error::{BoothError, ProtocolError};
use crate::finisher::{FinishingJob, JobKind, NamingScheme, PictureNaming};
use crate::layout::VerticalStrip;
use crate::machine::{Context, Event, Shot, State, TeardownTarget};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

const STEP: Duration = Duration::from_secs(2);

struct Harness {
    comm: Communicator,
    probe: MockCameraProbe,
    handle: JoinHandle<crate::error::Result<i32>>,
}

impl Harness {
    fn start(camera: MockCamera, total: u32, initial: State, settings: SessionSettings) -> Self {
        let comm = Communicator::new(&[Role::Master, Role::Presenter, Role::Worker]);
        let probe = camera.probe();
        let context = Context::new(initial, total, comm.clone()).unwrap();
        let naming = PictureNaming::with_basename("booth".into(), NamingScheme::Sequential);
        let orchestrator = Orchestrator::new(
            context,
            Box::new(camera),
            Box::new(VerticalStrip),
            naming,
            settings,
        );
        let handle = tokio::spawn(orchestrator.run());
        Self {
            comm,
            probe,
            handle,
        }
    }

    /// Next state seen by the presenter, skipping previews and notices
    async fn next_state(&self) -> State {
        loop {
            let message = timeout(STEP, self.comm.receive(Role::Presenter))
                .await
                .expect("timed out waiting for a state")
                .expect("presenter channel closed");
            if let Message::State(state) = message {
                return state;
            }
        }
    }

    async fn expect(&self, expected: State) {
        assert_eq!(self.next_state().await, expected);
    }

    fn send(&self, event: Event) {
        self.comm.send_event(Role::Master, event).unwrap();
    }

    fn gui(&self, name: &str) {
        self.send(Event::gui(name).unwrap());
    }

    /// Finishing jobs queued so far, in order
    fn jobs(&self) -> Vec<FinishingJob> {
        let mut jobs = Vec::new();
        while let Ok(Some(message)) = self.comm.try_receive(Role::Worker) {
            if let Message::Task(WorkItem::Job(job)) = message {
                jobs.push(job);
            }
        }
        jobs
    }

    async fn finish(self) -> crate::error::Result<i32> {
        timeout(STEP, self.handle)
            .await
            .expect("orchestrator did not stop")
            .expect("orchestrator panicked")
    }
}

fn quiet() -> SessionSettings {
    SessionSettings {
        preview: false,
        preview_interval: Duration::from_millis(5),
        keep_shots: false,
    }
}

fn shot(index: u32, total: u32) -> Shot {
    Shot::new(index, total).unwrap()
}

/// Startup -> Idle -> Greeter -> Countdown(1)
async fn run_to_first_countdown(h: &Harness, total: u32) {
    h.expect(State::Startup).await;
    h.expect(State::Idle).await;
    h.gui("trigger");
    h.expect(State::Greeter).await;
    h.gui("ack");
    h.expect(State::Countdown(shot(1, total))).await;
}

#[test]
fn test_expected_sets_per_state() {
    assert_eq!(handshake::expected_for(&State::Idle), &["trigger", "teardown"]);
    assert!(handshake::expected_for(&State::Greeter).contains(&"cancel"));
    assert!(handshake::expected_for(&State::Assemble).is_empty());
    assert_eq!(
        handshake::expected_for(&State::Teardown(TeardownTarget::Welcome)),
        &["welcome", "teardown"]
    );
}

#[test]
fn test_accept_maps_cancel_and_rejects_unknown_names() {
    let greeter = State::Greeter;
    let cancel = handshake::accept(&greeter, Event::gui("cancel").unwrap(), handshake::ACK);
    assert_eq!(cancel.unwrap(), Event::teardown(TeardownTarget::Restart));

    let error = Event::error("Gpio", "lamp stuck").unwrap();
    assert_eq!(
        handshake::accept(&State::Idle, error.clone(), handshake::IDLE).unwrap(),
        error
    );

    let err = handshake::accept(&State::Idle, Event::gui("ack").unwrap(), handshake::IDLE)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownEvent { ref event, .. } if event == "GuiEvent(ack)"));

    // Cancel is not valid while idle
    assert!(handshake::accept(&State::Idle, Event::gui("cancel").unwrap(), handshake::IDLE).is_err());
}

#[tokio::test]
async fn test_single_shot_session_queues_one_composite() {
    let h = Harness::start(MockCamera::new(), 1, State::Startup, quiet());
    run_to_first_countdown(&h, 1).await;

    h.gui("capture");
    h.expect(State::Capture(shot(1, 1))).await;
    h.expect(State::Assemble).await;
    let img = match h.next_state().await {
        State::Review(img) => img,
        other => panic!("expected Review, got {}", other),
    };

    h.gui("ack");
    h.expect(State::Postprocess).await;
    h.gui("ack");
    h.expect(State::Idle).await;

    let jobs = h.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, JobKind::Composite);
    assert_eq!(jobs[0].destination, "booth00001");
    assert!(jobs[0].picture.same_buffer(&img));

    h.send(Event::teardown(TeardownTarget::Exit));
    h.expect(State::Teardown(TeardownTarget::Exit)).await;
    let probe = h.probe.clone();
    assert_eq!(h.finish().await.unwrap(), 0);
    assert_eq!(probe.capture_calls(), 1);
    assert_eq!(probe.release_calls(), 1);
}

#[tokio::test]
async fn test_capture_failure_then_abort_queues_nothing() {
    let camera = MockCamera::new().fail_capture(2);
    let h = Harness::start(camera, 3, State::Startup, quiet());
    run_to_first_countdown(&h, 3).await;

    h.gui("capture");
    h.expect(State::Capture(shot(1, 3))).await;
    h.expect(State::Countdown(shot(2, 3))).await;
    h.gui("capture");
    h.expect(State::Capture(shot(2, 3))).await;

    match h.next_state().await {
        State::Error(error) => {
            assert_eq!(error.origin().as_str(), "Camera");
            assert_eq!(error.previous(), &State::Capture(shot(2, 3)));
            assert!(error.session_running());
        }
        other => panic!("expected Error, got {}", other),
    }

    h.gui("abort");
    h.expect(State::Idle).await;
    assert!(h.jobs().is_empty());

    h.send(Event::teardown(TeardownTarget::Exit));
    assert_eq!(h.finish().await.unwrap(), 0);
}

#[tokio::test]
async fn test_retry_replaces_failed_shot() {
    let camera = MockCamera::new().fail_capture(1);
    let h = Harness::start(camera, 1, State::Startup, quiet());
    run_to_first_countdown(&h, 1).await;

    h.gui("capture");
    h.expect(State::Capture(shot(1, 1))).await;
    assert!(matches!(h.next_state().await, State::Error(_)));

    h.gui("retry");
    h.expect(State::Capture(shot(1, 1))).await;
    h.expect(State::Assemble).await;
    match h.next_state().await {
        // One shot of 4x3 only; the failed attempt left nothing behind
        State::Review(img) => assert_eq!((img.width(), img.height()), (4, 3)),
        other => panic!("expected Review, got {}", other),
    }

    h.gui("cancel");
    h.expect(State::Teardown(TeardownTarget::Restart)).await;
    assert_eq!(h.finish().await.unwrap(), 123);
}

#[tokio::test]
async fn test_teardown_during_countdown_releases_camera_once() {
    let camera = MockCamera::new().with_preview(true);
    let settings = SessionSettings {
        preview: true,
        ..quiet()
    };
    let h = Harness::start(camera, 2, State::Startup, settings);
    run_to_first_countdown(&h, 2).await;

    sleep(Duration::from_millis(30)).await;
    h.send(Event::teardown(TeardownTarget::Exit));
    h.expect(State::Teardown(TeardownTarget::Exit)).await;

    let probe = h.probe.clone();
    let comm = h.comm.clone();
    assert_eq!(h.finish().await.unwrap(), 0);
    assert!(probe.preview_calls() > 0);
    assert_eq!(probe.capture_calls(), 0);
    assert_eq!(probe.release_calls(), 1);
    assert!(comm.is_closed(Role::Master).unwrap());
}

#[tokio::test]
async fn test_preview_frames_reach_presenter() {
    let camera = MockCamera::new().with_preview(true);
    let settings = SessionSettings {
        preview: true,
        ..quiet()
    };
    let h = Harness::start(camera, 1, State::Startup, settings);
    run_to_first_countdown(&h, 1).await;

    let frame = timeout(STEP, async {
        loop {
            if let Ok(Message::Preview(frame)) = h.comm.receive(Role::Presenter).await {
                return frame;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(frame.width(), 4);

    h.gui("capture");
    loop {
        if h.next_state().await == State::Capture(shot(1, 1)) {
            break;
        }
    }
    h.send(Event::teardown(TeardownTarget::Exit));
    assert_eq!(h.finish().await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_capture_before_acknowledgement() {
    let h = Harness::start(MockCamera::new(), 1, State::Startup, quiet());
    h.expect(State::Startup).await;
    h.expect(State::Idle).await;
    h.gui("trigger");
    h.expect(State::Greeter).await;

    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.probe.capture_calls(), 0);
    assert!(h.jobs().is_empty());

    h.gui("ack");
    h.expect(State::Countdown(shot(1, 1))).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.probe.capture_calls(), 0);

    h.gui("cancel");
    assert_eq!(h.finish().await.unwrap(), 123);
}

#[tokio::test]
async fn test_archived_shots_precede_composite() {
    let settings = SessionSettings {
        keep_shots: true,
        ..quiet()
    };
    let h = Harness::start(MockCamera::new(), 2, State::Startup, settings);
    run_to_first_countdown(&h, 2).await;

    h.gui("capture");
    h.expect(State::Capture(shot(1, 2))).await;
    h.expect(State::Countdown(shot(2, 2))).await;
    h.gui("capture");
    h.expect(State::Capture(shot(2, 2))).await;
    h.expect(State::Assemble).await;
    assert!(matches!(h.next_state().await, State::Review(_)));
    h.gui("ack");
    h.expect(State::Postprocess).await;

    let jobs = h.jobs();
    let kinds: Vec<JobKind> = jobs.iter().map(|job| job.kind).collect();
    assert_eq!(
        kinds,
        vec![
            JobKind::Shot { index: 1 },
            JobKind::Shot { index: 2 },
            JobKind::Composite
        ]
    );
    assert_eq!(jobs[0].destination, "booth_shot_00001");
    assert_eq!(jobs[2].picture.height(), 6);
    assert!(jobs.iter().all(|job| job.session == jobs[0].session));

    h.send(Event::teardown(TeardownTarget::Exit));
    assert_eq!(h.finish().await.unwrap(), 0);
}

#[tokio::test]
async fn test_welcome_round_trip_releases_camera_once() {
    let h = Harness::start(MockCamera::new(), 1, State::Welcome, quiet());
    h.expect(State::Welcome).await;
    h.gui("start");
    h.expect(State::Startup).await;
    h.expect(State::Idle).await;

    h.send(Event::teardown(TeardownTarget::Welcome));
    h.expect(State::Teardown(TeardownTarget::Welcome)).await;
    h.gui("welcome");
    h.expect(State::Welcome).await;
    assert_eq!(h.probe.release_calls(), 1);

    h.gui("exit");
    h.expect(State::Teardown(TeardownTarget::Exit)).await;
    let probe = h.probe.clone();
    assert_eq!(h.finish().await.unwrap(), 0);
    assert_eq!(probe.release_calls(), 1);
}

#[tokio::test]
async fn test_startup_failure_abort_returns_to_welcome_path() {
    let camera = MockCamera::new().fail_activate();
    let h = Harness::start(camera, 1, State::Startup, quiet());
    h.expect(State::Startup).await;

    match h.next_state().await {
        State::Error(error) => {
            assert_eq!(error.previous(), &State::Startup);
            assert!(!error.session_running());
        }
        other => panic!("expected Error, got {}", other),
    }

    h.gui("abort");
    h.expect(State::Teardown(TeardownTarget::Welcome)).await;
    h.gui("welcome");
    h.expect(State::Welcome).await;

    h.send(Event::teardown(TeardownTarget::Restart));
    assert_eq!(h.finish().await.unwrap(), 123);
}

#[tokio::test]
async fn test_unknown_event_is_fatal() {
    let h = Harness::start(MockCamera::new(), 1, State::Startup, quiet());
    h.expect(State::Startup).await;
    h.expect(State::Idle).await;

    h.gui("ack");
    let comm = h.comm.clone();
    match h.finish().await {
        Err(BoothError::Protocol(ProtocolError::UnknownEvent { expected, .. })) => {
            assert_eq!(expected, vec!["trigger", "teardown"]);
        }
        other => panic!("expected protocol violation, got {:?}", other),
    }
    assert!(comm.is_closed(Role::Presenter).unwrap());
}

#[tokio::test]
async fn test_closed_channel_means_exit() {
    let h = Harness::start(MockCamera::new(), 1, State::Startup, quiet());
    h.expect(State::Startup).await;
    h.expect(State::Idle).await;

    h.comm.close();
    let probe = h.probe.clone();
    assert_eq!(h.finish().await.unwrap(), 0);
    assert_eq!(probe.release_calls(), 1);
}

#[tokio::test]
async fn test_closed_channel_ends_preview_countdown() {
    let camera = MockCamera::new().with_preview(true);
    let settings = SessionSettings {
        preview: true,
        ..quiet()
    };
    let h = Harness::start(camera, 1, State::Startup, settings);
    run_to_first_countdown(&h, 1).await;

    sleep(Duration::from_millis(30)).await;
    h.comm.close();

    let probe = h.probe.clone();
    assert_eq!(h.finish().await.unwrap(), 0);
    assert!(probe.preview_calls() > 0);
    assert_eq!(probe.capture_calls(), 0);
    assert_eq!(probe.release_calls(), 1);
}

#[tokio::test]
async fn test_shot_archived_once_after_reactivation_retry() {
    // Activations: startup, greeter, then the one after the first capture
    let camera = MockCamera::new().fail_activation(3);
    let settings = SessionSettings {
        keep_shots: true,
        ..quiet()
    };
    let h = Harness::start(camera, 1, State::Startup, settings);
    run_to_first_countdown(&h, 1).await;

    h.gui("capture");
    h.expect(State::Capture(shot(1, 1))).await;
    match h.next_state().await {
        State::Error(error) => assert_eq!(error.previous(), &State::Capture(shot(1, 1))),
        other => panic!("expected Error, got {}", other),
    }
    assert!(h.jobs().is_empty());

    h.gui("retry");
    h.expect(State::Capture(shot(1, 1))).await;
    h.expect(State::Assemble).await;
    assert!(matches!(h.next_state().await, State::Review(_)));
    h.gui("ack");
    h.expect(State::Postprocess).await;

    let jobs = h.jobs();
    let destinations: Vec<&str> = jobs.iter().map(|job| job.destination.as_str()).collect();
    assert_eq!(destinations, vec!["booth_shot_00001", "booth00001"]);
    assert_eq!(jobs[0].kind, JobKind::Shot { index: 1 });
    assert_eq!(h.probe.capture_calls(), 2);

    h.send(Event::teardown(TeardownTarget::Exit));
    assert_eq!(h.finish().await.unwrap(), 0);
}
