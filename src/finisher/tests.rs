use super::*;
use crate::communicator::{Communicator, Message, Role};
use crate::error::TaskError;
use crate::machine::State;
use crate::picture::Picture;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

/// Records every destination it sees, optionally failing some of them
struct RecordingTask {
    name: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl FinishingTask for RecordingTask {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, job: &FinishingJob) -> Result<(), TaskError> {
        self.seen
            .lock()
            .push(format!("{}:{}", self.name, job.destination));
        if self.fail_on == Some(job.destination.as_str()) {
            return Err(TaskError::Failed {
                task: self.name.to_string(),
                details: "upload refused".to_string(),
            });
        }
        Ok(())
    }
}

fn recorder(name: &'static str, seen: &Arc<Mutex<Vec<String>>>) -> RecordingTask {
    RecordingTask {
        name,
        seen: Arc::clone(seen),
        fail_on: None,
    }
}

fn picture() -> Picture {
    Picture::filled(2, 2, [10, 20, 30]).unwrap()
}

fn worker_comm() -> Communicator {
    Communicator::new(&[Role::Master, Role::Worker])
}

#[tokio::test]
async fn test_jobs_run_in_fifo_order_with_task_order_preserved() {
    let comm = worker_comm();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let finisher = Finisher::new(comm.clone())
        .with_composite_task(recorder("save", &seen))
        .with_composite_task(recorder("upload", &seen));

    let queue = FinisherQueue::new(comm);
    let session = Uuid::new_v4();
    queue
        .enqueue(FinishingJob::composite(picture(), "a".into(), session))
        .unwrap();
    queue
        .enqueue(FinishingJob::composite(picture(), "b".into(), session))
        .unwrap();
    queue.shutdown().unwrap();

    let stats = timeout(Duration::from_secs(1), finisher.run()).await.unwrap();
    assert_eq!(stats.jobs, 2);
    assert_eq!(stats.completed, 4);
    assert_eq!(
        *seen.lock(),
        vec!["save:a", "upload:a", "save:b", "upload:b"]
    );
}

#[tokio::test]
async fn test_failing_task_does_not_stop_the_loop() {
    let comm = worker_comm();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let flaky = RecordingTask {
        name: "upload",
        seen: Arc::clone(&seen),
        fail_on: Some("first"),
    };
    let finisher = Finisher::new(comm.clone()).with_composite_task(flaky);

    let queue = FinisherQueue::new(comm);
    let session = Uuid::new_v4();
    queue
        .enqueue(FinishingJob::composite(picture(), "first".into(), session))
        .unwrap();
    queue
        .enqueue(FinishingJob::composite(picture(), "second".into(), session))
        .unwrap();
    queue.shutdown().unwrap();

    let stats = finisher.run().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn test_shot_jobs_use_shot_tasks() {
    let comm = worker_comm();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let finisher = Finisher::new(comm.clone())
        .with_composite_task(recorder("composite", &seen))
        .with_shot_task(recorder("shot", &seen));

    let queue = FinisherQueue::new(comm);
    queue
        .enqueue(FinishingJob::shot(1, picture(), "s1".into(), Uuid::new_v4()))
        .unwrap();
    queue.shutdown().unwrap();

    finisher.run().await;
    assert_eq!(*seen.lock(), vec!["shot:s1"]);
}

#[tokio::test]
async fn test_finisher_ignores_states_and_stops_on_close() {
    let comm = worker_comm();
    let finisher = Finisher::new(comm.clone());
    let handle = tokio::spawn(finisher.run());

    comm.broadcast(Role::Master, &State::Idle);
    comm.close();

    let stats = timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats, FinisherStats::default());
}

#[tokio::test]
async fn test_enqueue_after_close_fails() {
    let comm = worker_comm();
    let queue = FinisherQueue::new(comm.clone());
    comm.close();

    assert!(queue
        .enqueue(FinishingJob::composite(picture(), "late".into(), Uuid::new_v4()))
        .is_err());
}

#[tokio::test]
async fn test_picture_saver_writes_buffer() {
    let temp_dir = TempDir::new().unwrap();
    let saver = PictureSaver::new(temp_dir.path());
    let job = FinishingJob::composite(picture(), "2024/booth00001".into(), Uuid::new_v4());

    saver.execute(&job).await.unwrap();

    let path = temp_dir.path().join("2024/booth00001.rgb");
    let written = tokio::fs::read(&path).await.unwrap();
    assert_eq!(written, job.picture.data());
}

#[tokio::test]
async fn test_metadata_writer_creates_sidecar() {
    let temp_dir = TempDir::new().unwrap();
    let writer = MetadataWriter::new(temp_dir.path());
    let session = Uuid::new_v4();
    let job = FinishingJob::shot(3, picture(), "booth_shot_00007".into(), session);

    writer.execute(&job).await.unwrap();

    let json = tokio::fs::read_to_string(temp_dir.path().join("booth_shot_00007.json"))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["session"], session.to_string());
    assert_eq!(value["width"], 2);
    assert_eq!(value["kind"]["shot"]["index"], 3);
}

#[test]
fn test_sequential_naming_continues_after_existing_files() {
    let temp_dir = TempDir::new().unwrap();
    for name in [
        "booth00003.jpg",
        "booth00011.rgb",
        "booth_shot_00042.rgb",
        "booth-old.jpg",
        "other00099.jpg",
    ] {
        std::fs::write(temp_dir.path().join(name), b"x").unwrap();
    }

    let mut naming =
        PictureNaming::new(temp_dir.path(), "booth", NamingScheme::Sequential).unwrap();
    assert_eq!(naming.next_composite(), "booth00012");
    assert_eq!(naming.next_composite(), "booth00013");
    assert_eq!(naming.next_shot(1), "booth_shot_00043");
}

#[test]
fn test_sequential_naming_in_missing_directory_starts_at_one() {
    let temp_dir = TempDir::new().unwrap();
    let mut naming = PictureNaming::new(
        &temp_dir.path().join("not-yet"),
        "booth",
        NamingScheme::Sequential,
    )
    .unwrap();
    assert_eq!(naming.next_composite(), "booth00001");
}

#[test]
fn test_random_naming_follows_session_id() {
    let mut naming = PictureNaming::with_basename("booth".into(), NamingScheme::Random);
    let first = Uuid::new_v4();
    naming.start_session(first);
    let composite = naming.next_composite();
    assert_eq!(composite, format!("booth-{}", first));
    assert_eq!(naming.next_shot(2), format!("booth-{}_shot_2", first));

    let second = Uuid::new_v4();
    naming.start_session(second);
    assert_ne!(naming.next_composite(), composite);
}

#[test]
fn test_basename_is_expanded_with_date() {
    let temp_dir = TempDir::new().unwrap();
    let mut naming =
        PictureNaming::new(temp_dir.path(), "%Y/booth", NamingScheme::Sequential).unwrap();
    let year = chrono::Local::now().format("%Y").to_string();
    assert_eq!(naming.next_composite(), format!("{}/booth00001", year));
}

#[tokio::test]
async fn test_queued_message_is_a_task() {
    let comm = worker_comm();
    let queue = FinisherQueue::new(comm.clone());
    let job = FinishingJob::composite(picture(), "x".into(), Uuid::new_v4());
    queue.enqueue(job.clone()).unwrap();

    match comm.receive(Role::Worker).await.unwrap() {
        Message::Task(crate::communicator::WorkItem::Job(received)) => assert_eq!(received, job),
        other => panic!("unexpected message {:?}", other),
    }
}
