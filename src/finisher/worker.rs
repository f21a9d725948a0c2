use super::job::FinishingJob;
use super::tasks::FinishingTask;
use crate::communicator::{Communicator, Message, Role, WorkItem};
use crate::error::ChannelError;
use tracing::{debug, error, info, trace, warn};

/// Producer side of the finisher queue
#[derive(Clone, Debug)]
pub struct FinisherQueue {
    comm: Communicator,
}

impl FinisherQueue {
    pub fn new(comm: Communicator) -> Self {
        Self { comm }
    }

    /// Queue a job without waiting for the finisher
    pub fn enqueue(&self, job: FinishingJob) -> Result<(), ChannelError> {
        info!("Queueing {} for finishing", job);
        self.comm
            .send(Role::Worker, Message::Task(WorkItem::Job(job)))
    }

    /// Ask the finisher to stop once everything queued before has run
    pub fn shutdown(&self) -> Result<(), ChannelError> {
        self.comm.send(Role::Worker, Message::Task(WorkItem::Teardown))
    }
}

/// Totals reported when the finisher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinisherStats {
    pub jobs: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Consumer of the finisher queue.
///
/// Jobs run one at a time in queue order. A failing task is logged and
/// does not stop the loop.
pub struct Finisher {
    comm: Communicator,
    composite_tasks: Vec<Box<dyn FinishingTask>>,
    shot_tasks: Vec<Box<dyn FinishingTask>>,
    stats: FinisherStats,
}

impl Finisher {
    pub fn new(comm: Communicator) -> Self {
        Self {
            comm,
            composite_tasks: Vec::new(),
            shot_tasks: Vec::new(),
            stats: FinisherStats::default(),
        }
    }

    /// Add a task run for every assembled picture
    pub fn with_composite_task<T: FinishingTask + 'static>(mut self, task: T) -> Self {
        self.composite_tasks.push(Box::new(task));
        self
    }

    /// Add a task run for every archived single shot
    pub fn with_shot_task<T: FinishingTask + 'static>(mut self, task: T) -> Self {
        self.shot_tasks.push(Box::new(task));
        self
    }

    pub fn task_names(&self) -> Vec<String> {
        self.composite_tasks
            .iter()
            .chain(self.shot_tasks.iter())
            .map(|task| task.name().to_string())
            .collect()
    }

    /// Process jobs until the teardown sentinel arrives or the queue closes
    pub async fn run(mut self) -> FinisherStats {
        info!(
            "Finisher started with {} composite and {} shot tasks",
            self.composite_tasks.len(),
            self.shot_tasks.len()
        );

        loop {
            match self.comm.receive(Role::Worker).await {
                Ok(Message::Task(WorkItem::Job(job))) => self.process(&job).await,
                Ok(Message::Task(WorkItem::Teardown)) => {
                    debug!("Finisher received teardown");
                    break;
                }
                Ok(Message::State(state)) => trace!("Finisher ignoring state {}", state),
                Ok(other) => warn!("Finisher ignoring unexpected {} message", other.kind()),
                Err(ChannelError::ChannelClosed(_)) => {
                    debug!("Finisher queue closed");
                    break;
                }
                Err(e) => {
                    error!("Finisher cannot receive: {}", e);
                    break;
                }
            }
        }

        info!(
            "Finisher stopped: {} jobs, {} tasks completed, {} failed",
            self.stats.jobs, self.stats.completed, self.stats.failed
        );
        self.stats
    }

    async fn process(&mut self, job: &FinishingJob) {
        self.stats.jobs += 1;
        let tasks = if job.is_composite() {
            &self.composite_tasks
        } else {
            &self.shot_tasks
        };

        for task in tasks {
            match task.execute(job).await {
                Ok(()) => {
                    debug!("{} finished {}", task.name(), job);
                    self.stats.completed += 1;
                }
                Err(e) => {
                    error!("Finishing task failed: {}", e);
                    self.stats.failed += 1;
                }
            }
        }
    }
}
