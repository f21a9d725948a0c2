//! Background finishing of captured pictures.
//!
//! The orchestrator enqueues [`FinishingJob`]s through a [`FinisherQueue`];
//! a [`Finisher`] running in its own task executes them one after another.

mod job;
mod naming;
mod tasks;
mod worker;
#[cfg(test)]
mod tests;

pub use job::{FinishingJob, JobKind};
pub use naming::{NamingScheme, PictureNaming};
pub use tasks::{FinishingTask, MetadataWriter, PictureSaver};
pub use worker::{Finisher, FinisherQueue, FinisherStats};
