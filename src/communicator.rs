use crate::error::ChannelError;
use crate::finisher::FinishingJob;
use crate::machine::{Event, State};
use crate::picture::Picture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

/// Execution contexts that can own a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Session orchestrator inbox; the state machine broadcasts as Master
    Master,
    Presenter,
    Camera,
    /// Hardware input (buttons and lamp)
    Gpio,
    /// Finisher work queue
    Worker,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Master,
        Role::Presenter,
        Role::Camera,
        Role::Gpio,
        Role::Worker,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Master => "master",
            Role::Presenter => "presenter",
            Role::Camera => "camera",
            Role::Gpio => "gpio",
            Role::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// Unit of work on the finisher queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkItem {
    Job(FinishingJob),
    /// Sentinel that stops the finisher loop
    Teardown,
}

/// Everything that travels through a role channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Event(Event),
    State(State),
    Preview(Picture),
    Task(WorkItem),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Event(_) => "event",
            Message::State(_) => "state",
            Message::Preview(_) => "preview",
            Message::Task(_) => "task",
        }
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

impl From<State> for Message {
    fn from(state: State) -> Self {
        Message::State(state)
    }
}

struct Channel {
    sender: RwLock<Option<mpsc::UnboundedSender<Message>>>,
    receiver: Mutex<mpsc::UnboundedReceiver<Message>>,
    pending: AtomicUsize,
}

impl Channel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: RwLock::new(Some(sender)),
            receiver: Mutex::new(receiver),
            pending: AtomicUsize::new(0),
        }
    }
}

/// Role-keyed message fabric shared by all execution contexts.
///
/// Every attached role owns one FIFO channel. Any context may send to any
/// role, only the owner of a role should receive from it. Cloning is cheap
/// and all clones see the same channels.
#[derive(Clone)]
pub struct Communicator {
    channels: Arc<HashMap<Role, Channel>>,
}

impl Communicator {
    /// Create a new communicator with one channel per attached role
    pub fn new(roles: &[Role]) -> Self {
        let channels = roles.iter().map(|role| (*role, Channel::new())).collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn is_attached(&self, role: Role) -> bool {
        self.channels.contains_key(&role)
    }

    pub fn roles(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| self.is_attached(*role))
            .collect()
    }

    fn channel(&self, role: Role) -> Result<&Channel, ChannelError> {
        self.channels
            .get(&role)
            .ok_or(ChannelError::InvalidRole(role))
    }

    /// Deliver a state to every attached role except the sender.
    ///
    /// Roles whose channel is already closed are skipped. Returns the number
    /// of roles the state was delivered to.
    pub fn broadcast(&self, sender: Role, state: &State) -> usize {
        let mut delivered = 0;
        for role in Role::ALL.iter().copied().filter(|role| *role != sender) {
            if !self.is_attached(role) {
                continue;
            }
            match self.send(role, Message::State(state.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Skipping broadcast of {} to {}: {}", state, role, e),
            }
        }
        trace!("Broadcast {} from {} to {} roles", state, sender, delivered);
        delivered
    }

    /// Point-to-point delivery to one role
    pub fn send(&self, role: Role, message: Message) -> Result<(), ChannelError> {
        let channel = self.channel(role)?;
        let guard = channel.sender.read();
        let sender = guard.as_ref().ok_or(ChannelError::ChannelClosed(role))?;

        channel.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(message).is_err() {
            channel.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ChannelError::ChannelClosed(role));
        }
        Ok(())
    }

    pub fn send_event(&self, role: Role, event: Event) -> Result<(), ChannelError> {
        self.send(role, Message::Event(event))
    }

    /// Wait for the next message addressed to `role`.
    ///
    /// Queued messages are still delivered after [`Communicator::close`];
    /// once drained the call fails with `ChannelClosed`.
    pub async fn receive(&self, role: Role) -> Result<Message, ChannelError> {
        let channel = self.channel(role)?;
        let mut receiver = channel.receiver.lock().await;
        match receiver.recv().await {
            Some(message) => {
                channel.pending.fetch_sub(1, Ordering::SeqCst);
                Ok(message)
            }
            None => Err(ChannelError::ChannelClosed(role)),
        }
    }

    /// Non-blocking receive; `Ok(None)` when nothing is queued
    pub fn try_receive(&self, role: Role) -> Result<Option<Message>, ChannelError> {
        let channel = self.channel(role)?;
        let mut receiver = match channel.receiver.try_lock() {
            Ok(receiver) => receiver,
            // Someone is already waiting on this role
            Err(_) => return Ok(None),
        };
        match receiver.try_recv() {
            Ok(message) => {
                channel.pending.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(message))
            }
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(ChannelError::ChannelClosed(role)),
        }
    }

    /// True when no message is waiting for `role`
    pub fn is_empty(&self, role: Role) -> Result<bool, ChannelError> {
        Ok(self.channel(role)?.pending.load(Ordering::SeqCst) == 0)
    }

    pub fn is_closed(&self, role: Role) -> Result<bool, ChannelError> {
        Ok(self.channel(role)?.sender.read().is_none())
    }

    /// Close every channel so that receivers fail once drained
    pub fn close(&self) {
        for (role, channel) in self.channels.iter() {
            if channel.sender.write().take().is_some() {
                debug!("Closed channel for {}", role);
            }
        }
    }
}

impl fmt::Debug for Communicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Communicator")
            .field("roles", &self.roles())
            .finish()
    }
}
