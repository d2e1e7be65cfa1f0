//! Coordinator's end of the channel to the combat worker
//!
//! The worker either runs as a child process speaking line-framed messages
//! over its stdio, or on a tokio task in this process. Both look the same
//! from here: messages go in, hit notifications and a final exit report come
//! out. A worker that dies is reported once and never restarted.

use log::{error, info, warn};
use shared::Message;
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::mpsc;
use worker::channel::{spawn_reader, spawn_writer};
use worker::scheduler::{Worker, WorkerEvent};

/// What the coordinator hears back from the worker
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A character was hit and should be announced to everyone
    Hit(String),
    /// The worker is gone; combat resolution has stopped
    Exited(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to start worker process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("worker is no longer accepting messages")]
    Closed,
}

pub struct WorkerLink {
    outbound: Option<mpsc::UnboundedSender<Message>>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl WorkerLink {
    /// Starts the worker binary at `program` as a child process
    pub fn spawn_process(program: impl AsRef<OsStr>, tick_ms: u64) -> Result<Self, LinkError> {
        let mut command = Command::new(program);
        command.arg("--tick-ms").arg(tick_ms.to_string());
        Self::spawn_command(command)
    }

    /// Starts `command` as the worker, with its stdin and stdout as the channel
    pub fn spawn_command(mut command: Command) -> Result<Self, LinkError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(LinkError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(LinkError::MissingPipe("stdout"))?;
        info!("Started worker process {:?}", child.id());

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let writer = spawn_writer(stdin, outbound_rx);
        tokio::spawn(async move {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Failed to write to worker: {}", e),
                Err(e) => error!("Worker writer task failed: {}", e),
            }
        });

        let hits_tx = events_tx.clone();
        let reader = spawn_reader(stdout, move |message| forward_from_worker(&hits_tx, message));

        tokio::spawn(async move {
            let status = child.wait().await;
            // Deliver any hits still in the pipe before the exit report.
            let _ = reader.await;

            let description = match status {
                Ok(status) => status.to_string(),
                Err(e) => e.to_string(),
            };
            warn!("Worker exited with {}", description);
            let _ = events_tx.send(LinkEvent::Exited(description));
        });

        Ok(Self {
            outbound: Some(outbound_tx),
            events: events_rx,
        })
    }

    /// Runs the worker on a tokio task in this process
    pub fn in_process(tick_period: Duration) -> Self {
        let (worker_events, mut hits, task) = Worker::spawn(tick_period).into_parts();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // Dropping the link closes this forwarder, which stops the worker.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if worker_events.send(WorkerEvent::Inbound(message)).is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(message) = hits.recv().await {
                if !forward_from_worker(&events_tx, message) {
                    break;
                }
            }

            let description = match task.await {
                Ok(engine) => format!("stopped after {} ticks", engine.tick_count()),
                Err(e) => e.to_string(),
            };
            info!("Worker {}", description);
            let _ = events_tx.send(LinkEvent::Exited(description));
        });

        Self {
            outbound: Some(outbound_tx),
            events: events_rx,
        }
    }

    pub fn send(&self, message: Message) -> Result<(), LinkError> {
        self.outbound
            .as_ref()
            .ok_or(LinkError::Closed)?
            .send(message)
            .map_err(|_| LinkError::Closed)
    }

    /// Waits for the next hit or the exit report
    ///
    /// Once the exit report has been returned, `send` fails with
    /// [`LinkError::Closed`] and this returns `None`.
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        let event = self.events.recv().await;
        if matches!(event, Some(LinkEvent::Exited(_)) | None) {
            self.outbound = None;
        }
        event
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_none()
    }

    /// Closes the channel to the worker and waits for it to exit
    ///
    /// Hits reported during shutdown are discarded. Returns the exit report,
    /// if the worker produced one.
    pub async fn shutdown(mut self) -> Option<String> {
        self.outbound.take();

        while let Some(event) = self.events.recv().await {
            if let LinkEvent::Exited(description) = event {
                return Some(description);
            }
        }
        None
    }
}

fn forward_from_worker(events: &mpsc::UnboundedSender<LinkEvent>, message: Message) -> bool {
    match message {
        Message::HitNotification(victim) => events.send(LinkEvent::Hit(victim)).is_ok(),
        Message::Unrecognized(tag) => {
            warn!("Received unclear type from worker: {}", tag);
            true
        }
        other => {
            warn!("Unexpected {} message from worker", other.tag());
            true
        }
    }
}
