//! Fixed-rate tick loop driving the combat engine

use crate::engine::CombatEngine;
use log::{debug, error, info};
use shared::{Message, TICK_INTERVAL_MS};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};

/// Events delivered to the worker loop
#[derive(Debug)]
pub enum WorkerEvent {
    Inbound(Message),
    Shutdown,
}

pub fn default_tick_period() -> Duration {
    Duration::from_millis(TICK_INTERVAL_MS)
}

/// Owns the engine and both channel ends for its whole lifetime
pub struct Worker {
    engine: CombatEngine,
    tick_period: Duration,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    outbound: mpsc::UnboundedSender<Message>,
}

impl Worker {
    pub fn new(
        tick_period: Duration,
        events: mpsc::UnboundedReceiver<WorkerEvent>,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            engine: CombatEngine::new(),
            tick_period,
            events,
            outbound,
        }
    }

    /// Starts a worker on its own task and returns the controlling handle
    pub fn spawn(tick_period: Duration) -> WorkerHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let worker = Worker::new(tick_period, events_rx, outbound_tx);
        let task = tokio::spawn(worker.run());

        WorkerHandle {
            events: events_tx,
            hits: outbound_rx,
            task,
        }
    }

    /// Runs until a shutdown event arrives or every event sender is gone.
    ///
    /// Messages are applied as they arrive; resolution happens only on the
    /// timer. Late ticks are skipped rather than replayed, so the schedule
    /// stays on the wall clock without catching up.
    pub async fn run(mut self) -> CombatEngine {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // First tick completes immediately
        ticker.tick().await;

        info!(
            "Combat worker started ({}ms tick)",
            self.tick_period.as_millis()
        );

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(WorkerEvent::Inbound(message)) => {
                            self.engine.handle_message(message);
                        }
                        Some(WorkerEvent::Shutdown) | None => {
                            info!("Combat worker shutting down");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    self.resolve_tick();
                }
            }
        }

        self.engine
    }

    fn resolve_tick(&mut self) {
        let victims = self.engine.tick();

        for victim in victims {
            if let Err(e) = self.outbound.send(Message::HitNotification(victim)) {
                error!("Failed to send hit notification: {}", e);
            }
        }

        let tick = self.engine.tick_count();
        if tick % 500 == 0 {
            debug!(
                "Tick {}: {} characters mirrored",
                tick,
                self.engine.registry().len()
            );
        }
    }
}

/// Control surface for a worker running on a tokio task
pub struct WorkerHandle {
    events: mpsc::UnboundedSender<WorkerEvent>,
    hits: mpsc::UnboundedReceiver<Message>,
    task: JoinHandle<CombatEngine>,
}

impl WorkerHandle {
    /// Delivers a message to the worker; returns false once it has stopped
    pub fn send(&self, message: Message) -> bool {
        self.events.send(WorkerEvent::Inbound(message)).is_ok()
    }

    /// Waits for the next outbound message
    pub async fn recv(&mut self) -> Option<Message> {
        self.hits.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        self.hits.try_recv().ok()
    }

    /// Stops the loop and hands back the final engine state
    pub async fn stop(self) -> Result<CombatEngine, JoinError> {
        // The loop may already be gone; joining still reports how it ended.
        let _ = self.events.send(WorkerEvent::Shutdown);
        self.task.await
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<WorkerEvent>,
        mpsc::UnboundedReceiver<Message>,
        JoinHandle<CombatEngine>,
    ) {
        (self.events, self.hits, self.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AttackIntent, Character, Direction};
    use tokio::time::{sleep, timeout};

    fn snapshot(characters: &[Character]) -> Message {
        Message::snapshot(characters)
    }

    fn attack_down(attacker: &str, x: f32, y: f32) -> Message {
        Message::AttackSubmit(AttackIntent {
            attacker_id: attacker.to_string(),
            x,
            y,
            direction: Direction::Down,
        })
    }

    #[test]
    fn test_default_tick_period() {
        assert_eq!(default_tick_period(), Duration::from_millis(20));
        let hz = 1000 / default_tick_period().as_millis();
        assert_eq!(hz, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_reported_on_next_tick() {
        let mut handle = Worker::spawn(default_tick_period());

        assert!(handle.send(snapshot(&[
            Character::new("h1", 0.0, 0.0),
            Character::new("h2", 0.0, 150.0),
        ])));
        assert!(handle.send(attack_down("h1", 0.0, 0.0)));

        let message = timeout(Duration::from_millis(30), handle.recv())
            .await
            .expect("hit within one tick")
            .unwrap();
        assert_eq!(message, Message::HitNotification("h2".to_string()));

        let engine = handle.stop().await.unwrap();
        assert!(!engine.registry().contains("h2"));
        assert!(engine.pending_attacks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_resolved_between_ticks() {
        let mut handle = Worker::spawn(default_tick_period());
        sleep(Duration::from_millis(25)).await;

        handle.send(snapshot(&[
            Character::new("h1", 0.0, 0.0),
            Character::new("h2", 0.0, 150.0),
        ]));
        handle.send(attack_down("h1", 0.0, 0.0));

        // Next tick is at 40ms.
        sleep(Duration::from_millis(10)).await;
        assert!(handle.try_recv().is_none());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            handle.try_recv(),
            Some(Message::HitNotification("h2".to_string()))
        );

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_rate() {
        let handle = Worker::spawn(default_tick_period());
        sleep(Duration::from_millis(205)).await;

        let engine = handle.stop().await.unwrap();
        assert_eq!(engine.tick_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_senders_dropped() {
        let handle = Worker::spawn(default_tick_period());
        let (events, _hits, task) = handle.into_parts();

        drop(events);
        let engine = task.await.unwrap();
        assert!(engine.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_sends_nothing() {
        let mut handle = Worker::spawn(default_tick_period());
        handle.send(snapshot(&[
            Character::new("h1", 0.0, 0.0),
            Character::new("h2", 800.0, 800.0),
        ]));
        handle.send(attack_down("h1", 0.0, 0.0));

        sleep(Duration::from_millis(100)).await;
        assert!(handle.try_recv().is_none());

        let engine = handle.stop().await.unwrap();
        assert_eq!(engine.registry().len(), 2);
    }
}
