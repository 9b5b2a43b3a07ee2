//! Session Driver
//!
//! Async shell around [`GameEngine`]. One tokio task owns the engine,
//! executes its timer commands with real sleeps, publishes its events on
//! a broadcast channel, and hands finished records to persistence.
//!
//! At most one timer task is alive at a time: arming aborts the previous
//! handle before spawning the next. An expiry that slips through the
//! abort reaches the engine with a stale id and is ignored there.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::core::clock::Clock;
use crate::game::completion::CompletionReport;
use crate::game::engine::{EngineError, GameEngine, StepResult, SubmitOutcome};
use crate::game::events::GameEvent;
use crate::game::question::Question;
use crate::game::state::PlayerId;
use crate::game::timer::{TimerCommand, TimerId};
use crate::persistence::record::GameHistoryRecord;
use crate::persistence::store::{ResultStore, StatsCache};
use crate::persistence::sync::persist_completion;

/// Capacity of the outbound event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EXPIRY_CHANNEL_CAPACITY: usize = 8;

/// Driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver task has stopped.
    #[error("session driver closed")]
    Closed,

    /// Engine rejected the call.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Driver task panicked or was cancelled.
    #[error("driver task failed: {0}")]
    Join(String),
}

/// Commands from the host.
#[derive(Debug)]
pub enum HostCommand {
    /// Begin the session.
    Start {
        /// Player
        player_id: PlayerId,
        /// Questions, already supplied
        questions: Vec<Question>,
        /// Where to report the result
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Answer the current question.
    Submit {
        /// Chosen option
        option_index: usize,
        /// Where to report the outcome
        reply: oneshot::Sender<SubmitOutcome>,
    },
    /// Leave the session.
    Exit,
}

/// Where finished sessions are written.
#[derive(Clone)]
struct PersistTargets {
    cache: Arc<dyn StatsCache>,
    store: Arc<dyn ResultStore>,
}

/// Owns a [`GameEngine`] and runs it on tokio.
pub struct SessionDriver {
    engine: GameEngine,
    clock: Arc<dyn Clock>,
    persist: Option<PersistTargets>,
}

impl SessionDriver {
    /// Driver for `engine`, reading time from `clock`.
    pub fn new(engine: GameEngine, clock: Arc<dyn Clock>) -> Self {
        Self { engine, clock, persist: None }
    }

    /// Persist completed sessions (builder style).
    pub fn with_persistence(mut self, cache: Arc<dyn StatsCache>, store: Arc<dyn ResultStore>) -> Self {
        self.persist = Some(PersistTargets { cache, store });
        self
    }

    /// Start the driver task.
    pub fn spawn(self) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (expiry_tx, expiry_rx) = mpsc::channel(EXPIRY_CHANNEL_CAPACITY);

        let task = DriverTask {
            engine: self.engine,
            clock: self.clock,
            persist: self.persist,
            events: event_tx.clone(),
            commands: command_rx,
            expiry_tx,
            expiry_rx,
            timer: None,
            persist_task: None,
            finished: false,
        };

        SessionHandle {
            commands: command_tx,
            events: event_tx,
            task: tokio::spawn(task.run()),
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Host side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<HostCommand>,
    events: broadcast::Sender<GameEvent>,
    task: JoinHandle<Option<CompletionReport>>,
}

impl SessionHandle {
    /// Receive events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Start the session with already-supplied questions.
    pub async fn start(&self, player_id: PlayerId, questions: Vec<Question>) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::Start { player_id, questions, reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)??;
        Ok(())
    }

    /// Submit an answer to the current question.
    pub async fn submit(&self, option_index: usize) -> Result<SubmitOutcome, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::Submit { option_index, reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Leave the session; the driver stops after cancelling its timer.
    pub async fn exit(&self) -> Result<(), DriverError> {
        self.send(HostCommand::Exit).await
    }

    /// Wait for the driver to stop. `None` if the session was exited
    /// before completing.
    pub async fn join(self) -> Result<Option<CompletionReport>, DriverError> {
        let Self { commands, events, task } = self;
        let result = task.await.map_err(|e| DriverError::Join(e.to_string()));
        drop(commands);
        drop(events);
        result
    }

    async fn send(&self, command: HostCommand) -> Result<(), DriverError> {
        self.commands.send(command).await.map_err(|_| DriverError::Closed)
    }
}

// =============================================================================
// TASK
// =============================================================================

struct DriverTask {
    engine: GameEngine,
    clock: Arc<dyn Clock>,
    persist: Option<PersistTargets>,
    events: broadcast::Sender<GameEvent>,
    commands: mpsc::Receiver<HostCommand>,
    expiry_tx: mpsc::Sender<TimerId>,
    expiry_rx: mpsc::Receiver<TimerId>,
    timer: Option<(TimerId, JoinHandle<()>)>,
    persist_task: Option<JoinHandle<()>>,
    finished: bool,
}

impl DriverTask {
    #[instrument(skip(self), name = "session_driver")]
    async fn run(mut self) -> Option<CompletionReport> {
        debug!("Session driver started");

        while !self.finished {
            tokio::select! {
                biased;

                Some(id) = self.expiry_rx.recv() => {
                    if self.timer.as_ref().is_some_and(|(current, _)| *current == id) {
                        self.timer = None;
                    }
                    let now = self.clock.now_ms();
                    let step = self.engine.on_timer_fired(id, now);
                    self.apply(step);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All session handles dropped");
                        self.abort_timer();
                        break;
                    }
                },
            }
        }

        if let Some(task) = self.persist_task.take() {
            if let Err(e) = task.await {
                warn!("Persistence task failed: {}", e);
            }
        }

        debug!("Session driver stopped");
        self.engine.report().cloned()
    }

    fn handle(&mut self, command: HostCommand) {
        let now = self.clock.now_ms();
        match command {
            HostCommand::Start { player_id, questions, reply } => {
                let result = match self.engine.start_session(player_id, questions, now) {
                    Ok(step) => {
                        self.apply(step);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Start rejected: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            HostCommand::Submit { option_index, reply } => {
                let step = self.engine.submit_answer(option_index, now);
                let outcome = step.submit.unwrap_or(SubmitOutcome::NotActive);
                self.apply(step);
                let _ = reply.send(outcome);
            }
            HostCommand::Exit => {
                let step = self.engine.exit_session();
                self.apply(step);
                self.abort_timer();
                self.finished = true;
            }
        }
    }

    /// Carry out timer commands, publish events, and kick off persistence.
    fn apply(&mut self, step: StepResult) {
        for command in step.timers {
            match command {
                TimerCommand::Cancel { id } => {
                    if self.timer.as_ref().is_some_and(|(current, _)| *current == id) {
                        self.abort_timer();
                    }
                }
                TimerCommand::Arm { id, delay_ms } => {
                    self.abort_timer();
                    let expiry_tx = self.expiry_tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        let _ = expiry_tx.send(id).await;
                    });
                    self.timer = Some((id, handle));
                }
            }
        }

        for event in step.events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }

        if step.completed {
            self.finished = true;
            let record = self.engine.report().map(|r| r.record.clone());
            if let Some(record) = record {
                self.spawn_persist(record);
            }
        }
    }

    fn spawn_persist(&mut self, record: GameHistoryRecord) {
        let Some(targets) = self.persist.clone() else {
            return;
        };
        self.persist_task = Some(tokio::spawn(async move {
            match persist_completion(targets.cache.as_ref(), targets.store.as_ref(), &record).await {
                Ok(stats) => info!(
                    "Stats for {}: {} games, {} earned, best {}",
                    record.user_id, stats.games_played, stats.total_earnings, stats.highest_score
                ),
                Err(e) => warn!("Failed to persist session {}: {}", record.session_id, e),
            }
        }));
    }

    fn abort_timer(&mut self) {
        if let Some((id, handle)) = self.timer.take() {
            debug!("Aborting timer {:?}", id);
            handle.abort();
        }
    }
}
