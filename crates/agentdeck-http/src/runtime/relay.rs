//! # Execution Stream Relay
//!
//! Turns an execution into a server-sent event stream. A channel is opened
//! with a snapshot of the execution and runs in one of three modes:
//!
//! - [`RelayMode::Remote`]: forwards chunks from the agent-hosting service,
//!   accumulating output on the stored execution
//! - [`RelayMode::Simulated`]: advances the execution's tasks on a timer,
//!   or observes when another relay already produces for the execution
//! - [`RelayMode::Observe`]: follows a relay already running for the same
//!   execution through the [`StreamHub`]
//!
//! Every relay is a lazily polled stream owned by the HTTP response. When
//! the client disconnects the response is dropped, and with it the timer,
//! the tick interval and the remote connection. Nothing is spawned.
//!
//! Events are JSON objects tagged by `type`:
//!
//! ```json
//! {"type":"execution","execution":{...}}
//! {"type":"chunk","data":"partial output"}
//! {"type":"update","execution":{...}}
//! {"type":"complete","execution":{...}}
//! {"type":"error","error":"message"}
//! ```

use agentdeck_core::{Execution, RecordStore, Task};
use agentdeck_gateway::ChunkStream;
use axum::response::sse::{Event, KeepAlive, Sse};
use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    Stream,
    stream::{BoxStream, StreamExt},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, info, warn};

/// Buffered events per live execution before slow observers start lagging
const HUB_CHANNEL_CAPACITY: usize = 64;

/// Name of the task seeded into simulated executions that have none
pub const SEED_TASK_NAME: &str = "Process input";

/// Upper bound of the random progress step applied per simulation tick
const MAX_SIMULATED_INCREMENT: u8 = 25;

/// One event on an execution stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamEvent {
    /// Snapshot sent when the channel opens
    Execution { execution: Box<Execution> },
    /// Verbatim output from the remote agent
    Chunk { data: String },
    /// Snapshot after simulated progress
    Update { execution: Box<Execution> },
    /// Final snapshot; the channel closes after it
    Complete { execution: Box<Execution> },
    /// In-band failure; the channel closes after it
    Error { error: String },
}

impl StreamEvent {
    pub fn snapshot(execution: Execution) -> Self {
        Self::Execution {
            execution: Box::new(execution),
        }
    }

    pub fn update(execution: Execution) -> Self {
        Self::Update {
            execution: Box::new(execution),
        }
    }

    pub fn complete(execution: Execution) -> Self {
        Self::Complete {
            execution: Box::new(execution),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Whether the channel closes after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Render as an SSE `data:` frame
    pub fn to_sse(&self) -> Event {
        Event::default().json_data(self).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize stream event");
            Event::default().data(
                serde_json::json!({"type": "error", "error": "event serialization failed"})
                    .to_string(),
            )
        })
    }
}

/// How a relay produces events after the opening snapshot
pub enum RelayMode {
    /// Forward an in-flight remote invocation
    Remote(ChunkStream),
    /// Advance tasks every `tick`
    Simulated { tick: Duration },
    /// Follow the live relay of the same execution, if any
    Observe,
}

impl std::fmt::Debug for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(_) => f.write_str("Remote"),
            Self::Simulated { tick } => f.debug_struct("Simulated").field("tick", tick).finish(),
            Self::Observe => f.write_str("Observe"),
        }
    }
}

/// Registry of executions that currently have a producing relay
///
/// Producing relays publish every event they yield; other stream requests
/// for the same execution subscribe instead of starting a second producer.
#[derive(Debug, Default)]
pub struct StreamHub {
    channels: DashMap<String, broadcast::Sender<StreamEvent>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer for `execution_id`, replacing any current one.
    /// The registration ends when the returned [`Publisher`] is dropped.
    pub fn publisher(self: &Arc<Self>, execution_id: &str) -> Publisher {
        let (sender, _) = broadcast::channel(HUB_CHANNEL_CAPACITY);
        self.channels
            .insert(execution_id.to_string(), sender.clone());
        self.registered(execution_id, sender)
    }

    /// Register a producer for `execution_id` unless one is already live.
    ///
    /// The check and the registration happen under the same shard lock, so
    /// of two concurrent callers exactly one gets a [`Publisher`].
    pub fn try_publisher(self: &Arc<Self>, execution_id: &str) -> Option<Publisher> {
        match self.channels.entry(execution_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let (sender, _) = broadcast::channel(HUB_CHANNEL_CAPACITY);
                slot.insert(sender.clone());
                Some(self.registered(execution_id, sender))
            }
        }
    }

    fn registered(
        self: &Arc<Self>,
        execution_id: &str,
        sender: broadcast::Sender<StreamEvent>,
    ) -> Publisher {
        Publisher {
            hub: Arc::clone(self),
            execution_id: execution_id.to_string(),
            sender,
        }
    }

    pub fn subscribe(&self, execution_id: &str) -> Option<broadcast::Receiver<StreamEvent>> {
        self.channels.get(execution_id).map(|tx| tx.subscribe())
    }

    /// Number of executions with a producing relay
    pub fn live_count(&self) -> usize {
        self.channels.len()
    }
}

/// Producer side of a hub channel
#[derive(Debug)]
pub struct Publisher {
    hub: Arc<StreamHub>,
    execution_id: String,
    sender: broadcast::Sender<StreamEvent>,
}

impl Publisher {
    pub fn publish(&self, event: &StreamEvent) {
        // No subscribers is the common case
        let _ = self.sender.send(event.clone());
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        // A newer producer may have replaced this one
        self.hub
            .channels
            .remove_if(&self.execution_id, |_, tx| tx.same_channel(&self.sender));
    }
}

/// Opens event streams for executions
#[derive(Debug, Clone)]
pub struct ExecutionRelay {
    store: Arc<RecordStore>,
    hub: Arc<StreamHub>,
}

impl ExecutionRelay {
    pub fn new(store: Arc<RecordStore>, hub: Arc<StreamHub>) -> Self {
        Self { store, hub }
    }

    /// Open a channel for `execution`.
    ///
    /// A terminal execution yields its snapshot and `complete` whatever the
    /// mode. Producing modes register with the hub before this returns; a
    /// simulated open for an execution that already has a producer observes
    /// it instead. The returned stream has no lifetime limit; see
    /// [`with_lifetime`].
    pub fn open(&self, execution: Execution, mode: RelayMode) -> BoxStream<'static, StreamEvent> {
        debug!(execution_id = %execution.id, mode = ?mode, "Opening execution stream");

        if execution.is_terminal() {
            return finished(execution);
        }

        match mode {
            RelayMode::Remote(chunks) => {
                let publisher = self.hub.publisher(&execution.id);
                self.remote(execution, chunks, publisher)
            }
            RelayMode::Simulated { tick } => match self.hub.try_publisher(&execution.id) {
                Some(publisher) => self.simulated(execution, tick, publisher),
                None => {
                    debug!(
                        execution_id = %execution.id,
                        "Execution already has a producer; observing"
                    );
                    self.observe(execution)
                }
            },
            RelayMode::Observe => self.observe(execution),
        }
    }

    fn remote(
        &self,
        execution: Execution,
        mut chunks: ChunkStream,
        publisher: Publisher,
    ) -> BoxStream<'static, StreamEvent> {
        let store = Arc::clone(&self.store);

        Box::pin(async_stream::stream! {
            let execution_id = execution.id.clone();

            let event = StreamEvent::snapshot(execution);
            publisher.publish(&event);
            yield event;

            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => {
                        let updated = store.update::<Execution>(&execution_id, |e| {
                            if !e.is_terminal() {
                                e.append_output(&chunk.data);
                            }
                        });
                        let event = match updated {
                            None => {
                                warn!(execution_id = %execution_id, "Execution removed while streaming");
                                return;
                            }
                            // Cancelled while the remote was still producing
                            Some(snapshot) if snapshot.is_terminal() => StreamEvent::complete(snapshot),
                            Some(_) => StreamEvent::Chunk { data: chunk.data },
                        };
                        let terminal = event.is_terminal();
                        publisher.publish(&event);
                        yield event;
                        if terminal {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(execution_id = %execution_id, error = %err, "Remote invocation failed mid-stream");
                        let message = err.to_string();
                        store.update::<Execution>(&execution_id, |e| {
                            if !e.is_terminal() {
                                e.fail(&message);
                            }
                        });
                        let event = StreamEvent::error(message);
                        publisher.publish(&event);
                        yield event;
                        return;
                    }
                }
            }

            let Some(snapshot) = store.update::<Execution>(&execution_id, |e| {
                if !e.is_terminal() {
                    e.complete();
                }
            }) else {
                return;
            };
            info!(
                execution_id = %execution_id,
                chunks = snapshot.metrics.chunk_count,
                status = %snapshot.status,
                "Remote invocation finished"
            );
            let event = StreamEvent::complete(snapshot);
            publisher.publish(&event);
            yield event;
        })
    }

    fn simulated(
        &self,
        execution: Execution,
        tick: Duration,
        publisher: Publisher,
    ) -> BoxStream<'static, StreamEvent> {
        let store = Arc::clone(&self.store);

        Box::pin(async_stream::stream! {
            let execution_id = execution.id.clone();

            let execution = if execution.tasks.is_empty() {
                let task = Task::new(&execution.id, &execution.agent_id, SEED_TASK_NAME)
                    .with_input(execution.input.clone());
                store
                    .update::<Execution>(&execution_id, |e| {
                        if e.tasks.is_empty() {
                            e.push_task(task);
                        }
                    })
                    .unwrap_or(execution)
            } else {
                execution
            };

            let event = StreamEvent::snapshot(execution);
            publisher.publish(&event);
            yield event;

            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            loop {
                interval.tick().await;

                let increment = rand::random_range(1..=MAX_SIMULATED_INCREMENT);
                let Some(snapshot) = store.update::<Execution>(&execution_id, |e| {
                    if !e.is_terminal() {
                        e.advance_active_task(increment);
                    }
                }) else {
                    let event = StreamEvent::error(format!("Execution {execution_id} no longer exists"));
                    publisher.publish(&event);
                    yield event;
                    return;
                };

                if snapshot.is_terminal() {
                    let event = StreamEvent::complete(snapshot);
                    publisher.publish(&event);
                    yield event;
                    return;
                }

                let all_done = snapshot.all_tasks_terminal();
                let event = StreamEvent::update(snapshot);
                publisher.publish(&event);
                yield event;

                if all_done {
                    let Some(done) = store.update::<Execution>(&execution_id, |e| {
                        if !e.is_terminal() {
                            e.complete();
                        }
                    }) else {
                        return;
                    };
                    debug!(execution_id = %execution_id, "Simulated execution complete");
                    let event = StreamEvent::complete(done);
                    publisher.publish(&event);
                    yield event;
                    return;
                }
            }
        })
    }

    fn observe(&self, execution: Execution) -> BoxStream<'static, StreamEvent> {
        let store = Arc::clone(&self.store);
        let hub = Arc::clone(&self.hub);

        Box::pin(async_stream::stream! {
            let execution_id = execution.id.clone();
            // Subscribe before reading the snapshot so no event falls in between
            let receiver = hub.subscribe(&execution_id);
            let snapshot = store.get::<Execution>(&execution_id).unwrap_or(execution);

            if snapshot.is_terminal() {
                yield StreamEvent::snapshot(snapshot.clone());
                yield StreamEvent::complete(snapshot);
                return;
            }
            yield StreamEvent::snapshot(snapshot);

            let Some(receiver) = receiver else {
                debug!(execution_id = %execution_id, "No live relay to observe");
                return;
            };

            let mut events = BroadcastStream::new(receiver);
            while let Some(item) = events.next().await {
                match item {
                    Ok(StreamEvent::Execution { .. }) => {}
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        yield event;
                        if terminal {
                            return;
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(execution_id = %execution_id, skipped, "Observer lagged behind live relay");
                    }
                }
            }

            // The producer went away; report its outcome if it reached one
            if let Some(done) = store
                .get::<Execution>(&execution_id)
                .filter(Execution::is_terminal)
            {
                yield StreamEvent::complete(done);
            }
        })
    }
}

fn finished(execution: Execution) -> BoxStream<'static, StreamEvent> {
    futures::stream::iter([
        StreamEvent::snapshot(execution.clone()),
        StreamEvent::complete(execution),
    ])
    .boxed()
}

/// Close `events` after `max_lifetime` without emitting anything further.
pub fn with_lifetime(
    events: BoxStream<'static, StreamEvent>,
    max_lifetime: Duration,
) -> BoxStream<'static, StreamEvent> {
    let deadline = async move {
        tokio::time::sleep(max_lifetime).await;
        debug!(?max_lifetime, "Execution stream reached its maximum lifetime");
    };
    events.take_until(deadline).boxed()
}

/// Wrap an event stream into an SSE response body.
pub fn sse_response(
    events: BoxStream<'static, StreamEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = events.map(|event| Ok::<Event, Infallible>(event.to_sse()));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
