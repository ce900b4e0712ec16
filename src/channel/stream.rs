//! Event channels: one paced, cancellable item stream per subscription.

use futures::StreamExt;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{AppError, ErrorCode, MethodError, Result};
use crate::search::{ClientRegistry, Outcomes, Record, RequestNormalizer};

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Search,
    Related,
    Artist,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Search, StreamKind::Related, StreamKind::Artist];

    pub fn channel_name(self) -> &'static str {
        match self {
            StreamKind::Search => "searchStream",
            StreamKind::Related => "relatedSongsStream",
            StreamKind::Artist => "artistSongsStream",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "search" | "searchStream" => Some(StreamKind::Search),
            "related" | "relatedSongsStream" => Some(StreamKind::Related),
            "artist" | "artistSongsStream" => Some(StreamKind::Artist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Listening,
    Emitting,
    Completed,
    Errored,
    Cancelled,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Errored | StreamState::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Item(Value),
    EndOfStream,
    Error(MethodError),
}

impl StreamEvent {
    pub fn to_json(&self) -> Value {
        match self {
            StreamEvent::Item(data) => json!({ "event": "item", "data": data }),
            StreamEvent::EndOfStream => json!({ "event": "endOfStream" }),
            StreamEvent::Error(error) => json!({
                "event": "error",
                "code": error.code,
                "message": error.message,
                "details": error.details,
            }),
        }
    }
}

/// Consumer end of one `listen` call.
pub struct Subscription {
    id: Uuid,
    events: mpsc::Receiver<StreamEvent>,
    state: watch::Receiver<StreamState>,
    token: CancellationToken,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the stream finished or was cancelled.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Waits for the producer to reach a terminal state.
    pub async fn finished(&mut self) -> StreamState {
        match self.state.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => StreamState::Cancelled,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct ActiveSubscription {
    id: Uuid,
    token: CancellationToken,
    state: watch::Receiver<StreamState>,
}

pub struct EventChannel {
    kind: StreamKind,
    registry: Arc<ClientRegistry>,
    pacing: Duration,
    active: Mutex<Option<ActiveSubscription>>,
}

impl EventChannel {
    pub fn new(kind: StreamKind, registry: Arc<ClientRegistry>, pacing: Duration) -> Self {
        Self {
            kind,
            registry,
            pacing,
            active: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Attaches a consumer. Any earlier subscription on this channel is
    /// cancelled first, so at most one iteration runs per channel.
    pub async fn listen(&self, args: Value) -> Subscription {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);

        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                log::info!(
                    "{}: cancelling subscription {} for new listener",
                    self.kind.channel_name(),
                    previous.id
                );
                previous.token.cancel();
            }
            *active = Some(ActiveSubscription {
                id,
                token: token.clone(),
                state: state_rx.clone(),
            });
        }

        state_tx.send_replace(StreamState::Listening);
        log::info!("{}: subscription {} listening", self.kind.channel_name(), id);

        let producer = Producer {
            kind: self.kind,
            registry: self.registry.clone(),
            pacing: self.pacing,
            events: event_tx,
            state: state_tx,
            token: token.clone(),
            id,
        };
        tokio::spawn(producer.run(args));

        Subscription {
            id,
            events: event_rx,
            state: state_rx,
            token,
        }
    }

    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            log::info!("{}: cancelling subscription {}", self.kind.channel_name(), active.id);
            active.token.cancel();
        }
    }

    /// State of the most recent subscription.
    pub async fn state(&self) -> StreamState {
        match self.active.lock().await.as_ref() {
            Some(active) => *active.state.borrow(),
            None => StreamState::Idle,
        }
    }
}

fn into_json<T: Serialize + Send + 'static>(outcomes: Outcomes<T>) -> Outcomes<Value> {
    outcomes
        .map(|next| {
            next.and_then(|record| match record {
                Record::Item(item) => Ok(Record::Item(serde_json::to_value(item)?)),
                Record::Skipped(reason) => Ok(Record::Skipped(reason)),
            })
        })
        .boxed()
}

struct Producer {
    kind: StreamKind,
    registry: Arc<ClientRegistry>,
    pacing: Duration,
    events: mpsc::Sender<StreamEvent>,
    state: watch::Sender<StreamState>,
    token: CancellationToken,
    id: Uuid,
}

enum Step {
    Continue,
    Stop(StreamState),
}

impl Producer {
    async fn open(&self, args: &Value) -> Result<(Outcomes<Value>, usize)> {
        let normalizer = RequestNormalizer::new();
        match self.kind {
            StreamKind::Search => {
                let request = normalizer.search(args)?;
                let service = self.registry.active().await?;
                Ok((into_json(service.search(&request)), request.limit))
            }
            StreamKind::Related => {
                let request = normalizer.related(args)?;
                let service = self.registry.active().await?;
                Ok((into_json(service.related(&request).await?), request.limit))
            }
            StreamKind::Artist => {
                let request = normalizer.artist(args)?;
                let service = self.registry.active().await?;
                Ok((into_json(service.artist_songs(&request).await?), request.limit))
            }
        }
    }

    async fn emit(&self, event: StreamEvent) -> Step {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Step::Stop(StreamState::Cancelled),
            sent = self.events.send(event) => match sent {
                Ok(()) => Step::Continue,
                Err(_) => Step::Stop(StreamState::Cancelled),
            },
        }
    }

    async fn fail(&self, error: &AppError) -> StreamState {
        log::error!("{}: stream {} failed: {}", self.kind.channel_name(), self.id, error);
        let event = StreamEvent::Error(MethodError::from_app(ErrorCode::StreamError, "Stream failed", error));
        match self.emit(event).await {
            Step::Continue => StreamState::Errored,
            Step::Stop(state) => state,
        }
    }

    async fn pace(&self) -> Step {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Step::Stop(StreamState::Cancelled),
            _ = self.events.closed() => Step::Stop(StreamState::Cancelled),
            _ = tokio::time::sleep(self.pacing) => Step::Continue,
        }
    }

    async fn drive(&self, args: Value) -> StreamState {
        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => return StreamState::Cancelled,
            _ = self.events.closed() => return StreamState::Cancelled,
            opened = self.open(&args) => opened,
        };
        let (mut outcomes, limit) = match opened {
            Ok(opened) => opened,
            Err(e) => return self.fail(&e).await,
        };

        self.state.send_replace(StreamState::Emitting);
        let mut emitted = 0usize;
        let mut skipped = 0usize;

        while emitted < limit {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return StreamState::Cancelled,
                _ = self.events.closed() => return StreamState::Cancelled,
                next = outcomes.next() => next,
            };

            match next {
                None => break,
                Some(Err(e)) => return self.fail(&e).await,
                Some(Ok(Record::Skipped(_))) => skipped += 1,
                Some(Ok(Record::Item(item))) => {
                    if let Step::Stop(state) = self.emit(StreamEvent::Item(item)).await {
                        return state;
                    }
                    emitted += 1;
                    log::debug!("{}: emitted item {}/{}", self.kind.channel_name(), emitted, limit);
                    if emitted < limit {
                        if let Step::Stop(state) = self.pace().await {
                            return state;
                        }
                    }
                }
            }
        }

        log::info!(
            "🎉 {}: stream {} finished with {} items (skipped {})",
            self.kind.channel_name(),
            self.id,
            emitted,
            skipped
        );
        match self.emit(StreamEvent::EndOfStream).await {
            Step::Continue => StreamState::Completed,
            Step::Stop(state) => state,
        }
    }

    async fn run(self, args: Value) {
        let finished = self.drive(args).await;
        if finished == StreamState::Cancelled {
            log::info!("{}: subscription {} cancelled", self.kind.channel_name(), self.id);
        }
        self.state.send_replace(finished);
    }
}
