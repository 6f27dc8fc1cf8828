use futures::StreamExt;
use log::{debug, error, info, warn};

use crate::api::models::{TaskId, TaskStatus};
use crate::api::sse::ProgressTransport;
use crate::config::ReconnectPolicy;
use crate::progress::view::ConnectionIndicator;
use crate::shell::context::AppContext;

/// Lifecycle of the live progress connection. `Closed` is reported when no
/// connection exists at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Errored,
    Closed,
}

/// Metadata for the current connection. The live event stream itself is a
/// local of [`ProgressStreamClient::run`]; this only tracks what the rest
/// of the engine needs to observe.
#[derive(Debug, Clone)]
pub struct StreamConnection {
    pub task: TaskId,
    pub state: ConnectionState,
}

/// How a stream run ended, for the caller to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Terminal completed frame arrived; final results can be fetched.
    Completed,
    /// Terminal failed frame arrived.
    Failed { message: String },
    /// Reconnection budget exhausted; live updates are gone but the task
    /// may still be running server-side.
    Unavailable,
    /// The client was closed without a terminal frame.
    Closed,
}

/// Client for the live progress stream. Connects through a
/// [`ProgressTransport`], folds events into the progress view, and
/// reconnects with exponential backoff when the connection drops.
///
/// Opening a stream while one is active closes the old one first, so at
/// most one connection exists per client.
pub struct ProgressStreamClient {
    transport: Box<dyn ProgressTransport>,
    policy: ReconnectPolicy,
    connection: Option<StreamConnection>,
    reconnect_attempts: u32,
}

impl ProgressStreamClient {
    pub fn new(transport: Box<dyn ProgressTransport>, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            policy,
            connection: None,
            reconnect_attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map(|c| c.state)
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Prepare a stream for `task`. Any previous connection is closed and
    /// the reconnection budget starts fresh.
    pub fn open(&mut self, task: TaskId) {
        if self.connection.is_some() {
            debug!("closing previous progress stream before opening a new one");
            self.close();
        }
        info!("progress stream opened for task {task}");
        self.reconnect_attempts = 0;
        self.connection = Some(StreamConnection {
            task,
            state: ConnectionState::Connecting,
        });
    }

    /// Drop the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!("progress stream closed");
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if let Some(conn) = self.connection.as_mut() {
            conn.state = state;
        }
    }

    /// Drive the stream until a terminal frame arrives, the client is
    /// closed, or the reconnection budget runs out. Progress events are
    /// folded into `ctx.progress` as they arrive.
    pub async fn run(&mut self, ctx: &mut AppContext) -> StreamOutcome {
        loop {
            let task = match &self.connection {
                Some(conn) => conn.task.clone(),
                None => return StreamOutcome::Closed,
            };

            self.set_state(ConnectionState::Connecting);
            let mut events = match self.transport.connect(&task).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("progress stream connect failed: {err}");
                    ctx.progress.set_connection(ConnectionIndicator::Error);
                    if self.begin_reconnect(ctx).await {
                        continue;
                    }
                    return StreamOutcome::Unavailable;
                }
            };
            self.set_state(ConnectionState::Open);
            // A successful open restores the full retry budget, whether or
            // not the backend sends its established marker.
            self.reconnect_attempts = 0;

            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(event) => event,
                    Err(err) => {
                        warn!("progress stream error: {err}");
                        break;
                    }
                };

                if event.is_connection_established() {
                    debug!("progress stream connection established");
                    ctx.progress.set_connection(ConnectionIndicator::Connected);
                    continue;
                }

                // Explicit backend-reported error: surface it and mark the
                // indicator, but leave the progress view untouched. The
                // stream itself stays up.
                if event.error.is_some() {
                    let message = event
                        .message
                        .as_deref()
                        .or(event.error.as_deref())
                        .unwrap_or("Unknown error");
                    ctx.error(&format!("Error: {message}"));
                    ctx.progress.set_connection(ConnectionIndicator::Error);
                    continue;
                }

                ctx.progress.apply(&event);
                if let Some(status) = event.status {
                    ctx.session.task_status = status;
                }

                if event.is_terminal() {
                    ctx.progress.set_connection(ConnectionIndicator::Disconnected);
                    self.close();
                    if event.status == Some(TaskStatus::Failed) {
                        let message = event
                            .message
                            .or(event.error)
                            .unwrap_or_else(|| "Unknown error".to_string());
                        ctx.session.task_status = TaskStatus::Failed;
                        ctx.error(&format!("Scraping failed: {message}"));
                        return StreamOutcome::Failed { message };
                    }
                    info!("progress stream finished for task {task}");
                    ctx.session.task_status = TaskStatus::Completed;
                    // Re-arm the final-results fetch for this completion.
                    ctx.session.result_fetch_attempted = false;
                    return StreamOutcome::Completed;
                }
            }

            if self.connection.is_none() {
                return StreamOutcome::Closed;
            }

            // Stream ended (or errored) without a terminal frame.
            ctx.progress.set_connection(ConnectionIndicator::Error);
            if !self.begin_reconnect(ctx).await {
                return StreamOutcome::Unavailable;
            }
        }
    }

    /// Account one failed connection and wait out the backoff. Returns
    /// false when the budget is exhausted; the client is then closed.
    async fn begin_reconnect(&mut self, ctx: &mut AppContext) -> bool {
        self.reconnect_attempts += 1;
        if self.reconnect_attempts > self.policy.max_attempts {
            error!(
                "progress stream gave up after {} reconnect attempts",
                self.policy.max_attempts
            );
            ctx.error("Real-time updates unavailable. You can still check results manually.");
            self.close();
            return false;
        }

        let delay = self.policy.delay_for(self.reconnect_attempts);
        warn!(
            "reconnecting progress stream (attempt {}/{}) in {delay:?}",
            self.reconnect_attempts, self.policy.max_attempts
        );
        ctx.warning("Real-time connection interrupted. Attempting to reconnect...");
        self.set_state(ConnectionState::Errored);
        tokio::time::sleep(delay).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::sse::{EventStream, TransportError};
    use async_trait::async_trait;

    struct NeverConnect;

    #[async_trait]
    impl ProgressTransport for NeverConnect {
        async fn connect(&self, _task: &TaskId) -> Result<EventStream, TransportError> {
            Err(TransportError::Connect("unreachable".to_string()))
        }
    }

    fn client() -> ProgressStreamClient {
        ProgressStreamClient::new(Box::new(NeverConnect), ReconnectPolicy::default())
    }

    #[test]
    fn test_open_resets_attempts_and_replaces_connection() {
        let mut client = client();
        client.reconnect_attempts = 3;

        client.open(TaskId::from("t1"));
        assert_eq!(client.reconnect_attempts(), 0);
        assert_eq!(client.state(), ConnectionState::Connecting);

        client.open(TaskId::from("t2"));
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = client();
        client.open(TaskId::from("t1"));

        client.close();
        assert_eq!(client.state(), ConnectionState::Closed);
        client.close();
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_run_without_open_is_closed() {
        let mut client = client();
        let mut ctx = AppContext::new(Box::new(crate::shell::context::MemoryNotifier::new()));

        assert_eq!(client.run(&mut ctx).await, StreamOutcome::Closed);
    }
}
