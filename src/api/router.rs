//! Cross-context message router
//!
//! Every context runs as an actor behind an mpsc mailbox. The router validates a
//! request, routes it to the context that owns its action, and hands the caller a
//! oneshot that resolves with exactly one `ActionResponse`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{
    ActionKind, ActionRequest, ActionResponse, ContextKind, TextPayload, TransformPayload, WrapPayload,
};

/// Mailbox depth per context
pub const MAILBOX_CAPACITY: usize = 32;

/// What to do with a request whose action is not in the closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownActionPolicy {
    /// Answer with `{error: "Unknown action: <name>"}`
    #[default]
    Reject,
    /// Drop it without answering; the caller has to time out
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    Dispatched,
    Resolved,
    Rejected,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Resolved | RequestState::Rejected)
    }
}

/// A request in flight to a context, with its correlation id and reply slot
pub struct RoutedMessage {
    pub id: Uuid,
    pub kind: ActionKind,
    pub request: ActionRequest,
    pub reply: oneshot::Sender<ActionResponse>,
}

/// Handler side of a context actor
#[async_trait]
pub trait ContextHandler: Send + Sync + 'static {
    fn context(&self) -> ContextKind;

    async fn handle(&self, kind: ActionKind, request: ActionRequest) -> AppResult<Value>;
}

/// Run `handler` as an actor draining `mailbox`.
///
/// Each request runs on its own task, so a slow handler never blocks the mailbox.
/// Handler errors and panics both come back as `{error}`.
pub fn spawn_context<H: ContextHandler>(
    handler: Arc<H>,
    mut mailbox: mpsc::Receiver<RoutedMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let context = handler.context();
        tracing::debug!("[Router] {} context started", context);

        while let Some(message) = mailbox.recv().await {
            let handler = handler.clone();
            tokio::spawn(async move {
                let RoutedMessage { id, kind, request, reply } = message;
                let task = tokio::spawn(async move { handler.handle(kind, request).await });

                let response = match task.await {
                    Ok(result) => ActionResponse::from(result),
                    Err(join_error) => {
                        let reason = panic_message(join_error);
                        tracing::error!("[Router] {} handler for {} crashed: {}", context, kind, reason);
                        ActionResponse::Error(format!("Handler failed: {}", reason))
                    }
                };

                if reply.send(response).is_err() {
                    tracing::debug!("[Router] Caller for {} ({}) went away", kind, id);
                }
            });
        }

        tracing::debug!("[Router] {} context stopped", context);
    })
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "task cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string()),
        Err(_) => "unknown failure".to_string(),
    }
}

/// Check the action-specific payload shape before anything is dispatched
pub fn validate_payload(kind: ActionKind, request: &ActionRequest) -> AppResult<()> {
    match kind {
        ActionKind::WrapContent => request.payload_as::<WrapPayload>()?.validate(),
        ActionKind::TransformContent => request.payload_as::<TransformPayload>()?.validate(),
        ActionKind::CopyToClipboard | ActionKind::InsertText => {
            request.payload_as::<TextPayload>().map(|_| ())
        }
        ActionKind::CheckService | ActionKind::GetSelection | ActionKind::GetClipboard => Ok(()),
    }
}

#[derive(Clone)]
pub struct MessageRouter {
    routes: HashMap<ContextKind, mpsc::Sender<RoutedMessage>>,
    policy: UnknownActionPolicy,
    in_flight: Arc<Mutex<HashMap<Uuid, RequestState>>>,
}

impl MessageRouter {
    pub fn new(policy: UnknownActionPolicy) -> Self {
        Self {
            routes: HashMap::new(),
            policy,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register the mailbox of a context; returns the receiving end for `spawn_context`
    pub fn open_mailbox(&mut self, context: ContextKind) -> mpsc::Receiver<RoutedMessage> {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.routes.insert(context, tx);
        rx
    }

    /// Requests created or dispatched but not yet answered
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn transition(&self, id: Uuid, state: RequestState) {
        tracing::trace!("[Router] {} -> {:?}", id, state);
        if let Ok(mut map) = self.in_flight.lock() {
            if state.is_terminal() {
                map.remove(&id);
            } else {
                map.insert(id, state);
            }
        }
    }

    /// Route a request and wait for its single response.
    ///
    /// `Err` means the response could not be delivered at all (context not running,
    /// reply dropped); handler failures come back as `Ok(ActionResponse::Error)`.
    /// Under `UnknownActionPolicy::Ignore` an unknown action never resolves; use
    /// `send_timeout` in that mode.
    pub async fn send(&self, request: ActionRequest) -> AppResult<ActionResponse> {
        let id = Uuid::new_v4();
        self.transition(id, RequestState::Created);

        let kind = match request.kind() {
            Ok(kind) => kind,
            Err(err) => match self.policy {
                UnknownActionPolicy::Reject => {
                    tracing::warn!("[Router] Rejecting unknown action {:?}", request.action);
                    self.transition(id, RequestState::Rejected);
                    return Ok(ActionResponse::Error(err.to_string()));
                }
                UnknownActionPolicy::Ignore => {
                    tracing::debug!("[Router] Ignoring unknown action {:?}", request.action);
                    self.transition(id, RequestState::Rejected);
                    return std::future::pending().await;
                }
            },
        };

        if let Err(err) = validate_payload(kind, &request) {
            tracing::warn!("[Router] Invalid payload for {}: {}", kind, err);
            self.transition(id, RequestState::Rejected);
            return Ok(ActionResponse::Error(err.to_string()));
        }

        let target = kind.target();
        let Some(mailbox) = self.routes.get(&target) else {
            self.transition(id, RequestState::Rejected);
            return Err(AppError::Context(format!("No {} context registered", target)));
        };

        let (reply, response) = oneshot::channel();
        let message = RoutedMessage { id, kind, request, reply };
        if mailbox.send(message).await.is_err() {
            self.transition(id, RequestState::Rejected);
            return Err(AppError::Context(format!("{} context is not running", target)));
        }
        self.transition(id, RequestState::Dispatched);
        tracing::debug!("[Router] {} dispatched to {} ({})", kind, target, id);

        // Clears the in-flight entry even if the caller stops polling
        let _guard = InFlightGuard { router: self, id };
        let outcome = response.await;

        match outcome {
            Ok(response) => {
                let state = if response.is_error() {
                    RequestState::Rejected
                } else {
                    RequestState::Resolved
                };
                self.transition(id, state);
                Ok(response)
            }
            Err(_) => {
                self.transition(id, RequestState::Rejected);
                Err(AppError::Context(format!("No response from {} context", target)))
            }
        }
    }

    /// `send` bounded by `timeout`
    pub async fn send_timeout(&self, request: ActionRequest, timeout: Duration) -> AppResult<ActionResponse> {
        let action = request.action.clone();
        tokio::time::timeout(timeout, self.send(request))
            .await
            .map_err(|_| AppError::Context(format!("No response to {} within {:?}", action, timeout)))?
    }

    /// `send`, flattening the response into a result
    pub async fn request(&self, request: ActionRequest) -> AppResult<Value> {
        self.send(request).await?.into_result()
    }
}

struct InFlightGuard<'a> {
    router: &'a MessageRouter,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut map) = self.router.in_flight.lock() {
            map.remove(&self.id);
        }
    }
}
