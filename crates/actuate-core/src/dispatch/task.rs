//! Spawned dispatches with first-class cancellation.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::errors::ActionError;
use super::response::ResultEnvelope;

static FALLBACK_RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Returns the current runtime handle, or the shared fallback runtime when
/// the caller is not inside one.
///
/// # Errors
///
/// Returns `InternalError` when the fallback runtime cannot be built.
pub fn runtime_handle() -> Result<Handle, ActionError> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }
    FALLBACK_RUNTIME
        .get_or_try_init(|| {
            Builder::new_multi_thread()
                .enable_all()
                .worker_threads(2)
                .thread_name("actuate-worker")
                .build()
        })
        .map(|runtime| runtime.handle().clone())
        .map_err(|error| ActionError::internal(format!("failed to start runtime: {error}")))
}

enum TaskState {
    Running(JoinHandle<ResultEnvelope>),
    Ready(Option<ResultEnvelope>),
}

/// A dispatched action that resolves to its [`ResultEnvelope`].
///
/// Calling [`ActionTask::cancel`] or dropping the task cancels the action.
/// Cancellation is cooperative: reads and listings stop waiting at once,
/// writes and deletes that have started still finish.
#[must_use = "dropping an ActionTask cancels the action"]
pub struct ActionTask {
    state: TaskState,
    cancel: CancellationToken,
}

impl ActionTask {
    pub(crate) fn spawn<F>(cancel: CancellationToken, future: F) -> Self
    where
        F: Future<Output = ResultEnvelope> + Send + 'static,
    {
        let state = match runtime_handle() {
            Ok(handle) => TaskState::Running(handle.spawn(future)),
            Err(error) => TaskState::Ready(Some(ResultEnvelope::failure(&error))),
        };
        Self { state, cancel }
    }

    /// A task that is already complete.
    pub fn ready(envelope: ResultEnvelope) -> Self {
        Self {
            state: TaskState::Ready(Some(envelope)),
            cancel: CancellationToken::new(),
        }
    }

    /// Requests cancellation of the action.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the action; cancelling it is equivalent to
    /// [`ActionTask::cancel`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl std::fmt::Debug for ActionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            TaskState::Running(_) => "running",
            TaskState::Ready(Some(_)) => "ready",
            TaskState::Ready(None) => "consumed",
        };
        f.debug_struct("ActionTask")
            .field("state", &state)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Future for ActionTask {
    type Output = ResultEnvelope;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let envelope = match &mut self.state {
            TaskState::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(envelope)) => envelope,
                Poll::Ready(Err(error)) => ResultEnvelope::failure(&ActionError::from_join(error)),
            },
            TaskState::Ready(envelope) => envelope.take().unwrap_or_else(|| {
                ResultEnvelope::failure(&ActionError::internal("action task polled after completion"))
            }),
        };
        self.state = TaskState::Ready(None);
        Poll::Ready(envelope)
    }
}

impl Drop for ActionTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
