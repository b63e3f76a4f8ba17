//! Bounded call: run one backend invocation on its own task and stop waiting after a deadline.

use crate::backend::ImageBackend;
use crate::error::AttemptFailure;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;

/// Invoke `handle` with `prompt`, waiting at most `timeout`.
///
/// The call runs on a spawned task. On expiry the join handle is dropped,
/// which detaches the task rather than aborting it: the remote call may keep
/// running until the backend gives up, and whatever it produces is discarded.
/// Callers are expected to pass a non-zero timeout and a non-empty prompt.
pub async fn call_bounded(
    handle: Arc<dyn ImageBackend>,
    prompt: String,
    timeout: Duration,
) -> Result<Vec<u8>, AttemptFailure> {
    let task = tokio::spawn(async move { handle.invoke(&prompt).await });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(bytes))) => Ok(bytes),
        Ok(Ok(Err(err))) => Err(AttemptFailure::Backend(err)),
        Ok(Err(join_error)) => Err(AttemptFailure::Panicked(join_error_message(join_error))),
        Err(_elapsed) => Err(AttemptFailure::TimedOut { after: timeout }),
    }
}

pub(crate) fn join_error_message(error: JoinError) -> String {
    if error.is_panic() {
        panic_message(error.into_panic())
    } else {
        error.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
