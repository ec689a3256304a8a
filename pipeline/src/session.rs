//! Scoped automation sessions.

use futures::FutureExt;
use harvest_core::{Messenger, SessionHandle};
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::error::Result;

/// Opens a session, runs `body` with it and closes the session on every exit path:
/// success, error, or panic (the panic is re-raised after the session is released).
pub async fn with_session<F, Fut, T>(messenger: &dyn Messenger, body: F) -> Result<T>
where
    F: FnOnce(SessionHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = messenger.open_session().await?;
    let outcome = AssertUnwindSafe(body(session.clone())).catch_unwind().await;
    messenger.close_session(session).await;

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
