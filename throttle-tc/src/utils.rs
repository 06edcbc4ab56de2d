use std::{fmt::Display, future::Future};

/// Awaits a step whose failure is an expected outcome, e.g. creating an object that may already
/// exist or deleting one that may already be gone. The error is logged and discarded.
///
/// Returns whether the step succeeded. Never use this for steps that must fail loudly.
pub(crate) async fn best_effort<T, E, F>(step: &str, fut: F) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(_) => true,
        Err(error) => {
            tracing::debug!(step, %error, "ignoring failed best-effort step");
            false
        }
    }
}
