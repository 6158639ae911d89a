//! Runs every request under a given logger.
//!
//! `axum::serve` polls each connection on its own task, so events emitted by
//! the access log, the panic responder and handlers would otherwise go to the
//! process default dispatcher.

use axum::extract::{Request, State};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::Router;

use crate::observability::Logger;

pub async fn attach_logger(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    logger.instrument(next.run(request)).await
}

/// Wrap `router` so that everything below runs with `logger` active.
///
/// Must be the outermost layer to cover panic recovery.
pub fn with_logger<S>(router: Router<S>, logger: Logger) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(logger, attach_logger))
}
