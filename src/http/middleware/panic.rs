//! Panic recovery: a panicking handler yields a 500 JSON error instead of a dropped connection.

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use std::any::Any;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::errors::{panic_message, Details, Reason, ServiceError, DEFAULT_LOCALE};
use crate::http::HttpConfig;

const INTERNAL_MESSAGE: &str = "internal server error";

/// Renders a caught panic as an `Internal` service error.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    expose_message: bool,
}

impl PanicResponder {
    /// Outside production the panic message is added as a `panic` detail field.
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            expose_message: !config.is_production(),
        }
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = panic_message(&*err);
        tracing::error!(panic = %message, "PANIC");

        let mut details = Details::new().with_locale_message(DEFAULT_LOCALE, INTERNAL_MESSAGE);
        if self.expose_message {
            details = details.with_field("panic", message);
        }

        ServiceError::internal(INTERNAL_MESSAGE)
            .with_reason(Reason::INTERNAL)
            .with_details(details)
            .into_response()
    }
}

pub fn layer(config: &HttpConfig) -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder::new(config))
}
