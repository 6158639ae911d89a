//! Error taxonomy shared by every boundary of a service.
//!
//! # Data Flow
//! ```text
//! handler / adapter failure
//!     → ServiceError (code + message + reason + details)
//!     → http::response (status + JSON body)    or    Code::rpc_code (RPC status)
//!
//! untyped error (std::error::Error, panic, axum rejection)
//!     → ServiceError::from_untyped / error handler middleware
//!     → Code::Internal (original message kept as a detail)
//! ```
//!
//! # Design Decisions
//! - One closed set of codes; the numeric value doubles as the HTTP status
//! - Reasons are open strings with a few well-known constants
//! - Details are free-form but carry locale-keyed messages for end users

pub mod code;
pub mod details;
pub mod error;
pub mod reason;

pub use code::{Code, RpcCode};
pub use details::Details;
pub use details::DEFAULT_LOCALE;
pub use error::{panic_message, ErrorBody, ServiceError};
pub use reason::Reason;
