//! Client side of the election service contract.
//!
//! - [`ElectionApi`]: the operations the portal core needs from the
//!   remote election service. Authenticated calls take the session token
//!   as an explicit argument; nothing here holds session state.
//! - [`HttpElectionApi`]: the REST/JSON implementation over `reqwest`.
//! - [`ApiEnvelope`]: the uniform `{success, data, error, message}` wrapper.

pub mod api;
pub mod envelope;
pub mod error;
pub mod http;

pub use api::ElectionApi;
pub use envelope::ApiEnvelope;
pub use error::ApiError;
pub use http::{HttpElectionApi, HttpTimeouts};
