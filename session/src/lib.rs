//! Authentication session management for the voto portal.
//!
//! - [`AuthState`]: closed set of session states with an explicit
//!   transition function, so illegal combinations cannot be represented.
//! - [`AuthSessionManager`]: drives login, registration, restore and
//!   logout against an [`ElectionApi`](voto_client::ElectionApi) and
//!   broadcasts every state change.
//! - [`SessionHandle`]: read-only snapshot view handed to other
//!   components. This is how the bearer token reaches them; nothing holds
//!   a live reference to the manager's state.
//! - [`SessionStore`]: durable storage for the token and minimal identity,
//!   with a JSON file implementation and an in-memory one.

pub mod error;
pub mod manager;
pub mod state;
pub mod store;

pub use error::SessionError;
pub use manager::{AuthSessionManager, SessionHandle};
pub use state::{AuthEvent, AuthState, Session};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
