// Session orchestrator: explicit per-user state plus the event handlers that change it.

pub mod chat;
pub mod events;
pub mod handlers;
pub mod store;

pub use store::SessionStore;
