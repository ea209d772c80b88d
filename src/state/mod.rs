//! Client state: persisted storage, the session store and its idle monitor.

pub mod idle;
pub mod session;
pub mod storage;

pub use session::{SessionSnapshot, SessionStore};
