mod principal;
mod store;

pub use principal::Principal;
pub use store::{SessionId, SessionStore};
