//! Role-based access gate
//!
//! Handles:
//! - Session token verification
//! - Identity resolution across the users and monks stores
//! - Capability checks and authentication extractors

mod identity;
mod middleware;
pub mod session;

pub use identity::{Capability, Identity, Role};
pub use middleware::{AdminIdentity, CurrentIdentity, MaybeIdentity, MonkIdentity, require_auth};
pub use session::{Session, create_session_token, verify_session_token};
