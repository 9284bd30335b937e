//! Domain models shared across the entire journal service.

pub mod account;
pub mod session;
pub mod trade;
pub mod user;

pub use account::Account;
pub use session::SessionCatalog;
pub use trade::{NewTrade, Outcome, Trade};
pub use user::{Capability, Role, User};
