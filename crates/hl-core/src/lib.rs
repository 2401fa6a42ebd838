pub mod actions;
pub mod arbitrations;
pub mod assistants;
pub mod coins;
pub mod config;
pub mod conversations;
pub mod error;
pub mod events;
pub mod helpline;
pub mod invitations;
pub mod moderators;
pub mod notify;
pub mod penalty;
pub mod requests;
pub mod routing;
pub mod sessions;
pub mod store;
pub mod validation;

pub mod types;

pub use crate::config::HelplineConfig;
pub use crate::error::HelplineError;
pub use crate::helpline::{Helpline, RequestContext};
pub use crate::store::Store;
