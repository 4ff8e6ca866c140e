pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod resolution;
pub mod session;

pub use descriptor::{ElementDescriptor, Strategy};
pub use resolution::{ResolutionError, Resolver};
pub use session::{ElementHandle, RemoteSession, SessionError};
