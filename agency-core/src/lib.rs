//! Core domain logic: run identity, the on-disk record store, the
//! reference resolver, and the shared error taxonomy. Everything here is
//! pure or talks to the filesystem/git directly; no tmux, no CLI parsing,
//! no process spawning of agent runners — those live in `agency-tmux` and
//! `agency-cli`.

pub mod error;
pub mod id;
pub mod identity;
pub mod model;
pub mod resolver;
pub mod session_name;
pub mod store;

pub use error::AgencyError;
pub use model::{Event, RunMeta, RunRecord};
pub use resolver::{resolve, ResolutionContext, ResolvedRun};
