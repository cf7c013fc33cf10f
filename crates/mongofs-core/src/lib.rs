//! Core logic for mongofs: mapping filesystem paths onto a MongoDB
//! database and synthesizing filesystem metadata from live queries.
//!
//! The crate is split at the seams the design calls out:
//! - [`locator`] — the pure path resolver, no I/O;
//! - [`store`] — the document-store session interface and its
//!   implementations;
//! - [`presenter`] — attribute and directory-listing synthesis on top
//!   of a resolved locator and a store.

pub mod locator;
pub mod presenter;
pub mod store;

pub use locator::{Grammar, PathLocator, ResolveError};
pub use presenter::{ChildEntry, EntryAttr, EntryKind, PresentError, Presenter};
pub use store::{DocumentStore, MemoryStore, MongoStore, StoreError};
