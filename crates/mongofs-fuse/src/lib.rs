//! FUSE driver for mongofs.
//!
//! The module split follows the driver/engine seam: [`core`] holds the
//! platform-neutral dispatch logic over the resolver and presenter,
//! `unix_fuse` adapts it to the `fuser` callback protocol, [`inode`]
//! carries the path↔inode bookkeeping that protocol requires, and
//! [`async_bridge`] lets synchronous FUSE callbacks drive async store
//! queries.

pub mod async_bridge;
pub mod core;
pub mod inode;
#[cfg(unix)]
pub(crate) mod unix_fuse;

pub use crate::async_bridge::{block_on, init_runtime};
pub use crate::core::{DirEntry, FsOpError, MongoFsCore, ReadDirResult};
pub use crate::inode::{InodeAttr, InodeTable, ROOT_INO};

/// The mountable FUSE filesystem type.
pub type MongoFuse = crate::core::MongoFsCore;
