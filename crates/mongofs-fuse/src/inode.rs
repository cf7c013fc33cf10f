//! Inode bookkeeping for the FUSE protocol.
//!
//! The kernel addresses entries by inode number, so the driver keeps a
//! bidirectional path↔inode mapping. This is pure protocol plumbing:
//! no attributes or query results are cached here, and every attribute
//! answer is synthesized fresh from the store by the core.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use mongofs_core::{EntryAttr, EntryKind};

/// Reserved inode for the root directory.
pub const ROOT_INO: u64 = 1;

/// FUSE-facing attributes for one answer.
///
/// Timestamps are always "now" at synthesis time; the store keeps no
/// per-document times, and reporting the current time on every lookup
/// is an accepted inexactness of the design.
#[derive(Debug, Clone)]
pub struct InodeAttr {
    pub ino: u64,
    pub size: u64,
    /// 512-byte blocks.
    pub blocks: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub kind: EntryKind,
    pub perm: u16,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
}

impl InodeAttr {
    /// Stamp a presenter answer with an inode number and the current
    /// time.
    pub fn synthesize(ino: u64, entry: &EntryAttr) -> Self {
        let now = SystemTime::now();
        InodeAttr {
            ino,
            size: entry.size,
            blocks: entry.size.div_ceil(512),
            atime: now,
            mtime: now,
            ctime: now,
            kind: entry.kind,
            perm: entry.perm,
            nlink: entry.nlink,
            uid: process_uid(),
            gid: process_gid(),
        }
    }

    /// Kernel cache TTL for attributes and entries.
    ///
    /// Zero: attributes are synthesized per call from live queries, so
    /// the kernel must come back every time.
    pub fn ttl() -> Duration {
        Duration::ZERO
    }
}

#[cfg(unix)]
fn process_uid() -> u32 {
    unsafe { libc::getuid() }
}

#[cfg(unix)]
fn process_gid() -> u32 {
    unsafe { libc::getgid() }
}

#[cfg(not(unix))]
fn process_uid() -> u32 {
    0
}

#[cfg(not(unix))]
fn process_gid() -> u32 {
    0
}

/// Bidirectional path↔inode table.
pub struct InodeTable {
    path_to_ino: RwLock<HashMap<String, u64>>,
    ino_to_path: RwLock<HashMap<u64, String>>,
    next_ino: RwLock<u64>,
}

impl InodeTable {
    /// Create a table with the root directory registered.
    pub fn new() -> Self {
        let table = InodeTable {
            path_to_ino: RwLock::new(HashMap::new()),
            ino_to_path: RwLock::new(HashMap::new()),
            next_ino: RwLock::new(ROOT_INO + 1),
        };

        table.path_to_ino.write().insert("/".to_string(), ROOT_INO);
        table.ino_to_path.write().insert(ROOT_INO, "/".to_string());

        table
    }

    /// Get or allocate the inode for a path.
    pub fn get_or_create(&self, path: &str) -> u64 {
        let normalized = Self::normalize_path(path);

        if let Some(&ino) = self.path_to_ino.read().get(&normalized) {
            return ino;
        }

        let ino = {
            let mut next = self.next_ino.write();
            let ino = *next;
            *next += 1;
            ino
        };

        self.path_to_ino.write().insert(normalized.clone(), ino);
        self.ino_to_path.write().insert(ino, normalized);

        ino
    }

    /// Inode for a path, if one has been handed out.
    pub fn get_ino(&self, path: &str) -> Option<u64> {
        let normalized = Self::normalize_path(path);
        self.path_to_ino.read().get(&normalized).copied()
    }

    /// Path for an inode, if known.
    pub fn get_path(&self, ino: u64) -> Option<String> {
        self.ino_to_path.read().get(&ino).cloned()
    }

    /// Normalize a path for consistent lookup.
    fn normalize_path(path: &str) -> String {
        let mut normalized = path.to_string();

        if !normalized.starts_with('/') {
            normalized = format!("/{}", normalized);
        }

        while normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }

        normalized
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
