//! Platform-neutral FUSE core logic.
//!
//! Every callback runs the same pipeline: inode → path → locator →
//! presenter query. Nothing is remembered between callbacks except the
//! inode numbers the kernel protocol requires; existence is checked
//! fresh against the store each time.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use mongofs_config::MongoFsConfig;
use mongofs_core::{
    DocumentStore, EntryAttr, EntryKind, Grammar, MongoStore, PathLocator, PresentError,
    Presenter, ResolveError, StoreError,
};

use crate::async_bridge::{block_on, init_runtime};
use crate::inode::{InodeAttr, InodeTable, ROOT_INO};

/// Errors returned by filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum FsOpError {
    /// No such entry. Also covers malformed identifiers and paths
    /// deeper than the grammar: the filesystem API has no richer
    /// answer for an invalid name.
    #[error("not found")]
    NotFound,

    /// Invalid argument (e.g. bad filename encoding).
    #[error("invalid argument")]
    InvalidArg,

    /// The store could not be reached or a query failed. Mapped to an
    /// I/O errno so connectivity failures are not mistaken for
    /// missing files.
    #[error("store error: {0}")]
    Store(String),
}

#[cfg(unix)]
impl FsOpError {
    pub fn to_errno(&self) -> i32 {
        match self {
            FsOpError::NotFound => libc::ENOENT,
            FsOpError::InvalidArg => libc::EINVAL,
            FsOpError::Store(_) => libc::EIO,
        }
    }
}

impl From<PresentError> for FsOpError {
    fn from(e: PresentError) -> Self {
        match e {
            PresentError::NotFound => FsOpError::NotFound,
            PresentError::Store(store_err) => FsOpError::Store(store_err.to_string()),
        }
    }
}

/// Core FUSE filesystem logic, platform-independent.
pub struct MongoFsCore {
    presenter: Presenter,
    inodes: Arc<InodeTable>,
}

impl MongoFsCore {
    /// Connect to the configured deployment and build the core.
    pub fn from_config(config: &MongoFsConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate_or_err()?;
        init_runtime()?;

        let store = block_on(async { MongoStore::connect(config).await })??;
        let grammar = Grammar::with_field_access(config.field_access);

        Ok(Self::with_store(Arc::new(store), grammar))
    }

    /// Build the core over an already-constructed store session.
    pub fn with_store(store: Arc<dyn DocumentStore>, grammar: Grammar) -> Self {
        MongoFsCore {
            presenter: Presenter::new(store, grammar),
            inodes: Arc::new(InodeTable::new()),
        }
    }

    /// Get the path for an inode.
    pub fn get_path(&self, ino: u64) -> Option<String> {
        self.inodes.get_path(ino)
    }

    /// Resolve a child path from parent + name.
    pub fn child_path(parent_path: &str, name: &str) -> String {
        if parent_path == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_path, name)
        }
    }

    fn resolve(&self, path: &str) -> Result<PathLocator, FsOpError> {
        self.presenter.grammar().resolve(path).map_err(|e| {
            match &e {
                ResolveError::MalformedId(id) => debug!(id, "identifier failed to parse"),
                ResolveError::DepthExceeded(path) => debug!(path, "path beyond grammar depth"),
            }
            FsOpError::NotFound
        })
    }

    fn attributes(&self, path: &str, ino: u64) -> Result<InodeAttr, FsOpError> {
        let locator = self.resolve(path)?;
        let attr: Result<EntryAttr, PresentError> =
            block_on(async { self.presenter.attributes_of(&locator).await })?;
        Ok(InodeAttr::synthesize(ino, &attr?))
    }

    /// Perform a lookup operation.
    pub fn do_lookup(&self, parent: u64, name: &str) -> Result<InodeAttr, FsOpError> {
        let parent_path = self.get_path(parent).ok_or(FsOpError::NotFound)?;
        let child_path = Self::child_path(&parent_path, name);
        let ino = self.inodes.get_or_create(&child_path);
        self.attributes(&child_path, ino)
    }

    /// Perform a getattr operation.
    pub fn do_getattr(&self, ino: u64) -> Result<InodeAttr, FsOpError> {
        let path = self.get_path(ino).ok_or(FsOpError::NotFound)?;
        self.attributes(&path, ino)
    }

    /// List a directory, without the `.`/`..` markers.
    pub fn do_readdir(&self, ino: u64) -> Result<ReadDirResult, FsOpError> {
        let path = self.get_path(ino).ok_or(FsOpError::NotFound)?;
        let locator = self.resolve(&path)?;

        let children = block_on(async { self.presenter.list_children(&locator).await })??;

        let parent_path = if path == "/" {
            "/".to_string()
        } else {
            path.rsplit_once('/')
                .map(|(p, _)| if p.is_empty() { "/" } else { p })
                .unwrap_or("/")
                .to_string()
        };
        let parent_ino = self.inodes.get_ino(&parent_path).unwrap_or(ROOT_INO);

        let entries = children
            .into_iter()
            .map(|child| {
                let child_path = Self::child_path(&path, &child.name);
                DirEntry {
                    ino: self.inodes.get_or_create(&child_path),
                    name: child.name,
                    kind: child.kind,
                }
            })
            .collect();

        Ok(ReadDirResult {
            ino,
            parent_ino,
            entries,
        })
    }

    /// Open a file or directory: succeeds for any inode the kernel has
    /// seen. The store is not consulted; reads are not implemented.
    pub fn do_open(&self, ino: u64) -> Result<(), FsOpError> {
        if self.get_path(ino).is_some() {
            Ok(())
        } else {
            Err(FsOpError::NotFound)
        }
    }

    /// mkdir stub: reports success and hands the kernel directory
    /// attributes, but the store is never touched.
    pub fn do_mkdir(&self, parent: u64, name: &str) -> Result<InodeAttr, FsOpError> {
        let parent_path = self.get_path(parent).ok_or(FsOpError::NotFound)?;
        let child_path = Self::child_path(&parent_path, name);
        let ino = self.inodes.get_or_create(&child_path);
        Ok(InodeAttr::synthesize(ino, &EntryAttr::directory()))
    }

    /// setattr stub (truncate, utime): reports the entry's current
    /// attributes unchanged.
    pub fn do_setattr(&self, ino: u64) -> Result<InodeAttr, FsOpError> {
        self.do_getattr(ino)
    }

    /// Mount the filesystem (blocks until unmounted).
    #[cfg(unix)]
    pub fn mount(self, mountpoint: &Path) -> Result<(), Box<dyn std::error::Error>> {
        use crate::unix_fuse::UnixFuse;

        info!("Mounting mongofs at {:?}", mountpoint);
        fuser::mount2(UnixFuse(self), mountpoint, &mount_options())?;
        info!("mongofs unmounted");

        Ok(())
    }

    /// Mount the filesystem in the foreground.
    #[cfg(unix)]
    pub fn mount_foreground(self, mountpoint: &Path) -> Result<(), Box<dyn std::error::Error>> {
        use crate::unix_fuse::UnixFuse;

        info!("Mounting mongofs at {:?} (foreground)", mountpoint);
        fuser::mount2(UnixFuse(self), mountpoint, &mount_options())?;

        Ok(())
    }
}

/// Options for both mount paths.
///
/// Deliberately no `ro`: the kernel would bounce mkdir/rename/truncate
/// with `EROFS` before the acknowledge-and-discard stubs ever ran. The
/// read-only contract is enforced by the driver itself.
#[cfg(unix)]
fn mount_options() -> Vec<fuser::MountOption> {
    use fuser::MountOption;

    vec![
        MountOption::FSName("mongofs".to_string()),
        MountOption::AutoUnmount,
        MountOption::DefaultPermissions,
    ]
}

/// Result from a readdir operation.
pub struct ReadDirResult {
    /// Inode of the directory being listed.
    pub ino: u64,
    /// Inode of the parent directory.
    pub parent_ino: u64,
    /// Entries in store order, `.`/`..` excluded.
    pub entries: Vec<DirEntry>,
}

/// A single directory entry.
pub struct DirEntry {
    pub ino: u64,
    pub name: String,
    pub kind: EntryKind,
}

// Keeps StoreError in the public error path so callers can observe
// unavailability distinctly if they hold the concrete type.
impl From<StoreError> for FsOpError {
    fn from(e: StoreError) -> Self {
        FsOpError::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use mongofs_core::MemoryStore;

    const OID: &str = "507f1f77bcf86cd799439011";

    fn core_with(store: Arc<MemoryStore>, field_access: bool) -> MongoFsCore {
        init_runtime().unwrap();
        MongoFsCore::with_store(store, Grammar::with_field_access(field_access))
    }

    fn oid() -> bson::oid::ObjectId {
        bson::oid::ObjectId::parse_str(OID).unwrap()
    }

    #[test]
    fn test_getattr_root() {
        let store = Arc::new(MemoryStore::new());
        let core = core_with(store, false);

        let attr = core.do_getattr(ROOT_INO).unwrap();
        assert_eq!(attr.kind, EntryKind::Directory);
        assert_eq!(attr.ino, ROOT_INO);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn test_lookup_collection_always_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let core = core_with(store, false);

        let attr = core.do_lookup(ROOT_INO, "anything").unwrap();
        assert_eq!(attr.kind, EntryKind::Directory);
    }

    #[test]
    fn test_lookup_document() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "name": "ada" });
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let attr = core.do_lookup(coll.ino, OID).unwrap();
        assert_eq!(attr.kind, EntryKind::File);
        assert!(attr.size > 0);
    }

    #[test]
    fn test_lookup_missing_document_is_enoent() {
        let store = Arc::new(MemoryStore::new());
        store.create_collection("users");
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let err = core
            .do_lookup(coll.ino, "ffffffffffffffffffffffff")
            .unwrap_err();
        assert!(matches!(err, FsOpError::NotFound));
    }

    #[test]
    fn test_lookup_malformed_id_is_enoent_not_a_crash() {
        let store = Arc::new(MemoryStore::new());
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let err = core.do_lookup(coll.ino, "not-a-valid-id").unwrap_err();
        assert!(matches!(err, FsOpError::NotFound));
    }

    #[test]
    fn test_readdir_root_lists_collections() {
        let store = Arc::new(MemoryStore::new());
        store.create_collection("users");
        store.create_collection("orders");
        let core = core_with(store, false);

        let result = core.do_readdir(ROOT_INO).unwrap();
        let names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders"]);
        assert_eq!(result.parent_ino, ROOT_INO);
    }

    #[test]
    fn test_readdir_empty_collection() {
        let store = Arc::new(MemoryStore::new());
        store.create_collection("empty");
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "empty").unwrap();
        let result = core.do_readdir(coll.ino).unwrap();
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_readdir_collection_lists_hex_ids() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "name": "ada" });
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let result = core.do_readdir(coll.ino).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, OID);
    }

    #[test]
    fn test_readdir_document_fields_with_field_access() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "name": "ada", "age": 36 });
        let core = core_with(store, true);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let doc_attr = core.do_lookup(coll.ino, OID).unwrap();
        assert_eq!(doc_attr.kind, EntryKind::Directory);

        let result = core.do_readdir(doc_attr.ino).unwrap();
        let names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"age"));
    }

    #[test]
    fn test_field_lookup_with_field_access() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "profile": { "bio": "hi" } });
        let core = core_with(store, true);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let doc_attr = core.do_lookup(coll.ino, OID).unwrap();
        let profile = core.do_lookup(doc_attr.ino, "profile").unwrap();
        let bio = core.do_lookup(profile.ino, "bio");

        assert_eq!(profile.kind, EntryKind::File);
        // "profile" projects as a document value; "profile/bio" walks
        // one level deeper through the dotted path.
        assert!(bio.is_ok());
    }

    #[test]
    fn test_deep_path_rejected_without_field_access() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "a": 1 });
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let doc_attr = core.do_lookup(coll.ino, OID).unwrap();
        let err = core.do_lookup(doc_attr.ino, "a").unwrap_err();
        assert!(matches!(err, FsOpError::NotFound));
    }

    #[test]
    fn test_getattr_unknown_inode() {
        let store = Arc::new(MemoryStore::new());
        let core = core_with(store, false);
        assert!(matches!(
            core.do_getattr(424242).unwrap_err(),
            FsOpError::NotFound
        ));
    }

    #[test]
    fn test_store_outage_surfaces_as_store_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "k": 1 });
        let core = core_with(store.clone(), false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        store.set_unavailable(true);
        let err = core.do_lookup(coll.ino, OID).unwrap_err();
        assert!(matches!(err, FsOpError::Store(_)));
    }

    #[test]
    fn test_mutator_stubs_change_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.create_collection("users");
        let core = core_with(store, false);

        let before = core.do_readdir(ROOT_INO).unwrap();

        // mkdir reports success but the store must be untouched.
        let made = core.do_mkdir(ROOT_INO, "fake").unwrap();
        assert_eq!(made.kind, EntryKind::Directory);

        let after = core.do_readdir(ROOT_INO).unwrap();
        let names = |r: &ReadDirResult| {
            r.entries
                .iter()
                .map(|e| e.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&before), names(&after));
    }

    #[test]
    fn test_setattr_stub_returns_current_attrs() {
        let store = Arc::new(MemoryStore::new());
        store.insert_with_id("users", oid(), doc! { "k": 1 });
        let core = core_with(store, false);

        let coll = core.do_lookup(ROOT_INO, "users").unwrap();
        let doc_attr = core.do_lookup(coll.ino, OID).unwrap();

        let after = core.do_setattr(doc_attr.ino).unwrap();
        assert_eq!(after.size, doc_attr.size);
        assert_eq!(after.kind, doc_attr.kind);
    }

    #[test]
    fn test_open_known_and_unknown_inodes() {
        let store = Arc::new(MemoryStore::new());
        let core = core_with(store, false);

        assert!(core.do_open(ROOT_INO).is_ok());
        assert!(core.do_open(999_999).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_mount_options_stay_writable() {
        use fuser::MountOption;

        // Mounting read-only at the kernel level would short-circuit
        // the mutator stubs with EROFS before they ran.
        let options = mount_options();
        assert!(!options.contains(&MountOption::RO));
        assert!(options.contains(&MountOption::AutoUnmount));
        assert!(options
            .iter()
            .any(|o| matches!(o, MountOption::FSName(name) if name == "mongofs")));
    }

    #[test]
    fn test_child_path() {
        assert_eq!(MongoFsCore::child_path("/", "users"), "/users");
        assert_eq!(MongoFsCore::child_path("/users", "abc"), "/users/abc");
    }
}
