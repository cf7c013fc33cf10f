//! fuser callback glue for Unix platforms.
//!
//! Thin shell over [`MongoFsCore`]: decode the request, call the
//! matching `do_*` method, translate the result into a reply. Write
//! operations acknowledge success without touching anything; the
//! backing store is read-only through this surface.

use std::ffi::OsStr;
use std::time::SystemTime;

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, Request, TimeOrNow,
};
use tracing::trace;

use mongofs_core::EntryKind;

use crate::core::{FsOpError, MongoFsCore, ReadDirResult};
use crate::inode::InodeAttr;

pub(crate) struct UnixFuse(pub MongoFsCore);

fn entry_file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
    }
}

/// Flatten a listing into `(ino, offset, type, name)` rows ready for
/// the kernel: `.` and `..` first, then store entries in store order,
/// offsets numbered from 1, replayed from `offset` after a full
/// buffer.
fn assemble_dir_entries(listing: ReadDirResult, offset: i64) -> Vec<(u64, i64, FileType, String)> {
    let mut all: Vec<(u64, FileType, String)> = vec![
        (listing.ino, FileType::Directory, ".".to_string()),
        (listing.parent_ino, FileType::Directory, "..".to_string()),
    ];
    all.extend(
        listing
            .entries
            .into_iter()
            .map(|e| (e.ino, entry_file_type(e.kind), e.name)),
    );

    all.into_iter()
        .enumerate()
        .skip(offset as usize)
        .map(|(i, (ino, kind, name))| (ino, (i + 1) as i64, kind, name))
        .collect()
}

fn to_file_attr(attr: &InodeAttr) -> FileAttr {
    FileAttr {
        ino: attr.ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.ctime,
        kind: entry_file_type(attr.kind),
        perm: attr.perm,
        nlink: attr.nlink,
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: 4096,
        flags: 0,
    }
}

impl Filesystem for UnixFuse {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => {
                reply.error(FsOpError::InvalidArg.to_errno());
                return;
            }
        };
        trace!(parent, name, "lookup");

        match self.0.do_lookup(parent, name) {
            Ok(attr) => reply.entry(&InodeAttr::ttl(), &to_file_attr(&attr), 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        trace!(ino, "getattr");
        match self.0.do_getattr(ino) {
            Ok(attr) => reply.attr(&InodeAttr::ttl(), &to_file_attr(&attr)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(ino, offset, "readdir");

        let result = match self.0.do_readdir(ino) {
            Ok(r) => r,
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };

        for (entry_ino, entry_offset, kind, name) in assemble_dir_entries(result, offset) {
            if reply.add(entry_ino, entry_offset, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.0.do_open(ino) {
            Ok(()) => reply.opened(0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn opendir(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.0.do_open(ino) {
            Ok(()) => reply.opened(0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    // Content is never served; files advertise their serialized
    // footprint but read back empty.
    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(ino, offset, size, "read");
        match self.0.do_open(ino) {
            Ok(()) => reply.data(&[]),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        // chmod/chown/truncate/utimens all land here; the change is
        // acknowledged and discarded.
        match self.0.do_setattr(ino) {
            Ok(attr) => reply.attr(&InodeAttr::ttl(), &to_file_attr(&attr)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let name = match name.to_str() {
            Some(n) => n,
            None => {
                reply.error(FsOpError::InvalidArg.to_errno());
                return;
            }
        };
        match self.0.do_mkdir(parent, name) {
            Ok(attr) => reply.entry(&InodeAttr::ttl(), &to_file_attr(&attr), 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn rmdir(&mut self, _req: &Request, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.ok();
    }

    fn rename(
        &mut self,
        _req: &Request,
        _parent: u64,
        _name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn fsync(&mut self, _req: &Request, _ino: u64, _fh: u64, _datasync: bool, reply: ReplyEmpty) {
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
        reply.statfs(0, 0, 0, 0, 0, 512, 255, 0);
    }
}
