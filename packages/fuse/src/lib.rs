//! # jsonfs-fuse
//!
//! Mounts a [`DocumentStore`] through FUSE.
//!
//! The kernel speaks in inodes; the document speaks in paths. [`JsonFs`]
//! keeps an [`InodeTable`] between the two, turns every callback into one
//! store operation, and maps store errors to errno values. Attribute and
//! entry TTLs are zero, so the kernel asks again on every access and always
//! sees the document as it is now.
//!
//! ```no_run
//! use jsonfs_fuse::{mount, JsonFs, MountOptions};
//! use jsonfs_json_store::DocumentStore;
//!
//! let store = DocumentStore::open("data.json").unwrap();
//! mount(JsonFs::new(store), "/mnt/data", &MountOptions::default()).unwrap();
//! ```

use std::ffi::OsStr;
use std::time::{Duration, SystemTime};
use std::{io, path};

use fuser::{
    FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr,
    Request, TimeOrNow,
};
use jsonfs_json_store::{DocumentStore, Error, FileKind, NodeStat, Path};
use libc::c_int;

mod inode;

pub use inode::{InodeTable, ROOT_INO};

const TTL: Duration = Duration::ZERO;

/// Map a store error to the errno reported to the kernel.
pub fn errno(error: &Error) -> c_int {
    match error {
        Error::NotFound { .. } => libc::ENOENT,
        Error::InvalidArgument { .. } => libc::EINVAL,
        Error::PermissionDenied { .. } => libc::EACCES,
        Error::NotSupported { .. } => libc::ENOTSUP,
        Error::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        Error::Json(_) => libc::EIO,
    }
}

fn reject(operation: &str, error: Error) -> c_int {
    log::debug!("{} rejected: {}", operation, error);
    errno(&error)
}

fn unsupported(operation: &'static str) -> c_int {
    reject(operation, Error::NotSupported { operation })
}

fn file_type(kind: FileKind) -> FileType {
    match kind {
        FileKind::Directory => FileType::Directory,
        FileKind::RegularFile => FileType::RegularFile,
    }
}

fn file_attr(ino: u64, stat: &NodeStat) -> FileAttr {
    FileAttr {
        ino,
        size: stat.size,
        blocks: stat.blocks(),
        atime: stat.atime,
        mtime: stat.mtime,
        ctime: stat.ctime,
        crtime: stat.ctime,
        kind: file_type(stat.kind),
        perm: stat.perm,
        nlink: stat.nlink,
        uid: stat.uid,
        gid: stat.gid,
        rdev: 0,
        blksize: stat.blksize,
        flags: 0,
    }
}

fn system_time(time: TimeOrNow) -> SystemTime {
    match time {
        TimeOrNow::SpecificTime(time) => time,
        TimeOrNow::Now => SystemTime::now(),
    }
}

/// What to send back for a `getxattr`/`listxattr` request of `size` bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum XattrReply<'a> {
    /// The caller is probing for the value length.
    Size(u32),
    Data(&'a [u8]),
}

pub fn xattr_reply(size: u32, value: &[u8]) -> Result<XattrReply<'_>, c_int> {
    let len = u32::try_from(value.len()).map_err(|_| libc::E2BIG)?;
    if size == 0 {
        Ok(XattrReply::Size(len))
    } else if size < len {
        Err(libc::ERANGE)
    } else {
        Ok(XattrReply::Data(value))
    }
}

fn send_xattr(reply: ReplyXattr, size: u32, value: &[u8]) {
    match xattr_reply(size, value) {
        Ok(XattrReply::Size(len)) => reply.size(len),
        Ok(XattrReply::Data(data)) => reply.data(data),
        Err(e) => reply.error(e),
    }
}

/// A mounted JSON document.
pub struct JsonFs {
    store: DocumentStore,
    inodes: InodeTable,
}

impl JsonFs {
    pub fn new(store: DocumentStore) -> Self {
        JsonFs {
            store,
            inodes: InodeTable::new(),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn path(&self, ino: u64) -> Result<Path, c_int> {
        self.inodes.path_of(ino).cloned().ok_or(libc::ENOENT)
    }

    fn child(&self, parent: u64, name: &OsStr) -> Result<Path, c_int> {
        // JSON keys are always valid UTF-8.
        let name = name.to_str().ok_or(libc::EINVAL)?;
        Ok(self.path(parent)?.child(name))
    }

    fn attr(&mut self, operation: &str, path: &Path) -> Result<FileAttr, c_int> {
        let stat = self
            .store
            .getattr(path)
            .map_err(|e| reject(operation, e))?;
        Ok(file_attr(self.inodes.ino_for(path), &stat))
    }

    pub fn lookup_child(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr, c_int> {
        let path = self.child(parent, name)?;
        log::debug!("lookup {}", path);
        self.attr("lookup", &path)
    }

    pub fn stat(&mut self, ino: u64) -> Result<FileAttr, c_int> {
        let path = self.path(ino)?;
        log::debug!("getattr {}", path);
        self.attr("getattr", &path)
    }

    /// Apply a `setattr` request and return the resulting attributes.
    ///
    /// Ownership and permission changes are refused; a size truncates, and
    /// timestamps go to the backing file.
    pub fn set_attr(
        &mut self,
        ino: u64,
        mode: Option<u32>,
        owner: (Option<u32>, Option<u32>),
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
    ) -> Result<FileAttr, c_int> {
        let path = self.path(ino)?;
        log::debug!("setattr {}", path);

        if mode.is_some() {
            return Err(unsupported("chmod"));
        }
        if owner.0.is_some() || owner.1.is_some() {
            return Err(unsupported("chown"));
        }
        if let Some(size) = size {
            self.store
                .truncate(&path, size)
                .map_err(|e| reject("truncate", e))?;
        }
        if atime.is_some() || mtime.is_some() {
            self.store
                .utimens(atime.map(system_time), mtime.map(system_time))
                .map_err(|e| reject("utimens", e))?;
        }

        self.attr("setattr", &path)
    }

    /// List a directory, `.` and `..` first.
    pub fn list(&mut self, ino: u64) -> Result<Vec<(u64, FileType, String)>, c_int> {
        let path = self.path(ino)?;
        log::debug!("readdir {}", path);

        let stat = self
            .store
            .getattr(&path)
            .map_err(|e| reject("readdir", e))?;
        if stat.kind != FileKind::Directory {
            return Err(libc::ENOTDIR);
        }

        let parent = match path.split_last() {
            Some((parent, _)) => self.inodes.ino_for(&parent),
            None => ROOT_INO,
        };
        let mut entries = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent, FileType::Directory, "..".to_string()),
        ];

        for entry in self.store.readdir(&path).map_err(|e| reject("readdir", e))? {
            let child = self.inodes.ino_for(&path.child(&entry.name));
            entries.push((child, file_type(entry.kind), entry.name));
        }
        Ok(entries)
    }

    pub fn create_child(&mut self, parent: u64, name: &OsStr) -> Result<(FileAttr, u64), c_int> {
        let path = self.child(parent, name)?;
        log::debug!("create {}", path);

        let fh = self.store.create(&path).map_err(|e| reject("create", e))?;
        // An overwritten directory takes its old descendants with it.
        self.inodes.forget_descendants(&path);
        Ok((self.attr("create", &path)?, fh))
    }

    pub fn mkdir_child(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr, c_int> {
        let path = self.child(parent, name)?;
        log::debug!("mkdir {}", path);

        self.store.mkdir(&path).map_err(|e| reject("mkdir", e))?;
        self.inodes.forget_descendants(&path);
        self.attr("mkdir", &path)
    }

    pub fn remove_child(&mut self, parent: u64, name: &OsStr, directory: bool) -> Result<(), c_int> {
        let path = self.child(parent, name)?;
        let operation = if directory { "rmdir" } else { "unlink" };
        log::debug!("{} {}", operation, path);

        let removed = if directory {
            self.store.rmdir(&path)
        } else {
            self.store.unlink(&path)
        };
        removed.map_err(|e| reject(operation, e))?;
        self.inodes.forget(&path);
        Ok(())
    }

    pub fn rename_child(
        &mut self,
        parent: u64,
        name: &OsStr,
        new_parent: u64,
        new_name: &OsStr,
        flags: u32,
    ) -> Result<(), c_int> {
        let old = self.child(parent, name)?;
        let new = self.child(new_parent, new_name)?;
        log::debug!("rename {} -> {}", old, new);

        if flags & libc::RENAME_EXCHANGE != 0 {
            return Err(unsupported("rename exchange"));
        }
        if flags & libc::RENAME_NOREPLACE != 0 && self.store.getattr(&new).is_ok() {
            return Err(libc::EEXIST);
        }

        self.store
            .rename(&old, &new)
            .map_err(|e| reject("rename", e))?;
        self.inodes.rename_prefix(&old, &new);
        Ok(())
    }

    pub fn read_at(&mut self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let path = self.path(ino)?;
        log::debug!("read {} {}@{}", path, size, offset);

        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let size = usize::try_from(size).map_err(|_| libc::EINVAL)?;
        self.store
            .read(&path, size, offset)
            .map_err(|e| reject("read", e))
    }

    pub fn write_at(&mut self, ino: u64, offset: i64, data: &[u8]) -> Result<u32, c_int> {
        let path = self.path(ino)?;
        log::debug!("write {} {}@{}", path, data.len(), offset);

        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let written = self
            .store
            .write(&path, data, offset)
            .map_err(|e| reject("write", e))?;
        u32::try_from(written).map_err(|_| libc::EFBIG)
    }

    pub fn xattr_names(&self, ino: u64) -> Result<Vec<u8>, c_int> {
        let path = self.path(ino)?;
        log::debug!("listxattr {}", path);

        let names = self
            .store
            .listxattr(&path)
            .map_err(|e| reject("listxattr", e))?;
        let mut buf = Vec::new();
        for name in names {
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
        }
        Ok(buf)
    }

    pub fn xattr_value(&self, ino: u64, name: &OsStr) -> Result<&'static str, c_int> {
        let path = self.path(ino)?;
        log::debug!("getxattr {} {:?}", path, name);

        let name = name.to_str().ok_or(libc::EINVAL)?;
        self.store
            .getxattr(&path, name)
            .map_err(|e| reject("getxattr", e))
    }

    pub fn set_xattr(&mut self, ino: u64, name: &OsStr, value: &[u8]) -> Result<(), c_int> {
        let path = self.path(ino)?;
        log::debug!("setxattr {} {:?}", path, name);

        let name = name.to_str().ok_or(libc::EINVAL)?;
        self.store
            .setxattr(&path, name, value)
            .map_err(|e| reject("setxattr", e))?;
        // A container coerced to a scalar (or back) changes shape below it.
        self.inodes.forget_descendants(&path);
        Ok(())
    }

    pub fn check_access(&self, ino: u64, mask: i32) -> Result<(), c_int> {
        let path = self.path(ino)?;
        log::debug!("access {} {:o}", path, mask);
        self.store
            .access(&path, mask)
            .map_err(|e| reject("access", e))
    }

    /// Write the document back to its backing file.
    pub fn sync(&self) -> Result<(), c_int> {
        self.store.sync().map_err(|e| {
            log::error!("Sync to {} failed: {}", self.store.backing_path().display(), e);
            errno(&e)
        })
    }
}

impl Filesystem for JsonFs {
    fn destroy(&mut self) {
        log::debug!("destroy");
        // Errors are already logged and there is no one left to tell.
        let _ = self.sync();
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        match self.stat(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        match self.set_attr(ino, mode, (uid, gid), size, atime, mtime) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        reply.error(unsupported("mknod"));
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        match self.mkdir_child(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.remove_child(parent, name, false) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.remove_child(parent, name, true) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn symlink(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _link_name: &OsStr,
        _target: &path::Path,
        reply: ReplyEntry,
    ) {
        reply.error(unsupported("symlink"));
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        match self.rename_child(parent, name, newparent, newname, flags) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn link(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _newparent: u64,
        _newname: &OsStr,
        reply: ReplyEntry,
    ) {
        reply.error(unsupported("link"));
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let opened = self.path(ino).and_then(|path| {
            log::debug!("open {}", path);
            self.store.open_node(&path).map_err(|e| reject("open", e))
        });
        match opened {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => reply.error(e),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        match self.read_at(ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        match self.write_at(ino, offset, data) {
            Ok(written) => reply.written(written),
            Err(e) => reply.error(e),
        }
    }

    fn flush(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        reply.ok();
    }

    fn fsync(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _datasync: bool, reply: ReplyEmpty) {
        log::debug!("fsync {}", ino);
        match self.sync() {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let entries = match self.list(ino) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e);
                return;
            }
        };
        let Ok(skip) = usize::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };

        for (i, (ino, kind, name)) in entries.into_iter().enumerate().skip(skip) {
            let next = i64::try_from(i + 1).unwrap_or(i64::MAX);
            if reply.add(ino, next, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn fsyncdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _datasync: bool, reply: ReplyEmpty) {
        log::debug!("fsyncdir {}", ino);
        match self.sync() {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        log::debug!("statfs");
        match self.store.statfs() {
            Ok(stats) => reply.statfs(
                stats.blocks,
                stats.blocks_free,
                stats.blocks_available,
                stats.files,
                stats.files_free,
                stats.block_size,
                stats.name_max,
                stats.fragment_size,
            ),
            Err(e) => reply.error(reject("statfs", e)),
        }
    }

    fn setxattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        _flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        match self.set_xattr(ino, name, value) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn getxattr(&mut self, _req: &Request<'_>, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        match self.xattr_value(ino, name) {
            Ok(value) => send_xattr(reply, size, value.as_bytes()),
            Err(e) => reply.error(e),
        }
    }

    fn listxattr(&mut self, _req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        match self.xattr_names(ino) {
            Ok(names) => send_xattr(reply, size, &names),
            Err(e) => reply.error(e),
        }
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        match self.check_access(ino, mask) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        match self.create_child(parent, name) {
            Ok((attr, fh)) => reply.created(&TTL, &attr, 0, fh, 0),
            Err(e) => reply.error(e),
        }
    }
}

/// Mount options for [`JsonFs`].
#[derive(Clone, Debug)]
pub struct MountOptions {
    /// Filesystem name shown in mount output
    pub fsname: String,
    pub subtype: String,
    /// Allow other users to access the mount
    pub allow_other: bool,
    /// Unmount when the process exits
    pub auto_unmount: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        MountOptions {
            fsname: "jsonfs".to_string(),
            subtype: "jsonfs".to_string(),
            allow_other: false,
            auto_unmount: false,
        }
    }
}

impl MountOptions {
    pub fn to_mount_options(&self) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::FSName(self.fsname.clone()),
            MountOption::Subtype(self.subtype.clone()),
        ];
        if self.allow_other {
            options.push(MountOption::AllowOther);
        }
        if self.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
        options
    }
}

/// Mount `fs` at `mountpoint`, blocking until it is unmounted.
///
/// The document is synced when the kernel tears the mount down.
pub fn mount(fs: JsonFs, mountpoint: impl AsRef<path::Path>, options: &MountOptions) -> io::Result<()> {
    log::info!(
        "Mounting {} at {}",
        fs.store.backing_path().display(),
        mountpoint.as_ref().display()
    );
    fuser::mount2(fs, mountpoint.as_ref(), &options.to_mount_options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use serde_json::json;

    struct Mounted {
        _dir: tempfile::TempDir,
        fs: JsonFs,
    }

    fn mounted(document: serde_json::Value) -> Mounted {
        let dir = tempfile::tempdir().unwrap();
        let backing = dir.path().join("document.json");
        fs::write(&backing, document.to_string()).unwrap();
        Mounted {
            fs: JsonFs::new(DocumentStore::open(&backing).unwrap()),
            _dir: dir,
        }
    }

    fn name(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(errno(&Error::NotFound { path: Path::root() }), libc::ENOENT);
        assert_eq!(
            errno(&Error::InvalidArgument {
                message: "bad".to_string()
            }),
            libc::EINVAL
        );
        assert_eq!(
            errno(&Error::PermissionDenied { path: Path::root() }),
            libc::EACCES
        );
        assert_eq!(
            errno(&Error::NotSupported { operation: "link" }),
            libc::ENOTSUP
        );
        assert_eq!(
            errno(&Error::Io(io::Error::from_raw_os_error(libc::ENOSPC))),
            libc::ENOSPC
        );
        assert_eq!(
            errno(&Error::Io(io::Error::new(io::ErrorKind::Other, "boom"))),
            libc::EIO
        );
    }

    #[test]
    fn xattr_size_query() {
        assert_eq!(xattr_reply(0, b"number"), Ok(XattrReply::Size(6)));
        assert_eq!(xattr_reply(3, b"number"), Err(libc::ERANGE));
        assert_eq!(xattr_reply(6, b"number"), Ok(XattrReply::Data(b"number")));
        assert_eq!(xattr_reply(64, b"number"), Ok(XattrReply::Data(b"number")));
    }

    #[test]
    fn lookup_and_getattr() {
        let mut m = mounted(json!({"a": 1, "b": [10, 20]}));

        let b = m.fs.lookup_child(ROOT_INO, name("b")).unwrap();
        assert_eq!(b.kind, FileType::Directory);
        assert_eq!(b.nlink, 4);

        let b1 = m.fs.lookup_child(b.ino, name("1")).unwrap();
        assert_eq!(b1.kind, FileType::RegularFile);
        assert_eq!(b1.size, 2);
        assert_eq!(m.fs.stat(b1.ino).unwrap().ino, b1.ino);

        assert_eq!(m.fs.lookup_child(ROOT_INO, name("c")), Err(libc::ENOENT));
        assert_eq!(m.fs.stat(9999), Err(libc::ENOENT));
    }

    #[test]
    fn list_includes_dot_entries() {
        let mut m = mounted(json!({"a": 1, "b": [10, 20]}));
        let b = m.fs.lookup_child(ROOT_INO, name("b")).unwrap();

        let names: Vec<String> = m
            .fs
            .list(b.ino)
            .unwrap()
            .into_iter()
            .map(|(_, _, name)| name)
            .collect();
        assert_eq!(names, vec![".", "..", "0", "1"]);

        let root = m.fs.list(ROOT_INO).unwrap();
        assert_eq!(root[1].0, ROOT_INO);

        let a = m.fs.lookup_child(ROOT_INO, name("a")).unwrap();
        assert_eq!(m.fs.list(a.ino), Err(libc::ENOTDIR));
    }

    #[test]
    fn write_then_read() {
        let mut m = mounted(json!({"a": 1, "b": [10, 20]}));
        let b = m.fs.lookup_child(ROOT_INO, name("b")).unwrap();
        let b1 = m.fs.lookup_child(b.ino, name("1")).unwrap();

        // Preserved quirk: a non-zero offset accumulates.
        assert_eq!(m.fs.write_at(b1.ino, 1, b"5"), Ok(1));
        assert_eq!(m.fs.read_at(b1.ino, 0, 4096).unwrap(), b"25");
        assert_eq!(m.fs.read_at(b1.ino, -1, 4096), Err(libc::EINVAL));
        assert_eq!(m.fs.write_at(b1.ino, 0, b"true"), Err(libc::EINVAL));
    }

    #[test]
    fn create_mkdir_and_remove() {
        let mut m = mounted(json!({"l": []}));
        let l = m.fs.lookup_child(ROOT_INO, name("l")).unwrap();

        let (attr, _fh) = m.fs.create_child(ROOT_INO, name("new")).unwrap();
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.size, 0);

        let dir = m.fs.mkdir_child(l.ino, name("2")).unwrap();
        assert_eq!(dir.kind, FileType::Directory);
        assert_eq!(m.fs.store().document()["l"], json!([{}, {}, {}]));

        assert_eq!(m.fs.remove_child(l.ino, name("0"), true), Ok(()));
        assert_eq!(m.fs.store().document()["l"], json!([{}, {}]));
        assert_eq!(m.fs.remove_child(l.ino, name("9"), true), Err(libc::ENOENT));
        assert_eq!(m.fs.mkdir_child(l.ino, name("-1")), Err(libc::EINVAL));
    }

    #[test]
    fn rename_keeps_inode() {
        let mut m = mounted(json!({"o": {"x": 1}}));
        let o = m.fs.lookup_child(ROOT_INO, name("o")).unwrap();
        let x = m.fs.lookup_child(o.ino, name("x")).unwrap();

        m.fs
            .rename_child(ROOT_INO, name("o"), ROOT_INO, name("p"), 0)
            .unwrap();

        assert_eq!(m.fs.store().document(), &json!({"p": {"x": 1}}));
        assert_eq!(m.fs.stat(x.ino).unwrap().size, 1);
        assert_eq!(m.fs.lookup_child(ROOT_INO, name("o")), Err(libc::ENOENT));
    }

    #[test]
    fn rename_noreplace_refuses_existing_destination() {
        let mut m = mounted(json!({"a": 1, "b": 2}));
        assert_eq!(
            m.fs.rename_child(ROOT_INO, name("a"), ROOT_INO, name("b"), libc::RENAME_NOREPLACE),
            Err(libc::EEXIST)
        );
        assert_eq!(m.fs.store().document(), &json!({"a": 1, "b": 2}));
    }

    #[test]
    fn setattr_refuses_chmod_and_chown() {
        let mut m = mounted(json!({"a": "text"}));
        let a = m.fs.lookup_child(ROOT_INO, name("a")).unwrap();

        assert_eq!(
            m.fs.set_attr(a.ino, Some(0o600), (None, None), None, None, None),
            Err(libc::ENOTSUP)
        );
        assert_eq!(
            m.fs.set_attr(a.ino, None, (Some(0), None), None, None, None),
            Err(libc::ENOTSUP)
        );

        let truncated = m
            .fs
            .set_attr(a.ino, None, (None, None), Some(0), None, None)
            .unwrap();
        assert_eq!(truncated.size, 0);
    }

    #[test]
    fn xattrs_through_the_bridge() {
        let mut m = mounted(json!({"a": 1, "o": {}}));
        let a = m.fs.lookup_child(ROOT_INO, name("a")).unwrap();
        let o = m.fs.lookup_child(ROOT_INO, name("o")).unwrap();

        assert_eq!(
            m.fs.xattr_names(a.ino).unwrap(),
            b"user.json.type\0user.json.number.type\0"
        );
        assert_eq!(m.fs.xattr_names(o.ino).unwrap(), b"user.json.type\0");
        assert_eq!(m.fs.xattr_value(a.ino, name("user.json.type")), Ok("number"));

        m.fs.set_xattr(a.ino, name("user.json.type"), b"string").unwrap();
        assert_eq!(m.fs.xattr_value(a.ino, name("user.json.type")), Ok("string"));
        assert_eq!(
            m.fs.set_xattr(o.ino, name("user.json.type"), b"array"),
            Err(libc::EINVAL)
        );
    }

    #[test]
    fn sync_writes_backing_file() {
        let mut m = mounted(json!({"a": 1}));
        m.fs.create_child(ROOT_INO, name("b")).unwrap();
        m.fs.sync().unwrap();

        let text = fs::read_to_string(m.fs.store().backing_path()).unwrap();
        assert_eq!(text, "{\n  \"a\": 1,\n  \"b\": \"\"\n}");
    }

    #[test]
    fn default_mount_options() {
        let options = MountOptions::default().to_mount_options();
        assert_eq!(
            options,
            vec![
                MountOption::FSName("jsonfs".to_string()),
                MountOption::Subtype("jsonfs".to_string()),
            ]
        );
    }
}
