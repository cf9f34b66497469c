//! Mount-chain demangler
//!
//! Games in this family mount their archives in two stages:
//!
//! 1. open the archive file (`/data/sound/xxx.ifs`)
//! 2. read its whole contents into a freshly allocated buffer
//! 3. mount a `ramfs` whose flags carry `base=<buffer address>`; the virtual
//!    file is `mountpoint/fsroot`
//! 4. mount an `imagefs` whose root lies inside that ramfs path, at a
//!    mountpoint that has nothing in common with the original path
//!
//! Each stage is recorded as a forward mapping back to the original path:
//!
//! ```text
//! open:    handle        -> path
//! read:    buffer        -> (handle ->) path
//! ramfs:   ramfs path    -> (buffer -> handle ->) path
//! imagefs: mountpoint    -> (ramfs path -> buffer -> handle ->) path
//! ```
//!
//! Only the last table is consulted by [`Demangler::demangle`]. A cleanup
//! record per original path remembers every key created for it, so opening
//! the same archive again retracts the previous generation before new
//! mappings are added. Memory is therefore bounded by the number of distinct
//! archive paths ever opened.
//!
//! Two live handles for the same archive path are not supported: the second
//! open retracts the first one's mappings.

use super::config::DemanglerConfig;
use super::event::FsEvent;
use super::ids::{BufferAddr, FileHandle};
use super::path::{has_extension, join_mount, normalize, parse_base_address};
use super::prefix_map::PrefixMap;
use ahash::AHashMap;
use serde::Serialize;
use std::hash::Hash;
use tracing::{debug, info, trace};

/// Every key created on behalf of one original path
///
/// A single lifecycle may read in chunks or mount several times, so each
/// kind of key is a list. Entries are unique within a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRecord {
    pub handle: FileHandle,
    pub buffers: Vec<BufferAddr>,
    pub ramfs_paths: Vec<String>,
    pub mounted_paths: Vec<String>,
}

impl CleanupRecord {
    fn new(handle: FileHandle) -> Self {
        CleanupRecord {
            handle,
            buffers: Vec::new(),
            ramfs_paths: Vec::new(),
            mounted_paths: Vec::new(),
        }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Table sizes, for observing the bounded-memory guarantee
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemanglerStats {
    pub records: usize,
    pub open_handles: usize,
    pub buffers: usize,
    pub ramfs_mounts: usize,
    pub mangled_mounts: usize,
}

/// Tracks archive open/read/mount events and resolves mangled mount paths
/// back to the archive they came from
///
/// All entry points are total: events that cannot be traced to an archive
/// are ignored.
///
/// ```
/// use layeredfs_demangler::{BufferAddr, Demangler, FileHandle};
///
/// let mut demangler = Demangler::new();
/// demangler.on_open("/data/sound/abc.ifs", FileHandle(3));
/// demangler.on_read(FileHandle(3), BufferAddr(0x1000));
/// demangler.on_mount("mnt1", "root1", "ramfs", Some("base=0x1000"));
/// demangler.on_mount("mnt2", "mnt1/root1", "imagefs", None);
///
/// let mut path = String::from("mnt2/whatever.bin");
/// demangler.demangle(&mut path);
/// assert_eq!(path, "/data/sound/abc.ifs/whatever.bin");
/// ```
#[derive(Debug, Clone)]
pub struct Demangler {
    config: DemanglerConfig,
    /// original path -> keys to retract on re-open
    records: AHashMap<String, CleanupRecord>,
    open_files: AHashMap<FileHandle, String>,
    buffers: AHashMap<BufferAddr, String>,
    ramfs: PrefixMap<String>,
    mangled: PrefixMap<String>,
}

impl Default for Demangler {
    fn default() -> Self {
        Self::new()
    }
}

impl Demangler {
    pub fn new() -> Self {
        Self::with_config(DemanglerConfig::default())
    }

    pub fn with_config(config: DemanglerConfig) -> Self {
        info!(
            "Demangler tracking '{}' archives via {} -> {} mounts (enabled={})",
            config.archive_extension, config.ramfs_type, config.imagefs_type, config.enabled
        );
        Demangler {
            config,
            records: AHashMap::new(),
            open_files: AHashMap::new(),
            buffers: AHashMap::new(),
            ramfs: PrefixMap::new(),
            mangled: PrefixMap::new(),
        }
    }

    pub fn config(&self) -> &DemanglerConfig {
        &self.config
    }

    /// Record that `handle` was opened for `path`
    ///
    /// Ignored for failed opens and for files without the archive extension.
    /// Re-opening a known path retracts everything recorded for it first.
    pub fn on_open(&mut self, path: &str, handle: FileHandle) {
        if !self.config.enabled {
            return;
        }
        if !handle.is_valid() || !has_extension(path, &self.config.archive_extension) {
            trace!("Ignoring open of {} (handle {})", path, handle);
            return;
        }

        let path = normalize(path);
        if let Some(stale) = self.records.remove(&path) {
            self.retract(&path, &stale);
        }

        debug!("Tracking {} as handle {}", path, handle);
        self.records.insert(path.clone(), CleanupRecord::new(handle));
        self.open_files.insert(handle, path);
    }

    /// Record that `dest` now holds bytes read from `handle`
    pub fn on_read(&mut self, handle: FileHandle, dest: BufferAddr) {
        if !self.config.enabled {
            return;
        }
        let Some(path) = self.open_files.get(&handle).cloned() else {
            return;
        };

        self.buffers.insert(dest, path.clone());
        if let Some(record) = self.records.get_mut(&path) {
            push_unique(&mut record.buffers, dest);
        }
    }

    /// Record a mount, linking ramfs mounts to buffers and imagefs mounts to
    /// ramfs paths
    ///
    /// Mount types other than the configured ramfs/imagefs names are ignored.
    pub fn on_mount(&mut self, mountpoint: &str, fsroot: &str, fstype: &str, flags: Option<&str>) {
        if !self.config.enabled {
            return;
        }
        if fstype == self.config.ramfs_type {
            self.mount_ramfs(mountpoint, fsroot, flags);
        } else if fstype == self.config.imagefs_type {
            self.mount_imagefs(mountpoint, fsroot);
        } else {
            trace!("Ignoring {} mount at {}", fstype, mountpoint);
        }
    }

    fn mount_ramfs(&mut self, mountpoint: &str, fsroot: &str, flags: Option<&str>) {
        let Some(flags) = flags else {
            debug!("ramfs mount at {} has no flags", mountpoint);
            return;
        };
        let Some(buffer) = parse_base_address(flags, &self.config.base_token) else {
            debug!("ramfs mount at {} has no base pointer", mountpoint);
            return;
        };
        let Some(orig_path) = self.buffers.get(&buffer).cloned() else {
            return;
        };

        let ramfs_path = normalize(&join_mount(mountpoint, fsroot, &self.config.separator));
        debug!("ramfs mount {} mapped to {}", ramfs_path, orig_path);
        self.ramfs.insert(ramfs_path.clone(), orig_path.clone());

        if let Some(record) = self.records.get_mut(&orig_path) {
            push_unique(&mut record.ramfs_paths, ramfs_path);
        }
    }

    fn mount_imagefs(&mut self, mountpoint: &str, fsroot: &str) {
        let mountpoint = normalize(mountpoint);
        let fsroot = normalize(fsroot);

        let orig_path = match self.ramfs.longest_prefix(&fsroot) {
            Some((_, orig_path)) => orig_path.clone(),
            // Archive mounted straight from disk, without a ramfs stage
            None if has_extension(&fsroot, &self.config.archive_extension) => fsroot,
            None => return,
        };

        debug!("imagefs mount {} mapped to {}", mountpoint, orig_path);
        self.mangled.insert(mountpoint.clone(), orig_path.clone());

        if let Some(record) = self.records.get_mut(&orig_path) {
            push_unique(&mut record.mounted_paths, mountpoint);
        }
    }

    /// Rewrite `raw_path` in place if its prefix is a known imagefs mountpoint
    ///
    /// Only the matched prefix is replaced; the remainder of the path is kept
    /// as given. Paths with no matching mountpoint are left untouched.
    pub fn demangle(&self, raw_path: &mut String) {
        if let Some(resolved) = self.resolve(raw_path) {
            *raw_path = resolved;
        }
    }

    /// Demangled form of `raw_path`, or `None` if no mountpoint matches
    pub fn resolve(&self, raw_path: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let query = normalize(raw_path);
        let (mountpoint, orig_path) = self.mangled.longest_prefix(&query)?;

        let suffix = &raw_path[mountpoint.len()..];
        let mut resolved = String::with_capacity(orig_path.len() + suffix.len());
        resolved.push_str(orig_path);
        resolved.push_str(suffix);
        Some(resolved)
    }

    /// Feed one recorded event; returns the resolved path for queries
    pub fn apply(&mut self, event: &FsEvent) -> Option<String> {
        match event {
            FsEvent::Open { path, handle } => {
                self.on_open(path, *handle);
                None
            }
            FsEvent::Read { handle, dest } => {
                self.on_read(*handle, *dest);
                None
            }
            FsEvent::Mount {
                mountpoint,
                fsroot,
                fstype,
                flags,
            } => {
                self.on_mount(mountpoint, fsroot, fstype, flags.as_deref());
                None
            }
            FsEvent::Demangle { path } => {
                let mut path = path.clone();
                self.demangle(&mut path);
                Some(path)
            }
        }
    }

    /// Original path recorded for an open handle
    pub fn lookup_handle(&self, handle: FileHandle) -> Option<&str> {
        self.open_files.get(&handle).map(String::as_str)
    }

    /// Original path whose contents were read into `buffer`
    pub fn lookup_buffer(&self, buffer: BufferAddr) -> Option<&str> {
        self.buffers.get(&buffer).map(String::as_str)
    }

    /// Cleanup record for an original path (case-insensitive)
    pub fn record(&self, path: &str) -> Option<&CleanupRecord> {
        self.records.get(&normalize(path))
    }

    /// Imagefs mountpoints and the original paths they resolve to
    pub fn mounts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mangled.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn stats(&self) -> DemanglerStats {
        DemanglerStats {
            records: self.records.len(),
            open_handles: self.open_files.len(),
            buffers: self.buffers.len(),
            ramfs_mounts: self.ramfs.len(),
            mangled_mounts: self.mangled.len(),
        }
    }

    /// Drop all tracked state
    pub fn clear(&mut self) {
        self.records.clear();
        self.open_files.clear();
        self.buffers.clear();
        self.ramfs.clear();
        self.mangled.clear();
    }

    /// Remove every forward mapping a superseded record created
    ///
    /// An entry is only removed while it still points at `path`; handles,
    /// buffers and mountpoints may since have been reused by another archive.
    fn retract(&mut self, path: &str, stale: &CleanupRecord) {
        debug!("Retracting previous mappings for {}", path);

        remove_owned(&mut self.open_files, &stale.handle, path);
        for buffer in &stale.buffers {
            remove_owned(&mut self.buffers, buffer, path);
        }
        for ramfs_path in &stale.ramfs_paths {
            remove_owned_prefix(&mut self.ramfs, ramfs_path, path);
        }
        for mounted_path in &stale.mounted_paths {
            remove_owned_prefix(&mut self.mangled, mounted_path, path);
        }
    }
}

fn remove_owned<K: Eq + Hash>(map: &mut AHashMap<K, String>, key: &K, path: &str) {
    if map.get(key).is_some_and(|owner| owner == path) {
        map.remove(key);
    }
}

fn remove_owned_prefix(map: &mut PrefixMap<String>, key: &str, path: &str) {
    if map.get(key).is_some_and(|owner| owner == path) {
        map.remove(key);
    }
}
