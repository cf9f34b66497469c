//! Thread-safe handle around a [`Demangler`]
//!
//! Hooked filesystem calls may arrive from several engine threads. Each
//! event takes the one lock for its whole read-modify-write, so a cleanup
//! record and the forward maps it points into always change together.

use super::config::DemanglerConfig;
use super::demangler::{Demangler, DemanglerStats};
use super::event::FsEvent;
use super::ids::{BufferAddr, FileHandle};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-protected demangler shared between hook threads
#[derive(Debug, Clone, Default)]
pub struct SharedDemangler {
    inner: Arc<Mutex<Demangler>>,
}

impl SharedDemangler {
    pub fn new(demangler: Demangler) -> Self {
        SharedDemangler {
            inner: Arc::new(Mutex::new(demangler)),
        }
    }

    pub fn with_config(config: DemanglerConfig) -> Self {
        Self::new(Demangler::with_config(config))
    }

    pub fn on_open(&self, path: &str, handle: FileHandle) {
        self.inner.lock().on_open(path, handle);
    }

    pub fn on_read(&self, handle: FileHandle, dest: BufferAddr) {
        self.inner.lock().on_read(handle, dest);
    }

    pub fn on_mount(&self, mountpoint: &str, fsroot: &str, fstype: &str, flags: Option<&str>) {
        self.inner.lock().on_mount(mountpoint, fsroot, fstype, flags);
    }

    pub fn demangle(&self, raw_path: &mut String) {
        self.inner.lock().demangle(raw_path);
    }

    pub fn resolve(&self, raw_path: &str) -> Option<String> {
        self.inner.lock().resolve(raw_path)
    }

    pub fn apply(&self, event: &FsEvent) -> Option<String> {
        self.inner.lock().apply(event)
    }

    pub fn stats(&self) -> DemanglerStats {
        self.inner.lock().stats()
    }

    /// Run `f` with exclusive access to the underlying demangler
    pub fn with<R>(&self, f: impl FnOnce(&mut Demangler) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
