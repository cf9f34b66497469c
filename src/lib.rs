//! # layeredfs-demangler
//!
//! Recovers the on-disk path of an archive after the engine has loaded it
//! into RAM and remounted it under an unrelated virtual path.
//!
//! The host's filesystem hooks report each open, read and mount to a
//! [`Demangler`]. Any path that is about to be checked against a mods folder
//! is then passed through [`Demangler::demangle`], which swaps a known
//! mountpoint prefix for the archive path it came from.
//!
//! ## Quick Start
//!
//! ```rust
//! use layeredfs_demangler::{BufferAddr, Demangler, FileHandle};
//!
//! let mut demangler = Demangler::new();
//!
//! // Events reported by the filesystem hooks
//! demangler.on_open("/data/sound/abc.ifs", FileHandle(7));
//! demangler.on_read(FileHandle(7), BufferAddr(0x1000));
//! demangler.on_mount("/ram", "abc", "ramfs", Some("base=0x1000"));
//! demangler.on_mount("/sd001", "/ram/abc", "imagefs", None);
//!
//! // Later, before looking for an override
//! let mut path = String::from("/sd001/bgm.2dx");
//! demangler.demangle(&mut path);
//! assert_eq!(path, "/data/sound/abc.ifs/bgm.2dx");
//! ```
//!
//! ## Sharing between threads
//!
//! ```rust
//! use layeredfs_demangler::{DemanglerConfig, FileHandle, SharedDemangler};
//!
//! let shared = SharedDemangler::with_config(DemanglerConfig::default());
//! let hook = shared.clone();
//! std::thread::spawn(move || hook.on_open("/data/a.ifs", FileHandle(1)))
//!     .join()
//!     .unwrap();
//! assert_eq!(shared.stats().records, 1);
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    parse_base_address, read_trace, BufferAddr, CleanupRecord, Demangler, DemanglerConfig,
    DemanglerConfigBuilder, DemanglerStats, FileHandle, FsEvent, LaunchOptions, PrefixMap,
    SharedDemangler,
};
pub use crate::error::{DemanglerError, Result};
