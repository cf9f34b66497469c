//! Core demangling engine

pub mod config;
pub mod demangler;
pub mod event;
pub mod ids;
pub mod path;
pub mod prefix_map;
pub mod shared;


pub use config::{DemanglerConfig, DemanglerConfigBuilder, LaunchOptions};
pub use demangler::{CleanupRecord, Demangler, DemanglerStats};
pub use event::{read_trace, FsEvent};
pub use ids::{BufferAddr, FileHandle};
pub use path::parse_base_address;
pub use prefix_map::PrefixMap;
pub use shared::SharedDemangler;
