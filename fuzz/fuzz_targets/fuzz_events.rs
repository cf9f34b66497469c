#![no_main]
use arbitrary::Arbitrary;
use layeredfs_demangler::{BufferAddr, Demangler, FileHandle};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Event {
    Open { path: String, handle: i64 },
    Read { handle: i64, dest: u64 },
    Mount { mountpoint: String, fsroot: String, ramfs: bool, flags: Option<String> },
    Demangle { path: String },
}

// Arbitrary event streams must never panic, and re-opening a path must
// always leave exactly one record for it
fuzz_target!(|events: Vec<Event>| {
    let mut demangler = Demangler::new();

    for event in &events {
        match event {
            Event::Open { path, handle } => {
                demangler.on_open(path, FileHandle(*handle));
                if *handle >= 0 && path.to_ascii_lowercase().ends_with(".ifs") {
                    assert!(demangler.record(path).is_some());
                }
            }
            Event::Read { handle, dest } => demangler.on_read(FileHandle(*handle), BufferAddr(*dest)),
            Event::Mount { mountpoint, fsroot, ramfs, flags } => {
                let fstype = if *ramfs { "ramfs" } else { "imagefs" };
                demangler.on_mount(mountpoint, fsroot, fstype, flags.as_deref());
            }
            Event::Demangle { path } => {
                let mut path = path.clone();
                demangler.demangle(&mut path);
            }
        }
    }

    let stats = demangler.stats();
    assert!(stats.open_handles <= events.len());
    assert!(stats.records <= events.len());
});
