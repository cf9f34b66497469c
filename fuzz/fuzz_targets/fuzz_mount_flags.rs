#![no_main]
use layeredfs_demangler::{parse_base_address, Demangler};
use libfuzzer_sys::fuzz_target;

// Malformed flags and non-ASCII paths must not panic
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_base_address(text, "base=");

    let (mountpoint, rest) = text.split_at(text.char_indices().nth(4).map_or(text.len(), |(i, _)| i));
    let mut demangler = Demangler::new();
    demangler.on_mount(mountpoint, "/data/fuzz.ifs", "imagefs", None);

    let mut query = text.to_string();
    demangler.demangle(&mut query);
    assert!(query.ends_with(rest) || query == text);
});
