//! Property-based tests for bounded growth and stale-entry retraction
//!
//! Uses proptest to drive random event sequences over a small pool of
//! archive paths, handles, buffers and mountpoints.

use layeredfs_demangler::{BufferAddr, Demangler, FileHandle};
use proptest::prelude::*;

const PATHS: &[&str] = &[
    "/data/sound/a.ifs",
    "/data/sound/b.ifs",
    "/data/sound/c.ifs",
    "/data/other.bin",
];

#[derive(Debug, Clone)]
enum Op {
    Open(usize, i64),
    Read(i64, u64),
    Ramfs(usize, u64),
    Imagefs(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PATHS.len(), -1i64..8).prop_map(|(p, h)| Op::Open(p, h)),
        (0i64..8, 0u64..4).prop_map(|(h, b)| Op::Read(h, b)),
        (0usize..4, 0u64..4).prop_map(|(m, b)| Op::Ramfs(m, b)),
        (0usize..4, 0usize..4).prop_map(|(m, r)| Op::Imagefs(m, r)),
    ]
}

fn apply(demangler: &mut Demangler, op: &Op) {
    match *op {
        Op::Open(p, h) => demangler.on_open(PATHS[p], FileHandle(h)),
        Op::Read(h, b) => demangler.on_read(FileHandle(h), BufferAddr(0x1000 * (b + 1))),
        Op::Ramfs(m, b) => demangler.on_mount(
            &format!("ram{}", m),
            "root",
            "ramfs",
            Some(&format!("base={:#x}", 0x1000 * (b + 1))),
        ),
        Op::Imagefs(m, r) => {
            demangler.on_mount(&format!("/img{}", m), &format!("ram{}/root", r), "imagefs", None)
        }
    }
}

proptest! {
    #[test]
    fn prop_one_record_per_archive(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut demangler = Demangler::new();
        for op in &ops {
            apply(&mut demangler, op);
        }

        let stats = demangler.stats();
        // Only the three .ifs paths can ever be tracked
        prop_assert!(stats.records <= 3);
        prop_assert!(stats.open_handles <= 8);
        prop_assert!(stats.buffers <= 4);
        prop_assert!(stats.ramfs_mounts <= 4);
        prop_assert!(stats.mangled_mounts <= 4);
    }

    #[test]
    fn prop_reopen_count_does_not_grow_tables(
        reopens in 1usize..60,
        reads in 1usize..4,
        mounts in 1usize..4,
    ) {
        let mut demangler = Demangler::new();
        for n in 0..reopens {
            let h = n as i64;
            let base = 0x10_0000 * (n + 1);
            demangler.on_open("/data/sound/a.ifs", FileHandle(h));
            for r in 0..reads {
                demangler.on_read(FileHandle(h), BufferAddr((base + r * 0x1000) as u64));
            }
            for m in 0..mounts {
                let root = format!("r{}_{}", n, m);
                demangler.on_mount("/ram", &root, "ramfs", Some(&format!("base={}", base)));
                demangler.on_mount(&format!("/sd{}_{}", n, m), &format!("/ram/{}/inner", root), "imagefs", None);
            }
            if n % 2 == 0 {
                demangler.on_mount(&format!("/fb{}", n), "/data/sound/a.ifs", "imagefs", None);
            }
        }

        let stats = demangler.stats();
        prop_assert_eq!(stats.records, 1);
        prop_assert_eq!(stats.open_handles, 1);
        prop_assert_eq!(stats.buffers, reads);
        prop_assert_eq!(stats.ramfs_mounts, mounts);
        let fallback = usize::from((reopens - 1) % 2 == 0);
        prop_assert_eq!(stats.mangled_mounts, mounts + fallback);
    }

    #[test]
    fn prop_reopen_purges_previous_mount(ops in prop::collection::vec(op_strategy(), 0..100)) {
        let mut demangler = Demangler::new();
        for op in &ops {
            apply(&mut demangler, op);
        }

        let previous: Vec<String> = demangler
            .record("/data/sound/a.ifs")
            .map(|r| r.mounted_paths.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|mp| demangler.resolve(mp).as_deref() == Some("/data/sound/a.ifs"))
            .collect();

        demangler.on_open("/data/sound/a.ifs", FileHandle(100));

        for mountpoint in previous {
            prop_assert!(demangler.resolve(&mountpoint).is_none(), "stale mount {} still resolves", mountpoint);
        }
        let record = demangler.record("/data/sound/a.ifs").unwrap();
        prop_assert_eq!(record.handle, FileHandle(100));
        prop_assert!(record.buffers.is_empty());
        prop_assert!(record.mounted_paths.is_empty());
        prop_assert_eq!(demangler.lookup_handle(FileHandle(100)), Some("/data/sound/a.ifs"));
    }

    #[test]
    fn prop_unmatched_paths_unchanged(path in "/[a-z]{1,8}/[a-z0-9_.]{0,12}") {
        let mut demangler = Demangler::new();
        demangler.on_mount("mntx", "/data/sound/xyz.ifs", "imagefs", None);

        let mut query = path.clone();
        demangler.demangle(&mut query);
        prop_assert_eq!(query, path);
    }
}
