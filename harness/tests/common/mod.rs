//! Common test utilities for the harness integration suites
//!
//! Import via `mod common; use common::*;` at the top of each harness file.

#![allow(dead_code)]

use harness::{ContainerBrief, NetworkPruneReport, VolumePruneReport};

/// Bring up tracing once per test binary so harness debug lines show under
/// `RUST_LOG`.
pub fn init() {
    shared::logging::init_tracing();
}

/// A labeled container as the engine would report it.
pub fn brief(id: &str, name: &str) -> ContainerBrief {
    ContainerBrief {
        id: id.to_string(),
        names: vec![format!("/{name}")],
    }
}

/// A labeled container that lost its name.
pub fn nameless_brief(id: &str) -> ContainerBrief {
    ContainerBrief {
        id: id.to_string(),
        names: vec![],
    }
}

/// Volume prune outcome with `count` volumes and `mb` mebibytes reclaimed.
pub fn volume_report(count: usize, mb: u64) -> VolumePruneReport {
    VolumePruneReport {
        deleted: (0..count).map(|i| format!("volume-{i}")).collect(),
        space_reclaimed: mb * 1024 * 1024,
    }
}

pub fn network_report(names: &[&str]) -> NetworkPruneReport {
    NetworkPruneReport {
        deleted: names.iter().map(|n| n.to_string()).collect(),
    }
}

/// Tar archive holding `entries`; `None` contents mark a directory entry.
pub fn tar_archive(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        match contents {
            Some(data) => {
                header.set_size(data.len() as u64);
                header.set_entry_type(tar::EntryType::Regular);
                header.set_cksum();
                builder.append_data(&mut header, path, *data).unwrap();
            }
            None => {
                header.set_size(0);
                header.set_entry_type(tar::EntryType::Directory);
                header.set_cksum();
                builder.append_data(&mut header, path, &[][..]).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}
