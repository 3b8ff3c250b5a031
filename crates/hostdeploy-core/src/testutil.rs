//! Shared fixtures for unit tests: bundle construction and tree snapshots.

use crate::config::DeployConfig;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct BundleBuilder {
    entries: Vec<(String, Vec<u8>, u32)>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.entries
            .push((path.to_string(), content.as_bytes().to_vec(), 0o644));
        self
    }

    /// Shell script with a shebang, shipped executable so running it does
    /// not change the tree. `script.rs` covers the runner's chmod.
    pub fn script(mut self, path: &str, body: &str) -> Self {
        let content = format!("#!/bin/sh\nset -e\n{body}\n");
        self.entries
            .push((path.to_string(), content.into_bytes(), 0o755));
        self
    }

    pub fn write(self, dest: &Path) {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let file = std::fs::File::create(dest).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (path, data, mode) in self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(mode);
            builder
                .append_data(&mut header, path, data.as_slice())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
}

/// One entry of a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir { mode: u32 },
    File { mode: u32, data: Vec<u8> },
    Link(PathBuf),
}

/// Relative path → kind, permission bits and contents (or link target) for
/// everything under `dir`, without following symlinks.
pub fn tree(dir: &Path) -> BTreeMap<PathBuf, Node> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
            let mode = e.metadata().unwrap().permissions().mode() & 0o7777;
            let node = if e.file_type().is_symlink() {
                Node::Link(std::fs::read_link(e.path()).unwrap())
            } else if e.file_type().is_dir() {
                Node::Dir { mode }
            } else {
                Node::File {
                    mode,
                    data: std::fs::read(e.path()).unwrap(),
                }
            };
            (rel, node)
        })
        .collect()
}

/// Config rooted in a temp dir with the log file outside the app dir.
pub fn config_in(root: &Path) -> DeployConfig {
    DeployConfig::with_root(root)
}
