//! Ultra-variant install roots
//!
//! The ultra build is a parallel install identity with its own publisher
//! directory; the on-disk conversation layout is identical to the standard
//! variant's.

use std::path::PathBuf;

use super::standard::global_storage_bases;
use super::{RootProvider, Variant};

const PUBLISHER: &str = "custom.claude-dev-ultra";

pub struct UltraRoots {
    override_path: Option<PathBuf>,
}

impl UltraRoots {
    pub fn new(override_path: Option<PathBuf>) -> Self {
        Self { override_path }
    }
}

impl RootProvider for UltraRoots {
    fn variant(&self) -> Variant {
        Variant::Ultra
    }

    fn description(&self) -> &str {
        "ultra extension install (custom.claude-dev-ultra)"
    }

    fn candidate_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![];
        if let Some(path) = &self.override_path {
            roots.push(path.clone());
        }
        for base in global_storage_bases() {
            let root = base.join(PUBLISHER).join("tasks");
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }
}
