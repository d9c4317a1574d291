//! Standard-variant install roots
//!
//! The standard extension stores conversations under the editor's global
//! storage for its publisher id:
//!   ⟨config⟩/Code/User/globalStorage/saoudrizwan.claude-dev/tasks
//! The platform config dir is tried first, then the well-known macOS and
//! Linux locations under the home directory for installs that don't follow
//! the platform convention.

use std::path::PathBuf;

use super::{RootProvider, Variant};

const PUBLISHER: &str = "saoudrizwan.claude-dev";

pub struct StandardRoots {
    override_path: Option<PathBuf>,
}

impl StandardRoots {
    pub fn new(override_path: Option<PathBuf>) -> Self {
        Self { override_path }
    }
}

impl RootProvider for StandardRoots {
    fn variant(&self) -> Variant {
        Variant::Standard
    }

    fn description(&self) -> &str {
        "standard extension install (saoudrizwan.claude-dev)"
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

/// Global-storage base directories in OS-convention order.
pub(super) fn global_storage_bases() -> Vec<PathBuf> {
    let mut bases = vec![];
    if let Some(config) = dirs::config_dir() {
        bases.push(config.join("Code/User/globalStorage"));
    }
    if let Some(home) = dirs::home_dir() {
        bases.push(home.join("Library/Application Support/Code/User/globalStorage"));
        bases.push(home.join(".config/Code/User/globalStorage"));
    }
    bases
}
