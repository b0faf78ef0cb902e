pub mod attributes;
pub mod check;
pub mod eval;

pub use attributes::{attributes, AttributesArgs};
pub use check::{check, CheckArgs};
pub use eval::{eval, EvalArgs};

use std::path::{Path, PathBuf};

/// Resolve a manifest argument against the working directory.
pub(crate) fn manifest_path(cwd: &Path, manifest: &Path) -> PathBuf {
    if manifest.is_absolute() {
        manifest.to_path_buf()
    } else {
        cwd.join(manifest)
    }
}
