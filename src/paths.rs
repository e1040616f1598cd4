//! Resolving client-supplied file names against the served directory

use anyhow::{anyhow, bail, Result};
use std::path::{Component, Path, PathBuf};

/// Join `name` onto `root` exactly as given. No sanitisation: `../x` and
/// absolute names reach outside the root.
pub fn join_unchecked(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// Resolve `name` so that the result is guaranteed to stay under `root`.
/// Rejects:
/// 1. NUL bytes
/// 2. Parent directory, root and prefix components
/// 3. Names that escape the root through symlinks (checked after
///    canonicalizing)
pub fn confine_under_root(root: &Path, name: &str) -> Result<PathBuf> {
    use Component::{CurDir, Normal, ParentDir, Prefix, RootDir};

    if name.contains('\0') {
        bail!("name contains NUL byte");
    }

    let mut safe = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            CurDir => {}
            Normal(s) => safe.push(s),
            ParentDir | RootDir | Prefix(_) => {
                bail!("name contains disallowed component: {:?}", component);
            }
        }
    }

    let canon_root = root
        .canonicalize()
        .map_err(|e| anyhow!("failed to canonicalize root {:?}: {}", root, e))?;
    let joined = canon_root.join(&safe);

    // Missing names cannot escape; the caller reports them as not found
    if !joined.exists() {
        return Ok(joined);
    }
    let resolved = joined
        .canonicalize()
        .map_err(|e| anyhow!("failed to canonicalize {:?}: {}", joined, e))?;
    if !resolved.starts_with(&canon_root) {
        bail!("name {:?} escapes root {:?}", name, root);
    }
    Ok(resolved)
}

/// Create the served directory if it is missing
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
