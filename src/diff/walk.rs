use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

/// Name of the repository metadata directory excluded from every listing.
pub const METADATA_DIR: &str = ".git";

/// Collect every regular file below `root` as a relative, `/`-separated path.
///
/// - Anything named `.git` (directory or file) is skipped together with its
///   contents.
/// - Symlinks to files are included; symlinked directories are not followed.
/// - Unreadable directories are logged and skipped. A missing `root` yields
///   an empty set.
pub fn local_files(root: &Path) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk(root, "", &mut out);
    out
}

fn walk(dir: &Path, prefix: &str, out: &mut BTreeSet<String>) {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for ent in rd {
        let ent = match ent {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory entry");
                continue;
            }
        };
        let name = ent.file_name().to_string_lossy().into_owned();
        if name == METADATA_DIR {
            continue;
        }
        let ft = match ent.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        let path = ent.path();

        if ft.is_dir() {
            walk(&path, &rel, out);
        } else if ft.is_file() || (ft.is_symlink() && path.is_file()) {
            out.insert(rel);
        }
    }
}
