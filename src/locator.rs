use std::path::{Path, PathBuf};

use crate::locale::fallback;

/// The local file chosen for a remote locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Locale tag of the file actually used (remote tag or its fallback)
    pub locale: String,
    pub path: PathBuf,
}

/// Candidate file names for a remote locale: primary first, then fallback.
pub fn candidates(remote_tag: &str) -> (String, String) {
    (file_name(remote_tag), file_name(&fallback(remote_tag)))
}

/// Find the file supplying content for `remote_tag` inside `directory`.
///
/// An exact `<remote_tag>.json` wins over `<fallback>.json`. Returns `None`
/// when neither exists.
pub fn locate(remote_tag: &str, directory: &Path) -> Option<ResolvedFile> {
    let primary = directory.join(file_name(remote_tag));
    if primary.is_file() {
        return Some(ResolvedFile {
            locale: remote_tag.to_string(),
            path: primary,
        });
    }

    let fallback_tag = fallback(remote_tag);
    if fallback_tag == remote_tag {
        return None;
    }

    let secondary = directory.join(file_name(&fallback_tag));
    if secondary.is_file() {
        return Some(ResolvedFile {
            locale: fallback_tag,
            path: secondary,
        });
    }

    None
}

fn file_name(tag: &str) -> String {
    format!("{}.json", tag)
}
