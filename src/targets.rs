use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::canonical;
use crate::document::{ArrayFields, OverrideMap};
use crate::overrides;
use crate::report::Failure;

/// A parsed target file.
#[derive(Debug)]
pub struct TargetDocument {
    pub path: PathBuf,
    pub tree: Value,
}

/// The derived path written into every property named `key`.
#[derive(Debug, Clone)]
pub struct ModulePath {
    pub key: String,
    pub path: PathBuf,
}

/// Read-only state shared by every document of a run.
#[derive(Debug)]
pub struct MergeContext {
    pub overrides: OverrideMap,
    pub array_fields: ArrayFields,
    pub module_path: Option<ModulePath>,
}

/// Finds every file named `file_name` below the given roots.
///
/// Roots that do not exist are reported and skipped. The result is sorted and
/// free of duplicates so runs are reproducible.
pub fn discover(roots: &[PathBuf], file_name: &str) -> (Vec<PathBuf>, Vec<Failure>) {
    let mut paths = Vec::new();
    let mut failures = Vec::new();

    for root in roots {
        if !root.is_dir() {
            failures.push(Failure::not_found(root, "target root is not a directory"));
            continue;
        }
        paths.extend(discover_in(root, file_name));
    }

    paths.sort();
    paths.dedup();
    return (paths, failures);
}

pub fn discover_in(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == file_name)
        .filter(|e| {
            if e.path_is_symlink() {
                debug!(path = %e.path().display(), "Skipping symlinked target file");
                return false;
            }
            return e.file_type().is_file();
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    debug!(root = %root.display(), count = paths.len(), "Discovered target files");
    return paths;
}

/// Locates the first directory named `name` below `search_root` and returns
/// its absolute path.
pub fn locate_dir(search_root: &Path, name: &str) -> Option<PathBuf> {
    let found = WalkDir::new(search_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_dir() && e.file_name() == name)?;

    return match fs::canonicalize(found.path()) {
        Ok(path) => Some(path),
        Err(error) => {
            warn!(path = %found.path().display(), %error, "Unable to resolve directory");
            None
        }
    };
}

/// Parses every path; unreadable or invalid files become failures and are
/// left out of the returned documents.
pub fn load_all(paths: &[PathBuf]) -> (Vec<TargetDocument>, Vec<Failure>) {
    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        match load(path) {
            Ok(document) => documents.push(document),
            Err(failure) => failures.push(failure),
        }
    }

    return (documents, failures);
}

pub fn load(path: &Path) -> Result<TargetDocument, Failure> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(Failure::not_found(path, error))
        }
        Err(error) => return Err(Failure::parse(path, error)),
    };

    let tree: Value = match serde_json::from_str(&contents) {
        Ok(tree) => tree,
        Err(error) => return Err(Failure::parse(path, error)),
    };

    return Ok(TargetDocument {
        path: path.to_path_buf(),
        tree,
    });
}

/// Merges, canonicalizes and rewrites a single document.
pub fn process(document: TargetDocument, ctx: &MergeContext) -> Result<PathBuf, Failure> {
    let TargetDocument { path, mut tree } = document;

    overrides::apply_overrides(&mut tree, &ctx.overrides, &ctx.array_fields);
    if let Some(module_path) = &ctx.module_path {
        let count = overrides::inject_path(&mut tree, &module_path.key, &module_path.path);
        debug!(path = %path.display(), key = %module_path.key, count, "Injected module path");
    }

    let contents = match canonical::to_canonical_json(&tree, &ctx.array_fields) {
        Ok(contents) => contents,
        Err(error) => return Err(Failure::write(&path, error)),
    };

    if let Err(error) = write_atomic(&path, contents.as_bytes()) {
        return Err(Failure::write(&path, error));
    }

    info!(path = %path.display(), "Updated target file");
    return Ok(path);
}

/// Processes every document on the blocking pool. Results keep input order.
pub async fn process_all(
    documents: Vec<TargetDocument>,
    ctx: Arc<MergeContext>,
) -> Vec<Result<PathBuf, Failure>> {
    let tasks = documents.into_iter().map(|document| {
        let ctx = Arc::clone(&ctx);
        let path = document.path.clone();
        async move {
            match tokio::task::spawn_blocking(move || process(document, &ctx)).await {
                Ok(result) => result,
                Err(error) => Err(Failure::write(path, error)),
            }
        }
    });

    return futures::future::join_all(tasks).await;
}

/// Replaces `path` in a single rename so readers never see a partial file.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent)?;
    // The temp file is created private; keep the mode of the file being replaced.
    match fs::metadata(path) {
        Ok(metadata) => file.as_file().set_permissions(metadata.permissions())?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;

    return Ok(());
}
