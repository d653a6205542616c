use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::targets;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Asset {0} not found")]
    NotFound(String),

    #[error("Failed to copy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {0}: {1}")]
    Walk(String, String),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    return move |source| Error::Io {
        path: path.display().to_string(),
        source,
    };
}

/// Overwrites every file named `target_name` below `roots` with the contents
/// of `source`, returning the files written.
pub fn propagate_file(
    source: &Path,
    roots: &[PathBuf],
    target_name: &str,
) -> Result<Vec<PathBuf>, Error> {
    let contents = match fs::read(source) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(source.display().to_string()))
        }
        Err(error) => return Err(io_error(source)(error)),
    };

    let mut written = Vec::new();
    for root in roots.iter().filter(|root| root.is_dir()) {
        for destination in targets::discover_in(root, target_name) {
            fs::write(&destination, &contents).map_err(io_error(&destination))?;
            debug!(source = %source.display(), destination = %destination.display(), "Copied file asset");
            written.push(destination);
        }
    }

    info!(source = %source.display(), count = written.len(), "Propagated file asset");
    return Ok(written);
}

/// Replaces `destination` with a recursive copy of `source`, returning the
/// number of files copied.
pub fn replace_dir(source: &Path, destination: &Path) -> Result<u64, Error> {
    if !source.is_dir() {
        return Err(Error::NotFound(source.display().to_string()));
    }

    if destination.exists() {
        fs::remove_dir_all(destination).map_err(io_error(destination))?;
    }
    fs::create_dir_all(destination).map_err(io_error(destination))?;

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false).min_depth(1) {
        let entry =
            entry.map_err(|error| Error::Walk(source.display().to_string(), error.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|error| Error::Walk(source.display().to_string(), error.to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_error(&target))?;
            copied += 1;
        }
    }

    info!(source = %source.display(), destination = %destination.display(), copied, "Replaced directory");
    return Ok(copied);
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{propagate_file, replace_dir, Error};

    #[test]
    fn file_is_copied_to_every_match() {
        let dir = tempdir().unwrap();
        let bootstrap = dir.path().join("bootstrap");
        let starter = dir.path().join("starter");
        fs::create_dir_all(bootstrap.join("azure")).unwrap();
        fs::create_dir_all(&starter).unwrap();
        fs::write(bootstrap.join("azure").join("cert.pem"), "old").unwrap();
        fs::write(starter.join("cert.pem"), "old").unwrap();
        fs::write(starter.join("other.pem"), "untouched").unwrap();

        let source = dir.path().join("source.pem");
        fs::write(&source, "-----BEGIN CERTIFICATE-----\n").unwrap();

        let written = propagate_file(&source, &[bootstrap.clone(), starter.clone()], "cert.pem").unwrap();
        assert_eq!(2, written.len());
        assert_eq!(
            "-----BEGIN CERTIFICATE-----\n",
            fs::read_to_string(starter.join("cert.pem")).unwrap()
        );
        assert_eq!(
            "-----BEGIN CERTIFICATE-----\n",
            fs::read_to_string(bootstrap.join("azure").join("cert.pem")).unwrap()
        );
        assert_eq!("untouched", fs::read_to_string(starter.join("other.pem")).unwrap());
    }

    #[test]
    fn missing_source_file() {
        let dir = tempdir().unwrap();

        let result = propagate_file(&dir.path().join("missing.pem"), &[], "cert.pem");
        match result.err().unwrap() {
            Error::NotFound(_) => {}
            _ => panic!("Expected `NotFound` error"),
        }
    }

    #[test]
    fn directory_is_replaced() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("lib");
        fs::create_dir_all(source.join("archetypes")).unwrap();
        fs::write(source.join("a.json"), "{}").unwrap();
        fs::write(source.join("archetypes").join("b.json"), "[]").unwrap();

        let destination = dir.path().join("module").join("lib");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("stale.json"), "{}").unwrap();

        let copied = replace_dir(&source, &destination).unwrap();
        assert_eq!(2, copied);
        assert_eq!(false, destination.join("stale.json").exists());
        assert_eq!("[]", fs::read_to_string(destination.join("archetypes").join("b.json")).unwrap());
    }

    #[test]
    fn missing_source_directory() {
        let dir = tempdir().unwrap();

        let result = replace_dir(&dir.path().join("nope"), &dir.path().join("dest"));
        match result.err().unwrap() {
            Error::NotFound(_) => {}
            _ => panic!("Expected `NotFound` error"),
        }
        assert_eq!(false, dir.path().join("dest").exists());
    }
}
