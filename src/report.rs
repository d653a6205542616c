use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The file is not valid JSON.
    Parse,
    /// A required file or directory is absent.
    NotFound,
    /// The canonical output could not be persisted.
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Parse => "parse",
            FailureKind::NotFound => "not found",
            FailureKind::Write => "write",
        };
        return f.write_str(label);
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} failure for {}: {message}", .path.display())]
pub struct Failure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        return Self::new(path, FailureKind::Parse, message);
    }

    pub fn not_found(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        return Self::new(path, FailureKind::NotFound, message);
    }

    pub fn write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        return Self::new(path, FailureKind::Write, message);
    }

    fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl ToString) -> Self {
        return Self {
            path: path.into(),
            kind,
            message: message.to_string(),
        };
    }
}

/// Outcome of a whole run. Every failure is kept so it can be surfaced at the end.
#[derive(Debug, Default)]
pub struct RunReport {
    pub updated: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn record(&mut self, failure: Failure) {
        tracing::warn!(path = %failure.path.display(), kind = %failure.kind, "{}", failure.message);
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        for failure in failures {
            self.record(failure);
        }
    }

    pub fn is_success(&self) -> bool {
        return self.failures.is_empty();
    }

    pub fn count(&self, kind: &FailureKind) -> usize {
        return self.failures.iter().filter(|f| &f.kind == kind).count();
    }
}
