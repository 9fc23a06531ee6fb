use std::path::PathBuf;

use thiserror::Error;

/// Errors reported while turning VM source into assembly.
///
/// Every variant is fatal for the run; callers never get partial output.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A line that is none of the nine command kinds.
    #[error("{file}:{line}: malformed command `{text}`")]
    Malformed {
        file: String,
        line: usize,
        text: String,
    },
    #[error("{file}:{line}: unknown segment `{segment}` in `{text}`")]
    UnknownSegment {
        file: String,
        line: usize,
        segment: String,
        text: String,
    },
    /// `pointer` and `temp` only map onto a fixed window of registers.
    #[error("{file}:{line}: index {index} is outside the {segment} segment in `{text}`")]
    IndexOutOfRange {
        file: String,
        line: usize,
        segment: &'static str,
        index: u16,
        text: String,
    },
    #[error("{file}:{line}: label `{label}` is already defined (`{text}`)")]
    DuplicateLabel {
        file: String,
        line: usize,
        label: String,
        text: String,
    },
    /// The generated module broke the output line contract.
    #[error("generated invalid assembly: {0}")]
    InvalidOutput(String),
    #[error("input path does not exist: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TranslateError>;
