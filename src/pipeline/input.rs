//! Input resolution: turn a path, URL or uploaded blob into a [`SourceDocument`].
//!
//! The document kind comes from the file name's extension alone; content
//! sniffing is left to the extractor, which reports a mismatch as
//! [`QuizError::UnreadableDocument`].

use crate::error::QuizError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The fixed set of document types the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    /// `.txt` — UTF-8 plain text.
    Text,
    /// `.pdf` — page-oriented.
    Pdf,
    /// `.docx` — paragraph-oriented.
    Docx,
}

impl DocumentKind {
    /// Derive the kind from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, QuizError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("txt") => Ok(DocumentKind::Text),
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            _ => Err(QuizError::UnsupportedFileType {
                name: name.to_string(),
            }),
        }
    }
}

/// An uploaded file: its name, its declared kind and its raw bytes.
///
/// Consumed by [`crate::pipeline::extract::extract_text`]; nothing keeps it
/// after extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Wrap an uploaded blob, deriving its kind from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, QuizError> {
        let name = name.into();
        let kind = DocumentKind::from_file_name(&name)?;
        Ok(Self { name, kind, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL into a [`SourceDocument`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<SourceDocument, QuizError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<SourceDocument, QuizError> {
    let path = PathBuf::from(path_str);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    // Reject the extension before touching the file system.
    let kind = DocumentKind::from_file_name(&name)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => QuizError::PermissionDenied { path: path.clone() },
        _ => QuizError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(SourceDocument { name, kind, bytes })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, QuizError> {
    info!("Downloading document from: {}", url);

    let name = file_name_from_url(url);
    let kind = DocumentKind::from_file_name(&name)?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            QuizError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            QuizError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(QuizError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(SourceDocument {
        name,
        kind,
        bytes: bytes.to_vec(),
    })
}

/// Last non-empty path segment of `url`, or `"download"` when there is none.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "download".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/notes.pdf"));
        assert!(is_url("http://example.com/notes.txt"));
        assert!(!is_url("/tmp/notes.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_file_name("a.TXT").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_file_name("dir/b.Pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("c.docx").unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        for name in ["slides.pptx", "notes", "legacy.doc", "archive.tar.gz"] {
            let err = DocumentKind::from_file_name(name).unwrap_err();
            assert!(
                matches!(err, QuizError::UnsupportedFileType { .. }),
                "{name}: {err:?}"
            );
        }
    }

    #[test]
    fn url_file_name() {
        assert_eq!(file_name_from_url("https://x.org/a/b/notes.pdf"), "notes.pdf");
        assert_eq!(file_name_from_url("https://x.org/"), "download");
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.txt", 5).await.unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_is_read_with_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesson.txt");
        std::fs::write(&path, "hello").unwrap();

        let doc = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.name, "lesson.txt");
        assert_eq!(doc.kind, DocumentKind::Text);
        assert_eq!(doc.bytes, b"hello");
    }
}
