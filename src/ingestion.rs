//! Document ingestion: uploaded files and fetched URLs.
//!
//! File blobs are staged in a named temporary file (removed on every exit
//! path) and handed to an external [`DocumentConverter`] for text
//! extraction; markdown is read directly. URLs are fetched over HTTP and
//! reduced to text with an HTML parser. URL failures are reported and
//! yield an empty result so the rest of an ingestion batch can proceed.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::document::Document;
use crate::error::{RagChatError, Result};

/// File extensions accepted for upload.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["pdf", "docx", "pptx", "md", "png", "jpeg", "jpg", "webp"];

/// An uploaded file: a raw blob plus the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The original file name; its extension selects the conversion path
    /// and the name becomes the document's `source`.
    pub name: String,
    /// The raw file content.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file from a name and its content.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// An external service that converts a staged file into markdown text.
///
/// The converter owns parsing, layout analysis, and OCR; this crate only
/// stages the blob and tags the result with its source.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert the file at `path` into markdown text.
    async fn convert(&self, path: &Path) -> Result<String>;
}

/// A [`DocumentConverter`] backed by an HTTP conversion service.
///
/// Posts the staged file as a multipart form to `{base_url}/convert` and
/// expects a JSON body with a `markdown` field.
pub struct ConvertServiceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ConvertResponse {
    markdown: String,
}

impl ConvertServiceClient {
    /// Create a client for the conversion service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn err(source_name: &str, message: impl Into<String>) -> RagChatError {
        RagChatError::Ingestion { source_name: source_name.to_string(), message: message.into() }
    }
}

#[async_trait]
impl DocumentConverter for ConvertServiceClient {
    async fn convert(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Self::err(&name, format!("failed to read staged file: {e}")))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/convert", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::err(&name, format!("conversion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::err(&name, format!("conversion service returned {status}: {body}")));
        }

        let converted: ConvertResponse = response
            .json()
            .await
            .map_err(|e| Self::err(&name, format!("failed to parse conversion response: {e}")))?;

        Ok(converted.markdown)
    }
}

/// Turns uploaded files and URLs into [`Document`]s tagged with their source.
pub struct Ingestor {
    converter: std::sync::Arc<dyn DocumentConverter>,
    client: reqwest::Client,
}

impl Ingestor {
    /// Create an ingestor delegating file conversion to `converter`.
    pub fn new(converter: std::sync::Arc<dyn DocumentConverter>) -> Self {
        Self { converter, client: reqwest::Client::new() }
    }

    /// The lowercased extension of `name`, if it is a supported upload type.
    pub fn supported_extension(name: &str) -> Option<String> {
        let ext = Path::new(name).extension()?.to_string_lossy().to_lowercase();
        SUPPORTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Ingest one uploaded file into zero or more documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagChatError::Ingestion`] for unsupported extensions or
    /// converter failures. Unlike URL ingestion, file failures propagate.
    pub async fn ingest_file(&self, file: &UploadedFile) -> Result<Vec<Document>> {
        let ext = Self::supported_extension(&file.name).ok_or_else(|| RagChatError::Ingestion {
            source_name: file.name.clone(),
            message: format!(
                "unsupported file extension (supported: {})",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        })?;

        // Markdown needs no conversion.
        if ext == "md" {
            let text = String::from_utf8_lossy(&file.bytes).into_owned();
            debug!(source = %file.name, bytes = file.bytes.len(), "ingested markdown file");
            return Ok(vec![Document::new(text, &file.name)]);
        }

        // Stage the blob for the converter; the temp file is removed on
        // drop, including converter failure.
        let mut tmp = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .map_err(|e| RagChatError::Ingestion {
                source_name: file.name.clone(),
                message: format!("failed to create temporary file: {e}"),
            })?;
        tmp.write_all(&file.bytes).map_err(|e| RagChatError::Ingestion {
            source_name: file.name.clone(),
            message: format!("failed to write temporary file: {e}"),
        })?;

        let text = self.converter.convert(tmp.path()).await?;
        debug!(source = %file.name, chars = text.len(), "converted uploaded file");

        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Document::new(text, &file.name)])
    }

    /// Ingest a batch of uploaded files.
    pub async fn ingest_files(&self, files: &[UploadedFile]) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for file in files {
            docs.extend(self.ingest_file(file).await?);
        }
        Ok(docs)
    }

    /// Fetch a URL and extract its text content.
    ///
    /// Fetch or extraction failures are reported with a warning and yield
    /// an empty `Vec`; they never fail the caller's batch.
    pub async fn ingest_url(&self, url: &str) -> Vec<Document> {
        match self.fetch_and_extract(url).await {
            Ok(text) if !text.is_empty() => {
                debug!(source = url, chars = text.len(), "ingested url");
                vec![Document::new(text, url)]
            }
            Ok(_) => {
                warn!(source = url, "url yielded no text content");
                Vec::new()
            }
            Err(e) => {
                warn!(source = url, error = %e, "failed to ingest url");
                Vec::new()
            }
        }
    }

    async fn fetch_and_extract(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| RagChatError::Ingestion {
            source_name: url.to_string(),
            message: format!("invalid url: {e}"),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RagChatError::Ingestion {
                source_name: url.to_string(),
                message: format!("fetch failed: {e}"),
            })?;

        let body = response.text().await.map_err(|e| RagChatError::Ingestion {
            source_name: url.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;

        Ok(extract_text(&body))
    }
}

/// Reduce an HTML page to its visible text, one line per text node.
///
/// Text inside `script`, `style`, and `noscript` elements is dropped.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut out = String::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let skipped = node
                .parent()
                .and_then(|p| p.value().as_element().map(|el| {
                    matches!(el.name(), "script" | "style" | "noscript")
                }))
                .unwrap_or(false);
            if skipped {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingConverter;

    #[async_trait]
    impl DocumentConverter for FailingConverter {
        async fn convert(&self, _path: &Path) -> Result<String> {
            Err(RagChatError::Ingestion {
                source_name: "converter".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct EchoConverter;

    #[async_trait]
    impl DocumentConverter for EchoConverter {
        async fn convert(&self, path: &Path) -> Result<String> {
            Ok(std::fs::read_to_string(path).unwrap_or_default())
        }
    }

    #[test]
    fn extension_whitelist() {
        assert_eq!(Ingestor::supported_extension("report.PDF"), Some("pdf".to_string()));
        assert_eq!(Ingestor::supported_extension("notes.md"), Some("md".to_string()));
        assert_eq!(Ingestor::supported_extension("photo.webp"), Some("webp".to_string()));
        assert!(Ingestor::supported_extension("archive.zip").is_none());
        assert!(Ingestor::supported_extension("no_extension").is_none());
    }

    #[tokio::test]
    async fn rejects_unsupported_extension_before_conversion() {
        let ingestor = Ingestor::new(std::sync::Arc::new(FailingConverter));
        let err = ingestor
            .ingest_file(&UploadedFile::new("data.csv", b"a,b".to_vec()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"));
    }

    #[tokio::test]
    async fn markdown_bypasses_converter() {
        let ingestor = Ingestor::new(std::sync::Arc::new(FailingConverter));
        let docs = ingestor
            .ingest_file(&UploadedFile::new("notes.md", b"# Title\nBody".to_vec()))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "# Title\nBody");
        assert_eq!(docs[0].source(), "notes.md");
    }

    #[tokio::test]
    async fn staged_file_reaches_converter() {
        let ingestor = Ingestor::new(std::sync::Arc::new(EchoConverter));
        let docs = ingestor
            .ingest_file(&UploadedFile::new("scan.pdf", b"raw pdf bytes".to_vec()))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "raw pdf bytes");
        assert_eq!(docs[0].source(), "scan.pdf");
    }

    #[tokio::test]
    async fn converter_failure_propagates() {
        let ingestor = Ingestor::new(std::sync::Arc::new(FailingConverter));
        let err = ingestor
            .ingest_file(&UploadedFile::new("scan.pdf", b"raw".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, RagChatError::Ingestion { .. }));
    }

    #[tokio::test]
    async fn bad_url_yields_empty_result() {
        let ingestor = Ingestor::new(std::sync::Arc::new(FailingConverter));
        assert!(ingestor.ingest_url("not a url").await.is_empty());
    }

    #[test]
    fn html_extraction_skips_scripts() {
        let html = "<html><head><style>p{}</style></head>\
                    <body><p>Hello</p><script>var x=1;</script><p>World</p></body></html>";
        let text = extract_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("p{}"));
    }
}
