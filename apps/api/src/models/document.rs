use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// What a document was generated from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSource {
    Plain,
    Tailored { job_title: String, company: String },
}

/// A rendered résumé held for download. The bytes are opaque here.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub handle: Uuid,
    pub bytes: Bytes,
    pub source: DocumentSource,
    pub created_at: DateTime<Utc>,
}

/// Metadata view of a [`GeneratedDocument`], safe to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub handle: Uuid,
    pub size_bytes: usize,
    pub content_type: &'static str,
    pub source: DocumentSource,
    pub created_at: DateTime<Utc>,
}

impl GeneratedDocument {
    pub fn new(bytes: Bytes, source: DocumentSource) -> Self {
        Self {
            handle: Uuid::new_v4(),
            bytes,
            source,
            created_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self.source {
            DocumentSource::Plain => "resume.pdf",
            DocumentSource::Tailored { .. } => "tailored_resume.pdf",
        }
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            handle: self.handle,
            size_bytes: self.bytes.len(),
            content_type: PDF_CONTENT_TYPE,
            source: self.source.clone(),
            created_at: self.created_at,
        }
    }
}
