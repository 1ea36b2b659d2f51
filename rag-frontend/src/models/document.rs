use serde::{Deserialize, Deserializer, Serialize};

/// Identifies a document and the collection its chunks were indexed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub storage_path: String,
    pub collection_name: String,
}

/// Response of `GET /files/{id}`, also the row type of `GET /files/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub collection_name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub document_count: i64,
    #[serde(default)]
    pub chunk_count: i64,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub upload_date: Option<String>, // ISO-8601 as sent by the backend
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl DocumentInfo {
    /// Metadata usable for a preview, if the backend recorded where the file lives.
    pub fn to_ref(&self) -> Option<DocumentRef> {
        let storage_path = self.storage_path.as_deref().filter(|p| !p.is_empty())?;
        Some(DocumentRef {
            id: self.id.clone(),
            storage_path: storage_path.to_string(),
            collection_name: self.collection_name.clone(),
        })
    }

    pub fn display_size(&self) -> String {
        format_size(self.file_size.unwrap_or(0).max(0) as u64)
    }
}

/// Response of `GET /files/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub doc_details: Vec<DocumentInfo>,
    #[serde(rename = "TotalRecords")]
    pub total_records: u64,
}

/// Response of `POST /indexing/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub collection_name: String,
    #[serde(default)]
    pub document_count: i64,
    #[serde(default)]
    pub chunk_count: i64,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(default)]
    pub vectors_count: u64,
}

/// Response of `GET /indexing/collections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionInfo>,
}

/// File name derived from a storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName(String);

impl FileName {
    /// Last segment of `path`, accepting both `/` and `\` as separators.
    pub fn from_storage_path(path: &str) -> Self {
        let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substring from the last `.` (inclusive), original case; empty when there is no dot.
    pub fn extension(&self) -> &str {
        self.0.rfind('.').map(|i| &self.0[i..]).unwrap_or("")
    }

    pub fn is_pdf(&self) -> bool {
        self.extension().eq_ignore_ascii_case(".pdf")
    }

    pub fn mime_hint(&self) -> &'static str {
        if self.is_pdf() {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable byte count, one decimal place, 1024-based units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 10.0).round() / 10.0;

    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[exponent])
    } else {
        format!("{:.1} {}", rounded, UNITS[exponent])
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
