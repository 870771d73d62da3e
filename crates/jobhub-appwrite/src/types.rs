//! Appwrite REST API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Appwrite stops counting `total` at this many documents.
pub const COUNT_CAP: u64 = 5000;

/// Largest page Appwrite serves in a single list call that we ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// ID placeholder asking Appwrite to generate a document id.
pub const UNIQUE_ID: &str = "unique()";

/// Appwrite document envelope: system attributes plus user attributes `T`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "$collectionId", default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,

    #[serde(rename = "$databaseId", default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,

    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,

    #[serde(flatten)]
    pub data: T,
}

/// List documents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T> {
    /// Matching documents, capped by Appwrite at [`COUNT_CAP`].
    pub total: u64,
    pub documents: Vec<Document<T>>,
}

/// Request to create a document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest<'a, T> {
    pub document_id: &'a str,
    pub data: &'a T,
}

/// Request to update a document (merge of the given attributes).
#[derive(Debug, Clone, Serialize)]
pub struct UpdateDocumentRequest<'a, T> {
    pub data: &'a T,
}

/// Appwrite custom ids: at most 36 chars of `a-zA-Z0-9._-`, not starting
/// with a special character.
pub fn is_valid_document_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    id.len() <= 36 && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Attrs {
        title: String,
    }

    #[test]
    fn test_document_envelope_parses_system_fields() {
        let doc: Document<Attrs> = serde_json::from_value(json!({
            "$id": "abc",
            "$collectionId": "jobs",
            "$databaseId": "main",
            "$createdAt": "2025-01-02T03:04:05.000+00:00",
            "$updatedAt": "2025-01-03T03:04:05.000+00:00",
            "$permissions": [],
            "title": "Rust Engineer"
        }))
        .unwrap();

        assert_eq!(doc.id, "abc");
        assert_eq!(doc.data.title, "Rust Engineer");
        assert!(doc.created_at.unwrap() < doc.updated_at.unwrap());
    }

    #[test]
    fn test_document_id_rules() {
        assert!(is_valid_document_id("64f1c0ffee"));
        assert!(is_valid_document_id("user_1.a-b"));
        assert!(!is_valid_document_id(""));
        assert!(!is_valid_document_id("_leading"));
        assert!(!is_valid_document_id("has space"));
        assert!(!is_valid_document_id(&"a".repeat(37)));
    }

    #[test]
    fn test_create_request_shape() {
        let data = json!({"title": "x"});
        let body = serde_json::to_value(CreateDocumentRequest {
            document_id: UNIQUE_ID,
            data: &data,
        })
        .unwrap();
        assert_eq!(body, json!({"documentId": "unique()", "data": {"title": "x"}}));
    }
}
