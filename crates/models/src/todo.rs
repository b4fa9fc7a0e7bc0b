use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Todo row owned by a single user (relational store)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTodo {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// Todo document shared within an organization (document store).
///
/// `user_id` and `org_id` reference rows in the auth store and are kept as
/// plain strings, the document store knows nothing about them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub org_id: String,
}

/// Body of a create request; the caller names the organization. Content is
/// stored as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoDocument {
    pub content: String,

    pub org_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_serializes_as_underscore_id() {
        let doc = TodoDocument {
            id: "65f0c0ffee0000000000abcd".to_string(),
            content: "Write docs".to_string(),
            user_id: "u1".to_string(),
            org_id: "o1".to_string(),
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "65f0c0ffee0000000000abcd");
        assert!(value.get("id").is_none());

        let back: TodoDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
