use crate::error::{DocStoreError, Result};
use crate::filter::{Filter, ID_FIELD};
use crate::object_id::ObjectId;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;

/// A named set of JSON documents deserialized as `T`.
///
/// Stored bodies always carry their id under `_id`.
pub struct Collection<T> {
    pool: PgPool,
    namespace: String,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Send + Unpin,
{
    pub(crate) fn new(pool: PgPool, namespace: String, name: String) -> Self {
        Self {
            pool,
            namespace,
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a document and return its id. A valid `_id` already present in
    /// the document is kept, otherwise a fresh one is assigned.
    pub async fn insert_one<D: Serialize>(&self, doc: &D) -> Result<ObjectId> {
        let (id, body) = prepare_document(doc)?;

        sqlx::query(
            r#"
            INSERT INTO documents (namespace, collection, id, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&self.namespace)
        .bind(&self.name)
        .bind(id.to_hex())
        .bind(sqlx::types::Json(&body))
        .execute(&self.pool)
        .await?;

        tracing::trace!(collection = %self.name, id = %id, "Inserted document");
        Ok(id)
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        let mut docs = self.find(filter, Some(1)).await?;
        Ok(docs.pop())
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<T>> {
        self.find_one(&Filter::by_id(id)).await
    }

    /// Matching documents in insertion order, at most `limit` of them
    pub async fn find(&self, filter: &Filter, limit: Option<i64>) -> Result<Vec<T>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE ");
        self.push_scope(&mut qb, filter);
        qb.push(" ORDER BY seq ASC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }

        let rows: Vec<sqlx::types::Json<Value>> =
            qb.build_query_scalar().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row.0).map_err(DocStoreError::from))
            .collect()
    }

    pub async fn count(&self, filter: &Filter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents WHERE ");
        self.push_scope(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Delete the first matching document, returning how many were removed (0 or 1)
    pub async fn delete_one(&self, filter: &Filter) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "DELETE FROM documents WHERE (namespace, collection, id) IN (SELECT namespace, collection, id FROM documents WHERE ",
        );
        self.push_scope(&mut qb, filter);
        qb.push(" ORDER BY seq ASC LIMIT 1)");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete every matching document, returning how many were removed
    pub async fn delete_many(&self, filter: &Filter) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE ");
        self.push_scope(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    fn push_scope<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>, filter: &'a Filter) {
        qb.push("namespace = ");
        qb.push_bind(self.namespace.as_str());
        qb.push(" AND collection = ");
        qb.push_bind(self.name.as_str());
        qb.push(" AND (");
        filter.push_sql(qb);
        qb.push(")");
    }
}

/// Serialize `doc` into an object body and settle its `_id`
fn prepare_document<D: Serialize>(doc: &D) -> Result<(ObjectId, Value)> {
    let mut body = serde_json::to_value(doc)?;
    let object = body.as_object_mut().ok_or(DocStoreError::NotAnObject)?;

    let id = match object.get(ID_FIELD).and_then(Value::as_str) {
        Some(existing) if ObjectId::is_valid(existing) => ObjectId::parse(existing)?,
        _ => ObjectId::new(),
    };
    object.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));

    Ok((id, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, DocumentStoreConfig};
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_prepare_document_assigns_id() {
        let (id, body) = prepare_document(&json!({ "content": "a" })).unwrap();
        assert_eq!(body["_id"], id.to_hex());
        assert_eq!(body["content"], "a");
    }

    #[test]
    fn test_prepare_document_keeps_valid_id() {
        let (id, body) =
            prepare_document(&json!({ "_id": "65f0c0ffee0000000000abcd", "content": "a" }))
                .unwrap();
        assert_eq!(id.to_hex(), "65f0c0ffee0000000000abcd");
        assert_eq!(body["_id"], "65f0c0ffee0000000000abcd");
    }

    #[test]
    fn test_prepare_document_replaces_invalid_id() {
        let (id, body) = prepare_document(&json!({ "_id": "nope" })).unwrap();
        assert_ne!(id.to_hex(), "nope");
        assert_eq!(body["_id"], id.to_hex());
    }

    #[test]
    fn test_prepare_document_rejects_non_objects() {
        assert!(matches!(
            prepare_document(&json!(["a", "b"])),
            Err(DocStoreError::NotAnObject)
        ));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        owner: String,
        text: String,
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_collection_round_trip() {
        let mut config = DocumentStoreConfig::from_env();
        config.database = format!("test_{}", ObjectId::new());
        let store = DocumentStore::connect(config).await.unwrap();
        let notes = store.collection::<Note>("notes");

        let first = notes
            .insert_one(&json!({ "owner": "alice", "text": "one" }))
            .await
            .unwrap();
        notes
            .insert_one(&json!({ "owner": "alice", "text": "two" }))
            .await
            .unwrap();
        notes
            .insert_one(&json!({ "owner": "bob", "text": "three" }))
            .await
            .unwrap();

        let found = notes.find_by_id(&first).await.unwrap().unwrap();
        assert_eq!(found.text, "one");

        let alice = notes.find(&Filter::eq("owner", "alice"), None).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].text, "one");

        let both = notes
            .find(&Filter::is_in("owner", ["alice", "bob"]), Some(2))
            .await
            .unwrap();
        assert_eq!(both.len(), 2);

        assert_eq!(notes.delete_many(&Filter::eq("owner", "alice")).await.unwrap(), 2);
        assert_eq!(notes.count(&Filter::All).await.unwrap(), 1);
        assert_eq!(notes.delete_one(&Filter::All).await.unwrap(), 1);
        assert_eq!(notes.delete_one(&Filter::All).await.unwrap(), 0);
    }
}
