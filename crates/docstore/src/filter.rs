use crate::object_id::ObjectId;
use sqlx::{Postgres, QueryBuilder};

/// Field name that addresses the document id rather than a body field
pub const ID_FIELD: &str = "_id";

/// Selection of documents within a collection.
///
/// Field comparisons are made on the text value of a top-level body field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, String),
    In(String, Vec<String>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn is_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn by_id(id: &ObjectId) -> Self {
        Filter::Eq(ID_FIELD.to_string(), id.to_hex())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Append this filter as a SQL boolean expression
    pub(crate) fn push_sql<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        match self {
            Filter::All => {
                qb.push("TRUE");
            }
            Filter::Eq(field, value) if field == ID_FIELD => {
                qb.push("id = ");
                qb.push_bind(value.as_str());
            }
            Filter::Eq(field, value) => {
                qb.push("body ->> ");
                qb.push_bind(field.as_str());
                qb.push(" = ");
                qb.push_bind(value.as_str());
            }
            Filter::In(_, values) if values.is_empty() => {
                qb.push("FALSE");
            }
            Filter::In(field, values) if field == ID_FIELD => {
                qb.push("id = ANY(");
                qb.push_bind(values.as_slice());
                qb.push(")");
            }
            Filter::In(field, values) => {
                qb.push("body ->> ");
                qb.push_bind(field.as_str());
                qb.push(" = ANY(");
                qb.push_bind(values.as_slice());
                qb.push(")");
            }
            Filter::And(filters) if filters.is_empty() => {
                qb.push("TRUE");
            }
            Filter::And(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        qb.push(" AND ");
                    }
                    qb.push("(");
                    filter.push_sql(qb);
                    qb.push(")");
                }
            }
        }
    }
}
