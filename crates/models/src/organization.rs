use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

lazy_static::lazy_static! {
    static ref SLUG_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Create new organization request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrganization {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Derived from the name when omitted
    #[validate(length(min = 3, max = 63), regex(path = *SLUG_REGEX))]
    pub slug: Option<String>,
}

impl CreateOrganization {
    /// The slug to store: the explicit one, or one derived from the name
    pub fn effective_slug(&self) -> String {
        match &self.slug {
            Some(slug) => slug.clone(),
            None => slugify(&self.name),
        }
    }
}

/// `base` with a random six-character suffix, for when a derived slug is
/// already taken
pub fn suffixed_slug(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let mut slug: String = base.chars().take(63 - 7).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    format!("{}-{}", slug, &suffix[..6])
}

/// Lowercase ASCII letters and digits, runs of anything else collapsed to a
/// single hyphen, padded with `-org` when shorter than three characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(63);
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() < 3 {
        if slug.is_empty() {
            slug.push_str("org");
        } else {
            slug.push_str("-org");
        }
    }

    slug
}
