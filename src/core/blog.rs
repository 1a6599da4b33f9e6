//! Blog business logic.

use crate::{
    core::{
        seo::{SeoFields, seo_score},
        slug::{base_slug, unique_slug},
    },
    entities::{BlogPost, PostStatus, blog_post, values::TagList},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Blog post fields as submitted from the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPostForm {
    /// `None` creates a new post
    pub id: Option<i64>,
    /// Headline, required
    pub title: String,
    /// Explicit slug; derived from `title` when absent
    pub slug: Option<String>,
    /// Teaser shown in post listings
    pub excerpt: Option<String>,
    /// Post body
    pub content: String,
    /// Image URL, counts as the post image for SEO
    pub cover_image: Option<String>,
    /// Byline
    pub author: Option<String>,
    /// Free-form tags; blanks and case-insensitive duplicates are dropped
    pub tags: Vec<String>,
    /// Publishing with empty content is rejected
    pub status: PostStatus,
    /// `<title>` override for search engines
    pub meta_title: Option<String>,
    /// Search result snippet
    pub meta_description: Option<String>,
    /// Comma-separated keywords
    pub meta_keywords: Option<String>,
}

impl BlogPostForm {
    /// A draft with a title and body.
    pub fn draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            slug: None,
            excerpt: None,
            content: content.into(),
            cover_image: None,
            author: None,
            tags: Vec::new(),
            status: PostStatus::Draft,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
        }
    }
}

fn ensure_publishable(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::validation("Cannot publish a post without content"));
    }
    Ok(())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Tags trimmed, blanks dropped, duplicates removed ignoring case.
fn clean_tags(tags: Vec<String>) -> TagList {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            cleaned.push(tag);
        }
    }
    TagList(cleaned)
}

/// Creates or updates a post.
///
/// `published_at` is stamped the first time a post is saved as published and
/// kept through later edits and unpublishing.
///
/// # Errors
/// Returns `Validation` for a blank title or publishing without content,
/// `NotFound` when updating an unknown post, or a database error.
#[instrument(skip(db, form), fields(post = %form.title.trim()))]
pub async fn save_post(db: &DatabaseConnection, form: BlogPostForm) -> Result<blog_post::Model> {
    if form.title.trim().is_empty() {
        return Err(Error::validation("Post title cannot be empty"));
    }
    if form.status == PostStatus::Published {
        ensure_publishable(&form.content)?;
    }
    let base = base_slug(form.slug.as_deref(), &form.title)?;

    let txn = db.begin().await?;
    let slug = unique_slug::<BlogPost, _>(&txn, &base, form.id).await?;
    let now = Utc::now();

    let (mut active, published_at) = match form.id {
        Some(id) => {
            let existing = BlogPost::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| Error::not_found("blog post", id))?;
            let published_at = existing.published_at;
            (blog_post::ActiveModel::from(existing), published_at)
        }
        None => (
            blog_post::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
            None,
        ),
    };

    let published_at = match form.status {
        PostStatus::Published => published_at.or(Some(now)),
        PostStatus::Draft => published_at,
    };

    let mut model = blog_post::Model {
        id: form.id.unwrap_or_default(),
        title: form.title.trim().to_string(),
        slug,
        excerpt: clean(form.excerpt),
        content: form.content,
        cover_image: clean(form.cover_image),
        author: clean(form.author),
        tags: clean_tags(form.tags),
        status: form.status,
        published_at,
        meta_title: clean(form.meta_title),
        meta_description: clean(form.meta_description),
        meta_keywords: clean(form.meta_keywords),
        seo_score: 0,
        created_at: now,
        updated_at: now,
    };
    model.seo_score = i32::from(seo_score(&SeoFields::from(&model)));

    active.title = Set(model.title);
    active.slug = Set(model.slug);
    active.excerpt = Set(model.excerpt);
    active.content = Set(model.content);
    active.cover_image = Set(model.cover_image);
    active.author = Set(model.author);
    active.tags = Set(model.tags);
    active.status = Set(model.status);
    active.published_at = Set(model.published_at);
    active.meta_title = Set(model.meta_title);
    active.meta_description = Set(model.meta_description);
    active.meta_keywords = Set(model.meta_keywords);
    active.seo_score = Set(model.seo_score);
    active.updated_at = Set(now);

    let saved = if form.id.is_some() {
        active.update(&txn).await?
    } else {
        active.insert(&txn).await?
    };

    txn.commit().await?;
    info!("Saved blog post {} '{}' ({:?})", saved.id, saved.slug, saved.status);
    Ok(saved)
}

/// Posts newest first, optionally only those with `status`.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn list_posts(
    db: &DatabaseConnection,
    status: Option<PostStatus>,
) -> Result<Vec<blog_post::Model>> {
    let mut query = BlogPost::find();
    if let Some(status) = status {
        query = query.filter(blog_post::Column::Status.eq(status));
    }
    query
        .order_by_desc(blog_post::Column::CreatedAt)
        .order_by_desc(blog_post::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn set_status(
    db: &DatabaseConnection,
    post_id: i64,
    status: PostStatus,
) -> Result<blog_post::Model> {
    let post = BlogPost::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("blog post", post_id))?;
    if status == PostStatus::Published {
        ensure_publishable(&post.content)?;
    }

    let now = Utc::now();
    let published_at = post.published_at;
    let mut active: blog_post::ActiveModel = post.into();
    active.status = Set(status);
    if status == PostStatus::Published && published_at.is_none() {
        active.published_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}

/// Publishes a post, stamping `published_at` if it was never published.
///
/// # Errors
/// Returns `NotFound` for an unknown post and `Validation` when the post has
/// no content.
pub async fn publish_post(db: &DatabaseConnection, post_id: i64) -> Result<blog_post::Model> {
    set_status(db, post_id, PostStatus::Published).await
}

/// Moves a post back to draft. `published_at` is kept.
///
/// # Errors
/// Returns `NotFound` for an unknown post.
pub async fn unpublish_post(db: &DatabaseConnection, post_id: i64) -> Result<blog_post::Model> {
    set_status(db, post_id, PostStatus::Draft).await
}

/// Deletes a post.
///
/// # Errors
/// Returns `NotFound` if no post was deleted.
pub async fn delete_post(db: &DatabaseConnection, post_id: i64) -> Result<()> {
    let result = BlogPost::delete_by_id(post_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("blog post", post_id));
    }
    info!("Deleted blog post {post_id}");
    Ok(())
}
