//! Blog post entity - editorial content with its own slug and SEO metadata.

use super::values::TagList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Visible only in the back-office
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Live on the storefront
    #[sea_orm(string_value = "published")]
    Published,
}

/// Blog post database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    /// Unique identifier for the post
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Headline
    pub title: String,
    /// URL-safe identifier, unique across posts
    #[sea_orm(unique)]
    pub slug: String,
    /// Teaser shown in post listings
    pub excerpt: Option<String>,
    /// Post body
    pub content: String,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Byline
    pub author: Option<String>,
    /// Free-form tags
    pub tags: TagList,
    /// Draft or published
    pub status: PostStatus,
    /// Set the first time the post is published and kept afterwards
    pub published_at: Option<DateTimeUtc>,
    /// `<title>` override for search engines
    pub meta_title: Option<String>,
    /// Search result snippet
    pub meta_description: Option<String>,
    /// Comma-separated keywords
    pub meta_keywords: Option<String>,
    /// Completeness score 0-100
    pub seo_score: i32,
    /// When the post was created
    pub created_at: DateTimeUtc,
    /// When the post was last modified
    pub updated_at: DateTimeUtc,
}

/// Blog posts have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
