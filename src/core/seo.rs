//! SEO completeness score.
//!
//! A fixed checklist of weighted fields adds up to a 0-100 score. Each field
//! earns its full weight when present with a sensible length, and a partial
//! weight when present but too short or too long.

use crate::entities::{blog_post, product};
use serde::Serialize;

/// The inputs the checklist looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeoFields<'a> {
    /// Product name or post title
    pub title: &'a str,
    /// Stored slug
    pub slug: &'a str,
    /// Best between 10 and 60 characters
    pub meta_title: Option<&'a str>,
    /// Best between 50 and 160 characters
    pub meta_description: Option<&'a str>,
    /// Long description or post body
    pub description: Option<&'a str>,
    /// Meta keywords
    pub keywords: Option<&'a str>,
    /// Product images, or 1 for a post with a cover image
    pub image_count: usize,
}

impl<'a> From<&'a product::Model> for SeoFields<'a> {
    fn from(product: &'a product::Model) -> Self {
        Self {
            title: &product.name,
            slug: &product.slug,
            meta_title: product.meta_title.as_deref(),
            meta_description: product.meta_description.as_deref(),
            description: product.description.as_deref(),
            keywords: product.meta_keywords.as_deref(),
            image_count: product.images.len(),
        }
    }
}

impl<'a> From<&'a blog_post::Model> for SeoFields<'a> {
    fn from(post: &'a blog_post::Model) -> Self {
        Self {
            title: &post.title,
            slug: &post.slug,
            meta_title: post.meta_title.as_deref(),
            meta_description: post.meta_description.as_deref(),
            description: Some(post.content.as_str()),
            keywords: post.meta_keywords.as_deref(),
            image_count: usize::from(post.cover_image.is_some()),
        }
    }
}

/// Coarse bucket for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeoGrade {
    /// Below 50
    Poor,
    /// 50 to 79
    Fair,
    /// 80 and above
    Good,
}

const TITLE_WEIGHT: u8 = 10;
const SLUG_WEIGHT: u8 = 10;
const META_TITLE_WEIGHT: u8 = 20;
const META_DESCRIPTION_WEIGHT: u8 = 20;
const DESCRIPTION_WEIGHT: u8 = 15;
const KEYWORDS_WEIGHT: u8 = 10;
const IMAGE_WEIGHT: u8 = 15;

const META_TITLE_RANGE: std::ops::RangeInclusive<usize> = 10..=60;
const META_DESCRIPTION_RANGE: std::ops::RangeInclusive<usize> = 50..=160;
const MIN_DESCRIPTION_CHARS: usize = 100;

fn char_len(value: Option<&str>) -> usize {
    value.map_or(0, |v| v.trim().chars().count())
}

/// Full weight inside `range`, half weight when present but outside it.
fn ranged(len: usize, range: &std::ops::RangeInclusive<usize>, weight: u8) -> u8 {
    if len == 0 {
        0
    } else if range.contains(&len) {
        weight
    } else {
        weight / 2
    }
}

/// Scores `fields` out of 100.
#[must_use]
pub fn seo_score(fields: &SeoFields<'_>) -> u8 {
    let mut score: u8 = 0;

    if !fields.title.trim().is_empty() {
        score += TITLE_WEIGHT;
    }
    if !fields.slug.trim().is_empty() {
        score += SLUG_WEIGHT;
    }
    score += ranged(char_len(fields.meta_title), &META_TITLE_RANGE, META_TITLE_WEIGHT);
    score += ranged(
        char_len(fields.meta_description),
        &META_DESCRIPTION_RANGE,
        META_DESCRIPTION_WEIGHT,
    );
    score += match char_len(fields.description) {
        0 => 0,
        len if len >= MIN_DESCRIPTION_CHARS => DESCRIPTION_WEIGHT,
        _ => DESCRIPTION_WEIGHT / 3,
    };
    if char_len(fields.keywords) > 0 {
        score += KEYWORDS_WEIGHT;
    }
    if fields.image_count > 0 {
        score += IMAGE_WEIGHT;
    }

    score.min(100)
}

/// Buckets a score for display.
#[must_use]
pub const fn seo_grade(score: u8) -> SeoGrade {
    match score {
        0..50 => SeoGrade::Poor,
        50..80 => SeoGrade::Fair,
        _ => SeoGrade::Good,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> SeoFields<'static> {
        SeoFields {
            title: "Arabica Coffee Beans",
            slug: "arabica-coffee-beans",
            meta_title: Some("Arabica Coffee Beans, 1 kg bag"),
            meta_description: Some(
                "Single-origin arabica beans roasted weekly and shipped whole in a resealable 1 kg bag.",
            ),
            description: Some(
                "Grown at altitude and roasted in small batches, these beans have notes of cocoa and \
                 red fruit. Grind just before brewing for the best cup.",
            ),
            keywords: Some("coffee, arabica, beans"),
            image_count: 2,
        }
    }

    #[test]
    fn test_complete_fields_score_full() {
        assert_eq!(seo_score(&complete()), 100);
        assert_eq!(seo_grade(100), SeoGrade::Good);
    }

    #[test]
    fn test_empty_fields_score_zero() {
        assert_eq!(seo_score(&SeoFields::default()), 0);
        assert_eq!(seo_grade(0), SeoGrade::Poor);
    }

    #[test]
    fn test_short_fields_earn_partial_weight() {
        let fields = SeoFields {
            meta_title: Some("Beans"),
            meta_description: Some("Good beans."),
            description: Some("Tasty."),
            ..complete()
        };
        // 10 + 10 + 10 + 10 + 5 + 10 + 15
        assert_eq!(seo_score(&fields), 70);
        assert_eq!(seo_grade(70), SeoGrade::Fair);
    }

    #[test]
    fn test_missing_images_and_keywords() {
        let fields = SeoFields {
            keywords: None,
            image_count: 0,
            ..complete()
        };
        assert_eq!(seo_score(&fields), 75);
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let fields = SeoFields {
            meta_title: Some("    "),
            keywords: Some("  "),
            ..complete()
        };
        assert_eq!(seo_score(&fields), 70);
    }
}
