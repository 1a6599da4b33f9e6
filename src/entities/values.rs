//! JSON column value types shared by several entities.
//!
//! These are stored as JSON documents in a single column and decoded through
//! `FromJsonQueryResult`, so they behave like ordinary typed fields on a `Model`.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Ordered list of image URLs (product gallery, blog gallery).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageList(pub Vec<String>);

impl ImageList {
    /// Builds a list from anything yielding strings, dropping blank entries.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            urls.into_iter()
                .map(Into::into)
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
        )
    }

    /// True when there are no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A single free-form "label: value" row, e.g. `Weight: 250 g`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    /// Label shown to the customer
    pub key: String,
    /// Value shown next to the label
    pub value: String,
}

/// Product specification table, kept in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Specifications(pub Vec<Specification>);

impl Specifications {
    /// Drops rows whose key is blank and trims both sides.
    #[must_use]
    pub fn cleaned(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|spec| !spec.key.trim().is_empty())
                .map(|spec| Specification {
                    key: spec.key.trim().to_string(),
                    value: spec.value.trim().to_string(),
                })
                .collect(),
        )
    }
}

/// A variant option such as `size = L` or `pack = carton`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAttribute {
    /// Option name, e.g. `size`
    pub name: String,
    /// Chosen value, e.g. `L`
    pub value: String,
}

/// Option values distinguishing one variant from its siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct VariantAttributes(pub Vec<VariantAttribute>);

/// Free-form tags on a blog post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct TagList(pub Vec<String>);

/// One condition of a smart collection, e.g. `price less_than 100`.
///
/// Conditions are stored for the storefront to evaluate; nothing in this crate
/// interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRule {
    /// Product field the rule looks at (`"price"`, `"brand"`, `"tag"`, ...)
    pub field: String,
    /// Comparison keyword (`"equals"`, `"greater_than"`, ...)
    pub operator: String,
    /// Operand compared against the field
    pub value: String,
}

/// Rule set of a smart collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CollectionRules(pub Vec<CollectionRule>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_list_drops_blank_urls() {
        let images = ImageList::from_urls(["  https://cdn/a.jpg ", "", "   ", "https://cdn/b.jpg"]);
        assert_eq!(
            images,
            ImageList(vec![
                "https://cdn/a.jpg".to_string(),
                "https://cdn/b.jpg".to_string()
            ])
        );
    }

    #[test]
    fn test_specifications_cleaned() {
        let specs = Specifications(vec![
            Specification {
                key: " Weight ".to_string(),
                value: " 250 g".to_string(),
            },
            Specification {
                key: "  ".to_string(),
                value: "orphan".to_string(),
            },
        ])
        .cleaned();
        assert_eq!(specs.0.len(), 1);
        assert_eq!(specs.0[0].key, "Weight");
        assert_eq!(specs.0[0].value, "250 g");
    }
}
