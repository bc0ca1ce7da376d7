use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Category as embedded in a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub category_slug: String,
}

impl From<&Category> for CategoryRef {
    fn from(c: &Category) -> Self {
        CategoryRef {
            id: c.id.clone(),
            name: c.name.clone(),
            category_slug: c.category_slug.clone(),
        }
    }
}

/// Body of both `POST /api/categories` and `PATCH /api/categories/edit/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDraftError {
    MissingName,
    MissingImage,
}

impl CategoryDraft {
    pub fn validate(name: &str, image: &str) -> Result<Self, CategoryDraftError> {
        let name = name.trim();
        let image = image.trim();
        if name.is_empty() {
            return Err(CategoryDraftError::MissingName);
        }
        if image.is_empty() {
            return Err(CategoryDraftError::MissingImage);
        }
        Ok(CategoryDraft {
            name: name.to_string(),
            image: image.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numeric_id_and_missing_description() {
        let json = r#"{"id": 7, "name": "Bolsas", "categorySlug": "bolsas",
            "date": "2024-01-01", "image": "https://api/img/bolsas.webp"}"#;
        let c: Category = serde_json::from_str(json).expect("category");
        assert_eq!(c.id, "7");
        assert_eq!(c.category_slug, "bolsas");
        assert_eq!(c.description, None);
    }

    #[test]
    fn draft_requires_name_and_image() {
        assert_eq!(
            CategoryDraft::validate("  ", "img"),
            Err(CategoryDraftError::MissingName)
        );
        assert_eq!(
            CategoryDraft::validate("Bolsas", ""),
            Err(CategoryDraftError::MissingImage)
        );
        assert_eq!(
            CategoryDraft::validate(" Bolsas ", "img").map(|d| d.name),
            Ok("Bolsas".to_string())
        );
    }
}
