use crate::category::{Category, CategoryRef};
use crate::{encode_uri, fold};
use crate::price::{self, Price};
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::field_attributes::{deserialize_default_from_null, deserialize_number_from_string};

pub const MIN_FIELD_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "category_names")]
    pub categories: Vec<String>,
    pub price: Price,
    #[serde(default)]
    pub size: String,
    #[serde(default, deserialize_with = "price::deserialize_optional")]
    pub discount_price: Option<Price>,
}

impl Product {
    pub fn has_category(&self, folded_name: &str) -> bool {
        self.categories.iter().any(|c| fold(c) == folded_name)
    }

    /// Price the shopper actually pays.
    pub fn effective_price(&self) -> Price {
        self.discount_price.unwrap_or(self.price)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryName {
    Name(String),
    Ref { name: String },
}

/// Product categories come back either as plain names or as the
/// `{id, name, categorySlug}` objects used when creating a product.
fn category_names<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    let names = Option::<Vec<CategoryName>>::deserialize(de)?.unwrap_or_default();
    Ok(names
        .into_iter()
        .map(|c| match c {
            CategoryName::Name(n) => n,
            CategoryName::Ref { name } => name,
        })
        .collect())
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub size: String,
    pub price: Price,
    pub images: Vec<String>,
    pub categories: Vec<CategoryRef>,
}

/// Body of `PATCH /api/products/edit/{slug}`. Categories go by name here.
#[derive(Debug, Clone, Serialize)]
pub struct ProductUpdate {
    pub name: String,
    pub size: String,
    pub price: Price,
    pub images: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: &'static str,
}

/// Validated contents of the dashboard product form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub size: String,
    pub price: Price,
    pub images: Vec<String>,
    pub categories: Vec<String>,
}

impl ProductDraft {
    pub fn validate(
        name: &str,
        size: &str,
        price: &str,
        images: Vec<String>,
        categories: Vec<String>,
    ) -> Result<Self, Vec<FieldError>> {
        let mut errors = vec![];
        let name = name.trim();
        let size = size.trim();
        let price_raw = price.trim();
        if name.chars().count() < MIN_FIELD_LENGTH {
            errors.push(FieldError {
                field: "name",
                msg: "Título deve possuir pelo menos 2 caracteres.",
            });
        }
        if size.chars().count() < MIN_FIELD_LENGTH {
            errors.push(FieldError {
                field: "size",
                msg: "Tamanho deve possuir pelo menos 2 caracteres.",
            });
        }
        let price = if price_raw.chars().count() < MIN_FIELD_LENGTH {
            errors.push(FieldError {
                field: "price",
                msg: "Preço deve possuir pelo menos 2 caracteres.",
            });
            None
        } else {
            match price_raw.parse::<Price>() {
                Ok(p) => Some(p),
                Err(_) => {
                    errors.push(FieldError {
                        field: "price",
                        msg: "Preço inválido.",
                    });
                    None
                }
            }
        };
        let images = images
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect::<Vec<_>>();
        if images.is_empty() {
            errors.push(FieldError {
                field: "images",
                msg: "Deve existir pelo menos uma imagem.",
            });
        }
        match price {
            Some(price) if errors.is_empty() => Ok(ProductDraft {
                name: name.to_string(),
                size: size.to_string(),
                price,
                images,
                categories,
            }),
            _ => Err(errors),
        }
    }

    /// Resolves selected category names against the known categories;
    /// unknown names are dropped.
    pub fn into_new(self, known: &[Category]) -> NewProduct {
        let categories = self
            .categories
            .iter()
            .filter_map(|selected| {
                known
                    .iter()
                    .find(|c| &c.category_slug == selected || &c.name == selected)
                    .map(CategoryRef::from)
            })
            .collect();
        NewProduct {
            name: self.name,
            size: self.size,
            price: self.price,
            images: self.images.iter().map(|i| encode_uri(i)).collect(),
            categories,
        }
    }

    pub fn into_update(self) -> ProductUpdate {
        ProductUpdate {
            name: self.name,
            size: self.size,
            price: self.price,
            images: self.images.iter().map(|i| encode_uri(i)).collect(),
            categories: self.categories,
        }
    }
}
