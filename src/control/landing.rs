use crate::control::catalog::ProductCard;
use crate::control::{render_template, Response};
use crate::Settings;
use actix_web::get;
use actix_web::web::Data;
use askama::Template;
use store_api::ApiClient;
use std::cmp::Reverse;
use store_types::category::Category;
use store_types::parse_date;
use store_types::product::Product;
use url::form_urlencoded;

pub const FEATURED_PRODUCTS: usize = 8;

pub struct CategoryTile {
    pub name: String,
    pub image: String,
    pub url: String,
}

impl From<&Category> for CategoryTile {
    fn from(c: &Category) -> Self {
        let qs = form_urlencoded::Serializer::new(String::new())
            .append_pair("categoria", &c.name)
            .finish();
        Self {
            name: c.name.clone(),
            image: c.image.clone(),
            url: format!("/catalogo?{qs}"),
        }
    }
}

/// Newest products first; undated ones keep fetch order at the end.
fn featured(products: &[Product]) -> Vec<&Product> {
    let mut newest = products.iter().collect::<Vec<_>>();
    newest.sort_by_key(|p| Reverse(parse_date(&p.date)));
    newest.truncate(FEATURED_PRODUCTS);
    newest
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    categories: Vec<CategoryTile>,
    products: Vec<ProductCard>,
}

#[get("/")]
pub async fn index(api: Data<ApiClient>, settings: Data<Settings>) -> Response {
    // Each section degrades to empty on its own
    let products = api
        .products()
        .await
        .inspect_err(|err| log::warn!("Unable to load products: {err}"))
        .unwrap_or_default();
    let categories = api
        .categories()
        .await
        .inspect_err(|err| log::warn!("Unable to load categories: {err}"))
        .unwrap_or_default();

    render_template(IndexPage {
        categories: categories.iter().map(CategoryTile::from).collect(),
        products: featured(&products)
            .into_iter()
            .map(|p| ProductCard::new(p, &settings.whatsapp_number))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tile_links_into_catalog() {
        let c: Category = serde_json::from_value(serde_json::json!({
            "id": "3",
            "name": "Bolsas de mão",
            "categorySlug": "bolsas-de-mao",
            "image": "https://api/img/bolsas.webp",
        }))
        .expect("category");
        let tile = CategoryTile::from(&c);
        assert_eq!(tile.url, "/catalogo?categoria=Bolsas+de+m%C3%A3o");
        assert_eq!(tile.image, "https://api/img/bolsas.webp");
    }

    fn product(id: u64, date: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Peça {id}"),
            "date": date,
            "price": 10,
        }))
        .expect("product")
    }

    #[test]
    fn featured_products_are_newest_first() {
        let mut products = vec![
            product(1, "2024-01-10"),
            product(2, ""),
            product(3, "2024-06-01T10:00:00.000Z"),
            product(4, "2023-12-31"),
        ];
        products.extend((5..=12).map(|i| product(i, "2022-01-01")));
        let ids = featured(&products).iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 1, 4, 5, 6, 7, 8, 9]);
    }
}
