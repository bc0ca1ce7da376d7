use crate::control::{page_links, render_template, ControllerError, PageLink, Response};
use crate::Settings;
use actix_web::get;
use actix_web::web::Data;
use actix_web::HttpRequest;
use askama::Template;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use store_api::ApiClient;
use store_types::catalog::CatalogView;
use store_types::fold;
use store_types::price::{Brl, Price};
use store_types::product::Product;
use url::form_urlencoded;

const TEXT_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Catalog filter state as carried in the page URL.
///
/// `categoria` is the navigation category coming from a category link,
/// every `categorias` value is a ticked checkbox, `q` is the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub categoria: Option<String>,
    pub categorias: Vec<String>,
    pub q: String,
    pub page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            categoria: None,
            categorias: vec![],
            q: String::new(),
            page: 1,
        }
    }
}

impl CatalogQuery {
    pub fn parse(query: &str) -> Result<Self, ControllerError> {
        let mut parsed = CatalogQuery::default();
        let mut seen = vec![];
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "categoria" => {
                    let value = value.trim();
                    parsed.categoria = (!value.is_empty()).then(|| value.to_string());
                }
                "categorias" => {
                    let value = value.trim();
                    let folded = fold(value);
                    if !value.is_empty() && !seen.contains(&folded) {
                        seen.push(folded);
                        parsed.categorias.push(value.to_string());
                    }
                }
                "q" => parsed.q = value.into_owned(),
                "page" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        parsed.page =
                            value
                                .parse()
                                .map_err(|_| ControllerError::InvalidInput {
                                    field: "page".to_string(),
                                    msg: format!("{value:?} is not a page number"),
                                })?;
                    }
                }
                _ => (),
            }
        }
        Ok(parsed)
    }

    /// Replays the URL state onto a freshly loaded view: navigation
    /// category, then checkbox toggles, then search, then the page.
    pub fn apply(&self, view: &mut CatalogView) {
        view.set_category_filter_from_link(self.categoria.as_deref());
        for name in &self.categorias {
            view.toggle_category(name);
        }
        view.set_search_term(&self.q);
        view.go_to_page(self.page);
    }

    pub fn to_query_string(&self, page: usize) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(c) = &self.categoria {
            serializer.append_pair("categoria", c);
        }
        for c in &self.categorias {
            serializer.append_pair("categorias", c);
        }
        if !self.q.trim().is_empty() {
            serializer.append_pair("q", &self.q);
        }
        if page > 1 {
            serializer.append_pair("page", &page.to_string());
        }
        serializer.finish()
    }

    pub fn url(&self, page: usize) -> String {
        let qs = self.to_query_string(page);
        if qs.is_empty() {
            "/catalogo".to_string()
        } else {
            format!("/catalogo?{qs}")
        }
    }
}

/// `https://wa.me/<number>?text=...` link that opens a chat with the
/// order message already typed in.
pub fn whatsapp_link(number: &str, name: &str, price: &Price) -> String {
    let text = format!(
        "Olá! Gostaria de encomendar o produto: *{name}* por R${}",
        price.brl().amount()
    );
    format!(
        "https://wa.me/{number}?text={}",
        utf8_percent_encode(&text, TEXT_PARAM)
    )
}

pub struct ProductCard {
    pub name: String,
    pub images: Vec<String>,
    pub categories: Vec<String>,
    pub size: String,
    pub price: Brl,
    pub discount_price: Option<Brl>,
    pub order_url: String,
}

impl ProductCard {
    pub fn new(product: &Product, whatsapp_number: &str) -> Self {
        Self {
            name: product.name.clone(),
            images: product.images.clone(),
            categories: product.categories.clone(),
            size: product.size.clone(),
            price: product.price.brl(),
            discount_price: product.discount_price.map(|p| p.brl()),
            order_url: whatsapp_link(whatsapp_number, &product.name, &product.effective_price()),
        }
    }
}

pub struct CategoryOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "catalog.html")]
pub struct CatalogPage {
    categories: Vec<CategoryOption>,
    link_category: Option<String>,
    search: String,
    cards: Vec<ProductCard>,
    page_links: Vec<PageLink>,
    filtered_count: usize,
    load_failed: bool,
    clear_url: String,
}

impl CatalogPage {
    fn new(view: &CatalogView, query: &CatalogQuery, whatsapp_number: &str, load_failed: bool) -> Self {
        let categories = view
            .categories()
            .iter()
            .map(|c| CategoryOption {
                name: c.name.clone(),
                selected: view.is_selected(&c.name),
            })
            .collect();
        let cards = view
            .current_page_items()
            .into_iter()
            .map(|p| ProductCard::new(p, whatsapp_number))
            .collect();
        let page_links = page_links(view.current_page(), view.page_count(), |p| query.url(p));
        Self {
            categories,
            link_category: view.filter().link_category().map(str::to_string),
            search: view.filter().search_term().to_string(),
            cards,
            page_links,
            filtered_count: view.filtered_count(),
            load_failed,
            clear_url: "/catalogo".to_string(),
        }
    }
}

#[get("/catalogo")]
pub async fn catalog(
    req: HttpRequest,
    api: Data<ApiClient>,
    settings: Data<Settings>,
) -> Response {
    let query = CatalogQuery::parse(req.query_string())?;
    let (mut view, load_failed) = match api.catalog().await {
        Ok((products, categories)) => (CatalogView::load(products, categories), false),
        Err(err) => {
            log::warn!("Unable to load catalog: {err}");
            (CatalogView::default(), true)
        }
    };
    query.apply(&mut view);
    render_template(CatalogPage::new(
        &view,
        &query,
        &settings.whatsapp_number,
        load_failed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_types::category::Category;

    fn product(id: u64, name: &str, categories: &[&str], price: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "date": "2024-05-01",
            "images": [format!("https://api/img/{id}.webp")],
            "categories": categories,
            "price": price,
            "size": "20cm",
        }))
        .expect("product")
    }

    fn category(name: &str) -> Category {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": name,
            "categorySlug": name.to_lowercase(),
        }))
        .expect("category")
    }

    fn view(count: u64) -> CatalogView {
        let products = (1..=count)
            .map(|i| {
                let cat = if i % 2 == 0 { "Bolsas" } else { "Chaveiros" };
                product(i, &format!("Peça {i}"), &[cat], "49.90")
            })
            .collect();
        CatalogView::load(products, vec![category("Bolsas"), category("Chaveiros")])
    }

    #[test]
    fn parses_repeated_categories_and_page() {
        let q = CatalogQuery::parse("categoria=Bolsas&categorias=Bolsas&categorias=Chaveiros&q=azul&page=2")
            .expect("query");
        assert_eq!(q.categoria.as_deref(), Some("Bolsas"));
        assert_eq!(q.categorias, ["Bolsas", "Chaveiros"]);
        assert_eq!(q.q, "azul");
        assert_eq!(q.page, 2);
    }

    #[test]
    fn repeated_checkbox_is_selected_once() {
        let q = CatalogQuery::parse("categorias=Bolsas&categorias=b%C3%B4lsas").expect("query");
        assert_eq!(q.categorias, ["Bolsas"]);
    }

    #[test]
    fn blank_values_are_ignored() {
        let q = CatalogQuery::parse("categoria=+&categorias=&page=").expect("query");
        assert_eq!(q, CatalogQuery::default());
    }

    #[test]
    fn rejects_non_numeric_page() {
        assert!(matches!(
            CatalogQuery::parse("page=dois"),
            Err(ControllerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn query_string_round_trips() {
        let q = CatalogQuery {
            categoria: Some("Bolsas de mão".to_string()),
            categorias: vec!["Chaveiros".to_string()],
            q: "azul".to_string(),
            page: 1,
        };
        let qs = q.to_query_string(3);
        let parsed = CatalogQuery::parse(&qs).expect("query");
        assert_eq!(parsed.page, 3);
        assert_eq!(parsed.categoria, q.categoria);
        assert_eq!(parsed.categorias, q.categorias);
        assert_eq!(parsed.q, q.q);
        assert_eq!(CatalogQuery::default().url(1), "/catalogo");
    }

    #[test]
    fn apply_resets_then_jumps_to_requested_page() {
        let mut v = view(14);
        let q = CatalogQuery {
            categorias: vec!["Bolsas".to_string()],
            page: 2,
            ..CatalogQuery::default()
        };
        q.apply(&mut v);
        assert_eq!(v.filtered_count(), 7);
        assert_eq!(v.current_page(), 2);
        assert_eq!(v.current_page_items().len(), 1);
    }

    #[test]
    fn pagination_links_keep_filters() {
        let mut v = view(20);
        let q = CatalogQuery::parse("q=pe%C3%A7a").expect("query");
        q.apply(&mut v);
        let page = CatalogPage::new(&v, &q, "5500", false);
        assert_eq!(page.page_links.len(), 4);
        assert_eq!(page.cards.len(), 6);
        assert!(page.page_links[0].current);
        assert_eq!(
            page.page_links[3].url.as_deref(),
            Some("/catalogo?q=pe%C3%A7a&page=4")
        );
    }

    #[test]
    fn load_failure_is_not_an_empty_result() {
        let v = CatalogView::default();
        let page = CatalogPage::new(&v, &CatalogQuery::default(), "5500", true);
        assert!(page.load_failed);
        assert_eq!(page.filtered_count, 0);
        assert!(page.page_links.is_empty());
    }

    #[test]
    fn checkbox_state_reflects_selection() {
        let mut v = view(4);
        CatalogQuery::parse("categorias=chaveiros")
            .expect("query")
            .apply(&mut v);
        let page = CatalogPage::new(&v, &CatalogQuery::default(), "5500", false);
        let selected = page
            .categories
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(selected, ["Chaveiros"]);
    }

    #[test]
    fn whatsapp_link_encodes_order_message() {
        let p = product(1, "Bolsa Azul", &["Bolsas"], "1234.5");
        let link = whatsapp_link("559392385511", &p.name, &p.effective_price());
        assert_eq!(
            link,
            "https://wa.me/559392385511?text=Ol%C3%A1%21%20Gostaria%20de%20encomendar%20o%20produto%3A%20%2ABolsa%20Azul%2A%20por%20R%241.234%2C50"
        );
    }

    #[test]
    fn card_orders_at_discounted_price() {
        let mut p = product(1, "Chaveiro", &["Chaveiros"], "30");
        p.discount_price = Some("25,00".parse().expect("price"));
        let card = ProductCard::new(&p, "5500");
        assert_eq!(card.price.to_string(), "R$ 30,00");
        assert_eq!(card.discount_price.map(|b| b.to_string()).as_deref(), Some("R$ 25,00"));
        assert!(card.order_url.ends_with("R%2425%2C00"));
    }
}
