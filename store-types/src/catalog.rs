//! Catalog view-model: the baseline product and category lists as fetched,
//! the shopper's filter state, and the filtered, paginated view derived from
//! both.
//!
//! The derived view is recomputed eagerly after every mutation, so reading it
//! never observes a stale filter. All comparisons go through [`fold`], which
//! makes them case and diacritic insensitive.

use crate::category::Category;
use crate::fold;
use crate::product::Product;
use std::collections::BTreeMap;

pub const PAGE_SIZE: usize = 6;

/// Everything the shopper can narrow the catalog by.
///
/// Values are kept as typed (for echoing back into forms and links) and in
/// folded form (for matching).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    link_category: Option<(String, String)>,
    selected: BTreeMap<String, String>,
    search: (String, String),
}

impl FilterState {
    /// Category carried by the `categoria` navigation parameter.
    pub fn link_category(&self) -> Option<&str> {
        self.link_category.as_ref().map(|(raw, _)| raw.as_str())
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.values().map(String::as_str)
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains_key(&fold(name))
    }

    pub fn search_term(&self) -> &str {
        &self.search.0
    }

    pub fn is_empty(&self) -> bool {
        self.link_category.is_none() && self.selected.is_empty() && self.search.1.is_empty()
    }

    fn set_link_category(&mut self, category: Option<&str>) {
        self.link_category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| (c.to_string(), fold(c)));
    }

    fn toggle(&mut self, name: &str) {
        let key = fold(name);
        if self.selected.remove(&key).is_none() {
            self.selected.insert(key, name.to_string());
        }
    }

    fn set_search(&mut self, term: &str) {
        self.search = (term.to_string(), fold(term.trim()));
    }

    /// Single predicate behind the whole pipeline: navigation category, then
    /// checkbox selection (any of), then free-text search over the name and
    /// category names.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some((_, category)) = &self.link_category {
            if !product.has_category(category) {
                return false;
            }
        }
        if !self.selected.is_empty()
            && !product
                .categories
                .iter()
                .any(|c| self.selected.contains_key(&fold(c)))
        {
            return false;
        }
        let term = &self.search.1;
        if !term.is_empty()
            && !fold(&product.name).contains(term.as_str())
            && !product.categories.iter().any(|c| fold(c).contains(term.as_str()))
        {
            return false;
        }
        true
    }
}

/// Products matching `filter`, in the order they were fetched.
pub fn recompute<'a>(products: &'a [Product], filter: &FilterState) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

#[derive(Debug, Clone)]
pub struct CatalogView {
    products: Vec<Product>,
    categories: Vec<Category>,
    filter: FilterState,
    filtered: Vec<usize>,
    page: usize,
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::load(vec![], vec![])
    }
}

impl CatalogView {
    pub fn load(products: Vec<Product>, categories: Vec<Category>) -> Self {
        let filtered = (0..products.len()).collect();
        Self {
            products,
            categories,
            filter: FilterState::default(),
            filtered,
            page: 1,
        }
    }

    /// Applies (or clears, for `None` and blank input) the navigation category.
    /// A category slug is accepted in place of its name.
    pub fn set_category_filter_from_link(&mut self, category: Option<&str>) {
        let name = category.map(|c| self.resolve_category(c));
        self.filter.set_link_category(name.as_deref());
        self.recompute();
    }

    fn resolve_category(&self, category: &str) -> String {
        let folded = fold(category.trim());
        if self.categories.iter().any(|c| fold(&c.name) == folded) {
            return category.to_string();
        }
        self.categories
            .iter()
            .find(|c| !c.category_slug.is_empty() && fold(&c.category_slug) == folded)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| category.to_string())
    }

    pub fn toggle_category(&mut self, name: &str) {
        self.filter.toggle(name);
        self.recompute();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.filter.set_search(term);
        self.recompute();
    }

    /// Rebuilds the derived view from the baseline and returns to page 1.
    pub fn recompute(&mut self) {
        self.filtered = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| self.filter.matches(p))
            .map(|(i, _)| i)
            .collect();
        self.page = 1;
    }

    /// Pages are 1-indexed; 0 is read as 1. There is no upper bound, a page
    /// past the end is simply empty.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn current_page_items(&self) -> Vec<&Product> {
        let start = (self.page - 1).saturating_mul(PAGE_SIZE);
        self.filtered
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .filter_map(|&i| self.products.get(i))
            .collect()
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Product> {
        self.filtered.iter().filter_map(|&i| self.products.get(i))
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn page_count(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.filter.is_selected(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::Price;
    use rust_decimal_macros::dec;

    fn product(id: u64, name: &str, categories: &[&str]) -> Product {
        Product {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            date: String::new(),
            images: vec![format!("https://api/img/{id}.webp")],
            categories: categories.iter().map(|c| c.to_string()).collect(),
            price: Price(dec!(10)),
            size: "M".to_string(),
            discount_price: None,
        }
    }

    fn two_products() -> Vec<Product> {
        vec![
            product(1, "Bolsa Azul", &["Bolsas"]),
            product(2, "Chaveiro Rosa", &["Acessórios"]),
        ]
    }

    fn assorted() -> Vec<Product> {
        vec![
            product(1, "Bolsa Azul", &["Bolsas"]),
            product(2, "Chaveiro Rosa", &["Acessórios"]),
            product(3, "Bolsa de Praia", &["Bolsas", "Verão"]),
            product(4, "Tapete Redondo", &["Casa"]),
            product(5, "Porta-copos", &["casa", "Acessórios"]),
            product(6, "Amigurumi Urso", &[]),
            product(7, "Bolsinha Chaveiro", &["acessorios"]),
        ]
    }

    fn ids(view: &CatalogView) -> Vec<u64> {
        view.filtered().map(|p| p.id).collect()
    }

    fn page_ids(view: &CatalogView) -> Vec<u64> {
        view.current_page_items().iter().map(|p| p.id).collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let products = assorted();
        let view = CatalogView::load(products.clone(), vec![]);
        assert_eq!(view.filtered().cloned().collect::<Vec<_>>(), products);
        let pure = recompute(&products, &FilterState::default());
        assert_eq!(pure.len(), products.len());
        assert!(view.filter().is_empty());
    }

    #[test]
    fn empty_catalog_is_valid() {
        let mut view = CatalogView::default();
        view.set_search_term("bolsa");
        view.toggle_category("Bolsas");
        assert_eq!(view.filtered_count(), 0);
        assert_eq!(view.page_count(), 0);
        assert!(view.current_page_items().is_empty());
    }

    #[test]
    fn selecting_category_keeps_only_members() {
        let mut view = CatalogView::load(two_products(), vec![]);
        view.toggle_category("Bolsas");
        assert_eq!(ids(&view), vec![1]);
    }

    #[test]
    fn selection_is_union_of_categories() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.toggle_category("BOLSAS");
        view.toggle_category("Casa");
        assert_eq!(ids(&view), vec![1, 3, 4, 5]);
        for p in view.filtered() {
            assert!(p.has_category("bolsas") || p.has_category("casa"));
        }
    }

    #[test]
    fn toggling_twice_removes_selection() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.toggle_category("Casa");
        assert!(view.is_selected("casa"));
        view.toggle_category("casa");
        assert!(!view.is_selected("Casa"));
        assert_eq!(view.filtered_count(), 7);
    }

    #[test]
    fn search_ignores_case() {
        let mut view = CatalogView::load(two_products(), vec![]);
        view.set_search_term("chaveiro");
        assert_eq!(ids(&view), vec![2]);
        view.set_search_term("CHAVEIRO");
        assert_eq!(ids(&view), vec![2]);
    }

    #[test]
    fn search_matches_name_or_category() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.set_search_term("verão");
        assert_eq!(ids(&view), vec![3]);
        view.set_search_term("  chaveiro ");
        assert_eq!(ids(&view), vec![2, 7]);
        for p in view.filtered() {
            let term = "chaveiro";
            assert!(
                p.name.to_lowercase().contains(term)
                    || p.categories.iter().any(|c| c.to_lowercase().contains(term))
            );
        }
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.set_search_term("   ");
        assert_eq!(view.filtered_count(), 7);
        assert_eq!(view.filter().search_term(), "   ");
    }

    #[test]
    fn search_is_idempotent() {
        let products = assorted();
        let mut filter = FilterState::default();
        filter.set_search("bolsa");
        let once = recompute(&products, &filter)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let twice = recompute(&once, &filter);
        assert_eq!(twice.len(), once.len());
        assert!(twice.iter().zip(once.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn filtering_preserves_fetch_order() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.set_search_term("a");
        let found = ids(&view);
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }

    #[test]
    fn link_category_folds_diacritics() {
        let products = vec![
            product(1, "Bolsa Azul", &["bôlsas"]),
            product(2, "Chaveiro Rosa", &["Acessórios"]),
        ];
        let mut view = CatalogView::load(products, vec![]);
        view.set_category_filter_from_link(Some("Bolsas"));
        assert_eq!(ids(&view), vec![1]);
        assert_eq!(view.filter().link_category(), Some("Bolsas"));
        view.set_category_filter_from_link(Some("acessorios"));
        assert_eq!(ids(&view), vec![2]);
    }

    #[test]
    fn absent_or_blank_link_category_clears_it() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.set_category_filter_from_link(Some("Casa"));
        assert_eq!(view.filtered_count(), 2);
        view.set_category_filter_from_link(Some("  "));
        assert_eq!(view.filtered_count(), 7);
        view.set_category_filter_from_link(Some("Casa"));
        view.set_category_filter_from_link(None);
        assert_eq!(view.filtered_count(), 7);
    }

    #[test]
    fn link_category_combines_with_interactive_filters() {
        let mut view = CatalogView::load(assorted(), vec![]);
        view.set_category_filter_from_link(Some("Acessórios"));
        assert_eq!(ids(&view), vec![2, 5, 7]);
        view.set_search_term("chaveiro");
        assert_eq!(ids(&view), vec![2, 7]);
        view.toggle_category("Casa");
        assert_eq!(ids(&view), Vec::<u64>::new());
    }

    #[test]
    fn filter_changes_reset_page() {
        let products = (1..=20).map(|i| product(i, "Bolsa", &["Bolsas"])).collect();
        let mut view = CatalogView::load(products, vec![]);
        view.go_to_page(3);
        view.set_search_term("bolsa");
        assert_eq!(view.current_page(), 1);
        view.go_to_page(2);
        view.toggle_category("Bolsas");
        assert_eq!(view.current_page(), 1);
        view.go_to_page(2);
        view.set_category_filter_from_link(Some("Bolsas"));
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn seven_products_span_two_pages() {
        let products = (1..=7).map(|i| product(i, "Item", &[])).collect();
        let mut view = CatalogView::load(products, vec![]);
        assert_eq!(view.page_count(), 2);
        assert_eq!(page_ids(&view), vec![1, 2, 3, 4, 5, 6]);
        view.go_to_page(2);
        assert_eq!(page_ids(&view), vec![7]);
    }

    #[test]
    fn page_length_formula_holds() {
        for count in 0..20usize {
            let products = (1..=count as u64).map(|i| product(i, "Item", &[])).collect();
            let mut view = CatalogView::load(products, vec![]);
            for page in 1..6usize {
                view.go_to_page(page);
                let expected = PAGE_SIZE.min(count.saturating_sub((page - 1) * PAGE_SIZE));
                assert_eq!(view.current_page_items().len(), expected, "count={count} page={page}");
            }
        }
    }

    #[test]
    fn out_of_range_pages_are_empty_not_clamped() {
        let products = (1..=7).map(|i| product(i, "Item", &[])).collect();
        let mut view = CatalogView::load(products, vec![]);
        view.go_to_page(9);
        assert_eq!(view.current_page(), 9);
        assert!(view.current_page_items().is_empty());
        view.go_to_page(0);
        assert_eq!(view.current_page(), 1);
    }

    fn category(name: &str, slug: &str) -> Category {
        Category {
            id: slug.to_string(),
            name: name.to_string(),
            category_slug: slug.to_string(),
            date: String::new(),
            image: String::new(),
            description: None,
        }
    }

    #[test]
    fn link_category_accepts_slug() {
        let products = vec![
            product(1, "Bolsa Azul", &["Bolsas de mão"]),
            product(2, "Chaveiro Rosa", &["Acessórios"]),
        ];
        let categories = vec![
            category("Bolsas de mão", "bolsas-de-mao"),
            category("Acessórios", "acessorios"),
        ];
        let mut view = CatalogView::load(products, categories);
        view.set_category_filter_from_link(Some("bolsas-de-mao"));
        assert_eq!(ids(&view), vec![1]);
        assert_eq!(view.filter().link_category(), Some("Bolsas de mão"));
        view.set_category_filter_from_link(Some("ACESSORIOS"));
        assert_eq!(ids(&view), vec![2]);
        view.set_category_filter_from_link(Some("inexistente"));
        assert!(ids(&view).is_empty());
    }
}
