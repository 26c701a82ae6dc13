//! Catalog lookup: product resolution, regional listings, filtering, and
//! guest pagination.
//!
//! Storage is the [`Store`]; everything here is selection and ordering over
//! the product set it returns (newest first).

use std::cmp::Ordering;

use regex::Regex;
use thiserror::Error;
use tracing::instrument;

use shopipy_core::{ProductId, TagList};

use crate::db::{RepositoryError, Store};
use crate::models::{CartLine, Product, ProductError, StockUnit};

/// Guest listing page size.
pub const GUEST_PAGE_SIZE: usize = 5;

/// Filter sentinel meaning "no constraint".
const ANY: &str = "Any";

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The product exists but has no stock unit with this id.
    #[error("stock unit {stock_id} not found in product {product_id}")]
    StockUnitNotFound {
        product_id: ProductId,
        stock_id: String,
    },

    /// A filter value could not be compiled.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A product failed its stock invariants on save.
    #[error(transparent)]
    InvalidProduct(#[from] ProductError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Listing order for [`Catalog::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Creation time, newest first.
    Newest,
    /// `mrp` ascending, unpriced products last.
    MrpLowToHigh,
    /// `mrp` descending, unpriced products last.
    MrpHighToLow,
    /// Keep store order.
    Unsorted,
}

impl SortBy {
    /// Parse a path value. Unknown values (including `Any`) do not reorder.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "newest" => Self::Newest,
            "mrp_low_to_high" => Self::MrpLowToHigh,
            "mrp_high_to_low" => Self::MrpHighToLow,
            _ => Self::Unsorted,
        }
    }
}

/// One page of the guest listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Product>,
    /// 1-based page number actually served.
    pub number: usize,
    pub num_pages: usize,
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product: Product,
    pub stock_id: String,
    pub unit: StockUnit,
    pub volume: u32,
}

/// Catalog lookup service.
pub struct Catalog<'a> {
    store: &'a dyn Store,
}

impl<'a> Catalog<'a> {
    /// Create a catalog over the given store.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Get a product by id.
    ///
    /// Ids that are not UUIDs cannot name a product and are reported as
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if no such product exists.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Product, CatalogError> {
        let not_found = || CatalogError::ProductNotFound(id.to_owned());
        let product_id = ProductId::parse(id).map_err(|_| not_found())?;
        self.store.product(product_id).await?.ok_or_else(not_found)
    }

    /// Resolve a cart line to its product and stock unit.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or `StockUnitNotFound` if either is gone.
    pub async fn resolve_line(&self, line: &CartLine) -> Result<ResolvedLine, CatalogError> {
        let product = self.get_by_id(&line.item_id).await?;
        let unit = product
            .stock_unit(&line.stock_id)
            .cloned()
            .ok_or_else(|| CatalogError::StockUnitNotFound {
                product_id: product.id,
                stock_id: line.stock_id.clone(),
            })?;

        Ok(ResolvedLine {
            product,
            stock_id: line.stock_id.clone(),
            unit,
            volume: line.volume,
        })
    }

    /// Resolve every line of a cart, failing as a whole on the first
    /// missing product or stock unit.
    ///
    /// # Errors
    ///
    /// See [`Catalog::resolve_line`].
    pub async fn resolve_lines(&self, lines: &[CartLine]) -> Result<Vec<ResolvedLine>, CatalogError> {
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            resolved.push(self.resolve_line(line).await?);
        }
        Ok(resolved)
    }

    /// Products visible to a customer with the given regions.
    ///
    /// No regions means the whole catalog. Otherwise a product is listed
    /// once if its `style_region` contains any requested region
    /// (case-insensitive substring).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn list_for_regions(&self, regions: &TagList) -> Result<Vec<Product>, CatalogError> {
        let products = self.store.products().await?;
        if regions.is_empty() {
            return Ok(products);
        }

        let wanted: Vec<String> = regions.iter().map(str::to_lowercase).collect();
        Ok(products
            .into_iter()
            .filter(|product| {
                let Some(style_region) = product.style_region.as_deref() else {
                    return false;
                };
                let style_region = style_region.to_lowercase();
                wanted.iter().any(|region| style_region.contains(region.as_str()))
            })
            .collect())
    }

    /// Filter by item type, category, and gender, then sort.
    ///
    /// Each dimension is `Any` or a comma-separated list of alternatives.
    /// Item type and category match the product's name exactly; gender
    /// matches a whole word of the product's gender text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidFilter` if a gender value cannot be
    /// compiled, or `CatalogError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn filter(
        &self,
        item_type: &str,
        category: &str,
        gender: &str,
        sort_by: SortBy,
    ) -> Result<Vec<Product>, CatalogError> {
        let item_type = NameFilter::parse(item_type);
        let category = NameFilter::parse(category);
        let gender = GenderFilter::parse(gender)?;

        let mut products: Vec<Product> = self
            .store
            .products()
            .await?
            .into_iter()
            .filter(|p| {
                item_type.matches(p.brick.as_deref())
                    && category.matches(p.category.as_deref())
                    && gender.matches(&p.gender)
            })
            .collect();

        sort_products(&mut products, sort_by);
        Ok(products)
    }

    /// One page of the unauthenticated listing.
    ///
    /// `page` is 1-based. A missing or non-numeric page serves page 1; a
    /// number outside `1..=num_pages` serves the last page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on store failure.
    #[instrument(skip(self))]
    pub async fn guest_page(&self, page: Option<&str>) -> Result<Page, CatalogError> {
        let products = self.store.products().await?;
        Ok(paginate(products, page, GUEST_PAGE_SIZE))
    }

    /// Normalize stock units and persist a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` if a stock unit's total does
    /// not match its items, or `CatalogError::Repository` on store failure.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn save_product(&self, mut product: Product) -> Result<Product, CatalogError> {
        product.prepare_for_save()?;
        self.store.upsert_product(&product).await?;
        Ok(product)
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Exact-name alternatives for one dimension.
enum NameFilter {
    Any,
    OneOf(Vec<String>),
}

impl NameFilter {
    fn parse(raw: &str) -> Self {
        if raw == ANY {
            return Self::Any;
        }
        Self::OneOf(split_values(raw).map(str::to_owned).collect())
    }

    fn matches(&self, name: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(names) => name.is_some_and(|n| names.iter().any(|v| v == n)),
        }
    }
}

/// Whole-word alternatives against the free-text gender field.
enum GenderFilter {
    Any,
    OneOf(Vec<Regex>),
}

impl GenderFilter {
    fn parse(raw: &str) -> Result<Self, CatalogError> {
        if raw == ANY {
            return Ok(Self::Any);
        }
        split_values(raw)
            .map(|value| {
                Regex::new(&format!(r"\b{}\b", regex::escape(value)))
                    .map_err(|e| CatalogError::InvalidFilter(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::OneOf)
    }

    fn matches(&self, gender: &str) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(patterns) => patterns.iter().any(|re| re.is_match(gender)),
        }
    }
}

fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|v| !v.is_empty())
}

/// Stable sort; ties keep store order.
fn sort_products(products: &mut [Product], sort_by: SortBy) {
    match sort_by {
        SortBy::Newest => products.sort_by(|a, b| b.created.cmp(&a.created)),
        SortBy::MrpLowToHigh => products.sort_by(|a, b| match (a.mrp, b.mrp) {
            (Some(a), Some(b)) => a.cmp(&b),
            (a, b) => unpriced_last(a.is_none(), b.is_none()),
        }),
        SortBy::MrpHighToLow => products.sort_by(|a, b| match (a.mrp, b.mrp) {
            (Some(a), Some(b)) => b.cmp(&a),
            (a, b) => unpriced_last(a.is_none(), b.is_none()),
        }),
        SortBy::Unsorted => {}
    }
}

fn unpriced_last(a_unpriced: bool, b_unpriced: bool) -> Ordering {
    a_unpriced.cmp(&b_unpriced)
}

fn paginate(items: Vec<Product>, page: Option<&str>, page_size: usize) -> Page {
    let num_pages = items.len().div_ceil(page_size).max(1);
    let number = match page.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) => usize::try_from(n)
            .ok()
            .filter(|n| (1..=num_pages).contains(n))
            .unwrap_or(num_pages),
    };

    let items = items
        .into_iter()
        .skip((number - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        number,
        num_pages,
    }
}
