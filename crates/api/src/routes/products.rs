//! Product route handlers.
//!
//! Slugs are derived from the display name with collision suffixing and
//! regenerated whenever the name changes. Admin restocks at or above the
//! low-stock threshold clear the notification flag so the next depletion
//! episode alerts again.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use voltshop_core::{CategoryId, ProductId};

use crate::db::categories::CategoryRepository;
use crate::db::products::{NewProduct, ProductPatch, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{LowStockWarning, Pagination, Product};
use crate::routes::{ApiResponse, MultipartForm, ok};
use crate::services::slug::unique_product_slug;
use crate::state::AppState;

/// Maximum images per product.
const MAX_IMAGES: usize = 4;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        (page, limit, (page - 1) * limit)
    }
}

/// Paginated listing response with the low-stock sidecar.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub data: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_warnings: Option<Vec<LowStockWarning>>,
    pub pagination: Pagination,
}

/// Partial update body for PATCH.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub warranty: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub quantity: Option<i32>,
    pub is_trending: Option<bool>,
    pub is_new_arrival: Option<bool>,
    pub category_id: Option<CategoryId>,
}

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/category/{slug}", get(by_category))
        .route(
            "/{id_or_slug}",
            get(get_one)
                .put(full_update)
                .patch(patch_update)
                .delete(delete_one),
        )
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid {field} value")))
}

fn parse_i32(value: &str, field: &str) -> Result<i32> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid {field} value")))
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Create a product with 1-4 images.
#[instrument(skip(state, admin, multipart))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = MultipartForm::collect(multipart).await?;

    if form.files.is_empty() {
        return Err(AppError::Validation("At least one image is required.".to_string()));
    }
    if form.files.len() > MAX_IMAGES {
        return Err(AppError::Validation("Maximum 4 images allowed.".to_string()));
    }

    let name = form.require("name")?;
    let price = parse_decimal(form.require("price")?, "price")?;
    let discount = match form.optional("discount") {
        Some(value) => parse_decimal(value, "discount")?,
        None => Decimal::ZERO,
    };
    let quantity = match form.optional("quantity") {
        Some(value) => parse_i32(value, "quantity")?,
        None => 1,
    };
    if quantity < 0 {
        return Err(AppError::Validation("Quantity cannot be negative".to_string()));
    }

    let category_id = CategoryId::new(parse_i32(form.require("categoryId")?, "categoryId")?);
    CategoryRepository::new(state.pool())
        .get_by_id(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    let products = ProductRepository::new(state.pool());
    let slug = unique_product_slug(&products, name, None).await?;

    let mut images = Vec::with_capacity(form.files.len());
    let mut image_public_ids = Vec::with_capacity(form.files.len());
    for file in &form.files {
        let uploaded = state.media().upload(file.bytes.clone(), &file.filename).await?;
        images.push(uploaded.url);
        image_public_ids.push(uploaded.public_id);
    }

    let product = products
        .create(NewProduct {
            name,
            slug: &slug,
            description: form.optional("description"),
            brand: form.optional("brand"),
            warranty: form.optional("warranty").unwrap_or(""),
            price,
            discount,
            quantity,
            is_trending: parse_flag(form.optional("isTrending")),
            is_new_arrival: parse_flag(form.optional("isNewArrival")),
            category_id,
            images,
            image_public_ids,
            created_by: admin.id,
        })
        .await?;

    Ok((StatusCode::CREATED, ok("Product created.", product)))
}

/// Paginated listing with the low-stock warning sidecar.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductListResponse>> {
    let (page, limit, offset) = query.normalize();
    let products = ProductRepository::new(state.pool());

    let total = products.count_all().await?;
    let data = products.list_page(limit, offset).await?;

    let threshold = state.config().low_stock.threshold;
    let low_stock_warnings = data
        .iter()
        .filter(|p| p.quantity < threshold)
        .map(LowStockWarning::for_product)
        .collect();

    Ok(Json(ProductListResponse {
        success: true,
        msg: None,
        data,
        low_stock_warnings: Some(low_stock_warnings),
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Paginated listing for one category, addressed by slug.
#[instrument(skip(state))]
async fn by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductListResponse>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    let (page, limit, offset) = query.normalize();
    let products = ProductRepository::new(state.pool());

    let total = products.count_by_category(category.id).await?;
    let data = products
        .list_page_by_category(category.id, limit, offset)
        .await?;

    Ok(Json(ProductListResponse {
        success: true,
        msg: Some(format!("Products found for category: {}", category.name)),
        data,
        low_stock_warnings: None,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Get one product by numeric ID or slug.
#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id_or_slug(&id_or_slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;

    Ok(ok("Product retrieved.", product))
}

/// Full update: scalar fields plus image replacement.
///
/// `imagesToKeep` (a JSON array of current URLs) selects which existing
/// images survive; any new files are uploaded and appended; everything
/// else is removed from the media store.
#[instrument(skip(state, _admin, multipart))]
async fn full_update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Product>>> {
    let form = MultipartForm::collect(multipart).await?;

    let products = ProductRepository::new(state.pool());
    let existing = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;

    let mut patch = scalar_patch_from_form(&form, state.config().low_stock.threshold)?;

    if let Some(name) = form.optional("name")
        && name != existing.name
    {
        let slug = unique_product_slug(&products, name, Some(id)).await?;
        patch.name_slug = Some((name.to_owned(), slug));
    }

    if form.optional("imagesToKeep").is_some() || !form.files.is_empty() {
        let kept_urls: Vec<String> = match form.optional("imagesToKeep") {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|_| AppError::Validation("Invalid imagesToKeep value".to_string()))?,
            None => existing.images.clone(),
        };

        let total = kept_urls.len() + form.files.len();
        if total < 1 {
            return Err(AppError::Validation("At least one image is required.".to_string()));
        }
        if total > MAX_IMAGES {
            return Err(AppError::Validation("Maximum of 4 images allowed.".to_string()));
        }

        // Partition current images into kept and removed, pairing URLs
        // with their public IDs by position
        let mut kept: Vec<(String, String)> = Vec::new();
        let mut removed: Vec<String> = Vec::new();
        for (url, public_id) in existing
            .images
            .iter()
            .zip(existing.image_public_ids.iter())
        {
            if kept_urls.contains(url) {
                kept.push((url.clone(), public_id.clone()));
            } else {
                removed.push(public_id.clone());
            }
        }

        for public_id in removed {
            if let Err(e) = state.media().delete(&public_id).await {
                warn!(error = %e, %public_id, "Failed to delete removed product image");
            }
        }

        let mut urls: Vec<String> = kept.iter().map(|(url, _)| url.clone()).collect();
        let mut ids: Vec<String> = kept.into_iter().map(|(_, pid)| pid).collect();
        for file in &form.files {
            let uploaded = state.media().upload(file.bytes.clone(), &file.filename).await?;
            urls.push(uploaded.url);
            ids.push(uploaded.public_id);
        }

        patch.images = Some((urls, ids));
    }

    let product = products.update(id, patch).await?;
    Ok(ok("Product updated successfully.", product))
}

/// Partial JSON update (toggle flags, adjust discount or stock, rename).
#[instrument(skip(state, _admin, body))]
async fn patch_update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<PatchBody>,
) -> Result<Json<ApiResponse<Product>>> {
    let products = ProductRepository::new(state.pool());
    let existing = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;

    if let Some(quantity) = body.quantity
        && quantity < 0
    {
        return Err(AppError::Validation("Quantity cannot be negative".to_string()));
    }

    let threshold = state.config().low_stock.threshold;
    let mut patch = ProductPatch {
        description: body.description,
        brand: body.brand,
        warranty: body.warranty,
        price: body.price,
        discount: body.discount,
        quantity: body.quantity,
        is_trending: body.is_trending,
        is_new_arrival: body.is_new_arrival,
        category_id: body.category_id,
        clear_low_stock_flag: body.quantity.is_some_and(|q| q >= threshold),
        ..ProductPatch::default()
    };

    if let Some(name) = body.name.as_deref()
        && name != existing.name
    {
        let slug = unique_product_slug(&products, name, Some(id)).await?;
        patch.name_slug = Some((name.to_owned(), slug));
    }

    let product = products.update(id, patch).await?;
    Ok(ok("Product updated (patched).", product))
}

/// Delete a product, its media, and (via cascade) its reviews.
#[instrument(skip(state, _admin))]
async fn delete_one(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductRepository::new(state.pool());

    let public_ids = products
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;

    for public_id in public_ids {
        if let Err(e) = state.media().delete(&public_id).await {
            warn!(error = %e, %public_id, "Failed to delete product image");
        }
    }

    let total = products.count_all().await?;
    let remaining = products.list_page(total.max(1), 0).await?;
    Ok(ok("Product deleted successfully.", remaining))
}

fn scalar_patch_from_form(form: &MultipartForm, threshold: i32) -> Result<ProductPatch> {
    let price = match form.optional("price") {
        Some(value) => Some(parse_decimal(value, "price")?),
        None => None,
    };
    let discount = match form.optional("discount") {
        Some(value) => Some(parse_decimal(value, "discount")?),
        None => None,
    };
    let quantity = match form.optional("quantity") {
        Some(value) => {
            let parsed = parse_i32(value, "quantity")?;
            if parsed < 0 {
                return Err(AppError::Validation("Quantity cannot be negative".to_string()));
            }
            Some(parsed)
        }
        None => None,
    };

    Ok(ProductPatch {
        description: form.optional("description").map(str::to_owned),
        brand: form.optional("brand").map(str::to_owned),
        warranty: form.optional("warranty").map(str::to_owned),
        price,
        discount,
        quantity,
        is_trending: form.optional("isTrending").map(|v| v.eq_ignore_ascii_case("true")),
        is_new_arrival: form
            .optional("isNewArrival")
            .map(|v| v.eq_ignore_ascii_case("true")),
        category_id: match form.optional("categoryId") {
            Some(value) => Some(CategoryId::new(parse_i32(value, "categoryId")?)),
            None => None,
        },
        clear_low_stock_flag: quantity.is_some_and(|q| q >= threshold),
        ..ProductPatch::default()
    })
}
