//! Category route handlers.
//!
//! Category names map to slugs without collision suffixing: a duplicate
//! name is rejected outright (unlike products, which suffix).

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{instrument, warn};

use voltshop_core::CategoryId;

use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::category::Category;
use crate::routes::{ApiResponse, MultipartForm, ok};
use crate::services::slug::slugify;
use crate::state::AppState;

/// Create the category routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{slug}", get(get_by_slug).patch(update))
}

/// Create a category with its image.
#[instrument(skip(state, admin, multipart))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = MultipartForm::collect(multipart).await?;

    let name = form.optional("name");
    let image = form.files.first();
    let (Some(name), Some(image)) = (name, image) else {
        return Err(AppError::Validation("Name and image are required.".to_string()));
    };

    let slug = slugify(name);
    let categories = CategoryRepository::new(state.pool());
    if categories.slug_exists(&slug, None).await? {
        return Err(AppError::Conflict(
            "A category with this name already exists.".to_string(),
        ));
    }

    let uploaded = state
        .media()
        .upload(image.bytes.clone(), &image.filename)
        .await?;

    let category = categories
        .create(admin.id, name, &slug, &uploaded.url, &uploaded.public_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        ok("Category created successfully.", category),
    ))
}

/// Update a category's name and/or image.
#[instrument(skip(state, _admin, multipart))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Category>>> {
    let form = MultipartForm::collect(multipart).await?;

    let categories = CategoryRepository::new(state.pool());
    let existing = categories
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    let name_slug = match form.optional("name") {
        Some(name) => {
            let slug = slugify(name);
            if categories.slug_exists(&slug, Some(id)).await? {
                return Err(AppError::Conflict(
                    "Another category with this name already exists.".to_string(),
                ));
            }
            Some((name.to_owned(), slug))
        }
        None => None,
    };

    let image = match form.files.first() {
        Some(file) => {
            let uploaded = state.media().upload(file.bytes.clone(), &file.filename).await?;
            // Old image cleanup is best-effort
            if let Err(e) = state.media().delete(&existing.image_public_id).await {
                warn!(error = %e, public_id = %existing.image_public_id, "Failed to delete replaced category image");
            }
            Some((uploaded.url, uploaded.public_id))
        }
        None => None,
    };

    let category = categories
        .update(
            id,
            name_slug.as_ref().map(|(n, s)| (n.as_str(), s.as_str())),
            image.as_ref().map(|(u, p)| (u.as_str(), p.as_str())),
        )
        .await?;

    Ok(ok("Category updated successfully.", category))
}

/// List all categories.
#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;

    if categories.is_empty() {
        return Err(AppError::NotFound(
            "No categories found. Create one to get started.".to_string(),
        ));
    }

    Ok(ok("Categories retrieved successfully", categories))
}

/// Get a category by slug.
#[instrument(skip(state))]
async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    Ok(ok("Category retrieved successfully.", category))
}
