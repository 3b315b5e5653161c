use actix_web::{get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{
    BusinessIdPath, CategoryListResponse, CategoryPath, CategoryResponse, CategoryTypeQuery,
    CreateCategoryDto, ReorderCategoriesDto, ReorderResponse, UpdateCategoryDto,
};
use super::service::CategoryService;

/// GET /businesses/{business_id}/categories - List categories of one type
#[utoipa::path(
    get,
    path = "/businesses/{business_id}/categories",
    tag = "Categories",
    params(BusinessIdPath, CategoryTypeQuery),
    responses(
        (status = 200, description = "Categories, flat and as a tree", body = CategoryListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Business not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/businesses/{business_id}/categories")]
pub async fn list_categories(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BusinessIdPath>,
    query: web::Query<CategoryTypeQuery>,
) -> Result<HttpResponse, AppError> {
    let categories = CategoryService::list_by_type(
        pool.get_ref(),
        path.business_id,
        query.category_type,
        auth.user_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(CategoryListResponse::from_categories(categories)))
}

/// POST /businesses/{business_id}/categories/reorder - Apply a drag-and-drop move
#[utoipa::path(
    post,
    path = "/businesses/{business_id}/categories/reorder",
    tag = "Categories",
    params(BusinessIdPath),
    request_body = ReorderCategoriesDto,
    responses(
        (status = 200, description = "Move applied or ignored", body = ReorderResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing finance permission", body = ErrorResponse),
        (status = 404, description = "Business or category not found", body = ErrorResponse),
        (status = 409, description = "Categories changed since they were loaded", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/businesses/{business_id}/categories/reorder")]
pub async fn reorder_categories(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BusinessIdPath>,
    body: web::Json<ReorderCategoriesDto>,
) -> Result<HttpResponse, AppError> {
    let outcome =
        CategoryService::reorder(pool.get_ref(), path.business_id, &body, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(ReorderResponse {
        moved: !outcome.changed.is_empty(),
        changed: outcome.changed,
        list: CategoryListResponse::from_categories(outcome.categories),
    }))
}

/// GET /businesses/{business_id}/categories/{id} - Get a specific category
#[utoipa::path(
    get,
    path = "/businesses/{business_id}/categories/{id}",
    tag = "Categories",
    params(CategoryPath),
    responses(
        (status = 200, description = "Category details", body = CategoryResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/businesses/{business_id}/categories/{id}")]
pub async fn get_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<CategoryPath>,
) -> Result<HttpResponse, AppError> {
    let category =
        CategoryService::get_by_id(pool.get_ref(), path.business_id, path.id, auth.user_id)
            .await?;

    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

/// POST /businesses/{business_id}/categories - Create a new category
#[utoipa::path(
    post,
    path = "/businesses/{business_id}/categories",
    tag = "Categories",
    params(BusinessIdPath),
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing finance permission", body = ErrorResponse),
        (status = 404, description = "Business or parent not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/businesses/{business_id}/categories")]
pub async fn create_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BusinessIdPath>,
    body: web::Json<CreateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let category =
        CategoryService::create(pool.get_ref(), path.business_id, &body, auth.user_id).await?;

    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

/// PATCH /businesses/{business_id}/categories/{id} - Update display attributes
#[utoipa::path(
    patch,
    path = "/businesses/{business_id}/categories/{id}",
    tag = "Categories",
    params(CategoryPath),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing finance permission", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/businesses/{business_id}/categories/{id}")]
pub async fn update_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<CategoryPath>,
    body: web::Json<UpdateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    body.validate_fields()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let category = CategoryService::update(
        pool.get_ref(),
        path.business_id,
        path.id,
        &body,
        auth.user_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}
