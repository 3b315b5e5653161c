use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::category::models::{
    CategoryListResponse, CategoryPlacement, CategoryResponse, CategoryTreeNode, CategoryType,
    CreateCategoryDto, DropIntent, ReorderCategoriesDto, ReorderResponse, UpdateCategoryDto,
};
use crate::errors::ErrorResponse;

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from the auth provider"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Category Settings API",
        version = "0.1.0",
        description = "Financial category management for the business dashboard",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Categories", description = "Income and expense categories with drag-and-drop ordering")
    ),
    paths(
        crate::health::health_check,
        crate::category::handlers::list_categories,
        crate::category::handlers::get_category,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::reorder_categories,
    ),
    components(
        schemas(
            // Error response
            ErrorResponse,
            // Category schemas
            CategoryType,
            DropIntent,
            CategoryResponse,
            CategoryTreeNode,
            CategoryListResponse,
            CategoryPlacement,
            CreateCategoryDto,
            UpdateCategoryDto,
            ReorderCategoriesDto,
            ReorderResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
