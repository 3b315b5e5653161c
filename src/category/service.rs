use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::models::{
    group_version, sort_for_display, Category, CategoryPlacement, CategoryType,
    CreateCategoryDto, ReorderCategoriesDto, UpdateCategoryDto,
};
use super::reorder::{changed_placements, reorder, CategoryMove};
use crate::business::BusinessService;
use crate::errors::AppError;

/// Outcome of applying a drag-and-drop move
pub struct ReorderOutcome {
    pub changed: Vec<CategoryPlacement>,
    pub categories: Vec<Category>,
}

/// Compare the version a client rendered with the current one.
/// No expected version means the client opted out of the check.
pub fn check_version(
    expected: Option<DateTime<Utc>>,
    current: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    match expected {
        Some(expected) if current != Some(expected) => Err(AppError::Conflict(
            "Categories were modified by another user, reload and try again".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Service layer for category business logic.
pub struct CategoryService;

impl CategoryService {
    /// List a business's categories of one type in display order
    pub async fn list_by_type(
        pool: &PgPool,
        business_id: Uuid,
        category_type: CategoryType,
        user_id: Uuid,
    ) -> Result<Vec<Category>, AppError> {
        BusinessService::get_membership(pool, business_id, user_id).await?;

        let mut categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, business_id, name, category_type, color, icon, parent_id,
                   sort_order, is_system, created_at, updated_at
            FROM categories
            WHERE business_id = $1 AND category_type = $2
            ORDER BY parent_id NULLS FIRST, sort_order ASC, name ASC
            "#,
        )
        .bind(business_id)
        .bind(category_type.as_str())
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        sort_for_display(&mut categories);
        Ok(categories)
    }

    /// Get a single category with a membership check
    pub async fn get_by_id(
        pool: &PgPool,
        business_id: Uuid,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        BusinessService::get_membership(pool, business_id, user_id).await?;
        Self::fetch(pool, business_id, category_id).await
    }

    /// Load a category row; callers have already checked membership
    async fn fetch(
        pool: &PgPool,
        business_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, business_id, name, category_type, color, icon, parent_id,
                   sort_order, is_system, created_at, updated_at
            FROM categories
            WHERE id = $1 AND business_id = $2
            "#,
        )
        .bind(category_id)
        .bind(business_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Create a category at the end of its sibling group
    pub async fn create(
        pool: &PgPool,
        business_id: Uuid,
        dto: &CreateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        BusinessService::require_finance_manager(pool, business_id, user_id).await?;

        // Trim and sanitize name
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        let icon = dto
            .icon
            .as_ref()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        BusinessService::lock_business(&mut tx, business_id).await?;

        // 1. A parent must be a top-level category of the same business and type
        if let Some(parent_id) = dto.parent_id {
            let parent = sqlx::query_as::<_, Category>(
                r#"
                SELECT id, business_id, name, category_type, color, icon, parent_id,
                       sort_order, is_system, created_at, updated_at
                FROM categories
                WHERE id = $1 AND business_id = $2
                "#,
            )
            .bind(parent_id)
            .bind(business_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Parent category not found".to_string()))?;

            if !parent.is_top_level() {
                return Err(AppError::ValidationError(
                    "Subcategories cannot have children".to_string(),
                ));
            }
            if parent.get_type() != dto.category_type {
                return Err(AppError::ValidationError(
                    "Parent category must have the same type".to_string(),
                ));
            }
        }

        // 2. Append after the existing siblings
        let sibling_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM categories
            WHERE business_id = $1 AND category_type = $2 AND parent_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(business_id)
        .bind(dto.category_type.as_str())
        .bind(dto.parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories
                (business_id, name, category_type, color, icon, parent_id, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, business_id, name, category_type, color, icon, parent_id,
                      sort_order, is_system, created_at, updated_at
            "#,
        )
        .bind(business_id)
        .bind(&name)
        .bind(dto.category_type.as_str())
        .bind(&dto.color)
        .bind(&icon)
        .bind(dto.parent_id)
        .bind(sibling_count as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            category_id = %category.id,
            business_id = %business_id,
            sort_order = category.sort_order,
            "Category created"
        );

        Ok(category)
    }

    /// Update name, color or icon of an existing category
    pub async fn update(
        pool: &PgPool,
        business_id: Uuid,
        category_id: Uuid,
        dto: &UpdateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        BusinessService::require_finance_manager(pool, business_id, user_id).await?;
        let existing = Self::fetch(pool, business_id, category_id).await?;

        // Build update values
        let new_name = match &dto.name {
            Some(n) => {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Name cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => existing.name,
        };

        let new_color = dto.color.as_ref().unwrap_or(&existing.color);
        let new_icon = match &dto.icon {
            Some(i) => Some(i.trim().to_string()).filter(|i| !i.is_empty()),
            None => existing.icon,
        };

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, color = $3, icon = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, business_id, name, category_type, color, icon, parent_id,
                      sort_order, is_system, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(&new_name)
        .bind(new_color)
        .bind(&new_icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Apply a drag-and-drop move.
    /// All placement writes happen in one transaction against freshly locked rows.
    pub async fn reorder(
        pool: &PgPool,
        business_id: Uuid,
        dto: &ReorderCategoriesDto,
        user_id: Uuid,
    ) -> Result<ReorderOutcome, AppError> {
        BusinessService::require_finance_manager(pool, business_id, user_id).await?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        BusinessService::lock_business(&mut tx, business_id).await?;

        // 1. The dragged category decides which type's tree is loaded
        let category_type = sqlx::query_scalar::<_, String>(
            "SELECT category_type FROM categories WHERE id = $1 AND business_id = $2",
        )
        .bind(dto.dragged_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, business_id, name, category_type, color, icon, parent_id,
                   sort_order, is_system, created_at, updated_at
            FROM categories
            WHERE business_id = $1 AND category_type = $2
            ORDER BY parent_id NULLS FIRST, sort_order ASC, name ASC
            FOR UPDATE
            "#,
        )
        .bind(business_id)
        .bind(&category_type)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 2. Reject moves computed against a stale view
        if let Err(e) = check_version(dto.expected_version, group_version(&categories)) {
            warn!(
                business_id = %business_id,
                expected = ?dto.expected_version,
                "Rejected reorder against stale categories"
            );
            return Err(e);
        }

        // 3. Compute the new placements
        let category_move = CategoryMove {
            dragged_id: dto.dragged_id,
            target_id: dto.target_id,
            intent: dto.drop_intent,
        };
        let updated = reorder(&categories, &category_move);
        let changed = changed_placements(&categories, &updated);

        if changed.is_empty() {
            debug!(
                business_id = %business_id,
                dragged_id = %dto.dragged_id,
                "Reorder produced no changes"
            );
            return Ok(ReorderOutcome {
                changed,
                categories,
            });
        }

        // 4. Persist every changed placement
        for placement in &changed {
            sqlx::query(
                r#"
                UPDATE categories
                SET parent_id = $2, sort_order = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(placement.id)
            .bind(placement.parent_id)
            .bind(placement.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        }

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, business_id, name, category_type, color, icon, parent_id,
                   sort_order, is_system, created_at, updated_at
            FROM categories
            WHERE business_id = $1 AND category_type = $2
            ORDER BY parent_id NULLS FIRST, sort_order ASC, name ASC
            "#,
        )
        .bind(business_id)
        .bind(&category_type)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            business_id = %business_id,
            dragged_id = %dto.dragged_id,
            changed = changed.len(),
            "Categories reordered"
        );

        Ok(ReorderOutcome {
            changed,
            categories,
        })
    }
}
