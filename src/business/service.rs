use sqlx::PgPool;
use uuid::Uuid;

use super::models::Membership;
use crate::errors::AppError;

/// Tenant lookups shared by the business-scoped services.
pub struct BusinessService;

impl BusinessService {
    /// Fetch the caller's membership. Non-members get NotFound so business ids don't leak.
    pub async fn get_membership(
        pool: &PgPool,
        business_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, AppError> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT business_id, user_id, can_manage_finance
            FROM business_members
            WHERE business_id = $1 AND user_id = $2
            "#,
        )
        .bind(business_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Business not found".to_string()))
    }

    /// Membership check for write operations
    pub async fn require_finance_manager(
        pool: &PgPool,
        business_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, AppError> {
        let membership = Self::get_membership(pool, business_id, user_id).await?;
        membership.ensure_can_manage_finance()?;
        Ok(membership)
    }

    /// Lock the business row for the rest of the transaction. Serializes
    /// category writes per tenant, including inserts into empty groups.
    pub async fn lock_business(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        business_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM businesses WHERE id = $1 FOR UPDATE")
            .bind(business_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Business not found".to_string()))?;

        Ok(())
    }
}
