use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// A user's membership in a business
#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub can_manage_finance: bool,
}

impl Membership {
    /// Creating, editing and moving financial categories needs the finance permission.
    pub fn ensure_can_manage_finance(&self) -> Result<(), AppError> {
        if self.can_manage_finance {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Missing permission to manage financial settings".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_permission_required() {
        let mut membership = Membership {
            business_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            can_manage_finance: false,
        };
        assert!(matches!(
            membership.ensure_can_manage_finance(),
            Err(AppError::Forbidden(_))
        ));

        membership.can_manage_finance = true;
        assert!(membership.ensure_can_manage_finance().is_ok());
    }
}
