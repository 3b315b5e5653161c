use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref COLOR_HEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid color regex");
}

/// Validate hex color format (#RRGGBB)
fn validate_color_hex(color: &str) -> Result<(), ValidationError> {
    if !COLOR_HEX.is_match(color) {
        return Err(ValidationError::new("invalid_color_hex"));
    }
    Ok(())
}

/// Ledger side a category belongs to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    #[default]
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(CategoryType::Income),
            "expense" => Some(CategoryType::Expense),
            _ => None,
        }
    }
}

/// Where a dragged category lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DropIntent {
    #[default]
    Before,
    After,
    Inside,
}

impl DropIntent {
    /// Map a pointer offset within the target row to an intent:
    /// top quarter is `Before`, bottom quarter is `After`, the middle half is `Inside`.
    pub fn from_pointer(offset: f64, height: f64) -> Self {
        if offset < height * 0.25 {
            DropIntent::Before
        } else if offset > height * 0.75 {
            DropIntent::After
        } else {
            DropIntent::Inside
        }
    }

    /// Subcategories cannot have children, so `Inside` on one degrades to `Before`.
    pub fn for_target(self, target_is_top_level: bool) -> Self {
        match self {
            DropIntent::Inside if !target_is_top_level => DropIntent::Before,
            other => other,
        }
    }
}

/// Database entity for categories
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub category_type: String,
    pub color: String,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn get_type(&self) -> CategoryType {
        CategoryType::parse(&self.category_type).unwrap_or_default()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Latest `updated_at` across a set of categories, used as the group version.
pub fn group_version(categories: &[Category]) -> Option<DateTime<Utc>> {
    categories.iter().map(|c| c.updated_at).max()
}

/// Order categories the way the settings screen shows them: each top-level
/// category by position, followed by its subcategories by position.
/// Subcategories whose parent is missing go last.
pub fn sort_for_display(categories: &mut [Category]) {
    let top_level: HashMap<Uuid, i32> = categories
        .iter()
        .filter(|c| c.is_top_level())
        .map(|c| (c.id, c.sort_order))
        .collect();

    categories.sort_by_cached_key(|c| {
        let (group_rank, group_id) = match c.parent_id {
            None => (c.sort_order, c.id),
            Some(parent_id) => (
                top_level.get(&parent_id).copied().unwrap_or(i32::MAX),
                parent_id,
            ),
        };
        (
            group_rank,
            group_id,
            c.parent_id.is_some(),
            c.sort_order,
            c.name.clone(),
        )
    });
}

/// Category information returned in responses
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Unique category identifier
    pub id: Uuid,
    /// Owning business
    pub business_id: Uuid,
    /// Category name
    #[schema(example = "Ingredients")]
    pub name: String,
    /// income or expense
    #[schema(example = "expense")]
    pub category_type: String,
    /// Display color in hex format
    #[schema(example = "#F97316")]
    pub color: String,
    /// Icon key
    #[schema(example = "wheat")]
    pub icon: Option<String>,
    /// Parent category, null for top-level categories
    pub parent_id: Option<Uuid>,
    /// Position among siblings, starting at 0
    #[schema(example = 0)]
    pub sort_order: i32,
    /// Shipped with the product
    pub is_system: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(cat: Category) -> Self {
        Self {
            id: cat.id,
            business_id: cat.business_id,
            name: cat.name,
            category_type: cat.category_type,
            color: cat.color,
            icon: cat.icon,
            parent_id: cat.parent_id,
            sort_order: cat.sort_order,
            is_system: cat.is_system,
            created_at: cat.created_at,
            updated_at: cat.updated_at,
        }
    }
}

/// A top-level category with its subcategories in sort order
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub children: Vec<CategoryResponse>,
}

impl CategoryTreeNode {
    /// Group a flat category list into top-level nodes. Subcategories whose
    /// parent is not in the list are left out of the tree.
    pub fn build(categories: &[Category]) -> Vec<CategoryTreeNode> {
        let mut top_level: Vec<&Category> =
            categories.iter().filter(|c| c.is_top_level()).collect();
        top_level.sort_by_key(|c| c.sort_order);

        top_level
            .into_iter()
            .map(|parent| {
                let mut children: Vec<&Category> = categories
                    .iter()
                    .filter(|c| c.parent_id == Some(parent.id))
                    .collect();
                children.sort_by_key(|c| c.sort_order);

                CategoryTreeNode {
                    category: CategoryResponse::from(parent.clone()),
                    children: children
                        .into_iter()
                        .cloned()
                        .map(CategoryResponse::from)
                        .collect(),
                }
            })
            .collect()
    }
}

/// Categories of one type, flat and as a tree
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListResponse {
    pub count: usize,
    /// Latest update timestamp in the list; send back as `expectedVersion` when reordering
    pub version: Option<DateTime<Utc>>,
    pub categories: Vec<CategoryResponse>,
    pub tree: Vec<CategoryTreeNode>,
}

impl CategoryListResponse {
    pub fn from_categories(mut categories: Vec<Category>) -> Self {
        sort_for_display(&mut categories);
        let tree = CategoryTreeNode::build(&categories);
        let version = group_version(&categories);

        Self {
            count: categories.len(),
            version,
            categories: categories.into_iter().map(CategoryResponse::from).collect(),
            tree,
        }
    }
}

/// New parent and position of a category after a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPlacement {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Result of a reorder request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    /// False when the move was ignored
    pub moved: bool,
    /// Categories whose parent or position changed
    pub changed: Vec<CategoryPlacement>,
    /// All categories of the affected type after the move
    pub list: CategoryListResponse,
}

fn default_color() -> String {
    "#64748b".to_string()
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Packaging")]
    pub name: String,

    /// income or expense
    pub category_type: CategoryType,

    /// Display color in hex format (defaults to #64748b)
    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be in #RRGGBB format"
    ))]
    #[serde(default = "default_color")]
    #[schema(example = "#F97316")]
    pub color: String,

    /// Icon key
    #[validate(length(min = 1, max = 50, message = "Icon must be 1-50 characters"))]
    #[schema(example = "box")]
    pub icon: Option<String>,

    /// Top-level category of the same type to nest under
    pub parent_id: Option<Uuid>,
}

/// Request body for updating a category (PATCH - all fields optional).
/// Type, parent and position are not editable here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    /// Category name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Flour & Sugar")]
    pub name: Option<String>,

    /// Display color in hex format
    #[schema(example = "#2196F3")]
    pub color: Option<String>,

    /// Icon key
    #[validate(length(min = 1, max = 50, message = "Icon must be 1-50 characters"))]
    pub icon: Option<String>,
}

impl UpdateCategoryDto {
    /// Validate color field
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if let Some(color) = &self.color {
            validate_color_hex(color)?;
        }
        Ok(())
    }
}

/// Request body for a drag-and-drop move
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesDto {
    /// Category being dragged
    pub dragged_id: Uuid,
    /// Category dropped onto; omit for a drop on the background (promote to top level)
    pub target_id: Option<Uuid>,
    /// Placement relative to the target
    #[serde(default)]
    pub drop_intent: DropIntent,
    /// `version` from the list the client rendered; stale versions are rejected
    pub expected_version: Option<DateTime<Utc>>,
}

/// Query parameters for listing categories
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryTypeQuery {
    /// income or expense
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// Path parameters for business-scoped routes
#[derive(Debug, Deserialize, IntoParams)]
pub struct BusinessIdPath {
    /// Business UUID
    pub business_id: Uuid,
}

/// Path parameters for a single category
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryPath {
    /// Business UUID
    pub business_id: Uuid,
    /// Category UUID
    pub id: Uuid,
}
