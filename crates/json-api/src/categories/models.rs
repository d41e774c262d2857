//! Category Payloads

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::categories::records::CategoryRecord;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoryResponse {
    /// The unique identifier of the category
    pub uuid: Uuid,

    /// Display name, unique ignoring case
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// The date and time the category was created
    pub created_at: String,

    /// The date and time the category was last updated
    pub updated_at: String,

    /// The date and time the category was deleted
    pub deleted_at: Option<String>,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(category: CategoryRecord) -> Self {
        CategoryResponse {
            uuid: category.uuid.into(),
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_string(),
            updated_at: category.updated_at.to_string(),
            deleted_at: category.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}
