use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::bill;

/// Identifies the user a request is made on behalf of.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerQuery {
    /// ID of the requesting user.
    #[param(example = 42)]
    pub user_id: i32,
}

/// Response DTO for a single bill.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BillResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Owning user.
    #[schema(example = 42)]
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub product_id: Option<i32>,
    /// Display name.
    #[schema(example = "invoice.pdf")]
    pub name: String,
    /// Storage reference of the uploaded file.
    #[schema(example = "http://localhost:8080/uploads/9b2e.../bills/1718000000000000000_invoice.pdf")]
    pub file_url: String,
    /// MIME content type captured at upload.
    #[schema(example = "application/pdf")]
    pub file_type: String,
    #[schema(example = 129.99)]
    pub amount: Option<f64>,
    #[schema(example = "2024-07-01")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<bill::Model> for BillResponse {
    fn from(model: bill::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            product_id: model.product_id,
            name: model.name,
            file_url: model.file_url,
            file_type: model.file_type,
            amount: model.amount,
            due_date: model.due_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
