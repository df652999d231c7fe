use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bill")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. Never changes after creation.
    pub user_id: i32,

    pub category_id: Option<i32>,
    pub product_id: Option<i32>,

    /// Display name; the uploaded filename unless the caller chose one.
    pub name: String,

    /// Opaque reference issued by the storage backend.
    pub file_url: String,

    /// MIME content type captured at upload.
    pub file_type: String,

    pub amount: Option<f64>,
    pub due_date: Option<Date>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
