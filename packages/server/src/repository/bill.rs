use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::storage::StorageReference;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::RepositoryError;
use crate::entity::bill;

/// A bill record that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub product_id: Option<i32>,
    pub name: String,
    pub file_url: StorageReference,
    pub file_type: String,
    pub amount: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Persist `bill` and return it with its assigned id.
    async fn create(&self, bill: NewBill) -> Result<bill::Model, RepositoryError>;

    /// All bills of `user_id`, newest first.
    async fn list_by_owner(&self, user_id: i32) -> Result<Vec<bill::Model>, RepositoryError>;

    async fn get_by_id(&self, id: i32) -> Result<bill::Model, RepositoryError>;
}

pub struct SeaOrmBillRepository {
    db: DatabaseConnection,
}

impl SeaOrmBillRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BillRepository for SeaOrmBillRepository {
    async fn create(&self, bill: NewBill) -> Result<bill::Model, RepositoryError> {
        let model = bill::ActiveModel {
            user_id: Set(bill.user_id),
            category_id: Set(bill.category_id),
            product_id: Set(bill.product_id),
            name: Set(bill.name),
            file_url: Set(bill.file_url.into_string()),
            file_type: Set(bill.file_type),
            amount: Set(bill.amount),
            due_date: Set(bill.due_date),
            created_at: Set(bill.created_at),
            updated_at: Set(bill.created_at),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    async fn list_by_owner(&self, user_id: i32) -> Result<Vec<bill::Model>, RepositoryError> {
        let bills = bill::Entity::find()
            .filter(bill::Column::UserId.eq(user_id))
            .order_by_desc(bill::Column::CreatedAt)
            .order_by_desc(bill::Column::Id)
            .all(&self.db)
            .await?;
        Ok(bills)
    }

    async fn get_by_id(&self, id: i32) -> Result<bill::Model, RepositoryError> {
        bill::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Bill {id}")))
    }
}
