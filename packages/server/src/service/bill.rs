use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use common::storage::{BoxReader, StorageBackend, StorageError, StorageReference};
use tracing::instrument;

use crate::entity::bill;
use crate::repository::{BillRepository, NewBill, RepositoryError, UserResolver};
use crate::utils::filename::validate_flat_filename;

#[derive(Debug, thiserror::Error)]
pub enum BillError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to store bill file: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("failed to resolve download location: {0}")]
    StorageResolve(#[source] StorageError),

    #[error("failed to persist bill: {0}")]
    Persistence(#[source] RepositoryError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized access to bill")]
    Unauthorized,
}

impl From<RepositoryError> for BillError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => BillError::NotFound(what),
            other => BillError::Persistence(other),
        }
    }
}

/// Everything about an upload except the byte stream itself.
#[derive(Debug, Clone)]
pub struct UploadBill {
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub product_id: Option<i32>,
    /// Display name. Falls back to `filename` when absent or blank.
    pub name: Option<String>,
    /// Filename as sent by the client.
    pub filename: String,
    pub content_type: String,
    pub amount: Option<f64>,
    pub due_date: Option<NaiveDate>,
}

/// Outcome of undoing a storage write after the metadata insert failed.
#[derive(Debug)]
enum Compensation {
    Removed,
    Failed(StorageError),
}

/// Coordinates the storage backend and the bill repository.
///
/// Storage and database are separate systems, so an upload writes the bytes
/// first and only then inserts the record. If the insert fails the object is
/// deleted again; a failing cleanup is logged and never replaces the insert
/// error.
pub struct BillService {
    bills: Arc<dyn BillRepository>,
    users: Arc<dyn UserResolver>,
    storage: Arc<dyn StorageBackend>,
}

impl BillService {
    pub fn new(
        bills: Arc<dyn BillRepository>,
        users: Arc<dyn UserResolver>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            bills,
            users,
            storage,
        }
    }

    #[instrument(skip(self, reader, req), fields(user_id = req.user_id, filename = %req.filename))]
    pub async fn upload(&self, reader: BoxReader, req: UploadBill) -> Result<bill::Model, BillError> {
        if req.user_id <= 0 {
            return Err(BillError::Validation("user_id is required".into()));
        }
        let filename = validate_flat_filename(&req.filename)
            .map_err(|e| BillError::Validation(e.message().into()))?
            .to_string();
        let name = match req.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => filename.clone(),
        };

        // Nothing has been written yet, so a failed lookup needs no rollback.
        let external_id = self.users.resolve_external_id(req.user_id).await?;

        let storage_name = format!("{external_id}/bills/{filename}");
        let reference = self
            .storage
            .upload(reader, &storage_name)
            .await
            .map_err(BillError::StorageWrite)?;

        let new_bill = NewBill {
            user_id: req.user_id,
            category_id: req.category_id,
            product_id: req.product_id,
            name,
            file_url: reference.clone(),
            file_type: req.content_type,
            amount: req.amount,
            due_date: req.due_date,
            created_at: Utc::now(),
        };

        match self.bills.create(new_bill).await {
            Ok(created) => {
                tracing::info!(bill_id = created.id, "Bill uploaded");
                Ok(created)
            }
            Err(err) => {
                match self.compensate(&reference).await {
                    Compensation::Removed => tracing::warn!(
                        reference = %reference,
                        error = %err,
                        "Bill insert failed; stored file removed"
                    ),
                    Compensation::Failed(cleanup) => tracing::error!(
                        reference = %reference,
                        error = %err,
                        cleanup_error = %cleanup,
                        "Bill insert failed and stored file could not be removed; object is orphaned"
                    ),
                }
                Err(BillError::Persistence(err))
            }
        }
    }

    async fn compensate(&self, reference: &StorageReference) -> Compensation {
        match self.storage.delete(reference).await {
            Ok(()) => Compensation::Removed,
            Err(e) => Compensation::Failed(e),
        }
    }

    /// All bills owned by `user_id`, newest first. Empty when there are none.
    pub async fn list_by_owner(&self, user_id: i32) -> Result<Vec<bill::Model>, BillError> {
        if user_id <= 0 {
            return Err(BillError::Validation("user_id is required".into()));
        }
        Ok(self.bills.list_by_owner(user_id).await?)
    }

    /// Fetch a bill on behalf of `requesting_user_id`.
    pub async fn get_for_owner(
        &self,
        bill_id: i32,
        requesting_user_id: i32,
    ) -> Result<bill::Model, BillError> {
        let bill = self.bills.get_by_id(bill_id).await?;
        if bill.user_id != requesting_user_id {
            return Err(BillError::Unauthorized);
        }
        Ok(bill)
    }

    /// Where `requesting_user_id` should be sent to fetch the bill's file.
    #[instrument(skip(self))]
    pub async fn get_download_location(
        &self,
        bill_id: i32,
        requesting_user_id: i32,
    ) -> Result<String, BillError> {
        let bill = self.get_for_owner(bill_id, requesting_user_id).await?;
        let reference = StorageReference::new(bill.file_url);
        self.storage
            .resolve_download_location(&reference)
            .await
            .map_err(BillError::StorageResolve)
    }
}
