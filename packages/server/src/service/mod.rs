pub mod bill;

pub use bill::{BillError, BillService, UploadBill};
