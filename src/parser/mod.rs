// Parser module: purchase-history documents and their import into the mapping store.

pub mod importer;
pub mod purchase_history;

pub use importer::import_documents;
pub use purchase_history::{Parser, PurchaseHistoryParser};
