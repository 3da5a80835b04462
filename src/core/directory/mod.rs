mod cache;
mod config_store;
mod firestore_store;
mod partner_directory;
mod store;

pub use cache::{AgreementCache, CacheError, LocalAgreementCache};
pub use config_store::ConfigAgreementStore;
pub use firestore_store::FirestoreAgreementStore;
pub use partner_directory::{DirectoryError, PartnerDirectory};
pub use store::AgreementStore;
