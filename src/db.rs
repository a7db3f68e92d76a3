pub mod store;
pub use store::{CatalogStore, ClassificationStore, EntryStore, RecordStore};

pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod entry_repo;
pub use entry_repo::EntryRepository;
pub mod classification_repo;
pub use classification_repo::ClassificationRepository;

pub mod pg_store;
pub use pg_store::PgRecordStore;
pub mod memory_store;
pub use memory_store::MemoryRecordStore;
