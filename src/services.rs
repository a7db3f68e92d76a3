pub mod catalog_service;
pub mod classification_service;
pub mod entry_service;
pub mod unit_catalog;
pub mod workflow_service;

#[cfg(test)]
pub mod test_support;
