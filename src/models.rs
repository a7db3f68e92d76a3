pub mod catalog;
pub mod classification;
pub mod entry;
