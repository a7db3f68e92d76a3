pub mod catalog;
pub mod classification;
pub mod entries;
pub mod workflow;
