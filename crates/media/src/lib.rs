//! Content inspection for print jobs: signature-based classification and
//! page counting. Filenames and declared MIME types are never consulted.

pub mod classify;
pub mod error;
pub mod pages;

pub use {
    classify::{Classification, ClassifiedFile, classify},
    error::{Error, Result},
    pages::count_pages,
};
