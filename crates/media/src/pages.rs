//! Page counting for print-ready artifacts.
//!
//! PDFs are loaded with `lopdf` and counted through the document's page
//! tree, so incremental updates and compressed object streams are resolved
//! the same way a viewer resolves them.

use std::path::Path;

use {
    lopdf::Document,
    tracing::{debug, warn},
};

use crate::{
    classify::{Classification, classify},
    error::{Error, Result},
};

/// Count the pages of the print-ready file at `path`.
///
/// Raster images are one page; PDFs are parsed; anything else is unknown.
/// A PDF that cannot be parsed is an error, one with an empty page tree is
/// unknown.
pub fn count_pages(path: &Path) -> Result<Option<u32>> {
    let classified = classify(path)?;
    if classified.classification != Classification::PrintableAsIs {
        return Ok(None);
    }
    if classified.mime != "application/pdf" {
        return Ok(Some(1));
    }

    let document = Document::load(path)
        .map_err(|e| Error::external(format!("failed to parse PDF {}", path.display()), e))?;
    let pages = u32::try_from(document.get_pages().len())
        .ok()
        .filter(|n| *n > 0);
    match pages {
        Some(pages) => debug!(path = %path.display(), pages, "counted PDF pages"),
        None => warn!(path = %path.display(), "PDF has no pages in its page tree"),
    }
    Ok(pages)
}

/// Serialize a PDF with `pages` empty A4 pages.
#[cfg(test)]
pub(crate) fn synthetic_pdf(pages: u32) -> Vec<u8> {
    synthetic_document(pages).0
}

/// Like [`synthetic_pdf`], also returning the page ids, the page tree id and
/// the catalog id.
#[cfg(test)]
pub(crate) fn synthetic_document(
    pages: u32,
) -> (Vec<u8>, Vec<lopdf::ObjectId>, lopdf::ObjectId, lopdf::ObjectId) {
    use lopdf::{Object, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_ids: Vec<lopdf::ObjectId> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
        })
        .collect();
    let kids: Vec<Object> = page_ids.iter().map(|id| (*id).into()).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap_or_else(|e| panic!("serialize test PDF: {e}"));
    (bytes, page_ids, pages_id, catalog_id)
}
