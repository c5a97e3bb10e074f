//! Binary-signature classification of files offered for printing.
//!
//! Only the leading bytes (and, for ZIP containers, the archive directory)
//! decide the outcome. A PDF renamed to `.docx` is still a PDF.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use {
    image::ImageFormat,
    serde::Serialize,
    tracing::debug,
    zip::ZipArchive,
};

use crate::error::{Error, Result};

/// Bytes read from the start of a file for signature checks.
const SNIFF_LEN: u64 = 64;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const RTF_MAGIC: &[u8] = b"{\\rtf";

const ODF_MIME_PREFIX: &str = "application/vnd.oasis.opendocument.";

/// Raster formats the spooler accepts directly.
const PRINTABLE_IMAGES: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// How a file can be made print-ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    PrintableAsIs,
    ConvertibleDocument,
    Unsupported,
}

/// Classification together with the detected MIME type (empty if unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFile {
    pub classification: Classification,
    pub mime: String,
}

impl ClassifiedFile {
    fn new(classification: Classification, mime: impl Into<String>) -> Self {
        Self {
            classification,
            mime: mime.into(),
        }
    }

    fn unsupported() -> Self {
        Self::new(Classification::Unsupported, "")
    }
}

/// Inspect the file at `path` and decide whether it can be printed.
pub fn classify(path: &Path) -> Result<ClassifiedFile> {
    let head = read_head(path)?;

    let result = if head.starts_with(PDF_MAGIC) {
        ClassifiedFile::new(Classification::PrintableAsIs, "application/pdf")
    } else if head.starts_with(ZIP_MAGIC) {
        classify_zip(path)?
    } else if head.starts_with(OLE2_MAGIC) {
        ClassifiedFile::new(
            Classification::ConvertibleDocument,
            "application/x-ole-storage",
        )
    } else if head.starts_with(RTF_MAGIC) {
        ClassifiedFile::new(Classification::ConvertibleDocument, "application/rtf")
    } else if let Ok(format) = image::guess_format(&head) {
        if PRINTABLE_IMAGES.contains(&format) {
            ClassifiedFile::new(Classification::PrintableAsIs, format.to_mime_type())
        } else {
            ClassifiedFile::new(Classification::Unsupported, format.to_mime_type())
        }
    } else {
        ClassifiedFile::unsupported()
    };

    debug!(
        path = %path.display(),
        classification = ?result.classification,
        mime = %result.mime,
        "classified file"
    );
    Ok(result)
}

/// Read at most [`SNIFF_LEN`] bytes from the start of the file.
pub(crate) fn read_head(path: &Path) -> Result<Vec<u8>> {
    let file = open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .map_err(|e| Error::external(format!("failed to read {}", path.display()), e))?;
    Ok(head)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::not_found(path),
        _ => Error::external(format!("failed to open {}", path.display()), e),
    })
}

/// OOXML and ODF documents are ZIP containers; tell them apart from
/// ordinary archives by their entries.
fn classify_zip(path: &Path) -> Result<ClassifiedFile> {
    let mut archive = match ZipArchive::new(open(path)?) {
        Ok(a) => a,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable zip container");
            return Ok(ClassifiedFile::new(
                Classification::Unsupported,
                "application/zip",
            ));
        },
    };

    if let Some(mime) = odf_mimetype(&mut archive) {
        return Ok(ClassifiedFile::new(
            Classification::ConvertibleDocument,
            mime,
        ));
    }

    let mut has_content_types = false;
    let mut ooxml_mime = None;
    for name in archive.file_names() {
        if name == "[Content_Types].xml" {
            has_content_types = true;
        } else if ooxml_mime.is_none() {
            ooxml_mime = ooxml_part_mime(name);
        }
    }

    match ooxml_mime {
        Some(mime) if has_content_types => Ok(ClassifiedFile::new(
            Classification::ConvertibleDocument,
            mime,
        )),
        _ => Ok(ClassifiedFile::new(
            Classification::Unsupported,
            "application/zip",
        )),
    }
}

/// ODF packages store their MIME type, uncompressed, as the first entry.
fn odf_mimetype(archive: &mut ZipArchive<File>) -> Option<String> {
    let mut entry = archive.by_index(0).ok()?;
    if entry.name() != "mimetype" {
        return None;
    }
    let mut mime = String::new();
    (&mut entry).take(128).read_to_string(&mut mime).ok()?;
    let mime = mime.trim();
    mime.starts_with(ODF_MIME_PREFIX).then(|| mime.to_string())
}

fn ooxml_part_mime(name: &str) -> Option<&'static str> {
    if name.starts_with("word/") {
        Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
    } else if name.starts_with("xl/") {
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    } else if name.starts_with("ppt/") {
        Some("application/vnd.openxmlformats-officedocument.presentationml.presentation")
    } else {
        None
    }
}
