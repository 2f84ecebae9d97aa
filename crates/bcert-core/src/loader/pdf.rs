//! PDF page rasterization.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageImage, conversion_io};
use crate::error::ConversionError;

type Result<T> = std::result::Result<T, ConversionError>;

/// Renders every page of a PDF to an encoded image, in page order.
pub trait PdfRasterizer: Send + Sync {
    fn render(&self, path: &Path) -> Result<Vec<PageImage>>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
///
/// Pages are written to a temporary directory that is removed when rendering
/// returns, whether it succeeded or not.
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
    max_pages: usize,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dpi: 200,
            max_pages: 0,
        }
    }

    /// Set the rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Render at most this many pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn render(&self, path: &Path) -> Result<Vec<PageImage>> {
        let temp_dir = tempfile::Builder::new()
            .prefix("bcert-pages")
            .tempdir()
            .map_err(|e| conversion_io("failed to create temp dir", e))?;

        let mut command = Command::new(&self.program);
        command.arg("-jpeg").arg("-r").arg(self.dpi.to_string());
        if self.max_pages > 0 {
            command.arg("-l").arg(self.max_pages.to_string());
        }
        command.arg(path).arg(temp_dir.path().join("page"));

        debug!("Running {:?}", command);
        let output = command.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConversionError::MissingTool(self.program.display().to_string())
            } else {
                conversion_io("failed to run pdftoppm", e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::Render(format!(
                "pdftoppm exited with {} for {}: {}",
                output.status,
                path.display(),
                stderr.trim()
            )));
        }

        let mut rendered: Vec<(u32, PathBuf)> = fs::read_dir(temp_dir.path())
            .map_err(|e| conversion_io("failed to list rendered pages", e))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                page_number(&name.to_string_lossy()).map(|n| (n, entry.path()))
            })
            .collect();
        rendered.sort_by_key(|(n, _)| *n);

        let mut pages = Vec::with_capacity(rendered.len());
        for (page, file) in rendered {
            let data = fs::read(&file).map_err(|e| conversion_io("failed to read page", e))?;
            trace!("Page {}: {} bytes", page, data.len());
            pages.push(PageImage { page, data });
        }

        Ok(pages)
    }
}

/// Page number of a `pdftoppm` output file such as `page-1.jpg` or `page-007.jpg`.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}

/// Rasterizer that reuses the scanned image embedded in each page.
///
/// Scanned certificates usually carry one full-page image per page, so the
/// largest image XObject on a page stands in for the rendered page.
pub struct EmbeddedImageRasterizer {
    max_pages: usize,
}

impl EmbeddedImageRasterizer {
    pub fn new() -> Self {
        Self { max_pages: 0 }
    }

    /// Render at most this many pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Extract page images from PDF bytes.
    pub fn render_bytes(&self, data: &[u8]) -> Result<Vec<PageImage>> {
        let mut doc = Document::load_mem(data).map_err(|e| ConversionError::Pdf(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(ConversionError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_ids = doc.get_pages();
        let limit = if self.max_pages == 0 { usize::MAX } else { self.max_pages };

        let mut pages = Vec::new();
        for (&number, &page_id) in page_ids.iter().take(limit) {
            match largest_page_image(&doc, page_id) {
                Some(data) => pages.push(PageImage { page: number, data }),
                None => debug!("Page {} has no embedded image, skipping", number),
            }
        }

        Ok(pages)
    }
}

impl Default for EmbeddedImageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRasterizer for EmbeddedImageRasterizer {
    fn render(&self, path: &Path) -> Result<Vec<PageImage>> {
        let data = fs::read(path).map_err(|e| ConversionError::Pdf(e.to_string()))?;
        self.render_bytes(&data)
    }
}

/// An image XObject found on a page, before encoding.
struct PageXObject {
    area: u64,
    data: Vec<u8>,
}

fn largest_page_image(doc: &Document, page_id: ObjectId) -> Option<Vec<u8>> {
    let resources = page_resources(doc, page_id)?;
    let xobjects = resources.get(b"XObject").ok()?;
    let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
        return None;
    };

    xobj_dict
        .iter()
        .filter_map(|(_, obj_ref)| doc.dereference(obj_ref).ok())
        .filter_map(|(_, obj)| encode_image_object(doc, obj))
        .max_by_key(|img| img.area)
        .map(|img| img.data)
}

fn encode_image_object(doc: &Document, obj: &Object) -> Option<PageXObject> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    let area = width as u64 * height as u64;

    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // Already JPEG
                return Some(PageXObject {
                    area,
                    data: stream.content.clone(),
                });
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter, skipping");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let image = raw_to_image(&data, width, height, color_space)?;
    let mut encoded = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .ok()?;

    Some(PageXObject {
        area,
        data: encoded,
    })
}

/// Build an image from raw 8-bit samples.
fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

/// Get the resources dictionary for a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}
