use std::path::Path;

use eframe::egui::{ColorImage, Rect};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dashboard snapshot export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export (empty snapshot)")]
    EmptyImage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("snapshot buffer does not match its size")]
    BufferSize,
}

/// Cut the dashboard area out of a full-window screenshot.
pub fn crop_to_region(screenshot: &ColorImage, region: Rect, pixels_per_point: f32) -> ColorImage {
    screenshot.region(&region, Some(pixels_per_point))
}

/// Write the snapshot. A `.png` path gets a PNG, anything else a single-page
/// PDF sized to the image.
pub fn write_snapshot(snapshot: &ColorImage, path: &Path) -> Result<(), ExportError> {
    let [width, height] = snapshot.size;
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyImage);
    }

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        let rgba: Vec<u8> = snapshot
            .pixels
            .iter()
            .flat_map(|c| c.to_srgba_unmultiplied())
            .collect();
        let buffer = image::RgbaImage::from_raw(width as u32, height as u32, rgba)
            .ok_or(ExportError::BufferSize)?;
        buffer.save_with_format(path, image::ImageFormat::Png)?;
    } else {
        let rgb: Vec<u8> = snapshot
            .pixels
            .iter()
            .flat_map(|c| {
                let [r, g, b, _] = c.to_srgba_unmultiplied();
                [r, g, b]
            })
            .collect();
        let pdf = encode_pdf(width, height, &rgb)?;
        std::fs::write(path, pdf)?;
    }

    log::info!("Exported {width}x{height} snapshot to {}", path.display());
    Ok(())
}

/// One page whose MediaBox is the image size, with the image drawn
/// full-page as a Flate-compressed RGB XObject.
pub fn encode_pdf(width: usize, height: usize, rgb: &[u8]) -> Result<Vec<u8>, ExportError> {
    if rgb.len() != width * height * 3 {
        return Err(ExportError::BufferSize);
    }
    let (w, h) = (width as i64, height as i64);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        rgb.to_vec(),
    ));
    let content = format!("q {w} 0 0 {h} 0 0 cm /Im0 Do Q");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), w.into(), h.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, Color32};

    #[test]
    fn pdf_has_one_page_sized_to_the_image() {
        let rgb = [255u8, 0, 0, 0, 0, 255];
        let pdf = encode_pdf(2, 1, &rgb).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box: Vec<i64> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_i64().unwrap())
            .collect();
        assert_eq!(media_box, [0, 0, 2, 1]);

        let image = doc
            .objects
            .values()
            .find_map(|o| match o {
                Object::Stream(s)
                    if s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok()
                        == Some(&b"Image"[..]) =>
                {
                    Some(s)
                }
                _ => None,
            })
            .unwrap();
        // Streams too small to benefit are stored without a filter.
        let data = image
            .decompressed_content()
            .unwrap_or_else(|_| image.content.clone());
        assert_eq!(data, rgb);
    }

    #[test]
    fn pdf_image_data_is_compressed() {
        let rgb = vec![240u8; 400 * 300 * 3];
        let pdf = encode_pdf(400, 300, &rgb).unwrap();
        assert!(pdf.len() < rgb.len() / 10, "pdf is {} bytes", pdf.len());
    }

    #[test]
    fn pdf_rejects_mismatched_buffer() {
        assert!(matches!(encode_pdf(2, 2, &[0; 3]), Err(ExportError::BufferSize)));
    }

    #[test]
    fn writes_png_and_pdf_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = ColorImage::new([3, 2], Color32::from_rgb(10, 20, 30));

        let png = dir.path().join("dash.png");
        write_snapshot(&img, &png).unwrap();
        assert_eq!(image::image_dimensions(&png).unwrap(), (3, 2));

        let pdf = dir.path().join("dash.pdf");
        write_snapshot(&img, &pdf).unwrap();
        assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn empty_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let img = ColorImage::new([0, 0], Color32::WHITE);
        let err = write_snapshot(&img, &dir.path().join("x.pdf")).unwrap_err();
        assert!(matches!(err, ExportError::EmptyImage));
    }

    #[test]
    fn crop_scales_by_pixels_per_point() {
        let img = ColorImage::new([100, 80], Color32::BLACK);
        let cropped = crop_to_region(&img, Rect::from_min_max(pos2(10.0, 10.0), pos2(30.0, 20.0)), 2.0);
        assert_eq!(cropped.size, [40, 20]);
    }
}
