//! Signature region cropping.
//!
//! Takes the bounding boxes reported by the region detector, keeps those
//! of the signature class, and persists each crop as an addressable PNG
//! artifact. Absence of signatures is a valid outcome - the cropper
//! returns an empty list, never an error, when nothing matches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CertivaError, Result};

/// Detector class id assigned to signature regions.
pub const SIGNATURE_CLASS_ID: u32 = 0;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Clamp the box to the image dimensions.
    fn clamp(&self, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(width),
            y1: self.y1.min(height),
            x2: self.x2.min(width),
            y2: self.y2.min(height),
        }
    }

    fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// One region reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: u32,
    pub confidence: f32,
}

/// A cropped signature region persisted on disk.
///
/// Lifecycle ends when the caller discards the output folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureArtifact {
    /// Identifier of the document the crop came from.
    pub source_document: String,
    /// Region within the source document.
    pub bounding_box: BoundingBox,
    /// Where the crop was written.
    pub stored_path: PathBuf,
}

/// Turn a student name into a filesystem-safe artifact label.
///
/// Falls back to "unknown" when nothing usable remains.
pub fn sanitize_label(name: &str) -> String {
    let label: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if label.is_empty() {
        "unknown".to_string()
    } else {
        label
    }
}

/// Crops detected signature regions out of document images.
pub struct RegionCropper {
    output_folder: PathBuf,
    signature_class: u32,
}

impl RegionCropper {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            signature_class: SIGNATURE_CLASS_ID,
        }
    }

    /// Override the detector class treated as "signature".
    pub fn with_signature_class(mut self, class_id: u32) -> Self {
        self.signature_class = class_id;
        self
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Crop every signature-class detection and persist the results.
    ///
    /// Artifacts are named `{label}_signature_{idx}.png`; the ordinal
    /// index keeps multiple signatures on one document from colliding.
    /// Returns an empty Vec when no detection matches the class filter.
    ///
    /// # Errors
    ///
    /// [`CertivaError::ImageUnreadable`] when the source bytes cannot be
    /// decoded; [`CertivaError::Io`] when the output folder or an
    /// artifact cannot be written.
    pub fn crop(
        &self,
        source_document: &str,
        image_bytes: &[u8],
        detections: &[Detection],
        label: Option<&str>,
    ) -> Result<Vec<SignatureArtifact>> {
        let image = image::load_from_memory(image_bytes).map_err(|e| {
            CertivaError::ImageUnreadable(format!("failed to decode document image: {e}"))
        })?;

        std::fs::create_dir_all(&self.output_folder)?;

        let label = sanitize_label(label.unwrap_or("unknown"));
        let mut artifacts = Vec::new();

        for detection in detections {
            if detection.class_id != self.signature_class {
                continue;
            }

            let bbox = detection.bbox.clamp(image.width(), image.height());
            if bbox.width() == 0 || bbox.height() == 0 {
                debug!(?bbox, "Skipping degenerate signature region");
                continue;
            }

            let crop = image.crop_imm(bbox.x1, bbox.y1, bbox.width(), bbox.height());
            let stored_path = self
                .output_folder
                .join(format!("{}_signature_{}.png", label, artifacts.len()));

            crop.save(&stored_path)
                .map_err(|e| CertivaError::Io(std::io::Error::other(e)))?;

            debug!(path = %stored_path.display(), "Stored signature crop");

            artifacts.push(SignatureArtifact {
                source_document: source_document.to_string(),
                bounding_box: bbox,
                stored_path,
            });
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 200, 200]),
        ));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode test image");
        bytes.into_inner()
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("John Albert Doe"), "john_albert_doe");
        assert_eq!(sanitize_label("  A  B  "), "a__b");
        assert_eq!(sanitize_label("../../etc"), "etc");
        assert_eq!(sanitize_label("***"), "unknown");
        assert_eq!(sanitize_label(""), "unknown");
    }

    #[test]
    fn test_crop_single_signature() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());
        let detections = [Detection {
            bbox: BoundingBox::new(10, 10, 60, 30),
            class_id: SIGNATURE_CLASS_ID,
            confidence: 0.92,
        }];

        let artifacts = cropper
            .crop("cert.png", &sample_png(100, 50), &detections, Some("Jane Doe"))
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].stored_path.ends_with("jane_doe_signature_0.png"));
        assert!(artifacts[0].stored_path.exists());
    }

    #[test]
    fn test_crop_filters_other_classes() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());
        let detections = [
            Detection {
                bbox: BoundingBox::new(0, 0, 20, 20),
                class_id: 3, // stamp, not signature
                confidence: 0.8,
            },
            Detection {
                bbox: BoundingBox::new(20, 20, 40, 40),
                class_id: SIGNATURE_CLASS_ID,
                confidence: 0.9,
            },
        ];

        let artifacts = cropper
            .crop("cert.png", &sample_png(100, 50), &detections, None)
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].stored_path.ends_with("unknown_signature_0.png"));
    }

    #[test]
    fn test_crop_no_detections_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());

        let artifacts = cropper
            .crop("cert.png", &sample_png(100, 50), &[], None)
            .unwrap();

        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_crop_clamps_out_of_bounds_box() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());
        let detections = [Detection {
            bbox: BoundingBox::new(90, 40, 500, 500),
            class_id: SIGNATURE_CLASS_ID,
            confidence: 0.7,
        }];

        let artifacts = cropper
            .crop("cert.png", &sample_png(100, 50), &detections, None)
            .unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].bounding_box, BoundingBox::new(90, 40, 100, 50));
    }

    #[test]
    fn test_crop_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());

        let err = cropper
            .crop("cert.png", b"not an image", &[], None)
            .unwrap_err();
        assert!(matches!(err, CertivaError::ImageUnreadable(_)));
    }

    #[test]
    fn test_multiple_signatures_get_ordinals() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = RegionCropper::new(dir.path());
        let detections = [
            Detection {
                bbox: BoundingBox::new(0, 0, 20, 20),
                class_id: SIGNATURE_CLASS_ID,
                confidence: 0.9,
            },
            Detection {
                bbox: BoundingBox::new(40, 0, 60, 20),
                class_id: SIGNATURE_CLASS_ID,
                confidence: 0.85,
            },
        ];

        let artifacts = cropper
            .crop("cert.png", &sample_png(100, 50), &detections, Some("A B"))
            .unwrap();

        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].stored_path.ends_with("a_b_signature_0.png"));
        assert!(artifacts[1].stored_path.ends_with("a_b_signature_1.png"));
    }
}
