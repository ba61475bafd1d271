//! The two capabilities the renderer needs from the outside world.

use std::path::{Path, PathBuf};

use super::RenderError;
use crate::ir::Image;
use crate::mask::RasterMask;

/// Supplies `(height, width)` for an image record.
pub trait DimensionResolver: Sync {
    fn resolve(&self, image: &Image) -> Result<(u32, u32), RenderError>;
}

/// Stores a finished two-level raster at `path`.
pub trait RasterSink: Sync {
    fn persist(&self, mask: &RasterMask, path: &Path) -> Result<(), RenderError>;
}

/// Uses recorded dimensions when present, otherwise reads the header of the
/// image file (`images_dir/file_name`, or `file_name` as given).
#[derive(Clone, Debug, Default)]
pub struct FileDimensionResolver {
    pub images_dir: Option<PathBuf>,
}

impl FileDimensionResolver {
    pub fn new(images_dir: Option<PathBuf>) -> Self {
        Self { images_dir }
    }

    fn image_path(&self, image: &Image) -> PathBuf {
        match &self.images_dir {
            Some(dir) => dir.join(&image.file_name),
            None => PathBuf::from(&image.file_name),
        }
    }
}

impl DimensionResolver for FileDimensionResolver {
    fn resolve(&self, image: &Image) -> Result<(u32, u32), RenderError> {
        if let Some(dims) = image.recorded_dimensions() {
            return Ok(dims);
        }

        let invalid = |reason: String| RenderError::Dimensions {
            image_id: image.id,
            file_name: image.file_name.clone(),
            reason,
        };
        if image.file_name.is_empty() {
            return Err(invalid(
                "image entry has neither dimensions nor a file_name".to_string(),
            ));
        }

        let path = self.image_path(image);
        let size = imagesize::size(&path)
            .map_err(|source| RenderError::DimensionRead { path, source })?;

        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| invalid(format!("image height {} does not fit in u32", size.height)))?;
        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| invalid(format!("image width {} does not fit in u32", size.width)))?;
        if height == 0 || width == 0 {
            return Err(invalid(format!("image file reports {width}x{height}")));
        }

        log::debug!("resolved image {} to {}x{} from file", image.id, width, height);
        Ok((height, width))
    }
}

/// Writes masks as 8-bit grayscale images (0 / 255). The file format
/// follows the path's extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngSink;

impl RasterSink for PngSink {
    fn persist(&self, mask: &RasterMask, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(RenderError::MissingDestination {
                    path: parent.to_path_buf(),
                });
            }
        }

        let (height, width) = mask.dimensions();
        let buffer = image::GrayImage::from_raw(width, height, mask.to_luma8()).ok_or_else(|| {
            RenderError::InvalidRaster {
                path: path.to_path_buf(),
                height,
                width,
            }
        })?;
        buffer.save(path).map_err(|source| RenderError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_dimensions_win() {
        let resolver = FileDimensionResolver::new(Some(PathBuf::from("/nonexistent")));
        let image = Image::new(1u64, "missing.jpg", 3, 4);
        assert_eq!(resolver.resolve(&image).expect("resolve"), (3, 4));
    }

    #[test]
    fn test_dimensions_read_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut pixels = image::GrayImage::new(7, 5);
        pixels.put_pixel(0, 0, image::Luma([255]));
        pixels.save(dir.path().join("frame.png")).expect("save png");

        let resolver = FileDimensionResolver::new(Some(dir.path().to_path_buf()));
        let image = Image::without_dimensions(1u64, "frame.png");
        assert_eq!(resolver.resolve(&image).expect("resolve"), (5, 7));
    }

    #[test]
    fn test_unresolvable_dimensions() {
        let resolver = FileDimensionResolver::default();
        assert!(matches!(
            resolver.resolve(&Image::without_dimensions(1u64, "")),
            Err(RenderError::Dimensions { .. })
        ));
        assert!(matches!(
            resolver.resolve(&Image::without_dimensions(2u64, "/nonexistent/x.png")),
            Err(RenderError::DimensionRead { .. })
        ));
    }

    #[test]
    fn test_png_sink_writes_two_levels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mask.png");
        let mut mask = RasterMask::empty(2, 3);
        mask.set(1, 2, true);

        PngSink.persist(&mask, &path).expect("persist");

        let written = image::open(&path).expect("open").to_luma8();
        assert_eq!(written.dimensions(), (3, 2));
        assert_eq!(written.get_pixel(2, 1).0, [255]);
        assert_eq!(written.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn test_png_sink_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("mask.png");
        let err = PngSink
            .persist(&RasterMask::empty(1, 1), &path)
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
