//! Image decoding and pixel arrays
//!
//! Every image entering the pipeline goes through [`load_image`]: decode,
//! resize to the configured size with a cubic filter, and lay the pixels out
//! channel-first as `u8` values.

use std::fmt;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};

use crate::utils::error::{CatDogError, Result, ResultExt};

/// Dimensions shared by every array of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl ImageShape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Number of values in one array (C * H * W)
    pub fn len(&self) -> usize {
        self.channels * self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Only grayscale and RGB are supported
    pub fn validate(&self) -> Result<()> {
        if self.channels != 1 && self.channels != 3 {
            return Err(CatDogError::Config(format!(
                "channels must be 1 or 3, got {}",
                self.channels
            )));
        }
        if self.height == 0 || self.width == 0 {
            return Err(CatDogError::Config(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.channels, self.height, self.width)
    }
}

/// Channel-first `u8` pixel data: index = c * H * W + y * W + x
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelArray {
    shape: ImageShape,
    data: Vec<u8>,
}

impl PixelArray {
    /// Wrap raw CHW data; the length must match the shape
    pub fn from_raw(shape: ImageShape, data: Vec<u8>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(CatDogError::Dataset(format!(
                "pixel buffer of {} values does not fit shape {}",
                data.len(),
                shape
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, channel: usize, y: usize, x: usize) -> u8 {
        let ImageShape { height, width, .. } = self.shape;
        self.data[channel * height * width + y * width + x]
    }

    /// Convert a decoded image (already at the target size) to CHW layout
    fn from_image(img: &DynamicImage, shape: ImageShape) -> Self {
        let (height, width) = (shape.height, shape.width);
        let plane = height * width;
        let mut data = vec![0u8; shape.len()];

        if shape.channels == 1 {
            let luma = img.to_luma8();
            for (x, y, pixel) in luma.enumerate_pixels() {
                data[y as usize * width + x as usize] = pixel[0];
            }
        } else {
            let rgb = img.to_rgb8();
            for (x, y, pixel) in rgb.enumerate_pixels() {
                let offset = y as usize * width + x as usize;
                data[offset] = pixel[0];
                data[plane + offset] = pixel[1];
                data[2 * plane + offset] = pixel[2];
            }
        }

        Self { shape, data }
    }

    /// Back to an interleaved RGB image; grayscale is replicated on all channels
    pub fn to_rgb_image(&self) -> RgbImage {
        let ImageShape {
            channels,
            height,
            width,
        } = self.shape;

        RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            if channels == 1 {
                let v = self.get(0, y, x);
                image::Rgb([v, v, v])
            } else {
                image::Rgb([self.get(0, y, x), self.get(1, y, x), self.get(2, y, x)])
            }
        })
    }
}

/// Decode `path` and normalise it to `shape`
///
/// The format is guessed from the file content, falling back to the
/// extension. Open and decode failures are reported as
/// [`CatDogError::ImageLoad`] naming the file.
pub fn load_image(path: &Path, shape: ImageShape) -> Result<PixelArray> {
    shape.validate()?;

    let img = ImageReader::open(path)
        .image_context(path)?
        .with_guessed_format()
        .image_context(path)?
        .decode()
        .image_context(path)?;

    let resized = img.resize_exact(
        shape.width as u32,
        shape.height as u32,
        FilterType::CatmullRom,
    );

    Ok(PixelArray::from_image(&resized, shape))
}

/// Put `left` and `right` next to each other
pub fn concat_horizontal(left: &PixelArray, right: &PixelArray) -> Result<PixelArray> {
    let (a, b) = (left.shape(), right.shape());
    if a.channels != b.channels || a.height != b.height {
        return Err(CatDogError::ShapeMismatch {
            index: 1,
            expected: format!("({}, {}, _)", a.channels, a.height),
            found: b.to_string(),
        });
    }

    let shape = ImageShape::new(a.channels, a.height, a.width + b.width);
    let mut data = Vec::with_capacity(shape.len());
    for c in 0..a.channels {
        for y in 0..a.height {
            let row_a = c * a.height * a.width + y * a.width;
            let row_b = c * b.height * b.width + y * b.width;
            data.extend_from_slice(&left.data[row_a..row_a + a.width]);
            data.extend_from_slice(&right.data[row_b..row_b + b.width]);
        }
    }

    Ok(PixelArray { shape, data })
}

/// Per-pixel rounded mean of equally shaped arrays
pub fn mean_image<'a, I>(arrays: I) -> Result<PixelArray>
where
    I: IntoIterator<Item = &'a PixelArray>,
{
    let mut iter = arrays.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| CatDogError::Dataset("cannot average an empty set of images".into()))?;
    let shape = first.shape();

    let mut sums: Vec<u64> = first.data.iter().map(|&v| v as u64).collect();
    let mut count = 1u64;

    for (i, array) in iter.enumerate() {
        if array.shape() != shape {
            return Err(CatDogError::ShapeMismatch {
                index: i + 1,
                expected: shape.to_string(),
                found: array.shape().to_string(),
            });
        }
        for (sum, &v) in sums.iter_mut().zip(&array.data) {
            *sum += v as u64;
        }
        count += 1;
    }

    let data = sums
        .into_iter()
        .map(|sum| ((sum + count / 2) / count) as u8)
        .collect();

    Ok(PixelArray { shape, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb(color))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_decoded_array_has_configured_shape() {
        let dir = TempDir::new().unwrap();
        let shape = ImageShape::new(3, 64, 64);

        for (i, (w, h)) in [(10, 20), (200, 50), (64, 64), (1, 1)].iter().enumerate() {
            let path = write_png(dir.path(), &format!("img{}.png", i), *w, *h, [10, 20, 30]);
            let array = load_image(&path, shape).unwrap();
            assert_eq!(array.shape(), shape);
            assert_eq!(array.as_slice().len(), 3 * 64 * 64);
        }
    }

    #[test]
    fn test_channel_first_rgb_order() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "red.png", 4, 4, [200, 100, 50]);
        let array = load_image(&path, ImageShape::new(3, 4, 4)).unwrap();

        assert_eq!(array.get(0, 0, 0), 200);
        assert_eq!(array.get(1, 3, 3), 100);
        assert_eq!(array.get(2, 2, 1), 50);
        assert!(array.as_slice()[..16].iter().all(|&v| v == 200));
    }

    #[test]
    fn test_grayscale_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(8, 8, Luma([77])).save(&path).unwrap();

        let array = load_image(&path, ImageShape::new(1, 5, 5)).unwrap();
        assert_eq!(array.as_slice().len(), 25);
        assert!(array.as_slice().iter().all(|&v| v == 77));
    }

    #[test]
    fn test_format_guessed_from_content() {
        let dir = TempDir::new().unwrap();
        let png = write_png(dir.path(), "tmp.png", 6, 6, [1, 2, 3]);
        let disguised = dir.path().join("cat.1.jpg");
        std::fs::rename(&png, &disguised).unwrap();

        assert!(load_image(&disguised, ImageShape::new(3, 6, 6)).is_ok());
    }

    #[test]
    fn test_corrupt_file_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dog.3.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = load_image(&path, ImageShape::new(3, 8, 8)).unwrap_err();
        match err {
            CatDogError::ImageLoad(p, _) => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_fails_loudly() {
        let path = Path::new("/nonexistent/cat.0.jpg");
        let err = load_image(path, ImageShape::new(3, 8, 8)).unwrap_err();
        assert!(matches!(err, CatDogError::ImageLoad(_, _)));
    }

    #[test]
    fn test_invalid_channel_count() {
        let err = load_image(Path::new("x.png"), ImageShape::new(2, 8, 8)).unwrap_err();
        assert!(matches!(err, CatDogError::Config(_)));
    }

    #[test]
    fn test_concat_and_mean() {
        let shape = ImageShape::new(1, 1, 2);
        let a = PixelArray::from_raw(shape, vec![0, 10]).unwrap();
        let b = PixelArray::from_raw(shape, vec![20, 31]).unwrap();

        let joined = concat_horizontal(&a, &b).unwrap();
        assert_eq!(joined.shape(), ImageShape::new(1, 1, 4));
        assert_eq!(joined.as_slice(), &[0, 10, 20, 31]);

        let mean = mean_image([&a, &b]).unwrap();
        assert_eq!(mean.as_slice(), &[10, 21]);

        assert!(mean_image(std::iter::empty::<&PixelArray>()).is_err());
    }

    #[test]
    fn test_to_rgb_image_round_trip_pixel() {
        let shape = ImageShape::new(3, 1, 1);
        let array = PixelArray::from_raw(shape, vec![9, 8, 7]).unwrap();
        let img = array.to_rgb_image();
        assert_eq!(img.get_pixel(0, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(PixelArray::from_raw(ImageShape::new(3, 2, 2), vec![0; 11]).is_err());
    }
}
