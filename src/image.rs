use ::image::{GrayImage, RgbImage};

use crate::error::{Error, ScanResult};

// Luminance view
//------------------------------------------------------------------------------

/// Pixel layouts the engine accepts. Anything with color channels is reduced
/// to luminance with the Rec. 601 weights on access.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ImageFormat {
    Lum,
    Rgb,
    Rgbx,
    Bgr,
    Bgrx,
    Xrgb,
    Xbgr,
    Rgba,
}

impl ImageFormat {
    pub fn pix_stride(self) -> usize {
        match self {
            Self::Lum => 1,
            Self::Rgb | Self::Bgr => 3,
            _ => 4,
        }
    }

    // Offsets of (r, g, b) within one pixel
    fn channels(self) -> (usize, usize, usize) {
        match self {
            Self::Lum => (0, 0, 0),
            Self::Rgb | Self::Rgbx | Self::Rgba => (0, 1, 2),
            Self::Bgr | Self::Bgrx => (2, 1, 0),
            Self::Xrgb => (1, 2, 3),
            Self::Xbgr => (3, 2, 1),
        }
    }
}

/// Read-only view over the caller's 8-bit image buffer. The buffer is only
/// borrowed for the duration of a read call and never written.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    w: usize,
    h: usize,
    row_stride: usize,
    pix_stride: usize,
    format: ImageFormat,
}

impl<'a> ImageView<'a> {
    pub fn new(
        data: &'a [u8],
        w: usize,
        h: usize,
        format: ImageFormat,
        row_stride: usize,
    ) -> ScanResult<Self> {
        let pix_stride = format.pix_stride();
        if w == 0 || h == 0 {
            return Err(Error::Unsupported("empty image"));
        }
        if row_stride < w * pix_stride || data.len() < row_stride * h {
            return Err(Error::Unsupported("image buffer smaller than its extent"));
        }
        Ok(Self { data, w, h, row_stride, pix_stride, format })
    }

    /// Tightly packed buffer, stride deduced from width.
    pub fn packed(data: &'a [u8], w: usize, h: usize, format: ImageFormat) -> ScanResult<Self> {
        Self::new(data, w, h, format, w * format.pix_stride())
    }

    pub fn from_luma(img: &'a GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Self::packed(img.as_raw(), w as usize, h as usize, ImageFormat::Lum)
            .expect("GrayImage extents are consistent")
    }

    pub fn from_rgb(img: &'a RgbImage) -> Self {
        let (w, h) = img.dimensions();
        Self::packed(img.as_raw(), w as usize, h as usize, ImageFormat::Rgb)
            .expect("RgbImage extents are consistent")
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn luminance(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.w && y < self.h, "Pixel out of bounds");
        let px = &self.data[y * self.row_stride + x * self.pix_stride..];
        match self.format {
            ImageFormat::Lum => px[0],
            f => {
                let (r, g, b) = f.channels();
                ((px[r] as u32 * 299 + px[g] as u32 * 587 + px[b] as u32 * 114) / 1000) as u8
            }
        }
    }

    /// Box-averaged reduction by an integer factor, for the downscale
    /// attempts on large inputs.
    pub(crate) fn downscale(&self, factor: usize) -> (Vec<u8>, usize, usize) {
        debug_assert!(factor > 1, "Downscale factor must shrink");
        let (dw, dh) = (self.w / factor, self.h / factor);
        let mut out = Vec::with_capacity(dw * dh);
        for y in 0..dh {
            for x in 0..dw {
                let mut acc = 0u32;
                for dy in 0..factor {
                    for dx in 0..factor {
                        acc += self.luminance(x * factor + dx, y * factor + dy) as u32;
                    }
                }
                out.push((acc / (factor * factor) as u32) as u8);
            }
        }
        (out, dw, dh)
    }
}

#[cfg(test)]
mod image_tests {
    use super::{ImageFormat, ImageView};

    #[test]
    fn test_luma_passthrough() {
        let data = [10u8, 20, 30, 40, 50, 60];
        let img = ImageView::packed(&data, 3, 2, ImageFormat::Lum).unwrap();
        assert_eq!(img.luminance(0, 0), 10);
        assert_eq!(img.luminance(2, 1), 60);
    }

    #[test]
    fn test_rec601_weights() {
        let data = [255u8, 0, 0, 0, 255, 0, 0, 0, 255];
        let img = ImageView::packed(&data, 3, 1, ImageFormat::Rgb).unwrap();
        assert_eq!(img.luminance(0, 0), 76); // red
        assert_eq!(img.luminance(1, 0), 149); // green
        assert_eq!(img.luminance(2, 0), 29); // blue
        let bgr = ImageView::packed(&data, 3, 1, ImageFormat::Bgr).unwrap();
        assert_eq!(bgr.luminance(0, 0), 29);
    }

    #[test]
    fn test_row_stride() {
        // 2x2 image padded to 4 bytes per row
        let data = [1u8, 2, 0, 0, 3, 4, 0, 0];
        let img = ImageView::new(&data, 2, 2, ImageFormat::Lum, 4).unwrap();
        assert_eq!(img.luminance(1, 1), 4);
    }

    #[test]
    fn test_extent_checks() {
        let data = [0u8; 8];
        assert!(ImageView::packed(&data, 3, 3, ImageFormat::Lum).is_err());
        assert!(ImageView::new(&data, 4, 2, ImageFormat::Lum, 3).is_err());
    }

    #[test]
    fn test_downscale() {
        let data = [0u8, 100, 50, 150, 200, 0, 250, 50];
        let img = ImageView::packed(&data, 4, 2, ImageFormat::Lum).unwrap();
        let (out, w, h) = img.downscale(2);
        assert_eq!((w, h), (2, 1));
        assert_eq!(out, vec![(300 / 4) as u8, (500 / 4) as u8]);
    }
}
