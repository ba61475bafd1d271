//! Dense two-level raster masks.

use super::DecodeError;

/// Pixel value written for background pixels.
pub const BACKGROUND: u8 = 0;

/// Pixel value written for foreground pixels (8-bit maximum).
pub const FOREGROUND: u8 = u8::MAX;

/// A binary mask of `height x width` pixels, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterMask {
    height: u32,
    width: u32,
    pixels: Vec<bool>,
}

impl RasterMask {
    /// Creates an all-background mask.
    pub fn empty(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            pixels: vec![false; pixel_count(height, width)],
        }
    }

    /// Builds a mask from column-major run lengths, alternating
    /// background/foreground and starting with background.
    ///
    /// # Errors
    /// [`DecodeError::LengthMismatch`] when the runs do not cover exactly
    /// `height * width` pixels.
    pub fn from_runs(height: u32, width: u32, counts: &[u32]) -> Result<Self, DecodeError> {
        let expected = height as u64 * width as u64;
        let actual: u64 = counts.iter().map(|&c| c as u64).sum();
        if actual != expected {
            return Err(DecodeError::LengthMismatch { expected, actual });
        }

        let mut mask = Self::empty(height, width);
        let h = height as usize;
        let w = width as usize;
        let mut offset = 0usize;
        let mut value = false;
        for &count in counts {
            let end = offset + count as usize;
            if value {
                for idx in offset..end {
                    // column-major idx -> row-major slot
                    let (col, row) = (idx / h, idx % h);
                    mask.pixels[row * w + col] = true;
                }
            }
            offset = end;
            value = !value;
        }
        Ok(mask)
    }

    /// Returns the mask height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the mask width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `(height, width)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    /// Returns whether the pixel at `(row, col)` is foreground.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn get(&self, row: u32, col: u32) -> bool {
        assert!(row < self.height && col < self.width, "pixel out of bounds");
        self.pixels[row as usize * self.width as usize + col as usize]
    }

    /// Sets the pixel at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn set(&mut self, row: u32, col: u32, foreground: bool) {
        assert!(row < self.height && col < self.width, "pixel out of bounds");
        self.pixels[row as usize * self.width as usize + col as usize] = foreground;
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> u64 {
        self.pixels.iter().filter(|&&p| p).count() as u64
    }

    /// True if no pixel is foreground.
    pub fn is_blank(&self) -> bool {
        !self.pixels.iter().any(|&p| p)
    }

    /// ORs `other` into `self`.
    ///
    /// # Errors
    /// [`DecodeError::SizeMismatch`] if the dimensions differ.
    pub fn union_with(&mut self, other: &RasterMask) -> Result<(), DecodeError> {
        if other.dimensions() != self.dimensions() {
            return Err(DecodeError::SizeMismatch {
                height: self.height,
                width: self.width,
                found_height: other.height,
                found_width: other.width,
            });
        }
        for (dst, &src) in self.pixels.iter_mut().zip(&other.pixels) {
            *dst |= src;
        }
        Ok(())
    }

    /// Row-major 8-bit pixels using [`BACKGROUND`] and [`FOREGROUND`].
    pub fn to_luma8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&p| if p { FOREGROUND } else { BACKGROUND })
            .collect()
    }

    /// Column-major run lengths, the inverse of [`RasterMask::from_runs`].
    pub fn to_runs(&self) -> Vec<u32> {
        let h = self.height as usize;
        let w = self.width as usize;
        let mut counts = Vec::new();
        let mut current = false;
        let mut run = 0u32;
        for col in 0..w {
            for row in 0..h {
                let p = self.pixels[row * w + col];
                if p != current {
                    counts.push(run);
                    run = 0;
                    current = p;
                }
                run += 1;
            }
        }
        counts.push(run);
        counts
    }
}

impl std::fmt::Debug for RasterMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RasterMask({}x{})", self.height, self.width)?;
        for row in 0..self.height as usize {
            let start = row * self.width as usize;
            let line: String = self.pixels[start..start + self.width as usize]
                .iter()
                .map(|&p| if p { '#' } else { '.' })
                .collect();
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

fn pixel_count(height: u32, width: u32) -> usize {
    height as usize * width as usize
}
