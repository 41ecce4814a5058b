//! # Print Jobs
//!
//! A [`Job`] is what the controller transmits: an ordered list of pages
//! (copies), each an ordered list of packed scanlines. A scanline runs
//! across the tape; successive scanlines run along the feed direction.
//!
//! ## Scanline Format
//!
//! One bit per dot, most significant bit first, `1` = printed dot:
//!
//! ```text
//! Byte 0:  [b7 b6 b5 b4 b3 b2 b1 b0]  <- dots 0-7
//! Byte 1:  [b7 b6 b5 b4 b3 b2 b1 b0]  <- dots 8-15
//! ...
//! ```

use crate::error::{PtouchError, Result};

// ============================================================================
// BITMAP
// ============================================================================

/// # Monochrome Bitmap
///
/// Packed 1-bit image in feed order: `width` is the number of dots across
/// the tape, `height` the number of scanlines.
///
/// ## Example
///
/// ```
/// use ptouch::printer::Bitmap;
///
/// let mut bitmap = Bitmap::new(70, 3);
/// bitmap.set(0, 1, true);
/// assert_eq!(bitmap.stride(), 9);
/// assert_eq!(bitmap.row(1)[0], 0x80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Blank bitmap
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width.div_ceil(8) * height],
        }
    }

    /// Build from already packed rows of `width.div_ceil(8)` bytes each.
    pub fn from_packed(width: usize, data: Vec<u8>) -> Result<Self> {
        let stride = width.div_ceil(8);
        if stride == 0 || data.len() % stride != 0 {
            return Err(PtouchError::Image(format!(
                "{} bytes is not a whole number of {}-dot rows",
                data.len(),
                width
            )));
        }
        Ok(Self {
            width,
            height: data.len() / stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width.div_ceil(8)
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        let byte = self.data[y * self.stride() + x / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        let idx = y * self.stride() + x / 8;
        let mask = 0x80 >> (x % 8);
        if on {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Packed bytes of row `y`
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks(self.stride().max(1))
    }
}

// ============================================================================
// JOB
// ============================================================================

/// One copy of the label: scanlines in transmission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub lines: Vec<Vec<u8>>,
}

impl Page {
    pub fn new(lines: Vec<Vec<u8>>) -> Self {
        Self { lines }
    }

    pub fn from_bitmap(bitmap: &Bitmap) -> Self {
        Self::new(bitmap.rows().map(<[u8]>::to_vec).collect())
    }
}

/// # Print Job
///
/// Ordered pages, each printed and cut in turn. Created per print request.
///
/// ## Example
///
/// ```
/// use ptouch::printer::{Bitmap, Job};
///
/// let job = Job::from_bitmap(&Bitmap::new(128, 40), 3).unwrap();
/// assert_eq!(job.pages().len(), 3);
/// assert_eq!(job.pages()[0].lines.len(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pages: Vec<Page>,
}

impl Job {
    /// ## Errors
    ///
    /// `EmptyJob` if `pages` is empty.
    pub fn new(pages: Vec<Page>) -> Result<Self> {
        if pages.is_empty() {
            return Err(PtouchError::EmptyJob);
        }
        Ok(Self { pages })
    }

    /// `copies` identical pages of one bitmap.
    pub fn from_bitmap(bitmap: &Bitmap, copies: usize) -> Result<Self> {
        let page = Page::from_bitmap(bitmap);
        Self::new(vec![page; copies])
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Total scanlines across all pages
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_set_get() {
        let mut bitmap = Bitmap::new(12, 2);
        bitmap.set(0, 0, true);
        bitmap.set(11, 1, true);
        assert!(bitmap.get(0, 0));
        assert!(bitmap.get(11, 1));
        assert!(!bitmap.get(1, 0));
        assert_eq!(bitmap.row(0), &[0x80, 0x00]);
        assert_eq!(bitmap.row(1), &[0x00, 0x10]);

        bitmap.set(0, 0, false);
        assert_eq!(bitmap.row(0), &[0x00, 0x00]);
    }

    #[test]
    fn test_bitmap_from_packed() {
        let bitmap = Bitmap::from_packed(16, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(bitmap.height(), 3);
        let rows: Vec<Vec<u8>> = bitmap.rows().map(<[u8]>::to_vec).collect();
        assert_eq!(rows, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[test]
    fn test_bitmap_from_packed_rejects_partial_row() {
        assert!(Bitmap::from_packed(16, vec![1, 2, 3]).is_err());
        assert!(Bitmap::from_packed(0, vec![]).is_err());
    }

    #[test]
    fn test_job_copies() {
        let mut bitmap = Bitmap::new(8, 2);
        bitmap.set(3, 1, true);
        let job = Job::from_bitmap(&bitmap, 2).unwrap();

        assert_eq!(job.pages().len(), 2);
        assert_eq!(job.pages()[1].lines, vec![vec![0x00], vec![0x10]]);
        assert_eq!(job.line_count(), 4);
    }

    #[test]
    fn test_empty_job_rejected() {
        assert!(matches!(Job::new(vec![]), Err(PtouchError::EmptyJob)));
        assert!(matches!(
            Job::from_bitmap(&Bitmap::new(8, 1), 0),
            Err(PtouchError::EmptyJob)
        ));
    }
}
