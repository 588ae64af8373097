//! RGBA8 frame buffer exchanged with the frame pipeline.

use anyhow::{bail, Result};

/// Tightly packed, row-major RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Transparent black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::byte_len(width, height)],
        }
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(Self::byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            bail!(
                "Frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            );
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let idx = self.offset(x, y)?;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[idx..idx + Self::BYTES_PER_PIXEL]);
        Some(px)
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        let idx = self.offset(x, y)?;
        Some(&mut self.data[idx..idx + Self::BYTES_PER_PIXEL])
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL)
    }

    /// Makes `self` an exact copy of `other`, reusing the allocation when the
    /// sizes already match.
    pub fn copy_from(&mut self, other: &Frame) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_wrong_length() {
        assert!(Frame::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut frame = Frame::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(frame.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(3, 0), None);
        assert!(frame.pixel_mut(0, 2).is_none());

        if let Some(px) = frame.pixel_mut(1, 1) {
            px.copy_from_slice(&[9, 9, 9, 9]);
        }
        assert_eq!(frame.pixel(1, 1), Some([9, 9, 9, 9]));
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3, 4]));
    }

    #[test]
    fn copy_from_adopts_size() {
        let src = Frame::filled(4, 4, [5, 5, 5, 255]);
        let mut dst = Frame::new(1, 1);
        dst.copy_from(&src);
        assert_eq!(dst, src);
    }
}
