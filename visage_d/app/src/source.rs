use api::Frame;

/// Stand-in camera: a slowly scrolling colour gradient with a moving bar, so
/// dumped frames show the overlay against something that changes.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_index: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }

    /// Renders the next pattern into an existing frame, reusing its buffer.
    pub fn next_into(&mut self, frame: &mut Frame) {
        if frame.width() != self.width || frame.height() != self.height {
            *frame = Frame::new(self.width, self.height);
        }
        self.fill(frame);
        self.frame_index += 1;
    }

    fn fill(&self, frame: &mut Frame) {
        let shift = (self.frame_index % 256) as u32;
        let bar_x = if self.width == 0 {
            0
        } else {
            (self.frame_index * 4 % self.width as u64) as u32
        };
        let width = self.width as usize;

        for (i, px) in frame.as_bytes_mut().chunks_exact_mut(4).enumerate() {
            let x = (i % width) as u32;
            let y = (i / width) as u32;
            if x.abs_diff(bar_x) < 4 {
                px.copy_from_slice(&[230, 230, 230, 255]);
            } else {
                let r = ((x * 255 / self.width.max(1)) + shift) % 256;
                let g = y * 255 / self.height.max(1);
                px.copy_from_slice(&[r as u8, g as u8, 64, 255]);
            }
        }
    }
}
