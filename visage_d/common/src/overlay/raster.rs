use api::Frame;
use glam::Vec2;

/// Source-over blend of `src` onto the pixel at (`x`, `y`). Off-frame
/// coordinates are ignored.
fn blend_pixel(frame: &mut Frame, x: i64, y: i64, src: [u8; 4]) {
    if x < 0 || y < 0 || x > u32::MAX as i64 || y > u32::MAX as i64 {
        return;
    }
    let Some(dst) = frame.pixel_mut(x as u32, y as u32) else {
        return;
    };

    let alpha = src[3] as u32;
    match alpha {
        0 => {}
        255 => dst.copy_from_slice(&src),
        _ => {
            let inv = 255 - alpha;
            for c in 0..3 {
                dst[c] = ((src[c] as u32 * alpha + dst[c] as u32 * inv + 127) / 255) as u8;
            }
            dst[3] = (alpha + (dst[3] as u32 * inv + 127) / 255).min(255) as u8;
        }
    }
}

pub(super) fn fill_square(frame: &mut Frame, center: Vec2, half: u32, color: [u8; 4]) {
    let cx = center.x.round() as i64;
    let cy = center.y.round() as i64;
    let half = half as i64;

    let x0 = cx.saturating_sub(half).max(0);
    let y0 = cy.saturating_sub(half).max(0);
    let x1 = cx.saturating_add(half).min(frame.width() as i64 - 1);
    let y1 = cy.saturating_add(half).min(frame.height() as i64 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            blend_pixel(frame, x, y, color);
        }
    }
}

/// Clips the segment to the frame rectangle (Liang-Barsky) and returns the
/// rounded pixel endpoints, or `None` when it lies entirely outside.
fn clip_segment(a: Vec2, b: Vec2, width: u32, height: u32) -> Option<((i64, i64), (i64, i64))> {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-dx, ax),
        (dx, width as f64 - 1.0 - ax),
        (-dy, ay),
        (dy, height as f64 - 1.0 - ay),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let point = |t: f64| ((ax + dx * t).round() as i64, (ay + dy * t).round() as i64);
    Some((point(t0), point(t1)))
}

/// One-pixel Bresenham line, clipped to the frame.
pub(super) fn draw_line(frame: &mut Frame, a: Vec2, b: Vec2, color: [u8; 4]) {
    if frame.width() == 0 || frame.height() == 0 {
        return;
    }
    let Some(((mut x, mut y), (x1, y1))) = clip_segment(a, b, frame.width(), frame.height())
    else {
        return;
    };

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        blend_pixel(frame, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Fills every pixel whose centre lies inside the triangle.
///
/// Centres exactly on an edge belong to the triangle only when that edge is a
/// top or left edge, so faces sharing an edge cover each pixel once.
pub(super) fn fill_triangle(frame: &mut Frame, corners: [Vec2; 3], color: [u8; 4]) {
    let [a, mut b, mut c] = corners;
    if (b - a).perp_dot(c - a) < 0.0 {
        std::mem::swap(&mut b, &mut c);
    }

    let min = a.min(b).min(c);
    let max = a.max(b).max(c);
    let x0 = min.x.floor().max(0.0) as i64;
    let y0 = min.y.floor().max(0.0) as i64;
    let x1 = max.x.ceil().min(frame.width() as f32 - 1.0) as i64;
    let y1 = max.y.ceil().min(frame.height() as f32 - 1.0) as i64;

    let edges = [(a, b), (b, c), (c, a)];
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let inside = edges.iter().all(|&(from, to)| {
                let w = edge_function(from, to, p);
                w > 0.0 || (w == 0.0 && is_top_left(to - from))
            });
            if inside {
                blend_pixel(frame, x, y, color);
            }
        }
    }
}

/// Signed side of `p` relative to `from -> to`. Evaluated from the
/// lexicographically smaller endpoint so reversing an edge negates the result
/// exactly.
fn edge_function(from: Vec2, to: Vec2, p: Vec2) -> f64 {
    let orient = |o: Vec2, e: Vec2| {
        let (ox, oy) = (o.x as f64, o.y as f64);
        (e.x as f64 - ox) * (p.y as f64 - oy) - (e.y as f64 - oy) * (p.x as f64 - ox)
    };
    if (from.x, from.y) <= (to.x, to.y) {
        orient(from, to)
    } else {
        -orient(to, from)
    }
}

/// With y pointing down and the winding normalized above, top edges run
/// towards +x and left edges run towards -y.
fn is_top_left(d: Vec2) -> bool {
    d.y < 0.0 || (d.y == 0.0 && d.x > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_blend_replaces_and_translucent_mixes() {
        let mut frame = Frame::filled(2, 1, [0, 0, 0, 255]);
        blend_pixel(&mut frame, 0, 0, [200, 100, 50, 255]);
        blend_pixel(&mut frame, 1, 0, [255, 255, 255, 128]);
        assert_eq!(frame.pixel(0, 0), Some([200, 100, 50, 255]));
        assert_eq!(frame.pixel(1, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn off_frame_writes_are_ignored() {
        let mut frame = Frame::new(4, 4);
        blend_pixel(&mut frame, -1, 0, [255; 4]);
        blend_pixel(&mut frame, 4, 4, [255; 4]);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn horizontal_line_covers_endpoints() {
        let mut frame = Frame::new(8, 3);
        draw_line(&mut frame, Vec2::new(1.0, 1.0), Vec2::new(6.0, 1.0), [255; 4]);
        for x in 1..=6 {
            assert_eq!(frame.pixel(x, 1), Some([255; 4]));
        }
        assert_eq!(frame.pixel(0, 1), Some([0; 4]));
        assert_eq!(frame.pixel(7, 1), Some([0; 4]));
    }

    #[test]
    fn far_off_screen_line_is_clipped() {
        let mut frame = Frame::new(10, 10);
        draw_line(&mut frame, Vec2::new(-1.0e9, 5.0), Vec2::new(1.0e9, 5.0), [255; 4]);
        for x in 0..10 {
            assert_eq!(frame.pixel(x, 5), Some([255; 4]));
        }
        draw_line(&mut frame, Vec2::new(-50.0, -50.0), Vec2::new(-10.0, -1.0), [9; 4]);
        assert!(frame.as_bytes().iter().all(|&b| b == 0 || b == 255));
    }

    #[test]
    fn triangle_fill_is_winding_independent() {
        let cw = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 8.0), Vec2::new(8.0, 0.0)];
        let ccw = [cw[0], cw[2], cw[1]];
        let mut f1 = Frame::new(8, 8);
        let mut f2 = Frame::new(8, 8);
        fill_triangle(&mut f1, cw, [255; 4]);
        fill_triangle(&mut f2, ccw, [255; 4]);
        assert_eq!(f1, f2);
        assert_eq!(f1.pixel(1, 1), Some([255; 4]));
        assert_eq!(f1.pixel(7, 7), Some([0; 4]));
    }

    #[test]
    fn faces_sharing_an_edge_cover_each_pixel_once() {
        let square = [
            Vec2::new(1.0, 1.0),
            Vec2::new(7.0, 1.0),
            Vec2::new(7.0, 7.0),
            Vec2::new(1.0, 7.0),
        ];
        let mut frame = Frame::filled(8, 8, [0, 0, 0, 255]);
        fill_triangle(&mut frame, [square[0], square[1], square[2]], [255, 255, 255, 128]);
        fill_triangle(&mut frame, [square[0], square[2], square[3]], [255, 255, 255, 128]);

        for y in 0..8 {
            for x in 0..8 {
                let expected = if (1..=6).contains(&x) && (1..=6).contains(&y) {
                    [128, 128, 128, 255]
                } else {
                    [0, 0, 0, 255]
                };
                assert_eq!(frame.pixel(x, y), Some(expected), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn adjacent_faces_split_their_shared_horizontal_edge() {
        let mut frame = Frame::new(4, 4);
        let top = [Vec2::new(0.0, 0.5), Vec2::new(4.0, 0.5), Vec2::new(2.0, 2.5)];
        let bottom = [Vec2::new(0.0, 0.5), Vec2::new(2.0, -1.5), Vec2::new(4.0, 0.5)];
        fill_triangle(&mut frame, top, [0, 0, 0, 128]);
        fill_triangle(&mut frame, bottom, [0, 0, 0, 128]);
        // Pixel centres on y = 0.5 are blended once: alpha 128 over a clear frame.
        assert_eq!(frame.pixel(1, 0), Some([0, 0, 0, 128]));
        assert_eq!(frame.pixel(2, 0), Some([0, 0, 0, 128]));
    }
}
