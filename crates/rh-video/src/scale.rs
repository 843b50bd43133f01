//! Frame rescaling

use crate::frame::Frame;
use rh_core::ScaleFilter;

pub fn resize(filter: ScaleFilter, src: &Frame, dst: &mut Frame) {
    if src.width() == 0 || src.height() == 0 || dst.width() == 0 || dst.height() == 0 {
        return;
    }
    match filter {
        ScaleFilter::Nearest => nearest(src, dst),
        ScaleFilter::Bilinear => bilinear(src, dst),
    }
}

/// Samples the source pixel under each destination pixel center
pub fn nearest(src: &Frame, dst: &mut Frame) {
    let (sw, sh) = (src.width(), src.height());
    let (dw, dh) = (dst.width(), dst.height());
    let ss = src.stride();
    let ds = dst.stride();
    let sp = src.pixels();
    let dp = dst.pixels_mut();

    for dy in 0..dh {
        let sy = ((2 * dy + 1) * sh) / (2 * dh);
        let src_row = &sp[sy * ss..sy * ss + ss];
        let dst_row = &mut dp[dy * ds..dy * ds + ds];
        for (dx, out) in dst_row.chunks_exact_mut(4).enumerate() {
            let sx = ((2 * dx + 1) * sw) / (2 * dw);
            out.copy_from_slice(&src_row[sx << 2..(sx << 2) + 4]);
        }
    }
}

pub fn bilinear(src: &Frame, dst: &mut Frame) {
    let (sw, sh) = (src.width(), src.height());
    let (dw, dh) = (dst.width(), dst.height());
    let ss = src.stride();
    let ds = dst.stride();
    let sp = src.pixels();
    let dp = dst.pixels_mut();

    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;

    for dy in 0..dh {
        let fy = ((dy as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let y0 = (fy as usize).min(sh - 1);
        let y1 = (y0 + 1).min(sh - 1);
        let wy = fy - y0 as f32;

        for dx in 0..dw {
            let fx = ((dx as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let x0 = (fx as usize).min(sw - 1);
            let x1 = (x0 + 1).min(sw - 1);
            let wx = fx - x0 as f32;

            let at = |x: usize, y: usize, c: usize| sp[y * ss + (x << 2) + c] as f32;
            let out = dy * ds + (dx << 2);
            for c in 0..4 {
                let top = at(x0, y0, c) * (1.0 - wx) + at(x1, y0, c) * wx;
                let bottom = at(x0, y1, c) * (1.0 - wx) + at(x1, y1, c) * wx;
                dp[out + c] = (top * (1.0 - wy) + bottom * wy).round() as u8;
            }
        }
    }
}
