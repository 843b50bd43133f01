//! Canvas: turns raw core frames into pooled RGBA frames at the viewport size

use crate::format::{PixelFormat, Unpacker};
use crate::frame::{Frame, FrameInfo};
use crate::pool::FramePool;
use crate::rotation::Transform;
use crate::scale;
use rayon::prelude::*;
use rh_core::{ScaleFilter, VideoError};

/// Frames kept around for reuse
const POOL_SLOTS: usize = 4;
/// Bands shorter than this aren't worth a worker
const MIN_BAND_ROWS: usize = 8;

/// Stateful drawing surface for one viewport
pub struct Canvas {
    width: usize,
    height: usize,
    vertical: bool,
    filter: ScaleFilter,
    bands: usize,
    pool: FramePool,
    workers: Option<rayon::ThreadPool>,
}

/// Source description shared by all bands of one frame
struct Source<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    bpp: usize,
    unpack: Unpacker,
    transform: Transform,
}

impl Canvas {
    /// `max_pixels` sizes pooled buffers, `bands` > 1 converts frames on
    /// that many workers.
    pub fn new(width: usize, height: usize, max_pixels: usize, bands: usize, filter: ScaleFilter) -> Self {
        let workers = if bands > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(bands)
                .thread_name(|i| format!("canvas-{}", i))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("Canvas workers unavailable, drawing on one thread: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let max_pixels = max_pixels.max(width * height);
        tracing::debug!(
            "Canvas {}x{} (pool {} px, {} bands, {:?})",
            width,
            height,
            max_pixels,
            bands,
            filter
        );

        Self {
            width,
            height,
            vertical: height > width,
            filter,
            bands,
            pool: FramePool::new(POOL_SLOTS, max_pixels),
            workers,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Portrait viewport, width and height arrive already swapped
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn get(&self, width: usize, height: usize) -> Frame {
        self.pool.get(width, height)
    }

    pub fn put(&self, frame: Frame) {
        self.pool.put(frame);
    }

    pub fn set_pooling(&self, enabled: bool) {
        self.pool.set_enabled(enabled);
    }

    /// Converts one core frame.
    ///
    /// The result comes from the pool; hand it back with [`Canvas::put`]
    /// once the consumer is done with it.
    pub fn draw(
        &self,
        format: PixelFormat,
        transform: Transform,
        info: FrameInfo,
        data: &[u8],
    ) -> Result<Frame, VideoError> {
        let unpack = format.unpacker()?;
        let bpp = format.bpp();
        let (w, h) = (info.width as usize, info.height as usize);
        let stride = if info.stride == 0 { w * bpp } else { info.stride };

        if w == 0 || h == 0 {
            return Err(VideoError::EmptyFrame(info.width, info.height));
        }
        let expected = stride * (h - 1) + w * bpp;
        if data.len() < expected || stride < w * bpp {
            return Err(VideoError::ShortBuffer {
                got: data.len(),
                expected,
            });
        }

        let src = Source {
            data,
            width: w,
            height: h,
            stride,
            bpp,
            unpack,
            transform,
        };

        let (ow, oh) = transform.output_size(w, h);
        let mut dst = self.get(ow, oh);
        let row_bytes = ow << 2;

        match &self.workers {
            Some(workers) if oh >= self.bands * MIN_BAND_ROWS => {
                let band_rows = oh.div_ceil(self.bands);
                workers.install(|| {
                    dst.pixels_mut()
                        .par_chunks_mut(band_rows * row_bytes)
                        .enumerate()
                        .for_each(|(i, band)| convert(&src, band, i * band_rows, ow));
                });
            }
            _ => convert(&src, dst.pixels_mut(), 0, ow),
        }

        if (ow, oh) != (self.width, self.height) {
            let mut out = self.get(self.width, self.height);
            scale::resize(self.filter, &dst, &mut out);
            self.put(dst);
            return Ok(out);
        }

        Ok(dst)
    }
}

/// Fills destination rows starting at `y0`
fn convert(src: &Source<'_>, band: &mut [u8], y0: usize, ow: usize) {
    let row_bytes = ow << 2;
    let unpack = src.unpack;

    if src.transform.is_identity() {
        for (i, row) in band.chunks_exact_mut(row_bytes).enumerate() {
            let at = (y0 + i) * src.stride;
            let line = &src.data[at..at + src.width * src.bpp];
            for (out, px) in row.chunks_exact_mut(4).zip(line.chunks_exact(src.bpp)) {
                out.copy_from_slice(&unpack(px));
            }
        }
        return;
    }

    for (i, row) in band.chunks_exact_mut(row_bytes).enumerate() {
        let dy = y0 + i;
        for (dx, out) in row.chunks_exact_mut(4).enumerate() {
            let (sx, sy) = src.transform.source_of(dx, dy, src.width, src.height);
            let at = sy * src.stride + sx * src.bpp;
            out.copy_from_slice(&unpack(&src.data[at..at + src.bpp]));
        }
    }
}
