//! Painters for 1-bit monochrome framebuffers. Eight pixels per byte, most
//! significant bit first; `offset` counts pixels from the byte-aligned base
//! the canvas handed out, so bit positions stay exact.

use crate::bitmap::{Bitmap, BitmapFormat};
use crate::math::luminance;
use crate::painter::{BitmapSource, Painter, Rgba8};

fn paint_bit(dest: &mut [u8], ix: i32, set: bool) {
    let byte = (ix / 8) as usize;
    let bit = 1u8 << (7 - (ix % 8));
    if set {
        dest[byte] |= bit;
    } else {
        dest[byte] &= !bit;
    }
}

/// Sequential reader for run-length encoded monochrome data.
///
/// The stream is a sequence of byte run lengths of alternating color,
/// starting with unset pixels. Runs longer than 255 continue through a
/// zero-length run of the opposite color: `[255, 0, 45]` reads as 300
/// unset pixels.
#[derive(Debug, Clone, Copy)]
pub struct BwRleData<'a> {
    data: &'a [u8],
    pos: usize,
    color: u8,
    length: u32,
}

impl<'a> BwRleData<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = BwRleData {
            data,
            pos: 0,
            color: 1,
            length: 0,
        };
        reader.load_next_run();
        reader
    }

    /// Color of the current run, 0 or 1.
    pub fn color(&self) -> u8 {
        self.color
    }

    /// Pixels left in the current run.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Consume `count` pixels, crossing run boundaries as needed.
    pub fn skip_next(&mut self, mut count: u32) {
        while count > 0 {
            if self.length > count {
                self.length -= count;
                return;
            }
            count -= self.length;
            self.load_next_run();
        }
    }

    fn load_next_run(&mut self) {
        loop {
            if self.pos >= self.data.len() {
                // Ran off the stream: stay on the current color forever
                // rather than panic on short data.
                self.length = u32::MAX;
                return;
            }
            self.color ^= 1;
            self.length = u32::from(self.data[self.pos]);
            self.pos += 1;
            if self.length > 0 {
                return;
            }
        }
    }
}

/// Paints one solid color. Monochrome has no blending: the pixel is
/// written when the span alpha reaches 128 and left alone below that.
#[derive(Debug, Clone, Copy)]
pub struct PainterBw {
    white: bool,
}

impl PainterBw {
    pub fn new() -> Self {
        PainterBw { white: false }
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.white = luminance(color.r, color.g, color.b) >= 128;
    }
}

impl Default for PainterBw {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterBw {
    fn paint(&self, dest: &mut [u8], offset: i32, _widget_x: i32, _widget_y: i32, count: i32, alpha: u8) {
        if alpha < 0x80 {
            return;
        }
        for i in offset..offset + count {
            paint_bit(dest, i, self.white);
        }
    }
}

/// Paints pixels sampled from a BW or run-length encoded BW bitmap.
/// Alpha is ignored; monochrome has no blending.
#[derive(Debug, Clone, Copy)]
pub struct PainterBwBitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterBwBitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert!(matches!(
            bitmap.format,
            BitmapFormat::Bw | BitmapFormat::BwRle
        ));
        PainterBwBitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterBwBitmap<'a> {
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, _alpha: u8) {
        let mut bitmap_x = widget_x;
        let mut bitmap_y = widget_y;
        let mut offset = offset;
        let mut count = count;
        if !self.source.adjust(&mut bitmap_x, &mut bitmap_y, &mut offset, &mut count) {
            return;
        }

        let bitmap = &self.source.bitmap;
        let bw = i32::from(bitmap.width);
        let mut available = bw - bitmap_x;
        let mut src_x = bitmap_x;
        let mut dst = offset;

        match bitmap.format {
            BitmapFormat::Bw => {
                let stride = ((bw + 7) / 8) as usize;
                let row = &bitmap.data[bitmap_y as usize * stride..];
                while count > 0 {
                    let length = available.min(count);
                    count -= length;
                    for k in 0..length {
                        let sx = (src_x + k) as usize;
                        let bit = (row[sx / 8] >> (7 - (sx % 8))) & 1;
                        paint_bit(dest, dst + k, bit != 0);
                    }
                    dst += length;
                    src_x = 0;
                    available = bw;
                }
            }
            BitmapFormat::BwRle => {
                while count > 0 {
                    let length = available.min(count);
                    count -= length;
                    let mut rle = BwRleData::new(bitmap.data);
                    rle.skip_next((bitmap_y * bw + src_x) as u32);
                    let mut painted = 0;
                    while painted < length {
                        let run = rle.length().min((length - painted) as u32) as i32;
                        let set = rle.color() != 0;
                        for k in painted..painted + run {
                            paint_bit(dest, dst + k, set);
                        }
                        rle.skip_next(run as u32);
                        painted += run;
                    }
                    dst += length;
                    src_x = 0;
                    available = bw;
                }
            }
            _ => {}
        }
    }
}
