//! Image file helpers for tests and diagnostics.
//!
//! Rendered surfaces can be decoded to 8-bit RGB and dumped as PNG or PPM
//! for visual inspection, and two dumps can be compared pixel by pixel.
//! Nothing in the draw path depends on this module.

use std::path::Path;

use crate::surface::{PixelFormat, Surface};

/// Read an image file as packed 8-bit RGB, returning `(data, width, height)`.
pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<(Vec<u8>, usize, usize), image::ImageError> {
    let img = image::open(filename)?.to_rgb8();
    let (w, h) = img.dimensions();
    let buf = img.into_raw();
    Ok((buf, w as usize, h as usize))
}

/// Write packed 8-bit RGB data; the format follows the file extension.
pub fn write_file<P: AsRef<Path>>(
    buf: &[u8],
    width: usize,
    height: usize,
    filename: P,
) -> Result<(), image::ImageError> {
    image::save_buffer(
        filename,
        buf,
        width as u32,
        height as u32,
        image::ColorType::Rgb8,
    )
}

/// Decode every pixel of a surface to packed 8-bit RGB, row major.
pub fn surface_to_rgb8<F: PixelFormat>(surface: &Surface<'_, F>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(surface.width() as usize * surface.height() as usize * 3);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let (r, g, b) = surface.pixel_rgb(x, y);
            buf.push(r);
            buf.push(g);
            buf.push(b);
        }
    }
    buf
}

/// Compare two image files pixel by pixel, printing every difference.
pub fn img_diff<P: AsRef<Path>>(f1: P, f2: P) -> Result<bool, image::ImageError> {
    let (d1, w1, h1) = read_file(f1)?;
    let (d2, w2, h2) = read_file(f2)?;
    if w1 != w2 || h1 != h2 {
        return Ok(false);
    }
    if d1.len() != d2.len() {
        println!("files not equal length");
        return Ok(false);
    }
    let mut flag = true;
    for (i, (v1, v2)) in d1.iter().zip(d2.iter()).enumerate() {
        if v1 != v2 {
            println!("{} [{},{},{}]: {} {}", i, (i / 3) % w1, (i / 3) / w1, i % 3, v1, v2);
            flag = false;
        }
    }
    Ok(flag)
}
