//! `parcoll mandelbrot`: escape-time rendering on the device.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use bytemuck::{Pod, Zeroable};
use parcoll_core::{device, Device};

/// One 8-bit RGB pixel, laid out as three consecutive bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Region of the complex plane mapped onto the image.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub left: f64,
    pub bottom: f64,
    pub height: f64,
}

impl View {
    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }
}

/// Iterations of `z = z^2 + c` before `|z| >= 2`, capped at `max_iters`.
pub fn escape_count(x0: f64, y0: f64, max_iters: u32) -> u32 {
    let (mut x, mut y) = (0.0f64, 0.0f64);
    let mut i = 0;
    while i < max_iters && x * x + y * y < 4.0 {
        let x_next = x * x - y * y + x0;
        y = 2.0 * x * y + y0;
        x = x_next;
        i += 1;
    }
    i
}

/// Black inside the set; outside, the count's low three bytes as RGB.
pub fn colour(count: u32, max_iters: u32) -> Rgb {
    if count == max_iters {
        return Rgb::default();
    }
    Rgb {
        r: (count >> 16) as u8,
        g: (count >> 8) as u8,
        b: count as u8,
    }
}

/// Row-major pixels of a `width x height` image. Pixel rows run top to
/// bottom; square pixels of side `view.height / height`.
pub fn render(device: &Arc<Device>, width: u32, height: u32, max_iters: u32, view: View) -> Result<Vec<Rgb>> {
    ensure!(width > 0 && height > 0, "image must be at least 1x1, got {width}x{height}");
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .context("image dimensions overflow")?;

    let columns = width as usize;
    let scale = view.height / height as f64;
    let top = view.top();
    let left = view.left;

    let counts = device::Collection::generate_on(device, pixels, move |idx| {
        let row = idx / columns;
        let col = idx % columns;
        let y = top - row as f64 * scale;
        let x = left + col as f64 * scale;
        escape_count(x, y, max_iters)
    })?;
    let colours = counts.map(move |count| colour(count, max_iters))?;
    Ok(colours.to_vector())
}

/// 8-bit RGB PNG of row-major `pixels`.
pub fn write_png<W: Write>(out: W, width: u32, height: u32, pixels: &[Rgb]) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(bytemuck::cast_slice(pixels))?;
    writer.finish()
}

pub fn run(output: &Path, width: u32, height: u32, max_iters: u32, view: View) -> Result<()> {
    tracing::info!(width, height, max_iters, ?view, "rendering mandelbrot");
    let pixels = render(&Device::global(), width, height, max_iters, view)?;

    let file = File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    write_png(BufWriter::new(file), width, height, &pixels)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!("Successfully created PNG file: {}", output.display());
    Ok(())
}
