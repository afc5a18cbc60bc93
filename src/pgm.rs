//! Minimal binary PGM (P5) writer for dumped slices

use crate::error::Result;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a grayscale image as a binary PGM (P5) file with maxval 255.
///
/// `comment` lands on the header `#` line and must not contain newlines.
/// Pixels are emitted in logical row-major order whatever the array's
/// memory layout.
pub fn write_pgm(path: &Path, comment: &str, image: &Array2<u8>) -> Result<()> {
    let (height, width) = image.dim();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write!(writer, "P5\n# {}\n{} {}\n255\n", comment, width, height)?;
    let pixels: Vec<u8> = image.iter().copied().collect();
    writer.write_all(&pixels)?;
    writer.flush()?;
    Ok(())
}
