#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Minimal 24-bit BMP: just enough header for `imagesize` to read the size.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes a label file, creating parent directories.
pub fn write_labels(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write label file");
    path.to_path_buf()
}

/// Panel labels for a 200x100 image: two side-by-side panels.
///
/// panel 0 covers x 0..100, panel 1 covers x 100..200, both y 0..75.
pub const TWO_PANELS: &str = "0 0.25 0.375 0.5 0.75 0.95\n0 0.75 0.375 0.5 0.75 0.91\n";

/// Anomaly labels for the same image.
///
/// 0: cracked inside panel 0, 1: dusty inside panel 1,
/// 2: dusty straddling the shared edge evenly, 3: cracked below both panels.
pub const FOUR_ANOMALIES: &str = "0 0.25 0.25 0.125 0.25 0.81
1 0.75 0.25 0.125 0.25 0.66
1 0.5 0.25 0.125 0.25 0.52
0 0.5 0.875 0.125 0.125 0.40
";
