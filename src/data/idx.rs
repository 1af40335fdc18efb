//! Decoder for the IDX binary format used by MNIST and its derivatives
//! (Fashion-MNIST, EMNIST, …).
//!
//! # IDX3 image stream layout
//! ```text
//! bytes  0-3:   0x00000803  (magic, big-endian)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label stream layout
//! ```text
//! bytes  0-3:   0x00000801  (magic, big-endian)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use log::{debug, info};

use crate::{
    data::sample::Sample,
    error::{NetError, Result},
};

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// Split names used by the standard MNIST distribution.
pub const TRAIN_SPLIT: &str = "train";
pub const TEST_SPLIT: &str = "t10k";

/// Decodes an image stream and a label stream into `Sample`s.
///
/// The stream names are only used in error messages.
#[derive(Debug, Clone)]
pub struct IdxDecoder {
    n_classes: usize,
    image_name: String,
    label_name: String,
}

impl IdxDecoder {
    pub fn new(n_classes: usize) -> Self {
        IdxDecoder {
            n_classes,
            image_name: "images".to_owned(),
            label_name: "labels".to_owned(),
        }
    }

    pub fn with_names(mut self, image_name: impl Into<String>, label_name: impl Into<String>) -> Self {
        self.image_name = image_name.into();
        self.label_name = label_name.into();
        self
    }

    /// Reads both headers, then the pixel and label bodies, in one pass.
    ///
    /// # Errors
    /// - `Format` on a wrong magic number, an image/label count mismatch, a
    ///   label outside `[0, n_classes)` or a header whose sizes overflow.
    /// - `Io` when either stream ends early or cannot be read.
    pub fn decode<I: Read, L: Read>(&self, mut images: I, mut labels: L) -> Result<Vec<Sample>> {
        let img = &self.image_name;
        let lbl = &self.label_name;

        // ── Headers ─────────────────────────────────────────────────────────
        let magic = read_u32(&mut images, img, "magic number")?;
        if magic != IMAGE_MAGIC {
            return Err(NetError::format(
                img,
                format!("magic number must be {:#010x}, got {:#010x}", IMAGE_MAGIC, magic),
            ));
        }
        let n_items = read_u32(&mut images, img, "image count")? as usize;
        let rows = read_u32(&mut images, img, "row count")? as usize;
        let cols = read_u32(&mut images, img, "column count")? as usize;

        let magic = read_u32(&mut labels, lbl, "magic number")?;
        if magic != LABEL_MAGIC {
            return Err(NetError::format(
                lbl,
                format!("magic number must be {:#010x}, got {:#010x}", LABEL_MAGIC, magic),
            ));
        }
        let label_count = read_u32(&mut labels, lbl, "label count")? as usize;
        if label_count != n_items {
            return Err(NetError::format(
                lbl,
                format!("image stream declares {} items but label stream declares {}", n_items, label_count),
            ));
        }

        let n_pixels = rows
            .checked_mul(cols)
            .ok_or_else(|| NetError::format(img, format!("rows * cols overflows (rows={}, cols={})", rows, cols)))?;
        let pixel_len = n_items.checked_mul(n_pixels).ok_or_else(|| {
            NetError::format(img, format!("n_items * n_pixels overflows (n_items={}, n_pixels={})", n_items, n_pixels))
        })?;
        debug!("decoding {} samples of {}x{} pixels", n_items, rows, cols);

        // ── Bodies ──────────────────────────────────────────────────────────
        let pixel_data = read_body(&mut images, pixel_len, img, "pixel data")?;
        let label_data = read_body(&mut labels, n_items, lbl, "label data")?;

        let mut samples = Vec::with_capacity(n_items);
        for (i, &class_idx) in label_data.iter().enumerate() {
            let label = class_idx as usize;
            if label >= self.n_classes {
                return Err(NetError::format(
                    lbl,
                    format!("label at index {} is {}, out of range for {} classes", i, label, self.n_classes),
                ));
            }
            let chunk = &pixel_data[i * n_pixels..(i + 1) * n_pixels];
            let features = chunk.iter().map(|&px| px as f64 / 255.0).collect();
            samples.push(Sample::new(features, label));
        }

        Ok(samples)
    }
}

/// Decodes a digit corpus (10 classes).
pub fn decode_pair<I: Read, L: Read>(images: I, labels: L) -> Result<Vec<Sample>> {
    IdxDecoder::new(10).decode(images, labels)
}

/// Paths of a named split inside `dir`: `<split>-images.idx3-ubyte` and
/// `<split>-labels.idx1-ubyte`.
pub fn split_paths(dir: impl AsRef<Path>, split: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let dir = dir.as_ref();
    (
        dir.join(format!("{}-images.idx3-ubyte", split)),
        dir.join(format!("{}-labels.idx1-ubyte", split)),
    )
}

/// Loads a split (e.g. `"train"` or `"t10k"`) from `dir`.
pub fn load_split(dir: impl AsRef<Path>, split: &str) -> Result<Vec<Sample>> {
    let (image_path, label_path) = split_paths(dir, split);
    let image_name = image_path.display().to_string();
    let label_name = label_path.display().to_string();

    let images = File::open(&image_path).map_err(|e| NetError::io(&image_name, e))?;
    let labels = File::open(&label_path).map_err(|e| NetError::io(&label_name, e))?;

    let samples = IdxDecoder::new(10)
        .with_names(image_name, label_name)
        .decode(BufReader::new(images), BufReader::new(labels))?;
    info!("loaded {} samples from split '{}'", samples.len(), split);
    Ok(samples)
}

fn read_u32<R: Read>(reader: &mut R, name: &str, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| NetError::io(name, io::Error::new(e.kind(), format!("reading {}: {}", what, e))))?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads exactly `len` bytes without trusting `len` for the allocation up
/// front.
fn read_body<R: Read>(reader: R, len: usize, name: &str, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| NetError::io(name, io::Error::new(e.kind(), format!("reading {}: {}", what, e))))?;
    if buf.len() < len {
        return Err(NetError::io(
            name,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} truncated: expected {} bytes, got {}", what, len, buf.len()),
            ),
        ));
    }
    Ok(buf)
}
