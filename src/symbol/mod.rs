//! On-device QR symbol reading.
//!
//! Turns a binarized image into symbol text:
//! - Finder detection and orientation from three finder centres
//! - Affine module sampling for the estimated version (and its neighbours)
//! - Format/version info, unmasking, block de-interleaving
//! - Reed-Solomon correction and segment decoding
//!
//! [`SymbolReader`] is both the [`ImageDecoder`] behind the primary tier and the
//! [`MatrixDecoder`] behind the raster tier and camera frames.

/// Format and version information
pub mod format;
/// Reed-Solomon error correction
pub mod reed_solomon;

mod finder;
mod grid;
mod layout;
mod segments;
mod tables;

pub use format::{EcLevel, FormatInfo};
pub use reed_solomon::RsError;

use crate::models::{BitMatrix, ImageFile, Raster};
use crate::scan::{ImageDecoder, MatrixDecoder};
use grid::Corners;
use tracing::{debug, trace};

/// Finder candidates considered when picking the symbol's three corners
const MAX_FINDER_CANDIDATES: usize = 4;

/// Local QR reader over binarized images and sampled module grids
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolReader;

impl SymbolReader {
    /// Create a reader
    pub fn new() -> Self {
        Self
    }

    /// Locate and decode one symbol in a binarized image (`true` = dark)
    pub fn read(&self, image: &BitMatrix) -> Option<String> {
        let patterns = finder::find_patterns(image);
        if patterns.len() < 3 {
            trace!(found = patterns.len(), "too few finder patterns");
            return None;
        }
        let top = &patterns[..patterns.len().min(MAX_FINDER_CANDIDATES)];

        for i in 0..top.len() {
            for j in i + 1..top.len() {
                for k in j + 1..top.len() {
                    let corners = Corners::order(top[i], top[j], top[k]);
                    for version in corners.candidate_versions() {
                        let grid = corners.sample(image, version);
                        if let Some(text) = self.read_grid(&grid) {
                            debug!(version, "symbol decoded");
                            return Some(text);
                        }
                    }
                }
            }
        }
        None
    }

    /// Decode an upright module grid, one bit per module (`true` = dark)
    pub fn read_grid(&self, grid: &BitMatrix) -> Option<String> {
        let size = grid.width();
        if size != grid.height() || size < 21 || (size - 17) % 4 != 0 || size > 177 {
            return None;
        }
        let version = ((size - 17) / 4) as u8;

        let format = format::read_format(grid)?;
        if version >= 7 {
            if let Some(declared) = format::read_version(grid) {
                if declared != version {
                    trace!(declared, sampled = version, "version mismatch");
                    return None;
                }
            }
        }

        let codewords = layout::read_codewords(grid, version, format.mask);
        let data = correct_blocks(&codewords, version, format.ec_level)?;
        segments::decode_segments(&data, version)
    }
}

/// De-interleave codewords into RS blocks, correct each block and concatenate
/// the data parts. Shorter blocks come first; longer ones carry one extra data
/// codeword.
fn correct_blocks(codewords: &[u8], version: u8, level: EcLevel) -> Option<Vec<u8>> {
    let layout = tables::block_layout(version, level)?;
    let (blocks, ecc) = (layout.blocks, layout.ecc_per_block);
    let short_count = blocks - codewords.len() % blocks;
    let short_len = codewords.len() / blocks;
    if short_len <= ecc {
        return None;
    }
    let short_data = short_len - ecc;

    let mut split: Vec<Vec<u8>> = vec![Vec::with_capacity(short_len + 1); blocks];
    let mut next = codewords.iter().copied();
    for i in 0..=short_data {
        for (j, block) in split.iter_mut().enumerate() {
            if i < short_data || j >= short_count {
                block.push(next.next()?);
            }
        }
    }
    for _ in 0..ecc {
        for block in split.iter_mut() {
            block.push(next.next()?);
        }
    }

    let mut data = Vec::new();
    for (index, mut block) in split.into_iter().enumerate() {
        match reed_solomon::correct(&mut block, ecc) {
            Ok(0) => {}
            Ok(fixed) => trace!(block = index, fixed, "corrected codewords"),
            Err(err) => {
                trace!(block = index, error = %err, "block uncorrectable");
                return None;
            }
        }
        data.extend_from_slice(&block[..block.len() - ecc]);
    }
    Some(data)
}

impl MatrixDecoder for SymbolReader {
    fn decode_matrix(&self, matrix: &BitMatrix) -> Option<String> {
        self.read(matrix)
    }
}

impl ImageDecoder for SymbolReader {
    fn decode_image(&self, image: &ImageFile) -> Option<String> {
        let raster = match Raster::decode(&image.bytes) {
            Ok(raster) => raster,
            Err(err) => {
                trace!(error = %err, "image not decodable");
                return None;
            }
        };
        self.read(&raster.binarize())
    }
}
