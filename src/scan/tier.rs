//! Decoder tiers for file scans and the on-device cascade.

use super::camera::MatrixDecoder;
use super::state::DecoderTier;
use crate::error::DecodeMiss;
use crate::models::{ImageFile, Raster};
use crate::symbol::SymbolReader;

/// One decoding attempt over a whole image file
pub trait TierDecoder {
    /// Label reported in state and logs
    fn tier(&self) -> DecoderTier;
    /// Decoded text, or the reason this tier missed
    fn try_decode(&self, image: &ImageFile) -> Result<String, DecodeMiss>;
}

/// A tier in the cascade, optionally gated on user consent
pub struct DecoderEntry {
    pub(crate) decoder: Box<dyn TierDecoder>,
    consent_service: Option<String>,
}

impl DecoderEntry {
    /// Tier that runs without asking
    pub fn local(decoder: impl TierDecoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
            consent_service: None,
        }
    }

    /// Tier that sends the image to `service` and needs explicit consent first
    pub fn consent_gated(decoder: impl TierDecoder + 'static, service: impl Into<String>) -> Self {
        Self {
            decoder: Box::new(decoder),
            consent_service: Some(service.into()),
        }
    }

    /// Whether the pipeline must ask before running this tier
    pub fn requires_consent(&self) -> bool {
        self.consent_service.is_some()
    }

    /// Service named in the consent prompt
    pub fn consent_service(&self) -> Option<&str> {
        self.consent_service.as_deref()
    }

    /// Tier label
    pub fn tier(&self) -> DecoderTier {
        self.decoder.tier()
    }
}

/// Whole-file image decoding library
pub trait ImageDecoder {
    /// Decoded text, or `None` when no symbol is found
    fn decode_image(&self, image: &ImageFile) -> Option<String>;
}

/// First tier: hands the file to an image decoding library
#[derive(Debug, Clone)]
pub struct PrimaryTier<D> {
    decoder: D,
}

impl<D: ImageDecoder> PrimaryTier<D> {
    /// Wrap an image decoder
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }
}

impl<D: ImageDecoder> TierDecoder for PrimaryTier<D> {
    fn tier(&self) -> DecoderTier {
        DecoderTier::Primary
    }

    fn try_decode(&self, image: &ImageFile) -> Result<String, DecodeMiss> {
        self.decoder.decode_image(image).ok_or(DecodeMiss::NotFound)
    }
}

/// Second tier: rasterizes the file, binarizes it against local block averages
/// and runs a matrix decoder, then retries on the inverted image for
/// light-on-dark symbols
#[derive(Debug, Clone)]
pub struct RasterTier<M> {
    matrix: M,
}

impl<M: MatrixDecoder> RasterTier<M> {
    /// Wrap a matrix decoder
    pub fn new(matrix: M) -> Self {
        Self { matrix }
    }
}

impl<M: MatrixDecoder> TierDecoder for RasterTier<M> {
    fn tier(&self) -> DecoderTier {
        DecoderTier::Secondary
    }

    fn try_decode(&self, image: &ImageFile) -> Result<String, DecodeMiss> {
        let raster =
            Raster::decode(&image.bytes).map_err(|err| DecodeMiss::Unreadable(err.to_string()))?;
        tracing::trace!(width = raster.width, height = raster.height, "rasterized image");
        let binary = raster.binarize_adaptive();
        self.matrix
            .decode_matrix(&binary)
            .or_else(|| self.matrix.decode_matrix(&binary.inverted()))
            .ok_or(DecodeMiss::NotFound)
    }
}

/// The on-device cascade: whole-image read, then the adaptive raster read
pub fn standard_local_tiers() -> Vec<DecoderEntry> {
    vec![
        DecoderEntry::local(PrimaryTier::new(SymbolReader::new())),
        DecoderEntry::local(RasterTier::new(SymbolReader::new())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BitMatrix;

    struct Fixed(Option<&'static str>);

    impl ImageDecoder for Fixed {
        fn decode_image(&self, _image: &ImageFile) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    impl MatrixDecoder for Fixed {
        fn decode_matrix(&self, _matrix: &BitMatrix) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn test_primary_tier() {
        let file = ImageFile::new("x.png", Some("image/png".into()), Vec::new());
        assert_eq!(PrimaryTier::new(Fixed(Some("hi"))).try_decode(&file).unwrap(), "hi");
        assert!(matches!(
            PrimaryTier::new(Fixed(None)).try_decode(&file),
            Err(DecodeMiss::NotFound)
        ));
    }

    #[test]
    fn test_raster_tier_unreadable_image() {
        let file = ImageFile::new("x.png", Some("image/png".into()), b"not png".to_vec());
        let result = RasterTier::new(Fixed(Some("hi"))).try_decode(&file);
        assert!(matches!(result, Err(DecodeMiss::Unreadable(_))));
    }

    #[test]
    fn test_raster_tier_retries_inverted() {
        struct DarkCorner;

        impl MatrixDecoder for DarkCorner {
            fn decode_matrix(&self, matrix: &BitMatrix) -> Option<String> {
                matrix.get(0, 0).then(|| "found".to_string())
            }
        }

        let raster = Raster::new(2, 1, vec![255, 255, 255, 0, 0, 0]);
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_raw(2, 1, raster.rgb)
            .unwrap()
            .write_to(&mut png, image::ImageOutputFormat::Png)
            .unwrap();
        let file = ImageFile::new("x.png", None, png.into_inner());
        assert_eq!(RasterTier::new(DarkCorner).try_decode(&file).unwrap(), "found");
    }

    #[test]
    fn test_standard_local_tiers() {
        let tiers = standard_local_tiers();
        let labels: Vec<DecoderTier> = tiers.iter().map(DecoderEntry::tier).collect();
        assert_eq!(labels, vec![DecoderTier::Primary, DecoderTier::Secondary]);
        assert!(tiers.iter().all(|t| !t.requires_consent()));
    }

    #[test]
    fn test_entry_flags() {
        let local = DecoderEntry::local(PrimaryTier::new(Fixed(None)));
        assert!(!local.requires_consent());
        assert_eq!(local.tier(), DecoderTier::Primary);

        let gated = DecoderEntry::consent_gated(RasterTier::new(Fixed(None)), "Svc");
        assert!(gated.requires_consent());
        assert_eq!(gated.consent_service(), Some("Svc"));
    }
}
