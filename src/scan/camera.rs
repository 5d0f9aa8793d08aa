//! Camera acquisition as a cancellable frame subscription.
//!
//! A [`CameraSubscription`] owns the acquired stream and releases it exactly
//! once: on success, on cancel, or when it is dropped.

use crate::error::CameraAccessError;
use crate::models::{BitMatrix, Raster};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Platform camera provider
pub trait CameraSource {
    /// Open the camera in continuous-scan mode
    fn acquire(&mut self) -> Result<Box<dyn FrameStream>, CameraAccessError>;
}

/// Frames from an acquired camera
pub trait FrameStream {
    /// Next frame; `None` once the device stops delivering
    fn next_frame(&mut self) -> Option<Raster>;
    /// Give the device back
    fn release(&mut self);
}

/// Tests a single frame for a symbol. Misses are normal.
pub trait FrameDecoder {
    /// Decoded text, or `None` for a miss
    fn decode_frame(&self, frame: &Raster) -> Option<String>;
}

/// Decodes a binarized dark/light grid into symbol text
pub trait MatrixDecoder {
    /// Decoded text, or `None` when no symbol is found
    fn decode_matrix(&self, matrix: &BitMatrix) -> Option<String>;
}

/// Frame decoder that binarizes each frame and defers to a [`MatrixDecoder`]
#[derive(Debug, Clone)]
pub struct MatrixFrameDecoder<M> {
    matrix: M,
}

impl<M: MatrixDecoder> MatrixFrameDecoder<M> {
    /// Wrap a matrix decoder
    pub fn new(matrix: M) -> Self {
        Self { matrix }
    }
}

impl<M: MatrixDecoder> FrameDecoder for MatrixFrameDecoder<M> {
    fn decode_frame(&self, frame: &Raster) -> Option<String> {
        self.matrix.decode_matrix(&frame.binarize())
    }
}

/// Shared cancel flag for a camera subscription
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// An acquired camera plus its cancel token
pub struct CameraSubscription {
    stream: Box<dyn FrameStream>,
    token: CancelToken,
    released: bool,
}

impl CameraSubscription {
    /// Take ownership of an acquired stream
    pub fn new(stream: Box<dyn FrameStream>, token: CancelToken) -> Self {
        Self {
            stream,
            token,
            released: false,
        }
    }

    /// Token that cancels this subscription
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Next frame, or `None` when cancelled, released or exhausted
    pub fn next_frame(&mut self) -> Option<Raster> {
        if self.released || self.token.is_cancelled() {
            return None;
        }
        self.stream.next_frame()
    }

    /// Release the device; later calls are no-ops
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stream.release();
            tracing::debug!("camera released");
        }
    }
}

impl fmt::Debug for CameraSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSubscription")
            .field("cancelled", &self.token.is_cancelled())
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for CameraSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingStream {
        frames: usize,
        releases: Arc<AtomicUsize>,
    }

    impl FrameStream for CountingStream {
        fn next_frame(&mut self) -> Option<Raster> {
            if self.frames == 0 {
                return None;
            }
            self.frames -= 1;
            Some(Raster::new(1, 1, vec![0, 0, 0]))
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn subscription(frames: usize) -> (CameraSubscription, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let stream = CountingStream {
            frames,
            releases: releases.clone(),
        };
        (CameraSubscription::new(Box::new(stream), CancelToken::new()), releases)
    }

    #[test]
    fn test_release_once_on_drop() {
        let (mut sub, releases) = subscription(3);
        sub.release();
        drop(sub);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_stops_frames() {
        let (mut sub, releases) = subscription(3);
        assert!(sub.next_frame().is_some());
        sub.token().cancel();
        assert!(sub.next_frame().is_none());
        drop(sub);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    struct DarkCounter;

    impl MatrixDecoder for DarkCounter {
        fn decode_matrix(&self, matrix: &BitMatrix) -> Option<String> {
            (matrix.count_dark() > 0).then(|| matrix.count_dark().to_string())
        }
    }

    #[test]
    fn test_matrix_frame_decoder_binarizes() {
        let frame = Raster::new(2, 1, vec![0, 0, 0, 255, 255, 255]);
        let decoder = MatrixFrameDecoder::new(DarkCounter);
        assert_eq!(decoder.decode_frame(&frame).as_deref(), Some("1"));
    }
}
