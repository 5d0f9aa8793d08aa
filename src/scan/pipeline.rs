//! The scan state machine over camera and file sessions.

use super::camera::{CameraSource, CameraSubscription, CancelToken, FrameDecoder};
use super::messages;
use super::remote::RemoteTier;
use super::state::{
    AcquisitionMode, ErrorKind, FailureKind, ScanFailure, ScanSession, ScanState,
};
use super::tier::{DecoderEntry, standard_local_tiers};
use crate::classifier::PayloadClassifier;
use crate::config::RemoteConfig;
use crate::error::{CameraAccessError, DecodeMiss, RemoteServiceError, ScanError};
use crate::history::{HistoryEntry, HistorySink};
use crate::models::{DecodedResult, ImageFile};
use tracing::{debug, info, instrument, trace, warn};

/// Stateful scan orchestrator.
///
/// File scans walk the tier list in order. The first consent-gated tier stops
/// the walk in [`ScanState::AwaitingFallbackConsent`]; only
/// [`grant_consent`](Self::grant_consent) runs it, exactly once, and its answer
/// is final. Camera scans hold a [`CameraSubscription`] that is released on
/// success, on cancel, on reset and when the pipeline is dropped.
///
/// One session at a time: starting a scan outside [`ScanState::Idle`] is refused.
pub struct ScanPipeline {
    tiers: Vec<DecoderEntry>,
    camera: Option<Box<dyn CameraSource>>,
    frame_decoder: Option<Box<dyn FrameDecoder>>,
    history: Option<Box<dyn HistorySink>>,
    classifier: PayloadClassifier,
    state: ScanState,
    session: Option<ScanSession>,
    transitions: Vec<ScanState>,
    decoded: Option<DecodedResult>,
}

enum CameraStep {
    Hit(String),
    Miss,
    Cancelled,
    Ended,
}

impl ScanPipeline {
    /// Pipeline over an ordered tier list
    pub fn new(tiers: Vec<DecoderEntry>) -> Self {
        Self {
            tiers,
            camera: None,
            frame_decoder: None,
            history: None,
            classifier: PayloadClassifier::new(),
            state: ScanState::Idle,
            session: None,
            transitions: vec![ScanState::Idle],
            decoded: None,
        }
    }

    /// On-device tiers followed by the consent-gated remote decoder from `config`
    pub fn with_standard_tiers(config: &RemoteConfig) -> Result<Self, RemoteServiceError> {
        let mut tiers = standard_local_tiers();
        tiers.push(DecoderEntry::consent_gated(
            RemoteTier::from_config(config)?,
            config.service_name.clone(),
        ));
        Ok(Self::new(tiers))
    }

    /// Enable camera scanning
    pub fn with_camera(
        mut self,
        source: impl CameraSource + 'static,
        decoder: impl FrameDecoder + 'static,
    ) -> Self {
        self.camera = Some(Box::new(source));
        self.frame_decoder = Some(Box::new(decoder));
        self
    }

    /// Record each successful scan
    pub fn with_history(mut self, sink: impl HistorySink + 'static) -> Self {
        self.history = Some(Box::new(sink));
        self
    }

    /// Tier cascade in the order it runs
    pub fn tiers(&self) -> &[DecoderEntry] {
        &self.tiers
    }

    /// Current state
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    /// States entered since the last reset, starting with `Idle`
    pub fn transitions(&self) -> &[ScanState] {
        &self.transitions
    }

    /// Scanned text once in `Success`
    pub fn scanned_text(&self) -> Option<&str> {
        match &self.state {
            ScanState::Success(text) => Some(text),
            _ => None,
        }
    }

    /// Classification of the scanned text once in `Success`
    pub fn decoded_result(&self) -> Option<&DecodedResult> {
        self.decoded.as_ref()
    }

    /// Prompt to show while awaiting consent
    pub fn consent_prompt(&self) -> Option<String> {
        match &self.state {
            ScanState::AwaitingFallbackConsent { service } => Some(messages::consent_prompt(service)),
            _ => None,
        }
    }

    /// Drop the session (releasing any camera) and return to `Idle`
    pub fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(mode = ?session.acquisition_mode, "session discarded");
        }
        self.decoded = None;
        self.state = ScanState::Idle;
        self.transitions = vec![ScanState::Idle];
    }

    /// Acquire the camera and enter `CameraActive`.
    ///
    /// On acquisition failure the pipeline enters `Failed` with the cause's
    /// message and the error is also returned.
    #[instrument(skip_all)]
    pub fn start_camera(&mut self) -> Result<CancelToken, ScanError> {
        self.ensure_idle()?;
        let acquired = match self.camera.as_mut() {
            Some(source) => source.acquire(),
            None => Err(CameraAccessError::DeviceNotFound),
        };

        let mut session = ScanSession::new(AcquisitionMode::Camera);
        match acquired {
            Ok(stream) => {
                let token = CancelToken::new();
                session.camera = Some(CameraSubscription::new(stream, token.clone()));
                self.session = Some(session);
                info!("camera acquired");
                self.transition(ScanState::CameraActive);
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "camera unavailable");
                session.last_error = Some(ErrorKind::CameraAccess(err.clone()));
                self.session = Some(session);
                self.fail(FailureKind::Camera(err.clone()));
                Err(ScanError::Camera(err))
            }
        }
    }

    /// Test frames until one decodes, the token is cancelled or the stream ends.
    ///
    /// Per-frame misses are silent. Cancellation returns to `Idle`; a stream that
    /// ends without a hit fails the session.
    #[instrument(skip_all)]
    pub fn drive_camera(&mut self) -> Result<&ScanState, ScanError> {
        if self.state != ScanState::CameraActive {
            return Err(self.invalid("drive the camera"));
        }

        loop {
            let step = match (self.session.as_mut(), self.frame_decoder.as_ref()) {
                (Some(session), Some(decoder)) => match session.camera.as_mut() {
                    Some(camera) => match camera.next_frame() {
                        Some(frame) => match decoder.decode_frame(&frame) {
                            Some(text) if !text.is_empty() => CameraStep::Hit(text),
                            _ => {
                                session.frames_missed += 1;
                                CameraStep::Miss
                            }
                        },
                        None if camera.token().is_cancelled() => CameraStep::Cancelled,
                        None => CameraStep::Ended,
                    },
                    None => CameraStep::Ended,
                },
                _ => CameraStep::Ended,
            };

            match step {
                CameraStep::Miss => trace!("frame miss"),
                CameraStep::Hit(text) => {
                    self.succeed(text);
                    break;
                }
                CameraStep::Cancelled => {
                    self.stop_camera();
                    break;
                }
                CameraStep::Ended => {
                    let err = CameraAccessError::Other("camera stream ended".to_string());
                    if let Some(session) = self.session.as_mut() {
                        session.last_error = Some(ErrorKind::CameraAccess(err.clone()));
                    }
                    self.fail(FailureKind::Camera(err));
                    break;
                }
            }
        }
        Ok(&self.state)
    }

    /// User cancel: release the camera and return to `Idle`
    pub fn cancel_camera(&mut self) -> Result<&ScanState, ScanError> {
        if self.state != ScanState::CameraActive {
            return Err(self.invalid("cancel the camera"));
        }
        self.stop_camera();
        Ok(&self.state)
    }

    /// Validate `image` and run local tiers until one hits or a consent-gated tier is reached
    #[instrument(skip_all, fields(file = %image.name))]
    pub fn scan_file(&mut self, image: ImageFile) -> Result<&ScanState, ScanError> {
        self.ensure_idle()?;
        if !image.is_image() {
            let mime = image.mime_type().unwrap_or_else(|| "unknown".to_string());
            warn!(%mime, "rejected non-image file");
            return Err(ScanError::Validation(format!(
                "{} is not an image (type {mime})",
                image.name
            )));
        }

        let mut session = ScanSession::new(AcquisitionMode::File);
        session.image = Some(image);
        self.session = Some(session);
        self.run_tiers_from(0);
        Ok(&self.state)
    }

    /// Run the pending consent-gated tier once; its result is final
    #[instrument(skip_all)]
    pub fn grant_consent(&mut self) -> Result<&ScanState, ScanError> {
        let pending = match (&self.state, self.session.as_ref()) {
            (ScanState::AwaitingFallbackConsent { .. }, Some(session)) => session.pending_tier,
            _ => None,
        };
        let Some(index) = pending else {
            return Err(self.invalid("grant consent"));
        };

        info!("remote decoding consented");
        if let Some(session) = self.session.as_mut() {
            session.pending_tier = None;
        }
        if !self.run_tier(index) {
            self.exhaust();
        }
        Ok(&self.state)
    }

    /// Refuse remote decoding; fails the session without any network call
    pub fn decline_consent(&mut self) -> Result<&ScanState, ScanError> {
        if !matches!(self.state, ScanState::AwaitingFallbackConsent { .. }) {
            return Err(self.invalid("decline consent"));
        }
        info!("remote decoding declined");
        if let Some(session) = self.session.as_mut() {
            session.pending_tier = None;
        }
        self.fail(FailureKind::ConsentDeclined);
        Ok(&self.state)
    }

    fn run_tiers_from(&mut self, start: usize) {
        for index in start..self.tiers.len() {
            if let Some(service) = self.tiers[index].consent_service() {
                let service = service.to_string();
                if let Some(session) = self.session.as_mut() {
                    session.pending_tier = Some(index);
                }
                self.transition(ScanState::AwaitingFallbackConsent { service });
                return;
            }
            if self.run_tier(index) {
                return;
            }
        }
        self.exhaust();
    }

    /// Run one tier; true on a hit
    fn run_tier(&mut self, index: usize) -> bool {
        let tier = self.tiers[index].tier();
        self.transition(ScanState::FileDecoding(tier));

        let outcome = match self.session.as_mut() {
            Some(session) => {
                session.attempt = Some(tier);
                session.tried.push(tier);
                match session.image.as_ref() {
                    Some(image) => match self.tiers[index].decoder.try_decode(image) {
                        Ok(text) if text.is_empty() => Err(DecodeMiss::NotFound),
                        other => other,
                    },
                    None => Err(DecodeMiss::Unreadable("no image in session".to_string())),
                }
            }
            None => Err(DecodeMiss::Unreadable("no active session".to_string())),
        };

        match outcome {
            Ok(text) => {
                debug!(%tier, "tier decoded image");
                self.succeed(text);
                true
            }
            Err(miss) => {
                debug!(%tier, reason = %miss, "tier missed");
                if let Some(session) = self.session.as_mut() {
                    session.last_error = Some(match miss {
                        DecodeMiss::Remote(err) => ErrorKind::RemoteService(err.to_string()),
                        _ => ErrorKind::DecodeMiss(tier),
                    });
                }
                false
            }
        }
    }

    fn succeed(&mut self, text: String) {
        let result = self.classifier.classify(&text);
        if let Some(session) = self.session.as_mut() {
            session.raw_result = Some(text.clone());
            if let Some(mut camera) = session.camera.take() {
                camera.release();
            }
        }
        if let Some(history) = &self.history {
            history.append(HistoryEntry::Scanned {
                raw: text.clone(),
                result: result.clone(),
            });
        }
        info!(payload_type = ?result.payload_type, "scan succeeded");
        self.decoded = Some(result);
        self.transition(ScanState::Success(text));
    }

    fn exhaust(&mut self) {
        let tried = self
            .session
            .as_ref()
            .map(|s| s.tried.clone())
            .unwrap_or_default();
        self.fail(FailureKind::Exhausted { tried });
    }

    fn fail(&mut self, kind: FailureKind) {
        if let Some(camera) = self.session.as_mut().and_then(|s| s.camera.as_mut()) {
            camera.release();
        }
        let failure = ScanFailure::new(kind);
        warn!(reason = %failure.message, "scan failed");
        self.transition(ScanState::Failed(failure));
    }

    fn stop_camera(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(mut camera) = session.camera.take() {
                camera.token().cancel();
                camera.release();
            }
            debug!(frames_missed = session.frames_missed, "camera scan cancelled");
        }
        self.transition(ScanState::Idle);
    }

    fn ensure_idle(&self) -> Result<(), ScanError> {
        if self.state == ScanState::Idle {
            Ok(())
        } else {
            Err(ScanError::SessionActive(self.state.name()))
        }
    }

    fn invalid(&self, action: &'static str) -> ScanError {
        ScanError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    fn transition(&mut self, next: ScanState) {
        debug!(from = self.state.name(), to = next.name(), "scan state");
        self.transitions.push(next.clone());
        self.state = next;
    }
}
