//! Editing session state machine.
//!
//! One [`Session`] backs one feature screen. It gates every controller
//! operation on the current [`SessionState`]:
//!
//! ```text
//! Empty ──begin_load──▶ Loading ──finish_load──▶ Ready ◀──clear_mask── Drawing
//!   ▲                      │ (decode error)        │ begin_stroke          │
//!   └──────────────────────┘                       └──────────▶ Drawing ◀──┘
//!
//! Drawing ──begin_submit──▶ Submitting ──finish_submit(Ok)──▶ Resulted
//!    ▲                          │                               │
//!    └──── finish_submit(Err) ──┘            edit_again ──▶ Ready
//! ```
//!
//! A failed submission returns to `Drawing` with the image and mask
//! untouched, so the user can retry without redrawing.

use std::fmt;

use crate::api::{ApiError, EditRequest, RequestError, ResultLocator};
use crate::config::BrushConfig;
use crate::controller::{MaskCanvasController, Stroke, StrokeUpdate};
use crate::feature::EditFeature;
use crate::source::{LoadTicket, LoadTickets, Upload};
use crate::types::{Dimensions, DisplaySize, ExportError, LoadError, ScreenPoint, StrokeError};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No image.
    Empty,
    /// A file was picked and is being read.
    Loading,
    /// Image loaded, mask empty.
    Ready,
    /// At least one stroke has been painted.
    Drawing,
    /// A request is in flight.
    Submitting,
    /// The remote result is showing; drawing is suspended.
    Resulted,
}

impl SessionState {
    /// Whether strokes may be drawn in this state.
    #[must_use]
    pub const fn accepts_strokes(self) -> bool {
        matches!(self, Self::Ready | Self::Drawing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Drawing => "drawing",
            Self::Submitting => "submitting",
            Self::Resulted => "resulted",
        })
    }
}

/// Broad category of a [`SessionError`], for choosing how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing user input; nothing was sent.
    Input,
    /// The editor is not ready for the operation yet; show a "please
    /// wait" notice.
    Readiness,
    /// The remote call failed.
    Transport,
    /// A file or surface could not be decoded or encoded.
    Decode,
}

/// Errors from session operations. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Name of the rejected operation.
        operation: &'static str,
        /// State at the time.
        state: SessionState,
    },

    /// A request is already in flight.
    #[error("a request is already being processed")]
    Busy,

    /// A newer file was picked (or the session was reset) while this one
    /// was being read.
    #[error("a newer image was picked, ignoring this one")]
    StaleLoad,

    /// No image has been uploaded.
    #[error("please upload an image first")]
    NoImage,

    /// Nothing has been painted on the mask.
    #[error("paint over the area to edit first")]
    EmptyMask,

    /// A stroke is still in progress.
    #[error("finish the current stroke first")]
    StrokeInProgress,

    /// The mask could only be exported as the all-black fallback.
    #[error("the mask could not be rendered, please clear it and try again")]
    MaskUnavailable,

    /// Request assembly failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The upload could not be decoded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A stroke was rejected.
    #[error(transparent)]
    Stroke(#[from] StrokeError),

    /// The mask could not be exported.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoImage
            | Self::EmptyMask
            | Self::StaleLoad
            | Self::Request(_)
            | Self::InvalidState { .. } => ErrorKind::Input,
            Self::Busy
            | Self::StrokeInProgress
            | Self::Export(ExportError::NotReady)
            | Self::Stroke(_) => ErrorKind::Readiness,
            Self::Api(_) => ErrorKind::Transport,
            Self::Load(_) | Self::MaskUnavailable | Self::Export(ExportError::PngEncode(_)) => {
                ErrorKind::Decode
            }
        }
    }
}

/// One feature screen's editing state.
#[derive(Debug)]
pub struct Session {
    feature: EditFeature,
    controller: MaskCanvasController,
    state: SessionState,
    tickets: LoadTickets,
    prompt: String,
    result: Option<String>,
}

impl Session {
    /// An empty session for `feature`.
    #[must_use]
    pub fn new(feature: EditFeature) -> Self {
        Self {
            feature,
            controller: MaskCanvasController::new(feature.overlay(), BrushConfig::default()),
            state: SessionState::Empty,
            tickets: LoadTickets::default(),
            prompt: String::new(),
            result: None,
        }
    }

    /// Note that a new file has been picked and is being read.
    ///
    /// Discards the current image, mask, and result. The returned ticket
    /// must be handed to [`finish_load`](Self::finish_load) with the
    /// file's bytes; picking again makes it stale.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a request is in flight.
    pub fn begin_load(&mut self) -> Result<LoadTicket, SessionError> {
        if self.state == SessionState::Submitting {
            return Err(SessionError::Busy);
        }
        self.controller.reset();
        self.result = None;
        self.transition(SessionState::Loading);
        Ok(self.tickets.issue())
    }

    /// Finish the read started by the [`begin_load`](Self::begin_load)
    /// that returned `ticket`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::StaleLoad`] if another file was picked, or the
    ///   session was reset, after `ticket` was issued. Nothing changes.
    /// - [`SessionError::InvalidState`] outside `Loading`.
    /// - [`SessionError::Load`] if the file does not decode; the session
    ///   returns to `Empty`.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        upload: Upload,
    ) -> Result<Dimensions, SessionError> {
        if !self.tickets.is_current(ticket) {
            log::debug!("dropping stale read of {}", upload.filename);
            return Err(SessionError::StaleLoad);
        }
        self.expect_state("finish loading", &[SessionState::Loading])?;
        match self.controller.load_image(upload) {
            Ok(dimensions) => {
                self.transition(SessionState::Ready);
                Ok(dimensions)
            }
            Err(e) => {
                self.transition(SessionState::Empty);
                Err(e.into())
            }
        }
    }

    /// Start a stroke. The first stroke that marks a mask pixel moves
    /// `Ready` to `Drawing`; one that lands entirely off the image does
    /// not.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] outside `Ready`/`Drawing`, or
    /// [`SessionError::Stroke`] if the controller rejects the stroke.
    pub fn begin_stroke(
        &mut self,
        point: ScreenPoint,
        display: DisplaySize,
    ) -> Result<StrokeUpdate, SessionError> {
        self.expect_state("draw", &[SessionState::Ready, SessionState::Drawing])?;
        let update = self.controller.begin_stroke(point, display)?;
        self.note_paint();
        Ok(update)
    }

    /// Extend the current stroke. No-op outside `Ready`/`Drawing`.
    pub fn extend_stroke(
        &mut self,
        point: ScreenPoint,
        display: DisplaySize,
    ) -> Option<StrokeUpdate> {
        if !self.state.accepts_strokes() {
            return None;
        }
        let update = self.controller.extend_stroke(point, display)?;
        self.note_paint();
        Some(update)
    }

    /// End the current stroke, if any.
    pub fn end_stroke(&mut self) -> Option<Stroke> {
        self.controller.end_stroke()
    }

    /// Set the brush width for subsequent strokes. Returns the clamped
    /// width.
    pub fn set_brush_width(&mut self, px: f32) -> f32 {
        self.controller.set_brush_width(px)
    }

    /// Erase the mask.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] outside `Ready`/`Drawing`.
    pub fn clear_mask(&mut self) -> Result<(), SessionError> {
        self.expect_state("clear the mask", &[SessionState::Ready, SessionState::Drawing])?;
        self.controller.clear_mask();
        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Replace the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Validate, export the mask, and build the request to send.
    ///
    /// On success the session is `Submitting` until
    /// [`finish_submit`](Self::finish_submit) is called. On error nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Busy`] while a request is in flight.
    /// - [`SessionError::NoImage`], [`SessionError::EmptyMask`], or
    ///   [`SessionError::Request`] for missing input.
    /// - [`SessionError::Export`] with [`ExportError::NotReady`] while the
    ///   image is still loading.
    /// - [`SessionError::StrokeInProgress`] mid-stroke.
    /// - [`SessionError::MaskUnavailable`] if the mask could only be
    ///   exported as the all-black fallback.
    pub fn begin_submit(&mut self, api_key: Option<&str>) -> Result<EditRequest, SessionError> {
        match self.state {
            SessionState::Drawing => {}
            SessionState::Submitting => return Err(SessionError::Busy),
            SessionState::Empty => return Err(SessionError::NoImage),
            SessionState::Loading => return Err(ExportError::NotReady.into()),
            SessionState::Ready => return Err(SessionError::EmptyMask),
            SessionState::Resulted => {
                return Err(SessionError::InvalidState {
                    operation: "submit",
                    state: self.state,
                });
            }
        }
        if self.controller.is_drawing() {
            return Err(SessionError::StrokeInProgress);
        }
        if self.feature.requires_prompt() && self.prompt.trim().is_empty() {
            return Err(RequestError::MissingPrompt.into());
        }

        let export = self.controller.export_mask()?;
        if export.fallback {
            return Err(SessionError::MaskUnavailable);
        }
        let source = self.controller.source().ok_or(SessionError::NoImage)?;
        let request = EditRequest::new(
            self.feature,
            source,
            export.png,
            Some(&self.prompt),
            api_key,
        )?;

        self.transition(SessionState::Submitting);
        Ok(request)
    }

    /// Record the outcome of the request started by
    /// [`begin_submit`](Self::begin_submit).
    ///
    /// Returns the result URL on success.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if no request was in flight.
    /// - [`SessionError::Api`] if the request failed. The session returns
    ///   to `Drawing` with the image and mask intact.
    pub fn finish_submit(
        &mut self,
        outcome: Result<ResultLocator, ApiError>,
    ) -> Result<&str, SessionError> {
        self.expect_state("finish submitting", &[SessionState::Submitting])?;
        match outcome {
            Ok(locator) => {
                self.transition(SessionState::Resulted);
                Ok(self.result.insert(locator.into_url()).as_str())
            }
            Err(e) => {
                log::warn!("{} request failed: {e}", self.feature);
                self.transition(SessionState::Drawing);
                Err(e.into())
            }
        }
    }

    /// Leave the result view and start a fresh mask on the same image.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] outside `Resulted`.
    pub fn edit_again(&mut self) -> Result<(), SessionError> {
        self.expect_state("edit again", &[SessionState::Resulted])?;
        self.result = None;
        self.controller.clear_mask();
        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Drop the image, mask, and result. The prompt text is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a request is in flight.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Submitting {
            return Err(SessionError::Busy);
        }
        self.tickets.invalidate();
        self.controller.reset();
        self.result = None;
        self.transition(SessionState::Empty);
        Ok(())
    }

    /// `true` while a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Submitting
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The feature this session edits for.
    #[must_use]
    pub const fn feature(&self) -> EditFeature {
        self.feature
    }

    /// Current prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Result URL, present only in `Resulted`.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// The underlying controller, for rendering.
    #[must_use]
    pub const fn controller(&self) -> &MaskCanvasController {
        &self.controller
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn note_paint(&mut self) {
        if self.state == SessionState::Ready && self.controller.has_strokes() {
            self.transition(SessionState::Drawing);
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            log::debug!("{} session: {} -> {to}", self.feature, self.state);
            self.state = to;
        }
    }
}
