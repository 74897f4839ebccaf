//! Stroke scripts: recorded pointer input replayed against a session.
//!
//! ```json
//! {
//!   "display": { "width": 200, "height": 150 },
//!   "strokes": [
//!     { "width": 20, "points": [{ "x": 10, "y": 10 }, { "x": 60, "y": 40 }] }
//!   ]
//! }
//! ```
//!
//! Points are in display (CSS) space. Without `display`, the image is
//! assumed to be shown at its natural size.

use serde::Deserialize;
use visionary_mask::{DisplaySize, ScreenPoint, Session, SessionError};

/// A sequence of strokes recorded against one display size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrokeScript {
    /// Rendered size the points were captured at.
    #[serde(default)]
    pub display: Option<DisplaySize>,
    /// Strokes in drawing order.
    pub strokes: Vec<ScriptedStroke>,
}

/// One pointer-down .. pointer-up gesture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedStroke {
    /// Brush width for this stroke. Keeps the current width if absent.
    #[serde(default)]
    pub width: Option<f32>,
    /// Pointer positions; the first is the pointer-down.
    pub points: Vec<ScreenPoint>,
}

/// Errors produced while loading or replaying a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script is not valid JSON or has the wrong shape.
    #[error("invalid stroke script: {0}")]
    Parse(#[from] serde_json::Error),

    /// A stroke has no points.
    #[error("stroke {0} has no points")]
    EmptyStroke(usize),

    /// The session rejected a stroke.
    #[error("stroke {index} rejected: {source}")]
    Rejected {
        /// Position of the stroke in the script.
        index: usize,
        /// Why it was rejected.
        source: SessionError,
    },
}

impl StrokeScript {
    /// Parse a script from JSON text.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Parse`] on malformed JSON or unknown fields.
    pub fn parse(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Feed every stroke into `session`, as a pointer would.
    ///
    /// Returns how many points were drawn.
    ///
    /// # Errors
    ///
    /// - [`ScriptError::EmptyStroke`] for a stroke without points.
    /// - [`ScriptError::Rejected`] if the session refuses a stroke (no
    ///   image loaded, unusable display size).
    pub fn replay(&self, session: &mut Session) -> Result<usize, ScriptError> {
        let natural = session
            .controller()
            .source()
            .map(|s| DisplaySize::from(s.dimensions()));
        let display = self
            .display
            .or(natural)
            .unwrap_or_else(|| DisplaySize::new(0.0, 0.0));

        let mut drawn = 0;
        for (index, stroke) in self.strokes.iter().enumerate() {
            let Some((first, rest)) = stroke.points.split_first() else {
                return Err(ScriptError::EmptyStroke(index));
            };
            if let Some(width) = stroke.width {
                let applied = session.set_brush_width(width);
                if (applied - width).abs() > f32::EPSILON {
                    log::warn!("stroke {index}: brush width {width} clamped to {applied}");
                }
            }
            session
                .begin_stroke(*first, display)
                .map_err(|source| ScriptError::Rejected { index, source })?;
            drawn += 1;
            for point in rest {
                if session.extend_stroke(*point, display).is_some() {
                    drawn += 1;
                }
            }
            session.end_stroke();
        }
        log::debug!("replayed {} strokes ({drawn} points)", self.strokes.len());
        Ok(drawn)
    }
}
