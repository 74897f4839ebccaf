//! Mask-driven edit features and their per-feature metadata.
//!
//! Both features share the same mask canvas controller; they differ only
//! in the remote endpoint, the extra form fields, and how strokes are
//! shown while drawing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Overlay;

/// A mask-based edit the remote API can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditFeature {
    /// Replace the masked area with content generated from a prompt.
    GenerativeFill,
    /// Remove whatever is under the mask and fill in the background.
    ObjectEraser,
}

impl EditFeature {
    /// All features in navigation order.
    pub const ALL: [Self; 2] = [Self::GenerativeFill, Self::ObjectEraser];

    /// API path, relative to the configured base URL.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::GenerativeFill => "/edit/generative-fill",
            Self::ObjectEraser => "/edit/erase",
        }
    }

    /// Whether a non-blank `prompt` field must accompany the request.
    #[must_use]
    pub const fn requires_prompt(self) -> bool {
        matches!(self, Self::GenerativeFill)
    }

    /// How strokes appear on the display surface for this feature.
    ///
    /// Fill draws a translucent overlay so the image stays visible under
    /// the selection; the eraser shows the mask itself.
    #[must_use]
    pub const fn overlay(self) -> Overlay {
        match self {
            Self::GenerativeFill => Overlay::DEFAULT_TINT,
            Self::ObjectEraser => Overlay::Mirror,
        }
    }

    /// Heading shown above the editor.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::GenerativeFill => "Generative Fill",
            Self::ObjectEraser => "Object Eraser",
        }
    }

    /// One-line description under the heading.
    #[must_use]
    pub const fn tagline(self) -> &'static str {
        match self {
            Self::GenerativeFill => "Fill masked areas with AI generated content.",
            Self::ObjectEraser => "Remove unwanted objects cleanly.",
        }
    }

    /// Label of the submit button.
    #[must_use]
    pub const fn action_label(self) -> &'static str {
        match self {
            Self::GenerativeFill => "Generate Fill",
            Self::ObjectEraser => "Erase Object",
        }
    }

    /// Label of the submit button while a request is in flight.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn busy_label(self) -> &'static str {
        "Processing..."
    }

    /// Short name accepted on the command line.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::GenerativeFill => "fill",
            Self::ObjectEraser => "erase",
        }
    }
}

impl fmt::Display for EditFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Error returned when parsing an unknown feature name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edit feature {0:?} (expected \"fill\" or \"erase\")")]
pub struct UnknownFeature(pub String);

impl FromStr for EditFeature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill" | "generative-fill" => Ok(Self::GenerativeFill),
            "erase" | "eraser" | "object-eraser" => Ok(Self::ObjectEraser),
            _ => Err(UnknownFeature(s.to_owned())),
        }
    }
}
