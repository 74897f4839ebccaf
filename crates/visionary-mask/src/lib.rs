//! visionary-mask: Mask canvas controller and editing session (sans-IO).
//!
//! Turns pointer input on a CSS-scaled image into a full-resolution
//! black/white mask PNG for the remote inpainting API:
//! pointer event -> screen-to-mask scale -> stroke on display + mask
//! surfaces -> composite over black -> binary PNG.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Canvas blitting, `fetch`,
//! and downloads live in `visionary-io`.

pub mod api;
pub mod config;
pub mod controller;
pub mod export;
pub mod feature;
pub mod generate;
pub mod product;
pub mod session;
pub mod source;
pub mod surface;
pub mod types;

pub use api::{
    ApiError, ApiRequest, EditRequest, FormPart, FormValue, RequestError, ResultLocator,
    decode_reply,
};
pub use config::{ApiConfig, BrushConfig, ConfigError, Overlay};
pub use controller::{MaskCanvasController, Stroke, StrokeUpdate};
pub use export::MaskExport;
pub use feature::EditFeature;
pub use generate::{
    AspectRatio, EnhanceRequest, GenerateRequest, GenerateSettings, ImageStyle, decode_enhanced,
    decode_gallery,
};
pub use product::{ProductMode, ProductRequest, ProductSettings, ShadowType};
pub use session::{ErrorKind, Session, SessionError, SessionState};
pub use source::{LoadTicket, LoadTickets, SourceImage, Upload};
pub use types::{
    Dimensions, DirtyRect, DisplaySize, ExportError, LoadError, MaskPoint, ScreenPoint,
    StrokeError,
};
