//! visionary-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, canvas blitting, Blob downloads, and `fetch`
//! submission of API requests, and provides the UI components for the
//! visionary web application.

pub mod api;
pub mod components;
pub mod download;
pub mod pointer;
pub mod raster;

pub use components::{EditorPanel, FileUpload, GeneratorPanel, MaskEditor, ProductPanel};
pub use raster::ObjectUrl;
