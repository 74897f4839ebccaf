//! Dioxus UI components for visionary.
//!
//! Provides the file upload zone, the mask editor canvas, the
//! per-feature editor panel that ties them to a session, and the
//! mask-free generator and product studio screens.

mod editor_panel;
mod generator_panel;
mod mask_editor;
mod product_panel;
mod upload;

pub use editor_panel::EditorPanel;
pub use generator_panel::GeneratorPanel;
pub use mask_editor::MaskEditor;
pub use product_panel::ProductPanel;
pub use upload::FileUpload;
