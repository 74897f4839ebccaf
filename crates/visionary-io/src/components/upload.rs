//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdUpload;
use visionary_mask::LoadTicket;

/// Allowed file extensions for image uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Check whether a filename has an allowed image extension.
fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called once an acceptable file is picked, before its bytes are read.
    /// Returning `None` abandons the pick.
    on_pick: Callback<(), Option<LoadTicket>>,
    /// Called with the pick's ticket, the raw file bytes, and the filename
    /// after a successful read.
    on_upload: EventHandler<(LoadTicket, Vec<u8>, String)>,
    /// Disables picking (e.g. while a request is in flight).
    #[props(default)]
    disabled: bool,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts PNG, JPEG, BMP, and WebP images.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let disabled = props.disabled;

    let process_files = move |files: Vec<FileData>| async move {
        if disabled {
            return;
        }
        if let Some(file) = files.first() {
            let name = file.name();
            if !has_allowed_extension(&name) {
                error.set(Some(format!("Unsupported file type: {name}")));
                return;
            }
            let Some(ticket) = props.on_pick.call(()) else {
                return;
            };
            match file.read_bytes().await {
                Ok(bytes) => {
                    error.set(None);
                    props.on_upload.call((ticket, bytes.to_vec(), name));
                }
                Err(e) => {
                    log::warn!("reading {name} failed: {e}");
                    error.set(Some(format!("Failed to read file: {e}")));
                }
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let zone_class = if dragging() {
        "upload-zone upload-zone--active"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref err) = error() {
                p { class: "text-error", "{err}" }
            }

            label { class: if disabled { "button button--disabled" } else { "button" },
                Icon { icon: LdUpload, width: 18, height: 18 }
                input {
                    r#type: "file",
                    accept: "image/png,image/jpeg,image/bmp,image/webp",
                    class: "hidden",
                    disabled,
                    onchange: handle_files,
                }
                "Upload Image"
            }

            p { class: "muted small", "or drop a JPG or PNG here" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("photo.JPG"));
        assert!(has_allowed_extension("a.b.webp"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("noextension"));
    }
}
