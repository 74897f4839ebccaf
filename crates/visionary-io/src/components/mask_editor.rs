//! Image with a paintable mask canvas on top.

use dioxus::prelude::*;
use visionary_mask::{DirtyRect, MaskCanvasController, Session, SessionError};

use crate::pointer;
use crate::raster;

/// Props for the [`MaskEditor`] component.
#[derive(Props, Clone, PartialEq)]
pub struct MaskEditorProps {
    /// The editing session that owns the surfaces.
    session: Signal<Session>,
    /// URL of the uploaded image, shown under the canvas.
    source_url: String,
    /// DOM id of the drawing canvas. Must be unique on the page.
    canvas_id: String,
    /// Called when a stroke is rejected.
    on_error: EventHandler<SessionError>,
}

/// Shows the source image (or the result, once there is one) with the
/// display surface drawn over it, and feeds pointer input into the
/// session.
///
/// The canvas backing store has the image's natural size; CSS scales it
/// with the image, and every event is mapped through the canvas's
/// rendered size at that moment.
#[component]
pub fn MaskEditor(props: MaskEditorProps) -> Element {
    let mut session = props.session;
    let on_error = props.on_error;

    let (dimensions, result) = {
        let s = session.read();
        (
            s.controller().surface_dimensions(),
            s.result().map(str::to_owned),
        )
    };

    let down_id = props.canvas_id.clone();
    let move_id = props.canvas_id.clone();

    rsx! {
        div { class: "preview-container",
            if let Some(url) = result {
                img { class: "preview-image", src: "{url}", alt: "Result" }
            } else {
                img {
                    class: "preview-image",
                    src: "{props.source_url}",
                    alt: "Source",
                    draggable: "false",
                }
                if let Some(dims) = dimensions {
                    canvas {
                        id: "{props.canvas_id}",
                        class: "mask-canvas",
                        width: "{dims.width}",
                        height: "{dims.height}",
                        onpointerdown: move |evt: PointerEvent| {
                            evt.prevent_default();
                            let at = evt.client_coordinates();
                            let Some(sample) = pointer::sample_element(&down_id, at.x, at.y) else {
                                return;
                            };
                            let outcome = {
                                let mut s = session.write();
                                s.begin_stroke(sample.point, sample.display).map(|update| {
                                    repaint(&down_id, s.controller(), update.dirty);
                                })
                            };
                            if let Err(e) = outcome {
                                log::debug!("stroke rejected: {e}");
                                on_error.call(e);
                            }
                        },
                        onpointermove: move |evt: PointerEvent| {
                            if !session.peek().controller().is_drawing() {
                                return;
                            }
                            let at = evt.client_coordinates();
                            let Some(sample) = pointer::sample_element(&move_id, at.x, at.y) else {
                                return;
                            };
                            let mut s = session.write();
                            if let Some(update) = s.extend_stroke(sample.point, sample.display) {
                                repaint(&move_id, s.controller(), update.dirty);
                            }
                        },
                        onpointerup: move |_| finish_stroke(session),
                        onpointerleave: move |_| finish_stroke(session),
                        onpointercancel: move |_| finish_stroke(session),
                    }
                }
            }
        }
    }
}

fn finish_stroke(mut session: Signal<Session>) {
    if session.peek().controller().is_drawing() {
        session.write().end_stroke();
    }
}

fn repaint(canvas_id: &str, controller: &MaskCanvasController, rect: DirtyRect) {
    if let Err(e) = raster::blit_region(canvas_id, controller, rect) {
        log::warn!("canvas repaint failed: {e}");
    }
}
