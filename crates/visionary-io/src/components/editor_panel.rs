//! One feature screen: upload, mask editor, brush and prompt controls,
//! and result actions.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{
    LdDownload, LdEraser, LdRotateCcw, LdTrash2, LdWand, LdX,
};
use gloo_timers::future::TimeoutFuture;
use visionary_mask::api::RESULT_FILENAME;
use visionary_mask::config::{DEFAULT_BRUSH_WIDTH, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
use visionary_mask::{
    ApiConfig, EditFeature, ErrorKind, LoadTicket, Session, SessionError, SessionState, Upload,
};

use super::{FileUpload, MaskEditor};
use crate::download;
use crate::raster::{self, ObjectUrl};

/// How long a "please wait" style notice stays visible.
const NOTICE_MS: u32 = 3_000;

/// Placeholder of the prompt field.
const PROMPT_PLACEHOLDER: &str = "What should fill the masked area?";

/// Props for the [`EditorPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct EditorPanelProps {
    /// Which edit this screen performs.
    feature: EditFeature,
    /// Where to send requests.
    api: ApiConfig,
}

/// A complete editing screen for one [`EditFeature`].
///
/// Owns its own [`Session`]; mounting a different feature starts from
/// scratch.
#[allow(clippy::too_many_lines)]
#[component]
pub fn EditorPanel(props: EditorPanelProps) -> Element {
    let feature = props.feature;
    let mut session = use_signal(|| Session::new(feature));
    let mut source_url = use_signal(|| Option::<Rc<ObjectUrl>>::None);
    let mut brush = use_signal(|| DEFAULT_BRUSH_WIDTH);
    let mut notice = use_signal(|| Option::<String>::None);
    let mut notice_generation = use_signal(|| 0u64);
    let mut error = use_signal(|| Option::<String>::None);
    let canvas_id = format!("mask-canvas-{}", feature.short_name());

    // Transient notice; a newer notice cancels the older one's timer.
    let mut show_notice = move |message: String| {
        notice_generation += 1;
        let mine = *notice_generation.peek();
        notice.set(Some(message));
        spawn(async move {
            TimeoutFuture::new(NOTICE_MS).await;
            if *notice_generation.peek() == mine {
                notice.set(None);
            }
        });
    };

    let mut report = move |e: SessionError| match e.kind() {
        ErrorKind::Input | ErrorKind::Readiness => show_notice(e.to_string()),
        ErrorKind::Transport | ErrorKind::Decode => error.set(Some(e.to_string())),
    };

    // --- Upload ---
    let on_pick = move |()| {
        error.set(None);
        let ticket = session.write().begin_load();
        match ticket {
            Ok(ticket) => {
                source_url.set(None);
                Some(ticket)
            }
            Err(e) => {
                report(e);
                None
            }
        }
    };

    let on_upload = move |(ticket, bytes, name): (LoadTicket, Vec<u8>, String)| {
        let loaded = session.write().finish_load(ticket, Upload::new(bytes, name));
        match loaded {
            Ok(dimensions) => log::info!("loaded {dimensions} image for {feature}"),
            Err(SessionError::StaleLoad) => {
                log::debug!("dropping superseded read of {feature} image");
                return;
            }
            Err(e) => {
                report(e);
                return;
            }
        }
        let url = session
            .read()
            .controller()
            .source()
            .map(|s| ObjectUrl::from_bytes(s.bytes(), s.mime()));
        match url {
            Some(Ok(url)) => source_url.set(Some(Rc::new(url))),
            Some(Err(e)) => error.set(Some(format!("Could not display image: {e}"))),
            None => {}
        }
    };

    // --- Mask controls ---
    let on_brush = move |evt: FormEvent| {
        if let Ok(px) = evt.value().parse::<f32>() {
            let applied = session.write().set_brush_width(px);
            brush.set(applied);
        }
    };

    let clear_id = canvas_id.clone();
    let on_clear = move |_| {
        let cleared = session.write().clear_mask();
        match cleared {
            Ok(()) => {
                if let Err(e) = raster::blit_all(&clear_id, session.read().controller()) {
                    log::warn!("canvas repaint failed: {e}");
                }
            }
            Err(e) => report(e),
        }
    };

    let on_prompt = move |evt: FormEvent| {
        session.write().set_prompt(evt.value());
    };

    // --- Submission ---
    let api = props.api.clone();
    let on_submit = move |_| {
        error.set(None);
        let request = session.write().begin_submit(api.api_key.as_deref());
        match request {
            Ok(request) => {
                let config = api.clone();
                spawn(async move {
                    let outcome = crate::api::submit(&config, &request).await;
                    let finished = session.write().finish_submit(outcome).map(str::to_owned);
                    match finished {
                        Ok(url) => log::info!("{feature} result ready: {url}"),
                        Err(e) => report(e),
                    }
                });
            }
            Err(e) => report(e),
        }
    };

    // Dropping the Rc revokes the object URL once the editor unmounts.
    let on_discard = move |_| {
        let discarded = session.write().reset();
        match discarded {
            Ok(()) => {
                source_url.set(None);
                error.set(None);
            }
            Err(e) => report(e),
        }
    };

    // --- Result actions ---
    let on_download = move |_| {
        let Some(url) = session.read().result().map(str::to_owned) else {
            return;
        };
        spawn(async move {
            if let Err(e) = download::download_remote(&url, RESULT_FILENAME).await {
                log::warn!("result download failed: {e}");
                error.set(Some(format!("Download failed: {e}")));
            }
        });
    };

    let on_edit_again = move |_| {
        error.set(None);
        let again = session.write().edit_again();
        if let Err(e) = again {
            report(e);
        }
    };

    // --- Layout ---
    let (state, has_image, has_result, loading, prompt) = {
        let s = session.read();
        (
            s.state(),
            s.controller().source().is_some(),
            s.result().is_some(),
            s.is_loading(),
            s.prompt().to_owned(),
        )
    };
    let action_icon = match feature {
        EditFeature::GenerativeFill => rsx! { Icon { icon: LdWand, width: 18, height: 18 } },
        EditFeature::ObjectEraser => rsx! { Icon { icon: LdEraser, width: 18, height: 18 } },
    };

    rsx! {
        div { class: "editor",
            header { class: "editor-header",
                h2 { "{feature.title()}" }
                p { class: "muted", "{feature.tagline()}" }
            }

            div { class: "layout-grid",
                div { class: "panel preview-panel",
                    if has_image && !loading {
                        button {
                            class: "discard-button",
                            title: "Remove image",
                            onclick: on_discard,
                            Icon { icon: LdX, width: 16, height: 16 }
                        }
                    }
                    if let Some(url) = source_url() {
                        MaskEditor {
                            session,
                            source_url: url.as_str().to_owned(),
                            canvas_id: canvas_id.clone(),
                            on_error: report,
                        }
                    } else if state == SessionState::Loading {
                        p { class: "muted pulse", "Loading image..." }
                    } else {
                        p { class: "placeholder", "Upload an image to get started" }
                    }
                }

                div { class: "panel controls-panel",
                    if let Some(ref message) = notice() {
                        div { class: "notice", "{message}" }
                    }
                    if let Some(ref message) = error() {
                        div { class: "error-box", "{message}" }
                    }

                    if has_result {
                        button { class: "button button--primary", onclick: on_download,
                            Icon { icon: LdDownload, width: 18, height: 18 }
                            "Download"
                        }
                        button { class: "button", onclick: on_edit_again,
                            Icon { icon: LdRotateCcw, width: 18, height: 18 }
                            "Edit Again"
                        }
                    } else {
                        label { class: "field-label", r#for: "brush-{feature.short_name()}",
                            "Brush Size: {brush}px"
                        }
                        input {
                            id: "brush-{feature.short_name()}",
                            r#type: "range",
                            min: "{MIN_BRUSH_WIDTH}",
                            max: "{MAX_BRUSH_WIDTH}",
                            value: "{brush}",
                            disabled: !has_image || loading,
                            oninput: on_brush,
                        }

                        button {
                            class: "button",
                            disabled: !has_image || loading,
                            onclick: on_clear,
                            Icon { icon: LdTrash2, width: 18, height: 18 }
                            "Clear Mask"
                        }

                        if feature.requires_prompt() {
                            textarea {
                                class: "prompt",
                                rows: "3",
                                placeholder: PROMPT_PLACEHOLDER,
                                value: "{prompt}",
                                disabled: loading,
                                oninput: on_prompt,
                            }
                        }

                        button {
                            class: "button button--primary",
                            disabled: loading || !has_image,
                            onclick: on_submit,
                            {action_icon}
                            if loading { "{feature.busy_label()}" } else { "{feature.action_label()}" }
                        }
                    }
                }
            }

            FileUpload { on_pick, on_upload, disabled: loading }
        }
    }
}
