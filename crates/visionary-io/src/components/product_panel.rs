//! Product studio screen: upload a product photo and restage it as a
//! packshot, with a shadow, or in a described scene.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdBox, LdCamera, LdDownload, LdLayers, LdX};
use visionary_mask::api::RESULT_FILENAME;
use visionary_mask::{
    ApiConfig, LoadTicket, LoadTickets, ProductMode, ProductRequest, ProductSettings, ShadowType,
    SourceImage, Upload,
};

use super::FileUpload;
use crate::download;
use crate::raster::ObjectUrl;

/// Props for the [`ProductPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ProductPanelProps {
    /// Where to send requests.
    api: ApiConfig,
}

fn mode_icon(mode: ProductMode) -> Element {
    match mode {
        ProductMode::Packshot => rsx! { Icon { icon: LdBox, width: 16, height: 16 } },
        ProductMode::Shadow => rsx! { Icon { icon: LdLayers, width: 16, height: 16 } },
        ProductMode::Lifestyle => rsx! { Icon { icon: LdCamera, width: 16, height: 16 } },
    }
}

/// Restage a product photo.
#[allow(clippy::too_many_lines)]
#[component]
pub fn ProductPanel(props: ProductPanelProps) -> Element {
    let mut tickets = use_signal(LoadTickets::default);
    let mut source = use_signal(|| Option::<SourceImage>::None);
    let mut preview_url = use_signal(|| Option::<Rc<ObjectUrl>>::None);
    let mut mode = use_signal(ProductMode::default);
    let mut settings = use_signal(ProductSettings::default);
    let mut result = use_signal(|| Option::<String>::None);
    let mut processing = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    // --- Upload ---
    let on_pick = move |()| {
        if processing() {
            return None;
        }
        error.set(None);
        result.set(None);
        source.set(None);
        preview_url.set(None);
        Some(tickets.write().issue())
    };

    let on_upload = move |(ticket, bytes, name): (LoadTicket, Vec<u8>, String)| {
        if !tickets.read().is_current(ticket) {
            log::debug!("dropping superseded read of {name}");
            return;
        }
        match SourceImage::decode(Upload::new(bytes, name)) {
            Ok(image) => {
                log::info!("loaded {} product image", image.dimensions());
                match ObjectUrl::from_bytes(image.bytes(), image.mime()) {
                    Ok(url) => preview_url.set(Some(Rc::new(url))),
                    Err(e) => error.set(Some(format!("Could not display image: {e}"))),
                }
                source.set(Some(image));
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let on_discard = move |_| {
        tickets.write().invalidate();
        source.set(None);
        preview_url.set(None);
        result.set(None);
        error.set(None);
    };

    // --- Processing ---
    let api = props.api.clone();
    let on_process = move |_| {
        let request = {
            let source = source.read();
            let Some(image) = source.as_ref() else {
                return;
            };
            ProductRequest::new(image, mode(), &settings.read(), api.api_key.as_deref())
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        error.set(None);
        result.set(None);
        processing.set(true);
        let config = api.clone();
        spawn(async move {
            match crate::api::submit(&config, &request).await {
                Ok(located) => {
                    log::info!("{} shot ready: {}", request.mode(), located.url());
                    result.set(Some(located.into_url()));
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            processing.set(false);
        });
    };

    let on_download = move |_| {
        let Some(url) = result() else {
            return;
        };
        spawn(async move {
            if let Err(e) = download::download_remote(&url, RESULT_FILENAME).await {
                log::warn!("result download failed: {e}");
                error.set(Some(format!("Download failed: {e}")));
            }
        });
    };

    // --- Layout ---
    let has_image = source.read().is_some();
    let busy = processing();
    let active = mode();
    let current = settings.read().clone();
    let shown = result().or_else(|| preview_url().map(|url| url.as_str().to_owned()));

    let mode_settings = match active {
        ProductMode::Packshot => rsx! {
            h3 { "Packshot Settings" }
            label { class: "field-label", r#for: "packshot-color", "Background Color" }
            div { class: "color-row",
                input {
                    r#type: "color",
                    value: "{current.background_color}",
                    oninput: move |evt: FormEvent| settings.write().background_color = evt.value(),
                }
                input {
                    id: "packshot-color",
                    class: "text-input",
                    r#type: "text",
                    value: "{current.background_color}",
                    oninput: move |evt: FormEvent| settings.write().background_color = evt.value(),
                }
            }
        },
        ProductMode::Shadow => rsx! {
            h3 { "Shadow Settings" }
            label { class: "field-label", r#for: "shadow-type", "Shadow Type" }
            select {
                id: "shadow-type",
                class: "select",
                onchange: move |evt: FormEvent| {
                    if let Ok(kind) = evt.value().parse::<ShadowType>() {
                        settings.write().shadow_type = kind;
                    }
                },
                for kind in ShadowType::ALL {
                    option {
                        key: "{kind.value()}",
                        value: "{kind.value()}",
                        selected: current.shadow_type == kind,
                        "{kind.label()}"
                    }
                }
            }
        },
        ProductMode::Lifestyle => rsx! {
            h3 { "Lifestyle Shot" }
            p { class: "muted", "Generate a scene for your product." }
            label { class: "field-label", r#for: "scene-description", "Scene Description" }
            textarea {
                id: "scene-description",
                class: "prompt",
                rows: "4",
                placeholder: "Describe the background scene...",
                value: "{current.scene_description}",
                oninput: move |evt: FormEvent| settings.write().scene_description = evt.value(),
            }
        },
    };

    rsx! {
        div { class: "editor",
            header { class: "editor-header",
                h2 { "Product Studio" }
                p { class: "muted", "Professional tools for e-commerce photography." }
            }

            div { class: "layout-grid",
                div { class: "panel preview-panel",
                    if has_image && !busy {
                        button {
                            class: "discard-button",
                            title: "Remove image",
                            onclick: on_discard,
                            Icon { icon: LdX, width: 16, height: 16 }
                        }
                    }
                    if let Some(src) = shown {
                        img { class: "preview-image", src: "{src}", alt: "Product" }
                    } else {
                        p { class: "placeholder", "Upload a product image (JPG or PNG)" }
                    }
                    if busy {
                        p { class: "muted pulse", "Processing..." }
                    }
                }

                div { class: "controls-panel",
                    div { class: "panel mode-toggle",
                        for m in ProductMode::ALL {
                            button {
                                key: "{m.short_name()}",
                                class: if active == m { "button button--primary" } else { "button" },
                                onclick: move |_| mode.set(m),
                                {mode_icon(m)}
                                "{m}"
                            }
                        }
                    }

                    div { class: "panel controls-panel",
                        if let Some(ref message) = error() {
                            div { class: "error-box", "{message}" }
                        }

                        {mode_settings}

                        if result().is_some() {
                            button { class: "button", onclick: on_download,
                                Icon { icon: LdDownload, width: 18, height: 18 }
                                "Download"
                            }
                        }

                        button {
                            class: "button button--primary",
                            disabled: busy || !has_image,
                            onclick: on_process,
                            if busy { "Processing..." } else { "Apply Magic" }
                        }
                    }
                }
            }

            FileUpload { on_pick, on_upload, disabled: busy }
        }
    }
}
