//! Text-to-image screen: prompt, enhancement, settings, and a gallery of
//! downloadable results.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdCpu, LdDownload, LdSparkles};
use visionary_mask::api::RESULT_FILENAME;
use visionary_mask::generate::MAX_RESULTS;
use visionary_mask::{
    ApiConfig, AspectRatio, EnhanceRequest, GenerateRequest, GenerateSettings, ImageStyle,
};

use crate::download;

/// Props for the [`GeneratorPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct GeneratorPanelProps {
    /// Where to send requests.
    api: ApiConfig,
}

/// Generate images from a prompt.
#[allow(clippy::too_many_lines)]
#[component]
pub fn GeneratorPanel(props: GeneratorPanelProps) -> Element {
    let mut prompt = use_signal(String::new);
    let mut settings = use_signal(GenerateSettings::default);
    let mut results = use_signal(Vec::<String>::new);
    let mut generating = use_signal(|| false);
    let mut enhancing = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    let enhance_api = props.api.clone();
    let on_enhance = move |_| {
        let request = EnhanceRequest::new(&prompt.read(), enhance_api.api_key.as_deref());
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        error.set(None);
        enhancing.set(true);
        let config = enhance_api.clone();
        spawn(async move {
            match crate::api::enhance(&config, &request).await {
                Ok(better) => prompt.set(better),
                Err(e) => {
                    log::warn!("prompt enhancement failed: {e}");
                    error.set(Some(format!("Enhancement failed: {e}")));
                }
            }
            enhancing.set(false);
        });
    };

    let generate_api = props.api.clone();
    let on_generate = move |_| {
        let request = GenerateRequest::new(
            &prompt.read(),
            &settings.read(),
            generate_api.api_key.as_deref(),
        );
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        error.set(None);
        generating.set(true);
        let config = generate_api.clone();
        spawn(async move {
            match crate::api::generate(&config, &request).await {
                Ok(urls) => {
                    log::info!("generated {} image(s)", urls.len());
                    results.set(urls);
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            generating.set(false);
        });
    };

    let current = *settings.read();
    let blank = prompt.read().trim().is_empty();

    rsx! {
        div { class: "editor",
            header { class: "editor-header",
                h2 { "Generate Images" }
                p { class: "muted", "Turn your text descriptions into stunning visuals." }
            }

            div { class: "layout-grid",
                div { class: "main-column",
                    div { class: "panel",
                        textarea {
                            class: "prompt prompt--large",
                            rows: "6",
                            placeholder: "Describe your imagination...",
                            value: "{prompt}",
                            oninput: move |evt: FormEvent| prompt.set(evt.value()),
                        }
                    }

                    if let Some(ref message) = error() {
                        div { class: "error-box", "{message}" }
                    }

                    if generating() {
                        p { class: "muted pulse", "Generating..." }
                    }

                    div { class: "gallery",
                        for (index, url) in results().into_iter().enumerate() {
                            div { key: "{url}", class: "panel gallery-item",
                                img { src: "{url}", alt: "Result {index + 1}" }
                                button {
                                    class: "gallery-download",
                                    title: "Download",
                                    onclick: move |_| {
                                        let url = url.clone();
                                        spawn(async move {
                                            if let Err(e) = download::download_remote(&url, RESULT_FILENAME).await {
                                                log::warn!("download of {url} failed: {e}");
                                                error.set(Some(format!("Download failed: {e}")));
                                            }
                                        });
                                    },
                                    Icon { icon: LdDownload, width: 16, height: 16 }
                                }
                            }
                        }
                    }
                }

                div { class: "panel controls-panel",
                    h3 { class: "panel-title",
                        Icon { icon: LdCpu, width: 18, height: 18 }
                        "Settings"
                    }

                    span { class: "field-label", "Aspect Ratio" }
                    div { class: "choice-grid",
                        for ratio in AspectRatio::ALL {
                            button {
                                key: "{ratio}",
                                class: if current.aspect_ratio == ratio { "button button--primary" } else { "button" },
                                onclick: move |_| settings.write().aspect_ratio = ratio,
                                "{ratio}"
                            }
                        }
                    }

                    label { class: "field-label", r#for: "generate-style", "Style" }
                    select {
                        id: "generate-style",
                        class: "select",
                        value: "{current.style}",
                        onchange: move |evt: FormEvent| {
                            if let Ok(style) = evt.value().parse::<ImageStyle>() {
                                settings.write().style = style;
                            }
                        },
                        for style in ImageStyle::ALL {
                            option { key: "{style}", value: "{style}", selected: current.style == style, "{style}" }
                        }
                    }

                    label { class: "field-label", r#for: "generate-count",
                        "Number of Images: {current.count()}"
                    }
                    input {
                        id: "generate-count",
                        r#type: "range",
                        min: "1",
                        max: "{MAX_RESULTS}",
                        value: "{current.count()}",
                        oninput: move |evt: FormEvent| {
                            if let Ok(count) = evt.value().parse::<u8>() {
                                settings.write().set_count(count);
                            }
                        },
                    }

                    button {
                        class: "button",
                        disabled: enhancing() || blank,
                        onclick: on_enhance,
                        Icon { icon: LdSparkles, width: 18, height: 18 }
                        if enhancing() { "Enhancing..." } else { "Enhance Prompt" }
                    }
                    button {
                        class: "button button--primary",
                        disabled: generating() || blank,
                        onclick: on_generate,
                        if generating() { "Generating..." } else { "Generate" }
                    }
                }
            }
        }
    }
}
