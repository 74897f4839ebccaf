use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdEraser, LdImage, LdMenu, LdShoppingBag, LdWand};
use visionary_io::{EditorPanel, GeneratorPanel, ProductPanel};
use visionary_mask::{ApiConfig, EditFeature};

/// Stylesheet embedded into the page at build time.
const STYLE_CSS: &str = include_str!("../assets/style.css");

fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already initialized: {e}").into());
    }
    dioxus::launch(app);
}

/// API settings baked in at build time.
///
/// `VISIONARY_API_URL` selects the backend (default: the `/api`
/// same-origin proxy); `VISIONARY_API_KEY` is forwarded with each
/// request when set.
fn api_config() -> ApiConfig {
    let config = match option_env!("VISIONARY_API_URL") {
        Some(url) => ApiConfig::new(url).unwrap_or_else(|e| {
            log::warn!("ignoring VISIONARY_API_URL: {e}");
            ApiConfig::default()
        }),
        None => ApiConfig::default(),
    };
    config.with_api_key(option_env!("VISIONARY_API_KEY").map(str::to_owned))
}

/// One entry of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    Generate,
    Product,
    Edit(EditFeature),
}

impl Tool {
    /// Sidebar order.
    const ALL: [Self; 4] = [
        Self::Generate,
        Self::Product,
        Self::Edit(EditFeature::GenerativeFill),
        Self::Edit(EditFeature::ObjectEraser),
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Generate => "Generate Image",
            Self::Product => "Product Studio",
            Self::Edit(feature) => feature.title(),
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Product => "product",
            Self::Edit(feature) => feature.short_name(),
        }
    }

    fn icon(self) -> Element {
        match self {
            Self::Generate => rsx! { Icon { icon: LdImage, width: 18, height: 18 } },
            Self::Product => rsx! { Icon { icon: LdShoppingBag, width: 18, height: 18 } },
            Self::Edit(EditFeature::GenerativeFill) => {
                rsx! { Icon { icon: LdWand, width: 18, height: 18 } }
            }
            Self::Edit(EditFeature::ObjectEraser) => {
                rsx! { Icon { icon: LdEraser, width: 18, height: 18 } }
            }
        }
    }
}

/// Root application component.
///
/// A sidebar switches between the tools. Each screen keeps its own state
/// and is rebuilt from scratch when selected. On narrow screens the
/// sidebar is a drawer opened from the header's menu button.
fn app() -> Element {
    let mut active = use_signal(|| Tool::Generate);
    let mut menu_open = use_signal(|| false);
    let api = use_hook(api_config);

    let tool = active();
    let screen = match tool {
        Tool::Generate => rsx! { GeneratorPanel { api: api.clone() } },
        Tool::Product => rsx! { ProductPanel { api: api.clone() } },
        Tool::Edit(feature) => rsx! {
            EditorPanel { key: "{feature.short_name()}", feature, api: api.clone() }
        },
    };

    rsx! {
        style { dangerous_inner_html: STYLE_CSS }

        div { class: "app",
            nav { class: if menu_open() { "sidebar sidebar--open" } else { "sidebar" },
                div { class: "sidebar-header",
                    h1 { class: "brand", "Visionary" }
                    button {
                        class: "button mobile-only",
                        onclick: move |_| menu_open.set(false),
                        "Close"
                    }
                }
                for entry in Tool::ALL {
                    button {
                        key: "{entry.key()}",
                        class: if tool == entry { "nav-item nav-item--active" } else { "nav-item" },
                        onclick: move |_| {
                            active.set(entry);
                            menu_open.set(false);
                        },
                        {entry.icon()}
                        "{entry.label()}"
                    }
                }
            }

            div {
                class: if menu_open() { "backdrop backdrop--visible" } else { "backdrop" },
                onclick: move |_| menu_open.set(false),
            }

            div { class: "main",
                header { class: "mobile-header",
                    button {
                        class: "button button--primary",
                        onclick: move |_| menu_open.set(true),
                        Icon { icon: LdMenu, width: 18, height: 18 }
                        "Menu"
                    }
                    h1 { class: "brand", "Visionary" }
                }

                main { class: "content", key: "{tool.key()}", {screen} }
            }
        }
    }
}
