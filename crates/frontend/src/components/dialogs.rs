use dioxus::prelude::*;
use pinmap_shared::i18n::Locale;
use pinmap_shared::models::Coordinate;

use crate::coords;

/// Title prompt shown after a long press.
#[component]
pub fn PinPrompt(
    locale: Locale,
    coordinate: Coordinate,
    on_confirm: EventHandler<String>,
    on_cancel: EventHandler<()>,
) -> Element {
    let mut title = use_signal(String::new);
    let position = coords::format_coordinate(coordinate);

    rsx! {
        div {
            class: "dialog-backdrop",
            onclick: move |_| on_cancel.call(()),

            form {
                class: "dialog",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                onsubmit: move |evt: Event<FormData>| {
                    evt.prevent_default();
                    on_confirm.call(title.read().clone());
                },

                h3 { {locale.text("annotation_alert_title")} }
                p { {locale.text("annotation_alert_text")} }
                p { class: "dialog-coordinate", "{position}" }
                input {
                    r#type: "text",
                    autofocus: true,
                    placeholder: locale.text("annotation_alert_placeholder"),
                    value: "{title}",
                    oninput: move |evt: Event<FormData>| title.set(evt.value()),
                }
                div { class: "dialog-actions",
                    button {
                        r#type: "button",
                        class: "secondary",
                        onclick: move |_| on_cancel.call(()),
                        {locale.text("annotation_alert_cancel_action")}
                    }
                    button {
                        r#type: "submit",
                        {locale.text("annotation_alert_ok_action")}
                    }
                }
            }
        }
    }
}

/// "Build a route to this place?"
#[component]
pub fn RouteConfirm(
    locale: Locale,
    title: String,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    rsx! {
        div {
            class: "dialog-backdrop",
            onclick: move |_| on_cancel.call(()),

            div {
                class: "dialog",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h3 { {locale.text("route_alert_title")} }
                p { class: "dialog-place", "{title}" }
                div { class: "dialog-actions",
                    button {
                        class: "secondary",
                        onclick: move |_| on_cancel.call(()),
                        {locale.text("route_alert_no_action")}
                    }
                    button {
                        onclick: move |_| on_confirm.call(()),
                        {locale.text("route_alert_yes_action")}
                    }
                }
            }
        }
    }
}

/// Informational alert for denied location access.
#[component]
pub fn PermissionAlert(locale: Locale, on_dismiss: EventHandler<()>) -> Element {
    rsx! {
        div { class: "dialog-backdrop",
            div { class: "dialog",
                h3 { {locale.text("alert_title")} }
                p { {locale.text("alert_message")} }
                div { class: "dialog-actions",
                    button {
                        onclick: move |_| on_dismiss.call(()),
                        {locale.text("alert_ok_action")}
                    }
                }
            }
        }
    }
}
