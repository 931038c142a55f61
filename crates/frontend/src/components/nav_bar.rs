use dioxus::prelude::*;
use pinmap_shared::i18n::Locale;

#[component]
pub fn NavBar(locale: Locale, on_remove_all: EventHandler<()>) -> Element {
    rsx! {
        header { class: "nav-bar",
            h1 { {locale.text("main_title")} }
            button {
                class: "nav-action",
                onclick: move |_| on_remove_all.call(()),
                {locale.text("navigation_bar_remove_button")}
            }
        }
    }
}
