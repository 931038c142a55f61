mod components;
mod coords;
mod location;
mod pages;
mod routing;
mod storage;

use dioxus::prelude::*;

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        pages::map_screen::PinMap {}
    }
}

fn main() {
    dioxus::logger::init(tracing::Level::INFO).ok();
    launch(App);
}
