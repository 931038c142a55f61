//! User-visible strings, English and Russian.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    English,
    Russian,
}

impl Locale {
    /// Pick a locale from a BCP 47 tag such as `ru-RU` or `en-GB`.
    pub fn from_language_tag(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
        match primary.as_str() {
            "ru" => Locale::Russian,
            _ => Locale::English,
        }
    }

    /// Localized text for `key`; unknown keys come back unchanged.
    pub fn text<'a>(self, key: &'a str) -> &'a str {
        match (self, key) {
            (Locale::English, "main_title") => "Maps and Stuff",
            (Locale::Russian, "main_title") => "Карты и всякое",
            (Locale::English, "navigation_bar_remove_button") => "Remove all",
            (Locale::Russian, "navigation_bar_remove_button") => "Удалить все",
            (Locale::English, "annotation_alert_title") => "New pin",
            (Locale::Russian, "annotation_alert_title") => "Новая метка",
            (Locale::English, "annotation_alert_text") => "Give this place a name",
            (Locale::Russian, "annotation_alert_text") => "Дайте этому месту название",
            (Locale::English, "annotation_alert_placeholder") => "Name",
            (Locale::Russian, "annotation_alert_placeholder") => "Название",
            (Locale::English, "annotation_alert_cancel_action") => "Cancel",
            (Locale::Russian, "annotation_alert_cancel_action") => "Отмена",
            (Locale::English, "annotation_alert_ok_action") => "Add",
            (Locale::Russian, "annotation_alert_ok_action") => "Добавить",
            (Locale::English, "alert_title") => "No access to your location",
            (Locale::Russian, "alert_title") => "Нет доступа к геопозиции",
            (Locale::English, "alert_message") => {
                "Allow location access in your browser settings to see yourself on the map and build routes."
            }
            (Locale::Russian, "alert_message") => {
                "Разрешите доступ к геопозиции в настройках браузера, чтобы видеть себя на карте и строить маршруты."
            }
            (_, "alert_ok_action") => "OK",
            (Locale::English, "route_alert_title") => "Build a route to this place?",
            (Locale::Russian, "route_alert_title") => "Построить маршрут до этого места?",
            (Locale::English, "route_alert_no_action") => "No",
            (Locale::Russian, "route_alert_no_action") => "Нет",
            (Locale::English, "route_alert_yes_action") => "Yes",
            (Locale::Russian, "route_alert_yes_action") => "Да",
            _ => key,
        }
    }

    /// "3 pins" / "3 метки".
    pub fn pins_count(self, count: usize) -> String {
        match self {
            Locale::English => {
                if count == 1 {
                    "1 pin".to_string()
                } else {
                    format!("{count} pins")
                }
            }
            Locale::Russian => {
                let word = match (count % 10, count % 100) {
                    (1, n) if n != 11 => "метка",
                    (2..=4, n) if !(12..=14).contains(&n) => "метки",
                    _ => "меток",
                };
                format!("{count} {word}")
            }
        }
    }
}
