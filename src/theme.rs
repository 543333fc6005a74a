use ratatui::style::Color;

pub const DEFAULT_THEME: &str = "nord";

#[derive(Clone, Debug)]
pub struct Theme {
    pub name: String,
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
}

struct ThemeDefinition {
    name: &'static str,
    primary: &'static str,
    accent: &'static str,
    highlight: &'static str,
    background: &'static str,
    surface: &'static str,
    text: &'static str,
}

const THEME_PRESETS: &[(&str, ThemeDefinition)] = &[
    (
        "nord",
        ThemeDefinition {
            name: "Nord",
            primary: "#5E81AC",
            accent: "#D08770",
            highlight: "#76B3C5",
            background: "#3B4252",
            surface: "#4C566A",
            text: "#ECEFF4",
        },
    ),
    (
        "linen",
        ThemeDefinition {
            name: "Linen",
            primary: "#A0674B",
            accent: "#F2C14E",
            highlight: "#E8B59A",
            background: "#3D2C26",
            surface: "#5A4036",
            text: "#FBF3E9",
        },
    ),
    (
        "seaside",
        ThemeDefinition {
            name: "Seaside",
            primary: "#2A9D8F",
            accent: "#E9C46A",
            highlight: "#8ECAE6",
            background: "#1D3557",
            surface: "#264E70",
            text: "#F1FAEE",
        },
    ),
];

impl Theme {
    /// Looks up a preset by key; unknown keys get the default preset.
    pub fn from_name(name: &str) -> Self {
        let (key, def) = THEME_PRESETS
            .iter()
            .find(|(key, _)| *key == name)
            .unwrap_or(&THEME_PRESETS[0]);
        tracing::debug!(theme = *key, "theme selected");
        Theme {
            name: def.name.to_string(),
            primary: color_from_hex(def.primary).unwrap_or(Color::Blue),
            accent: color_from_hex(def.accent).unwrap_or(Color::Cyan),
            highlight: color_from_hex(def.highlight).unwrap_or(Color::Cyan),
            background: color_from_hex(def.background).unwrap_or(Color::Black),
            surface: color_from_hex(def.surface).unwrap_or(Color::DarkGray),
            text: color_from_hex(def.text).unwrap_or(Color::White),
        }
    }
}

pub fn color_from_hex(value: &str) -> Option<Color> {
    let normalized = normalize_hex(value)?;
    let r = u8::from_str_radix(&normalized[1..3], 16).ok()?;
    let g = u8::from_str_radix(&normalized[3..5], 16).ok()?;
    let b = u8::from_str_radix(&normalized[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn normalize_hex(value: &str) -> Option<String> {
    let mut cleaned = value.trim().to_string();
    if !cleaned.starts_with('#') {
        cleaned.insert(0, '#');
    }
    if cleaned.len() != 7 || !cleaned.is_ascii() {
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_or_without_hash() {
        assert_eq!(color_from_hex("#5E81AC"), Some(Color::Rgb(0x5E, 0x81, 0xAC)));
        assert_eq!(color_from_hex("ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(color_from_hex("#fff"), None);
        assert_eq!(color_from_hex("#zzzzzz"), None);
    }

    #[test]
    fn unknown_theme_uses_default() {
        assert_eq!(Theme::from_name("missing").name, "Nord");
        assert_eq!(Theme::from_name("linen").name, "Linen");
    }
}
