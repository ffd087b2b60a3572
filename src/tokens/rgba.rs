//! RGBA color values parsed from CSS color text
//!
//! Covers what editors need to show a swatch for a token: hex notation,
//! `rgb()`/`rgba()`, `hsl()`/`hsla()` and the CSS named colors. Other color
//! functions have no RGBA value here.

use crate::tokens::color::{ColorSpace, Component, StructuredColor, TokenValue};

/// A color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Rgba {
    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red: red.clamp(0.0, 1.0),
            green: green.clamp(0.0, 1.0),
            blue: blue.clamp(0.0, 1.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    fn from_packed(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0), 1.0)
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex_value: &str) -> Option<Self> {
        let hex_part = hex_value.strip_prefix('#').unwrap_or(hex_value);
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let digit = |index: usize| u8::from_str_radix(&hex_part[index..index + 1].repeat(2), 16).ok();
        let pair = |index: usize| u8::from_str_radix(&hex_part[index..index + 2], 16).ok();
        let (r, g, b, a) = match hex_part.len() {
            3 => (digit(0)?, digit(1)?, digit(2)?, 255),
            4 => (digit(0)?, digit(1)?, digit(2)?, digit(3)?),
            6 => (pair(0)?, pair(2)?, pair(4)?, 255),
            8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
            _ => return None,
        };

        Some(Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    /// Look up a CSS named color, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("transparent") {
            return Some(Self::new(0.0, 0.0, 0.0, 0.0));
        }
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, rgb)| Self::from_packed(*rgb))
    }

    /// Parse CSS color text
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('#') {
            return Self::from_hex(text);
        }

        let Some(open) = text.find('(') else {
            return Self::from_name(text);
        };
        let inner = text[open + 1..].strip_suffix(')')?;
        let (channels, alpha) = split_arguments(inner)?;

        match text[..open].trim().to_ascii_lowercase().as_str() {
            "rgb" | "rgba" => {
                let rgb: Option<Vec<f32>> = channels.iter().map(|c| parse_rgb_channel(c)).collect();
                let rgb = rgb?;
                Some(Self::new(rgb[0], rgb[1], rgb[2], alpha))
            }
            "hsl" | "hsla" => {
                let hue = parse_hue(channels[0])?;
                let saturation = parse_percentage(channels[1])?;
                let lightness = parse_percentage(channels[2])?;
                Some(hsl_to_rgba(hue, saturation, lightness, alpha))
            }
            _ => None,
        }
    }

    /// Color of a token value, when it has one
    pub fn from_token_value(value: &TokenValue) -> Option<Self> {
        match value {
            TokenValue::Color(color) => Self::from_structured(color),
            TokenValue::Literal(text) => Self::parse(text),
        }
    }

    fn from_structured(color: &StructuredColor) -> Option<Self> {
        if color.hex.is_some() {
            return Self::parse(&color.to_css());
        }
        let alpha = color.alpha.unwrap_or(1.0) as f32;
        let numbers: Option<Vec<f32>> = color
            .components
            .iter()
            .take(3)
            .map(|component| match component {
                Component::Number(value) => Some(*value as f32),
                Component::None => Some(0.0),
            })
            .collect();
        let numbers = numbers.filter(|n| n.len() == 3);

        match (&color.color_space, numbers) {
            (ColorSpace::Srgb, Some(c)) => Some(Self::new(c[0], c[1], c[2], alpha)),
            (ColorSpace::Hsl, Some(c)) => Some(hsl_to_rgba(c[0], c[1] / 100.0, c[2] / 100.0, alpha)),
            _ => Self::parse(&color.to_css()),
        }
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not opaque
    pub fn to_hex(&self) -> String {
        let byte = |channel: f32| (channel * 255.0).round() as u8;
        if byte(self.alpha) == 255 {
            format!("#{:02x}{:02x}{:02x}", byte(self.red), byte(self.green), byte(self.blue))
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                byte(self.red),
                byte(self.green),
                byte(self.blue),
                byte(self.alpha)
            )
        }
    }
}

/// Split function arguments into three channels and an alpha value.
///
/// Accepts both `a, b, c[, alpha]` and `a b c[ / alpha]`.
fn split_arguments(inner: &str) -> Option<(Vec<&str>, f32)> {
    let (channels, alpha) = match inner.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (inner, None),
    };

    let mut parts: Vec<&str> = if channels.contains(',') {
        channels.split(',').map(str::trim).collect()
    } else {
        channels.split_whitespace().collect()
    };

    let alpha_text = match (alpha, parts.len()) {
        (Some(alpha), 3) => Some(alpha),
        (None, 4) => parts.pop(),
        (None, 3) => None,
        _ => return None,
    };
    let alpha = match alpha_text {
        Some(text) => parse_alpha(text)?,
        None => 1.0,
    };
    Some((parts, alpha))
}

fn parse_percentage(text: &str) -> Option<f32> {
    let value: f32 = text.strip_suffix('%').unwrap_or(text).trim().parse().ok()?;
    Some(value / 100.0)
}

fn parse_rgb_channel(text: &str) -> Option<f32> {
    if text.ends_with('%') {
        return parse_percentage(text);
    }
    let value: f32 = text.parse().ok()?;
    Some(value / 255.0)
}

fn parse_alpha(text: &str) -> Option<f32> {
    if text.ends_with('%') {
        return parse_percentage(text);
    }
    text.parse().ok()
}

fn parse_hue(text: &str) -> Option<f32> {
    text.strip_suffix("deg").unwrap_or(text).trim().parse().ok()
}

fn hsl_to_rgba(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Rgba {
    let saturation = saturation.clamp(0.0, 1.0);
    let lightness = lightness.clamp(0.0, 1.0);
    let hue = hue.rem_euclid(360.0);

    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = lightness - chroma / 2.0;

    let (r, g, b) = match hue {
        h if h < 60.0 => (chroma, x, 0.0),
        h if h < 120.0 => (x, chroma, 0.0),
        h if h < 180.0 => (0.0, chroma, x),
        h if h < 240.0 => (0.0, x, chroma),
        h if h < 300.0 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    Rgba::new(r + m, g + m, b + m, alpha)
}

/// CSS named colors as packed `0xrrggbb`
pub(crate) const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hex(text: &str) -> String {
        Rgba::parse(text).unwrap().to_hex()
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(hex("#ff8040"), "#ff8040");
        assert_eq!(hex("#F84"), "#ff8844");
        assert_eq!(hex("#ff804080"), "#ff804080");
        assert_eq!(hex("#f848"), "#ff884488");
        assert!(Rgba::parse("#ff").is_none());
        assert!(Rgba::parse("#ggg").is_none());
    }

    #[test]
    fn test_functions() {
        assert_eq!(hex("rgb(255, 128, 64)"), "#ff8040");
        assert_eq!(hex("rgba(255, 0, 0, 0.5)"), "#ff000080");
        assert_eq!(hex("rgb(100% 0% 0% / 50%)"), "#ff000080");
        assert_eq!(hex("hsl(0, 100%, 50%)"), "#ff0000");
        assert_eq!(hex("hsl(120deg 100% 25%)"), "#008000");
        assert!(Rgba::parse("rgb(1, 2)").is_none());
        assert!(Rgba::parse("oklch(0.5 0.1 240)").is_none());
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(hex("RebeccaPurple"), "#663399");
        assert_eq!(hex("transparent"), "#00000000");
        assert!(Rgba::parse("notacolor").is_none());
    }

    #[test]
    fn test_structured_token_values() {
        let srgb = StructuredColor::from_json(&json!({"colorSpace": "srgb", "components": [1, 0.5, 0.2]})).unwrap();
        assert_eq!(Rgba::from_token_value(&TokenValue::Color(srgb)).unwrap().to_hex(), "#ff8033");

        let hsl = StructuredColor::from_json(&json!({"colorSpace": "hsl", "components": [0, 100, 50], "alpha": 0.5}))
            .unwrap();
        assert_eq!(Rgba::from_token_value(&TokenValue::Color(hsl)).unwrap().to_hex(), "#ff000080");

        let lab = StructuredColor::from_json(&json!({"colorSpace": "lab", "components": [50, 20, -30]})).unwrap();
        assert!(Rgba::from_token_value(&TokenValue::Color(lab)).is_none());
    }
}
