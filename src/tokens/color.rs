//! Structured color values and their CSS serialization
//!
//! Token documents may describe a color as an object with a color space, a
//! list of components and an optional alpha. Editors and fallbacks need plain
//! CSS text, so every structured color is serialized once when the token is
//! loaded.

use std::fmt;

use serde_json::Value;

/// Alpha values below this are written with an explicit alpha channel
const OPAQUE_THRESHOLD: f64 = 0.999;

/// Color spaces a structured color may declare
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Hsl,
    Hwb,
    Lab,
    Lch,
    Oklab,
    Oklch,
    DisplayP3,
    A98Rgb,
    ProphotoRgb,
    Rec2020,
    XyzD50,
    XyzD65,
    SrgbLinear,
    /// Any other identifier, written through the generic `color()` form
    Other(String),
}

impl ColorSpace {
    /// Parse a color space identifier, ignoring case
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "srgb" => ColorSpace::Srgb,
            "hsl" => ColorSpace::Hsl,
            "hwb" => ColorSpace::Hwb,
            "lab" => ColorSpace::Lab,
            "lch" => ColorSpace::Lch,
            "oklab" => ColorSpace::Oklab,
            "oklch" => ColorSpace::Oklch,
            "display-p3" => ColorSpace::DisplayP3,
            "a98-rgb" => ColorSpace::A98Rgb,
            "prophoto-rgb" => ColorSpace::ProphotoRgb,
            "rec2020" => ColorSpace::Rec2020,
            "xyz-d50" => ColorSpace::XyzD50,
            "xyz-d65" => ColorSpace::XyzD65,
            "srgb-linear" => ColorSpace::SrgbLinear,
            other => ColorSpace::Other(other.to_string()),
        }
    }

    /// Identifier as written inside CSS `color()`
    pub fn identifier(&self) -> &str {
        match self {
            ColorSpace::Srgb => "srgb",
            ColorSpace::Hsl => "hsl",
            ColorSpace::Hwb => "hwb",
            ColorSpace::Lab => "lab",
            ColorSpace::Lch => "lch",
            ColorSpace::Oklab => "oklab",
            ColorSpace::Oklch => "oklch",
            ColorSpace::DisplayP3 => "display-p3",
            ColorSpace::A98Rgb => "a98-rgb",
            ColorSpace::ProphotoRgb => "prophoto-rgb",
            ColorSpace::Rec2020 => "rec2020",
            ColorSpace::XyzD50 => "xyz-d50",
            ColorSpace::XyzD65 => "xyz-d65",
            ColorSpace::SrgbLinear => "srgb-linear",
            ColorSpace::Other(identifier) => identifier,
        }
    }
}

/// One channel of a structured color
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    Number(f64),
    /// The `none` keyword, a missing channel
    None,
}

impl Component {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Component::Number),
            Value::String(text) if text.trim().eq_ignore_ascii_case("none") => Some(Component::None),
            Value::String(text) => text.trim().parse().ok().map(Component::Number),
            _ => None,
        }
    }

    /// Numeric value, with `none` treated as zero
    fn value(self) -> f64 {
        match self {
            Component::Number(value) => value,
            Component::None => 0.0,
        }
    }
}

/// A color described by space, components and alpha
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredColor {
    pub color_space: ColorSpace,
    pub components: Vec<Component>,
    pub alpha: Option<f64>,
    /// Precomputed hex form; used verbatim when present
    pub hex: Option<String>,
}

impl StructuredColor {
    /// Read a structured color from a `$value` object.
    ///
    /// Returns `None` when the object has no `colorSpace` or `components`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let color_space = object.get("colorSpace")?.as_str()?;
        let components = object
            .get("components")?
            .as_array()?
            .iter()
            .map(Component::from_json)
            .collect::<Option<Vec<_>>>()?;
        let alpha = object.get("alpha").and_then(Value::as_f64);
        let hex = object
            .get("hex")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|hex| !hex.is_empty())
            .map(str::to_string);

        Some(Self {
            color_space: ColorSpace::from_identifier(color_space),
            components,
            alpha,
            hex,
        })
    }

    fn has_alpha(&self) -> bool {
        self.alpha.is_some_and(|alpha| alpha < OPAQUE_THRESHOLD)
    }

    fn alpha_value(&self) -> f64 {
        self.alpha.unwrap_or(1.0)
    }

    /// Serialize to CSS text.
    ///
    /// Yields an empty string when fewer than three components are present.
    pub fn to_css(&self) -> String {
        if let Some(hex) = &self.hex {
            return hex.clone();
        }
        if self.components.len() < 3 {
            return String::new();
        }

        let c: Vec<f64> = self.components.iter().map(|c| c.value()).collect();
        let alpha = self.alpha_value();

        match &self.color_space {
            ColorSpace::Srgb => {
                let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                let (r, g, b) = (channel(c[0]), channel(c[1]), channel(c[2]));
                if self.has_alpha() {
                    format!("rgba({}, {}, {}, {:.2})", r, g, b, alpha)
                } else {
                    format!("#{:02x}{:02x}{:02x}", r, g, b)
                }
            }
            ColorSpace::Hsl => {
                if self.has_alpha() {
                    format!("hsla({:.1}, {:.1}%, {:.1}%, {:.2})", c[0], c[1], c[2], alpha)
                } else {
                    format!("hsl({:.1}, {:.1}%, {:.1}%)", c[0], c[1], c[2])
                }
            }
            ColorSpace::Hwb => {
                self.with_slash_alpha(format!("hwb({:.1} {:.1}% {:.1}%", c[0], c[1], c[2]), alpha)
            }
            ColorSpace::Lab => {
                self.with_slash_alpha(format!("lab({:.1} {:.1} {:.1}", c[0], c[1], c[2]), alpha)
            }
            ColorSpace::Lch => {
                self.with_slash_alpha(format!("lch({:.1} {:.1} {:.1}", c[0], c[1], c[2]), alpha)
            }
            ColorSpace::Oklab => {
                self.with_slash_alpha(format!("oklab({:.2} {:.2} {:.2}", c[0], c[1], c[2]), alpha)
            }
            ColorSpace::Oklch => {
                self.with_slash_alpha(format!("oklch({:.2} {:.2} {:.1}", c[0], c[1], c[2]), alpha)
            }
            other => {
                // Generic form keeps `none` as written
                let channels: Vec<String> = self
                    .components
                    .iter()
                    .map(|component| match component {
                        Component::Number(value) => format!("{:.4}", value),
                        Component::None => "none".to_string(),
                    })
                    .collect();
                self.with_slash_alpha(
                    format!("color({} {}", other.identifier(), channels.join(" ")),
                    alpha,
                )
            }
        }
    }

    fn with_slash_alpha(&self, mut head: String, alpha: f64) -> String {
        if self.has_alpha() {
            head.push_str(&format!(" / {:.2}", alpha));
        }
        head.push(')');
        head
    }
}

/// The resolved value of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Value that is already CSS text
    Literal(String),
    Color(StructuredColor),
}

impl TokenValue {
    /// CSS text for this value
    pub fn to_css(&self) -> String {
        match self {
            TokenValue::Literal(text) => text.clone(),
            TokenValue::Color(color) => color.to_css(),
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}
