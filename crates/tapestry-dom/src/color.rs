//! CSS color parsing and formatting.
//!
//! Colors are packed as `0xRRGGBBAA`. Values are tokenized with cssparser,
//! so comments, whitespace and the space-separated `rgb()` syntax parse.

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Convert RGBA u32 (packed as 0xRRGGBBAA) to CSS rgba() string.
pub fn rgba_u32_to_css(color: u32) -> String {
    let r = (color >> 24) & 0xFF;
    let g = (color >> 16) & 0xFF;
    let b = (color >> 8) & 0xFF;
    let a = (color & 0xFF) as f32 / 255.0;
    format!("rgba({}, {}, {}, {})", r, g, b, a)
}

/// Convert RGBA u32 to `#rrggbb`, dropping alpha.
pub fn rgba_u32_to_hex(color: u32) -> String {
    format!("#{:06x}", color >> 8)
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a few named colors.
pub fn parse_color(value: &str) -> Option<u32> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    parser.parse_entirely(|p| color(p)).ok()
}

fn color<'i>(parser: &mut Parser<'i, '_>) -> Result<u32, ParseError<'i, ()>> {
    let location = parser.current_source_location();
    let token = parser.next()?.clone();
    let parsed = match &token {
        Token::Hash(hex) | Token::IDHash(hex) => parse_hex(hex),
        Token::Ident(name) => named_color(&name.to_ascii_lowercase()),
        Token::Function(name) if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") => {
            return parser.parse_nested_block(|p| rgb_arguments(p));
        }
        _ => None,
    };
    parsed.ok_or_else(|| location.new_custom_error(()))
}

enum Channel {
    Number(f32),
    Percent(f32),
}

impl Channel {
    /// Value scaled so that `full` is 100%.
    fn scaled(&self, full: f32) -> f32 {
        match self {
            Channel::Number(value) => *value,
            Channel::Percent(unit) => unit * full,
        }
    }
}

/// Both the comma form and the space form with `/ alpha`.
fn rgb_arguments<'i>(parser: &mut Parser<'i, '_>) -> Result<u32, ParseError<'i, ()>> {
    let location = parser.current_source_location();
    let mut channels = Vec::with_capacity(4);
    while !parser.is_exhausted() {
        let location = parser.current_source_location();
        match parser.next()? {
            Token::Number { value, .. } => channels.push(Channel::Number(*value)),
            Token::Percentage { unit_value, .. } => channels.push(Channel::Percent(*unit_value)),
            Token::Comma | Token::Delim('/') => {}
            _ => return Err(location.new_custom_error(())),
        }
    }
    if channels.len() != 3 && channels.len() != 4 {
        return Err(location.new_custom_error(()));
    }
    let mut rgb = [0u32; 3];
    for (slot, channel) in rgb.iter_mut().zip(&channels) {
        *slot = channel.scaled(255.0).round().clamp(0.0, 255.0) as u32;
    }
    let alpha = match channels.get(3) {
        Some(channel) => (channel.scaled(1.0).clamp(0.0, 1.0) * 255.0).round() as u32,
        None => 0xFF,
    };
    Ok((rgb[0] << 24) | (rgb[1] << 16) | (rgb[2] << 8) | alpha)
}

/// Canonical form of a color value.
///
/// Opaque hex and `rgb()` colors become `#rrggbb`, translucent ones `rgba()`.
/// Anything else (keywords, variables) is trimmed and lowercased.
pub fn normalize_color(value: &str) -> String {
    let trimmed = value.trim();
    let is_functional = trimmed.starts_with('#')
        || trimmed.to_ascii_lowercase().starts_with("rgb");
    match parse_color(trimmed) {
        Some(color) if is_functional && color & 0xFF == 0xFF => rgba_u32_to_hex(color),
        Some(color) if is_functional => rgba_u32_to_css(color),
        _ => trimmed.to_ascii_lowercase(),
    }
}

/// Relative luminance in `0.0..=1.0`, ignoring alpha.
pub fn luminance(color: u32) -> f32 {
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    0.2126 * channel(24) + 0.7152 * channel(16) + 0.0722 * channel(8)
}

fn parse_hex(hex: &str) -> Option<u32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            u32::from_str_radix(&expanded, 16).ok().map(|rgb| (rgb << 8) | 0xFF)
        }
        6 => u32::from_str_radix(hex, 16).ok().map(|rgb| (rgb << 8) | 0xFF),
        8 => u32::from_str_radix(hex, 16).ok(),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<u32> {
    let rgb = match name {
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "green" => 0x008000,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "gray" | "grey" => 0x808080,
        "silver" => 0xc0c0c0,
        "orange" => 0xffa500,
        "purple" => 0x800080,
        "transparent" => return Some(0),
        _ => return None,
    };
    Some((rgb << 8) | 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_css() {
        // Fully opaque red
        assert_eq!(rgba_u32_to_css(0xFF0000FF), "rgba(255, 0, 0, 1)");
        // Fully transparent blue
        assert_eq!(rgba_u32_to_css(0x0000FF00), "rgba(0, 0, 255, 0)");
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse_color("#f00"), Some(0xFF0000FF));
        assert_eq!(parse_color("#00FF00"), Some(0x00FF00FF));
        assert_eq!(parse_color("rgb(0, 0, 255)"), Some(0x0000FFFF));
        assert_eq!(parse_color("rgba(0, 0, 0, 0)"), Some(0x00000000));
        assert_eq!(parse_color("white"), Some(0xFFFFFFFF));
        assert_eq!(parse_color("var(--x)"), None);
        assert_eq!(parse_color("#ggg"), None);
    }

    #[test]
    fn test_parse_space_syntax_and_percentages() {
        assert_eq!(parse_color("rgb(255 0 0 / 50%)"), Some(0xFF000080));
        assert_eq!(parse_color("rgb(100%, 0%, 0%)"), Some(0xFF0000FF));
        assert_eq!(parse_color("/* accent */ #00f"), Some(0x0000FFFF));
        assert_eq!(parse_color("rgb(0, 0)"), None);
        assert_eq!(parse_color("#fff bold"), None);
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("rgb(255, 0, 0)"), "#ff0000");
        assert_eq!(normalize_color("#F00"), "#ff0000");
        assert_eq!(normalize_color(" Red "), "red");
        assert_eq!(normalize_color("rgba(0, 0, 0, 0)"), "rgba(0, 0, 0, 0)");
        assert_eq!(normalize_color("var(--Accent)"), "var(--accent)");
    }

    #[test]
    fn test_luminance_bounds() {
        assert_eq!(luminance(0x000000FF), 0.0);
        assert!((luminance(0xFFFFFFFF) - 1.0).abs() < 1e-6);
    }
}
