//! Dark mode color mapping.

use tapestry_dom::{parse_color, rgba_u32_to_css, rgba_u32_to_hex};

/// Maps colors between their light-mode originals and what is shown in dark
/// mode.
///
/// Light-mode values are the source of truth in the model. Rendering in dark
/// mode writes `to_dark(color)` and keeps the original in `data-ogsc` /
/// `data-ogsb` so parsing can recover it.
pub trait DarkColorHandler {
    fn to_dark(&self, light: &str) -> String;
    fn to_light(&self, dark: &str) -> String;
}

/// Flips HSL lightness, leaving hue and saturation alone.
///
/// The mapping is its own inverse, so `to_light` and `to_dark` agree. Values
/// that do not parse as colors pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuminanceDarkColorHandler;

impl DarkColorHandler for LuminanceDarkColorHandler {
    fn to_dark(&self, light: &str) -> String {
        invert_lightness(light)
    }

    fn to_light(&self, dark: &str) -> String {
        invert_lightness(dark)
    }
}

fn invert_lightness(value: &str) -> String {
    let Some(color) = parse_color(value).filter(|color| color & 0xFF != 0) else {
        return value.trim().to_ascii_lowercase();
    };
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    let (h, s, l) = rgb_to_hsl(channel(24), channel(16), channel(8));
    let (r, g, b) = hsl_to_rgb(h, s, 1.0 - l);
    let pack = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u32;
    let alpha = color & 0xFF;
    let inverted = (pack(r) << 24) | (pack(g) << 16) | (pack(b) << 8) | alpha;
    if alpha == 0xFF {
        rgba_u32_to_hex(inverted)
    } else {
        rgba_u32_to_css(inverted)
    }
}

fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;
    if delta == 0.0 {
        return (0.0, 0.0, l);
    }
    let s = delta / (1.0 - (2.0 * l - 1.0).abs());
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    (h * 60.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_and_white_swap() {
        let handler = LuminanceDarkColorHandler;
        assert_eq!(handler.to_dark("#000000"), "#ffffff");
        assert_eq!(handler.to_dark("white"), "#000000");
        assert_eq!(handler.to_light("#ffffff"), "#000000");
    }

    #[test]
    fn test_saturated_color_roundtrips() {
        let handler = LuminanceDarkColorHandler;
        let dark = handler.to_dark("#ff0000");
        // Pure red sits at 50% lightness.
        assert_eq!(dark, "#ff0000");
        let dark = handler.to_dark("#336699");
        assert_ne!(dark, "#336699");
        assert_eq!(handler.to_light(&dark), "#336699");
    }

    #[test]
    fn test_unknown_values_pass_through() {
        let handler = LuminanceDarkColorHandler;
        assert_eq!(handler.to_dark("var(--accent)"), "var(--accent)");
        assert_eq!(handler.to_dark("transparent"), "transparent");
    }
}
