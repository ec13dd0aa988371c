use std::collections::BTreeMap;

use palette::{Darken, FromColor, Hsl, IntoColor, Srgb};

/// 8-bit sRGB colour used for region markers.
pub type Color = Srgb<u8>;

/// Nine contrasting colours ("Paired" scheme from colorbrewer2.org).
pub const DEFAULT_PALETTE: [&str; 9] = [
    "rgb(166,206,227)",
    "rgb(31,120,180)",
    "rgb(178,223,138)",
    "rgb(51,160,44)",
    "rgb(251,154,153)",
    "rgb(227,26,28)",
    "rgb(253,191,111)",
    "rgb(255,127,0)",
    "rgb(202,178,214)",
];

/// Colour for regions the scale was not built with.
pub fn fallback_color() -> Color {
    Srgb::new(128, 128, 128)
}

// ---------------------------------------------------------------------------
// Colour parsing / formatting
// ---------------------------------------------------------------------------

/// Parse `rgb(r,g,b)` or a `#rrggbb` hex string.
pub fn parse_rgb(text: &str) -> Option<Color> {
    let text = text.trim();
    if let Some(inner) = text
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = inner
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match channels[..] {
            [r, g, b] => Some(Srgb::new(r, g, b)),
            _ => None,
        };
    }
    text.parse::<Color>().ok()
}

pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// A darker shade of `color`, used for marker outlines.
pub fn darker(color: Color) -> Color {
    let hsl: Hsl = Hsl::from_color(color.into_format::<f32>());
    let rgb: Srgb = hsl.darken(0.3).into_color();
    rgb.into_format::<u8>()
}

/// The built-in palette, parsed.
pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.iter().filter_map(|c| parse_rgb(c)).collect()
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format::<u8>()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ordinal colour scale: region → colour
// ---------------------------------------------------------------------------

/// Assigns palette colours to regions by position, cycling the palette when
/// there are more regions than colours.
#[derive(Debug, Clone)]
pub struct OrdinalColorScale {
    regions: Vec<String>,
    mapping: BTreeMap<String, Color>,
    default_color: Color,
}

impl OrdinalColorScale {
    /// Build the scale. An empty palette falls back to generated hues.
    pub fn new(regions: &[String], palette: &[Color]) -> Self {
        let generated;
        let palette = if palette.is_empty() {
            generated = generate_palette(regions.len());
            &generated[..]
        } else {
            palette
        };

        let mut ordered = Vec::with_capacity(regions.len());
        let mut mapping = BTreeMap::new();
        for region in regions {
            if mapping.contains_key(region) {
                continue;
            }
            let color = palette[ordered.len() % palette.len()];
            mapping.insert(region.clone(), color);
            ordered.push(region.clone());
        }

        OrdinalColorScale {
            regions: ordered,
            mapping,
            default_color: fallback_color(),
        }
    }

    /// Look up the colour for a region; unknown regions get grey.
    pub fn color_for(&self, region: &str) -> Color {
        self.mapping
            .get(region)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (region → colour) in region order.
    pub fn legend_entries(&self) -> Vec<(String, Color)> {
        self.regions
            .iter()
            .map(|region| (region.clone(), self.color_for(region)))
            .collect()
    }
}

/// Closure form of [`OrdinalColorScale`].
pub fn build_ordinal_color_scale(regions: &[String], palette: &[Color]) -> impl Fn(&str) -> Color {
    let scale = OrdinalColorScale::new(regions, palette);
    move |region: &str| scale.color_for(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Region {i}")).collect()
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("rgb(166,206,227)"), Some(Srgb::new(166, 206, 227)));
        assert_eq!(parse_rgb(" rgb( 1, 2, 3 ) "), Some(Srgb::new(1, 2, 3)));
        assert_eq!(parse_rgb("#ff7f00"), Some(Srgb::new(255, 127, 0)));
        assert_eq!(parse_rgb("rgb(1,2)"), None);
        assert_eq!(parse_rgb("rgb(1,2,300)"), None);
        assert_eq!(default_palette().len(), 9);
        assert_eq!(to_hex(Srgb::new(255, 127, 0)), "#ff7f00");
    }

    #[test]
    fn test_palette_cycles() {
        let palette = default_palette();
        let regions = names(11);
        let scale = OrdinalColorScale::new(&regions, &palette);
        assert_eq!(scale.color_for("Region 0"), palette[0]);
        assert_eq!(scale.color_for("Region 8"), palette[8]);
        assert_eq!(scale.color_for("Region 9"), palette[0]);
        assert_eq!(scale.color_for("Region 10"), palette[1]);
        assert_eq!(scale.color_for("Elsewhere"), fallback_color());
        assert_eq!(scale.legend_entries().len(), 11);
        assert_eq!(scale.legend_entries()[0].0, "Region 0");
    }

    #[test]
    fn test_closure_and_empty_palette() {
        let regions = names(3);
        let scale = build_ordinal_color_scale(&regions, &[]);
        let colors: Vec<Color> = regions.iter().map(|r| scale(r)).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
    }

    #[test]
    fn test_darker() {
        let base = Srgb::new(166u8, 206, 227);
        let dark = darker(base);
        assert!(dark.red <= base.red && dark.green <= base.green && dark.blue <= base.blue);
        assert_ne!(dark, base);
    }
}
