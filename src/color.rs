use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Fixed categorical palettes
// ---------------------------------------------------------------------------

/// ColorBrewer "Set2", used for the genre stacks.
pub const SET2: [Color32; 8] = [
    Color32::from_rgb(0x66, 0xc2, 0xa5),
    Color32::from_rgb(0xfc, 0x8d, 0x62),
    Color32::from_rgb(0x8d, 0xa0, 0xcb),
    Color32::from_rgb(0xe7, 0x8a, 0xc3),
    Color32::from_rgb(0xa6, 0xd8, 0x54),
    Color32::from_rgb(0xff, 0xd9, 0x2f),
    Color32::from_rgb(0xe5, 0xc4, 0x94),
    Color32::from_rgb(0xb3, 0xb3, 0xb3),
];

/// d3 "Category20c", used for the PEGI wedges.
pub const CATEGORY20C: [Color32; 20] = [
    Color32::from_rgb(0x31, 0x82, 0xbd),
    Color32::from_rgb(0x6b, 0xae, 0xd6),
    Color32::from_rgb(0x9e, 0xca, 0xe1),
    Color32::from_rgb(0xc6, 0xdb, 0xef),
    Color32::from_rgb(0xe6, 0x55, 0x0d),
    Color32::from_rgb(0xfd, 0x8d, 0x3c),
    Color32::from_rgb(0xfd, 0xae, 0x6b),
    Color32::from_rgb(0xfd, 0xd0, 0xa2),
    Color32::from_rgb(0x31, 0xa3, 0x54),
    Color32::from_rgb(0x74, 0xc4, 0x76),
    Color32::from_rgb(0xa1, 0xd9, 0x9b),
    Color32::from_rgb(0xc7, 0xe9, 0xc0),
    Color32::from_rgb(0x75, 0x6b, 0xb1),
    Color32::from_rgb(0x9e, 0x9a, 0xc8),
    Color32::from_rgb(0xbc, 0xbd, 0xdc),
    Color32::from_rgb(0xda, 0xda, 0xeb),
    Color32::from_rgb(0x63, 0x63, 0x63),
    Color32::from_rgb(0x96, 0x96, 0x96),
    Color32::from_rgb(0xbd, 0xbd, 0xbd),
    Color32::from_rgb(0xd9, 0xd9, 0xd9),
];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Scale the HSL lightness of `rgb` (components in `0..=1`) by `amount`,
/// clamped to `0..=1`.
pub fn adjust_lightness(rgb: [f32; 3], amount: f32) -> Color32 {
    let mut hsl: Hsl = Srgb::new(rgb[0], rgb[1], rgb[2]).into_color();
    hsl.lightness = (amount * hsl.lightness).clamp(0.0, 1.0);
    let out: Srgb = hsl.into_color();
    to_color32(out)
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: series name → Color32
// ---------------------------------------------------------------------------

/// Assigns colours to series names by position. The fixed palette is used
/// when it is long enough, generated hues otherwise.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: Vec<(String, Color32)>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<S: AsRef<str>>(names: &[S], palette: &[Color32]) -> Self {
        let colors = if names.len() <= palette.len() {
            palette.to_vec()
        } else {
            generate_palette(names.len())
        };
        let mapping = names
            .iter()
            .zip(colors)
            .map(|(name, c)| (name.as_ref().to_string(), c))
            .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, name: &str) -> Color32 {
        self.mapping
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
            .unwrap_or(self.default_color)
    }
}
