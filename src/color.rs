use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
            hsl_color(hue)
        })
        .collect()
}

/// Colour for series `index` of a chart.
///
/// Hues step by the golden angle so neighbouring series stay distinct no
/// matter how many there are, and the same index is always the same colour
/// across charts.
pub fn series_color(index: usize) -> Color32 {
    let hue = (210.0 + index as f32 * 137.508) % 360.0;
    hsl_color(hue)
}

fn hsl_color(hue: f32) -> Color32 {
    let hsl = Hsl::new(hue, 0.70, 0.55);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}
