use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Konfigurera applikationens utseende
pub fn configure_style(ctx: &egui::Context, dark_mode: bool) {
    let mut style = (*ctx.style()).clone();

    style.text_styles = [
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
    ]
    .into();

    // Formulären är täta, tabellerna luftiga
    style.spacing.item_spacing = egui::vec2(8.0, 5.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);
    style.spacing.interact_size.y = 22.0;
    style.spacing.window_margin = egui::Margin::same(12.0);

    style.visuals = if dark_mode { dark_visuals() } else { light_visuals() };

    ctx.set_style(style);
}

fn dark_visuals() -> Visuals {
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(24, 28, 36);
    visuals.window_fill = Color32::from_rgb(32, 37, 47);
    visuals.extreme_bg_color = Color32::from_rgb(18, 21, 28);
    // Randiga rader i projekt- och milstolpstabeller
    visuals.faint_bg_color = Color32::from_rgb(30, 35, 45);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(40, 48, 62);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(50, 62, 82);
    visuals.widgets.active.bg_fill = Color32::from_rgb(0, 64, 128);
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(48, 56, 70));

    visuals.selection.bg_fill = Color32::from_rgb(0, 84, 160);
    visuals.hyperlink_color = Color32::from_rgb(110, 160, 230);
    visuals.window_rounding = Rounding::same(8.0);

    visuals
}

fn light_visuals() -> Visuals {
    let mut visuals = Visuals::light();

    visuals.panel_fill = Color32::from_rgb(246, 248, 251);
    visuals.window_fill = Color32::WHITE;
    visuals.extreme_bg_color = Color32::from_rgb(235, 240, 246);
    visuals.faint_bg_color = Color32::from_rgb(240, 244, 249);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(226, 232, 240);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(210, 222, 238);
    visuals.widgets.active.bg_fill = Color32::from_rgb(190, 208, 232);
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(214, 222, 232));

    // Samma marinblå som rapporternas rubriker
    visuals.selection.bg_fill = Color32::from_rgb(176, 200, 230);
    visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(0, 51, 102));
    visuals.hyperlink_color = Color32::from_rgb(0, 64, 128);
    visuals.window_rounding = Rounding::same(8.0);

    visuals
}

/// Färgpalett för applikationen
pub struct Colors;

impl Colors {
    // Primär
    pub const PRIMARY: Color32 = Color32::from_rgb(0, 51, 102);
    pub const ACCENT: Color32 = Color32::from_rgb(0, 64, 128);

    // Framgång
    pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);

    // Varning
    pub const WARNING: Color32 = Color32::from_rgb(234, 179, 8);

    // Fel
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);

    // Info
    pub const INFO: Color32 = Color32::from_rgb(59, 130, 246);

    // Text
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(107, 114, 128);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(156, 163, 175);

    // RAG och milstolpsstatus
    pub const GREEN: Color32 = Color32::from_rgb(22, 163, 74);
    pub const AMBER: Color32 = Color32::from_rgb(245, 158, 11);
    pub const RED: Color32 = Color32::from_rgb(220, 38, 38);

    /// Färg från namnen som rapporterna använder (green/orange/red)
    pub fn named(name: &str) -> Color32 {
        match name {
            "green" => Self::GREEN,
            "orange" => Self::AMBER,
            "red" => Self::RED,
            _ => Self::TEXT_SECONDARY,
        }
    }
}

/// Ikoner (Unicode)
pub struct Icons;

impl Icons {
    pub const PROJECT: &'static str = "📁";
    pub const UPDATE: &'static str = "📝";
    pub const MILESTONE: &'static str = "🏁";
    pub const REPORT: &'static str = "📄";
    pub const DASHBOARD: &'static str = "📊";
    pub const USER: &'static str = "👤";
    pub const LOCK: &'static str = "🔒";
    pub const LOGOUT: &'static str = "⏏";
    pub const ADD: &'static str = "➕";
    pub const SAVE: &'static str = "💾";
    pub const CHECK: &'static str = "✓";
    pub const WARNING: &'static str = "⚠";
    pub const CALENDAR: &'static str = "📅";
    pub const EXPORT: &'static str = "📤";
    pub const REFRESH: &'static str = "🔄";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!(Colors::named("green"), Colors::GREEN);
        assert_eq!(Colors::named("orange"), Colors::AMBER);
        assert_eq!(Colors::named("black"), Colors::TEXT_SECONDARY);
    }
}
