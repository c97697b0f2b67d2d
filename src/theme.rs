//! Light/Dark palette for the support panel

use egui::Color32;

#[derive(Clone, Copy, PartialEq)]
pub enum ThemeMode {
    Light,
    Dark,
}

#[derive(Clone, Copy)]
pub struct Theme {
    pub window: Color32,
    pub header: Color32,
    pub panel: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub border: Color32,
    pub accent: Color32,
    pub danger: Color32,
    pub overlay: Color32,
}

impl Theme {
    pub const LIGHT: Self = Self {
        window: Color32::from_rgb(0xf5, 0xf5, 0xf5),
        header: Color32::from_rgb(0xff, 0xff, 0xff),
        panel: Color32::from_rgb(0xff, 0xff, 0xff),
        text: Color32::from_rgb(0x24, 0x24, 0x24),
        text_dim: Color32::from_rgb(0x80, 0x80, 0x80),
        border: Color32::from_rgb(0xa8, 0xa8, 0xa8),
        accent: Color32::from_rgb(0x2e, 0x7d, 0x32),
        danger: Color32::from_rgb(0xc6, 0x28, 0x28),
        overlay: Color32::from_rgba_premultiplied(0, 0, 0, 110),
    };

    pub const DARK: Self = Self {
        window: Color32::from_rgb(0x18, 0x18, 0x1b),
        header: Color32::from_rgb(0x12, 0x12, 0x14),
        panel: Color32::from_rgb(0x21, 0x21, 0x25),
        text: Color32::from_rgb(0xe4, 0xe4, 0xe4),
        text_dim: Color32::from_rgb(0x5e, 0x5e, 0x64),
        border: Color32::from_rgb(0x35, 0x35, 0x3a),
        accent: Color32::from_rgb(0x4c, 0xaf, 0x50),
        danger: Color32::from_rgb(0xe5, 0x4b, 0x4b),
        overlay: Color32::from_rgba_premultiplied(0, 0, 0, 150),
    };

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::LIGHT,
            ThemeMode::Dark => Self::DARK,
        }
    }
}

/// Apply theme to egui visuals
pub fn apply_theme(ctx: &egui::Context, theme: &Theme) {
    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = theme.window;
    visuals.window_fill = theme.panel;
    visuals.extreme_bg_color = theme.window;

    visuals.widgets.noninteractive.fg_stroke.color = theme.text;
    visuals.widgets.inactive.fg_stroke.color = theme.text_dim;
    visuals.widgets.active.fg_stroke.color = theme.text;
    visuals.widgets.hovered.fg_stroke.color = theme.text;

    visuals.widgets.noninteractive.bg_fill = theme.panel;
    visuals.widgets.inactive.bg_fill = theme.panel;

    visuals.hyperlink_color = theme.accent;
    visuals.selection.bg_fill = theme.accent;

    ctx.set_visuals(visuals);
}
