use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, RichText, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub text_on_accent: Color32,
    pub border_subtle: Color32,
    pub user_bubble: Color32,
    pub spacing_4: f32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_8: u8,
    pub radius_12: u8,
    pub button_height: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_1: Color32::from_rgb(0x14, 0x17, 0x1C),
            surface_2: Color32::from_rgb(0x1B, 0x20, 0x27),
            surface_3: Color32::from_rgb(0x25, 0x2C, 0x36),
            accent_primary: Color32::from_rgb(0x2B, 0x9A, 0x8C),
            accent_muted: Color32::from_rgb(0x23, 0x7A, 0x70),
            success: Color32::from_rgb(0x4A, 0xC2, 0x6B),
            warning: Color32::from_rgb(0xE8, 0xA3, 0x3D),
            danger: Color32::from_rgb(0xE5, 0x53, 0x4B),
            text_primary: Color32::from_rgb(0xE4, 0xE8, 0xEE),
            text_muted: Color32::from_rgb(0x8E, 0x98, 0xA4),
            text_on_accent: Color32::from_rgb(0xF5, 0xFF, 0xFD),
            border_subtle: Color32::from_rgba_premultiplied(255, 255, 255, 16),
            user_bubble: Color32::from_rgb(0x1F, 0x3A, 0x45),
            spacing_4: 4.0,
            spacing_8: 8.0,
            spacing_12: 12.0,
            radius_8: 8,
            radius_12: 12,
            button_height: 30.0,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.window_fill = self.surface_1;
        visuals.override_text_color = Some(self.text_primary);
        visuals.extreme_bg_color = self.surface_3;
        for widget in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.open,
        ] {
            widget.bg_fill = self.surface_2;
            widget.weak_bg_fill = self.surface_2;
            widget.bg_stroke = Stroke::NONE;
            widget.fg_stroke.color = self.text_primary;
        }
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.weak_bg_fill = self.surface_3;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.widgets.active.weak_bg_fill = self.accent_muted;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_corner_radius = CornerRadius::same(self.radius_12);

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(17.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }

    pub fn bubble_frame(&self, fill: Color32) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_8))
    }

    pub fn primary_button(&self, label: &str) -> egui::Button<'static> {
        egui::Button::new(RichText::new(label).color(self.text_on_accent).size(13.0))
            .fill(self.accent_primary)
            .stroke(Stroke::NONE)
            .corner_radius(CornerRadius::same(self.radius_8))
            .min_size(egui::vec2(0.0, self.button_height))
    }
}
