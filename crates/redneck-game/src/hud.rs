//! Race HUD: truck meters, race position, buttons and the info overlay
//!
//! Everything here is placed relative to the screen centre and follows the
//! camera.

use std::sync::Arc;

use redneck_engine::render::QuadDraw;
use redneck_engine::{Color, Point, Quad, Rectangle, RenderBackend};

use crate::library::{ButtonType, GameLibrary};
use crate::truck::{TruckParameters, DEFAULT_ARMOR, DEFAULT_DEFENSE, MAX_RAGE};
use crate::Result;

pub const HUD_Z_ORDER: i32 = 100;

const SCREEN_LEFT: f32 = -240.0;
const SCREEN_TOP: f32 = 400.0;
const SCREEN_BOTTOM: f32 = -400.0;
const SCREEN_RIGHT_PAD: f32 = 230.0;
const SCREEN_TOP_PAD: f32 = 390.0;

const TEXT_SIZE: f32 = 20.0;
const LINE_SPACING: f32 = 20.0;
/// Overlay darkness once the finish text shows
pub const OVERLAY_MAX_ALPHA: f32 = 0.7;
const OVERLAY_SHADE: f32 = 0.1;

/// Screen-relative point to world coordinates
fn on_screen(screen: &Rectangle, p: Point) -> Point {
    screen.center() + p
}

// ---------------------------------------------------------------------------
// Meters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
    max: f32,
    width: f32,
    height: f32,
    color: Color,
    /// Bottom-left corner
    origin: Point,
}

impl Meter {
    pub fn defense() -> Self {
        Self::new(DEFAULT_DEFENSE, 30.0, Color::rgba(1.0, 0.7, 0.0, 0.6), Point::new(SCREEN_LEFT + 5.0, SCREEN_TOP - 40.0))
    }

    /// Drawn over the defense bar
    pub fn armor() -> Self {
        Self::new(DEFAULT_ARMOR, 30.0, Color::rgba(1.0, 0.0, 0.0, 0.5), Point::new(SCREEN_LEFT + 5.0, SCREEN_TOP - 40.0))
    }

    pub fn rage() -> Self {
        Self::new(MAX_RAGE, 20.0, Color::rgba(0.0, 0.7, 1.0, 0.5), Point::new(SCREEN_LEFT + 5.0, SCREEN_TOP - 75.0))
    }

    fn new(max: f32, height: f32, color: Color, origin: Point) -> Self {
        Self { max, width: 200.0, height, color, origin }
    }

    /// Bar length for `value`; values past the ends pin the bar
    pub fn fill_width(&self, value: f32) -> f32 {
        value.clamp(0.0, self.max) * self.width / self.max
    }

    pub fn draw(&self, value: f32, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        let at = on_screen(screen, self.origin);
        let rect = Rectangle::new(at.x, at.x + self.fill_width(value), at.y + self.height, at.y);
        backend.fill_rect(rect, self.color);
    }
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HudButton {
    pub kind: ButtonType,
    quad: Arc<Quad>,
    /// Screen-relative centre
    center: Point,
}

impl HudButton {
    fn new(library: &GameLibrary, kind: ButtonType, center: impl FnOnce(&Quad) -> Point) -> Result<Self> {
        let quad = library.button(kind)?;
        let center = center(&quad);
        Ok(Self { kind, quad, center })
    }

    pub fn rect(&self) -> Rectangle {
        Rectangle::make_centered_on(self.center, self.quad.size)
    }

    /// Hit test with a screen-relative point
    pub fn contains(&self, p: Point) -> bool {
        self.rect().contains(p)
    }

    fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        backend.draw_quad(&QuadDraw {
            quad: self.quad.clone(),
            center: on_screen(screen, self.center),
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            scale_x: 1.0,
            scale_y: 1.0,
            z_order: HUD_Z_ORDER,
        });
    }
}

// ---------------------------------------------------------------------------
// Info overlay
// ---------------------------------------------------------------------------

/// Shaded full-screen panel with a few lines of text and, at the end of a
/// race, some buttons
#[derive(Debug, Clone)]
pub struct Overlay {
    pub alpha: f32,
    pub lines: Vec<String>,
    first_line_y: f32,
    shown_time: f32,
    pub buttons: Vec<HudButton>,
}

impl Overlay {
    pub fn new(line_count: usize, first_line_y: f32) -> Self {
        Self {
            alpha: 0.2,
            lines: vec![String::new(); line_count],
            first_line_y,
            shown_time: 0.0,
            buttons: Vec::new(),
        }
    }

    pub fn shown_time(&self) -> f32 {
        self.shown_time
    }

    /// Pre-race countdown: fades out over two seconds
    pub fn fade_out(&mut self, dt: f32) {
        self.shown_time += dt;
        self.alpha = (1.0 - self.shown_time / 2.0).max(0.0);
        if self.shown_time < 3.0 {
            if let Some(first) = self.lines.first_mut() {
                *first = "READY!".to_string();
            }
        }
    }

    /// End-of-race panel: darkens over time. Returns true exactly once,
    /// when the panel is dark enough for its text.
    pub fn fade_in(&mut self, dt: f32) -> bool {
        self.shown_time += dt;
        let alpha = self.shown_time / 2.0;
        if alpha < OVERLAY_MAX_ALPHA {
            self.alpha = alpha;
            false
        } else if self.lines.first().is_some_and(String::is_empty) {
            self.alpha = OVERLAY_MAX_ALPHA;
            true
        } else {
            false
        }
    }

    pub fn set_line(&mut self, index: usize, text: impl Into<String>) {
        if let Some(line) = self.lines.get_mut(index) {
            *line = text.into();
        }
    }

    fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        let shade = screen.translated(-2.0, -2.0);
        let shade = Rectangle::new(shade.left, shade.right + 4.0, shade.top + 4.0, shade.bottom);
        backend.fill_rect(shade, Color::rgba(OVERLAY_SHADE, OVERLAY_SHADE, OVERLAY_SHADE, self.alpha));
        let mut y = self.first_line_y;
        for line in &self.lines {
            if !line.is_empty() {
                backend.draw_text(line, on_screen(screen, Point::new(0.0, y)), TEXT_SIZE, Color::WHITE);
            }
            y -= LINE_SPACING;
        }
        for button in &self.buttons {
            button.draw(screen, backend);
        }
    }
}

// ---------------------------------------------------------------------------
// HUD
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Hud {
    defense: Meter,
    armor: Meter,
    rage: Meter,
    menu: HudButton,
    back_to_menu: HudButton,
    feedback: Vec<HudButton>,
    pub overlay: Option<Overlay>,
}

impl Hud {
    pub fn new(library: &GameLibrary) -> Result<Self> {
        let menu = HudButton::new(library, ButtonType::Menu, |q| {
            Point::new(SCREEN_RIGHT_PAD - q.size.width / 2.0, SCREEN_TOP_PAD - q.size.height / 2.0)
        })?;
        let menu_height = menu.quad.size.height;
        let back_to_menu = HudButton::new(library, ButtonType::BackToMenu, |q| {
            Point::new(0.0, SCREEN_BOTTOM + menu_height / 2.0 + q.size.height / 2.0 + 300.0)
        })?;

        let rate_it = HudButton::new(library, ButtonType::RateIt, |_| Point::new(0.0, SCREEN_TOP - 300.0))?;
        let later = Self::stacked_below(library, ButtonType::Later, &rate_it)?;
        let never = Self::stacked_below(library, ButtonType::Never, &later)?;

        Ok(Self {
            defense: Meter::defense(),
            armor: Meter::armor(),
            rage: Meter::rage(),
            menu,
            back_to_menu,
            feedback: vec![rate_it, later, never],
            overlay: None,
        })
    }

    fn stacked_below(library: &GameLibrary, kind: ButtonType, above: &HudButton) -> Result<HudButton> {
        let bottom = above.rect().bottom;
        HudButton::new(library, kind, |q| Point::new(0.0, bottom - q.size.height - 20.0))
    }

    pub fn show_overlay(&mut self, line_count: usize, first_line_y: f32) -> &mut Overlay {
        self.overlay.insert(Overlay::new(line_count, first_line_y))
    }

    pub fn hide_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn add_finish_buttons(&mut self) {
        if let Some(overlay) = &mut self.overlay {
            overlay.buttons.push(self.back_to_menu.clone());
        }
    }

    pub fn add_feedback_buttons(&mut self) {
        if let Some(overlay) = &mut self.overlay {
            overlay.buttons.extend(self.feedback.iter().cloned());
        }
    }

    /// Topmost button under a screen-relative point
    pub fn button_at(&self, p: Point) -> Option<ButtonType> {
        let overlay_buttons = self.overlay.iter().flat_map(|o| o.buttons.iter());
        overlay_buttons
            .chain(std::iter::once(&self.menu))
            .find(|b| b.contains(p))
            .map(|b| b.kind)
    }

    /// Buttons the player can press right now
    pub fn active_buttons(&self) -> Vec<ButtonType> {
        let mut buttons = vec![self.menu.kind];
        if let Some(overlay) = &self.overlay {
            buttons.extend(overlay.buttons.iter().map(|b| b.kind));
        }
        buttons
    }

    pub fn draw(&self, screen: &Rectangle, player: &TruckParameters, position_label: &str, backend: &mut dyn RenderBackend) {
        self.defense.draw(player.defense, screen, backend);
        self.armor.draw(player.armor, screen, backend);
        self.rage.draw(player.rage, screen, backend);
        backend.draw_text("armor/health", on_screen(screen, Point::new(SCREEN_LEFT + 102.0, SCREEN_TOP - 22.0)), TEXT_SIZE, Color::WHITE);
        backend.draw_text("rage", on_screen(screen, Point::new(SCREEN_LEFT + 102.0, SCREEN_TOP - 62.0)), TEXT_SIZE, Color::WHITE);
        backend.draw_text(position_label, on_screen(screen, Point::new(SCREEN_RIGHT_PAD - 60.0, SCREEN_BOTTOM + 660.0)), TEXT_SIZE, Color::WHITE);
        self.menu.draw(screen, backend);
        if let Some(overlay) = &self.overlay {
            overlay.draw(screen, backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redneck_engine::RecordingBackend;

    #[test]
    fn meters_pin_at_both_ends() {
        let defense = Meter::defense();
        assert_eq!(defense.fill_width(2000.0), 200.0);
        assert_eq!(defense.fill_width(-5.0), 0.0);
        assert_eq!(Meter::rage().fill_width(50.0), 100.0);
    }

    #[test]
    fn start_overlay_fades_out() {
        let mut overlay = Overlay::new(1, 0.0);
        overlay.fade_out(0.0);
        assert_eq!(overlay.alpha, 1.0);
        assert_eq!(overlay.lines[0], "READY!");
        overlay.fade_out(1.0);
        assert!((overlay.alpha - 0.5).abs() < 1e-6);
        overlay.fade_out(1.5);
        assert_eq!(overlay.alpha, 0.0);
    }

    #[test]
    fn finish_overlay_asks_for_text_once() {
        let mut overlay = Overlay::new(3, 200.0);
        assert!(!overlay.fade_in(1.0));
        assert!((overlay.alpha - 0.5).abs() < 1e-6);
        assert!(overlay.fade_in(0.5));
        assert_eq!(overlay.alpha, OVERLAY_MAX_ALPHA);
        overlay.set_line(0, "YOU WIN!");
        assert!(!overlay.fade_in(0.5));
    }

    #[test]
    fn feedback_buttons_stack_downwards() {
        let library = GameLibrary::load_for_race().unwrap();
        let mut hud = Hud::new(&library).unwrap();
        assert_eq!(hud.button_at(Point::new(170.0, 360.0)), Some(ButtonType::Menu));
        assert_eq!(hud.button_at(Point::new(0.0, 100.0)), None);

        hud.show_overlay(2, 200.0);
        hud.add_feedback_buttons();
        assert_eq!(hud.button_at(Point::new(0.0, 100.0)), Some(ButtonType::RateIt));
        assert_eq!(hud.button_at(Point::new(0.0, -10.0)), Some(ButtonType::Later));
        assert_eq!(hud.button_at(Point::new(0.0, -120.0)), Some(ButtonType::Never));
        assert_eq!(
            hud.active_buttons(),
            vec![ButtonType::Menu, ButtonType::RateIt, ButtonType::Later, ButtonType::Never]
        );
    }

    #[test]
    fn draw_follows_the_camera() {
        let library = GameLibrary::load_for_race().unwrap();
        let mut hud = Hud::new(&library).unwrap();
        hud.show_overlay(1, 0.0).set_line(0, "READY!");
        let params = TruckParameters {
            speed: 0.0,
            acceleration: 0.0,
            defense: 500.0,
            armor: 350.0,
            rage: 0.0,
            target_speed: 0.0,
        };
        let screen = Rectangle::make_centered_on(Point::new(0.0, 1000.0), redneck_engine::Size::new(480.0, 800.0));
        let mut backend = RecordingBackend::new();
        hud.draw(&screen, &params, "Pos: 2/6", &mut backend);
        assert_eq!(backend.texts(), vec!["armor/health", "rage", "Pos: 2/6", "READY!"]);
        assert_eq!(backend.quad_names(), vec!["button_menu"]);
    }
}
