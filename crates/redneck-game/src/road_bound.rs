//! Road edges along the track
//!
//! `.road` file format:
//!
//! ```text
//! scaleX scaleY          first line
//! y leftX rightX         every following line, y relative to the section
//! ```
//!
//! Sections are stacked: each one starts where the previous one ended.
//! x values are image pixels, shifted so the screen centre is x = 0.

use rand::Rng;

use redneck_engine::{Collidable, Collider, Point, Rectangle};

use crate::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct BorderLine {
    left: Point,
    right: Point,
}

#[derive(Debug, Clone)]
pub struct RoadBound {
    borders: Vec<BorderLine>,
    center_x: f32,
    last_sections_height: f32,
    scale_x: f32,
    scale_y: f32,
    bound: Rectangle,
}

impl RoadBound {
    pub fn new(center_x: f32, center_y: f32) -> Self {
        let mut road = Self {
            borders: Vec::new(),
            center_x,
            last_sections_height: -center_y,
            scale_x: 1.0,
            scale_y: 1.0,
            bound: Rectangle::default(),
        };
        road.update_bound();
        road
    }

    /// Append one section parsed from `.road` text
    pub fn load_road_section_border(&mut self, name: &str, text: &str) -> Result<()> {
        let parse_err = |line: usize, reason: &str| GameError::RoadParse {
            name: name.to_string(),
            line,
            reason: reason.to_string(),
        };
        let mut lines = text.lines().map(str::trim).enumerate().filter(|(_, l)| !l.is_empty());

        let (_, header) = lines.next().ok_or_else(|| parse_err(1, "empty file"))?;
        let scale: Vec<f32> = header
            .split_whitespace()
            .map(|t| t.parse::<f32>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| parse_err(1, &e.to_string()))?;
        if scale.len() < 2 {
            return Err(parse_err(1, "expected 'scaleX scaleY'"));
        }
        self.scale_x = scale[0];
        self.scale_y = scale[1];

        let mut section_height = 0.0;
        let before = self.borders.len();
        for (index, line) in lines {
            let values: Vec<f32> = line
                .split_whitespace()
                .map(|t| t.parse::<f32>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| parse_err(index + 1, &e.to_string()))?;
            if values.len() < 3 {
                return Err(parse_err(index + 1, "expected 'y left right'"));
            }
            section_height = values[0] * self.scale_y;
            let y = self.last_sections_height + section_height;
            self.borders.push(BorderLine {
                left: Point::new(values[1] * self.scale_x - self.center_x, y),
                right: Point::new(values[2] * self.scale_x - self.center_x, y),
            });
        }
        self.last_sections_height += section_height;
        self.update_bound();
        tracing::trace!(
            "Road section '{}': {} points, total {}",
            name,
            self.borders.len() - before,
            self.borders.len()
        );
        Ok(())
    }

    /// Left and right road x at `y`: the first border line strictly above
    /// `y`. Past the last line both are 0.
    pub fn bound_coordinates(&self, y: f32) -> (f32, f32) {
        let idx = self.borders.partition_point(|b| b.left.y <= y);
        match self.borders.get(idx) {
            Some(b) => (b.left.x, b.right.x),
            None => (0.0, 0.0),
        }
    }

    pub fn is_point_on_road(&self, x: f32, y: f32) -> bool {
        let (left, right) = self.bound_coordinates(y);
        x > left && x < right
    }

    /// Random whole-number x on the road at `y`. Both ends are clamped at
    /// zero, so spawns never land left of the track centre. An empty range
    /// yields its upper end.
    pub fn point_on_road<R: Rng>(&self, y: f32, rng: &mut R) -> Point {
        let (left, right) = self.bound_coordinates(y);
        let low = ((left + 10.0) as i32).max(0);
        let high = ((right - 10.0) as i32).max(0);
        let x = if low < high { rng.gen_range(low..=high) } else { high };
        Point::new(x as f32, y)
    }

    pub fn left_bound(&self, index: usize) -> Point {
        self.borders.get(index).map(|b| b.left).unwrap_or_default()
    }

    pub fn right_bound(&self, index: usize) -> Point {
        self.borders.get(index).map(|b| b.right).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.borders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    /// Y where the loaded road ends
    pub fn end_y(&self) -> f32 {
        self.last_sections_height
    }

    fn update_bound(&mut self) {
        let top = self.borders.last().map(|b| b.left.y).unwrap_or(0.0);
        self.bound = Rectangle::new(-self.center_x, self.center_x, top, 0.0);
    }
}

impl Collidable for RoadBound {
    fn bounding_rect(&self) -> Option<Rectangle> {
        Some(self.bound)
    }
}

impl Collider for RoadBound {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const STRAIGHT: &str = "1.0 1.0\n100 130 350\n200 130 350\n400 120 340\n800 100 300\n";

    fn road() -> RoadBound {
        let mut r = RoadBound::new(240.0, 400.0);
        r.load_road_section_border("a", STRAIGHT).unwrap();
        r.load_road_section_border("b", STRAIGHT).unwrap();
        r
    }

    #[test]
    fn sections_stack_from_minus_center() {
        let r = road();
        assert_eq!(r.len(), 8);
        assert_eq!(r.left_bound(0), Point::new(-110.0, -300.0));
        assert_eq!(r.left_bound(4), Point::new(-110.0, 500.0));
        assert!((r.end_y() - 1200.0).abs() < 0.001);
        assert_eq!(r.bounding_rect().unwrap(), Rectangle::new(-240.0, 240.0, 1200.0, 0.0));
    }

    #[test]
    fn lookup_uses_first_line_above() {
        let r = road();
        assert_eq!(r.bound_coordinates(-350.0), (-110.0, 110.0));
        // exactly on a line picks the next one
        assert_eq!(r.bound_coordinates(-200.0), (-120.0, 100.0));
        assert_eq!(r.bound_coordinates(1200.0), (0.0, 0.0));
        assert_eq!(r.left_bound(99), Point::default());
    }

    #[test]
    fn on_road_is_strict() {
        let r = road();
        assert!(r.is_point_on_road(0.0, -350.0));
        assert!(!r.is_point_on_road(110.0, -350.0));
        assert!(!r.is_point_on_road(-110.0, -350.0));
        assert!(!r.is_point_on_road(0.0, 5000.0));
    }

    #[test]
    fn spawn_points_stay_inside_clamped_range() {
        let r = road();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let p = r.point_on_road(-350.0, &mut rng);
            assert!(p.x >= 0.0 && p.x <= 100.0, "x={}", p.x);
            assert_eq!(p.x.fract(), 0.0);
        }
        // beyond the road both ends collapse to 0
        assert_eq!(r.point_on_road(9000.0, &mut rng).x, 0.0);
    }

    #[test]
    fn malformed_files_are_rejected() {
        let mut r = RoadBound::new(240.0, 400.0);
        assert!(matches!(
            r.load_road_section_border("bad", "1.0\n"),
            Err(GameError::RoadParse { line: 1, .. })
        ));
        assert!(matches!(
            r.load_road_section_border("bad", "1 1\n100 x 3\n"),
            Err(GameError::RoadParse { line: 2, .. })
        ));
        assert!(r.load_road_section_border("empty", "").is_err());
    }
}
