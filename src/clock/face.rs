use chrono::Timelike;
use tracing::trace;

use super::canvas::{Canvas, Color, Layer, Point};

pub const DEFAULT_CLOCK_SIZE: u32 = 200;
const FACE_MARGIN: u32 = 10;

/// Hand angles in degrees clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandAngles {
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl HandAngles {
    pub fn at<T: Timelike>(now: &T) -> Self {
        let minute = f64::from(now.minute());
        Self {
            hour: 30.0 * f64::from(now.hour() % 12) + 0.5 * minute,
            minute: 6.0 * minute,
            second: 6.0 * f64::from(now.second()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandKind {
    Hour,
    Minute,
    Second,
}

impl HandKind {
    /// Length as a fraction of the face radius.
    fn length_ratio(&self) -> f64 {
        match self {
            HandKind::Hour => 0.5,
            HandKind::Minute => 0.75,
            HandKind::Second => 0.9,
        }
    }

    fn width(&self) -> u32 {
        match self {
            HandKind::Hour => 6,
            HandKind::Minute => 4,
            HandKind::Second => 2,
        }
    }

    fn color(&self) -> Color {
        match self {
            HandKind::Second => Color::Red,
            _ => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hand {
    pub kind: HandKind,
    pub tip: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceLabel {
    pub text: String,
    pub at: Point,
}

/// Square face geometry: integer center, radius inset by a fixed margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockFace {
    pub center: f64,
    pub radius: f64,
}

impl ClockFace {
    pub fn new(size: u32) -> Self {
        let half = size / 2;
        Self {
            center: f64::from(half),
            radius: f64::from(half.saturating_sub(FACE_MARGIN)),
        }
    }

    pub fn center_point(&self) -> Point {
        Point {
            x: self.center,
            y: self.center,
        }
    }

    /// Point at `distance` from the center. The -90 offset puts 0 at the top.
    pub fn point_at(&self, angle: f64, distance: f64) -> Point {
        let radians = (angle - 90.0).to_radians();
        Point {
            x: self.center + distance * radians.cos(),
            y: self.center + distance * radians.sin(),
        }
    }

    pub fn hand(&self, kind: HandKind, angle: f64) -> Hand {
        Hand {
            kind,
            tip: self.point_at(angle, self.radius * kind.length_ratio()),
        }
    }

    pub fn hands(&self, angles: &HandAngles) -> [Hand; 3] {
        [
            self.hand(HandKind::Hour, angles.hour),
            self.hand(HandKind::Minute, angles.minute),
            self.hand(HandKind::Second, angles.second),
        ]
    }

    pub fn labels(&self) -> Vec<FaceLabel> {
        (1..=12u32)
            .map(|n| FaceLabel {
                text: n.to_string(),
                at: self.point_at(30.0 * f64::from(n), self.radius * 0.9),
            })
            .collect()
    }
}

pub struct AnalogClockRenderer {
    face: ClockFace,
    angles: HandAngles,
}

impl AnalogClockRenderer {
    pub fn new(size: u32) -> Self {
        Self {
            face: ClockFace::new(size),
            angles: HandAngles::default(),
        }
    }

    /// Replaces whatever was drawn last time with the hands for `now`.
    pub fn render<C: Canvas, T: Timelike>(&mut self, canvas: &mut C, now: &T) -> HandAngles {
        self.angles = HandAngles::at(now);
        trace!(
            hour = self.angles.hour,
            minute = self.angles.minute,
            second = self.angles.second,
            "clock redraw"
        );

        canvas.clear(Layer::Hands);
        canvas.clear(Layer::Face);
        let center = self.face.center_point();
        for hand in self.face.hands(&self.angles) {
            canvas.line(
                Layer::Hands,
                center,
                hand.tip,
                hand.kind.width(),
                hand.kind.color(),
            );
        }
        for label in self.face.labels() {
            canvas.text(Layer::Face, label.at, &label.text);
        }
        self.angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::canvas::ClockCanvas;
    use chrono::NaiveTime;

    const EPS: f64 = 1e-9;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[derive(Default)]
    struct RecordingCanvas {
        cleared: Vec<Layer>,
        lines: Vec<(Point, Point, u32, Color)>,
        texts: Vec<(Point, String)>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self, layer: Layer) {
            self.cleared.push(layer);
            match layer {
                Layer::Hands => self.lines.clear(),
                Layer::Face => self.texts.clear(),
            }
        }

        fn line(&mut self, _layer: Layer, from: Point, to: Point, width: u32, color: Color) {
            self.lines.push((from, to, width, color));
        }

        fn text(&mut self, _layer: Layer, at: Point, text: &str) {
            self.texts.push((at, text.to_string()));
        }
    }

    #[test]
    fn test_hand_angles() {
        assert!((HandAngles::at(&time(3, 0, 0)).hour - 90.0).abs() < EPS);
        assert!((HandAngles::at(&time(15, 0, 0)).hour - 90.0).abs() < EPS);
        assert!((HandAngles::at(&time(7, 30, 12)).minute - 180.0).abs() < EPS);
        assert!((HandAngles::at(&time(0, 0, 45)).second - 270.0).abs() < EPS);
        assert!((HandAngles::at(&time(9, 30, 0)).hour - 285.0).abs() < EPS);
    }

    #[test]
    fn test_angles_stay_below_full_turn() {
        let angles = HandAngles::at(&time(23, 59, 59));
        assert!(angles.hour < 360.0);
        assert!(angles.minute < 360.0);
        assert!(angles.second < 360.0);
    }

    #[test]
    fn test_face_geometry() {
        let face = ClockFace::new(200);
        assert_eq!(face.center, 100.0);
        assert_eq!(face.radius, 90.0);

        let odd = ClockFace::new(201);
        assert_eq!(odd.center, 100.0);
    }

    #[test]
    fn test_hand_tips_point_clockwise_from_top() {
        let face = ClockFace::new(200);
        // 12 o'clock is straight up (y grows downward).
        let up = face.hand(HandKind::Minute, 0.0);
        assert!((up.tip.x - 100.0).abs() < EPS);
        assert!((up.tip.y - (100.0 - 67.5)).abs() < EPS);

        let right = face.hand(HandKind::Hour, 90.0);
        assert!((right.tip.x - 145.0).abs() < EPS);
        assert!((right.tip.y - 100.0).abs() < EPS);

        let down = face.hand(HandKind::Second, 180.0);
        assert!((down.tip.y - 181.0).abs() < EPS);
    }

    #[test]
    fn test_labels_run_one_through_twelve() {
        let face = ClockFace::new(200);
        let labels = face.labels();
        let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12"]
        );

        let twelve = &labels[11];
        assert!((twelve.at.x - 100.0).abs() < EPS);
        assert!((twelve.at.y - 19.0).abs() < EPS);
        let three = &labels[2];
        assert!((three.at.x - 181.0).abs() < EPS);
    }

    #[test]
    fn test_render_replaces_previous_hands() {
        let mut renderer = AnalogClockRenderer::new(200);
        let mut canvas = RecordingCanvas::default();

        renderer.render(&mut canvas, &time(3, 0, 0));
        let angles = renderer.render(&mut canvas, &time(3, 0, 1));

        assert_eq!(canvas.lines.len(), 3);
        assert_eq!(canvas.texts.len(), 12);
        assert_eq!(canvas.cleared.iter().filter(|l| **l == Layer::Hands).count(), 2);
        let widths: Vec<u32> = canvas.lines.iter().map(|line| line.2).collect();
        assert_eq!(widths, vec![6, 4, 2]);
        assert_eq!(canvas.lines[2].3, Color::Red);
        assert!((angles.second - 6.0).abs() < EPS);
    }

    #[test]
    fn test_clock_canvas_does_not_accumulate() {
        let mut renderer = AnalogClockRenderer::new(200);
        let mut canvas = ClockCanvas::new(200);
        for second in 0..5 {
            renderer.render(&mut canvas, &time(10, 10, second));
        }
        assert_eq!(canvas.shape_count(Layer::Hands), 3);
        assert_eq!(canvas.shape_count(Layer::Face), 12);
    }
}
