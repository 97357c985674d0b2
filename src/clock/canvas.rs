use ratatui::style::Color as TermColor;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas as CanvasWidget, Context, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Widget};

// Distance between parallel strokes of a wide hand, in face units.
const STROKE_SPACING: f64 = 1.5;

/// A point in face coordinates: origin top left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
}

impl Color {
    fn term(&self) -> TermColor {
        match self {
            // Default foreground, so the face reads on dark and light themes.
            Color::Black => TermColor::Reset,
            Color::Red => TermColor::Red,
        }
    }
}

/// Drawing layers. Clearing one layer leaves the others untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Face,
    Hands,
}

pub trait Canvas {
    fn clear(&mut self, layer: Layer);
    fn line(&mut self, layer: Layer, from: Point, to: Point, width: u32, color: Color);
    fn text(&mut self, layer: Layer, at: Point, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Line {
        from: Point,
        to: Point,
        width: u32,
        color: Color,
    },
    Text {
        at: Point,
        text: String,
    },
}

/// Keeps the shapes of each layer and paints them on a ratatui braille
/// canvas. Ratatui's canvas has y growing upward, so points are flipped.
#[derive(Debug, Clone)]
pub struct ClockCanvas {
    size: f64,
    face: Vec<Shape>,
    hands: Vec<Shape>,
}

impl ClockCanvas {
    pub fn new(size: u32) -> Self {
        Self {
            size: f64::from(size.max(1)),
            face: Vec::new(),
            hands: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn shape_count(&self, layer: Layer) -> usize {
        self.layer(layer).len()
    }

    fn layer(&self, layer: Layer) -> &Vec<Shape> {
        match layer {
            Layer::Face => &self.face,
            Layer::Hands => &self.hands,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Shape> {
        match layer {
            Layer::Face => &mut self.face,
            Layer::Hands => &mut self.hands,
        }
    }

    fn flip(&self, p: Point) -> (f64, f64) {
        (p.x, self.size - p.y)
    }

    pub fn widget(&self) -> impl Widget + '_ {
        CanvasWidget::default()
            .block(Block::default().borders(Borders::ALL).title("Clock"))
            .marker(Marker::Braille)
            .x_bounds([0.0, self.size])
            .y_bounds([0.0, self.size])
            .paint(move |ctx| {
                for shape in self.layer(Layer::Face).iter().chain(self.layer(Layer::Hands)) {
                    self.paint(ctx, shape);
                }
            })
    }

    fn paint(&self, ctx: &mut Context, shape: &Shape) {
        match shape {
            Shape::Line {
                from,
                to,
                width,
                color,
            } => {
                let (x1, y1) = self.flip(*from);
                let (x2, y2) = self.flip(*to);
                let length = (x2 - x1).hypot(y2 - y1);
                // Unit normal to the hand, used to fan out wide strokes.
                let (nx, ny) = if length > 0.0 {
                    (-(y2 - y1) / length, (x2 - x1) / length)
                } else {
                    (0.0, 0.0)
                };
                let strokes = (width / 2).max(1);
                for k in 0..strokes {
                    let offset = (f64::from(k) - f64::from(strokes - 1) / 2.0) * STROKE_SPACING;
                    ctx.draw(&CanvasLine::new(
                        x1 + nx * offset,
                        y1 + ny * offset,
                        x2 + nx * offset,
                        y2 + ny * offset,
                        color.term(),
                    ));
                }
            }
            Shape::Text { at, text } => {
                let (x, y) = self.flip(*at);
                ctx.print(x, y, text.clone());
            }
        }
    }
}

impl Canvas for ClockCanvas {
    fn clear(&mut self, layer: Layer) {
        self.layer_mut(layer).clear();
    }

    fn line(&mut self, layer: Layer, from: Point, to: Point, width: u32, color: Color) {
        self.layer_mut(layer).push(Shape::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn text(&mut self, layer: Layer, at: Point, text: &str) {
        self.layer_mut(layer).push(Shape::Text {
            at,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;

    fn draw(canvas: &ClockCanvas, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        canvas.widget().render(area, &mut buffer);
        buffer
            .content()
            .chunks(usize::from(width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    fn is_braille(ch: char) -> bool {
        ('\u{2801}'..='\u{28FF}').contains(&ch)
    }

    #[test]
    fn test_clear_only_touches_one_layer() {
        let mut canvas = ClockCanvas::new(200);
        let center = Point { x: 100.0, y: 100.0 };
        canvas.text(Layer::Face, center, "12");
        canvas.line(Layer::Hands, center, Point { x: 100.0, y: 0.0 }, 2, Color::Black);

        canvas.clear(Layer::Hands);
        assert_eq!(canvas.shape_count(Layer::Hands), 0);
        assert_eq!(canvas.shape_count(Layer::Face), 1);
    }

    #[test]
    fn test_upward_line_is_drawn_above_center() {
        let mut canvas = ClockCanvas::new(200);
        let center = Point { x: 100.0, y: 100.0 };
        canvas.line(Layer::Hands, center, Point { x: 100.0, y: 10.0 }, 2, Color::Black);

        let rows = draw(&canvas, 42, 22);
        let upper = rows[1..11].iter().any(|row| row.chars().any(is_braille));
        let lower = rows[12..21].iter().any(|row| row.chars().any(is_braille));
        assert!(upper, "no stroke above center:\n{}", rows.join("\n"));
        assert!(!lower, "stroke below center:\n{}", rows.join("\n"));
    }

    #[test]
    fn test_label_near_top_lands_in_upper_rows() {
        let mut canvas = ClockCanvas::new(200);
        canvas.text(Layer::Face, Point { x: 95.0, y: 19.0 }, "12");

        let rows = draw(&canvas, 42, 22);
        let row = rows.iter().position(|row| row.contains("12"));
        assert!(matches!(row, Some(r) if r <= 5), "rows:\n{}", rows.join("\n"));
    }

    #[test]
    fn test_empty_canvas_draws_only_the_frame() {
        let canvas = ClockCanvas::new(200);
        let rows = draw(&canvas, 20, 10);
        assert!(rows[0].contains("Clock"));
        assert!(rows.iter().all(|row| !row.chars().any(is_braille)));
    }
}
