use crate::foundation::core::Point;

/// Side a lateral excursion bends toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Positive values map to [`Direction::Right`], everything else to [`Direction::Left`].
    pub fn from_sign(sign: f64) -> Self {
        if sign > 0.0 { Self::Right } else { Self::Left }
    }
}

/// Normalized progress at which a lateral excursion begins, and its side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kink {
    pub at: f64,
    pub direction: Direction,
}

impl Kink {
    pub fn new(at: f64, direction: Direction) -> Self {
        Self { at, direction }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kinks {
    One(Kink),
    Two(Kink, Kink),
}

impl Kinks {
    pub fn first(&self) -> Kink {
        match *self {
            Self::One(k) | Self::Two(k, _) => k,
        }
    }

    pub fn second(&self) -> Option<Kink> {
        match *self {
            Self::One(_) => None,
            Self::Two(_, k) => Some(k),
        }
    }
}

/// Geometry of one etched line: a vertical run from `origin` with one or two lateral kinks.
///
/// Kinks are keyed to the y position along the line, not to `t` directly, so the shape does not
/// depend on how densely the caller samples it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EtchPath {
    pub origin: Point,
    pub length: f64,
    pub width: f64,
    pub kinks: Kinks,
}

impl EtchPath {
    /// Canvas position at normalized progress `t`.
    ///
    /// `t` is meant to range over `[0, 1]`; values outside extrapolate along the same branches.
    /// When the second kink starts at or before the end of the first ramp the two excursions
    /// collapse into a single plateau at `x0 + dir1 * width`.
    pub fn evaluate(&self, t: f64) -> Point {
        let Point { x: x0, y: y0 } = self.origin;
        let yt = y0 + t * self.length;

        let first = self.kinks.first();
        let d1 = first.direction.sign();
        let y_start1 = y0 + first.at * self.length;
        let y_end1 = y_start1 + self.width;
        let plateau1 = x0 + d1 * self.width;

        if yt < y_start1 {
            return Point::new(x0, yt);
        }

        let Some(second) = self.kinks.second() else {
            let x = if yt < y_end1 {
                x0 + d1 * (yt - y_start1)
            } else {
                plateau1
            };
            return Point::new(x, yt);
        };

        let d2 = second.direction.sign();
        let y_start2 = y0 + second.at * self.length;
        let y_end2 = y_start2 + self.width;

        let x = if y_start2 <= y_end1 {
            plateau1
        } else if yt < y_end1 {
            x0 + d1 * (yt - y_start1)
        } else if yt < y_start2 {
            plateau1
        } else if yt < y_end2 {
            plateau1 + d2 * (yt - y_start2)
        } else {
            plateau1 + d2 * self.width
        };
        Point::new(x, yt)
    }

    /// True when the kinks overlap and [`EtchPath::evaluate`] uses the single-plateau branch.
    pub fn is_degenerate(&self) -> bool {
        let Some(second) = self.kinks.second() else {
            return false;
        };
        let y_end1 = self.kinks.first().at * self.length + self.width;
        second.at * self.length <= y_end1
    }
}
