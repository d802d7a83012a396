use crate::{
    foundation::{
        color::Color,
        core::{Point, Rect},
    },
    sketch::path::EtchPath,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

/// Everything needed to draw one etched line for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSpec {
    pub path: EtchPath,
    pub stroke: StrokeStyle,
    /// `None` means the line carries no bead.
    pub bead_color: Option<Color>,
    /// Normalized progress of the bead along the path.
    pub bead_position: f64,
}

/// Where a line's bead is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BeadPolicy {
    /// Bead sits on the stroke sample whose interval contains the bead position.
    #[default]
    Drip,
    /// Bead sits exactly at the bead position unless it lands inside `zone` (edges inclusive).
    ExclusionZone { zone: Rect },
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Sampling {
    pub step: f64,
    pub include_endpoint: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            step: 0.005,
            include_endpoint: true,
        }
    }
}

impl Sampling {
    /// Sample progress values `i * step` below 1, then an exact `t = 1` when
    /// `include_endpoint` is set. A step that does not divide 1 leaves a shorter final interval.
    pub fn ts(self) -> impl Iterator<Item = f64> {
        let step = self.step;
        (0..self.interior_count())
            .map(move |i| i as f64 * step)
            .chain(self.include_endpoint.then_some(1.0))
    }

    /// Number of values [`Sampling::ts`] yields.
    pub fn sample_count(self) -> usize {
        self.interior_count() as usize + usize::from(self.include_endpoint)
    }

    // Values of `i * step` strictly below 1; the epsilon absorbs `1 / step` landing just above an
    // integer for steps like 0.005.
    fn interior_count(self) -> u64 {
        ((1.0 / self.step) - 1e-9).ceil().max(1.0) as u64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EtchStroke {
    pub points: Vec<Point>,
    pub bead: Option<Point>,
}

/// Sample a line into a poly-line and resolve its bead point under `policy`.
pub fn sample_stroke(line: &LineSpec, sampling: Sampling, policy: &BeadPolicy) -> EtchStroke {
    let position = line.bead_position;
    let mut points = Vec::with_capacity(sampling.sample_count());
    let mut captured = None;
    let capturable = (0.0..1.0).contains(&position);

    for t in sampling.ts() {
        let p = line.path.evaluate(t);
        if capturable && captured.is_none() && t >= position && t < position + sampling.step {
            captured = Some(p);
        }
        points.push(p);
    }

    let bead = match line.bead_color {
        None => None,
        Some(_) => match policy {
            BeadPolicy::Drip => captured,
            BeadPolicy::ExclusionZone { zone } => exclusion_zone_bead(&line.path, position, zone),
        },
    };

    EtchStroke { points, bead }
}

fn exclusion_zone_bead(path: &EtchPath, position: f64, zone: &Rect) -> Option<Point> {
    if !(0.0..1.0).contains(&position) {
        return None;
    }
    let p = path.evaluate(position);
    let inside = p.x >= zone.min_x()
        && p.x <= zone.max_x()
        && p.y >= zone.min_y()
        && p.y <= zone.max_y();
    (!inside).then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::path::{Direction, Kink, Kinks};

    fn line(position: f64, bead: Option<Color>) -> LineSpec {
        LineSpec {
            path: EtchPath {
                origin: Point::new(100.0, 0.0),
                length: 100.0,
                width: 10.0,
                kinks: Kinks::One(Kink::new(0.5, Direction::Right)),
            },
            stroke: StrokeStyle {
                color: Color::WHITE,
                width: 2.5,
            },
            bead_color: bead,
            bead_position: position,
        }
    }

    #[test]
    fn sampling_count_depends_on_endpoint_flag() {
        let on = Sampling::default();
        let off = Sampling {
            include_endpoint: false,
            ..on
        };
        assert_eq!(on.ts().count(), 201);
        assert_eq!(off.ts().count(), 200);
        assert_eq!(on.ts().last(), Some(1.0));
        assert_eq!(on.sample_count(), 201);
        assert!(off.ts().all(|t| t < 1.0));
    }

    #[test]
    fn uneven_step_still_covers_the_whole_line() {
        for step in [0.3, 0.4, 0.007, 1.0] {
            let on = Sampling {
                step,
                include_endpoint: true,
            };
            let ts: Vec<f64> = on.ts().collect();
            assert_eq!(ts.first(), Some(&0.0), "step {step}");
            assert_eq!(ts.last(), Some(&1.0), "step {step}");
            assert!(ts.windows(2).all(|w| w[0] < w[1]), "step {step}");
            assert_eq!(ts.len(), on.sample_count());

            let off = Sampling {
                include_endpoint: false,
                ..on
            };
            assert!(off.ts().all(|t| (0.0..1.0).contains(&t)), "step {step}");
        }
        let ts: Vec<f64> = Sampling {
            step: 0.3,
            include_endpoint: true,
        }
        .ts()
        .collect();
        assert_eq!(ts.len(), 5);
        assert!((ts[3] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn uneven_step_captures_bead_in_final_interval() {
        let sampling = Sampling {
            step: 0.3,
            include_endpoint: true,
        };
        let s = sample_stroke(&line(0.95, Some(Color::WHITE)), sampling, &BeadPolicy::Drip);
        let end = s.points.last().copied().unwrap();
        assert_eq!(s.bead, Some(end));
        assert!((end.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn drip_captures_sample_containing_position() {
        let s = sample_stroke(
            &line(0.3012, Some(Color::WHITE)),
            Sampling::default(),
            &BeadPolicy::Drip,
        );
        let bead = s.bead.unwrap();
        // first t with 0.3012 <= t < 0.3062 is 0.305
        assert!((bead.y - 30.5).abs() < 1e-9);
        assert_eq!(s.points.len(), 201);
    }

    #[test]
    fn drip_without_capture_draws_nothing() {
        for position in [1.0, 1.5, -0.002] {
            let s = sample_stroke(
                &line(position, Some(Color::WHITE)),
                Sampling::default(),
                &BeadPolicy::Drip,
            );
            assert!(s.bead.is_none(), "position {position}");
        }
    }

    #[test]
    fn missing_bead_color_suppresses_bead() {
        let s = sample_stroke(&line(0.3, None), Sampling::default(), &BeadPolicy::Drip);
        assert!(s.bead.is_none());
        assert!(!s.points.is_empty());
    }

    #[test]
    fn exclusion_zone_suppresses_inside_and_keeps_outside() {
        let policy = BeadPolicy::ExclusionZone {
            zone: Rect::new(90.0, 20.0, 120.0, 40.0),
        };
        let inside = sample_stroke(&line(0.3, Some(Color::WHITE)), Sampling::default(), &policy);
        assert!(inside.bead.is_none());

        let edge = sample_stroke(&line(0.4, Some(Color::WHITE)), Sampling::default(), &policy);
        assert!(edge.bead.is_none(), "zone edges are inclusive");

        let outside = sample_stroke(&line(0.8, Some(Color::WHITE)), Sampling::default(), &policy);
        let p = outside.bead.unwrap();
        assert!((p.x - 110.0).abs() < 1e-9);
        assert!((p.y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn exclusion_zone_rejects_out_of_range_position() {
        let policy = BeadPolicy::ExclusionZone {
            zone: Rect::new(0.0, 0.0, 1.0, 1.0),
        };
        let s = sample_stroke(&line(1.0, Some(Color::WHITE)), Sampling::default(), &policy);
        assert!(s.bead.is_none());
    }

    #[test]
    fn policy_json_shape() {
        let p: BeadPolicy = serde_json::from_str(r#"{"mode":"drip"}"#).unwrap();
        assert_eq!(p, BeadPolicy::Drip);
        let p: BeadPolicy = serde_json::from_str(
            r#"{"mode":"exclusion_zone","zone":{"x0":400,"y0":475,"x1":765,"y1":615}}"#,
        )
        .unwrap();
        assert_eq!(
            p,
            BeadPolicy::ExclusionZone {
                zone: Rect::new(400.0, 475.0, 765.0, 615.0)
            }
        );
    }
}
