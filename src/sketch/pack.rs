use crate::{
    config::model::{KinkCount, RowConfig},
    foundation::{
        core::Point,
        error::{EtchError, EtchResult},
    },
    sketch::{
        path::{Direction, EtchPath, Kink, Kinks},
        stream::SeededStream,
        stroke::{LineSpec, StrokeStyle},
    },
};

/// Stream values consumed by every placed line, independent of row options.
pub const DRAWS_PER_LINE: u64 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowStats {
    pub lines: usize,
    pub draws: u64,
}

/// Greedily place lines left to right from `row.x0` until `x >= row.stop_x`.
///
/// Draw order per line is fixed: two direction signs, width multiplier, y jitter, length jitter,
/// two kink fractions, bead offset, bead color, and finally the advance factor. Values are drawn
/// even when the row has no beads or uses a single kink so that every row consumes the stream
/// the same way.
///
/// The advance is `min(width, r + max(dir1 + dir2, 0.2)) * width`, where `width` is the line's
/// scaled width and `r` the final draw.
///
/// Fails with [`EtchError::Config`] if an advance is lost to floating-point rounding, which happens
/// for rows placed far from the origin.
#[tracing::instrument(level = "trace", skip_all, fields(x0 = row.x0, stop_x = row.stop_x))]
pub fn pack_row(
    row: &RowConfig,
    t: f64,
    kink_count: KinkCount,
    stream: &mut SeededStream,
    mut emit: impl FnMut(LineSpec),
) -> EtchResult<RowStats> {
    row.validate()?;

    let start_draws = stream.draws();
    let mut x = row.x0;
    let mut lines = 0usize;

    while x < row.stop_x {
        let dir1 = stream.next_sign();
        let dir2 = stream.next_sign();
        let width = row.width * (2.0 + stream.next());

        let y = row.y0 + stream.next() * 5.0;
        let length = row.length - stream.next() * 10.0;
        let kink1 = 0.75 * stream.next();
        let kink2 = stream.next();
        let position = (t + stream.next()).rem_euclid(1.0);
        let color_draw = stream.next();

        let first = Kink::new(kink1, Direction::from_sign(dir1));
        let kinks = match kink_count {
            KinkCount::One => Kinks::One(first),
            KinkCount::Two => Kinks::Two(first, Kink::new(kink2, Direction::from_sign(dir2))),
        };

        emit(LineSpec {
            path: EtchPath {
                origin: Point::new(x, y),
                length,
                width,
                kinks,
            },
            stroke: StrokeStyle {
                color: row.line_color,
                width: row.line_width,
            },
            bead_color: row.bead.as_ref().map(|b| b.pick(color_draw)),
            bead_position: position,
        });
        lines += 1;

        let next_x = x + width.min(stream.next() + (dir1 + dir2).max(0.2)) * width;
        if next_x <= x {
            return Err(EtchError::config(format!(
                "row packing stalled at x = {x} after {lines} lines"
            )));
        }
        x = next_x;
    }

    let stats = RowStats {
        lines,
        draws: stream.draws() - start_draws,
    };
    tracing::trace!(lines = stats.lines, draws = stats.draws, "packed row");
    Ok(stats)
}
