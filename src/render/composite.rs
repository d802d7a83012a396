use crate::foundation::error::{EtchError, EtchResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255 - u16::from(sa);
            let mut out = [0u8; 4];
            for i in 0..4 {
                out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> EtchResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(EtchError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

/// Per-channel running sum of equally weighted frames (motion-blur sub-samples).
#[derive(Clone, Debug)]
pub struct FrameAccumulator {
    sums: Vec<u32>,
    count: u32,
}

impl FrameAccumulator {
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0; len],
            count: 0,
        }
    }

    pub fn add(&mut self, frame: &[u8]) -> EtchResult<()> {
        if frame.len() != self.sums.len() {
            return Err(EtchError::render(format!(
                "accumulator expects {} bytes, got {}",
                self.sums.len(),
                frame.len()
            )));
        }
        for (s, &v) in self.sums.iter_mut().zip(frame) {
            *s += u32::from(v);
        }
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Rounded per-channel mean of everything added so far.
    pub fn finish(self) -> EtchResult<Vec<u8>> {
        if self.count == 0 {
            return Err(EtchError::render("accumulator has no frames"));
        }
        let n = self.count;
        Ok(self
            .sums
            .into_iter()
            .map(|s| ((s + n / 2) / n).min(255) as u8)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_src_is_noop() {
        assert_eq!(over([10, 20, 30, 40], [255, 255, 255, 0]), [10, 20, 30, 40]);
    }

    #[test]
    fn opaque_src_replaces_dst() {
        assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
    }

    #[test]
    fn half_alpha_blends() {
        let out = over([0, 0, 200, 255], [128, 0, 0, 128]);
        assert_eq!(out, [128, 0, 100, 255]);
    }

    #[test]
    fn in_place_checks_lengths() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
        over_in_place(&mut dst, &[1, 2, 3, 255, 0, 0, 0, 0]).unwrap();
        assert_eq!(dst, vec![1, 2, 3, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn accumulator_averages_with_rounding() {
        let mut acc = FrameAccumulator::new(4);
        acc.add(&[0, 10, 255, 1]).unwrap();
        acc.add(&[255, 11, 255, 2]).unwrap();
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.finish().unwrap(), vec![128, 11, 255, 2]);
        assert!(FrameAccumulator::new(4).finish().is_err());
    }
}
