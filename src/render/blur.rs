use crate::foundation::error::{EtchError, EtchResult};

/// Separable Gaussian blur of a premultiplied RGBA8 buffer with clamped edges.
///
/// Weights are quantized to Q16 and sum to exactly `1 << 16`, so a constant image stays constant.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> EtchResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| EtchError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(EtchError::render(format!(
            "blur expects {expected_len} bytes for {width}x{height}, got {}",
            src.len()
        )));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = GaussianKernel::new(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let (w, h) = (width as usize, height as usize);
    kernel.convolve(src, &mut tmp, w, h, Axis::Horizontal);
    kernel.convolve(&tmp, &mut out, w, h, Axis::Vertical);
    Ok(out)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

struct GaussianKernel {
    weights: Vec<u32>,
    radius: isize,
}

impl GaussianKernel {
    fn new(radius: u32, sigma: f32) -> EtchResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(EtchError::validation("blur sigma must be finite and > 0"));
        }
        let r = radius as isize;
        let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
        let raw: Vec<f64> = (-r..=r)
            .map(|i| {
                let x = i as f64;
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return Err(EtchError::render("gaussian kernel sum is zero"));
        }

        let mut weights: Vec<u32> = raw
            .iter()
            .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
            .collect();
        let total: i64 = weights.iter().map(|&w| i64::from(w)).sum();
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + 65536 - total).clamp(0, 65536) as u32;

        Ok(Self { weights, radius: r })
    }

    fn convolve(&self, src: &[u8], dst: &mut [u8], w: usize, h: usize, axis: Axis) {
        let (len, stride, lines, line_stride) = match axis {
            Axis::Horizontal => (w, 4, h, w * 4),
            Axis::Vertical => (h, w * 4, w, 4),
        };
        let last = len as isize - 1;

        for line in 0..lines {
            let base = line * line_stride;
            for i in 0..len {
                let mut acc = [0u64; 4];
                for (k, &kw) in self.weights.iter().enumerate() {
                    let j = (i as isize + k as isize - self.radius).clamp(0, last) as usize;
                    let idx = base + j * stride;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                let out = base + i * stride;
                for (c, a) in acc.iter().enumerate() {
                    dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
                }
            }
        }
    }
}
