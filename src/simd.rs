//! Batch operations for coordinate transformation.
//! Relying on auto-vectorization by LLVM.

use glam::DVec2;

use crate::data_types::Sample;
use crate::transform::Transform2D;

/// Affine coefficients `x' = a*x + c*y + e`, `y' = b*x + d*y + f`, or `None`
/// for a projective matrix.
#[inline(always)]
fn affine_coefficients(transform: &Transform2D) -> Option<[f64; 6]> {
    let m = transform.to_coefficients();
    if m[2] != 0.0 || m[5] != 0.0 || m[8] != 1.0 {
        return None;
    }
    Some([m[0], m[1], m[3], m[4], m[6], m[7]])
}

/// Maps parallel x/y arrays to device coordinates.
pub fn batch_transform_arrays(x: &[f64], y: &[f64], transform: &Transform2D, output: &mut Vec<DVec2>) {
    let len = x.len().min(y.len());
    let (x, y) = (&x[..len], &y[..len]);
    output.clear();
    output.reserve(len);

    let Some([a, b, c, d, e, f]) = affine_coefficients(transform) else {
        output.extend(
            x.iter()
                .zip(y.iter())
                .map(|(&vx, &vy)| transform.map_forward(DVec2::new(vx, vy))),
        );
        return;
    };

    let x_chunks = x.chunks_exact(4);
    let y_chunks = y.chunks_exact(4);
    let rem_x = x_chunks.remainder();
    let rem_y = y_chunks.remainder();

    for (xc, yc) in x_chunks.zip(y_chunks) {
        for i in 0..4 {
            output.push(DVec2::new(
                a * xc[i] + c * yc[i] + e,
                b * xc[i] + d * yc[i] + f,
            ));
        }
    }

    for (&vx, &vy) in rem_x.iter().zip(rem_y.iter()) {
        output.push(DVec2::new(a * vx + c * vy + e, b * vx + d * vy + f));
    }
}

/// Maps decimated samples to device coordinates.
pub fn batch_transform_samples<I>(samples: I, transform: &Transform2D, output: &mut Vec<DVec2>)
where
    I: IntoIterator<Item = Sample>,
{
    output.clear();
    match affine_coefficients(transform) {
        Some([a, b, c, d, e, f]) => output.extend(
            samples
                .into_iter()
                .map(|s| DVec2::new(a * s.x + c * s.y + e, b * s.x + d * s.y + f)),
        ),
        None => output.extend(
            samples
                .into_iter()
                .map(|s| transform.map_forward(DVec2::new(s.x, s.y))),
        ),
    }
}

/// Minimum and maximum of the finite values, or `None` if there are none.
pub fn finite_min_max_f64(data: &[f64]) -> Option<(f64, f64)> {
    let chunks = data.chunks_exact(8);
    let rem = chunks.remainder();

    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;

    for c in chunks {
        for &v in c {
            if v.is_finite() {
                min_val = min_val.min(v);
                max_val = max_val.max(v);
            }
        }
    }

    for &v in rem {
        if v.is_finite() {
            min_val = min_val.min(v);
            max_val = max_val.max(v);
        }
    }

    (min_val <= max_val).then_some((min_val, max_val))
}
