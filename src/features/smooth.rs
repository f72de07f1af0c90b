//! Polynomial (Savitzky-Golay, order 2) smoothing over a centered window.
//!
//! Series shorter than 12 samples, or any window where the quadratic fit is
//! singular, fall back to the raw values. The fallback is deterministic and
//! part of the feature contract, not an error path.

/// Minimum series length before smoothing applies at all.
const MIN_SERIES_LEN: usize = 12;

/// Smooth with window `min(cap, floor(n/2)*2 + 1)` forced odd. Returns the
/// input unchanged when the series is too short or the fit degenerates.
pub fn savgol_smooth(values: &[f64], window_cap: usize) -> Vec<f64> {
    let n = values.len();
    if n < MIN_SERIES_LEN {
        return values.to_vec();
    }
    let mut window = window_cap.min((n / 2) * 2 + 1);
    if window % 2 == 0 {
        window += 1;
    }
    if window < 3 || window > n {
        return values.to_vec();
    }
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Interior points use the window centered on i; edges evaluate the
        // polynomial fitted to the first/last full window at position i.
        let (start, eval) = if i < half {
            (0, i as f64)
        } else if i + half >= n {
            (n - window, (i - (n - window)) as f64)
        } else {
            (i - half, half as f64)
        };
        match quad_fit_eval(&values[start..start + window], eval) {
            Some(v) => out.push(v),
            None => return values.to_vec(),
        }
    }
    out
}

/// Least-squares quadratic fit over `y` at positions 0..len, evaluated at
/// `t`. None when the normal equations are singular.
fn quad_fit_eval(y: &[f64], t: f64) -> Option<f64> {
    let n = y.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut sy, mut sty, mut st2y) = (0.0, 0.0, 0.0);
    for (i, &v) in y.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        sy += v;
        sty += x * v;
        st2y += x2 * v;
    }
    let coeffs = solve3(
        [[n, s1, s2], [s1, s2, s3], [s2, s3, s4]],
        [sy, sty, st2y],
    )?;
    Some(coeffs[0] + coeffs[1] * t + coeffs[2] * t * t)
}

/// Gaussian elimination with partial pivoting for a 3x3 system.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| {
            a[i][col].abs().partial_cmp(&a[j][col].abs()).unwrap()
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..3 {
            let f = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let mut acc = b[row];
        for k in (row + 1)..3 {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}
