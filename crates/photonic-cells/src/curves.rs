//! Parametric backbones in micrometres.

use photonic_core::DPoint;

/// `n` evenly spaced samples from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn binomials(n: usize) -> Vec<f64> {
    let mut row = vec![1.0; n + 1];
    for k in 1..n {
        row[k] = row[k - 1] * (n - k + 1) as f64 / k as f64;
    }
    row
}

/// Bernstein-form Bézier curve through `control` sampled at `t_values`.
pub fn bezier_curve(t_values: &[f64], control: &[DPoint]) -> Vec<DPoint> {
    if control.is_empty() {
        return Vec::new();
    }
    let n = control.len() - 1;
    let coeffs = binomials(n);
    let mut t_pow = vec![1.0; n + 1];
    let mut u_pow = vec![1.0; n + 1];
    t_values
        .iter()
        .map(|&t| {
            let u = 1.0 - t;
            for k in 1..=n {
                t_pow[k] = t_pow[k - 1] * t;
                u_pow[k] = u_pow[k - 1] * u;
            }
            let (mut x, mut y) = (0.0, 0.0);
            for (k, p) in control.iter().enumerate() {
                let w = coeffs[k] * u_pow[n - k] * t_pow[k];
                x += w * p.x;
                y += w * p.y;
            }
            DPoint::new(x, y)
        })
        .collect()
}

/// Upper bound on the segments of one sampled arc.
pub const MAX_SAMPLES: usize = 100_000;

/// Segments needed to sweep `span` degrees in steps of at most `angle_step`,
/// or `None` if the step is not positive or more than [`MAX_SAMPLES`] would
/// be needed.
pub fn sample_count(span: f64, angle_step: f64) -> Option<usize> {
    if angle_step.is_nan() || angle_step <= 0.0 || !span.is_finite() {
        return None;
    }
    let n = (span.abs() / angle_step).ceil();
    if n > MAX_SAMPLES as f64 {
        return None;
    }
    Some((n as usize).max(1))
}

fn step_count(span: f64, angle_step: f64) -> usize {
    match sample_count(span, angle_step) {
        Some(n) => n,
        None if angle_step > 0.0 => MAX_SAMPLES,
        None => 1,
    }
}

/// Circular arc starting at the origin heading +x, centred on `(0, radius)`.
///
/// Negative angles turn clockwise (centre on `(0, -radius)`).
pub fn circular_arc(radius: f64, angle: f64, angle_step: f64) -> Vec<DPoint> {
    if radius == 0.0 || angle == 0.0 {
        return vec![DPoint::new(0.0, 0.0)];
    }
    let sign = angle.signum();
    let steps = step_count(angle.abs(), angle_step);
    (0..=steps)
        .map(|i| {
            let theta = (angle.abs() * i as f64 / steps as f64).to_radians();
            DPoint::new(radius * theta.sin(), sign * radius * (1.0 - theta.cos()))
        })
        .collect()
}

/// Heading (radians) along a symmetric partial Euler bend.
struct EulerProfile {
    radius: f64,
    theta: f64,
    s_clothoid: f64,
    s_arc: f64,
}

impl EulerProfile {
    fn new(radius: f64, theta: f64, p: f64) -> Self {
        Self {
            radius,
            theta,
            s_clothoid: radius * p * theta,
            s_arc: radius * theta * (1.0 - p),
        }
    }

    fn length(&self) -> f64 {
        2.0 * self.s_clothoid + self.s_arc
    }

    fn heading(&self, s: f64) -> f64 {
        let sc = self.s_clothoid;
        if sc > 0.0 && s <= sc {
            s * s / (2.0 * self.radius * sc)
        } else if s <= sc + self.s_arc {
            sc / (2.0 * self.radius) + (s - sc) / self.radius
        } else if sc > 0.0 {
            let rest = (self.length() - s).max(0.0);
            self.theta - rest * rest / (2.0 * self.radius * sc)
        } else {
            self.theta
        }
    }
}

const SIMPSON_PANELS: usize = 8;

fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    let h = (b - a) / SIMPSON_PANELS as f64;
    let mut acc = f(a) + f(b);
    for i in 1..SIMPSON_PANELS {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        acc += w * f(a + h * i as f64);
    }
    acc * h / 3.0
}

/// Euler bend: curvature ramps linearly from zero to `1/radius`, holds, then
/// ramps back down. `p` is the fraction of the turn spent in the ramps;
/// `radius` is the minimum radius of curvature.
pub fn euler_curve(radius: f64, angle: f64, p: f64, angle_step: f64) -> Vec<DPoint> {
    if radius == 0.0 || angle == 0.0 {
        return vec![DPoint::new(0.0, 0.0)];
    }
    let sign = angle.signum();
    let p = p.clamp(0.0, 1.0);
    let profile = EulerProfile::new(radius, angle.abs().to_radians(), p);
    let steps = step_count(angle.abs() * (1.0 + p), angle_step);
    let ds = profile.length() / steps as f64;

    let mut points = Vec::with_capacity(steps + 1);
    let (mut x, mut y) = (0.0, 0.0);
    points.push(DPoint::new(0.0, 0.0));
    for i in 0..steps {
        let (a, b) = (ds * i as f64, ds * (i + 1) as f64);
        x += simpson(|s| profile.heading(s).cos(), a, b);
        y += simpson(|s| profile.heading(s).sin(), a, b);
        points.push(DPoint::new(x, sign * y));
    }
    points
}

/// Arc length of [`euler_curve`] with the same parameters.
pub fn euler_length(radius: f64, angle: f64, p: f64) -> f64 {
    EulerProfile::new(radius, angle.abs().to_radians(), p.clamp(0.0, 1.0)).length()
}

/// Points `(a cos α + x0, b sin α)` for α in `[angle_min, angle_max + step)`.
pub fn ellipse_arc(
    a: f64,
    b: f64,
    x0: f64,
    angle_min: f64,
    angle_max: f64,
    angle_step: f64,
) -> Vec<DPoint> {
    if angle_step <= 0.0 {
        return Vec::new();
    }
    let count = ((angle_max + angle_step - angle_min) / angle_step - 1e-9).ceil();
    (0..count.max(0.0) as usize)
        .map(|i| {
            let alpha = (angle_min + angle_step * i as f64).to_radians();
            DPoint::new(a * alpha.cos() + x0, b * alpha.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_bezier_interpolates_endpoints() {
        let control = [
            DPoint::new(0.0, 0.0),
            DPoint::new(5.0, 0.0),
            DPoint::new(5.0, 2.0),
            DPoint::new(10.0, 2.0),
        ];
        let pts = bezier_curve(&linspace(0.0, 1.0, 11), &control);
        assert_eq!(pts.len(), 11);
        assert_relative_eq!(pts[0].x, 0.0);
        assert_relative_eq!(pts[10].x, 10.0);
        assert_relative_eq!(pts[10].y, 2.0);
        // symmetric control polygon
        assert_relative_eq!(pts[5].x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(pts[5].y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bezier_chord_error_shrinks_with_samples() {
        let control = [
            DPoint::new(0.0, 0.0),
            DPoint::new(10.0, 0.0),
            DPoint::new(10.0, 10.0),
            DPoint::new(20.0, 10.0),
        ];
        let chord_error = |n: usize| {
            let ts = linspace(0.0, 1.0, n);
            let pts = bezier_curve(&ts, &control);
            let mut worst: f64 = 0.0;
            for (i, w) in pts.windows(2).enumerate() {
                let tm = (ts[i] + ts[i + 1]) / 2.0;
                let mid = bezier_curve(&[tm], &control)[0];
                let chord_mid = DPoint::new((w[0].x + w[1].x) / 2.0, (w[0].y + w[1].y) / 2.0);
                worst = worst.max(mid.distance_to(&chord_mid));
            }
            worst
        };
        assert!(chord_error(40) < chord_error(10));
        assert!(chord_error(160) < chord_error(40));
    }

    #[test]
    fn test_circular_arc_radius_invariant() {
        let pts = circular_arc(10.0, 90.0, 1.0);
        assert_eq!(pts.len(), 91);
        for p in &pts {
            assert_relative_eq!(p.distance_to(&DPoint::new(0.0, 10.0)), 10.0, epsilon = 1e-9);
        }
        let end = pts[90];
        assert_relative_eq!(end.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(end.y, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circular_arc_degenerate_inputs() {
        assert_eq!(circular_arc(0.0, 90.0, 1.0), vec![DPoint::new(0.0, 0.0)]);
        assert_eq!(circular_arc(5.0, 0.0, 1.0), vec![DPoint::new(0.0, 0.0)]);
        assert_eq!(circular_arc(5.0, 90.0, 0.0).len(), 2);
        assert_eq!(circular_arc(5.0, 90.0, 7.0).len(), 14);
    }

    #[test]
    fn test_negative_arc_turns_right() {
        let pts = circular_arc(10.0, -90.0, 1.0);
        let end = pts[pts.len() - 1];
        assert_relative_eq!(end.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(end.y, -10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_is_symmetric_and_wider_than_circle() {
        let pts = euler_curve(10.0, 90.0, 1.0, 1.0);
        let end = pts[pts.len() - 1];
        assert_relative_eq!(end.x, end.y, epsilon = 1e-6);
        // same minimum radius, longer transition ⇒ larger footprint
        assert!(end.x > 10.0);
        assert_relative_eq!(euler_length(10.0, 90.0, 1.0), 10.0 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_with_no_clothoid_is_circular() {
        let pts = euler_curve(10.0, 90.0, 0.0, 1.0);
        let end = pts[pts.len() - 1];
        assert_relative_eq!(end.x, 10.0, epsilon = 1e-6);
        assert_relative_eq!(end.y, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_euler_end_tangent() {
        let pts = euler_curve(5.0, 90.0, 0.5, 1.0);
        let n = pts.len();
        let (a, b) = (pts[n - 2], pts[n - 1]);
        let heading = (b.y - a.y).atan2(b.x - a.x).to_degrees();
        assert!((heading - 90.0).abs() < 1.0);
        let mirrored = euler_curve(5.0, -90.0, 0.5, 1.0);
        assert_relative_eq!(mirrored[n - 1].y, -b.y);
    }

    #[test]
    fn test_ellipse_arc_half_open_range() {
        let pts = ellipse_arc(2.0, 1.0, 3.0, -25.0, 25.0, 1.0);
        assert_eq!(pts.len(), 51);
        assert_relative_eq!(pts[25].x, 5.0);
        assert_relative_eq!(pts[25].y, 0.0);
        let pts = ellipse_arc(2.0, 1.0, 0.0, 0.0, 10.0, 3.0);
        assert_eq!(pts.len(), 5);
    }

    #[test]
    fn test_sample_count_bounds() {
        assert_eq!(sample_count(90.0, 1.0), Some(90));
        assert_eq!(sample_count(0.5, 1.0), Some(1));
        assert_eq!(sample_count(90.0, 0.0), None);
        assert_eq!(sample_count(90.0, -1.0), None);
        assert_eq!(sample_count(90.0, f64::NAN), None);
        assert_eq!(sample_count(90.0, 1e-9), None);
        assert_eq!(circular_arc(10.0, 90.0, 1e-9).len(), MAX_SAMPLES + 1);
    }
}
