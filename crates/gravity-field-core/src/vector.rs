/// 2D vector / point in world coordinates.
pub type Vec2 = [f64; 2];

pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] + b[0], a[1] + b[1]]
}

pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

pub fn scale(v: Vec2, s: f64) -> Vec2 {
    [v[0] * s, v[1] * s]
}

pub fn length(v: Vec2) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

pub fn distance(a: Vec2, b: Vec2) -> f64 {
    length(sub(a, b))
}

/// Unit vector in the direction of `v`, or zero when `|v| < epsilon`.
pub fn normalize(v: Vec2, epsilon: f64) -> Vec2 {
    let len = length(v);
    if len < epsilon {
        return [0.0, 0.0];
    }
    [v[0] / len, v[1] / len]
}

/// Scale `v` down so its length does not exceed `max`.
pub fn clamp_magnitude(v: Vec2, max: f64) -> Vec2 {
    let len = length(v);
    if len <= max {
        return v;
    }
    let scale = if len > 0.0 { max / len } else { max };
    [v[0] * scale, v[1] * scale]
}

pub fn is_finite(v: Vec2) -> bool {
    v[0].is_finite() && v[1].is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_returns_zero_below_epsilon() {
        assert_eq!(normalize([1e-9, 0.0], 1e-6), [0.0, 0.0]);
        let n = normalize([3.0, 4.0], 1e-6);
        assert!((n[0] - 0.6).abs() < 1e-12);
        assert!((n[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn clamp_magnitude_only_shrinks() {
        assert_eq!(clamp_magnitude([1.0, 0.0], 5.0), [1.0, 0.0]);
        let v = clamp_magnitude([30.0, 40.0], 5.0);
        assert!((length(v) - 5.0).abs() < 1e-12);
        assert!((v[0] - 3.0).abs() < 1e-12);
    }
}
