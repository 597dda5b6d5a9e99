use crate::models::Coordinates;

/// Total haversine length of a path in meters
pub fn path_length_m(path: &[Coordinates]) -> f64 {
    path.windows(2).map(|w| w[0].distance_m(&w[1])).sum()
}

/// Draw evenly spaced samples along a polyline.
///
/// Emits the first vertex, one point every `interval_m` meters of travel, and
/// the last vertex. When that would exceed `max_samples` the spacing widens to
/// `length / (max_samples - 1)`. Paths with fewer than two vertices come back
/// unchanged.
pub fn sample_line(path: &[Coordinates], interval_m: f64, max_samples: usize) -> Vec<Coordinates> {
    if path.len() < 2 || max_samples < 2 {
        return path.iter().take(max_samples.max(1)).copied().collect();
    }

    let total_m = path_length_m(path);
    if total_m <= 0.0 {
        return vec![path[0], path[path.len() - 1]];
    }

    let mut interval = interval_m.max(1.0);
    if (total_m / interval).floor() as usize + 2 > max_samples {
        interval = total_m / (max_samples - 1) as f64;
    }

    let mut samples = Vec::with_capacity(((total_m / interval) as usize + 2).min(max_samples));
    samples.push(path[0]);

    // Distance along the path at which the next sample falls
    let mut next_at = interval;
    let mut walked = 0.0;

    for window in path.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        let len = a.distance_m(b);
        if len <= 0.0 {
            continue;
        }

        while next_at <= walked + len && samples.len() < max_samples - 1 {
            let t = (next_at - walked) / len;
            samples.push(a.lerp(b, t));
            next_at += interval;
        }
        walked += len;
    }

    let end = path[path.len() - 1];
    // Drop a sample that landed on the end vertex so it is not emitted twice
    if samples.len() > 1 && samples[samples.len() - 1].distance_m(&end) < 1e-6 {
        samples.pop();
    }
    samples.push(end);
    samples
}
