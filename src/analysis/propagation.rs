use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DISTANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])(\d+)m(?:$|[^A-Za-z])").expect("distance pattern is valid")
});

/// Reads the distance in metres from a test name such as `10m-2MSPs-1` or `merge/2MSPs-25m`.
/// The digits must not be glued to a preceding letter or digit, and the `m` not followed by a letter.
pub fn distance_from_name(name: &str) -> Option<f64> {
    DISTANCE
        .captures(name)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Integer/fractional decomposition of a symbol timing offset and the sample offsets derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoBreakdown {
    pub sto_int: f64,
    pub sto_frac: f64,
    pub samples: f64,
    pub samples_2: f64,
}

/// Splits `sto` into integer and fractional parts, moving fractions above one half to the next integer.
/// `oversampling` selects the samples-per-symbol factor: 32 for an oversampling of 4, 64 otherwise.
pub fn sto_breakdown(sto: f64, oversampling: u32) -> StoBreakdown {
    // `+ 0.0` normalizes -0.0
    let mut sto_int = sto.trunc() + 0.0;
    let mut sto_frac = sto - sto_int;
    if sto_frac > 0.5 {
        sto_int += 1.0;
        sto_frac -= 1.0;
    }
    let factor = if oversampling == 4 { 32.0 } else { 64.0 };

    StoBreakdown {
        sto_int,
        sto_frac,
        samples: (sto + 0.5) * factor,
        samples_2: sto_int + 0.5 - sto_frac,
    }
}

/// Log-distance path loss fit: `rssi ≈ intercept + slope * log10(distance)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropagationModel {
    pub intercept: f64,
    pub slope: f64,
    /// Path loss exponent, `-slope / 10`
    pub exponent: f64,
    pub points: usize,
}

/// Least-squares fit of RSSI against the decimal logarithm of distance.
/// Points with a non-positive distance or non-finite values are ignored; `None` unless at least two
/// distinct distances remain.
pub fn fit_propagation(points: &[(f64, f64)]) -> Option<PropagationModel> {
    let samples: Vec<(f64, f64)> = points
        .iter()
        .filter(|(distance, rssi)| *distance > 0.0 && distance.is_finite() && rssi.is_finite())
        .map(|(distance, rssi)| (distance.log10(), *rssi))
        .collect();
    if samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = samples.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = samples
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    Some(PropagationModel {
        intercept: mean_y - slope * mean_x,
        slope,
        exponent: -slope / 10.0,
        points: samples.len(),
    })
}
