use std::f64::consts::{FRAC_1_SQRT_2, PI};

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};

use crate::analysis::summary::quantile;

/// Significance level of the normality and equal-variance checks.
const ALPHA: f64 = 0.05;

/// Test chosen to compare a metric across distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonTest {
    /// Fewer than two distances with values
    #[serde(rename = "insufficient")]
    Insufficient,
    #[serde(rename = "ANOVA")]
    Anova,
    #[serde(rename = "Welch ANOVA")]
    WelchAnova,
    #[serde(rename = "Kruskal-Wallis")]
    KruskalWallis,
}

/// Outcome of comparing one metric across distance groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupComparison {
    pub metric: String,
    pub groups: usize,
    pub test: ComparisonTest,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Tests whether `metric` differs between distances, given `(distance, value)` points.
///
/// Groups whose values all pass a Shapiro-Wilk check are compared with a one-way ANOVA when
/// Levene's test (median centred) finds equal variances, and with Welch's ANOVA otherwise.
/// Any group failing the check, or too small to be checked, switches to Kruskal-Wallis.
/// Statistic and p-value are absent when the chosen test is undefined for the data,
/// e.g. when every value is identical.
pub fn compare_by_distance(points: &[(f64, f64)], metric: &str) -> GroupComparison {
    let groups = group_by_distance(points);
    let mut comparison = GroupComparison {
        metric: metric.to_string(),
        groups: groups.len(),
        test: ComparisonTest::Insufficient,
        statistic: None,
        p_value: None,
    };
    if groups.len() < 2 {
        return comparison;
    }

    let normal = groups
        .iter()
        .all(|g| shapiro_wilk(g).is_some_and(|p| p > ALPHA));
    let (test, outcome) = if normal {
        if levene(&groups).is_some_and(|(_, p)| p > ALPHA) {
            (ComparisonTest::Anova, one_way_anova(&groups))
        } else {
            (ComparisonTest::WelchAnova, welch_anova(&groups))
        }
    } else {
        (ComparisonTest::KruskalWallis, kruskal_wallis(&groups))
    };

    comparison.test = test;
    comparison.statistic = outcome.map(|(statistic, _)| statistic);
    comparison.p_value = outcome.map(|(_, p)| p);
    comparison
}

/// Values per distance, in increasing distance order. Non-finite points are left out.
fn group_by_distance(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let mut points: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(distance, value)| distance.is_finite() && value.is_finite())
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    points
        .chunk_by(|a, b| a.0 == b.0)
        .map(|group| group.iter().map(|(_, value)| *value).collect())
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Evaluates `c[0] + c[1] x + c[2] x² + ...`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// p-value of the Shapiro-Wilk normality test (Royston's approximation).
/// `None` for fewer than three values.
pub(crate) fn shapiro_wilk(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);

    let ssq = sum_of_squares(&x);
    if ssq <= 0.0 {
        // constant sample, nothing to reject
        return Some(1.0);
    }

    let normal = Normal::new(0.0, 1.0).ok()?;
    let nf = n as f64;
    let half = n / 2;
    let coefficients = if n == 3 {
        vec![FRAC_1_SQRT_2]
    } else {
        let m: Vec<f64> = (1..=half)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / nf.sqrt();

        let mut a = vec![0.0; half];
        a[0] = poly(&[0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056], rsn)
            - m[0] / ssumm2;
        let (fac, first) = if n > 5 {
            a[1] = poly(&[0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633], rsn)
                - m[1] / ssumm2;
            let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
                / (1.0 - 2.0 * a[0].powi(2) - 2.0 * a[1].powi(2)))
                .sqrt();
            (fac, 2)
        } else {
            let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a[0].powi(2))).sqrt();
            (fac, 1)
        };
        for i in first..half {
            a[i] = -m[i] / fac;
        }
        a
    };

    let b: f64 = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (b * b / ssq).min(1.0);

    if n == 3 {
        let p = 6.0 / PI * (w.sqrt().asin() - 0.75_f64.sqrt().asin());
        return Some(p.max(0.0));
    }

    let mut w1 = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&[-2.273, 0.459], nf);
        if w1 >= gamma {
            return Some(0.0);
        }
        w1 = -(gamma - w1).ln();
        (
            poly(&[0.5440, -0.39978, 0.025054, -6.714e-4], nf),
            poly(&[1.3822, -0.77857, 0.062767, -0.0020322], nf).exp(),
        )
    } else {
        let ln_n = nf.ln();
        (
            poly(&[-1.5861, -0.31082, -0.083751, 0.0038915], ln_n),
            poly(&[-0.4803, -0.082676, 0.0030302], ln_n).exp(),
        )
    };
    Some(normal.sf((w1 - m) / s))
}

/// F statistic and p-value of a one-way ANOVA.
pub(crate) fn one_way_anova(groups: &[Vec<f64>]) -> Option<(f64, f64)> {
    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let grand = groups.iter().flatten().sum::<f64>() / n;

    let between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand).powi(2))
        .sum();
    let within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();

    let (df1, df2) = (k - 1.0, n - k);
    if df1 <= 0.0 || df2 <= 0.0 || within <= 0.0 {
        return None;
    }
    let f = (between / df1) / (within / df2);
    Some((f, FisherSnedecor::new(df1, df2).ok()?.sf(f)))
}

/// Levene's test for equal variances, centred on the group medians.
pub(crate) fn levene(groups: &[Vec<f64>]) -> Option<(f64, f64)> {
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let mut sorted = g.clone();
            sorted.sort_by(f64::total_cmp);
            let median = quantile(&sorted, 0.5)?;
            Some(g.iter().map(|v| (v - median).abs()).collect::<Vec<f64>>())
        })
        .collect::<Option<_>>()?;
    one_way_anova(&deviations)
}

/// Welch's ANOVA, which does not assume equal variances.
pub(crate) fn welch_anova(groups: &[Vec<f64>]) -> Option<(f64, f64)> {
    let k = groups.len() as f64;
    let mut weighted = Vec::with_capacity(groups.len());
    for g in groups {
        let n = g.len() as f64;
        if n < 2.0 {
            return None;
        }
        let variance = sum_of_squares(g) / (n - 1.0);
        if variance <= 0.0 {
            return None;
        }
        weighted.push((n / variance, mean(g), n));
    }

    let total_weight: f64 = weighted.iter().map(|(w, _, _)| w).sum();
    let weighted_mean = weighted.iter().map(|(w, m, _)| w * m).sum::<f64>() / total_weight;
    let spread = weighted
        .iter()
        .map(|(w, m, _)| w * (m - weighted_mean).powi(2))
        .sum::<f64>()
        / (k - 1.0);
    let lambda: f64 = weighted
        .iter()
        .map(|(w, _, n)| (1.0 - w / total_weight).powi(2) / (n - 1.0))
        .sum();

    let f = spread / (1.0 + 2.0 * (k - 2.0) / (k * k - 1.0) * lambda);
    let df2 = (k * k - 1.0) / (3.0 * lambda);
    Some((f, FisherSnedecor::new(k - 1.0, df2).ok()?.sf(f)))
}

/// Kruskal-Wallis H statistic (tie corrected) and its chi-squared p-value.
pub(crate) fn kruskal_wallis(groups: &[Vec<f64>]) -> Option<(f64, f64)> {
    let mut pooled: Vec<(f64, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(g, values)| values.iter().map(move |v| (*v, g)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pooled.len() as f64;
    let mut rank_sums = vec![0.0; groups.len()];
    let mut ties = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let value = pooled[start].0;
        let end = start + pooled[start..].iter().take_while(|(v, _)| *v == value).count();
        // tied values share the mean of ranks start + 1 ..= end
        let rank = (start + end + 1) as f64 / 2.0;
        let t = (end - start) as f64;
        ties += t.powi(3) - t;
        for (_, g) in &pooled[start..end] {
            rank_sums[*g] += rank;
        }
        start = end;
    }

    let correction = 1.0 - ties / (n.powi(3) - n);
    if correction <= 0.0 {
        return None;
    }
    let h = (12.0 / (n * (n + 1.0))
        * groups
            .iter()
            .zip(&rank_sums)
            .map(|(g, r)| r * r / g.len() as f64)
            .sum::<f64>()
        - 3.0 * (n + 1.0))
        / correction;

    let df = (groups.len() - 1) as f64;
    Some((h, ChiSquared::new(df).ok()?.sf(h)))
}
