//! Dip picking on a normalized difference function.
//!
//! The YIN score is a *minimum* detector: `0` means the signal repeats perfectly
//! after `tau` samples. Instead of stopping at the first dip under the threshold,
//! every disjoint dip is collected and [choose_candidate] arbitrates between them.
use crate::float::Float;

/// A local minimum of the normalized difference function below the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<T: Float> {
    pub tau: usize,
    pub value: T,
}

/// Collect the bottom of every dip of `cmndf` that falls below `threshold`,
/// scanning lags `min_tau..cmndf.len() - 1`.
///
/// When a value under the threshold is found, the scan walks forward while
/// the next value is strictly smaller, records the bottom, and resumes
/// past the rest of the dip, i.e. while values stay under the threshold. The
/// walk never moves past the last element of `cmndf`.
pub fn collect_candidates<T: Float>(cmndf: &[T], min_tau: usize, threshold: T) -> Vec<Candidate<T>> {
    let max_tau = cmndf.len();
    let mut candidates = Vec::new();
    let mut tau = min_tau;

    while tau + 1 < max_tau {
        if cmndf[tau] < threshold {
            while tau + 1 < max_tau && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }
            candidates.push(Candidate {
                tau,
                value: cmndf[tau],
            });
            while tau + 1 < max_tau && cmndf[tau + 1] < threshold {
                tau += 1;
            }
        }
        tau += 1;
    }

    candidates
}

/// How [choose_candidate] weighs a later (longer lag) dip against the current best.
#[derive(Debug, Clone, Copy)]
pub struct SelectionFactors<T: Float> {
    /// A candidate below `best.value * strong` replaces the best outright.
    pub strong: T,
    /// A candidate below `best.value * similar` ...
    pub similar: T,
    /// ... replaces the best if its lag also exceeds `best.tau * fundamental_tau`.
    pub fundamental_tau: T,
    /// Candidates at an integer multiple of the best lag only replace it when they
    /// are `strong`er *and* deeper by more than this margin. `None` applies the two
    /// rules above to every candidate.
    pub multiple_margin: Option<T>,
}

/// Whether `tau` sits at `k * base` for some integer `k >= 2`, allowing one
/// sample of rounding per period.
pub fn is_lag_multiple(tau: usize, base: usize) -> bool {
    if base == 0 {
        return false;
    }
    let k = (tau + base / 2) / base;
    k >= 2 && tau.abs_diff(k * base) <= k
}

/// Left-to-right fold over `candidates`, seeded with the first one.
///
/// Harmonics of a tone produce dips at shorter lags than the fundamental, so a
/// comparably deep dip at a much longer lag wins over the current best.
///
/// A periodic signal also dips at every multiple of its period, with depths that
/// only differ by how well the multiple lines up with the sample grid. With
/// `multiple_margin` set, such echoes must beat the best by a real margin.
pub fn choose_candidate<T: Float>(
    candidates: &[Candidate<T>],
    factors: &SelectionFactors<T>,
) -> Option<Candidate<T>> {
    let (first, rest) = candidates.split_first()?;

    Some(rest.iter().fold(*first, |best, c| {
        let stronger = c.value < best.value * factors.strong;
        let replace = match factors.multiple_margin {
            Some(margin) if is_lag_multiple(c.tau, best.tau) => {
                stronger && best.value - c.value > margin
            }
            _ => {
                let fundamental = c.value < best.value * factors.similar
                    && T::from_len(c.tau) > T::from_len(best.tau) * factors.fundamental_tau;
                stronger || fundamental
            }
        };
        if replace {
            *c
        } else {
            best
        }
    }))
}

/// Refine `tau` with a parabola through `data[tau - 1]`, `data[tau]`, `data[tau + 1]`.
///
/// Neighbours outside of `data` are replaced by the center value. A flat
/// neighbourhood leaves `tau` unchanged.
pub fn refine_tau<T: Float>(data: &[T], tau: usize) -> T {
    let s1 = data[tau];
    let s0 = if tau > 0 { data[tau - 1] } else { s1 };
    let s2 = if tau + 1 < data.len() { data[tau + 1] } else { s1 };

    let two = T::lit(2.0);
    let denom = two * (two * s1 - s2 - s0);
    if denom != T::zero() {
        T::from_len(tau) + (s2 - s0) / denom
    } else {
        T::from_len(tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors() -> SelectionFactors<f64> {
        SelectionFactors {
            strong: 0.8,
            similar: 1.2,
            fundamental_tau: 1.5,
            multiple_margin: None,
        }
    }

    fn guarded() -> SelectionFactors<f64> {
        SelectionFactors {
            multiple_margin: Some(0.02),
            ..factors()
        }
    }

    #[test]
    fn collects_every_disjoint_dip() {
        let cmndf = vec![1.0, 0.9, 0.15, 0.1, 0.3, 0.8, 0.12, 0.05, 0.07, 0.9, 1.0];
        let candidates = collect_candidates(&cmndf, 1, 0.2);
        assert_eq!(
            candidates,
            vec![
                Candidate { tau: 3, value: 0.1 },
                Candidate { tau: 7, value: 0.05 },
            ]
        );
    }

    #[test]
    fn no_candidates_above_threshold() {
        let cmndf = vec![1.0, 0.9, 0.5, 0.4, 0.6, 0.8];
        assert!(collect_candidates(&cmndf, 1, 0.2).is_empty());
        assert_eq!(choose_candidate::<f64>(&[], &factors()), None);
    }

    #[test]
    fn descent_stops_at_last_lag() {
        // Monotonically falling to the end: the dip bottom is the last valid lag.
        let cmndf = vec![1.0, 0.5, 0.19, 0.15, 0.1, 0.05];
        let candidates = collect_candidates(&cmndf, 1, 0.2);
        assert_eq!(candidates, vec![Candidate { tau: 5, value: 0.05 }]);
    }

    #[test]
    fn scan_starts_at_min_tau() {
        let cmndf = vec![1.0, 0.1, 0.5, 0.9, 0.15, 0.6, 1.0];
        let candidates = collect_candidates(&cmndf, 2, 0.2);
        assert_eq!(candidates, vec![Candidate { tau: 4, value: 0.15 }]);
    }

    #[test]
    fn prefers_the_longer_lag_when_comparable() {
        // Harmonic dip at 50, fundamental at 100 only slightly shallower.
        let candidates = vec![
            Candidate { tau: 50, value: 0.10 },
            Candidate { tau: 100, value: 0.11 },
        ];
        let best = choose_candidate(&candidates, &factors()).unwrap();
        assert_eq!(best.tau, 100);
    }

    #[test]
    fn keeps_the_shorter_lag_when_longer_is_much_weaker() {
        let candidates = vec![
            Candidate { tau: 50, value: 0.05 },
            Candidate { tau: 100, value: 0.15 },
        ];
        let best = choose_candidate(&candidates, &factors()).unwrap();
        assert_eq!(best.tau, 50);
    }

    #[test]
    fn nearby_lag_needs_to_be_strictly_stronger() {
        let candidates = vec![
            Candidate { tau: 80, value: 0.10 },
            Candidate { tau: 100, value: 0.09 },
            Candidate { tau: 110, value: 0.05 },
        ];
        // 100 is not 1.5x longer and not 20% deeper; 110 is more than 20% deeper.
        let best = choose_candidate(&candidates, &factors()).unwrap();
        assert_eq!(best, Candidate { tau: 110, value: 0.05 });
    }

    #[test]
    fn lag_multiples() {
        assert!(is_lag_multiple(200, 100));
        assert!(is_lag_multiple(401, 100));
        assert!(is_lag_multiple(147, 73));
        assert!(!is_lag_multiple(150, 100));
        assert!(!is_lag_multiple(100, 100));
        assert!(!is_lag_multiple(110, 100));
        assert!(!is_lag_multiple(10, 0));
    }

    #[test]
    fn period_echoes_do_not_replace_the_period() {
        // A pure tone dips at every multiple of its period; grid alignment decides depth.
        let candidates = vec![
            Candidate { tau: 100, value: 1.0e-4 },
            Candidate { tau: 200, value: 1.1e-4 },
            Candidate { tau: 401, value: 1.6e-5 },
        ];
        assert_eq!(choose_candidate(&candidates, &guarded()).unwrap().tau, 100);
        // Without the guard the echoes win.
        assert_eq!(choose_candidate(&candidates, &factors()).unwrap().tau, 401);
    }

    #[test]
    fn harmonic_lock_still_moves_to_the_fundamental() {
        // Locked on the 2nd harmonic: shallow dip at T/2, deep dip at T.
        let candidates = vec![
            Candidate { tau: 50, value: 0.16 },
            Candidate { tau: 100, value: 0.01 },
        ];
        assert_eq!(choose_candidate(&candidates, &guarded()).unwrap().tau, 100);
    }

    #[test]
    fn shallow_harmonic_dip_yields_to_deep_period() {
        // The T/2 dip is already well under the threshold; the dip at T is near zero.
        let candidates = vec![
            Candidate { tau: 50, value: 0.08 },
            Candidate { tau: 100, value: 0.001 },
        ];
        assert_eq!(choose_candidate(&candidates, &guarded()).unwrap().tau, 100);
    }

    #[test]
    fn non_multiples_follow_the_plain_rules_when_guarded() {
        let candidates = vec![
            Candidate { tau: 40, value: 0.10 },
            Candidate { tau: 100, value: 0.11 },
        ];
        assert_eq!(choose_candidate(&candidates, &guarded()).unwrap().tau, 100);
    }

    #[test]
    fn symmetric_dip_refines_to_its_center() {
        let tau0 = 7;
        let data: Vec<f64> = (0..16)
            .map(|t| {
                let x = t as f64 - tau0 as f64;
                0.05 + 0.01 * x * x
            })
            .collect();
        assert_eq!(refine_tau(&data, tau0), tau0 as f64);
    }

    #[test]
    fn asymmetric_dip_shifts_toward_lower_neighbour() {
        let data = vec![0.5, 0.2, 0.1, 0.15, 0.6];
        let refined = refine_tau(&data, 2);
        assert!(refined > 2.0 && refined < 2.5);
    }

    #[test]
    fn edges_repeat_the_center_value() {
        let data = vec![0.1, 0.3, 0.4];
        // Left neighbour clamped to 0.1: s0 = s1 = 0.1, s2 = 0.3.
        let expected = (0.3 - 0.1) / (2.0 * (2.0 * 0.1 - 0.3 - 0.1));
        assert_eq!(refine_tau(&data, 0), expected);

        let flat = vec![0.2, 0.2, 0.2];
        assert_eq!(refine_tau(&flat, 2), 2.0);
    }
}
