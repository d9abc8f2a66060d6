//! Per-side plate loading.

use serde::{Deserialize, Serialize};

use crate::models::UserSettings;

const PLATE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlateCount {
    pub weight: f64,
    pub count: u32,
}

/// Plates to load on each side of the bar for `target_weight`, heaviest
/// first.
///
/// Greedy: plates are taken heaviest to lightest whenever they still fit, with
/// no backtracking, so an unreachable remainder is left unloaded. An empty
/// result means the bar alone covers the target.
pub fn plate_breakdown(target_weight: f64, settings: &UserSettings) -> Vec<PlateCount> {
    let mut remaining = (target_weight - settings.barbell_weight) / 2.0;
    if remaining.is_nan() || remaining <= 0.0 {
        return Vec::new();
    }

    let mut inventory: Vec<_> = settings
        .available_plates
        .iter()
        .filter(|p| p.weight > 0.0)
        .collect();
    inventory.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let mut loaded: Vec<PlateCount> = Vec::new();
    let singles = inventory
        .iter()
        .flat_map(|p| std::iter::repeat_n(p.weight, p.quantity as usize));
    for weight in singles {
        if weight > remaining + PLATE_EPSILON {
            continue;
        }
        remaining -= weight;
        match loaded.last_mut() {
            Some(last) if last.weight == weight => last.count += 1,
            _ => loaded.push(PlateCount { weight, count: 1 }),
        }
    }

    loaded
}

/// Total on the bar once `breakdown` is loaded on both sides.
pub fn loaded_weight(barbell_weight: f64, breakdown: &[PlateCount]) -> f64 {
    barbell_weight
        + 2.0
            * breakdown
                .iter()
                .map(|p| p.weight * p.count as f64)
                .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plate;

    fn settings(barbell_weight: f64, plates: &[(f64, u32)]) -> UserSettings {
        UserSettings {
            barbell_weight,
            available_plates: plates
                .iter()
                .map(|&(weight, quantity)| Plate { weight, quantity })
                .collect(),
            ..UserSettings::default()
        }
    }

    fn pc(weight: f64, count: u32) -> PlateCount {
        PlateCount { weight, count }
    }

    #[test]
    fn greedy_uses_heaviest_first() {
        let s = settings(20.0, &[(20.0, 4), (10.0, 2), (5.0, 2)]);
        assert_eq!(plate_breakdown(140.0, &s), vec![pc(20.0, 3)]);
        assert_eq!(plate_breakdown(100.0, &s), vec![pc(20.0, 2)]);
        assert_eq!(plate_breakdown(90.0, &s), vec![pc(20.0, 1), pc(10.0, 1), pc(5.0, 1)]);
    }

    #[test]
    fn bar_alone_gives_nothing() {
        let s = settings(20.0, &[(20.0, 4)]);
        assert!(plate_breakdown(20.0, &s).is_empty());
        assert!(plate_breakdown(15.0, &s).is_empty());
        assert!(plate_breakdown(f64::NAN, &s).is_empty());
    }

    #[test]
    fn inventory_order_does_not_matter() {
        let a = settings(7.0, &[(0.5, 2), (10.0, 4), (2.0, 4), (5.0, 4), (1.0, 4)]);
        let b = settings(7.0, &[(10.0, 4), (5.0, 4), (2.0, 4), (1.0, 4), (0.5, 2)]);
        let expected = vec![pc(10.0, 2), pc(5.0, 1), pc(2.0, 1), pc(0.5, 1)];
        assert_eq!(plate_breakdown(62.0, &a), expected);
        assert_eq!(plate_breakdown(62.0, &b), expected);
    }

    #[test]
    fn unreachable_remainder_is_left() {
        let s = settings(20.0, &[(20.0, 2), (10.0, 2)]);
        let plates = plate_breakdown(65.0, &s);
        assert_eq!(plates, vec![pc(20.0, 1)]);
        assert_eq!(loaded_weight(20.0, &plates), 60.0);
    }

    #[test]
    fn limited_by_quantity() {
        let s = settings(20.0, &[(20.0, 2), (5.0, 4)]);
        // 60 per side, only two 20s and four 5s exist.
        assert_eq!(plate_breakdown(140.0, &s), vec![pc(20.0, 2), pc(5.0, 4)]);
    }

    #[test]
    fn fractional_plates_do_not_drift() {
        let s = settings(20.0, &[(1.25, 4), (0.5, 2), (0.25, 4)]);
        assert_eq!(plate_breakdown(24.5, &s), vec![pc(1.25, 1), pc(0.5, 2)]);
        assert_eq!(plate_breakdown(21.5, &s), vec![pc(0.5, 1), pc(0.25, 1)]);
    }

    #[test]
    fn duplicate_weight_entries_merge() {
        let s = settings(0.0, &[(10.0, 1), (5.0, 1), (10.0, 1)]);
        assert_eq!(plate_breakdown(40.0, &s), vec![pc(10.0, 2)]);
    }

    #[test]
    fn no_plates_configured() {
        let s = settings(0.0, &[]);
        assert!(plate_breakdown(50.0, &s).is_empty());
    }
}
