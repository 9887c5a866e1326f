//! Enemy queries over the unit list.
//!
//! Every query walks the list in insertion order. Sorting uses a stable
//! sort, so equal distances resolve to the earlier unit.

use crate::components::{Side, Unit};

/// An enemy seen by a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    /// Position in the unit list.
    pub index: usize,
    /// Absolute distance from the observer.
    pub distance: f64,
}

/// Live units of `side`'s opponent within `range` of `x`, nearest first.
#[must_use]
pub fn enemies_near(units: &[Unit], side: Side, x: f64, range: f64) -> Vec<Sighting> {
    let mut found: Vec<Sighting> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.side != side && u.is_alive())
        .map(|(index, u)| Sighting {
            index,
            distance: u.distance_to(x),
        })
        .filter(|s| s.distance <= range)
        .collect();
    found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    found
}

/// Indices of live opposing units matching `pred`, in list order.
#[must_use]
pub fn enemies_where<F>(units: &[Unit], side: Side, pred: F) -> Vec<usize>
where
    F: Fn(&Unit) -> bool,
{
    units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.side != side && u.is_alive() && pred(u))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UnitType;

    fn unit(id: u64, side: Side, x: f64) -> Unit {
        Unit::new(id, UnitType::Small, side, x, 100.0)
    }

    #[test]
    fn test_nearest_first_with_stable_ties() {
        let units = vec![
            unit(1, Side::Enemy, 60.0),
            unit(2, Side::Enemy, 40.0),
            unit(3, Side::Enemy, 55.0),
            unit(4, Side::Player, 51.0),
        ];
        let seen = enemies_near(&units, Side::Player, 50.0, 30.0);
        let order: Vec<usize> = seen.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_range_is_inclusive_and_skips_dead() {
        let mut units = vec![unit(1, Side::Enemy, 80.0), unit(2, Side::Enemy, 60.0)];
        units[1].hp = 0.0;
        let seen = enemies_near(&units, Side::Player, 50.0, 30.0);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].index, 0);
    }

    #[test]
    fn test_enemies_where_keeps_list_order() {
        let units = vec![
            unit(1, Side::Enemy, 70.0),
            unit(2, Side::Player, 50.0),
            unit(3, Side::Enemy, 52.0),
        ];
        let hits = enemies_where(&units, Side::Player, |u| u.x > 51.0);
        assert_eq!(hits, vec![0, 2]);
    }
}
