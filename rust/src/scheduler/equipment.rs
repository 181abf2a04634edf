//! Matching workflow steps to equipment inventory.

use crate::models::EquipmentSpec;

/// Decides how many equipment units can serve a step.
///
/// Changing the matching rule changes scheduling outcomes, so it sits
/// behind this trait instead of being inlined in the scheduler.
pub trait EquipmentMatcher: Send + Sync {
    /// Units applicable to `step_name`, or `None` if nothing matches.
    fn units_for(&self, step_name: &str, equipment: &[EquipmentSpec]) -> Option<usize>;
}

/// Case-insensitive substring containment in either direction between the
/// step name and the equipment name. The first matching entry wins.
///
/// "XRD Scan" matches "xrd"; "XRF" matches "XRF Spectrometer".
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringMatcher;

impl EquipmentMatcher for SubstringMatcher {
    fn units_for(&self, step_name: &str, equipment: &[EquipmentSpec]) -> Option<usize> {
        let step = step_name.to_lowercase();
        equipment.iter().find_map(|spec| {
            let name = spec.name.to_lowercase();
            (step.contains(&name) || name.contains(&step)).then_some(spec.quantity)
        })
    }
}

/// Equipment capacity resolved for one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipmentUnits {
    /// No inventory supplied: equipment never constrains the step.
    Unbounded,
    Units(usize),
}

/// Resolve equipment capacity for a step. An inventory without a match
/// yields a single unit.
pub fn resolve_units(
    matcher: &dyn EquipmentMatcher,
    step_name: &str,
    equipment: Option<&[EquipmentSpec]>,
) -> EquipmentUnits {
    match equipment {
        None => EquipmentUnits::Unbounded,
        Some(list) => EquipmentUnits::Units(matcher.units_for(step_name, list).unwrap_or(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Vec<EquipmentSpec> {
        vec![
            EquipmentSpec::new("Rock Saw", 2),
            EquipmentSpec::new("XRD", 3),
            EquipmentSpec::new("XRF Spectrometer", 1),
        ]
    }

    #[test]
    fn test_step_contains_equipment_name() {
        assert_eq!(SubstringMatcher.units_for("xrd scan", &inventory()), Some(3));
    }

    #[test]
    fn test_equipment_contains_step_name() {
        assert_eq!(SubstringMatcher.units_for("XRF", &inventory()), Some(1));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(SubstringMatcher.units_for("Data Review", &inventory()), None);
    }

    #[test]
    fn test_first_match_wins() {
        let list = vec![EquipmentSpec::new("Saw", 4), EquipmentSpec::new("Rock Saw", 2)];
        assert_eq!(SubstringMatcher.units_for("Rock Saw Cutting", &list), Some(4));
    }

    #[test]
    fn test_resolve_units_defaults() {
        let list = inventory();
        assert_eq!(
            resolve_units(&SubstringMatcher, "XRD Scan", None),
            EquipmentUnits::Unbounded
        );
        assert_eq!(
            resolve_units(&SubstringMatcher, "Sample Entry", Some(&list)),
            EquipmentUnits::Units(1)
        );
        assert_eq!(
            resolve_units(&SubstringMatcher, "XRD Scan", Some(&list)),
            EquipmentUnits::Units(3)
        );
    }
}
