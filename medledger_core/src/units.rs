//! Dose unit conversion.
//!
//! Milligrams are the canonical storage unit. Every other unit (pills,
//! millilitres, sprays, drops, puffs, applications) is treated as a
//! pill-equivalent and scaled by the medication's single mg-per-pill rate.

use crate::DosageUnit;

/// Convert `amount` in `unit` to milligrams at `mg_per_pill`
pub fn to_mg(amount: f64, unit: DosageUnit, mg_per_pill: f64) -> f64 {
    match unit {
        DosageUnit::Mg => amount,
        DosageUnit::Pill
        | DosageUnit::Ml
        | DosageUnit::Spray
        | DosageUnit::Drop
        | DosageUnit::Puff
        | DosageUnit::Application => amount * mg_per_pill,
    }
}
