//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the simulation.

use proptest::prelude::*;
use siege_core::actions::Action;
use siege_core::components::{Command, Side, UnitType};

/// Any unit type.
pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
    proptest::sample::select(UnitType::ALL.to_vec())
}

/// Either side.
pub fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Player), Just(Side::Enemy)]
}

/// Any standing command.
pub fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Attack),
        Just(Command::Defend),
        Just(Command::Retreat)
    ]
}

/// A field position.
pub fn arb_position() -> impl Strategy<Value = f64> {
    0.0f64..=100.0
}

/// Any action, mostly recruits, occasionally an unknown kind.
pub fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        6 => (arb_unit_type(), arb_side()).prop_map(|(t, s)| Action::recruit(t, s)),
        3 => (arb_side(), arb_command()).prop_map(|(s, c)| Action::command(s, c)),
        1 => Just(Action::Unknown),
    ]
}

/// Actions tagged with the tick they are submitted before.
pub fn arb_timed_actions(max_tick: u64, max_len: usize) -> impl Strategy<Value = Vec<(u64, Action)>> {
    proptest::collection::vec((1..=max_tick, arb_action()), 0..max_len).prop_map(|mut v| {
        v.sort_by_key(|(tick, _)| *tick);
        v
    })
}

/// A unit placement.
pub fn arb_placement() -> impl Strategy<Value = (UnitType, Side, f64)> {
    (arb_unit_type(), arb_side(), arb_position())
}

/// A list of unit placements.
pub fn arb_placements(max_units: usize) -> impl Strategy<Value = Vec<(UnitType, Side, f64)>> {
    proptest::collection::vec(arb_placement(), 1..max_units)
}
