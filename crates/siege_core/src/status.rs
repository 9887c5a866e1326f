//! Status effects carried by units.
//!
//! Each unit holds a small set of typed effects, at most one per kind.
//! [`StatusEffects::resolve`] walks them once per tick in precedence order:
//! stun, then root, then poison, then slow. A stunned unit short-circuits the
//! pass, so poison does not tick while stunned.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::Millis;

/// Flat damage dealt by one poison tick.
pub const POISON_TICK_DAMAGE: f64 = 15.0;

/// Minimum time between poison ticks.
pub const POISON_TICK_INTERVAL_MS: Millis = 1_000;

/// Continuous chip damage taken while rooted.
pub const ROOT_DAMAGE_PER_SECOND: f64 = 10.0;

/// Speed multiplier applied while slowed.
pub const SLOW_FACTOR: f64 = 0.7;

/// Kind of effect, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    /// No action at all.
    Stun,
    /// No movement; attacks still allowed.
    Root,
    /// Damage over time in discrete stacks.
    Poison,
    /// Reduced movement speed.
    Slow,
}

/// One active effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Stunned until the given time.
    Stun {
        /// Expiry timestamp (exclusive).
        until: Millis,
    },
    /// Rooted until the given time.
    Root {
        /// Expiry timestamp (exclusive).
        until: Millis,
    },
    /// Poisoned for a number of remaining ticks.
    Poison {
        /// Ticks left.
        stacks: u32,
        /// When the previous tick landed.
        last_tick: Option<Millis>,
    },
    /// Slowed until the given time.
    Slow {
        /// Expiry timestamp (exclusive).
        until: Millis,
        /// Velocity multiplier.
        factor: f64,
    },
}

impl StatusEffect {
    /// Kind of this effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            StatusEffect::Stun { .. } => EffectKind::Stun,
            StatusEffect::Root { .. } => EffectKind::Root,
            StatusEffect::Poison { .. } => EffectKind::Poison,
            StatusEffect::Slow { .. } => EffectKind::Slow,
        }
    }

    /// Whether the effect still does anything at `now`.
    #[must_use]
    pub fn is_active(&self, now: Millis) -> bool {
        match *self {
            StatusEffect::Stun { until }
            | StatusEffect::Root { until }
            | StatusEffect::Slow { until, .. } => until > now,
            StatusEffect::Poison { stacks, .. } => stacks > 0,
        }
    }
}

impl Hash for StatusEffect {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match *self {
            StatusEffect::Stun { until } | StatusEffect::Root { until } => until.hash(state),
            StatusEffect::Poison { stacks, last_tick } => {
                stacks.hash(state);
                last_tick.hash(state);
            }
            StatusEffect::Slow { until, factor } => {
                until.hash(state);
                factor.to_bits().hash(state);
            }
        }
    }
}

/// Outcome of one ordered pass over a unit's effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPass {
    /// Unit may not act this tick.
    pub stunned: bool,
    /// Unit may not move this tick.
    pub rooted: bool,
    /// Poison damage that landed this tick.
    pub poison_damage: Option<f64>,
    /// Multiplier for the unit's target velocity.
    pub speed_factor: f64,
}

impl EffectPass {
    const STUNNED: Self = Self {
        stunned: true,
        rooted: false,
        poison_damage: None,
        speed_factor: 0.0,
    };
}

/// The set of effects on one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    entries: Vec<StatusEffect>,
}

impl StatusEffects {
    /// No effects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, sorted by precedence.
    #[must_use]
    pub fn entries(&self) -> &[StatusEffect] {
        &self.entries
    }

    /// Whether no effect is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, kind: EffectKind) -> Option<&StatusEffect> {
        self.entries.iter().find(|e| e.kind() == kind)
    }

    /// Insert or overwrite the entry of the same kind.
    pub fn apply(&mut self, effect: StatusEffect) {
        let kind = effect.kind();
        match self.entries.iter_mut().find(|e| e.kind() == kind) {
            Some(existing) => *existing = effect,
            None => {
                self.entries.push(effect);
                self.entries.sort_by_key(StatusEffect::kind);
            }
        }
    }

    /// Stun for `duration_ms` starting now. Overwrites any previous stun.
    pub fn stun(&mut self, now: Millis, duration_ms: Millis) {
        self.apply(StatusEffect::Stun {
            until: now + duration_ms,
        });
    }

    /// Root for `duration_ms` starting now.
    pub fn root(&mut self, now: Millis, duration_ms: Millis) {
        self.apply(StatusEffect::Root {
            until: now + duration_ms,
        });
    }

    /// Slow for `duration_ms` starting now.
    pub fn slow(&mut self, now: Millis, duration_ms: Millis) {
        self.apply(StatusEffect::Slow {
            until: now + duration_ms,
            factor: SLOW_FACTOR,
        });
    }

    /// Set the remaining poison stacks.
    ///
    /// The tick clock carries over from an existing poison; a fresh poison
    /// ticks on the unit's next resolution.
    pub fn poison(&mut self, stacks: u32) {
        let last_tick = match self.find(EffectKind::Poison) {
            Some(StatusEffect::Poison { last_tick, .. }) => *last_tick,
            _ => None,
        };
        self.apply(StatusEffect::Poison { stacks, last_tick });
    }

    /// Stunned at `now`.
    #[must_use]
    pub fn is_stunned(&self, now: Millis) -> bool {
        self.find(EffectKind::Stun).is_some_and(|e| e.is_active(now))
    }

    /// Rooted at `now`.
    #[must_use]
    pub fn is_rooted(&self, now: Millis) -> bool {
        self.find(EffectKind::Root).is_some_and(|e| e.is_active(now))
    }

    /// Slowed at `now`.
    #[must_use]
    pub fn is_slowed(&self, now: Millis) -> bool {
        self.find(EffectKind::Slow).is_some_and(|e| e.is_active(now))
    }

    /// Remaining poison stacks.
    #[must_use]
    pub fn poison_stacks(&self) -> u32 {
        match self.find(EffectKind::Poison) {
            Some(StatusEffect::Poison { stacks, .. }) => *stacks,
            _ => 0,
        }
    }

    /// Expiry of the current stun, if any.
    #[must_use]
    pub fn stunned_until(&self) -> Option<Millis> {
        match self.find(EffectKind::Stun) {
            Some(StatusEffect::Stun { until }) => Some(*until),
            _ => None,
        }
    }

    /// Run the ordered pass for this tick.
    ///
    /// Expired entries are dropped first. Poison consumes a stack when it
    /// ticks; the caller applies the returned damage.
    pub fn resolve(&mut self, now: Millis) -> EffectPass {
        self.entries.retain(|e| e.is_active(now));

        if self.is_stunned(now) {
            return EffectPass::STUNNED;
        }

        let rooted = self.is_rooted(now);

        let mut poison_damage = None;
        for entry in &mut self.entries {
            if let StatusEffect::Poison { stacks, last_tick } = entry {
                let due = last_tick
                    .map_or(true, |t| now.saturating_sub(t) >= POISON_TICK_INTERVAL_MS);
                if *stacks > 0 && due {
                    *stacks -= 1;
                    *last_tick = Some(now);
                    poison_damage = Some(POISON_TICK_DAMAGE);
                }
            }
        }
        self.entries.retain(|e| e.is_active(now));

        let speed_factor = match self.find(EffectKind::Slow) {
            Some(StatusEffect::Slow { factor, .. }) => *factor,
            _ => 1.0,
        };

        EffectPass {
            stunned: false,
            rooted,
            poison_damage,
            speed_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_stay_in_precedence_order() {
        let mut effects = StatusEffects::new();
        effects.slow(0, 1_000);
        effects.poison(3);
        effects.stun(0, 500);
        let kinds: Vec<_> = effects.entries().iter().map(StatusEffect::kind).collect();
        assert_eq!(
            kinds,
            vec![EffectKind::Stun, EffectKind::Poison, EffectKind::Slow]
        );
    }

    #[test]
    fn test_stun_short_circuits_poison() {
        let mut effects = StatusEffects::new();
        effects.poison(3);
        effects.stun(1_000, 1_500);

        let pass = effects.resolve(1_200);
        assert!(pass.stunned);
        assert_eq!(pass.poison_damage, None);
        assert_eq!(effects.poison_stacks(), 3);
    }

    #[test]
    fn test_poison_ticks_once_per_second() {
        let mut effects = StatusEffects::new();
        effects.poison(3);

        assert_eq!(effects.resolve(5_000).poison_damage, Some(POISON_TICK_DAMAGE));
        assert_eq!(effects.resolve(5_500).poison_damage, None);
        assert_eq!(effects.resolve(6_000).poison_damage, Some(POISON_TICK_DAMAGE));
        assert_eq!(effects.resolve(7_000).poison_damage, Some(POISON_TICK_DAMAGE));
        assert_eq!(effects.poison_stacks(), 0);
        assert_eq!(effects.resolve(8_000).poison_damage, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_reapplied_poison_keeps_tick_clock() {
        let mut effects = StatusEffects::new();
        effects.poison(3);
        effects.resolve(1_000);
        effects.poison(3);
        assert_eq!(effects.resolve(1_500).poison_damage, None);
        assert_eq!(effects.poison_stacks(), 3);
    }

    #[test]
    fn test_root_and_slow_expire() {
        let mut effects = StatusEffects::new();
        effects.root(0, 2_500);
        effects.slow(0, 3_000);

        let pass = effects.resolve(2_499);
        assert!(pass.rooted);
        assert!((pass.speed_factor - SLOW_FACTOR).abs() < f64::EPSILON);

        let pass = effects.resolve(2_500);
        assert!(!pass.rooted);
        assert!((pass.speed_factor - SLOW_FACTOR).abs() < f64::EPSILON);

        let pass = effects.resolve(3_000);
        assert!((pass.speed_factor - 1.0).abs() < f64::EPSILON);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_restun_overwrites_expiry() {
        let mut effects = StatusEffects::new();
        effects.stun(0, 1_500);
        effects.stun(100, 200);
        assert_eq!(effects.stunned_until(), Some(300));
    }
}
