//! Projectile flight and impact.

use crate::combat::{apply_mitigated_damage, DamageEvent, DamageKind, DamageTarget};
use crate::components::Projectile;
use crate::math::{direction_to, on_field};
use crate::simulation::{Snapshot, TickContext};

/// A projectile resolves once it is closer than this to its impact point.
pub const IMPACT_THRESHOLD: f64 = 1.0;

/// Units closer than this to the impact take the hit when the aimed target
/// is gone.
pub const SPLASH_RADIUS: f64 = 2.0;

/// A projectile with no unit to hit damages the statue within this range.
pub const STATUE_HIT_RADIUS: f64 = 3.0;

/// Move every projectile and resolve the ones that arrived.
///
/// A projectile leaves the list when it goes out of bounds or resolves,
/// whether the resolution hit something or not.
pub(crate) fn advance_projectiles(state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    let in_flight = std::mem::take(&mut state.projectiles);
    let mut kept = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        let direction = direction_to(projectile.x, projectile.target_x);
        projectile.x += direction * projectile.speed * ctx.dt;

        if !on_field(projectile.x) {
            ctx.events.projectiles_expired.push(projectile.id);
            continue;
        }
        if (projectile.x - projectile.target_x).abs() < IMPACT_THRESHOLD {
            resolve_hit(state, &projectile, ctx);
            ctx.events.projectiles_expired.push(projectile.id);
            continue;
        }
        kept.push(projectile);
    }

    state.projectiles = kept;
}

fn resolve_hit(state: &mut Snapshot, projectile: &Projectile, ctx: &mut TickContext<'_>) {
    let enemy = projectile.side.opponent();
    let aimed = projectile.target_id.and_then(|id| {
        state
            .units
            .iter()
            .position(|u| u.id == id && u.is_alive())
    });
    let victim = aimed.or_else(|| {
        state.units.iter().position(|u| {
            u.side == enemy && u.is_alive() && u.distance_to(projectile.x) <= SPLASH_RADIUS
        })
    });

    if let Some(index) = victim {
        let target = &mut state.units[index];
        let amount = apply_mitigated_damage(target, projectile.damage, ctx.now);
        ctx.events.damage.push(DamageEvent::new(
            None,
            DamageTarget::Unit(target.id),
            amount,
            DamageKind::Projectile,
        ));
        return;
    }

    let statue = ctx.config.layout.statue_x(enemy);
    if (projectile.x - statue).abs() <= STATUE_HIT_RADIUS {
        *state.statue_hp.get_mut(enemy) -= projectile.damage;
        ctx.events.damage.push(DamageEvent::new(
            None,
            DamageTarget::Statue(enemy),
            projectile.damage,
            DamageKind::Projectile,
        ));
    }
}
