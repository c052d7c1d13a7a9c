//! Cosmetic particles and the world flash.

use crate::components::{Particle, ParticleKind};
use crate::constants::FLASH_DECAY;
use crate::systems::clock::WorldFlash;
use bevy_ecs::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Scatter `count` motionless particles in a square of side `spread`.
pub fn spawn_burst(
    commands: &mut Commands,
    rng: &mut ChaCha8Rng,
    kind: ParticleKind,
    (x, y): (f32, f32),
    count: usize,
    spread: f32,
    life: u32,
) {
    for _ in 0..count {
        let px = x + (rng.gen::<f32>() - 0.5) * spread;
        let py = y + (rng.gen::<f32>() - 0.5) * spread;
        let size = 5.0 + rng.gen::<f32>() * 8.0;
        commands.spawn(Particle::still(kind, px, py, life, size));
    }
}

/// Slow, wide cloud left behind by a nuke.
pub fn spawn_cloud(commands: &mut Commands, rng: &mut ChaCha8Rng, (x, y): (f32, f32), count: usize) {
    for _ in 0..count {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = rng.gen_range(5.0..20.0);
        let start = rng.gen_range(0.0..100.0);
        commands.spawn(Particle {
            kind: ParticleKind::Cloud,
            x: x + angle.cos() * start,
            y: y + angle.sin() * start,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            drag: rng.gen_range(0.95..0.98),
            life: rng.gen_range(250..400),
            size: rng.gen_range(30.0..90.0),
        });
    }
}

/// Integrates and ages particles, and fades the flash.
pub fn particle_system(
    mut commands: Commands,
    mut flash: ResMut<WorldFlash>,
    mut particles: Query<(Entity, &mut Particle)>,
) {
    if flash.0 > 0.0 {
        flash.0 = (flash.0 - FLASH_DECAY).max(0.0);
    }

    for (entity, mut p) in particles.iter_mut() {
        p.x += p.vx;
        p.y += p.vy;
        p.vx *= p.drag;
        p.vy *= p.drag;
        p.life = p.life.saturating_sub(1);
        if p.life == 0 {
            commands.entity(entity).despawn();
        }
    }
}
