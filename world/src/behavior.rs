use droidworks_core::Terrain;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{context::Context, entity::Entity};

/// Autonomous behaviour run after an entity's components tick.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Wander in random eight-way steps.
    RandomWalk(RandomWalker),
}

impl Behavior {
    pub(crate) fn tick(&mut self, host: &mut Entity, ctx: &Context<'_>) {
        match self {
            Self::RandomWalk(walker) => walker.tick(host, ctx),
        }
    }
}

/// Seeded random wanderer.
#[derive(Clone, Debug)]
pub struct RandomWalker {
    rng: ChaCha8Rng,
    think_interval: u32,
    cooldown: u32,
}

const ATTEMPTS: usize = 8;

impl RandomWalker {
    /// Walker stepping every tick, driven by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            think_interval: 1,
            cooldown: 0,
        }
    }

    /// Steps only every `interval` ticks.
    #[must_use]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.think_interval = interval.max(1);
        self
    }

    /// Ticks between steps.
    #[must_use]
    pub const fn think_interval(&self) -> u32 {
        self.think_interval
    }

    fn tick(&mut self, host: &mut Entity, ctx: &Context<'_>) {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return;
        }
        self.cooldown = self.think_interval - 1;
        if host.chassis().pending_intent().is_some() {
            return;
        }

        let tilemap = ctx.tilemap();
        let footprint = host.chassis().footprint();
        for _ in 0..ATTEMPTS {
            let dx = self.rng.gen_range(-1..=1);
            let dy = self.rng.gen_range(-1..=1);
            if dx == 0 && dy == 0 {
                continue;
            }
            let target = host.location().offset(dx, dy);
            if footprint.cells(target).all(|cell| tilemap.is_passable(cell)) {
                if host.request_move(dx, dy).is_err() {
                    host.warn(format!("Random step ({dx}, {dy}) was rejected."));
                }
                return;
            }
        }
    }
}
