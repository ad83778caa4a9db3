/// Swarm AI: every invader shares one direction and one speed.
///
/// Movement and firing are swarm-level decisions; individual invaders carry
/// no behaviour of their own.
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::entities::{
    Appearance, Bullet, BulletOwner, Invader, INVADER_BULLET_DY, INVADER_HEIGHT, INVADER_WIDTH,
};
use crate::geometry::Playfield;

const FORMATION_ORIGIN: (f32, f32) = (80.0, 60.0);
const FORMATION_H_SPACING: f32 = 50.0;
const FORMATION_V_SPACING: f32 = 40.0;

/// Direction flips when any invader gets this close to a side.
const EDGE_MARGIN: i32 = 10;

const SPEED_PER_KILL: f32 = 0.05;
/// Elapsed milliseconds per extra pixel-per-tick of speed.
const MS_PER_SPEED_STEP: f32 = 5000.0;

const MIN_FIRE_PROBABILITY: f64 = 0.02;
const MAX_FIRE_PROBABILITY: f64 = 0.08;

#[derive(Clone, Debug)]
pub struct InvaderManager {
    invaders: Vec<Invader>,
    /// +1 = rightward, -1 = leftward.
    direction: f32,
    base_speed: f32,
    speed: f32,
    initial_count: usize,
    elapsed_ms: u64,
    field: Playfield,
}

impl InvaderManager {
    /// Build a `rows × cols` formation.  Invader type cycles with the row
    /// (`row % 3`) and picks its appearance from `looks`.
    pub fn new(
        field: Playfield,
        rows: usize,
        cols: usize,
        base_speed: f32,
        looks: &[Appearance; 3],
    ) -> Self {
        let mut invaders = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let kind = (row % 3) as u8;
                invaders.push(Invader::new(
                    FORMATION_ORIGIN.0 + col as f32 * FORMATION_H_SPACING,
                    FORMATION_ORIGIN.1 + row as f32 * FORMATION_V_SPACING,
                    kind,
                    looks[kind as usize].clone(),
                ));
            }
        }
        Self::from_invaders(field, invaders, base_speed)
    }

    /// Manage an arbitrary set of invaders; the initial count is taken from it.
    pub fn from_invaders(field: Playfield, invaders: Vec<Invader>, base_speed: f32) -> Self {
        let initial_count = invaders.len();
        InvaderManager {
            invaders,
            direction: 1.0,
            base_speed,
            speed: base_speed,
            initial_count,
            elapsed_ms: 0,
            field,
        }
    }

    pub fn invaders(&self) -> &[Invader] {
        &self.invaders
    }

    /// Remove and return the invader at `index` (creation order).
    pub fn remove(&mut self, index: usize) -> Invader {
        self.invaders.remove(index)
    }

    /// Keep only the invaders for which `keep` returns true.
    pub fn retain_indexed(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut idx = 0;
        self.invaders.retain(|_| {
            let kept = keep(idx);
            idx += 1;
            kept
        });
    }

    pub fn is_cleared(&self) -> bool {
        self.invaders.is_empty()
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn killed(&self) -> usize {
        self.initial_count.saturating_sub(self.invaders.len())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Record how long the wave has been running.
    pub fn set_elapsed(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = elapsed_ms;
    }

    /// Move the whole swarm sideways, bounce off the margins, then retune
    /// the speed for the next tick.
    pub fn update(&mut self) {
        if self.invaders.is_empty() {
            self.speed = self.base_speed;
            return;
        }

        let step = self.speed * self.direction;
        let right_limit = self.field.width as i32 - EDGE_MARGIN;
        let mut hit_edge = false;
        for inv in &mut self.invaders {
            inv.x += step;
            let rect = inv.rect();
            if rect.right() >= right_limit || rect.left() <= EDGE_MARGIN {
                hit_edge = true;
            }
        }
        if hit_edge {
            self.direction = -self.direction;
            debug!(direction = self.direction, speed = self.speed, "swarm reversed");
        }

        self.speed = self.speed_for(self.killed(), self.elapsed_ms);
    }

    /// `base + 0.05 per kill + 1 per 5 seconds`.
    pub fn speed_for(&self, killed: usize, elapsed_ms: u64) -> f32 {
        self.base_speed + SPEED_PER_KILL * killed as f32 + elapsed_ms as f32 / MS_PER_SPEED_STEP
    }

    /// Per-tick chance that the swarm fires.  Rises from 0.02 toward 0.08
    /// as the swarm thins; zero once it is gone.
    pub fn fire_probability(&self) -> f64 {
        if self.invaders.is_empty() || self.initial_count == 0 {
            return 0.0;
        }
        let ratio = self.invaders.len() as f64 / self.initial_count as f64;
        (MAX_FIRE_PROBABILITY * (1.0 - ratio)).max(MIN_FIRE_PROBABILITY)
    }

    /// Maybe fire one downward bullet from a uniformly random invader's
    /// lower-centre.
    pub fn shoot_random(&self, rng: &mut impl Rng) -> Option<Bullet> {
        let p = self.fire_probability();
        if p <= 0.0 || rng.gen::<f64>() >= p {
            return None;
        }
        let shooter = self.invaders.choose(rng)?;
        Some(Bullet::new(
            shooter.x + (INVADER_WIDTH / 2) as f32,
            shooter.y + INVADER_HEIGHT as f32,
            INVADER_BULLET_DY,
            BulletOwner::Invader,
        ))
    }
}
