/// Game entity types: passive state holders with per-tick update methods.
use std::sync::Arc;

use crate::assets::Sprite;
use crate::barrier::Barrier;
use crate::geometry::{Playfield, Rect};
use crate::swarm::InvaderManager;

pub const PLAYER_WIDTH: i32 = 50;
pub const PLAYER_HEIGHT: i32 = 30;
/// Distance of the player row from the bottom of the screen.
pub const PLAYER_ROW_OFFSET: f32 = 80.0;

pub const BULLET_WIDTH: i32 = 4;
pub const BULLET_HEIGHT: i32 = 10;
pub const PLAYER_BULLET_DY: f32 = -8.0;
pub const INVADER_BULLET_DY: f32 = 5.0;
/// Bullets are culled once they travel this far past the top or bottom edge.
pub const OFF_SCREEN_MARGIN: f32 = 10.0;

pub const INVADER_WIDTH: i32 = 40;
pub const INVADER_HEIGHT: i32 = 25;

// ── Colours ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const CYAN: Rgb = Rgb(0, 200, 255);
}

/// How an entity is drawn.  Chosen once when the entity is built, from
/// whatever the asset loader managed to decode.
#[derive(Clone, Debug)]
pub enum Appearance {
    Sprite(Arc<Sprite>),
    Placeholder(Rgb),
}

impl Appearance {
    pub fn is_sprite(&self) -> bool {
        matches!(self, Appearance::Sprite(_))
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Key state sampled once per tick.  `fire` is edge-triggered (set only on
/// the frame Space went down); the others are level-triggered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub quit: bool,
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletOwner {
    Player,
    Invader,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    /// Vertical velocity in pixels per tick (negative = upward).
    pub dy: f32,
    pub owner: BulletOwner,
}

impl Bullet {
    pub fn new(x: f32, y: f32, dy: f32, owner: BulletOwner) -> Self {
        Bullet { x, y, dy, owner }
    }

    pub fn update(&mut self) {
        self.y += self.dy;
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.x, self.y, BULLET_WIDTH, BULLET_HEIGHT)
    }

    /// True once the bullet has left the vertical band
    /// `[-10, screen_height + 10]`.
    pub fn off_screen(&self, screen_height: f32) -> bool {
        self.y < -OFF_SCREEN_MARGIN || self.y > screen_height + OFF_SCREEN_MARGIN
    }

    pub fn from_player(&self) -> bool {
        self.owner == BulletOwner::Player
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: i32,
    pub height: i32,
    /// Horizontal pixels per tick while a direction key is held.
    pub speed: f32,
    pub lives: u32,
    /// Ticks left before the next shot is allowed.
    pub cooldown: u32,
    /// Value `cooldown` is reset to after each shot.
    pub shot_interval: u32,
    pub appearance: Appearance,
    pub field: Playfield,
}

impl Player {
    pub fn new(
        field: Playfield,
        lives: u32,
        speed: f32,
        shot_interval: u32,
        appearance: Appearance,
    ) -> Self {
        let (x, y) = Self::spawn_point(field);
        Player {
            x,
            y,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            speed,
            lives,
            cooldown: 0,
            shot_interval,
            appearance,
            field,
        }
    }

    /// Centre-bottom spawn position, also used after every hit.
    pub fn spawn_point(field: Playfield) -> (f32, f32) {
        let x = (field.width as i32 / 2 - PLAYER_WIDTH / 2) as f32;
        (x, field.height - PLAYER_ROW_OFFSET)
    }

    pub fn handle_input(&mut self, keys: &KeyState) {
        if keys.left {
            self.x -= self.speed;
        }
        if keys.right {
            self.x += self.speed;
        }
        let max_x = (self.field.width - self.width as f32).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
    }

    pub fn update(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    pub fn can_shoot(&self) -> bool {
        self.cooldown == 0
    }

    /// Fire from the top-centre of the ship and restart the cooldown.
    pub fn shoot(&mut self) -> Bullet {
        self.cooldown = self.shot_interval;
        Bullet::new(
            self.x + (self.width / 2) as f32,
            self.y,
            PLAYER_BULLET_DY,
            BulletOwner::Player,
        )
    }

    /// Lose a life and return to the spawn point.
    pub fn hit(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        let (x, y) = Self::spawn_point(self.field);
        self.x = x;
        self.y = y;
    }

    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.x, self.y, self.width, self.height)
    }
}

// ── Invader ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Invader {
    pub x: f32,
    pub y: f32,
    /// Cosmetic variant, 0..=2.
    pub kind: u8,
    pub appearance: Appearance,
}

impl Invader {
    pub fn new(x: f32, y: f32, kind: u8, appearance: Appearance) -> Self {
        Invader { x, y, kind, appearance }
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.x, self.y, INVADER_WIDTH, INVADER_HEIGHT)
    }
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    /// Lives exhausted.
    GameOver,
    /// Swarm destroyed.
    Cleared,
}

impl GameStatus {
    pub fn is_finished(&self) -> bool {
        *self != GameStatus::Playing
    }
}

/// Things that happened during a tick which the audio layer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    InvaderDestroyed,
    BarrierHit,
    PlayerHit,
}

/// Everything the loop owns for one wave.
#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Player,
    pub swarm: InvaderManager,
    pub barriers: Vec<Barrier>,
    pub player_bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub score: u32,
    pub status: GameStatus,
    pub frame: u64,
    pub field: Playfield,
}
