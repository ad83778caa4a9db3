/// Game-logic functions.
///
/// Collision resolvers mutate the collections they are handed and report
/// what happened; `tick` runs one frame of the simulation in the fixed
/// order input → player → swarm → bullets → collisions → win/lose.
/// Randomness only enters through the injected RNG.
use rand::Rng;
use tracing::info;

use crate::assets::Assets;
use crate::barrier::{create_barriers, Barrier};
use crate::config::Config;
use crate::entities::{Bullet, GameEvent, GameState, GameStatus, KeyState, Player};
use crate::swarm::InvaderManager;

/// Points per invader destroyed.
pub const INVADER_POINTS: u32 = 10;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh wave: full swarm, intact barriers, no bullets.
pub fn init_state(config: &Config, assets: &Assets) -> GameState {
    let field = config.playfield();
    GameState {
        player: Player::new(
            field,
            config.player.lives,
            config.player.speed,
            config.player.shoot_cooldown,
            assets.player.clone(),
        ),
        swarm: InvaderManager::new(
            field,
            config.swarm.rows,
            config.swarm.cols,
            config.swarm.base_speed,
            &assets.invaders,
        ),
        barriers: create_barriers(field, &config.barriers),
        player_bullets: Vec::new(),
        enemy_bullets: Vec::new(),
        score: 0,
        status: GameStatus::Playing,
        frame: 0,
        field,
    }
}

// ── Collision resolution ─────────────────────────────────────────────────────

/// Each player bullet destroys at most the first invader (creation order)
/// it overlaps.  Returns the points earned.
pub fn resolve_bullet_invader_collisions(
    player_bullets: &mut Vec<Bullet>,
    swarm: &mut InvaderManager,
) -> u32 {
    let mut killed = vec![false; swarm.invaders().len()];
    let mut spent = vec![false; player_bullets.len()];

    for (bi, bullet) in player_bullets.iter().enumerate() {
        let rect = bullet.rect();
        let target = swarm
            .invaders()
            .iter()
            .enumerate()
            .find(|(ii, inv)| !killed[*ii] && rect.intersects(&inv.rect()));
        if let Some((ii, _)) = target {
            killed[ii] = true;
            spent[bi] = true;
        }
    }

    retain_unmarked(player_bullets, &spent);
    swarm.retain_indexed(|i| !killed[i]);

    spent.iter().filter(|&&s| s).count() as u32 * INVADER_POINTS
}

/// Bullets are stopped only by live barrier cells; crossing a barrier's
/// bounding box through a hole does not consume them.  Returns how many
/// bullets were absorbed.
pub fn resolve_bullet_barrier_collisions(barriers: &mut [Barrier], bullets: &mut Vec<Bullet>) -> usize {
    let mut absorbed = vec![false; bullets.len()];

    for (bi, bullet) in bullets.iter().enumerate() {
        let rect = bullet.rect();
        for barrier in barriers.iter_mut() {
            if barrier.rect().intersects(&rect) && barrier.hit(rect) {
                absorbed[bi] = true;
                break;
            }
        }
    }

    retain_unmarked(bullets, &absorbed);
    absorbed.iter().filter(|&&a| a).count()
}

/// The first enemy bullet overlapping the player is consumed and costs a
/// life.  At most one hit per call.
pub fn resolve_enemy_bullet_player_collisions(enemy_bullets: &mut Vec<Bullet>, player: &mut Player) -> bool {
    let rect = player.rect();
    match enemy_bullets.iter().position(|b| b.rect().intersects(&rect)) {
        Some(idx) => {
            enemy_bullets.remove(idx);
            player.hit();
            true
        }
        None => false,
    }
}

fn retain_unmarked<T>(items: &mut Vec<T>, marked: &[bool]) {
    let mut idx = 0;
    items.retain(|_| {
        let keep = !marked[idx];
        idx += 1;
        keep
    });
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the wave by one frame.  `elapsed_ms` is the wave's running time;
/// sound-worthy happenings are appended to `events`.
pub fn tick(
    state: &mut GameState,
    keys: &KeyState,
    elapsed_ms: u64,
    rng: &mut impl Rng,
    events: &mut Vec<GameEvent>,
) {
    if state.status != GameStatus::Playing {
        return;
    }
    state.frame += 1;

    // ── 1. Input ──────────────────────────────────────────────────────────────
    if keys.fire && state.player.can_shoot() {
        state.player_bullets.push(state.player.shoot());
    }
    state.player.handle_input(keys);
    state.player.update();

    // ── 2. Swarm ──────────────────────────────────────────────────────────────
    state.swarm.set_elapsed(elapsed_ms);
    state.swarm.update();
    if let Some(bullet) = state.swarm.shoot_random(rng) {
        state.enemy_bullets.push(bullet);
    }

    // ── 3. Bullets ────────────────────────────────────────────────────────────
    for bullet in state.player_bullets.iter_mut().chain(state.enemy_bullets.iter_mut()) {
        bullet.update();
    }
    let height = state.field.height;
    state.player_bullets.retain(|b| !b.off_screen(height));
    state.enemy_bullets.retain(|b| !b.off_screen(height));

    // ── 4. Collisions ─────────────────────────────────────────────────────────
    let alive = state.swarm.invaders().len();
    state.score += resolve_bullet_invader_collisions(&mut state.player_bullets, &mut state.swarm);
    let destroyed = alive - state.swarm.invaders().len();
    events.extend(std::iter::repeat(GameEvent::InvaderDestroyed).take(destroyed));

    let absorbed = resolve_bullet_barrier_collisions(&mut state.barriers, &mut state.player_bullets)
        + resolve_bullet_barrier_collisions(&mut state.barriers, &mut state.enemy_bullets);
    events.extend(std::iter::repeat(GameEvent::BarrierHit).take(absorbed));

    if resolve_enemy_bullet_player_collisions(&mut state.enemy_bullets, &mut state.player) {
        events.push(GameEvent::PlayerHit);
    }

    // ── 5. Status ─────────────────────────────────────────────────────────────
    if state.player.is_dead() {
        state.status = GameStatus::GameOver;
    } else if state.swarm.is_cleared() {
        state.status = GameStatus::Cleared;
    }
    if state.status.is_finished() {
        info!(
            status = ?state.status,
            score = state.score,
            frames = state.frame,
            elapsed_ms,
            "wave finished"
        );
    }
}
