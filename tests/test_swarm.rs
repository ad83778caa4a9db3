use space_invaders::entities::*;
use space_invaders::geometry::Playfield;
use space_invaders::swarm::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn looks() -> [Appearance; 3] {
    [
        Appearance::Placeholder(Rgb::CYAN),
        Appearance::Placeholder(Rgb::CYAN),
        Appearance::Placeholder(Rgb::CYAN),
    ]
}

fn full_swarm() -> InvaderManager {
    InvaderManager::new(Playfield::default(), 5, 10, 1.0, &looks())
}

fn lone_invader_at(x: f32, y: f32) -> InvaderManager {
    let inv = Invader::new(x, y, 0, Appearance::Placeholder(Rgb::CYAN));
    InvaderManager::from_invaders(Playfield::default(), vec![inv], 1.0)
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── Formation ─────────────────────────────────────────────────────────────────

#[test]
fn formation_is_five_rows_of_ten() {
    let swarm = full_swarm();
    assert_eq!(swarm.invaders().len(), 50);
    assert_eq!(swarm.initial_count(), 50);
    assert_eq!(swarm.killed(), 0);

    let first = &swarm.invaders()[0];
    assert_eq!((first.x, first.y), (80.0, 60.0));
    let last = &swarm.invaders()[49];
    assert_eq!((last.x, last.y), (530.0, 220.0));
}

#[test]
fn invader_type_cycles_by_row() {
    let swarm = full_swarm();
    let kinds: Vec<u8> = swarm.invaders().iter().step_by(10).map(|i| i.kind).collect();
    assert_eq!(kinds, vec![0, 1, 2, 0, 1]);
}

// ── update ────────────────────────────────────────────────────────────────────

#[test]
fn update_moves_every_invader_sideways_only() {
    let mut swarm = full_swarm();
    let before: Vec<(f32, f32)> = swarm.invaders().iter().map(|i| (i.x, i.y)).collect();
    swarm.update();
    for (inv, (x, y)) in swarm.invaders().iter().zip(before) {
        assert_eq!(inv.x, x + 1.0);
        assert_eq!(inv.y, y);
    }
}

#[test]
fn invaders_never_descend() {
    let mut swarm = full_swarm();
    for _ in 0..2000 {
        swarm.update();
    }
    assert_eq!(swarm.invaders()[0].y, 60.0);
    assert_eq!(swarm.invaders()[49].y, 220.0);
}

#[test]
fn direction_flips_at_right_margin() {
    // x 749 → 750, right edge 790 = width - 10
    let mut swarm = lone_invader_at(749.0, 100.0);
    assert_eq!(swarm.direction(), 1.0);
    swarm.update();
    assert_eq!(swarm.direction(), -1.0);
}

#[test]
fn no_flip_short_of_the_margin() {
    let mut swarm = lone_invader_at(700.0, 100.0);
    swarm.update();
    assert_eq!(swarm.direction(), 1.0);
}

#[test]
fn direction_flips_at_left_margin() {
    // x 9.5 → 10.5, left edge truncates to 10
    let mut swarm = lone_invader_at(9.5, 100.0);
    swarm.update();
    assert_eq!(swarm.direction(), -1.0);
}

#[test]
fn one_invader_at_the_edge_turns_the_whole_swarm() {
    let invaders = vec![
        Invader::new(100.0, 100.0, 0, Appearance::Placeholder(Rgb::CYAN)),
        Invader::new(749.0, 100.0, 0, Appearance::Placeholder(Rgb::CYAN)),
    ];
    let mut swarm = InvaderManager::from_invaders(Playfield::default(), invaders, 1.0);
    swarm.update();
    assert_eq!(swarm.direction(), -1.0);
    swarm.update();
    // Both move left together on the next tick
    assert_eq!(swarm.invaders()[0].x, 100.0);
    assert_eq!(swarm.invaders()[1].x, 749.0);
}

#[test]
fn swarm_bounces_between_margins() {
    let mut swarm = full_swarm();
    for _ in 0..5000 {
        swarm.update();
        for inv in swarm.invaders() {
            assert!(inv.x > 0.0 && inv.x < 800.0);
        }
    }
}

// ── speed ─────────────────────────────────────────────────────────────────────

#[test]
fn speed_grows_with_elapsed_time() {
    let mut swarm = full_swarm();
    swarm.set_elapsed(10_000);
    swarm.update();
    assert!((swarm.speed() - 3.0).abs() < 1e-6);
}

#[test]
fn speed_grows_with_kills() {
    let mut swarm = full_swarm();
    for _ in 0..10 {
        swarm.remove(0);
    }
    swarm.update();
    assert_eq!(swarm.killed(), 10);
    assert!((swarm.speed() - 1.5).abs() < 1e-6);
}

#[test]
fn speed_is_monotonic_in_time_and_kills() {
    let swarm = full_swarm();
    for killed in 0..50 {
        let mut last = 0.0;
        for ms in (0..120_000).step_by(750) {
            let s = swarm.speed_for(killed, ms);
            assert!(s >= last);
            assert!(swarm.speed_for(killed + 1, ms) >= s);
            last = s;
        }
    }
}

#[test]
fn empty_swarm_resets_speed() {
    let mut swarm = lone_invader_at(300.0, 100.0);
    swarm.set_elapsed(50_000);
    swarm.update();
    assert!(swarm.speed() > 1.0);
    swarm.remove(0);
    assert!(swarm.is_cleared());
    swarm.update();
    assert_eq!(swarm.speed(), swarm.base_speed());
}

// ── firing ────────────────────────────────────────────────────────────────────

#[test]
fn full_swarm_fires_at_the_floor_rate() {
    assert!((full_swarm().fire_probability() - 0.02).abs() < 1e-12);
}

#[test]
fn last_invader_of_fifty_fires_at_0_0784() {
    let mut swarm = full_swarm();
    for _ in 0..49 {
        swarm.remove(0);
    }
    assert_eq!(swarm.killed(), 49);
    assert!((swarm.fire_probability() - 0.0784).abs() < 1e-12);
}

#[test]
fn fire_probability_stays_within_bounds() {
    let mut swarm = full_swarm();
    while !swarm.is_cleared() {
        let p = swarm.fire_probability();
        assert!((0.02..=0.08).contains(&p), "p = {p}");
        swarm.remove(0);
    }
    assert_eq!(swarm.fire_probability(), 0.0);
}

#[test]
fn empty_swarm_never_shoots() {
    let mut swarm = lone_invader_at(300.0, 100.0);
    swarm.remove(0);
    let mut rng = seeded_rng();
    for _ in 0..1000 {
        assert!(swarm.shoot_random(&mut rng).is_none());
    }
}

#[test]
fn shot_leaves_from_lower_centre_heading_down() {
    let swarm = lone_invader_at(100.0, 50.0);
    let mut rng = seeded_rng();
    let bullet = (0..10_000)
        .find_map(|_| swarm.shoot_random(&mut rng))
        .expect("a shot within 10k ticks");
    assert_eq!((bullet.x, bullet.y), (120.0, 75.0));
    assert_eq!(bullet.dy, 5.0);
    assert_eq!(bullet.owner, BulletOwner::Invader);
}

#[test]
fn fire_rate_tracks_probability() {
    let swarm = full_swarm();
    let mut rng = seeded_rng();
    let shots = (0..10_000)
        .filter(|_| swarm.shoot_random(&mut rng).is_some())
        .count();
    // Expected 200 at p = 0.02
    assert!((100..=320).contains(&shots), "shots = {shots}");
}
