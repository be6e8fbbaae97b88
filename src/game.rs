use crossterm::event::{KeyCode, KeyEvent};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tween::{Repeat, Track, Tweens};

/// Milliseconds per update tick (~60 FPS).
pub const TICK_MS: u32 = 16;

// Logical playfield. Rendering scales this onto the terminal.
pub const WORLD_W: f32 = 800.0;
pub const WORLD_H: f32 = 600.0;

pub const PLAYER_Y: f32 = 550.0;
const PLAYER_W: f32 = 50.0;
const PLAYER_H: f32 = 50.0;
const PLAYER_SPEED: f32 = 300.0; // px/s

const ASTEROID_SIZE: f32 = 40.0;
pub const ASTEROID_VARIANTS: usize = 5;
const SPAWN_MARGIN: f32 = 40.0;
const SPAWN_Y: f32 = -50.0;
const FALL_END_Y: f32 = WORLD_H + 50.0;
const MAX_SPIN_DEG: f32 = 200.0; // total rotation over one drop

const ALIEN_ENTRY_Y: f32 = 100.0;
const ALIEN_ENTRY_MS: u32 = 1000;
const ALIEN_SWEEP_RANGE: f32 = 100.0;
const ALIEN_SWEEP_LEG_MS: u32 = 2000;
const ALIEN_TRIGGER_SCORE: u32 = 10;

const LASER_SIZE: f32 = 10.0;
const LASER_BASE_SPEED: f32 = 400.0;
const LASER_SPEED_PER_LEVEL: f32 = 100.0;
const LASER_MUZZLE_DROP: f32 = 20.0;
const FIRE_DELAY_MIN_MS: u32 = 2000;
const FIRE_DELAY_MAX_MS: u32 = 5000;

const START_DIFFICULTY: u32 = 6;
const DIFFICULTY_STEP_SCORE: u32 = 5;
const FALL_BASE_MS: i64 = 4000;
const FALL_MS_PER_LEVEL: i64 = 300;
const FALL_MIN_MS: i64 = 1000;

// Terminals report key presses and autorepeats, not held state, so a
// directional press keeps that direction active for a short window.
const KEY_HOLD_MS: u32 = 180;

pub struct Player {
    pub x: f32,
    pub vx: f32,
}

pub struct Asteroid {
    pub x: f32,
    pub y: f32,
    /// Degrees, wrapped to [0, 360).
    pub angle: f32,
    /// Degrees per millisecond. One rate per drop, replaced on respawn.
    pub spin: f32,
    pub variant: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AlienPhase {
    Dormant,
    Entering,
    Active,
}

pub struct Alien {
    pub x: f32,
    pub y: f32,
    pub phase: AlienPhase,
}

pub struct Laser {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Radians, the heading it was fired at.
    pub angle: f32,
    pub visible: bool,
}

/// The whole game: entities, score, scripted motions and the rules that
/// connect them. One `update` call advances everything by `dt_ms`.
pub struct DodgeGame {
    pub player: Player,
    pub asteroid: Asteroid,
    pub alien: Alien,
    pub laser: Laser,
    pub score: u32,
    pub difficulty: u32,
    pub alien_appeared: bool,
    pub game_over: bool,
    tweens: Tweens,
    fire_timer_ms: Option<u32>,
    left_hold_ms: u32,
    right_hold_ms: u32,
    rng: StdRng,
}

impl DodgeGame {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut game = Self {
            player: Player {
                x: WORLD_W / 2.0,
                vx: 0.0,
            },
            asteroid: Asteroid {
                x: WORLD_W / 2.0,
                y: SPAWN_Y,
                angle: 0.0,
                spin: 0.0,
                variant: 0,
            },
            alien: Alien {
                x: WORLD_W / 2.0,
                y: SPAWN_Y,
                phase: AlienPhase::Dormant,
            },
            laser: Laser {
                x: -50.0,
                y: -50.0,
                vx: 0.0,
                vy: 0.0,
                angle: 0.0,
                visible: false,
            },
            score: 0,
            difficulty: START_DIFFICULTY,
            alien_appeared: false,
            game_over: false,
            tweens: Tweens::new(),
            fire_timer_ms: None,
            left_hold_ms: 0,
            right_hold_ms: 0,
            rng,
        };
        game.spawn_asteroid();
        game
    }

    /// Full restart from initial state, nothing carried over.
    pub fn reset(&mut self) {
        *self = DodgeGame::new();
    }

    pub fn update(&mut self, dt_ms: u32) {
        if self.game_over {
            return;
        }
        let dt_s = dt_ms as f32 / 1000.0;

        // Directional input; left wins if both are somehow held.
        self.left_hold_ms = self.left_hold_ms.saturating_sub(dt_ms);
        self.right_hold_ms = self.right_hold_ms.saturating_sub(dt_ms);
        self.player.vx = if self.left_hold_ms > 0 {
            -PLAYER_SPEED
        } else if self.right_hold_ms > 0 {
            PLAYER_SPEED
        } else {
            0.0
        };
        self.player.x = (self.player.x + self.player.vx * dt_s)
            .clamp(PLAYER_W / 2.0, WORLD_W - PLAYER_W / 2.0);

        self.asteroid.angle =
            (self.asteroid.angle + self.asteroid.spin * dt_ms as f32).rem_euclid(360.0);

        for ev in self.tweens.tick(dt_ms) {
            match ev.track {
                Track::AsteroidFall => {
                    self.asteroid.y = ev.value;
                    if ev.finished {
                        self.on_fall_complete();
                    }
                }
                Track::AlienEntry => {
                    self.alien.y = ev.value;
                    if ev.finished {
                        self.on_alien_arrived();
                    }
                }
                Track::AlienSweep => {
                    self.alien.x = ev.value;
                }
            }
        }

        // The laser keeps flying off-screen; it is only hidden on a hit or
        // repositioned by the next shot.
        if self.laser.visible {
            self.laser.x += self.laser.vx * dt_s;
            self.laser.y += self.laser.vy * dt_s;
        }

        if let Some(remaining) = self.fire_timer_ms {
            if remaining <= dt_ms {
                self.fire_laser();
                self.fire_timer_ms = Some(self.roll_fire_delay());
            } else {
                self.fire_timer_ms = Some(remaining - dt_ms);
            }
        }

        self.check_collisions();
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            _ if self.game_over => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.reset();
                }
            }
            KeyCode::Left => self.left_hold_ms = KEY_HOLD_MS,
            KeyCode::Right => self.right_hold_ms = KEY_HOLD_MS,
            _ => {}
        }
    }

    fn fall_duration_ms(level: u32) -> u32 {
        (FALL_BASE_MS - level as i64 * FALL_MS_PER_LEVEL).clamp(FALL_MIN_MS, FALL_BASE_MS) as u32
    }

    fn spawn_asteroid(&mut self) {
        let mut x = self.rng.gen_range(SPAWN_MARGIN..=WORLD_W - SPAWN_MARGIN);
        if !(SPAWN_MARGIN..=WORLD_W - SPAWN_MARGIN).contains(&x) {
            warn!("asteroid spawn x {x:.1} outside the playfield, clamping");
            x = x.clamp(SPAWN_MARGIN, WORLD_W - SPAWN_MARGIN);
        }
        let duration = Self::fall_duration_ms(self.difficulty);

        self.asteroid.x = x;
        self.asteroid.y = SPAWN_Y;
        self.asteroid.variant = self.rng.gen_range(0..ASTEROID_VARIANTS);
        let spin_total = self.rng.gen_range(-MAX_SPIN_DEG..=MAX_SPIN_DEG);
        self.asteroid.spin = spin_total / duration as f32;

        self.tweens
            .start(Track::AsteroidFall, SPAWN_Y, FALL_END_Y, duration, Repeat::Once);
    }

    fn on_fall_complete(&mut self) {
        if self.game_over {
            return;
        }
        self.score += 1;
        if self.score % DIFFICULTY_STEP_SCORE == 0 {
            self.difficulty += 1;
            info!("difficulty raised to {}", self.difficulty);
        }
        if self.score == ALIEN_TRIGGER_SCORE && !self.alien_appeared {
            self.summon_alien();
        }
        self.spawn_asteroid();
    }

    fn summon_alien(&mut self) {
        self.alien_appeared = true;
        self.alien.x = WORLD_W / 2.0;
        self.alien.y = SPAWN_Y;
        self.alien.phase = AlienPhase::Entering;
        self.tweens
            .start(Track::AlienEntry, SPAWN_Y, ALIEN_ENTRY_Y, ALIEN_ENTRY_MS, Repeat::Once);
        info!("alien ship incoming");
    }

    fn on_alien_arrived(&mut self) {
        self.alien.phase = AlienPhase::Active;
        self.fire_laser();
        self.fire_timer_ms = Some(self.roll_fire_delay());
        self.tweens.start(
            Track::AlienSweep,
            self.alien.x - ALIEN_SWEEP_RANGE,
            self.alien.x + ALIEN_SWEEP_RANGE,
            ALIEN_SWEEP_LEG_MS,
            Repeat::Yoyo,
        );
    }

    /// Fresh random delay before every shot.
    fn roll_fire_delay(&mut self) -> u32 {
        self.rng.gen_range(FIRE_DELAY_MIN_MS..=FIRE_DELAY_MAX_MS)
    }

    /// Aim at where the player is right now; no lead.
    fn fire_laser(&mut self) {
        let speed = LASER_BASE_SPEED + self.difficulty as f32 * LASER_SPEED_PER_LEVEL;
        let dx = self.player.x - self.alien.x;
        let dy = PLAYER_Y - self.alien.y;
        let angle = dy.atan2(dx);

        self.laser.x = self.alien.x;
        self.laser.y = self.alien.y + LASER_MUZZLE_DROP;
        self.laser.angle = angle;
        self.laser.vx = angle.cos() * speed;
        self.laser.vy = angle.sin() * speed;
        self.laser.visible = true;
    }

    fn check_collisions(&mut self) {
        if overlaps(
            self.player.x,
            PLAYER_Y,
            PLAYER_W,
            PLAYER_H,
            self.asteroid.x,
            self.asteroid.y,
            ASTEROID_SIZE,
            ASTEROID_SIZE,
        ) {
            info!("ship struck by asteroid");
            self.enter_game_over();
            return;
        }

        if self.laser.visible
            && overlaps(
                self.player.x,
                PLAYER_Y,
                PLAYER_W,
                PLAYER_H,
                self.laser.x,
                self.laser.y,
                LASER_SIZE,
                LASER_SIZE,
            )
        {
            info!("ship struck by laser");
            self.laser.visible = false;
            self.enter_game_over();
        }
    }

    /// The one terminal transition. Whatever the cause, every scheduled
    /// activity stops so the end state is quiescent.
    fn enter_game_over(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.tweens.cancel_all();
        debug_assert!(self.tweens.is_empty());
        self.fire_timer_ms = None;
        self.player.vx = 0.0;
        self.asteroid.spin = 0.0;
        self.laser.vx = 0.0;
        self.laser.vy = 0.0;
        info!("game over, {} asteroids avoided", self.score);
    }
}

/// Center-based AABB overlap.
fn overlaps(ax: f32, ay: f32, aw: f32, ah: f32, bx: f32, by: f32, bw: f32, bh: f32) -> bool {
    (ax - bx).abs() * 2.0 < aw + bw && (ay - by).abs() * 2.0 < ah + bh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> DodgeGame {
        DodgeGame::from_rng(StdRng::seed_from_u64(seed))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    /// Run exactly one fall cycle to completion. 4000 ms covers any fall
    /// duration, and the replacement tween does not advance within the same
    /// tick, so each call completes exactly one cycle.
    fn complete_fall(game: &mut DodgeGame) {
        let before = game.score;
        game.update(FALL_BASE_MS as u32);
        assert_eq!(game.score, before + 1, "fall cycle did not complete");
    }

    #[test]
    fn fall_duration_follows_difficulty_and_stays_clamped() {
        assert_eq!(DodgeGame::fall_duration_ms(0), 4000);
        assert_eq!(DodgeGame::fall_duration_ms(6), 2200);
        assert_eq!(DodgeGame::fall_duration_ms(10), 1000);
        assert_eq!(DodgeGame::fall_duration_ms(50), 1000);

        let mut prev = u32::MAX;
        for level in 0..=30 {
            let d = DodgeGame::fall_duration_ms(level);
            assert!((1000..=4000).contains(&d));
            assert!(d <= prev, "duration increased at level {level}");
            prev = d;
        }
    }

    #[test]
    fn spawn_position_stays_within_margins() {
        let mut game = seeded(7);
        for _ in 0..500 {
            game.spawn_asteroid();
            assert!((40.0..=760.0).contains(&game.asteroid.x));
            assert_eq!(game.asteroid.y, SPAWN_Y);
        }
    }

    #[test]
    fn spin_rate_is_bounded_by_drop_rotation_budget() {
        let mut game = seeded(11);
        for _ in 0..200 {
            game.spawn_asteroid();
            let duration = DodgeGame::fall_duration_ms(game.difficulty) as f32;
            assert!(game.asteroid.spin.abs() * duration <= MAX_SPIN_DEG + 1e-3);
        }
    }

    #[test]
    fn score_counts_each_completed_fall() {
        let mut game = seeded(1);
        for n in 1..=4 {
            complete_fall(&mut game);
            assert_eq!(game.score, n);
        }
    }

    #[test]
    fn difficulty_steps_at_positive_multiples_of_five() {
        let mut game = seeded(2);
        for _ in 0..4 {
            complete_fall(&mut game);
        }
        assert_eq!(game.difficulty, 6);
        complete_fall(&mut game); // score 5
        assert_eq!(game.difficulty, 7);
        for _ in 0..4 {
            complete_fall(&mut game);
        }
        assert_eq!(game.difficulty, 7); // score 9
        complete_fall(&mut game); // score 10
        assert_eq!(game.difficulty, 8);
    }

    #[test]
    fn nine_cycles_leave_the_alien_dormant() {
        let mut game = seeded(3);
        for _ in 0..9 {
            complete_fall(&mut game);
        }
        assert_eq!(game.score, 9);
        assert_eq!(game.difficulty, 7);
        assert!(!game.alien_appeared);
        assert_eq!(game.alien.phase, AlienPhase::Dormant);
    }

    #[test]
    fn tenth_cycle_summons_the_alien_exactly_once() {
        let mut game = seeded(4);
        for _ in 0..10 {
            complete_fall(&mut game);
        }
        assert_eq!(game.score, 10);
        assert!(game.alien_appeared);
        assert_eq!(game.alien.phase, AlienPhase::Entering);
        assert!(game.tweens.is_running(Track::AlienEntry));

        // Entry completes during the next cycle: first shot fired, sweep on,
        // and no re-trigger at any later score.
        for _ in 0..5 {
            complete_fall(&mut game);
        }
        assert_eq!(game.score, 15);
        assert_eq!(game.alien.phase, AlienPhase::Active);
        assert!(game.laser.visible);
        assert!(game.tweens.is_running(Track::AlienSweep));
        assert!(!game.tweens.is_running(Track::AlienEntry));
    }

    #[test]
    fn alien_arrival_starts_sweep_and_fire_timer() {
        let mut game = seeded(5);
        game.alien.x = WORLD_W / 2.0;
        game.alien.y = ALIEN_ENTRY_Y;
        game.alien.phase = AlienPhase::Entering;
        game.on_alien_arrived();

        assert_eq!(game.alien.phase, AlienPhase::Active);
        assert!(game.laser.visible);
        assert!(game.tweens.is_running(Track::AlienSweep));
        let delay = game.fire_timer_ms.expect("fire timer armed");
        assert!((FIRE_DELAY_MIN_MS..=FIRE_DELAY_MAX_MS).contains(&delay));
    }

    #[test]
    fn fire_timer_rerolls_a_fresh_delay_after_each_shot() {
        let mut game = seeded(6);
        game.alien.x = 300.0;
        game.alien.y = ALIEN_ENTRY_Y;
        game.fire_timer_ms = Some(10);
        game.update(TICK_MS);

        assert!(game.laser.visible);
        let next = game.fire_timer_ms.expect("timer re-armed");
        assert!((FIRE_DELAY_MIN_MS..=FIRE_DELAY_MAX_MS).contains(&next));
    }

    #[test]
    fn laser_speed_scales_with_difficulty_at_fire_time() {
        for level in [0u32, 6, 9, 14] {
            let mut game = seeded(8);
            game.difficulty = level;
            game.alien.x = 250.0;
            game.alien.y = ALIEN_ENTRY_Y;
            game.fire_laser();
            let speed = (game.laser.vx * game.laser.vx + game.laser.vy * game.laser.vy).sqrt();
            let expected = 400.0 + level as f32 * 100.0;
            assert!((speed - expected).abs() < 0.1, "level {level}: {speed}");
        }
    }

    #[test]
    fn laser_is_aimed_at_the_player_at_fire_time() {
        let mut game = seeded(9);
        game.alien.x = 300.0;
        game.alien.y = ALIEN_ENTRY_Y;
        game.player.x = 500.0;
        game.fire_laser();

        let expected = (PLAYER_Y - ALIEN_ENTRY_Y).atan2(500.0 - 300.0);
        assert!((game.laser.angle - expected).abs() < 1e-5);
        assert_eq!(game.laser.x, 300.0);
        assert_eq!(game.laser.y, ALIEN_ENTRY_Y + LASER_MUZZLE_DROP);
        assert!(game.laser.vx > 0.0 && game.laser.vy > 0.0);
    }

    #[test]
    fn asteroid_hit_is_terminal_and_cancels_everything() {
        let mut game = seeded(10);
        game.tweens.cancel(Track::AsteroidFall);
        game.asteroid.x = game.player.x;
        game.asteroid.y = PLAYER_Y;
        game.update(TICK_MS);

        assert!(game.game_over);
        assert!(game.tweens.is_empty());
        assert_eq!(game.fire_timer_ms, None);
        assert_eq!(game.asteroid.spin, 0.0);

        // A second overlap while already over changes nothing.
        let score = game.score;
        game.update(TICK_MS);
        assert!(game.game_over);
        assert_eq!(game.score, score);
    }

    #[test]
    fn laser_hit_hides_the_laser_and_zeroes_its_velocity() {
        let mut game = seeded(12);
        game.laser.visible = true;
        game.laser.x = game.player.x;
        game.laser.y = PLAYER_Y;
        game.laser.vx = 80.0;
        game.laser.vy = 120.0;
        game.update(TICK_MS);

        assert!(game.game_over);
        assert!(!game.laser.visible);
        assert_eq!(game.laser.vx, 0.0);
        assert_eq!(game.laser.vy, 0.0);
        assert!(game.tweens.is_empty());
    }

    #[test]
    fn game_over_freezes_score_movement_and_input() {
        let mut game = seeded(13);
        game.handle_input(key(KeyCode::Left));
        game.update(TICK_MS);
        assert_eq!(game.player.vx, -PLAYER_SPEED);

        game.enter_game_over();
        let x = game.player.x;
        let score = game.score;
        game.handle_input(key(KeyCode::Left));
        game.update(FALL_BASE_MS as u32);
        assert_eq!(game.player.x, x);
        assert_eq!(game.player.vx, 0.0);
        assert_eq!(game.score, score);
        assert!(game.game_over);
    }

    #[test]
    fn left_wins_when_both_directions_are_held() {
        let mut game = seeded(14);
        game.handle_input(key(KeyCode::Right));
        game.handle_input(key(KeyCode::Left));
        game.update(TICK_MS);
        assert_eq!(game.player.vx, -PLAYER_SPEED);
    }

    #[test]
    fn player_stays_within_horizontal_bounds() {
        let mut game = seeded(15);
        game.tweens.cancel(Track::AsteroidFall); // keep the run collision-free
        for _ in 0..2000 {
            game.handle_input(key(KeyCode::Left));
            game.update(TICK_MS);
        }
        assert_eq!(game.player.x, PLAYER_W / 2.0);
        for _ in 0..2000 {
            game.handle_input(key(KeyCode::Right));
            game.update(TICK_MS);
        }
        assert_eq!(game.player.x, WORLD_W - PLAYER_W / 2.0);
    }

    #[test]
    fn restart_rebuilds_the_initial_state() {
        let mut game = seeded(16);
        for _ in 0..12 {
            complete_fall(&mut game);
        }
        game.enter_game_over();
        game.handle_input(key(KeyCode::Enter));

        assert_eq!(game.score, 0);
        assert_eq!(game.difficulty, START_DIFFICULTY);
        assert!(!game.alien_appeared);
        assert!(!game.game_over);
        assert_eq!(game.alien.phase, AlienPhase::Dormant);
        assert!(!game.laser.visible);
        assert!(game.tweens.is_running(Track::AsteroidFall));
    }
}
