//! Time-based interpolation scheduler for the scripted motions (asteroid
//! fall, alien entrance, alien sweep).
//!
//! Each motion runs on a named track and the arena holds at most one tween
//! per track: starting a track replaces whatever was running there, so a
//! respawn can never pile up stale animations behind the live one. Ticking
//! returns plain events instead of invoking callbacks, which keeps the
//! fall-cycle and alien state machines in `game.rs` auditable.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Track {
    AsteroidFall,
    AlienEntry,
    AlienSweep,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Repeat {
    /// Run once, report completion, then drop out of the arena.
    Once,
    /// Ping-pong between the endpoints forever. Never completes.
    Yoyo,
}

#[derive(Debug)]
struct Tween {
    track: Track,
    from: f32,
    to: f32,
    duration_ms: u32,
    elapsed_ms: u32,
    repeat: Repeat,
}

/// One sampled value per active tween per tick.
#[derive(Debug)]
pub struct TweenUpdate {
    pub track: Track,
    pub value: f32,
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct Tweens {
    active: Vec<Tween>,
}

impl Tweens {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    pub fn start(&mut self, track: Track, from: f32, to: f32, duration_ms: u32, repeat: Repeat) {
        debug_assert!(duration_ms > 0);
        self.cancel(track);
        self.active.push(Tween {
            track,
            from,
            to,
            duration_ms,
            elapsed_ms: 0,
            repeat,
        });
    }

    pub fn cancel(&mut self, track: Track) {
        self.active.retain(|t| t.track != track);
    }

    pub fn cancel_all(&mut self) {
        self.active.clear();
    }

    pub fn is_running(&self, track: Track) -> bool {
        self.active.iter().any(|t| t.track == track)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every tween by `dt_ms`, sampling each one. `Once` tweens that
    /// reach their end report `finished` with the exact end value and are
    /// removed.
    pub fn tick(&mut self, dt_ms: u32) -> Vec<TweenUpdate> {
        let mut updates = Vec::with_capacity(self.active.len());
        self.active.retain_mut(|t| {
            t.elapsed_ms = t.elapsed_ms.saturating_add(dt_ms);
            match t.repeat {
                Repeat::Once => {
                    let done = t.elapsed_ms >= t.duration_ms;
                    let frac = if done {
                        1.0
                    } else {
                        t.elapsed_ms as f32 / t.duration_ms as f32
                    };
                    updates.push(TweenUpdate {
                        track: t.track,
                        value: lerp(t.from, t.to, frac),
                        finished: done,
                    });
                    !done
                }
                Repeat::Yoyo => {
                    let cycle = t.elapsed_ms % (2 * t.duration_ms);
                    let frac = if cycle < t.duration_ms {
                        cycle as f32 / t.duration_ms as f32
                    } else {
                        (2 * t.duration_ms - cycle) as f32 / t.duration_ms as f32
                    };
                    updates.push(TweenUpdate {
                        track: t.track,
                        value: lerp(t.from, t.to, frac),
                        finished: false,
                    });
                    true
                }
            }
        });
        updates
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(updates: &[TweenUpdate]) -> &TweenUpdate {
        assert_eq!(updates.len(), 1);
        &updates[0]
    }

    #[test]
    fn once_tween_samples_linearly() {
        let mut tweens = Tweens::new();
        tweens.start(Track::AsteroidFall, 0.0, 100.0, 1000, Repeat::Once);

        let u = tweens.tick(250);
        let u = only(&u);
        assert!((u.value - 25.0).abs() < 1e-4);
        assert!(!u.finished);

        let u = tweens.tick(500);
        assert!((only(&u).value - 75.0).abs() < 1e-4);
    }

    #[test]
    fn once_tween_finishes_at_end_value_and_is_removed() {
        let mut tweens = Tweens::new();
        tweens.start(Track::AlienEntry, -50.0, 100.0, 1000, Repeat::Once);

        // Overshooting the duration still lands exactly on the end value.
        let u = tweens.tick(5000);
        let u = only(&u);
        assert_eq!(u.value, 100.0);
        assert!(u.finished);
        assert!(tweens.is_empty());
        assert!(tweens.tick(16).is_empty());
    }

    #[test]
    fn yoyo_reverses_each_leg_and_never_finishes() {
        let mut tweens = Tweens::new();
        tweens.start(Track::AlienSweep, 300.0, 500.0, 2000, Repeat::Yoyo);

        let u = tweens.tick(1000);
        assert!((only(&u).value - 400.0).abs() < 1e-3); // mid forward leg

        let u = tweens.tick(1000);
        assert!((only(&u).value - 500.0).abs() < 1e-3); // far end

        let u = tweens.tick(1000);
        let u = only(&u);
        assert!((u.value - 400.0).abs() < 1e-3); // mid reverse leg
        assert!(!u.finished);

        let u = tweens.tick(1000);
        assert!((only(&u).value - 300.0).abs() < 1e-3); // back at start

        assert!(tweens.is_running(Track::AlienSweep));
    }

    #[test]
    fn starting_a_track_replaces_the_previous_tween() {
        let mut tweens = Tweens::new();
        tweens.start(Track::AsteroidFall, 0.0, 100.0, 1000, Repeat::Once);
        tweens.tick(500);
        tweens.start(Track::AsteroidFall, -50.0, 650.0, 2000, Repeat::Once);

        // Only the new tween is live, starting from zero elapsed time.
        let u = tweens.tick(1000);
        let u = only(&u);
        assert!((u.value - 300.0).abs() < 1e-3);
        assert!(!u.finished);
    }

    #[test]
    fn cancel_all_leaves_nothing_running() {
        let mut tweens = Tweens::new();
        tweens.start(Track::AsteroidFall, 0.0, 1.0, 100, Repeat::Once);
        tweens.start(Track::AlienSweep, 0.0, 1.0, 100, Repeat::Yoyo);
        tweens.cancel_all();
        assert!(tweens.is_empty());
        assert!(tweens.tick(16).is_empty());
    }
}
