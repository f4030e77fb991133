//! Behavioral state of the pet, advanced one fixed tick at a time.
//!
//! Busy states (eating, playing, petting) only start on command and hold for
//! a set number of ticks. Mood states hold for `mood_ticks`. Idle and walking
//! re-check the need thresholds every tick. Whenever a hold runs out the next
//! state comes from [`decide`], which never yields a busy state.

use crate::model::{AnimationState, FoodType, NeedsState, Rules};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

/// Cosmetic state the host may use to place and animate the sprite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresentationHints {
    pub walk_x: f32,
    pub facing: Facing,
    /// Alternates 0/1 every tick while playing.
    pub play_frame: u8,
    pub bounce: bool,
    pub food: Option<FoodType>,
}

/// Threshold overrides, checked in priority order: hunger, happiness, waste.
pub fn forced_state(needs: &NeedsState, waste: u32, rules: &Rules) -> Option<AnimationState> {
    if needs.hunger < rules.hungry_below {
        Some(AnimationState::Hungry)
    } else if needs.happiness < rules.sad_below {
        Some(AnimationState::Sad)
    } else if waste >= rules.sad_waste_at {
        Some(AnimationState::Sad)
    } else {
        None
    }
}

/// Weighted table over a roll in `0..=100`.
pub fn state_from_roll(roll: u32, hunger: f32, rules: &Rules) -> AnimationState {
    match roll {
        0..=49 => AnimationState::Walking,
        50..=64 => AnimationState::Happy,
        65..=84 => AnimationState::Idle,
        85..=89 if hunger < rules.peckish_below => AnimationState::Hungry,
        _ => AnimationState::Idle,
    }
}

pub fn decide<R: Rng + ?Sized>(
    needs: &NeedsState,
    waste: u32,
    rules: &Rules,
    rng: &mut R,
) -> AnimationState {
    forced_state(needs, waste, rules)
        .unwrap_or_else(|| state_from_roll(rng.gen_range(0..=100), needs.hunger, rules))
}

fn one_in<R: Rng + ?Sized>(rng: &mut R, n: u32) -> bool {
    n <= 1 || rng.gen_range(0..n) == 0
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct WalkMotion {
    x: f32,
    dir: f32,
}

impl WalkMotion {
    fn step<R: Rng + ?Sized>(&mut self, rules: &Rules, rng: &mut R) {
        let lo = rules.walk_margin;
        let hi = (rules.arena_width - rules.walk_margin).max(lo);
        if self.x <= lo {
            self.dir = 1.0;
        } else if self.x >= hi {
            self.dir = -1.0;
        } else if one_in(rng, rules.walk_turn_odds) {
            self.dir = -self.dir;
        }
        self.x = (self.x + self.dir * rules.walk_step).min(hi).max(lo);
    }
}

#[derive(Clone, Debug)]
pub struct AnimationStateMachine {
    state: AnimationState,
    ticks_in_state: u32,
    food: Option<FoodType>,
    walk: WalkMotion,
}

impl AnimationStateMachine {
    pub fn new(rules: &Rules) -> Self {
        Self {
            state: AnimationState::Idle,
            ticks_in_state: 0,
            food: None,
            walk: WalkMotion {
                x: rules.arena_width / 2.0,
                dir: 1.0,
            },
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn ticks_in_state(&self) -> u32 {
        self.ticks_in_state
    }

    fn enter(&mut self, next: AnimationState) {
        if next != self.state {
            debug!(from = %self.state, to = %next, "animation transition");
        }
        self.state = next;
        self.ticks_in_state = 0;
        if next != AnimationState::Eating {
            self.food = None;
        }
    }

    /// Command entry into a busy state. Re-entering the current one restarts
    /// its hold rather than extending it.
    pub(crate) fn begin_busy(&mut self, busy: AnimationState, food: Option<FoodType>) {
        debug_assert!(busy.is_busy());
        self.enter(busy);
        self.food = food;
    }

    /// Command entry into a mood state (a nap); it expires like any mood.
    pub(crate) fn begin_mood(&mut self, mood: AnimationState) {
        debug_assert!(mood.is_mood());
        self.enter(mood);
    }

    /// Drops back to idle, e.g. after a long absence.
    pub(crate) fn reset(&mut self) {
        self.enter(AnimationState::Idle);
    }

    fn hold_ticks(&self, rules: &Rules) -> u32 {
        match self.state {
            AnimationState::Eating => rules.eating_ticks,
            AnimationState::Playing => rules.playing_ticks,
            AnimationState::Petting => rules.petting_ticks,
            AnimationState::Idle => rules.idle_ticks,
            _ => rules.mood_ticks,
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        needs: &NeedsState,
        waste: u32,
        rules: &Rules,
        rng: &mut R,
    ) -> AnimationState {
        match self.state {
            s if s.is_busy() || s.is_mood() => {
                self.ticks_in_state += 1;
                if self.ticks_in_state >= self.hold_ticks(rules) {
                    let next = decide(needs, waste, rules, rng);
                    self.enter(next);
                }
            }
            AnimationState::Idle => {
                if let Some(forced) = forced_state(needs, waste, rules) {
                    self.enter(forced);
                } else {
                    self.ticks_in_state += 1;
                    if self.ticks_in_state >= self.hold_ticks(rules) {
                        let next = if rng.gen_range(0..100) < rules.idle_walk_percent {
                            AnimationState::Walking
                        } else {
                            decide(needs, waste, rules, rng)
                        };
                        self.enter(next);
                    }
                }
            }
            // Walking; the match above covers every other state.
            _ => {
                if let Some(forced) = forced_state(needs, waste, rules) {
                    self.enter(forced);
                } else {
                    self.walk.step(rules, rng);
                    self.ticks_in_state += 1;
                    if one_in(rng, rules.walk_stop_odds) {
                        self.enter(AnimationState::Idle);
                    }
                }
            }
        }
        self.state
    }

    pub fn hints(&self) -> PresentationHints {
        PresentationHints {
            walk_x: self.walk.x,
            facing: if self.walk.dir < 0.0 {
                Facing::Left
            } else {
                Facing::Right
            },
            play_frame: if self.state == AnimationState::Playing {
                (self.ticks_in_state % 2) as u8
            } else {
                0
            },
            bounce: self.state == AnimationState::Petting && self.ticks_in_state == 0,
            food: self.food,
        }
    }
}
