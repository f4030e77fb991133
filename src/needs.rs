//! Hunger and happiness: the two scalars every command and tick pushes around.

use crate::model::{FoodType, NeedsState, Rules, NEED_MAX, NEED_MIN};
use serde::{Deserialize, Serialize};

/// Coarse band of a need, for the host to style bars and icons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedLevel {
    Low,
    Medium,
    High,
}

impl NeedLevel {
    pub fn of(value: f32) -> Self {
        if value < 30.0 {
            NeedLevel::Low
        } else if value < 70.0 {
            NeedLevel::Medium
        } else {
            NeedLevel::High
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeedsSnapshot {
    pub hunger: f32,
    pub happiness: f32,
    pub hunger_level: NeedLevel,
    pub happiness_level: NeedLevel,
}

fn clamp_need(v: f32) -> f32 {
    if v.is_nan() {
        NEED_MIN
    } else {
        v.clamp(NEED_MIN, NEED_MAX)
    }
}

impl NeedsState {
    /// The meal itself does not matter for the numbers.
    pub fn feed(&mut self, _food: FoodType, rules: &Rules) -> f32 {
        self.hunger = clamp_need(self.hunger + rules.feed_amount);
        self.hunger
    }

    pub fn play(&mut self, rules: &Rules) -> f32 {
        self.adjust_happiness(rules.play_amount)
    }

    pub fn pet(&mut self, rules: &Rules) -> f32 {
        self.adjust_happiness(rules.pet_amount)
    }

    /// Signed; mini-games may also take happiness away.
    pub fn adjust_happiness(&mut self, delta: f32) -> f32 {
        self.happiness = clamp_need(self.happiness + delta);
        self.happiness
    }

    /// Linear in elapsed time, so many short calls land where one long call
    /// would (up to float rounding).
    pub fn decay(&mut self, elapsed_secs: f64, rules: &Rules) {
        if !(elapsed_secs > 0.0) {
            return;
        }
        let minutes = (elapsed_secs / 60.0) as f32;
        self.hunger = clamp_need(self.hunger - rules.hunger_decay_per_min * minutes);
        self.happiness = clamp_need(self.happiness - rules.happiness_decay_per_min * minutes);
    }

    pub fn snapshot(&self) -> NeedsSnapshot {
        NeedsSnapshot {
            hunger: self.hunger,
            happiness: self.happiness,
            hunger_level: NeedLevel::of(self.hunger),
            happiness_level: NeedLevel::of(self.happiness),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn needs(hunger: f32, happiness: f32) -> NeedsState {
        NeedsState { hunger, happiness }
    }

    #[test]
    fn feed_caps_at_100_for_every_food() {
        let rules = Rules::default();
        for food in FoodType::ALL {
            let mut n = needs(80.0, 50.0);
            assert_eq!(n.feed(food, &rules), 100.0);
            assert_eq!(n.happiness, 50.0);
        }
    }

    #[test]
    fn play_and_pet_use_their_own_amounts() {
        let rules = Rules::default();
        let mut n = needs(50.0, 50.0);
        assert_eq!(n.play(&rules), 65.0);
        assert_eq!(n.pet(&rules), 70.0);
        let mut full = needs(50.0, 98.0);
        assert_eq!(full.pet(&rules), 100.0);
    }

    #[test]
    fn negative_delta_stops_at_zero() {
        let mut n = needs(50.0, 3.0);
        assert_eq!(n.adjust_happiness(-5.0), 0.0);
    }

    #[test]
    fn decay_is_additive() {
        let rules = Rules::default();
        let mut once = needs(90.0, 90.0);
        once.decay(600.0, &rules);

        let mut many = needs(90.0, 90.0);
        for _ in 0..2000 {
            many.decay(0.3, &rules);
        }
        assert!((once.hunger - many.hunger).abs() < 0.01);
        assert!((once.happiness - many.happiness).abs() < 0.01);
        assert!((once.hunger - 80.0).abs() < 1e-4);
    }

    #[test]
    fn decay_floors_at_zero_and_ignores_bad_input() {
        let rules = Rules::default();
        let mut n = needs(2.0, 1.0);
        n.decay(3600.0, &rules);
        assert_eq!(n, needs(0.0, 0.0));

        let mut m = needs(40.0, 40.0);
        m.decay(-30.0, &rules);
        m.decay(f64::NAN, &rules);
        assert_eq!(m, needs(40.0, 40.0));
    }

    #[test]
    fn levels_follow_bands() {
        assert_eq!(NeedLevel::of(0.0), NeedLevel::Low);
        assert_eq!(NeedLevel::of(29.9), NeedLevel::Low);
        assert_eq!(NeedLevel::of(30.0), NeedLevel::Medium);
        assert_eq!(NeedLevel::of(70.0), NeedLevel::High);
    }
}
