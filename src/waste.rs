use crate::model::{Rules, WasteState};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteSnapshot {
    pub count: u32,
    /// Units removed by the command that produced this snapshot.
    pub removed: u32,
}

impl WasteState {
    /// Time-driven spawn. Whole expected units land deterministically, the
    /// fractional remainder is a single Bernoulli roll. Returns units added.
    pub fn tick_spawn<R: Rng + ?Sized>(
        &mut self,
        elapsed_secs: f64,
        hunger: f32,
        rules: &Rules,
        rng: &mut R,
    ) -> u32 {
        if !rules.waste_policy.timed() || !(elapsed_secs > 0.0) {
            return 0;
        }
        if hunger <= rules.empty_stomach_at {
            return 0;
        }
        let expected = (rules.waste_per_hour.max(0.0) * elapsed_secs / 3600.0).min(1e6);
        let mut units = expected.floor() as u32;
        let frac = expected.fract();
        if frac > 0.0 && rng.gen_bool(frac) {
            units += 1;
        }
        self.add(units, rules)
    }

    /// Meal-driven spawn.
    pub fn feed_spawn<R: Rng + ?Sized>(&mut self, rules: &Rules, rng: &mut R) -> u32 {
        if !rules.waste_policy.on_feed() {
            return 0;
        }
        let p = rules.feed_waste_chance.clamp(0.0, 1.0);
        if rng.gen_bool(p) {
            self.add(1, rules)
        } else {
            0
        }
    }

    fn add(&mut self, units: u32, rules: &Rules) -> u32 {
        let before = self.count;
        self.count = self.count.saturating_add(units).min(rules.max_waste);
        self.count.saturating_sub(before)
    }

    /// Always ends at zero; cleaning a clean floor is fine.
    pub fn clean(&mut self) -> WasteSnapshot {
        let removed = std::mem::take(&mut self.count);
        WasteSnapshot { count: 0, removed }
    }

    pub fn snapshot(&self) -> WasteSnapshot {
        WasteSnapshot {
            count: self.count,
            removed: 0,
        }
    }
}
