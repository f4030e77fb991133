use crate::conversation::ConversationSession;
use crate::error::{PetError, PetResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SAVE_VERSION: u32 = 1;

/// Upper bound on waste units on the floor.
pub const MAX_WASTE: u32 = 10;

pub const NEED_MIN: f32 = 0.0;
pub const NEED_MAX: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Walking,
    Eating,
    Playing,
    Sleeping,
    Happy,
    Sad,
    Hungry,
    Petting,
}

impl AnimationState {
    pub const ALL: [AnimationState; 9] = [
        AnimationState::Idle,
        AnimationState::Walking,
        AnimationState::Eating,
        AnimationState::Playing,
        AnimationState::Sleeping,
        AnimationState::Happy,
        AnimationState::Sad,
        AnimationState::Hungry,
        AnimationState::Petting,
    ];

    /// Entered only by explicit command and held for a fixed number of ticks.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            AnimationState::Eating | AnimationState::Playing | AnimationState::Petting
        )
    }

    /// Held for a fixed number of ticks, then the decision policy runs again.
    pub fn is_mood(self) -> bool {
        matches!(
            self,
            AnimationState::Happy
                | AnimationState::Sad
                | AnimationState::Hungry
                | AnimationState::Sleeping
        )
    }

    pub fn key(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walking => "walking",
            AnimationState::Eating => "eating",
            AnimationState::Playing => "playing",
            AnimationState::Sleeping => "sleeping",
            AnimationState::Happy => "happy",
            AnimationState::Sad => "sad",
            AnimationState::Hungry => "hungry",
            AnimationState::Petting => "petting",
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Selects the eating variant only; every food restores the same hunger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodType {
    WeirdDogFood,
    DogFood,
    Treat,
    TastyMeat,
}

impl FoodType {
    pub const ALL: [FoodType; 4] = [
        FoodType::WeirdDogFood,
        FoodType::DogFood,
        FoodType::Treat,
        FoodType::TastyMeat,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FoodType::WeirdDogFood => "weird_dog_food",
            FoodType::DogFood => "dog_food",
            FoodType::Treat => "treat",
            FoodType::TastyMeat => "tasty_meat",
        }
    }
}

impl FromStr for FoodType {
    type Err = PetError;

    fn from_str(s: &str) -> PetResult<Self> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        FoodType::ALL
            .into_iter()
            .find(|f| f.key() == norm)
            .ok_or_else(|| PetError::invalid(format!("unknown food `{s}`")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub adoption_date: NaiveDate,
}

impl PetProfile {
    pub fn new(adoption_date: NaiveDate) -> Self {
        Self {
            name: None,
            owner_name: None,
            adoption_date,
        }
    }

    /// Whole days since adoption; never negative.
    pub fn days_together(&self, today: NaiveDate) -> u32 {
        let days = (today - self.adoption_date).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }

    pub(crate) fn validate(&self, today: NaiveDate) -> PetResult<()> {
        for (label, v) in [("name", &self.name), ("owner name", &self.owner_name)] {
            if let Some(s) = v {
                if s.trim().is_empty() {
                    return Err(PetError::CorruptedProfile(format!("blank {label}")));
                }
            }
        }
        if self.adoption_date > today {
            return Err(PetError::CorruptedProfile(format!(
                "adoption date {} is in the future",
                self.adoption_date
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeedsState {
    pub hunger: f32,
    pub happiness: f32,
}

impl Default for NeedsState {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            happiness: 70.0,
        }
    }
}

impl NeedsState {
    pub(crate) fn validate(&self) -> PetResult<()> {
        for (label, v) in [("hunger", self.hunger), ("happiness", self.happiness)] {
            if !v.is_finite() || !(NEED_MIN..=NEED_MAX).contains(&v) {
                return Err(PetError::CorruptedProfile(format!(
                    "{label} out of range: {v}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteState {
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineClock {
    pub last_interaction_at: DateTime<Utc>,
    pub last_care_at: DateTime<Utc>,
    #[serde(default)]
    pub last_conversation_at: Option<DateTime<Utc>>,
}

impl EngineClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            last_interaction_at: now,
            last_care_at: now,
            last_conversation_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WastePolicy {
    /// Spawn at `waste_per_hour` while time passes.
    Timed,
    /// Roll `feed_waste_chance` after every meal.
    OnFeed,
    Both,
}

impl WastePolicy {
    pub fn timed(self) -> bool {
        matches!(self, WastePolicy::Timed | WastePolicy::Both)
    }

    pub fn on_feed(self) -> bool {
        matches!(self, WastePolicy::OnFeed | WastePolicy::Both)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub tick_step_ms: u64, // 300ms typical

    pub feed_amount: f32,
    pub play_amount: f32,
    pub pet_amount: f32,
    /// Feeding at or above this hunger is refused. Off by default.
    pub refuse_feed_at: Option<f32>,

    pub hunger_decay_per_min: f32,
    pub happiness_decay_per_min: f32,

    pub eating_ticks: u32,
    pub playing_ticks: u32,
    pub petting_ticks: u32,
    pub mood_ticks: u32,
    pub idle_ticks: u32,

    pub hungry_below: f32,
    pub sad_below: f32,
    pub sad_waste_at: u32,
    /// The random table only offers `Hungry` below this hunger.
    pub peckish_below: f32,
    /// Percent chance an idle pet starts walking when its wait runs out.
    pub idle_walk_percent: u32,
    /// 1 in N per tick.
    pub walk_stop_odds: u32,
    pub walk_turn_odds: u32,
    pub walk_step: f32,
    pub walk_margin: f32,
    pub arena_width: f32,

    pub waste_policy: WastePolicy,
    pub waste_per_hour: f64,
    pub feed_waste_chance: f64,
    pub empty_stomach_at: f32,
    pub max_waste: u32,

    pub day_night_period_secs: f64,
    pub bubble_secs: f64,

    pub catchup_max_secs: i64, // 7 days typical
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tick_step_ms: 300,
            feed_amount: 30.0,
            play_amount: 15.0,
            pet_amount: 5.0,
            refuse_feed_at: None,
            hunger_decay_per_min: 1.0,
            happiness_decay_per_min: 1.0,
            eating_ticks: 20,
            playing_ticks: 20,
            petting_ticks: 10,
            mood_ticks: 10,
            idle_ticks: 10,
            hungry_below: 20.0,
            sad_below: 20.0,
            sad_waste_at: 3,
            peckish_below: 70.0,
            idle_walk_percent: 60,
            walk_stop_odds: 31,
            walk_turn_odds: 40,
            walk_step: 5.0,
            walk_margin: 80.0,
            arena_width: 390.0,
            waste_policy: WastePolicy::Timed,
            waste_per_hour: 1.0,
            feed_waste_chance: 0.25,
            empty_stomach_at: 0.0,
            max_waste: MAX_WASTE,
            day_night_period_secs: 600.0,
            bubble_secs: 5.0,
            catchup_max_secs: 7 * 24 * 3600,
        }
    }
}

impl Rules {
    pub fn tick_secs(&self) -> f64 {
        self.tick_step_ms.max(1) as f64 / 1000.0
    }
}

/// The opaque record a host persists between sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub last_seen_utc: DateTime<Utc>,
    pub profile: PetProfile,
    pub needs: NeedsState,
    pub waste: WasteState,
    pub clock: EngineClock,
    #[serde(default = "default_daytime")]
    pub is_daytime: bool,
    #[serde(default)]
    pub session: ConversationSession,
}

fn default_daytime() -> bool {
    true
}

impl SaveFile {
    pub fn validate(&self, max_waste: u32) -> PetResult<()> {
        if self.version != SAVE_VERSION {
            return Err(PetError::CorruptedProfile(format!(
                "unsupported save version {}",
                self.version
            )));
        }
        self.profile.validate(self.last_seen_utc.date_naive())?;
        self.needs.validate()?;
        if self.waste.count > max_waste {
            return Err(PetError::CorruptedProfile(format!(
                "waste count {} exceeds {max_waste}",
                self.waste.count
            )));
        }
        Ok(())
    }
}

/// What happened while the host was away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatchupSummary {
    pub elapsed_secs: i64,
    pub clamped: bool,
    pub hunger_lost: f32,
    pub happiness_lost: f32,
    pub waste_spawned: u32,
}

impl CatchupSummary {
    pub fn new() -> Self {
        Self {
            elapsed_secs: 0,
            clamped: false,
            hunger_lost: 0.0,
            happiness_lost: 0.0,
            waste_spawned: 0,
        }
    }

    pub fn has_anything(&self) -> bool {
        self.elapsed_secs > 0
            && (self.hunger_lost >= 1.0 || self.happiness_lost >= 1.0 || self.waste_spawned > 0)
    }
}

impl Default for CatchupSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_together_counts_whole_days_and_never_goes_negative() {
        let p = PetProfile::new(date(2025, 4, 20));
        assert_eq!(p.days_together(date(2025, 4, 20)), 0);
        assert_eq!(p.days_together(date(2025, 5, 20)), 30);
        assert_eq!(p.days_together(date(2025, 4, 1)), 0);
    }

    #[test]
    fn food_parses_loosely() {
        assert_eq!("dog_food".parse::<FoodType>().unwrap(), FoodType::DogFood);
        assert_eq!("Tasty-Meat".parse::<FoodType>().unwrap(), FoodType::TastyMeat);
        assert!(matches!(
            "kibble".parse::<FoodType>(),
            Err(PetError::InvalidCommand(_))
        ));
    }

    #[test]
    fn busy_and_mood_sets_are_disjoint() {
        for s in AnimationState::ALL {
            assert!(!(s.is_busy() && s.is_mood()), "{s}");
        }
        assert!(!AnimationState::Idle.is_busy());
        assert!(!AnimationState::Walking.is_mood());
    }

    #[test]
    fn blank_names_fail_validation() {
        let mut p = PetProfile::new(date(2025, 1, 1));
        p.name = Some("  ".to_string());
        assert!(matches!(
            p.validate(date(2025, 2, 1)),
            Err(PetError::CorruptedProfile(_))
        ));
    }

    #[test]
    fn rules_fill_missing_fields_from_defaults() {
        let r: Rules = serde_json::from_str(r#"{"feed_amount": 10.0}"#).unwrap();
        assert_eq!(r.feed_amount, 10.0);
        assert_eq!(r.tick_step_ms, 300);
    }
}
