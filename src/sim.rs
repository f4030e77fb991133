use crate::anim::{AnimationStateMachine, PresentationHints};
use crate::clock::{Clock, InteractionClock, SystemClock};
use crate::conversation::{
    personalized_greeting, respond, ChoiceId, ConversationChoice, ConversationEngine,
    ConversationSession, Reply,
};
use crate::daynight::TimeOfDayScheduler;
use crate::error::{PetError, PetResult};
use crate::model::{
    AnimationState, CatchupSummary, EngineClock, FoodType, NeedsState, PetProfile, Rules,
    SaveFile, WasteState, SAVE_VERSION,
};
use crate::needs::NeedsSnapshot;
use crate::waste::WasteSnapshot;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum PetCommand {
    Feed(FoodType),
    Play,
    Pet,
    Clean,
    OfferConversation,
    SelectChoice(ChoiceId),
    CancelConversation,
    Greet,
    Nap,
    MiniGame(i32),
    Rename(String),
    RenameOwner(String),
    SetAdoptionDate(NaiveDate),
    SetDaytime(bool),
    ToggleDaytime,
    StartDayTimer,
    StopDayTimer,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Needs(NeedsSnapshot),
    Waste(WasteSnapshot),
    Choices(Vec<ConversationChoice>),
    Reply(Reply),
    Animation(AnimationState),
    Profile(PetProfile),
    Daytime(bool),
    Done,
}

/// Everything a host needs to draw one frame. Read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetSnapshot {
    pub state: AnimationState,
    pub needs: NeedsSnapshot,
    pub waste: WasteSnapshot,
    pub is_daytime: bool,
    pub day_timer_running: bool,
    pub bubble: Option<Reply>,
    pub offered: Vec<ConversationChoice>,
    pub hints: PresentationHints,
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub days_together: u32,
    pub since_last_care_secs: i64,
}

/// The care engine. Sole owner and writer of the pet's state; hosts drive it
/// with commands and ticks and read [`PetSnapshot`]s back.
pub struct Engine<C = SystemClock, R = SmallRng> {
    rules: Rules,
    profile: PetProfile,
    needs: NeedsState,
    waste: WasteState,
    day: TimeOfDayScheduler,
    talk: ConversationEngine,
    session: ConversationSession,
    clock: InteractionClock,
    anim: AnimationStateMachine,
    step_accum: f64,
    time: C,
    rng: R,
}

impl Engine<SystemClock, SmallRng> {
    /// Seed 0 draws from OS entropy.
    pub fn seeded(rules: Rules, seed: u64) -> Self {
        Engine::new(rules, SystemClock, seeded_rng(seed))
    }
}

pub fn seeded_rng(seed: u64) -> SmallRng {
    if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    }
}

impl<C: Clock, R: Rng> Engine<C, R> {
    pub fn new(rules: Rules, time: C, rng: R) -> Self {
        let now = time.now();
        let profile = PetProfile::new(now.date_naive());
        Self::assemble(
            rules,
            profile,
            NeedsState::default(),
            WasteState::default(),
            EngineClock::starting_at(now),
            true,
            ConversationSession::default(),
            time,
            rng,
        )
    }

    /// Rebuilds an engine from a persisted record, optionally applying the
    /// decay owed for the time since `last_seen_utc`.
    pub fn from_save(
        save: SaveFile,
        rules: Rules,
        time: C,
        rng: R,
        catch_up: bool,
    ) -> (Self, CatchupSummary) {
        let last_seen = save.last_seen_utc;
        let mut engine = Self::assemble(
            rules,
            save.profile,
            save.needs,
            save.waste,
            save.clock,
            save.is_daytime,
            save.session,
            time,
            rng,
        );
        let now = engine.time.now();
        let summary = if catch_up {
            engine.catch_up(last_seen, now)
        } else {
            // Needs stay frozen, but a bubble is wall-clock and still fades.
            let away = (now - last_seen).num_milliseconds().max(0) as f64 / 1000.0;
            engine.age_bubble(away);
            CatchupSummary::new()
        };
        (engine, summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        rules: Rules,
        profile: PetProfile,
        needs: NeedsState,
        waste: WasteState,
        clock: EngineClock,
        is_daytime: bool,
        session: ConversationSession,
        time: C,
        rng: R,
    ) -> Self {
        let day = TimeOfDayScheduler::new(is_daytime, rules.day_night_period_secs);
        let anim = AnimationStateMachine::new(&rules);
        Self {
            rules,
            profile,
            needs,
            waste,
            day,
            talk: ConversationEngine::default(),
            session,
            clock: InteractionClock::new(clock),
            anim,
            step_accum: 0.0,
            time,
            rng,
        }
    }

    pub fn with_conversations(mut self, talk: ConversationEngine) -> Self {
        self.talk = talk;
        self.session = ConversationSession::default();
        self
    }

    pub fn to_save(&self) -> SaveFile {
        SaveFile {
            version: SAVE_VERSION,
            last_seen_utc: self.time.now(),
            profile: self.profile.clone(),
            needs: self.needs,
            waste: self.waste,
            clock: self.clock.record().clone(),
            is_daytime: self.day.is_daytime(),
            session: self.session.clone(),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn profile(&self) -> &PetProfile {
        &self.profile
    }

    pub fn needs(&self) -> NeedsState {
        self.needs
    }

    pub fn waste(&self) -> WasteState {
        self.waste
    }

    pub fn state(&self) -> AnimationState {
        self.anim.state()
    }

    pub fn is_daytime(&self) -> bool {
        self.day.is_daytime()
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn interaction_clock(&self) -> &InteractionClock {
        &self.clock
    }

    pub fn elapsed_since_last_care(&self) -> ChronoDuration {
        self.clock.elapsed_since_last_care(self.time.now())
    }

    pub fn apply(&mut self, cmd: PetCommand) -> PetResult<Outcome> {
        let out = match cmd {
            PetCommand::Feed(food) => Outcome::Needs(self.feed(food)?),
            PetCommand::Play => Outcome::Needs(self.play()?),
            PetCommand::Pet => Outcome::Needs(self.pet()),
            PetCommand::Clean => Outcome::Waste(self.clean()),
            PetCommand::OfferConversation => Outcome::Choices(self.offer_conversation()?),
            PetCommand::SelectChoice(id) => Outcome::Reply(self.select_choice(id)?),
            PetCommand::CancelConversation => {
                self.cancel_conversation();
                Outcome::Done
            }
            PetCommand::Greet => Outcome::Reply(self.greet()?),
            PetCommand::Nap => Outcome::Animation(self.nap()?),
            PetCommand::MiniGame(delta) => Outcome::Needs(self.apply_happiness_delta(delta)),
            PetCommand::Rename(name) => {
                self.save_name(&name)?;
                Outcome::Profile(self.profile.clone())
            }
            PetCommand::RenameOwner(name) => {
                self.save_owner_name(&name)?;
                Outcome::Profile(self.profile.clone())
            }
            PetCommand::SetAdoptionDate(date) => {
                self.save_adoption_date(date)?;
                Outcome::Profile(self.profile.clone())
            }
            PetCommand::SetDaytime(v) => {
                self.set_time_of_day(v);
                Outcome::Daytime(v)
            }
            PetCommand::ToggleDaytime => Outcome::Daytime(self.toggle_time_of_day()),
            PetCommand::StartDayTimer => {
                self.start_time_of_day_timer();
                Outcome::Done
            }
            PetCommand::StopDayTimer => {
                self.stop_time_of_day_timer();
                Outcome::Done
            }
        };
        Ok(out)
    }

    fn reject<T>(&self, msg: String) -> PetResult<T> {
        warn!(state = %self.anim.state(), "rejected: {msg}");
        Err(PetError::invalid(msg))
    }

    pub fn feed(&mut self, food: FoodType) -> PetResult<NeedsSnapshot> {
        if self.anim.state() == AnimationState::Eating {
            return self.reject("already eating".to_string());
        }
        if let Some(full) = self.rules.refuse_feed_at {
            if self.needs.hunger >= full {
                return self.reject(format!("too full to eat ({:.0})", self.needs.hunger));
            }
        }
        self.needs.feed(food, &self.rules);
        let spawned = self.waste.feed_spawn(&self.rules, &mut self.rng);
        self.anim.begin_busy(AnimationState::Eating, Some(food));
        self.clock.cared(self.time.now());
        info!(food = food.key(), hunger = self.needs.hunger, spawned, "fed");
        Ok(self.needs.snapshot())
    }

    pub fn play(&mut self) -> PetResult<NeedsSnapshot> {
        if self.anim.state() == AnimationState::Playing {
            return self.reject("already playing".to_string());
        }
        self.needs.play(&self.rules);
        self.anim.begin_busy(AnimationState::Playing, None);
        self.clock.touch(self.time.now());
        info!(happiness = self.needs.happiness, "played");
        Ok(self.needs.snapshot())
    }

    /// Always accepted; petting again restarts the petting hold.
    pub fn pet(&mut self) -> NeedsSnapshot {
        self.needs.pet(&self.rules);
        self.anim.begin_busy(AnimationState::Petting, None);
        self.clock.touch(self.time.now());
        info!(happiness = self.needs.happiness, "petted");
        self.needs.snapshot()
    }

    pub fn clean(&mut self) -> WasteSnapshot {
        let snap = self.waste.clean();
        self.clock.cared(self.time.now());
        info!(removed = snap.removed, "cleaned");
        snap
    }

    /// Score reported by an external mini-game.
    pub fn apply_happiness_delta(&mut self, delta: i32) -> NeedsSnapshot {
        self.needs.adjust_happiness(delta as f32);
        self.clock.touch(self.time.now());
        info!(delta, happiness = self.needs.happiness, "mini-game result");
        self.needs.snapshot()
    }

    pub fn nap(&mut self) -> PetResult<AnimationState> {
        if self.anim.state().is_busy() {
            return self.reject(format!("cannot nap while {}", self.anim.state()));
        }
        self.anim.begin_mood(AnimationState::Sleeping);
        self.clock.touch(self.time.now());
        Ok(self.anim.state())
    }

    pub fn offer_conversation(&mut self) -> PetResult<Vec<ConversationChoice>> {
        if self.session.is_active() {
            return self.reject("a conversation is already open".to_string());
        }
        let offered = self.talk.offer_choices(&mut self.rng);
        self.session.offered = offered.clone();
        self.clock.touch(self.time.now());
        debug!(count = offered.len(), "conversation offered");
        Ok(offered)
    }

    pub fn select_choice(&mut self, id: ChoiceId) -> PetResult<Reply> {
        let Some(choice) = self.session.offered.iter().find(|c| c.id == id).cloned() else {
            return self.reject(format!("choice {} is not on offer", id.0));
        };
        let reply = respond(&choice, &mut self.rng)?;
        self.session.show(reply.clone());
        self.clock.talked(self.time.now());
        info!(prompt = %choice.prompt, reply = %reply.key, "conversation");
        Ok(reply)
    }

    /// Drops the offered choices and dismisses any bubble still showing.
    pub fn cancel_conversation(&mut self) {
        self.session.offered.clear();
        self.session.bubble = None;
        self.clock.touch(self.time.now());
    }

    pub fn greet(&mut self) -> PetResult<Reply> {
        if self.session.is_active() {
            return self.reject("a conversation is already open".to_string());
        }
        if matches!(
            self.anim.state(),
            AnimationState::Eating | AnimationState::Playing
        ) {
            return self.reject(format!("cannot greet while {}", self.anim.state()));
        }
        let reply = personalized_greeting(&self.profile);
        self.session.show(reply.clone());
        self.clock.talked(self.time.now());
        Ok(reply)
    }

    /// Naming the pet for the first time also starts the days-together count.
    pub fn save_name(&mut self, name: &str) -> PetResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.reject("name is required".to_string());
        }
        if self.profile.name.is_none() {
            self.profile.adoption_date = self.time.today();
        }
        self.profile.name = Some(name.to_string());
        self.clock.touch(self.time.now());
        info!(name, "pet named");
        Ok(())
    }

    pub fn save_owner_name(&mut self, name: &str) -> PetResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.reject("owner name is required".to_string());
        }
        self.profile.owner_name = Some(name.to_string());
        self.clock.touch(self.time.now());
        info!(owner = name, "owner named");
        Ok(())
    }

    pub fn save_adoption_date(&mut self, date: NaiveDate) -> PetResult<()> {
        if date > self.time.today() {
            return self.reject(format!("adoption date {date} is in the future"));
        }
        self.profile.adoption_date = date;
        self.clock.touch(self.time.now());
        Ok(())
    }

    pub fn days_together(&self) -> u32 {
        self.profile.days_together(self.time.today())
    }

    pub fn set_time_of_day(&mut self, is_daytime: bool) {
        self.day.set(is_daytime);
        self.clock.touch(self.time.now());
    }

    pub fn toggle_time_of_day(&mut self) -> bool {
        self.clock.touch(self.time.now());
        self.day.toggle()
    }

    pub fn start_time_of_day_timer(&mut self) {
        self.day.start();
    }

    pub fn stop_time_of_day_timer(&mut self) {
        self.day.stop();
    }

    /// Host-driven day/night timer; independent of [`Engine::tick`].
    pub fn advance_time_of_day(&mut self, elapsed_secs: f64) -> u32 {
        self.day.advance(elapsed_secs)
    }

    /// One animation step, plus decay, waste and bubble ageing for the
    /// `elapsed_secs` the host says passed since the previous tick.
    pub fn tick(&mut self, elapsed_secs: f64) -> AnimationState {
        let elapsed = if elapsed_secs.is_finite() {
            elapsed_secs.max(0.0)
        } else {
            0.0
        };
        let hunger_before = self.needs.hunger;
        self.needs.decay(elapsed, &self.rules);
        let spawned = self
            .waste
            .tick_spawn(elapsed, hunger_before, &self.rules, &mut self.rng);
        if spawned > 0 {
            debug!(spawned, count = self.waste.count, "waste appeared");
        }
        self.age_bubble(elapsed);
        self.anim
            .step(&self.needs, self.waste.count, &self.rules, &mut self.rng)
    }

    /// Fixed-step driver: banks host time and runs as many whole ticks as fit.
    pub fn advance(&mut self, elapsed_secs: f64) -> AnimationState {
        if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
            self.step_accum += elapsed_secs;
        }
        let step = self.rules.tick_secs();
        while self.step_accum >= step {
            self.step_accum -= step;
            self.tick(step);
        }
        self.anim.state()
    }

    /// Applies what was owed for time spent away, capped at
    /// `catchup_max_secs`. The behavior loop is not replayed.
    pub fn catch_up(&mut self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> CatchupSummary {
        let max_elapsed = ChronoDuration::seconds(self.rules.catchup_max_secs.max(0));
        let raw = now - last_seen;
        let elapsed = raw.clamp(ChronoDuration::zero(), max_elapsed);

        let mut summary = CatchupSummary::new();
        summary.elapsed_secs = elapsed.num_seconds();
        summary.clamped = raw > max_elapsed;

        let before = self.needs;
        let secs = elapsed.num_milliseconds() as f64 / 1000.0;
        self.needs.decay(secs, &self.rules);
        let fed_secs = secs.min(self.secs_until_empty(before.hunger));
        summary.waste_spawned =
            self.waste
                .tick_spawn(fed_secs, before.hunger, &self.rules, &mut self.rng);
        self.age_bubble(secs);
        summary.hunger_lost = before.hunger - self.needs.hunger;
        summary.happiness_lost = before.happiness - self.needs.happiness;
        self.anim.reset();
        self.step_accum = 0.0;

        if summary.has_anything() {
            info!(
                elapsed = summary.elapsed_secs,
                clamped = summary.clamped,
                hunger_lost = summary.hunger_lost,
                happiness_lost = summary.happiness_lost,
                waste = summary.waste_spawned,
                "caught up"
            );
        }
        summary
    }

    /// How long decay takes to bring `hunger` down to `empty_stomach_at`.
    fn secs_until_empty(&self, hunger: f32) -> f64 {
        let rate = self.rules.hunger_decay_per_min;
        if !(rate > 0.0) {
            return f64::INFINITY;
        }
        let left = (hunger - self.rules.empty_stomach_at).max(0.0);
        f64::from(left / rate) * 60.0
    }

    fn age_bubble(&mut self, elapsed_secs: f64) {
        if self.session.expire(elapsed_secs, self.rules.bubble_secs) {
            debug!("conversation bubble hidden");
        }
    }

    pub fn snapshot(&self) -> PetSnapshot {
        PetSnapshot {
            state: self.anim.state(),
            needs: self.needs.snapshot(),
            waste: self.waste.snapshot(),
            is_daytime: self.day.is_daytime(),
            day_timer_running: self.day.is_running(),
            bubble: self.session.bubble.as_ref().map(|b| b.reply.clone()),
            offered: self.session.offered.clone(),
            hints: self.anim.hints(),
            name: self.profile.name.clone(),
            owner_name: self.profile.owner_name.clone(),
            days_together: self.days_together(),
            since_last_care_secs: self.elapsed_since_last_care().num_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap()
    }

    fn engine(clock: &ManualClock) -> Engine<&ManualClock, StepRng> {
        Engine::new(Rules::default(), clock, StepRng::new(0, 0))
    }

    #[test]
    fn apply_dispatches_to_commands() {
        let clock = ManualClock::new(t0());
        let mut e = engine(&clock);
        match e.apply(PetCommand::Feed(FoodType::DogFood)).unwrap() {
            Outcome::Needs(n) => assert_eq!(n.hunger, 100.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(e.state(), AnimationState::Eating);
        assert!(matches!(
            e.apply(PetCommand::Feed(FoodType::Treat)),
            Err(PetError::InvalidCommand(_))
        ));
        assert_eq!(
            e.apply(PetCommand::ToggleDaytime).unwrap(),
            Outcome::Daytime(false)
        );
    }

    #[test]
    fn advance_runs_whole_steps_only() {
        let clock = ManualClock::new(t0());
        let mut e = engine(&clock);
        e.pet();
        // 9 full steps fit in 2.75s; the tenth would end petting.
        e.advance(2.75);
        assert_eq!(e.state(), AnimationState::Petting);
        e.advance(0.3);
        assert_ne!(e.state(), AnimationState::Petting);
    }

    #[test]
    fn first_naming_sets_adoption_date() {
        let clock = ManualClock::new(t0());
        let mut e = engine(&clock);
        clock.advance(ChronoDuration::days(3));
        e.save_name("  Pochi ").unwrap();
        assert_eq!(e.profile().name.as_deref(), Some("Pochi"));
        assert_eq!(e.profile().adoption_date, clock.today());

        clock.advance(ChronoDuration::days(2));
        e.save_name("Koro").unwrap();
        assert_eq!(e.days_together(), 2);
        assert!(e.save_name("   ").is_err());
        assert_eq!(e.profile().name.as_deref(), Some("Koro"));
    }

    #[test]
    fn accepted_commands_touch_the_clock() {
        let clock = ManualClock::new(t0());
        let mut e = engine(&clock);
        clock.advance(ChronoDuration::minutes(10));
        e.apply(PetCommand::RenameOwner("Aki".into())).unwrap();
        let at = e.interaction_clock().record().last_interaction_at;
        assert_eq!(at, clock.now());
        assert_eq!(e.interaction_clock().record().last_care_at, t0());

        clock.advance(ChronoDuration::minutes(1));
        assert!(e.apply(PetCommand::RenameOwner(" ".into())).is_err());
        assert_eq!(e.interaction_clock().record().last_interaction_at, at);
    }

    #[test]
    fn catch_up_is_capped() {
        let clock = ManualClock::new(t0());
        let mut e = engine(&clock);
        let s = e.catch_up(t0(), t0() + ChronoDuration::days(30));
        assert!(s.clamped);
        assert_eq!(s.elapsed_secs, 7 * 24 * 3600);
        assert_eq!(e.needs().hunger, 0.0);
        // Waste stops once the stomach is empty: 80 minutes of food is 1.33
        // expected units, and the zero rng takes the fractional roll.
        assert_eq!(e.waste().count, 2);
        assert!(s.waste_spawned < e.rules().max_waste);
    }
}
