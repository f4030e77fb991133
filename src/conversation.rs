//! Scripted talk: prompt/response tables and the per-screen session.
//!
//! Everything here is a key. The host looks keys up in its own string tables;
//! names travel alongside so a greeting can be personalized.

use crate::error::{PetError, PetResult};
use crate::model::PetProfile;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const CHOICES_PER_OFFER: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoiceId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationChoice {
    pub id: ChoiceId,
    pub prompt: String,
    pub responses: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub key: String,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
}

impl Reply {
    fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            pet_name: None,
            owner_name: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub reply: Reply,
    pub shown_secs: f64,
}

/// At most one bubble or one choice set is live at a time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    #[serde(default)]
    pub offered: Vec<ConversationChoice>,
    #[serde(default)]
    pub bubble: Option<Bubble>,
}

impl ConversationSession {
    pub fn is_active(&self) -> bool {
        !self.offered.is_empty() || self.bubble.is_some()
    }

    pub(crate) fn show(&mut self, reply: Reply) {
        self.offered.clear();
        self.bubble = Some(Bubble {
            reply,
            shown_secs: 0.0,
        });
    }

    /// Ages the bubble; true when it just went away.
    pub(crate) fn expire(&mut self, elapsed_secs: f64, lifetime_secs: f64) -> bool {
        let Some(bubble) = self.bubble.as_mut() else {
            return false;
        };
        if elapsed_secs > 0.0 {
            bubble.shown_secs += elapsed_secs;
        }
        if bubble.shown_secs >= lifetime_secs {
            self.bubble = None;
            return true;
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct ConversationEngine {
    pool: Vec<ConversationChoice>,
}

impl ConversationEngine {
    /// Ids are positions in `table`.
    pub fn new<P, R>(table: impl IntoIterator<Item = (P, Vec<R>)>) -> Self
    where
        P: Into<String>,
        R: Into<String>,
    {
        let pool = table
            .into_iter()
            .enumerate()
            .map(|(i, (prompt, responses))| ConversationChoice {
                id: ChoiceId(i),
                prompt: prompt.into(),
                responses: responses.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { pool }
    }

    pub fn pool(&self) -> &[ConversationChoice] {
        &self.pool
    }

    pub fn choice(&self, id: ChoiceId) -> Option<&ConversationChoice> {
        self.pool.get(id.0)
    }

    pub fn offer_choices<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ConversationChoice> {
        offer_choices(&self.pool, CHOICES_PER_OFFER, rng)
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new(default_table())
    }
}

/// Up to `count` choices with distinct prompts, drawn without replacement.
/// Never fails; a short pool yields what it has.
pub fn offer_choices<R: Rng + ?Sized>(
    pool: &[ConversationChoice],
    count: usize,
    rng: &mut R,
) -> Vec<ConversationChoice> {
    let mut seen = HashSet::new();
    let distinct: Vec<&ConversationChoice> = pool
        .iter()
        .filter(|c| seen.insert(c.prompt.as_str()))
        .collect();
    distinct
        .choose_multiple(rng, count)
        .map(|c| (*c).clone())
        .collect()
}

pub fn respond<R: Rng + ?Sized>(choice: &ConversationChoice, rng: &mut R) -> PetResult<Reply> {
    choice
        .responses
        .choose(rng)
        .map(|key| Reply::plain(key))
        .ok_or_else(|| PetError::EmptyResponseSet(choice.prompt.clone()))
}

pub fn personalized_greeting(profile: &PetProfile) -> Reply {
    let key = match (&profile.owner_name, &profile.name) {
        (Some(_), Some(_)) => "greet.owner_and_pet",
        (Some(_), None) => "greet.owner",
        (None, Some(_)) => "greet.pet",
        (None, None) => "greet.generic",
    };
    Reply {
        key: key.to_string(),
        pet_name: profile.name.clone(),
        owner_name: profile.owner_name.clone(),
    }
}

fn default_table() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (
            "talk.walk",
            vec!["talk.walk.yes", "talk.walk.tail_wag", "talk.walk.leash"],
        ),
        (
            "talk.hungry",
            vec!["talk.hungry.yes", "talk.hungry.treat", "talk.hungry.full"],
        ),
        (
            "talk.play",
            vec!["talk.play.ball", "talk.play.chase", "talk.play.tired"],
        ),
        (
            "talk.love",
            vec!["talk.love.lick", "talk.love.snuggle"],
        ),
        (
            "talk.good_dog",
            vec!["talk.good_dog.proud", "talk.good_dog.spin"],
        ),
        (
            "talk.day",
            vec!["talk.day.nap", "talk.day.squirrel", "talk.day.waited"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn default_pool_is_well_formed() {
        let eng = ConversationEngine::default();
        assert!(eng.pool().len() >= CHOICES_PER_OFFER);
        for (i, c) in eng.pool().iter().enumerate() {
            assert_eq!(c.id, ChoiceId(i));
            assert!(!c.responses.is_empty(), "{}", c.prompt);
        }
    }

    #[test]
    fn offers_two_distinct_prompts() {
        let eng = ConversationEngine::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let offer = eng.offer_choices(&mut rng);
            assert_eq!(offer.len(), 2);
            assert_ne!(offer[0].prompt, offer[1].prompt);
        }
    }

    #[test]
    fn duplicate_prompts_are_offered_once() {
        let eng = ConversationEngine::new(vec![
            ("a", vec!["a.1"]),
            ("a", vec!["a.2"]),
            ("b", vec!["b.1"]),
        ]);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..50 {
            let offer = eng.offer_choices(&mut rng);
            assert_eq!(offer.len(), 2);
            assert_ne!(offer[0].prompt, offer[1].prompt);
        }
    }

    #[test]
    fn short_pool_returns_what_it_has() {
        let one = ConversationEngine::new(vec![("only", vec!["only.1"])]);
        let mut rng = StepRng::new(0, 1);
        assert_eq!(one.offer_choices(&mut rng).len(), 1);

        let none = ConversationEngine::new(Vec::<(&str, Vec<&str>)>::new());
        assert!(none.offer_choices(&mut rng).is_empty());
    }

    #[test]
    fn respond_picks_from_responses() {
        let eng = ConversationEngine::default();
        let choice = &eng.pool()[0];
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let reply = respond(choice, &mut rng).unwrap();
            assert!(choice.responses.contains(&reply.key));
        }
    }

    #[test]
    fn respond_rejects_empty_set() {
        let eng = ConversationEngine::new(vec![("mute", Vec::<&str>::new())]);
        let mut rng = StepRng::new(0, 1);
        assert!(matches!(
            respond(&eng.pool()[0], &mut rng),
            Err(PetError::EmptyResponseSet(p)) if p == "mute"
        ));
    }

    #[test]
    fn greeting_uses_whatever_names_exist() {
        let mut p = PetProfile::new(NaiveDate::from_ymd_opt(2025, 4, 20).unwrap());
        assert_eq!(personalized_greeting(&p).key, "greet.generic");
        p.name = Some("Pochi".into());
        assert_eq!(personalized_greeting(&p).key, "greet.pet");
        p.owner_name = Some("Nozomi".into());
        let r = personalized_greeting(&p);
        assert_eq!(r.key, "greet.owner_and_pet");
        assert_eq!(r.owner_name.as_deref(), Some("Nozomi"));
        assert_eq!(r.pet_name.as_deref(), Some("Pochi"));
    }

    #[test]
    fn bubble_expires_after_lifetime() {
        let mut s = ConversationSession::default();
        assert!(!s.expire(1.0, 5.0));
        s.show(Reply::plain("x"));
        assert!(s.is_active());
        assert!(!s.expire(4.0, 5.0));
        assert!(s.expire(1.0, 5.0));
        assert!(!s.is_active());
    }
}
