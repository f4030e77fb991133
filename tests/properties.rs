use chrono::{TimeZone, Utc};
use pupcare::{
    AnimationState, ChoiceId, ConversationEngine, Engine, FoodType, ManualClock, PetCommand,
    Rules,
};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashSet;

#[derive(Clone, Debug)]
enum Step {
    Cmd(PetCommand),
    Tick(f64),
}

fn command() -> impl Strategy<Value = PetCommand> {
    prop_oneof![
        (0_usize..4).prop_map(|i| PetCommand::Feed(FoodType::ALL[i])),
        Just(PetCommand::Play),
        Just(PetCommand::Pet),
        Just(PetCommand::Clean),
        Just(PetCommand::OfferConversation),
        (0_usize..8).prop_map(|i| PetCommand::SelectChoice(ChoiceId(i))),
        Just(PetCommand::CancelConversation),
        Just(PetCommand::Greet),
        Just(PetCommand::Nap),
        (-200_i32..200).prop_map(PetCommand::MiniGame),
        Just(PetCommand::ToggleDaytime),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        command().prop_map(Step::Cmd),
        (0.0_f64..7200.0).prop_map(Step::Tick),
    ]
}

fn run(seed: u64, steps: &[Step]) -> Vec<pupcare::PetSnapshot> {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap());
    let mut e = Engine::new(Rules::default(), &clock, SmallRng::seed_from_u64(seed));
    let mut out = Vec::with_capacity(steps.len());
    for s in steps {
        match s {
            Step::Cmd(c) => {
                let _ = e.apply(c.clone());
            }
            Step::Tick(secs) => {
                e.tick(*secs);
            }
        }
        out.push(e.snapshot());
    }
    out
}

proptest! {
    #[test]
    fn needs_and_waste_stay_in_bounds(seed in 1_u64..10_000, steps in prop::collection::vec(step(), 1..80)) {
        let max_waste = Rules::default().max_waste;
        for snap in run(seed, &steps) {
            prop_assert!((0.0..=100.0).contains(&snap.needs.hunger));
            prop_assert!((0.0..=100.0).contains(&snap.needs.happiness));
            prop_assert!(snap.waste.count <= max_waste);
            prop_assert!(AnimationState::ALL.contains(&snap.state));
            prop_assert!(snap.offered.is_empty() || snap.bubble.is_none());
        }
    }

    #[test]
    fn same_seed_same_story(seed in 1_u64..10_000, steps in prop::collection::vec(step(), 1..40)) {
        prop_assert_eq!(run(seed, &steps), run(seed, &steps));
    }

    #[test]
    fn offered_prompts_are_distinct(seed in any::<u64>()) {
        let talk = ConversationEngine::new(vec![
            ("talk.walk", vec!["a"]),
            ("talk.walk", vec!["b"]),
            ("talk.play", vec!["c"]),
            ("talk.love", vec!["d"]),
        ]);
        let mut rng = SmallRng::seed_from_u64(seed);
        let offered = talk.offer_choices(&mut rng);
        prop_assert_eq!(offered.len(), 2);
        let prompts: HashSet<_> = offered.iter().map(|c| c.prompt.as_str()).collect();
        prop_assert_eq!(prompts.len(), 2);
    }

    #[test]
    fn forced_states_win_from_idle(hunger in 0.0_f32..100.0, happiness in 0.0_f32..100.0, waste in 0_u32..10) {
        let rules = Rules::default();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap());
        let mut save = Engine::new(rules.clone(), &clock, SmallRng::seed_from_u64(1)).to_save();
        save.needs.hunger = hunger;
        save.needs.happiness = happiness;
        save.waste.count = waste;
        let (mut e, _) = Engine::from_save(save, rules.clone(), &clock, SmallRng::seed_from_u64(2), false);
        let next = e.tick(0.0);
        if hunger < rules.hungry_below {
            prop_assert_eq!(next, AnimationState::Hungry);
        } else if happiness < rules.sad_below || waste >= rules.sad_waste_at {
            prop_assert_eq!(next, AnimationState::Sad);
        } else {
            prop_assert!(matches!(next, AnimationState::Idle | AnimationState::Walking));
        }
    }
}
