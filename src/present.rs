use pupcare::{
    AnimationState, CatchupSummary, ConversationChoice, Facing, FoodType, NeedLevel, Outcome,
    PetSnapshot, Reply,
};

/// Sprite id for the current frame.
pub(crate) fn sprite_id(snap: &PetSnapshot) -> &'static str {
    match snap.state {
        AnimationState::Idle => "puppy_idle_1",
        AnimationState::Walking => match snap.hints.facing {
            Facing::Left => "puppy_walk_left_1",
            Facing::Right => "puppy_walk_right_1",
        },
        AnimationState::Eating => match snap.hints.food {
            Some(FoodType::WeirdDogFood) => "puppy_eating_weird_dog_food",
            Some(FoodType::Treat) => "puppy_eating_treat",
            Some(FoodType::TastyMeat) => "puppy_eating_tasty_meat",
            Some(FoodType::DogFood) | None => "puppy_eating_1",
        },
        AnimationState::Playing => {
            if snap.hints.play_frame == 0 {
                "puppy_playing_1"
            } else {
                "puppy_playing_2"
            }
        }
        AnimationState::Sleeping => "puppy_sleeping_1",
        AnimationState::Happy => "puppy_happy_1",
        AnimationState::Sad => "puppy_sad_1",
        AnimationState::Hungry => "puppy_hungry_1",
        AnimationState::Petting => "puppy_pet",
    }
}

pub(crate) fn background_id(is_daytime: bool) -> &'static str {
    if is_daytime {
        "bg_room_day_portrait"
    } else {
        "bg_room_night_portrait"
    }
}

/// English strings for prompt and reply keys. Unknown keys print as-is.
fn phrase(key: &str) -> &str {
    match key {
        "talk.walk" => "Want to go for a walk?",
        "talk.walk.yes" => "Walk! Walk! Walk!",
        "talk.walk.tail_wag" => "*tail wagging intensifies*",
        "talk.walk.leash" => "*brings you the leash*",
        "talk.hungry" => "Are you hungry?",
        "talk.hungry.yes" => "Always!",
        "talk.hungry.treat" => "Is that a treat in your pocket?",
        "talk.hungry.full" => "*burp* Maybe later.",
        "talk.play" => "Do you want to play?",
        "talk.play.ball" => "Throw the ball!",
        "talk.play.chase" => "Catch me if you can!",
        "talk.play.tired" => "*yawns* Five more minutes.",
        "talk.love" => "Who loves you?",
        "talk.love.lick" => "*licks your face*",
        "talk.love.snuggle" => "*snuggles up close*",
        "talk.good_dog" => "Who's a good dog?",
        "talk.good_dog.proud" => "Me! It's me!",
        "talk.good_dog.spin" => "*spins in a circle*",
        "talk.day" => "How was your day?",
        "talk.day.nap" => "I napped. Twice.",
        "talk.day.squirrel" => "I saw a squirrel!",
        "talk.day.waited" => "I waited by the door all day.",
        other => other,
    }
}

pub(crate) fn reply_line(reply: &Reply) -> String {
    let pet = reply.pet_name.as_deref().unwrap_or("Puppy");
    match reply.key.as_str() {
        "greet.owner_and_pet" => format!(
            "{pet}: Welcome home, {}!",
            reply.owner_name.as_deref().unwrap_or("friend")
        ),
        "greet.owner" => format!(
            "Puppy: Hi {}! *wags tail*",
            reply.owner_name.as_deref().unwrap_or("friend")
        ),
        "greet.pet" => format!("{pet}: Woof! You're back!"),
        "greet.generic" => "Puppy: Woof!".to_string(),
        key => format!("{pet}: {}", phrase(key)),
    }
}

pub(crate) fn choices_lines(choices: &[ConversationChoice]) -> String {
    choices
        .iter()
        .enumerate()
        .map(|(i, c)| format!("  {}) {}", i + 1, phrase(&c.prompt)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn level_tag(level: NeedLevel) -> &'static str {
    match level {
        NeedLevel::Low => "low",
        NeedLevel::Medium => "ok",
        NeedLevel::High => "great",
    }
}

pub(crate) fn status_text(snap: &PetSnapshot) -> String {
    let name = snap.name.as_deref().unwrap_or("Puppy");
    let mut lines = vec![
        format!(
            "{name} is {} ({}, {})",
            snap.state,
            sprite_id(snap),
            background_id(snap.is_daytime)
        ),
        format!(
            "Hunger:    {} {:>5.1} {}",
            bar(snap.needs.hunger / 100.0, 20),
            snap.needs.hunger,
            level_tag(snap.needs.hunger_level)
        ),
        format!(
            "Happiness: {} {:>5.1} {}",
            bar(snap.needs.happiness / 100.0, 20),
            snap.needs.happiness,
            level_tag(snap.needs.happiness_level)
        ),
        format!("Waste:     {}", snap.waste.count),
        format!(
            "{} | together {} day(s) | last care {}",
            if snap.is_daytime { "Day" } else { "Night" },
            snap.days_together,
            ago(snap.since_last_care_secs)
        ),
    ];
    if let Some(owner) = &snap.owner_name {
        lines.push(format!("Owner:     {owner}"));
    }
    if let Some(reply) = &snap.bubble {
        lines.push(format!("  \"{}\"", reply_line(reply)));
    }
    if !snap.offered.is_empty() {
        lines.push("Say something (pupcare choose <n>):".to_string());
        lines.push(choices_lines(&snap.offered));
    }
    lines.join("\n")
}

pub(crate) fn outcome_text(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Needs(n) => Some(format!(
            "hunger {:.1}, happiness {:.1}",
            n.hunger, n.happiness
        )),
        Outcome::Waste(w) => Some(format!("cleaned up {} mess(es)", w.removed)),
        Outcome::Choices(c) => Some(format!(
            "Say something (pupcare choose <n>):\n{}",
            choices_lines(c)
        )),
        Outcome::Reply(r) => Some(reply_line(r)),
        Outcome::Animation(s) => Some(format!("now {s}")),
        Outcome::Profile(p) => Some(format!(
            "{} / owner {} / adopted {}",
            p.name.as_deref().unwrap_or("(unnamed)"),
            p.owner_name.as_deref().unwrap_or("(unknown)"),
            p.adoption_date
        )),
        Outcome::Daytime(d) => Some(if *d { "it is day" } else { "it is night" }.to_string()),
        Outcome::Done => None,
    }
}

pub(crate) fn recap_text(s: &CatchupSummary) -> String {
    let mut out = format!("While you were away ({}):", ago(s.elapsed_secs));
    if s.clamped {
        out.push_str(" (only the last week counted)");
    }
    out.push_str(&format!(
        "\n  hunger -{:.1}, happiness -{:.1}, new messes {}",
        s.hunger_lost, s.happiness_lost, s.waste_spawned
    ));
    out
}

fn ago(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d{}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}
