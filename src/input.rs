use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pupcare::{ChoiceId, FoodType, PetCommand, PetError, PetResult, PetSnapshot};
use std::path::PathBuf;

const MAX_SPAN_SECS: f64 = 7.0 * 24.0 * 3600.0;

#[derive(Parser, Debug)]
#[command(name = "pupcare")]
#[command(about = "Look after a virtual puppy from the terminal", long_about = None)]
pub(crate) struct Cli {
    /// Log accepted commands
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    /// Log every state transition
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) debug: bool,

    /// Directory holding save.json and settings.json (default: platform data dir)
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Cmd {
    /// Show how the puppy is doing
    Status,
    /// Feed: weird_dog_food | dog_food | treat | tasty_meat
    Feed {
        #[arg(default_value = "dog_food")]
        food: String,
    },
    Play,
    Pet,
    Clean,
    /// Offer two things to say
    Talk,
    /// Pick one of the offered things to say (1-based)
    Choose { n: usize },
    /// Drop the offered choices
    Cancel,
    Greet,
    Nap,
    /// Report a mini-game result (happiness delta)
    Minigame {
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    /// Name the puppy
    Name { name: String },
    /// Tell the puppy your name
    Owner { name: String },
    /// Set the adoption date (YYYY-MM-DD)
    Adopted { date: NaiveDate },
    /// day | night | toggle
    Day { mode: String },
    /// Run the simulation headless for a span of time
    Simulate {
        #[arg(long, default_value_t = 60.0)]
        seconds: f64,
    },
    /// Run in real time, printing each behavior change
    Watch {
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
        /// Frames per second for the host loop
        #[arg(long, default_value_t = 30)]
        fps: u32,
    },
}

pub(crate) enum HostAction {
    Engine(PetCommand),
    Status,
    Simulate { seconds: f64 },
    Watch { seconds: f64, fps: u32 },
}

pub(crate) fn map_cmd_to_action(cmd: Cmd, snap: &PetSnapshot) -> PetResult<HostAction> {
    let engine = |c| Ok(HostAction::Engine(c));
    match cmd {
        Cmd::Status => Ok(HostAction::Status),
        Cmd::Feed { food } => engine(PetCommand::Feed(food.parse::<FoodType>()?)),
        Cmd::Play => engine(PetCommand::Play),
        Cmd::Pet => engine(PetCommand::Pet),
        Cmd::Clean => engine(PetCommand::Clean),
        Cmd::Talk => engine(PetCommand::OfferConversation),
        Cmd::Choose { n } => {
            let id = choice_at(snap, n)?;
            engine(PetCommand::SelectChoice(id))
        }
        Cmd::Cancel => engine(PetCommand::CancelConversation),
        Cmd::Greet => engine(PetCommand::Greet),
        Cmd::Nap => engine(PetCommand::Nap),
        Cmd::Minigame { delta } => engine(PetCommand::MiniGame(delta)),
        Cmd::Name { name } => engine(PetCommand::Rename(name)),
        Cmd::Owner { name } => engine(PetCommand::RenameOwner(name)),
        Cmd::Adopted { date } => engine(PetCommand::SetAdoptionDate(date)),
        Cmd::Day { mode } => match mode.to_ascii_lowercase().as_str() {
            "day" | "on" => engine(PetCommand::SetDaytime(true)),
            "night" | "off" => engine(PetCommand::SetDaytime(false)),
            "toggle" => engine(PetCommand::ToggleDaytime),
            other => Err(PetError::InvalidCommand(format!("unknown day mode `{other}`"))),
        },
        Cmd::Simulate { seconds } => Ok(HostAction::Simulate {
            seconds: span(seconds),
        }),
        Cmd::Watch { seconds, fps } => Ok(HostAction::Watch {
            seconds: span(seconds),
            fps: fps.clamp(10, 240),
        }),
    }
}

/// Non-finite or negative spans become 0; at most one week.
fn span(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.clamp(0.0, MAX_SPAN_SECS)
    } else {
        0.0
    }
}

fn choice_at(snap: &PetSnapshot, n: usize) -> PetResult<ChoiceId> {
    n.checked_sub(1)
        .and_then(|i| snap.offered.get(i))
        .map(|c| c.id)
        .ok_or_else(|| {
            PetError::InvalidCommand(format!(
                "no choice #{n} on offer (run `pupcare talk` first)"
            ))
        })
}
