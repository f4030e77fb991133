//! A virtual-pet care engine.
//!
//! [`Engine`] owns the pet's needs, waste, day/night flag, conversation state
//! and behavior. Hosts issue commands, call [`Engine::tick`] on a fixed
//! interval and draw from [`PetSnapshot`]s. Rendering, sound, string tables
//! and storage media belong to the host.

pub mod anim;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod daynight;
pub mod error;
pub mod model;
pub mod needs;
pub mod sim;
pub mod storage;
pub mod waste;

pub use anim::{AnimationStateMachine, Facing, PresentationHints};
pub use clock::{Clock, InteractionClock, ManualClock, SystemClock};
pub use conversation::{ChoiceId, ConversationChoice, ConversationEngine, Reply};
pub use daynight::TimeOfDayScheduler;
pub use error::{PetError, PetResult};
pub use model::{
    AnimationState, CatchupSummary, EngineClock, FoodType, NeedsState, PetProfile, Rules,
    SaveFile, WastePolicy, WasteState, MAX_WASTE,
};
pub use needs::{NeedLevel, NeedsSnapshot};
pub use sim::{Engine, Outcome, PetCommand, PetSnapshot};
pub use waste::WasteSnapshot;
