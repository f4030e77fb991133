use crate::clock::Clock;
use crate::config::write_json_atomic;
use crate::error::{PetError, PetResult};
use crate::model::{CatchupSummary, Rules, SaveFile};
use crate::sim::Engine;
use rand::Rng;
use std::{fs, io, path::Path};
use tracing::{info, warn};

/// How the engine came to be.
#[derive(Debug)]
pub enum LoadOutcome {
    Fresh,
    Restored,
    /// The save was unusable and a fresh pet took its place.
    Recovered(PetError),
}

/// `Ok(None)` when there is no save yet. A save that does not parse or
/// validate is `CorruptedProfile`.
pub fn read_save(path: &Path, rules: &Rules) -> PetResult<Option<SaveFile>> {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let save: SaveFile = serde_json::from_str(&text)
        .map_err(|e| PetError::CorruptedProfile(format!("unparseable save: {e}")))?;
    save.validate(rules.max_waste)?;
    Ok(Some(save))
}

pub fn load_or_init<C: Clock, R: Rng>(
    path: &Path,
    rules: Rules,
    time: C,
    rng: R,
    catch_up: bool,
) -> PetResult<(Engine<C, R>, CatchupSummary, LoadOutcome)> {
    match read_save(path, &rules) {
        Ok(Some(save)) => {
            let (engine, summary) = Engine::from_save(save, rules, time, rng, catch_up);
            info!(path = %path.display(), "save restored");
            Ok((engine, summary, LoadOutcome::Restored))
        }
        Ok(None) => Ok((
            Engine::new(rules, time, rng),
            CatchupSummary::new(),
            LoadOutcome::Fresh,
        )),
        Err(e @ PetError::CorruptedProfile(_)) => {
            warn!(path = %path.display(), "starting a fresh pet: {e}");
            Ok((
                Engine::new(rules, time, rng),
                CatchupSummary::new(),
                LoadOutcome::Recovered(e),
            ))
        }
        Err(e) => Err(e),
    }
}

pub fn save_atomic(path: &Path, save: &SaveFile) -> PetResult<()> {
    write_json_atomic(path, save)
}
