use crate::input::{map_cmd_to_action, Cli, Cmd, HostAction};
use crate::present::{outcome_text, recap_text, reply_line, sprite_id, status_text};
use anyhow::Context;
use pupcare::config::{load_settings, project_paths, save_settings_atomic, Paths, Settings};
use pupcare::sim::seeded_rng;
use pupcare::storage::{load_or_init, save_atomic, LoadOutcome};
use pupcare::{Engine, PetCommand, PetSnapshot, SystemClock};
use rand::rngs::SmallRng;
use std::fs;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub(crate) struct App {
    engine: Engine<SystemClock, SmallRng>,
    paths: Paths,
    settings: Settings,
    json: bool,
}

impl App {
    fn init(cli: &Cli) -> anyhow::Result<Self> {
        let paths = match &cli.data_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating data dir {}", dir.display()))?;
                Paths::in_dir(dir)
            }
            None => project_paths()?,
        };
        let settings = load_settings(&paths.settings_path);
        if !paths.settings_path.exists() {
            save_settings_atomic(&paths.settings_path, &settings)?;
        }
        let rules = settings.rules();

        let (engine, summary, how) = load_or_init(
            &paths.save_path,
            rules,
            SystemClock,
            seeded_rng(settings.seed),
            settings.catch_up,
        )?;
        match how {
            LoadOutcome::Fresh => info!("a new puppy arrives"),
            LoadOutcome::Restored => {}
            LoadOutcome::Recovered(e) => {
                eprintln!("Your save could not be read ({e}); starting over with a new puppy.");
            }
        }
        if summary.has_anything() && !cli.json {
            println!("{}", recap_text(&summary));
        }

        Ok(Self {
            engine,
            paths,
            settings,
            json: cli.json,
        })
    }

    fn run(&mut self, cmd: Cmd) -> anyhow::Result<()> {
        let action = map_cmd_to_action(cmd, &self.engine.snapshot())?;
        let result = match action {
            HostAction::Status => Ok(()),
            HostAction::Engine(c) => self.apply(c),
            HostAction::Simulate { seconds } => {
                self.simulate(seconds);
                Ok(())
            }
            HostAction::Watch { seconds, fps } => self.watch(seconds, fps),
        };
        // Rejected commands still persist the catch-up that ran at load.
        self.save_now()?;
        result?;
        self.print_status()?;
        Ok(())
    }

    fn apply(&mut self, cmd: PetCommand) -> anyhow::Result<()> {
        let outcome = self.engine.apply(cmd)?;
        if !self.json {
            if let Some(line) = outcome_text(&outcome) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// Headless fast-forward: whole ticks back to back, day timer running.
    fn simulate(&mut self, seconds: f64) {
        let step = self.engine.rules().tick_secs();
        let ticks = (seconds / step).floor() as u64;
        self.engine.start_time_of_day_timer();
        let mut last = self.engine.state();
        for _ in 0..ticks {
            let now = self.engine.tick(step);
            self.engine.advance_time_of_day(step);
            if now != last && !self.json {
                println!("-> {now}");
            }
            last = now;
        }
        self.engine.stop_time_of_day_timer();
        info!(ticks, seed = self.settings.seed, "simulated");
    }

    /// Real-time loop: fixed simulation step, frame-capped host loop.
    fn watch(&mut self, seconds: f64, fps: u32) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let stop_at = Instant::now() + Duration::from_secs_f64(seconds);
        let autosave_every = Duration::from_secs(10);
        let mut autosave_at = Instant::now() + autosave_every;

        self.engine.start_time_of_day_timer();
        let mut last_frame = Instant::now();
        let mut shown = self.engine.snapshot();
        self.print_frame(&shown);

        while Instant::now() < stop_at {
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame).as_secs_f64();
            last_frame = now;

            self.engine.advance(real_dt);
            self.engine.advance_time_of_day(real_dt);

            let snap = self.engine.snapshot();
            if changed(&shown, &snap) {
                self.print_frame(&snap);
                shown = snap;
            }

            if Instant::now() >= autosave_at {
                self.save_now()?;
                autosave_at = Instant::now() + autosave_every;
            }

            spin_sleep(frame_dt, Instant::now());
        }
        self.engine.stop_time_of_day_timer();
        Ok(())
    }

    fn print_frame(&self, snap: &PetSnapshot) {
        if self.json {
            return;
        }
        let day = if snap.is_daytime { "day" } else { "night" };
        let mut line = format!(
            "{:<9} {:<28} hunger {:>5.1} happiness {:>5.1} waste {} {day}",
            snap.state.to_string(),
            sprite_id(snap),
            snap.needs.hunger,
            snap.needs.happiness,
            snap.waste.count
        );
        if let Some(r) = &snap.bubble {
            line.push_str(&format!("  \"{}\"", reply_line(r)));
        }
        println!("{line}");
    }

    fn print_status(&self) -> anyhow::Result<()> {
        let snap = self.engine.snapshot();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&snap)?);
        } else {
            println!("{}", status_text(&snap));
        }
        Ok(())
    }

    fn save_now(&self) -> anyhow::Result<()> {
        if let Err(e) = save_atomic(&self.paths.save_path, &self.engine.to_save()) {
            warn!(path = %self.paths.save_path.display(), "save failed: {e}");
            return Err(e.into());
        }
        Ok(())
    }
}

fn changed(a: &PetSnapshot, b: &PetSnapshot) -> bool {
    a.state != b.state
        || a.is_daytime != b.is_daytime
        || a.waste.count != b.waste.count
        || a.bubble != b.bubble
        || a.hints.facing != b.hints.facing
}

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let cmd = cli.command.clone().unwrap_or(Cmd::Status);
    let mut app = App::init(&cli)?;
    app.run(cmd)?;
    Ok(())
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(left - Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
