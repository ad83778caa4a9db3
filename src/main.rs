mod display;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use space_invaders::assets::Assets;
use space_invaders::audio::Audio;
use space_invaders::compute::{init_state, tick};
use space_invaders::config::Config;
use space_invaders::entities::{GameEvent, GameState, KeyState};
use space_invaders::synth;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events.
const HOLD_WINDOW: u64 = 8;

#[derive(Parser)]
#[command(name = "space_invaders")]
#[command(about = "Space Invaders in the terminal, with eroding barriers")]
#[command(after_help = "Sound effects and music play only in builds made with `--features audio`.")]
struct Cli {
    /// Config file (TOML); defaults to the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding sprites and sounds (overrides the config)
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Seed for the swarm's firing RNG
    #[arg(long)]
    seed: Option<u64>,
    /// Where to write the log; defaults to the platform cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the bullet-hit sound effect as a WAV file
    GenSound {
        #[arg(long, default_value = "bullet_hit.wav")]
        out: PathBuf,
    },
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("space_invaders").join("space_invaders.log"))
        .unwrap_or_else(|| PathBuf::from("space_invaders.log"))
}

/// The terminal is the game screen, so logs go to a file.
fn init_logging(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum LoopExit {
    Quit,
    Restart,
}

/// Run one wave until the player quits or asks for a restart.
///
/// Input model: a `key_frame` map records the frame of the last press/repeat
/// event for every key, so movement keys and Space can be held together.
/// Space itself fires only on the frame its press arrives.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    assets: &Assets,
    audio: &Audio,
    rx: &mpsc::Receiver<Event>,
    frame_time: Duration,
    rng: &mut StdRng,
) -> std::io::Result<LoopExit> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut events: Vec<GameEvent> = Vec::new();
    let mut frame: u64 = 0;
    let wave_start = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mut fire = false;
        let mut quit = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(LoopExit::Quit);
                    }
                    if state.status.is_finished() {
                        return Ok(match code {
                            KeyCode::Char('r') | KeyCode::Char('R') => LoopExit::Restart,
                            _ => LoopExit::Quit,
                        });
                    }
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => quit = true,
                        KeyCode::Char(' ') => fire = true,
                        _ => {}
                    }
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let keys = KeyState {
            left: any_held(
                &key_frame,
                &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
                frame,
            ),
            right: any_held(
                &key_frame,
                &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
                frame,
            ),
            fire,
            quit,
        };
        if keys.quit {
            return Ok(LoopExit::Quit);
        }

        let elapsed_ms = wave_start.elapsed().as_millis() as u64;
        tick(state, &keys, elapsed_ms, rng, &mut events);
        for event in events.drain(..) {
            audio.on_event(event);
        }

        let (cols, rows) = terminal::size()?;
        display::render(out, state, assets.background.as_deref(), cols, rows)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &Config,
    assets: &Assets,
    audio: &Audio,
    rng: &mut StdRng,
) -> std::io::Result<()> {
    let frame_time = Duration::from_secs_f64(1.0 / config.screen.fps as f64);
    loop {
        let mut state = init_state(config, assets);
        info!(invaders = state.swarm.initial_count(), barriers = state.barriers.len(), "wave started");
        match game_loop(out, &mut state, assets, audio, rx, frame_time, rng)? {
            LoopExit::Quit => break,
            LoopExit::Restart => continue,
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::GenSound { out }) = &cli.command {
        synth::write_hit_sound(out).with_context(|| format!("failed to write {}", out.display()))?;
        println!("Created '{}'", out.display());
        return Ok(());
    }

    let log_path = init_logging(cli.log_file.as_deref())?;
    let mut config = Config::resolve(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.assets {
        config.assets_dir = dir;
    }
    info!(log = %log_path.display(), assets = %config.assets_dir.display(), "starting");

    let assets = Assets::load(&config.assets_dir, config.playfield());
    let mut audio = Audio::new(assets.hit_sound.clone());
    audio.start_music(assets.music.as_ref());

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut out = BufWriter::new(stdout());
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &config, &assets, &audio, &mut rng);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.context("terminal I/O failed")?;
    info!("exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn help_mentions_the_audio_feature() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("--features audio"));
    }

    #[test]
    fn gen_sound_defaults_to_hit_file() {
        let cli = Cli::try_parse_from(["space_invaders", "gen-sound"]).unwrap();
        match cli.command {
            Some(Command::GenSound { out }) => assert_eq!(out, PathBuf::from("bullet_hit.wav")),
            None => panic!("expected gen-sound"),
        }
    }
}
