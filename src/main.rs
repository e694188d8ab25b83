/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::InputFlags;
use sim::event::GameEvent;
use sim::level::build_world;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;

/// How long step events stay on the message bar, in frames.
const MESSAGE_FRAMES: u32 = 150;

fn main() {
    let loaded = GameConfig::load();
    init_logging(&loaded.config.log_file);
    loaded.report();
    let config = loaded.config;

    let mut world = build_world(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        // Raw mode may already be on; put the terminal back before reporting.
        let _ = renderer.cleanup();
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = frame_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("frame loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    log::info!("session ended after {} ticks", world.tick);
    println!();
    println!("Thanks for riding the elevators!");
    println!("Other people's money left: ${:.2}", world.player.money);
}

/// Route `log` output to a file: the alternate screen owns stdout.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(path: &Path) {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Could not open log file {}: {e}; logging disabled", path.display());
            return;
        }
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn frame_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let frame = Duration::from_millis(config.timing.frame_ms);
    let session_start = Instant::now();
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();
        renderer.gamepad_connected = gp.connected;

        if handle_meta(world, &kb, &gp) {
            break;
        }

        if world.is_running() {
            let now = Instant::now();
            let dt = now.duration_since(last_tick).as_secs_f64();
            last_tick = now;
            let now_ms = session_start.elapsed().as_millis() as u64;

            let input = read_input(&kb, &gp, config.input.action_repeat);
            let events = step::step(world, input, dt, now_ms);
            report_events(world, &events);
        } else {
            // Suspended time must not show up as one huge dt on resume.
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(frame);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_ACTION: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Sample this frame's input flags.
///
/// Walking and jumping are held inputs. The action is edge-triggered unless
/// `action_repeat` is set, in which case holding it re-fires every tick.
fn read_input(kb: &InputState, gp: &GamepadState, action_repeat: bool) -> InputFlags {
    let held = |keys: &[KeyCode]| kb.any_held(keys) || kb.any_pressed(keys);
    let action = if action_repeat {
        held(KEYS_ACTION) || gp.action_held()
    } else {
        kb.any_pressed(KEYS_ACTION) || gp.action_pressed()
    };
    InputFlags {
        left: held(KEYS_LEFT) || gp.left_held(),
        right: held(KEYS_RIGHT) || gp.right_held(),
        jump: held(KEYS_JUMP) || gp.jump_held(),
        action,
    }
}

/// Quit, pause and focus handling. Returns true when the session should end.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
        return true;
    }

    if kb.focus_lost {
        world.focused = false;
        log::info!("focus lost, simulation suspended");
    }
    if kb.focus_gained {
        world.focused = true;
        log::info!("focus regained");
    }

    if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
        world.paused = !world.paused;
        if world.paused {
            world.set_message("PAUSED  [F1] Resume", 0);
        } else {
            world.message.clear();
            world.message_timer = 0;
        }
    }

    false
}

fn report_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Jumped | GameEvent::ElevatorReversed { .. } => {}
            GameEvent::PlayerDied { cause } => {
                log::info!("player died: {cause:?}");
                world.set_message("Splat. Press SPACE to buy your way back.", MESSAGE_FRAMES);
            }
            GameEvent::WentBankrupt => {
                log::info!("player went bankrupt");
                world.set_message("Broke. Press SPACE for a fresh million.", MESSAGE_FRAMES);
            }
            GameEvent::Won => {
                log::info!("goal reached with ${:.2} left", world.player.money);
                world.set_message("Arrived! Press SPACE to go again.", MESSAGE_FRAMES);
            }
            GameEvent::Revived { money } => {
                log::info!("revived, ${money:.2} left");
                world.set_message("Revived. That cost you.", MESSAGE_FRAMES);
            }
            GameEvent::Refilled { money } => {
                log::info!("refilled to ${money:.2}");
                world.set_message("Another million arrived.", MESSAGE_FRAMES);
            }
            GameEvent::Retried => {
                log::info!("retrying from spawn");
                world.message.clear();
                world.message_timer = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{Event, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn space(kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(' '),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn death_event_sets_message() {
        let mut world = build_world(&GameConfig::default());
        report_events(&mut world, &[GameEvent::WentBankrupt]);
        assert!(world.message.contains("SPACE"));
        assert_eq!(world.message_timer, MESSAGE_FRAMES);

        report_events(&mut world, &[GameEvent::Retried]);
        assert!(world.message.is_empty());
    }

    #[test]
    fn idle_devices_give_no_input() {
        let kb = InputState::new();
        let gp = GamepadState::new();
        assert_eq!(read_input(&kb, &gp, false), InputFlags::default());
        assert_eq!(read_input(&kb, &gp, true), InputFlags::default());
    }

    #[test]
    fn held_action_fires_once_unless_repeat_is_on() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        let gp = GamepadState::new();

        kb.begin_frame();
        kb.handle_event(space(KeyEventKind::Press));
        assert!(read_input(&kb, &gp, false).action);
        assert!(read_input(&kb, &gp, true).action);

        // Next frame: still held, no new press.
        kb.begin_frame();
        assert!(!read_input(&kb, &gp, false).action);
        assert!(read_input(&kb, &gp, true).action);

        kb.begin_frame();
        kb.handle_event(space(KeyEventKind::Release));
        assert!(!read_input(&kb, &gp, false).action);
        assert!(!read_input(&kb, &gp, true).action);
    }
}
