use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use rodio::{OutputStream, Sink};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    dpi::LogicalSize,
    error::OsError,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use chibi8_base::{
    machine::{Key, KeyState, Machine, StepOutcome},
    screen::Screen,
};

mod tone;

use tone::Tone;

/// Nominal frame interval; timers tick once per frame.
const FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 60);

const BUZZER_FREQUENCY: f32 = 440.0;

const PIXEL_ON: [u8; 4] = [0xE8, 0xE8, 0xE8, 0xFF];
const PIXEL_OFF: [u8; 4] = [0x10, 0x10, 0x18, 0xFF];

/// A small CHIP-8 emulator.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct CliOpts {
    /// ROM file to load into machine memory.
    rom_file: PathBuf,
    /// Instructions to run per frame.
    #[clap(short = 't', long, default_value_t = 12)]
    cycles_per_frame: u32,
    /// Window size as a multiple of the 64x32 screen.
    #[clap(short = 'w', long, default_value_t = 16)]
    scale: u32,
    /// Seed for the random-number instruction, for reproducible runs.
    #[clap(long)]
    seed: Option<u64>,
}

/// Mapping from the left block of a QWERTY keyboard to the hex keypad:
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// Q W E R   ->   4 5 6 D
/// A S D F        7 8 9 E
/// Z X C V        A B C F
/// ```
trait ToKeypad {
    fn to_keypad(self) -> Option<Key>;
}

impl ToKeypad for VirtualKeyCode {
    fn to_keypad(self) -> Option<Key> {
        use VirtualKeyCode::*;

        match self {
            Key1 => Some(Key::K1),
            Key2 => Some(Key::K2),
            Key3 => Some(Key::K3),
            Key4 => Some(Key::KC),
            Q => Some(Key::K4),
            W => Some(Key::K5),
            E => Some(Key::K6),
            R => Some(Key::KD),
            A => Some(Key::K7),
            S => Some(Key::K8),
            D => Some(Key::K9),
            F => Some(Key::KE),
            Z => Some(Key::KA),
            X => Some(Key::K0),
            C => Some(Key::KB),
            V => Some(Key::KF),
            _ => None,
        }
    }
}

trait IntoKeyState {
    fn into_key_state(self) -> KeyState;
}

impl IntoKeyState for ElementState {
    fn into_key_state(self) -> KeyState {
        match self {
            ElementState::Pressed => KeyState::Pressed,
            ElementState::Released => KeyState::NotPressed,
        }
    }
}

/// Create the emulator window at an integer multiple of the screen size.
fn create_window(event_loop: &EventLoop<()>, title: &str, scale: u32) -> Result<Window, OsError> {
    let size = LogicalSize::new(
        (Screen::WIDTH as u32 * scale) as f64,
        (Screen::HEIGHT as u32 * scale) as f64,
    );
    let min_size = LogicalSize::new(Screen::WIDTH as f64, Screen::HEIGHT as f64);

    WindowBuilder::new()
        .with_title(title)
        .with_inner_size(size)
        .with_min_inner_size(min_size)
        .build(event_loop)
}

/// Copy the 1-bit screen into the RGBA frame buffer.
fn blit_screen(screen: &Screen, frame: &mut [u8]) {
    let set_pixels = screen
        .as_bytes()
        .iter()
        .copied()
        .flat_map(|byte| (0..8).rev().map(move |bit| byte >> bit & 1 > 0));

    for (rgba, pixel_set) in frame.chunks_exact_mut(4).zip(set_pixels) {
        rgba.copy_from_slice(if pixel_set { &PIXEL_ON } else { &PIXEL_OFF });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli_opts = CliOpts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let program = fs::read(&cli_opts.rom_file)?;

    let mut machine = match cli_opts.seed {
        Some(seed) => Machine::with_rng_seed(seed),
        None => Machine::new(),
    };
    machine.load(&program)?;
    info!(
        rom = %cli_opts.rom_file.display(),
        bytes = program.len(),
        "program loaded"
    );

    let event_loop = EventLoop::new();
    let window = create_window(&event_loop, "chibi8", cli_opts.scale.max(1))?;

    let window_size = window.inner_size();
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let mut pixels = Pixels::new(Screen::WIDTH as u32, Screen::HEIGHT as u32, surface_texture)?;

    // A missing audio device downgrades to a silent run; the sink stays
    // paused until the sound timer is nonzero.
    let audio = match OutputStream::try_default() {
        Ok((stream, handle)) => match Sink::try_new(&handle) {
            Ok(sink) => {
                sink.append(Tone::new(BUZZER_FREQUENCY));
                sink.pause();
                Some((stream, sink))
            }
            Err(error) => {
                warn!(%error, "audio sink unavailable, running without sound");
                None
            }
        },
        Err(error) => {
            warn!(%error, "no audio output device, running without sound");
            None
        }
    };

    let cycles_per_frame = cli_opts.cycles_per_frame.max(1);
    let mut next_frame = Instant::now();
    let mut halted = false;

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
            WindowEvent::Resized(size) => {
                pixels.resize(size.width, size.height);
                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(virtual_keycode),
                        ..
                    },
                ..
            } => {
                if virtual_keycode == VirtualKeyCode::Escape && state == ElementState::Pressed {
                    debug!("escape pressed, exiting");
                    *control_flow = ControlFlow::Exit;
                } else if let Some(key) = virtual_keycode.to_keypad() {
                    machine.set_key(key, state.into_key_state());
                }
            }
            _ => {}
        },
        Event::MainEventsCleared => {
            // An exit requested earlier in this iteration must not be
            // overwritten by the frame schedule.
            if *control_flow == ControlFlow::Exit {
                return;
            }

            let now = Instant::now();
            if now >= next_frame {
                next_frame = now + FRAME_DURATION;

                if !halted {
                    let mut needs_redraw = false;

                    for _ in 0..cycles_per_frame {
                        match machine.step() {
                            Ok(StepOutcome::Continue) => {}
                            Ok(StepOutcome::Redraw) => needs_redraw = true,
                            Err(error) => {
                                error!(%error, "machine halted");
                                halted = true;
                                break;
                            }
                        }
                    }

                    machine.tick_timers();

                    if needs_redraw {
                        window.request_redraw();
                    }
                }

                if let Some((_stream, sink)) = &audio {
                    if !halted && machine.sound_timer() > 0 {
                        sink.play();
                    } else {
                        sink.pause();
                    }
                }
            }

            *control_flow = ControlFlow::WaitUntil(next_frame);
        }
        Event::RedrawRequested(_) => {
            blit_screen(machine.screen(), pixels.get_frame());

            if let Err(error) = pixels.render() {
                error!(%error, "presenting the frame failed");
                *control_flow = ControlFlow::Exit;
            }
        }
        _ => {}
    })
}
