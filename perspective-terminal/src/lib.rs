/// Terminal front end for the engraved card
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self},
};
use log::info;
use perspective_core::assets::load_paper_from_disk;
use perspective_core::{CardConfig, CardFonts, CardScene, InputEvent, MousePhase, Typeface};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::HalfBlockRenderer;

/// Drag-pixel steps applied per arrow key press
const NUDGE_STEP: f32 = 20.0;

/// Main application struct for terminal card rendering
pub struct TerminalApp {
    scene: CardScene,
    renderer: HalfBlockRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: CardConfig, title: &Typeface, body: &Typeface, seed: u64) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let renderer = HalfBlockRenderer::new(columns, rows);
        let (width, height) = renderer.pixel_size();

        let (paper, gate) = load_paper_from_disk(
            &config.assets,
            config.paper.repeat,
            config.render.max_anisotropy,
        );
        let fonts = CardFonts { title, body };
        let mut scene = CardScene::new(config, fonts, width, height, seed);
        scene.set_paper(paper, &gate);
        info!("Terminal scene {}x{} pixels", width, height);

        Ok(Self {
            scene,
            renderer,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn scene(&self) -> &CardScene {
        &self.scene
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableFocusChange,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Tick and render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    /// Translate a terminal event into scene input
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => self.scene.nudge(0.0, -NUDGE_STEP),
                KeyCode::Char('s') | KeyCode::Down => self.scene.nudge(0.0, NUDGE_STEP),
                KeyCode::Char('a') | KeyCode::Left => self.scene.nudge(-NUDGE_STEP, 0.0),
                KeyCode::Char('d') | KeyCode::Right => self.scene.nudge(NUDGE_STEP, 0.0),
                _ => {}
            },
            Event::Mouse(mouse) => {
                if let Some(input) = mouse_input(&mouse) {
                    self.scene.handle_input(&input);
                }
            }
            Event::Resize(columns, rows) => {
                self.renderer.resize(columns, rows);
                let (width, height) = self.renderer.pixel_size();
                self.scene.handle_input(&InputEvent::Resize { width, height });
            }
            Event::FocusLost => self.scene.handle_input(&InputEvent::Leave),
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let hover = self.scene.hover();
        let frame = self.scene.frame();

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, frame)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Perspective | FPS: {:.1} | Hover: {:.2} | Drag=Rotate WASD/Arrows=Nudge Q=Quit",
                self.fps, hover
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Left-button mouse events become pointer input; other buttons are ignored
pub fn mouse_input(mouse: &MouseEvent) -> Option<InputEvent> {
    let (x, y) = HalfBlockRenderer::cell_to_pixel(mouse.column, mouse.row);
    let phase = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => MousePhase::Down,
        MouseEventKind::Up(MouseButton::Left) => MousePhase::Up,
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => MousePhase::Move,
        _ => return None,
    };
    Some(InputEvent::mouse(phase, x, y))
}
