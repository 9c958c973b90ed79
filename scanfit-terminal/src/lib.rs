/// Terminal host for the scanfit viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use scanfit_core::Viewer;
use std::io::{self, stdout, Write};

pub mod config;
pub mod renderer;

pub use config::{Config, ConfigError};
pub use renderer::{PixelCanvas, PIXELS_PER_ROW};

/// Rotation per key press, in pointer pixels
const KEY_ROTATION_STEP: f32 = 10.0;
/// Plane size change per key press
const PLANE_SIZE_STEP: f32 = 0.1;
/// Cells are coarse, so a tap allows less travel than on a pixel display
const TAP_THRESHOLD: f32 = 3.0;

const CONTROLS: &str = "drag=rotate click=select wheel=zoom WASD=rotate p=plane [/]=size c=clear q=quit";

/// Interactive viewer running in the terminal's alternate screen
pub struct TerminalApp {
    viewer: Viewer,
    canvas: PixelCanvas,
    title: String,
    columns: u16,
    rows: u16,
    running: bool,
}

impl TerminalApp {
    pub fn new(viewer: Viewer, title: impl Into<String>) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        Ok(Self::with_size(viewer, title, columns, rows))
    }

    pub fn with_size(mut viewer: Viewer, title: impl Into<String>, columns: u16, rows: u16) -> Self {
        viewer.pick_settings_mut().tap_threshold = TAP_THRESHOLD;

        let mut app = Self {
            viewer,
            canvas: PixelCanvas::for_terminal(columns, rows),
            title: title.into(),
            columns,
            rows,
            running: true,
        };
        app.resize(columns, rows);
        app
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        self.render()?;

        while self.running {
            if self.handle_event(event::read()?) && self.running {
                self.render()?;
            }
        }

        Ok(())
    }

    /// Apply an input event; returns whether the screen needs a redraw
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                self.resize(columns, rows);
                true
            }
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            _ => false,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let (x, y) = cell_to_pixel(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.viewer.on_pointer_down(x, y),
            MouseEventKind::Drag(MouseButton::Left) => self.viewer.on_pointer_move(x, y),
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(face) = self.viewer.on_pointer_up(x, y) {
                    tracing::debug!(face, selected = self.viewer.selected_face_count(), "face tapped");
                }
            }
            MouseEventKind::ScrollUp => self.viewer.on_wheel(1.0),
            MouseEventKind::ScrollDown => self.viewer.on_wheel(-1.0),
            _ => return false,
        }
        true
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.viewer.rotate_by(0.0, -KEY_ROTATION_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.viewer.rotate_by(0.0, KEY_ROTATION_STEP),
            KeyCode::Char('a') | KeyCode::Left => self.viewer.rotate_by(-KEY_ROTATION_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.viewer.rotate_by(KEY_ROTATION_STEP, 0.0),
            KeyCode::Char('p') => self.viewer.toggle_plane_display(),
            KeyCode::Char('[') => {
                let size = self.viewer.plane_size_factor() - PLANE_SIZE_STEP;
                self.viewer.set_plane_size_factor(size);
            }
            KeyCode::Char(']') => {
                let size = self.viewer.plane_size_factor() + PLANE_SIZE_STEP;
                self.viewer.set_plane_size_factor(size);
            }
            KeyCode::Char('c') => self.viewer.clear_selection(),
            _ => return false,
        }
        true
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
        self.canvas.resize(columns as usize, rows as usize * PIXELS_PER_ROW);
        self.viewer
            .set_viewport(self.canvas.width() as f32, self.canvas.height() as f32);
    }

    /// Header, status and control lines drawn over the model
    pub fn overlay_lines(&self) -> Vec<String> {
        let triangles = self.viewer.mesh().map_or(0, |mesh| mesh.triangle_count());
        let mut lines = vec![format!("Scanfit | {} | {} triangles", self.title, triangles)];
        lines.extend(self.viewer.status_text().lines().map(str::to_string));
        lines
    }

    fn render(&mut self) -> io::Result<()> {
        let (width, height) = (self.canvas.width() as f32, self.canvas.height() as f32);
        self.viewer.render(&mut self.canvas, width, height);

        let mut stdout = stdout();
        self.canvas.draw(&mut stdout)?;

        let columns = self.columns as usize;
        for (row, line) in self.overlay_lines().iter().enumerate() {
            queue!(
                stdout,
                cursor::MoveTo(0, row as u16),
                SetForegroundColor(Color::Yellow),
                SetBackgroundColor(Color::Black),
                Print(line.chars().take(columns).collect::<String>()),
                ResetColor
            )?;
        }
        queue!(
            stdout,
            cursor::MoveTo(0, self.rows.saturating_sub(1)),
            SetForegroundColor(Color::DarkGrey),
            SetBackgroundColor(Color::Black),
            Print(CONTROLS.chars().take(columns).collect::<String>()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Center of the cell's top pixel maps a cell onto the pixel canvas
fn cell_to_pixel(column: u16, row: u16) -> (f32, f32) {
    (column as f32 + 0.5, (row as usize * PIXELS_PER_ROW) as f32 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use scanfit_core::Mesh;

    fn app() -> TerminalApp {
        let mut viewer = Viewer::new();
        viewer.set_mesh(Mesh::cube(1.0));
        TerminalApp::with_size(viewer, "cube", 40, 20)
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_viewport_follows_terminal_size() {
        let mut app = app();
        assert_eq!(app.viewer().viewport().width, 40.0);
        assert_eq!(app.viewer().viewport().height, 40.0);

        assert!(app.handle_event(Event::Resize(80, 24)));
        assert_eq!(app.viewer().viewport().width, 80.0);
        assert_eq!(app.viewer().viewport().height, 48.0);
    }

    #[test]
    fn test_click_selects_face() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 22, 11));
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 22, 11));
        assert_eq!(app.viewer().selected_faces(), vec![0]);

        assert!(app.handle_event(key('c')));
        assert_eq!(app.viewer().selected_face_count(), 0);
    }

    #[test]
    fn test_drag_rotates_without_selecting() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 22, 11));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 32, 11));
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 32, 11));

        assert_eq!(app.viewer().selected_face_count(), 0);
        assert!((app.viewer().view().rotation.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_keys() {
        let mut app = app();
        let scale = app.viewer().view().scale;

        assert!(app.handle_event(mouse(MouseEventKind::ScrollUp, 0, 0)));
        assert!((app.viewer().view().scale - scale * 1.1).abs() < 1e-5);

        app.handle_event(key('p'));
        assert!(app.viewer().plane_display());

        app.handle_event(key(']'));
        assert!((app.viewer().plane_size_factor() - 1.1).abs() < 1e-6);
        app.handle_event(key('['));
        app.handle_event(key('['));
        assert!((app.viewer().plane_size_factor() - 0.9).abs() < 1e-6);

        app.handle_event(key('d'));
        assert!((app.viewer().view().rotation.y - KEY_ROTATION_STEP).abs() < 1e-6);

        assert!(!app.handle_event(key('x')));
        assert!(app.is_running());
        app.handle_event(key('q'));
        assert!(!app.is_running());
    }

    #[test]
    fn test_overlay_lines() {
        let app = app();
        let lines = app.overlay_lines();
        assert_eq!(lines[0], "Scanfit | cube | 12 triangles");
        assert_eq!(lines[1], "Select faces to fit a plane");
    }
}
