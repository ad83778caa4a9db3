/// Terminal renderer; the only module that touches the screen.
///
/// The world is drawn in pixel space onto a braille canvas (2×4 dots per
/// terminal cell) and then flushed row by row.  No game logic happens here;
/// this module only translates state into terminal commands.
use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use space_invaders::assets::Sprite;
use space_invaders::barrier::Barrier;
use space_invaders::entities::{Appearance, Bullet, BulletOwner, GameState, GameStatus, Rgb};
use space_invaders::geometry::{Playfield, Rect};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD: Color = Color::White;
const C_HINT: Color = Color::DarkGrey;
const C_OVERLAY_LOSE: Color = Color::Red;
const C_OVERLAY_WIN: Color = Color::Green;
const C_BULLET_PLAYER: Rgb = Rgb::YELLOW;
const C_BULLET_INVADER: Rgb = Rgb::RED;

/// Rows reserved outside the play area: HUD on top, hint at the bottom.
const CHROME_ROWS: u16 = 2;
const MIN_PLAY_ROWS: u16 = 8;
const MIN_COLS: u16 = 40;

fn to_color(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── Braille canvas ────────────────────────────────────────────────────────────

fn braille_bit(sub_x: usize, sub_y: usize) -> u8 {
    match (sub_x, sub_y) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

struct Canvas {
    cols: usize,
    rows: usize,
    /// Dots per world pixel, horizontally and vertically.
    sx: f32,
    sy: f32,
    bits: Vec<u8>,
    fg: Vec<Rgb>,
    bg: Vec<Rgb>,
}

impl Canvas {
    fn new(cols: usize, rows: usize, field: Playfield, background: Option<&Sprite>) -> Self {
        let sx = (cols * 2) as f32 / field.width;
        let sy = (rows * 4) as f32 / field.height;
        let mut bg = vec![Rgb::BLACK; cols * rows];
        if let Some(sprite) = background {
            // Sample each cell's centre pixel.
            for row in 0..rows {
                for col in 0..cols {
                    let px = ((col as f32 + 0.5) * 2.0 / sx) as u32;
                    let py = ((row as f32 + 0.5) * 4.0 / sy) as u32;
                    if let Some(c) = sprite.pixel(px, py) {
                        bg[row * cols + col] = c;
                    }
                }
            }
        }
        Canvas {
            cols,
            rows,
            sx,
            sy,
            bits: vec![0; cols * rows],
            fg: vec![Rgb::WHITE; cols * rows],
            bg,
        }
    }

    fn set_dot(&mut self, dx: i32, dy: i32, color: Rgb) {
        if dx < 0 || dy < 0 {
            return;
        }
        let (dx, dy) = (dx as usize, dy as usize);
        if dx >= self.cols * 2 || dy >= self.rows * 4 {
            return;
        }
        let cell = (dy / 4) * self.cols + dx / 2;
        self.bits[cell] |= braille_bit(dx % 2, dy % 4);
        self.fg[cell] = color;
    }

    /// Dot span covered by a pixel span; never narrower than one dot so
    /// thin objects (bullets) stay visible.
    fn dot_span(start: i32, len: i32, scale: f32) -> (i32, i32) {
        let a = (start as f32 * scale).floor() as i32;
        let b = ((start + len) as f32 * scale).ceil() as i32;
        (a, b.max(a + 1))
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        if rect.is_empty() {
            return;
        }
        let (x0, x1) = Self::dot_span(rect.x, rect.w, self.sx);
        let (y0, y1) = Self::dot_span(rect.y, rect.h, self.sy);
        for dy in y0..y1 {
            for dx in x0..x1 {
                self.set_dot(dx, dy, color);
            }
        }
    }

    fn blit(&mut self, sprite: &Sprite, rect: Rect) {
        let (x0, x1) = Self::dot_span(rect.x, rect.w, self.sx);
        let (y0, y1) = Self::dot_span(rect.y, rect.h, self.sy);
        for dy in y0..y1 {
            for dx in x0..x1 {
                let px = ((dx as f32 + 0.5) / self.sx) as i32 - rect.x;
                let py = ((dy as f32 + 0.5) / self.sy) as i32 - rect.y;
                if px < 0 || py < 0 {
                    continue;
                }
                if let Some(c) = sprite.pixel(px as u32, py as u32) {
                    self.set_dot(dx, dy, c);
                }
            }
        }
    }

    fn draw(&mut self, appearance: &Appearance, rect: Rect) {
        match appearance {
            Appearance::Sprite(sprite) => self.blit(sprite, rect),
            Appearance::Placeholder(color) => self.fill_rect(rect, *color),
        }
    }

    fn flush<W: Write>(&self, out: &mut W, top: u16) -> std::io::Result<()> {
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, top + row as u16))?;
            let mut last: Option<(Rgb, Rgb)> = None;
            for col in 0..self.cols {
                let cell = row * self.cols + col;
                let colors = (self.fg[cell], self.bg[cell]);
                if last != Some(colors) {
                    out.queue(style::SetForegroundColor(to_color(colors.0)))?;
                    out.queue(style::SetBackgroundColor(to_color(colors.1)))?;
                    last = Some(colors);
                }
                let ch = match self.bits[cell] {
                    0 => ' ',
                    bits => char::from_u32(0x2800 + bits as u32).unwrap_or(' '),
                };
                out.queue(Print(ch))?;
            }
        }
        out.queue(style::ResetColor)?;
        Ok(())
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame into a `cols × rows` terminal.
pub fn render<W: Write>(
    out: &mut W,
    state: &GameState,
    background: Option<&Sprite>,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    if cols < MIN_COLS || rows < MIN_PLAY_ROWS + CHROME_ROWS {
        out.queue(cursor::MoveTo(0, 0))?;
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(format!("Terminal too small ({cols}x{rows})")))?;
        out.queue(style::ResetColor)?;
        out.flush()?;
        return Ok(());
    }

    let play_rows = rows - CHROME_ROWS;
    let mut canvas = Canvas::new(cols as usize, play_rows as usize, state.field, background);

    for barrier in &state.barriers {
        draw_barrier(&mut canvas, barrier);
    }
    for invader in state.swarm.invaders() {
        canvas.draw(&invader.appearance, invader.rect());
    }
    for bullet in state.player_bullets.iter().chain(state.enemy_bullets.iter()) {
        draw_bullet(&mut canvas, bullet);
    }
    canvas.draw(&state.player.appearance, state.player.rect());

    canvas.flush(out, 1)?;
    draw_hud(out, state, cols)?;
    draw_controls_hint(out, rows)?;

    if state.status.is_finished() {
        draw_wave_over(out, state, cols, rows)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_barrier(canvas: &mut Canvas, barrier: &Barrier) {
    let (ox, oy) = barrier.origin();
    for span in barrier.surface() {
        canvas.fill_rect(span.offset(ox, oy), barrier.color());
    }
}

fn draw_bullet(canvas: &mut Canvas, bullet: &Bullet) {
    let color = match bullet.owner {
        BulletOwner::Player => C_BULLET_PLAYER,
        BulletOwner::Invader => C_BULLET_INVADER,
    };
    canvas.fill_rect(bullet.rect(), color);
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameState, cols: u16) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_HUD))?;

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(Print(format!("Lives: {}", state.player.lives)))?;

    let score = format!("Score: {}", state.score);
    let sx = cols.saturating_sub(score.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(Print(&score))?;

    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, rows: u16) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("← → / A D : Move   SPACE : Shoot   ESC : Quit"))?;
    Ok(())
}

// ── End-of-wave overlay ───────────────────────────────────────────────────────

fn draw_wave_over<W: Write>(
    out: &mut W,
    state: &GameState,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    let (title, color) = match state.status {
        GameStatus::GameOver => ("GAME OVER", C_OVERLAY_LOSE),
        _ => ("YOU WIN!", C_OVERLAY_WIN),
    };
    let score_line = format!("Final Score: {}", state.score);
    let lines: [(&str, Color); 3] = [
        (title, color),
        (&score_line, Color::Yellow),
        ("R - Play Again   any other key - Exit", Color::White),
    ];

    let cx = cols / 2;
    let start_row = (rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}
