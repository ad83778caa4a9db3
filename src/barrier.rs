/// Destructible cover.
///
/// A barrier looks like one solid block but is a grid of square cells that
/// erode one at a time.  The grid is the authoritative state; the surface is
/// a cached list of filled spans rebuilt only when a cell dies.
use tracing::debug;

use crate::config::BarrierConfig;
use crate::entities::{Rgb, PLAYER_ROW_OFFSET};
use crate::geometry::{Playfield, Rect};

/// Gap between the bottom of the barriers and the player row.
const BARRIER_GAP_ABOVE_PLAYER: f32 = 40.0;

#[derive(Clone, Debug)]
pub struct Barrier {
    x: i32,
    y: i32,
    cell_size: i32,
    cols: usize,
    rows: usize,
    color: Rgb,
    /// Row-major alive flags, `rows * cols` long.
    cells: Vec<bool>,
    /// Filled spans in barrier-local coordinates.
    surface: Vec<Rect>,
    revision: u64,
}

impl Barrier {
    pub fn new(x: i32, y: i32, cell_size: i32, cols: usize, rows: usize, color: Rgb) -> Self {
        let mut barrier = Barrier {
            x,
            y,
            cell_size,
            cols,
            rows,
            color,
            cells: vec![true; cols * rows],
            surface: Vec::new(),
            revision: 0,
        };
        barrier.redraw();
        barrier
    }

    /// Bounding box; only a coarse pre-filter for collisions.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.cols as i32 * self.cell_size,
            self.rows as i32 * self.cell_size,
        )
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Out-of-range coordinates count as dead.
    pub fn is_alive(&self, col: usize, row: usize) -> bool {
        col < self.cols && row < self.rows && self.cells[row * self.cols + col]
    }

    pub fn alive_cells(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Absolute rect of cell `(col, row)`.
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        Rect::new(
            self.x + col as i32 * self.cell_size,
            self.y + row as i32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Destroy the first alive cell (row-major) touched by `impact`.
    ///
    /// Returns `true` when a cell absorbed the impact.  `false` means the
    /// impact only crossed holes or empty bounding-box space; nothing is
    /// mutated and the caller keeps its bullet.
    pub fn hit(&mut self, impact: Rect) -> bool {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = row * self.cols + col;
                if self.cells[idx] && impact.intersects(&self.cell_rect(col, row)) {
                    self.cells[idx] = false;
                    debug!(col, row, remaining = self.alive_cells(), "barrier cell destroyed");
                    self.redraw();
                    return true;
                }
            }
        }
        false
    }

    /// Rebuild the surface from the grid: one local rect per maximal
    /// horizontal run of alive cells in each row.
    pub fn redraw(&mut self) {
        self.surface.clear();
        for row in 0..self.rows {
            let mut run_start: Option<usize> = None;
            for col in 0..=self.cols {
                let alive = col < self.cols && self.cells[row * self.cols + col];
                match (alive, run_start) {
                    (true, None) => run_start = Some(col),
                    (false, Some(start)) => {
                        self.surface.push(Rect::new(
                            start as i32 * self.cell_size,
                            row as i32 * self.cell_size,
                            (col - start) as i32 * self.cell_size,
                            self.cell_size,
                        ));
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        self.revision += 1;
    }

    /// Cached spans in barrier-local coordinates.
    pub fn surface(&self) -> &[Rect] {
        &self.surface
    }

    /// Absolute origin of the surface.
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Number of times the surface has been rebuilt.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Lay out `cfg.count` barriers with evenly spaced centres, sitting a fixed
/// gap above the player row.
pub fn create_barriers(field: Playfield, cfg: &BarrierConfig) -> Vec<Barrier> {
    if cfg.count == 0 {
        return Vec::new();
    }
    let width = cfg.cols as f32 * cfg.cell_size as f32;
    let height = cfg.rows as f32 * cfg.cell_size as f32;
    let bottom = field.height - PLAYER_ROW_OFFSET - BARRIER_GAP_ABOVE_PLAYER;
    let slot = field.width / cfg.count as f32;

    (0..cfg.count)
        .map(|i| {
            let centre = (i as f32 + 0.5) * slot;
            Barrier::new(
                (centre - width / 2.0) as i32,
                (bottom - height) as i32,
                cfg.cell_size,
                cfg.cols,
                cfg.rows,
                Rgb::GREEN,
            )
        })
        .collect()
}
