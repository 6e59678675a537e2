/// Truecolor half-block presenter for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use perspective_core::FrameBuffer;
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// One terminal cell covering two vertically stacked pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
}

/// Presents frame buffers as rows of half-block cells
pub struct HalfBlockRenderer {
    columns: u16,
    rows: u16,
}

impl HalfBlockRenderer {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
    }

    /// Frame buffer size that fills the terminal exactly
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.columns.max(1) as u32, self.rows.max(1) as u32 * 2)
    }

    /// Pixel coordinates of the centre of the top half of a cell
    pub fn cell_to_pixel(column: u16, row: u16) -> (f32, f32) {
        (column as f32 + 0.5, row as f32 * 2.0 + 0.5)
    }

    /// Cells for one row of the terminal
    pub fn cells(frame: &FrameBuffer, row: u32) -> Vec<Cell> {
        let top_y = row * 2;
        let bottom_y = top_y + 1;
        (0..frame.width())
            .map(|x| {
                let top = rgb(frame, x, top_y);
                let bottom = if bottom_y < frame.height() {
                    rgb(frame, x, bottom_y)
                } else {
                    top
                };
                Cell { top, bottom }
            })
            .collect()
    }

    pub fn draw<W: Write>(&self, writer: &mut W, frame: &FrameBuffer) -> std::io::Result<()> {
        let rows = (frame.height() + 1) / 2;
        let rows = rows.min(self.rows as u32);
        let mut last: Option<Cell> = None;

        for row in 0..rows {
            writer.queue(cursor::MoveTo(0, row as u16))?;
            for cell in Self::cells(frame, row).into_iter().take(self.columns as usize) {
                // Only emit colour changes
                if last.map(|l| l.top) != Some(cell.top) {
                    writer.queue(SetForegroundColor(to_color(cell.top)))?;
                }
                if last.map(|l| l.bottom) != Some(cell.bottom) {
                    writer.queue(SetBackgroundColor(to_color(cell.bottom)))?;
                }
                writer.queue(Print(HALF_BLOCK))?;
                last = Some(cell);
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn rgb(frame: &FrameBuffer, x: u32, y: u32) -> [u8; 3] {
    let [r, g, b, _] = frame.pixel(x, y);
    [r, g, b]
}

fn to_color(rgb: [u8; 3]) -> Color {
    Color::Rgb {
        r: rgb[0],
        g: rgb[1],
        b: rgb[2],
    }
}
