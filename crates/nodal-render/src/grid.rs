//! Infinite tiled background grid.
//!
//! Two line frequencies: a fine "square" grid every `square_size` units and
//! a coarse "cell" grid every `cell_size` squares. Lines are recomputed for
//! whatever rectangle is visible, so the canvas has no fixed extent.

use kurbo::{Line, Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStyle {
    /// Fine grid spacing, in canvas units.
    pub square_size: i64,
    /// Fine squares per coarse cell.
    pub cell_size: i64,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            square_size: 25,
            cell_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLines {
    pub squares: Vec<Line>,
    pub cells: Vec<Line>,
}

/// Grid lines covering `visible`.
pub fn grid_lines(visible: Rect, style: GridStyle) -> GridLines {
    let mut lines = GridLines::default();
    if style.square_size <= 0 || style.cell_size <= 0 {
        log::warn!("degenerate grid style {style:?}");
        return lines;
    }

    let left = visible.x0.floor() as i64;
    let right = visible.x1.ceil() as i64;
    let top = visible.y0.floor() as i64;
    let bottom = visible.y1.ceil() as i64;
    let step = style.square_size as usize;
    let coarse = style.square_size * style.cell_size;

    let first_left = left - left.rem_euclid(style.square_size);
    let first_top = top - top.rem_euclid(style.square_size);

    for x in (first_left..right).step_by(step) {
        let line = Line::new(Point::new(x as f64, top as f64), Point::new(x as f64, bottom as f64));
        if x.rem_euclid(coarse) == 0 {
            lines.cells.push(line);
        } else {
            lines.squares.push(line);
        }
    }
    for y in (first_top..bottom).step_by(step) {
        let line = Line::new(Point::new(left as f64, y as f64), Point::new(right as f64, y as f64));
        if y.rem_euclid(coarse) == 0 {
            lines.cells.push(line);
        } else {
            lines.squares.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_lines_every_ten_squares() {
        let lines = grid_lines(Rect::new(0.0, 0.0, 500.0, 10.0), GridStyle::default());
        let coarse_x: Vec<f64> = lines
            .cells
            .iter()
            .filter(|l| l.p0.x == l.p1.x)
            .map(|l| l.p0.x)
            .collect();
        assert_eq!(coarse_x, vec![0.0, 250.0]);
        // 20 vertical steps in [0, 500), two of them coarse
        let fine_vertical = lines.squares.iter().filter(|l| l.p0.x == l.p1.x).count();
        assert_eq!(fine_vertical, 18);
    }

    #[test]
    fn negative_origin_snaps_down() {
        let lines = grid_lines(Rect::new(-30.0, -30.0, 0.0, 0.0), GridStyle::default());
        let xs: Vec<f64> = lines
            .squares
            .iter()
            .chain(lines.cells.iter())
            .filter(|l| l.p0.x == l.p1.x)
            .map(|l| l.p0.x)
            .collect();
        assert_eq!(xs, vec![-50.0, -25.0]);
    }

    #[test]
    fn degenerate_style_draws_nothing() {
        let style = GridStyle {
            square_size: 0,
            cell_size: 10,
        };
        assert_eq!(grid_lines(Rect::new(0.0, 0.0, 100.0, 100.0), style), GridLines::default());
    }
}
