use crate::opts::FreezePolicy;
use crate::probe::VideoMetadata;
use crate::GridError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CellDim {
    pub width: u32,
    // picture height after scaling to `width`
    pub scaled_height: u32,
    // black bar above and below the picture
    pub padding: u32,
    // scaled_height + 2 * padding
    pub height: u32,
}

impl CellDim {
    pub fn compute(reference: &VideoMetadata, width: u32, padding_percent: f64) -> Self {
        let scaled_height =
            (reference.height as f64 * width as f64 / reference.width as f64).round() as u32;
        let padding = (scaled_height as f64 * padding_percent / 100.0).round() as u32;
        Self {
            width,
            scaled_height,
            padding,
            height: scaled_height + 2 * padding,
        }
    }
}

// Smallest c with c * c >= n, without trusting float sqrt at the edges
pub fn grid_columns(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut cols = (n as f64).sqrt().ceil() as usize;
    while cols * cols < n {
        cols += 1;
    }
    while cols > 1 && (cols - 1) * (cols - 1) >= n {
        cols -= 1;
    }
    cols
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub count: usize,
    pub columns: usize,
    pub rows: usize,
    pub cell: CellDim,
}

impl GridLayout {
    pub fn new(count: usize, cell: CellDim) -> Result<Self, GridError> {
        if count == 0 {
            return Err(GridError::InvalidOption(String::from(
                "a grid needs at least one video",
            )));
        }
        let columns = grid_columns(count);
        let rows = count.div_ceil(columns);
        Ok(Self {
            count,
            columns,
            rows,
            cell,
        })
    }

    pub fn width(&self) -> u32 {
        self.columns as u32 * self.cell.width
    }

    pub fn height(&self) -> u32 {
        self.rows as u32 * self.cell.height
    }

    // Pixel offset of every occupied cell, row-major
    pub fn positions(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::with_capacity(self.count);
        for row in 0..self.rows {
            for col in 0..self.columns {
                if row * self.columns + col < self.count {
                    out.push((
                        col as u32 * self.cell.width,
                        row as u32 * self.cell.height,
                    ));
                }
            }
        }
        out
    }
}

// Timing for one cell so that every cell ends together
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FreezePlan {
    // the last (offset - 1) frames, dropped to avoid a corrupt tail frame
    pub trim_duration: f64,
    pub trim_end: f64,
    // how much shorter than the longest clip this one is
    pub pad_duration: f64,
    // how long the last kept frame is held
    pub freeze_duration: f64,
    pub frozen: bool,
}

impl FreezePolicy {
    pub fn plan(&self, md: &VideoMetadata, max_duration: f64) -> FreezePlan {
        let frames_to_trim = self.offset.saturating_sub(1) as f64;
        let trim_duration = frames_to_trim * md.frame_interval();
        let trim_end = (md.duration - trim_duration).max(0.0);
        let pad_duration = max_duration - md.duration;
        let frozen = pad_duration > self.threshold;
        let freeze_duration = if frozen {
            pad_duration + trim_duration
        } else {
            trim_duration
        };
        FreezePlan {
            trim_duration,
            trim_end,
            pad_duration,
            freeze_duration,
            frozen,
        }
    }

    // Label text with the frozen marker when the clip had to be held
    pub fn decorate(&self, label: String, plan: &FreezePlan) -> String {
        if plan.frozen && !self.glyph.is_empty() {
            format!("{label} {}", self.glyph)
        } else {
            label
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn md(duration: f64, fps: f64, width: u32, height: u32) -> VideoMetadata {
        VideoMetadata {
            duration,
            fps,
            width,
            height,
        }
    }

    #[test]
    fn columns_and_rows_for_small_grids() {
        let expected = [
            (1, 1, 1),
            (2, 2, 1),
            (3, 2, 2),
            (4, 2, 2),
            (5, 3, 2),
            (6, 3, 2),
            (7, 3, 3),
            (8, 3, 3),
            (9, 3, 3),
            (10, 4, 3),
        ];
        let cell = CellDim::compute(&md(1.0, 30.0, 640, 360), 640, 0.0);
        for (n, cols, rows) in expected {
            let layout = GridLayout::new(n, cell).unwrap();
            assert_eq!((layout.columns, layout.rows), (cols, rows), "n={n}");
            assert!(layout.columns * layout.rows >= n);
            // only the last row may have holes
            assert!(layout.columns * (layout.rows - 1) < n);
            assert_eq!(layout.positions().len(), n);
        }
    }

    #[test]
    fn grid_columns_exact_squares() {
        assert_eq!(grid_columns(16), 4);
        assert_eq!(grid_columns(17), 5);
        assert_eq!(grid_columns(10_000), 100);
        assert_eq!(grid_columns(10_001), 101);
    }

    #[test]
    fn empty_grid_rejected() {
        let cell = CellDim::compute(&md(1.0, 30.0, 640, 360), 640, 0.0);
        assert!(GridLayout::new(0, cell).is_err());
    }

    #[test]
    fn cell_dims_scale_and_pad() {
        let cell = CellDim::compute(&md(1.0, 30.0, 1920, 1080), 640, 2.0);
        assert_eq!(cell.scaled_height, 360);
        // 360 * 2% = 7.2 -> 7
        assert_eq!(cell.padding, 7);
        assert_eq!(cell.height, 374);

        // 1000 * 640 / 1280 = 500 ; 500 * 3% = 15
        let cell = CellDim::compute(&md(1.0, 30.0, 1280, 1000), 640, 3.0);
        assert_eq!((cell.scaled_height, cell.padding, cell.height), (500, 15, 530));
    }

    #[test]
    fn positions_row_major() {
        let cell = CellDim {
            width: 100,
            scaled_height: 50,
            padding: 5,
            height: 60,
        };
        let layout = GridLayout::new(5, cell).unwrap();
        assert_eq!(
            layout.positions(),
            vec![(0, 0), (100, 0), (200, 0), (0, 60), (100, 60)]
        );
        assert_eq!((layout.width(), layout.height()), (300, 120));
    }

    #[test]
    fn freeze_for_short_clip() {
        let policy = FreezePolicy::default();
        let plan = policy.plan(&md(5.0, 30.0, 640, 360), 8.0);
        assert!((plan.trim_duration - 2.0 / 30.0).abs() < 1e-9);
        assert!((plan.trim_end - (5.0 - 2.0 / 30.0)).abs() < 1e-9);
        assert!((plan.pad_duration - 3.0).abs() < 1e-9);
        assert!((plan.freeze_duration - (3.0 + 2.0 / 30.0)).abs() < 1e-9);
        assert!(plan.frozen);
        assert_eq!(policy.decorate(String::from("5"), &plan), "5 ✓");
    }

    #[test]
    fn no_freeze_for_longest_clip() {
        let policy = FreezePolicy::default();
        let plan = policy.plan(&md(8.0, 30.0, 640, 360), 8.0);
        assert!(!plan.frozen);
        assert_eq!(plan.freeze_duration, plan.trim_duration);
        assert_eq!(policy.decorate(String::from("5"), &plan), "5");

        // inside the threshold still counts as finished together
        let plan = policy.plan(&md(7.995, 30.0, 640, 360), 8.0);
        assert!(!plan.frozen);
    }

    #[test]
    fn configurable_threshold_and_glyph() {
        let policy = FreezePolicy {
            offset: 1,
            threshold: 0.5,
            glyph: String::from("*"),
        };
        let plan = policy.plan(&md(7.0, 25.0, 640, 360), 8.0);
        assert_eq!(plan.trim_duration, 0.0);
        assert_eq!(plan.trim_end, 7.0);
        assert!(plan.frozen);
        assert_eq!(policy.decorate(String::from("a"), &plan), "a *");
        assert!(!policy.plan(&md(7.6, 25.0, 640, 360), 8.0).frozen);
    }

    #[test]
    fn trim_end_never_negative() {
        let policy = FreezePolicy {
            offset: 10,
            ..Default::default()
        };
        let plan = policy.plan(&md(0.1, 30.0, 640, 360), 0.1);
        assert_eq!(plan.trim_end, 0.0);
    }
}
