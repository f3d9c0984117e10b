//! Calendar skeleton: month pages covering a date window, and cell geometry.
//!
//! A [`CalendarGrid`] splits an inclusive date window into one [`MonthPage`]
//! per calendar month. The first and last pages are clipped to the window, so
//! a window from Jan 20 to Mar 5 has pages Jan 20–31, Feb 1–28 and Mar 1–5.
//! Days on a page are addressed by a zero-based index ([`DayRef`]).

use chrono::{Datelike, Month, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geometry::Insets, span::DaySpan};

/// Errors raised while building a calendar grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("calendar window ends on {end} before it starts on {start}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },

    #[error("date arithmetic left the representable range near {0}")]
    OutOfRange(NaiveDate),
}

/// Address of one day cell: the page index and the day index within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayRef {
    pub page: usize,
    pub day: usize,
}

/// Dimensions of a day cell and of the bars drawn inside it.
///
/// All values are in page units. The track area of a cell is what remains of
/// `cell_height` after the vertical padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellGeometry {
    day_width: f32,
    cell_height: f32,
    bar_height: f32,
    track_spacing: f32,
    padding: Insets,
    bar_inset: f32,
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self {
            day_width: 40.0,
            cell_height: 60.0,
            bar_height: 12.0,
            track_spacing: 2.0,
            padding: Insets::new(14.0, 0.0, 4.0, 0.0),
            bar_inset: 1.0,
        }
    }
}

impl CellGeometry {
    pub fn new(day_width: f32, cell_height: f32, bar_height: f32, track_spacing: f32) -> Self {
        Self {
            day_width,
            cell_height,
            bar_height,
            track_spacing,
            ..Self::default()
        }
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_bar_inset(mut self, bar_inset: f32) -> Self {
        self.bar_inset = bar_inset;
        self
    }

    pub fn day_width(&self) -> f32 {
        self.day_width
    }

    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    pub fn bar_height(&self) -> f32 {
        self.bar_height
    }

    pub fn track_spacing(&self) -> f32 {
        self.track_spacing
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }

    /// Horizontal gap kept between a bar and its cell borders.
    pub fn bar_inset(&self) -> f32 {
        self.bar_inset
    }

    /// Height available for tracks inside one cell.
    pub fn track_area_height(&self) -> f32 {
        self.cell_height - self.padding.vertical_sum()
    }

    /// Vertical distance between the tops of two consecutive tracks.
    pub fn track_pitch(&self) -> f32 {
        self.bar_height + self.track_spacing
    }

    /// Height of `tracks` stacked bars including the spacing between them.
    pub fn stack_height(&self, tracks: usize) -> f32 {
        if tracks == 0 {
            return 0.0;
        }
        tracks as f32 * self.bar_height + (tracks - 1) as f32 * self.track_spacing
    }
}

/// One month of the calendar window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPage {
    index: usize,
    span: DaySpan,
    offset: usize,
}

impl MonthPage {
    /// Position of the page in the grid.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn year(&self) -> i32 {
        self.span.start().year()
    }

    pub fn month(&self) -> u32 {
        self.span.start().month()
    }

    /// The dates shown on this page, clipped to the calendar window.
    pub fn span(&self) -> DaySpan {
        self.span
    }

    /// Number of days between the window start and the first day of the page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn day_count(&self) -> usize {
        usize::try_from(self.span.days()).unwrap_or_default()
    }

    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.span.offset_of(date)
    }

    /// Human-readable title, e.g. "January 2025".
    pub fn label(&self) -> String {
        let name = u8::try_from(self.month())
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        format!("{name} {}", self.year())
    }
}

/// Ordered month pages covering an inclusive date window.
///
/// # Examples
///
/// ```
/// # use almanac_core::calendar::{CalendarGrid, CellGeometry, DayRef};
/// # use chrono::NaiveDate;
/// let start = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
/// let grid = CalendarGrid::new(start, end, CellGeometry::default()).unwrap();
///
/// assert_eq!(grid.pages().len(), 3);
/// assert_eq!(grid.pages()[0].day_count(), 12);
/// assert_eq!(
///     grid.locate(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()),
///     Some(DayRef { page: 1, day: 2 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    window: DaySpan,
    pages: Vec<MonthPage>,
    geometry: CellGeometry,
}

impl CalendarGrid {
    /// Builds one page per calendar month touched by `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::EmptyWindow`] when `end` precedes `start`.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        geometry: CellGeometry,
    ) -> Result<Self, CalendarError> {
        let window = DaySpan::new(start, end).map_err(|_| CalendarError::EmptyWindow { start, end })?;

        let mut pages = Vec::new();
        let mut month_start = start.with_day(1).ok_or(CalendarError::OutOfRange(start))?;
        loop {
            let month_end = last_day_of_month(month_start)?;
            let month = DaySpan::new(month_start, month_end)
                .map_err(|_| CalendarError::OutOfRange(month_start))?;
            if let Some(span) = month.clip(window) {
                let offset = window.offset_of(span.start()).unwrap_or_default();
                pages.push(MonthPage {
                    index: pages.len(),
                    span,
                    offset,
                });
            }
            if month_end >= end {
                break;
            }
            month_start = month_end
                .succ_opt()
                .ok_or(CalendarError::OutOfRange(month_end))?;
        }

        Ok(Self {
            window,
            pages,
            geometry,
        })
    }

    pub fn window(&self) -> DaySpan {
        self.window
    }

    pub fn pages(&self) -> &[MonthPage] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&MonthPage> {
        self.pages.get(index)
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    /// Total number of days in the window.
    pub fn day_count(&self) -> usize {
        usize::try_from(self.window.days()).unwrap_or_default()
    }

    /// Finds the page and day cell showing `date`.
    pub fn locate(&self, date: NaiveDate) -> Option<DayRef> {
        let offset = self.window.offset_of(date)?;
        let page = self
            .pages
            .partition_point(|page| page.offset + page.day_count() <= offset);
        let day = offset - self.pages.get(page)?.offset;
        Some(DayRef { page, day })
    }
}

/// Last day of the month starting on `month_start`.
///
/// Works for the final month chrono can represent, where no following month
/// exists to step back from.
fn last_day_of_month(month_start: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let length = month_start
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31);
    (28..=length)
        .rev()
        .find_map(|day| month_start.with_day(day))
        .ok_or(CalendarError::OutOfRange(month_start))
}
