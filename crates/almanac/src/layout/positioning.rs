//! Converting (day, track) placements into page coordinates.
//!
//! # Placement
//!
//! A bar starts at `padding.left + first_day * day_width + bar_inset` and is
//! `day_count * day_width - 2 * bar_inset` wide. Vertically, track `t` sits
//! `t * track_pitch` below the top of its stack. How the stack itself sits in
//! the cell's track area depends on the [`Alignment`]; the stack height is
//! the number of tracks the bar's overlap group uses on that page, so bars
//! sharing a day always share a vertical origin. Alignment applies only to
//! stacks smaller than `max_tracks_per_day`; full stacks are top aligned.
//!
//! # Collision Nudge
//!
//! Optional grid snapping can round two bars into each other. The nudge pass
//! visits bars in (page, track, first day, task) order and pushes each bar
//! down to the bottom edge of any earlier bar it intersects, repeating until
//! it is clear. Earlier bars never move again, so a second pass finds nothing
//! to do.

use std::collections::HashMap;

use log::{debug, trace};

use almanac_core::{
    calendar::CellGeometry,
    geometry::{Bounds, Point, Size},
};

use crate::{
    config::{Alignment, CategoryPalette},
    layout::result::TaskBar,
};

/// Overlap tolerance of the collision check.
const COLLISION_EPSILON: f32 = 1e-3;

/// Computes bar coordinates on month pages.
#[derive(Debug, Clone, Copy)]
pub struct PositioningEngine<'a> {
    geometry: &'a CellGeometry,
    palette: &'a CategoryPalette,
    max_tracks: usize,
    alignment: Alignment,
    grid_snap: Option<f32>,
}

impl<'a> PositioningEngine<'a> {
    pub fn new(geometry: &'a CellGeometry, palette: &'a CategoryPalette, max_tracks: usize) -> Self {
        Self {
            geometry,
            palette,
            max_tracks,
            alignment: Alignment::default(),
            grid_snap: None,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_grid_snap(mut self, grid_snap: Option<f32>) -> Self {
        self.grid_snap = grid_snap;
        self
    }

    /// Sets position, size and color of every bar, then runs the nudge pass.
    pub fn position(&self, bars: &mut [TaskBar]) {
        let mut stacks: HashMap<(usize, usize), usize> = HashMap::new();
        for bar in bars.iter() {
            let stack = stacks.entry((bar.overlap_group(), bar.page())).or_default();
            *stack = (*stack).max(bar.track() + 1);
        }

        for bar in bars.iter_mut() {
            let stack = stacks
                .get(&(bar.overlap_group(), bar.page()))
                .copied()
                .unwrap_or(1);
            let (mut position, mut size) =
                self.place(bar.first_day(), bar.day_count(), bar.track(), stack);
            if let Some(resolution) = self.grid_snap {
                position = position.snapped(resolution);
                size = size.snapped(resolution);
            }
            bar.set_position(position);
            bar.set_size(size);
            bar.set_color(self.palette.color_for(bar.category()));
        }

        let moved = self.nudge(bars);
        debug!(bars = bars.len(), nudged = moved; "Bars positioned");
    }

    /// Top-left corner and size of a bar before snapping.
    pub fn place(
        &self,
        first_day: usize,
        day_count: usize,
        track: usize,
        stack: usize,
    ) -> (Point, Size) {
        let geometry = self.geometry;
        let padding = geometry.padding();
        let inset = geometry.bar_inset();

        let x = padding.left() + first_day as f32 * geometry.day_width() + inset;
        let width = day_count as f32 * geometry.day_width() - 2.0 * inset;
        let y = padding.top() + self.track_offset(track, stack);

        (Point::new(x, y), Size::new(width, geometry.bar_height()))
    }

    /// Offset of `track` from the top of the track area, for a stack of
    /// `stack` tracks.
    fn track_offset(&self, track: usize, stack: usize) -> f32 {
        let geometry = self.geometry;
        let pitch = geometry.track_pitch();
        let stacked = track as f32 * pitch;
        if stack == 0 || stack >= self.max_tracks {
            return stacked;
        }

        let free = (geometry.track_area_height() - geometry.stack_height(stack)).max(0.0);
        match self.alignment {
            Alignment::Top => stacked,
            Alignment::Center => free / 2.0 + stacked,
            Alignment::Bottom => free + stacked,
            Alignment::Distributed => {
                let slot = geometry.track_area_height() / stack as f32;
                if slot < pitch {
                    stacked
                } else {
                    track as f32 * slot + (slot - geometry.bar_height()) / 2.0
                }
            }
        }
    }

    /// Pushes intersecting bars apart. Returns the number of bars moved.
    pub fn nudge(&self, bars: &mut [TaskBar]) -> usize {
        let mut order: Vec<usize> = (0..bars.len()).collect();
        order.sort_by_key(|&i| {
            let bar = &bars[i];
            (bar.page(), bar.track(), bar.first_day(), bar.task())
        });

        let mut settled: HashMap<usize, Vec<Bounds>> = HashMap::new();
        let mut moved = 0;
        for i in order {
            let page = bars[i].page();
            let lane = settled.entry(page).or_default();
            let mut bounds = bars[i].bounds();

            loop {
                let blocker = lane
                    .iter()
                    .filter(|other| other.intersects(&bounds, COLLISION_EPSILON))
                    .map(|other| other.max_y())
                    .reduce(f32::max);
                match blocker {
                    Some(bottom) => bounds = bounds.with_min_y(bottom),
                    None => break,
                }
            }

            if bounds.min_point() != bars[i].position() {
                trace!(
                    task = bars[i].task().to_string(),
                    from = bars[i].position().y(),
                    to = bounds.min_y();
                    "Bar nudged"
                );
                bars[i].set_position(bounds.min_point());
                moved += 1;
            }
            lane.push(bars[i].bounds());
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use float_cmp::assert_approx_eq;

    use almanac_core::{color::Color, identifier::Id, span::DaySpan};

    use super::*;
    use crate::{config::StyleConfig, layout::priority::ProminenceTier};

    fn bar(id: &str, group: usize, track: usize, first: u32, last: u32) -> TaskBar {
        let span = DaySpan::new(
            NaiveDate::from_ymd_opt(2025, 1, first).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, last).unwrap(),
        )
        .unwrap();
        TaskBar::new(
            Id::new(id),
            group,
            Id::new("design"),
            ProminenceTier::Medium,
            0,
            track,
            first as usize - 1,
            span,
        )
    }

    fn palette() -> CategoryPalette {
        StyleConfig::default()
            .with_category_color(Id::new("design"), "#336699")
            .palette()
            .unwrap()
    }

    #[test]
    fn test_top_alignment_coordinates() {
        let geometry = CellGeometry::default();
        let palette = palette();
        let engine = PositioningEngine::new(&geometry, &palette, 3);
        let mut bars = vec![bar("a", 0, 0, 1, 10), bar("b", 0, 1, 5, 15)];
        engine.position(&mut bars);

        // padding.left 0, inset 1, day width 40.
        assert_approx_eq!(f32, bars[0].position().x(), 1.0);
        assert_approx_eq!(f32, bars[0].size().width(), 398.0);
        assert_approx_eq!(f32, bars[0].position().y(), 14.0);
        assert_approx_eq!(f32, bars[1].position().x(), 161.0);
        assert_approx_eq!(f32, bars[1].position().y(), 28.0);
        assert_approx_eq!(f32, bars[1].size().height(), 12.0);
        assert_eq!(bars[0].color(), Color::new("#336699").unwrap());
    }

    #[test]
    fn test_center_and_bottom_alignment() {
        let geometry = CellGeometry::default();
        let palette = palette();
        // Track area 42, one bar of 12 leaves 30.
        let center = PositioningEngine::new(&geometry, &palette, 3).with_alignment(Alignment::Center);
        let (position, _) = center.place(0, 1, 0, 1);
        assert_approx_eq!(f32, position.y(), 14.0 + 15.0);

        let bottom = PositioningEngine::new(&geometry, &palette, 3).with_alignment(Alignment::Bottom);
        let (position, _) = bottom.place(0, 1, 0, 1);
        assert_approx_eq!(f32, position.y(), 14.0 + 30.0);

        // A full stack ignores alignment.
        let (position, _) = bottom.place(0, 1, 0, 3);
        assert_approx_eq!(f32, position.y(), 14.0);
    }

    #[test]
    fn test_distributed_alignment() {
        let geometry = CellGeometry::default();
        let palette = palette();
        let engine =
            PositioningEngine::new(&geometry, &palette, 3).with_alignment(Alignment::Distributed);

        // Two tracks in 42 units: slots of 21, bars centered in each.
        let (first, _) = engine.place(0, 1, 0, 2);
        let (second, _) = engine.place(0, 1, 1, 2);
        assert_approx_eq!(f32, first.y(), 14.0 + 4.5);
        assert_approx_eq!(f32, second.y(), 14.0 + 21.0 + 4.5);
    }

    #[test]
    fn test_stack_height_is_per_group() {
        let geometry = CellGeometry::default();
        let palette = palette();
        let engine = PositioningEngine::new(&geometry, &palette, 3).with_alignment(Alignment::Bottom);
        let mut bars = vec![
            bar("a", 0, 0, 1, 3),
            bar("b", 0, 1, 2, 3),
            bar("c", 1, 0, 10, 12),
        ];
        engine.position(&mut bars);

        // Group 0 stacks two bars: 42 - 26 = 16 free.
        assert_approx_eq!(f32, bars[0].position().y(), 14.0 + 16.0);
        // Group 1 has a single bar: 42 - 12 = 30 free.
        assert_approx_eq!(f32, bars[2].position().y(), 14.0 + 30.0);
    }

    #[test]
    fn test_snap_then_nudge_clears_collision() {
        // Tops at 14 and 27 snap to 15 and 25 while the height snaps to 15.
        let geometry = CellGeometry::new(40.0, 60.0, 13.0, 0.0);
        let palette = palette();
        let engine = PositioningEngine::new(&geometry, &palette, 3).with_grid_snap(Some(5.0));
        let mut bars = vec![bar("a", 0, 0, 1, 4), bar("b", 0, 1, 1, 4)];
        engine.position(&mut bars);

        let (a, b) = (bars[0].bounds(), bars[1].bounds());
        assert!(!a.intersects(&b, COLLISION_EPSILON));
        assert_approx_eq!(f32, b.min_y(), 30.0);
        assert_eq!(engine.nudge(&mut bars), 0);
    }

    #[test]
    fn test_nudge_ignores_other_pages() {
        let geometry = CellGeometry::default();
        let palette = palette();
        let engine = PositioningEngine::new(&geometry, &palette, 3);
        let mut first = bar("a", 0, 0, 1, 4);
        let mut second = TaskBar::new(
            Id::new("b"),
            1,
            Id::new("design"),
            ProminenceTier::Low,
            1,
            0,
            0,
            DaySpan::single(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        );
        first.set_position(Point::new(0.0, 0.0));
        first.set_size(Size::new(100.0, 10.0));
        second.set_position(Point::new(0.0, 0.0));
        second.set_size(Size::new(100.0, 10.0));

        let mut bars = vec![first, second];
        assert_eq!(engine.nudge(&mut bars), 0);
    }
}
