//! Per-day track assignment.
//!
//! Within each overlap group the assigner walks the group's days in order.
//! On every day the active tasks are placed in [`placement_order`], each on a
//! free track below `max_tracks_per_day`. A task that finds no free track is
//! hidden for that day and counted as overflow.
//!
//! Because a track holds at most one task per day, two runs on the same track
//! never share a day, and no day ever uses more than `max_tracks_per_day`
//! tracks.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::{debug, trace};
use serde::Serialize;

use almanac_core::{identifier::Id, span::DaySpan};

use crate::{
    config::TrackStrategy,
    layout::{
        grouping::OverlapGroup,
        priority::{TaskPriority, placement_order},
    },
    structure::TaskSet,
};

/// Consecutive days a task holds on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackRun {
    task: Id,
    group: usize,
    track: usize,
    span: DaySpan,
}

impl TrackRun {
    pub fn new(task: Id, group: usize, track: usize, span: DaySpan) -> Self {
        Self {
            task,
            group,
            track,
            span,
        }
    }

    pub fn task(&self) -> Id {
        self.task
    }

    /// Index of the overlap group the task belongs to.
    pub fn group(&self) -> usize {
        self.group
    }

    pub fn track(&self) -> usize {
        self.track
    }

    pub fn span(&self) -> DaySpan {
        self.span
    }
}

/// Tasks hidden for lack of a free track, by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenDays {
    days: BTreeMap<NaiveDate, Vec<Id>>,
}

impl HiddenDays {
    /// Records `task` as hidden on `date`.
    pub fn hide(&mut self, date: NaiveDate, task: Id) {
        let hidden = self.days.entry(date).or_default();
        if let Err(position) = hidden.binary_search(&task) {
            hidden.insert(position, task);
        }
    }

    /// Hidden task ids per date, in date order. Ids are sorted.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Id])> {
        self.days.iter().map(|(date, ids)| (*date, ids.as_slice()))
    }

    #[cfg(test)]
    pub fn count(&self, date: NaiveDate) -> usize {
        self.days.get(&date).map_or(0, Vec::len)
    }

    /// Total number of hidden task-days.
    pub fn total(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Output of the track assigner.
#[derive(Debug, Clone, Default)]
pub struct TrackAssignment {
    runs: Vec<TrackRun>,
    hidden: HiddenDays,
}

impl TrackAssignment {
    /// Runs ordered by start date, track and task id.
    pub fn runs(&self) -> &[TrackRun] {
        &self.runs
    }

    pub fn hidden(&self) -> &HiddenDays {
        &self.hidden
    }

    pub fn into_parts(self) -> (Vec<TrackRun>, HiddenDays) {
        (self.runs, self.hidden)
    }
}

/// Assigns tasks to tracks, one day at a time.
#[derive(Debug, Clone, Copy)]
pub struct TrackAssigner {
    max_tracks: usize,
    strategy: TrackStrategy,
}

impl TrackAssigner {
    pub fn new(max_tracks: usize, strategy: TrackStrategy) -> Self {
        Self {
            max_tracks,
            strategy,
        }
    }

    /// Assigns every group. Groups never share a day, so each one is solved
    /// on its own and the results are merged in a fixed order.
    pub fn assign(
        &self,
        tasks: &TaskSet<'_>,
        groups: &[OverlapGroup],
        priorities: &[TaskPriority],
    ) -> TrackAssignment {
        let ranking: HashMap<Id, &TaskPriority> = priorities
            .iter()
            .map(|priority| (priority.task(), priority))
            .collect();

        let mut assignment = TrackAssignment::default();
        for group in groups {
            self.assign_group(tasks, group, &ranking, &mut assignment);
        }

        assignment
            .runs
            .sort_by_key(|run| (run.span.start(), run.track, run.task));
        debug!(
            runs = assignment.runs.len(),
            hidden = assignment.hidden.total();
            "Tracks assigned"
        );
        assignment
    }

    fn assign_group(
        &self,
        tasks: &TaskSet<'_>,
        group: &OverlapGroup,
        ranking: &HashMap<Id, &TaskPriority>,
        assignment: &mut TrackAssignment,
    ) {
        let mut members: Vec<_> = group
            .members()
            .iter()
            .filter_map(|id| {
                let scheduled = tasks.get(*id)?;
                let priority = ranking.get(id)?;
                Some((scheduled.span(), *priority))
            })
            .collect();
        members.sort_by(|(_, a), (_, b)| placement_order(a, b));

        // Track held on the previous day, and the run it extends.
        let mut held: HashMap<Id, OpenRun> = HashMap::new();

        for date in group.span().dates() {
            let active: Vec<Id> = members
                .iter()
                .filter(|(span, _)| span.contains(date))
                .map(|(_, priority)| priority.task())
                .collect();
            let today = self.place_day(date, &active, &held, &mut assignment.hidden);

            // Close runs that did not continue on the same track today.
            let mut closing: Vec<Id> = held
                .iter()
                .filter(|(id, open)| today.get(id) != Some(&open.track))
                .map(|(id, _)| *id)
                .collect();
            closing.sort();
            for id in closing {
                if let Some(open) = held.remove(&id) {
                    assignment.runs.push(open.finish(id, group.index()));
                }
            }

            for (id, track) in today {
                held.entry(id)
                    .and_modify(|open| open.end = date)
                    .or_insert(OpenRun {
                        track,
                        start: date,
                        end: date,
                    });
            }
        }

        let mut remaining: Vec<_> = held.into_iter().collect();
        remaining.sort_by_key(|(id, _)| *id);
        for (id, open) in remaining {
            assignment.runs.push(open.finish(id, group.index()));
        }
    }

    /// Places the tasks active on `date`, given in placement order.
    ///
    /// With [`TrackStrategy::Sticky`] a task keeps yesterday's track when it
    /// is free, and tasks without one avoid tracks that lower ranked tasks
    /// still hope to keep.
    fn place_day(
        &self,
        date: NaiveDate,
        active: &[Id],
        held: &HashMap<Id, OpenRun>,
        hidden: &mut HiddenDays,
    ) -> HashMap<Id, usize> {
        let sticky = self.strategy == TrackStrategy::Sticky;
        let mut occupied = vec![false; self.max_tracks];
        let mut reserved = vec![0usize; self.max_tracks];
        let previous: Vec<Option<usize>> = active
            .iter()
            .map(|id| held.get(id).map(|open| open.track).filter(|_| sticky))
            .collect();
        for track in previous.iter().flatten() {
            reserved[*track] += 1;
        }

        let mut today = HashMap::new();
        for (id, previous) in active.iter().zip(&previous) {
            if let Some(track) = previous {
                reserved[*track] -= 1;
            }
            let choice = previous
                .filter(|track| !occupied[*track])
                .or_else(|| (0..self.max_tracks).find(|t| !occupied[*t] && reserved[*t] == 0))
                .or_else(|| occupied.iter().position(|taken| !taken));
            match choice {
                Some(track) => {
                    occupied[track] = true;
                    today.insert(*id, track);
                }
                None => {
                    trace!(task = id.to_string(), date:%; "No free track, task hidden");
                    hidden.hide(date, *id);
                }
            }
        }
        today
    }
}

struct OpenRun {
    track: usize,
    start: NaiveDate,
    end: NaiveDate,
}

impl OpenRun {
    fn finish(self, task: Id, group: usize) -> TrackRun {
        let span = DaySpan::new(self.start, self.end).unwrap_or(DaySpan::single(self.start));
        TrackRun::new(task, group, self.track, span)
    }
}
