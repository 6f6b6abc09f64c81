use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone};
use itertools::Itertools;
use tracing::debug;

use crate::{
    domain::{self, Category, CategoryId, Entry, EntryId},
    error::CounterResult,
    storage::{KeyValueStore, Store},
    time::{self, Clock},
    undo::{UndoController, UndoOutcome},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineRow {
    pub entry: Entry,
    pub category: Option<Category>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRow {
    pub category_id: CategoryId,
    pub category: Option<Category>,
    pub count: usize,
}

pub fn count_by_category(entries: &[Entry]) -> HashMap<CategoryId, usize> {
    entries.iter().map(|e| e.category_id.clone()).counts()
}

pub struct EntryLog<'a, B, C, Tz> {
    store: &'a mut Store<B>,
    clock: &'a C,
    tz: &'a Tz,
    undo: &'a mut UndoController,
}

impl<'a, B, C, Tz> EntryLog<'a, B, C, Tz>
where
    B: KeyValueStore,
    C: Clock,
    Tz: TimeZone,
{
    pub fn new(
        store: &'a mut Store<B>,
        clock: &'a C,
        tz: &'a Tz,
        undo: &'a mut UndoController,
    ) -> Self {
        Self {
            store,
            clock,
            tz,
            undo,
        }
    }

    pub fn all(&self) -> Vec<Entry> {
        self.store.entries()
    }

    // The category id is not checked against the registry.
    pub fn append(&mut self, category_id: &CategoryId) -> CounterResult<Entry> {
        let now = self.clock.now_ms();
        let mut entries = self.store.entries();

        let id = domain::generate_id("ent", now, |candidate| {
            entries.iter().any(|e| e.id.as_str() == candidate)
        });
        let entry = Entry {
            id: EntryId::new(id),
            category_id: category_id.clone(),
            timestamp: now,
        };
        entries.push(entry.clone());
        self.store.save_entries(&entries)?;

        self.undo.arm(&entry, now);
        debug!("Appended entry {} for category {}", entry.id, entry.category_id);
        Ok(entry)
    }

    pub fn delete(&mut self, id: &EntryId) -> CounterResult<bool> {
        let mut entries = self.store.entries();
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        self.store.save_entries(&entries)?;
        debug!("Deleted entry {}", id);
        Ok(true)
    }

    pub fn query_day(&self, date: NaiveDate) -> Vec<Entry> {
        let (start, end) = time::day_window(date, self.tz);
        self.store
            .entries()
            .into_iter()
            .filter(|e| (start..=end).contains(&e.timestamp))
            .collect()
    }

    pub fn count_by_category(&self, entries: &[Entry]) -> HashMap<CategoryId, usize> {
        count_by_category(entries)
    }

    pub fn timeline(&self, date: NaiveDate) -> Vec<TimelineRow> {
        let categories = domain::category_map(&self.store.categories());
        self.query_day(date)
            .into_iter()
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .map(|entry| TimelineRow {
                category: categories.get(&entry.category_id).cloned(),
                entry,
            })
            .collect()
    }

    pub fn day_summary(&self, date: NaiveDate) -> Vec<SummaryRow> {
        let categories = domain::category_map(&self.store.categories());
        let entries = self.query_day(date);
        let counts = count_by_category(&entries);

        entries
            .iter()
            .map(|e| &e.category_id)
            .unique()
            .map(|id| SummaryRow {
                category_id: id.clone(),
                category: categories.get(id).cloned(),
                count: counts.get(id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// The target is the last stored entry carrying the armed timestamp, so two
    /// taps in the same millisecond cannot be told apart here. The slot stays
    /// armed if the write fails.
    pub fn undo(&mut self) -> CounterResult<UndoOutcome> {
        let now = self.clock.now_ms();
        let Some(timestamp) = self.undo.armed_timestamp(now) else {
            self.undo.poll(now);
            return Ok(UndoOutcome::NothingToUndo);
        };

        let mut entries = self.store.entries();
        let Some(position) = entries.iter().rposition(|e| e.timestamp == timestamp) else {
            self.undo.cancel();
            return Ok(UndoOutcome::NothingToUndo);
        };
        let removed = entries.remove(position);
        self.store.save_entries(&entries)?;
        self.undo.cancel();

        debug!("Undid entry {}", removed.id);
        Ok(UndoOutcome::Undone(removed))
    }
}
