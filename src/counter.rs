use std::{collections::HashMap, fmt::Display};

use chrono::{NaiveDate, TimeZone};
use tracing::{debug, info};

use crate::{
    domain::{CategoryId, Entry},
    entry_log::{EntryLog, SummaryRow, TimelineRow},
    error::CounterResult,
    export::{self, Exporter},
    registry::CategoryRegistry,
    storage::{KeyValueStore, Store},
    time::{self, Clock, DayCursor},
    undo::{ExpiryHandle, PendingUndo, UndoController, UndoOutcome},
};

pub struct FrontCounter<B, C, Tz> {
    store: Store<B>,
    clock: C,
    tz: Tz,
    undo: UndoController,
    cursor: DayCursor,
}

impl<B, C, Tz> FrontCounter<B, C, Tz>
where
    B: KeyValueStore,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(backend: B, clock: C, tz: Tz) -> Self {
        let today = time::date_of(clock.now_ms(), &tz);
        Self {
            store: Store::new(backend),
            clock,
            tz,
            undo: UndoController::new(),
            cursor: DayCursor::new(today),
        }
    }

    pub fn open(backend: B, clock: C, tz: Tz) -> CounterResult<Self> {
        let mut counter = Self::new(backend, clock, tz);
        if counter.categories().seed_if_empty()? {
            info!("Installed default categories");
        }
        Ok(counter)
    }

    pub fn store(&self) -> &Store<B> {
        &self.store
    }

    pub fn categories(&mut self) -> CategoryRegistry<'_, B, C> {
        CategoryRegistry::new(&mut self.store, &self.clock)
    }

    pub fn entries(&mut self) -> EntryLog<'_, B, C, Tz> {
        EntryLog::new(&mut self.store, &self.clock, &self.tz, &mut self.undo)
    }

    pub fn today(&self) -> NaiveDate {
        time::date_of(self.clock.now_ms(), &self.tz)
    }

    pub fn tap(&mut self, category_id: &CategoryId) -> CounterResult<Entry> {
        self.entries().append(category_id)
    }

    pub fn undo(&mut self) -> CounterResult<UndoOutcome> {
        self.entries().undo()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo(self.clock.now_ms())
    }

    pub fn undo_expiry(&self) -> Option<ExpiryHandle> {
        self.undo.current_expiry()
    }

    pub fn expire_undo(&mut self, handle: ExpiryHandle) -> bool {
        self.undo.expire(handle)
    }

    pub fn poll_undo(&mut self) -> bool {
        self.undo.poll(self.clock.now_ms())
    }

    pub fn pending_undo(&self) -> Option<PendingUndo> {
        self.undo.snapshot()
    }

    pub fn restore_pending_undo(&mut self, pending: PendingUndo) -> Option<ExpiryHandle> {
        let now = self.clock.now_ms();
        self.undo.restore(pending, now)
    }

    pub fn today_counts(&mut self) -> HashMap<CategoryId, usize> {
        let today = self.today();
        let log = self.entries();
        log.count_by_category(&log.query_day(today))
    }

    pub fn cursor_date(&self) -> NaiveDate {
        self.cursor.date()
    }

    pub fn cursor_is_today(&self) -> bool {
        self.cursor.is_today(self.today())
    }

    pub fn show_day(&mut self, date: NaiveDate) {
        let today = self.today();
        if date >= today {
            self.cursor.reset(today);
        } else {
            self.cursor = DayCursor::new(date);
        }
    }

    pub fn prev_day(&mut self) -> NaiveDate {
        self.cursor.prev()
    }

    pub fn next_day(&mut self) -> bool {
        let today = self.today();
        self.cursor.next(today)
    }

    pub fn timeline(&mut self) -> Vec<TimelineRow> {
        let date = self.cursor.date();
        self.entries().timeline(date)
    }

    pub fn summary(&mut self) -> Vec<SummaryRow> {
        let date = self.cursor.date();
        self.entries().day_summary(date)
    }

    pub fn export(&self) -> CounterResult<String> {
        let entries = self.store.entries();
        let categories = self.store.categories();
        Exporter::new(&self.tz).export(&entries, &categories)
    }

    pub fn export_file_name(&self) -> String {
        export::export_file_name(self.today())
    }

    pub fn reset(&mut self) -> CounterResult<()> {
        self.store.clear_all()?;
        self.undo.cancel();
        self.categories().seed_if_empty()?;
        let today = self.today();
        self.cursor.reset(today);
        debug!("Reset all data");
        Ok(())
    }
}
