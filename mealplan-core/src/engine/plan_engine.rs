use rand::Rng;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use crate::autofill::{auto_fill, FilterState};
use crate::catalog::RecipeCatalog;
use crate::clock::Clock;
use crate::filename::{is_plan_filename, next_available, sort_newest_first, today};
use crate::models::{normalize, Day, MealSlot, PlanLayout, PlanRecord, RecipeRecord};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::storage::{BlobKind, BlobStore, StorageError};

use super::debounce::{DebounceTimer, DEFAULT_DEBOUNCE};
use super::error::EngineError;
use super::state::SyncState;

/// Proof that the user agreed to delete a plan file. The engine does not
/// ask; whoever calls [`PlanEngine::delete_plan_file`] must.
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfirmed;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub layout: PlanLayout,
    pub debounce: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            layout: PlanLayout::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// The plan being edited and what is known to be on disk for it.
#[derive(Debug)]
struct ActivePlanState {
    selected: String,
    plan: PlanRecord,
    timer: DebounceTimer,
    persisted: PlanRecord,
}

impl ActivePlanState {
    fn new(selected: String, plan: PlanRecord, delay: Duration) -> Self {
        Self {
            selected,
            persisted: plan.clone(),
            plan,
            timer: DebounceTimer::new(delay),
        }
    }
}

/// Owns the active plan and keeps it in step with its file.
///
/// Edits are written after a quiet period. Moving to another file always
/// writes pending edits to the old file before the new one is read. After
/// every operation exactly one existing plan file is selected.
pub struct PlanEngine<S: BlobStore> {
    store: S,
    clock: Box<dyn Clock>,
    layout: PlanLayout,
    catalog: RecipeCatalog,
    state: SyncState,
    active: ActivePlanState,
    /// Plan filenames, newest first.
    files: Vec<String>,
    /// Other plans opened read-only.
    viewed: BTreeMap<String, PlanRecord>,
}

impl<S: BlobStore> PlanEngine<S> {
    /// Starts a session: selects the newest plan file, creating today's
    /// if there are none.
    pub fn open(
        store: S,
        clock: impl Clock + 'static,
        catalog: RecipeCatalog,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let mut files = sort_newest_first(store.list(BlobKind::Plans)?);

        let selected = match files.first() {
            Some(newest) => newest.clone(),
            None => {
                let name = next_available(&files, &today(&clock));
                let empty = PlanRecord::empty(&options.layout);
                write_plan(&store, &name, &empty)?;
                tracing::info!("No plans found, created {}", name);
                files = sort_newest_first(store.list(BlobKind::Plans)?);
                name
            }
        };

        let plan = read_plan(&store, &selected, &options.layout)?;
        tracing::info!("Opened {}", selected);

        Ok(Self {
            store,
            clock: Box::new(clock),
            layout: options.layout,
            catalog,
            state: SyncState::Idle,
            active: ActivePlanState::new(selected, plan, options.debounce),
            files,
            viewed: BTreeMap::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &PlanLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn get_active_plan(&self) -> &PlanRecord {
        &self.active.plan
    }

    pub fn selected_filename(&self) -> &str {
        &self.active.selected
    }

    /// Plan filenames, newest first, as of the last refresh.
    pub fn list_plan_files(&self) -> &[String] {
        &self.files
    }

    /// True if the active plan differs from its file or a save is scheduled.
    pub fn has_unsaved_changes(&self) -> bool {
        self.active.timer.is_pending() || self.active.plan != self.active.persisted
    }

    pub fn debounce_deadline(&self) -> Option<tokio::time::Instant> {
        self.active.timer.deadline()
    }

    /// Resolves when the pending save is due. See [`DebounceTimer::expired`].
    pub fn debounce_expired(&self) -> impl Future<Output = ()> + Send + 'static {
        self.active.timer.expired()
    }

    fn transition(&mut self, next: SyncState) {
        debug_assert!(
            self.state.can_enter(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Starts (or restarts) the quiet period before the next write.
    fn schedule_save(&mut self) {
        self.transition(SyncState::DirtyDebouncing);
        let deadline = self.active.timer.schedule();
        tracing::debug!("Save of {} scheduled for {:?}", self.active.selected, deadline);
    }

    /// Plans `recipe` into a slot, or clears it with `None`.
    pub fn mutate_slot(
        &mut self,
        day: Day,
        meal: &str,
        recipe: Option<RecipeRecord>,
    ) -> Result<(), EngineError> {
        if !self.state.accepts_edits() {
            return Err(EngineError::Busy("edit the plan"));
        }
        let meal = self
            .layout
            .resolve(meal)
            .ok_or_else(|| EngineError::UnknownMeal(meal.to_string()))?
            .to_string();
        let slot = self
            .active
            .plan
            .slot_mut(day, &meal)
            .ok_or_else(|| EngineError::UnknownMeal(meal.clone()))?;

        let next = MealSlot::from(recipe);
        if *slot == next {
            return Ok(());
        }
        *slot = next;
        self.schedule_save();
        Ok(())
    }

    /// Timer callback: writes the active plan if a save is still scheduled.
    pub fn fire_debounce(&mut self) -> Result<(), EngineError> {
        if self.state != SyncState::DirtyDebouncing {
            return Ok(());
        }
        self.active.timer.cancel();
        self.save_active()?;
        self.refresh_files()?;
        Ok(())
    }

    /// Fires the timer if its deadline has passed.
    pub fn poll_debounce(&mut self) -> Option<Result<(), EngineError>> {
        if self.active.timer.is_due() {
            Some(self.fire_debounce())
        } else {
            None
        }
    }

    /// Sleeps until the pending save is due, then performs it. Returns at
    /// once if nothing is scheduled.
    pub async fn wait_for_debounce(&mut self) -> Result<(), EngineError> {
        if !self.active.timer.is_pending() {
            return Ok(());
        }
        self.debounce_expired().await;
        self.fire_debounce()
    }

    /// Writes the active plan now if it has unsaved changes.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        let dirty = self.has_unsaved_changes();
        self.active.timer.cancel();
        if !dirty {
            return Ok(());
        }
        self.save_active()?;
        self.refresh_files()?;
        Ok(())
    }

    /// Ends the session: cancels the timer and writes pending edits.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.flush()?;
        tracing::debug!("Closed session on {}", self.active.selected);
        Ok(())
    }

    /// Writes the in-memory plan to the selected file.
    ///
    /// On failure the edits stay in memory and the plan stays dirty, so the
    /// next flush or debounce writes them again.
    fn save_active(&mut self) -> Result<(), EngineError> {
        let resume = match self.state {
            SyncState::Switching => SyncState::Switching,
            _ => SyncState::Idle,
        };
        self.transition(SyncState::Saving);

        match write_plan(&self.store, &self.active.selected, &self.active.plan) {
            Ok(()) => {
                self.active.persisted = self.active.plan.clone();
                self.transition(resume);
                tracing::debug!("Saved {}", self.active.selected);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not save {}: {}", self.active.selected, e);
                self.transition(SyncState::Idle);
                Err(e.into())
            }
        }
    }

    fn refresh_files(&mut self) -> Result<(), StorageError> {
        self.files = sort_newest_first(self.store.list(BlobKind::Plans)?);
        Ok(())
    }

    fn ensure_listed(&mut self, filename: &str) -> Result<(), EngineError> {
        if self.files.iter().any(|f| f == filename) {
            return Ok(());
        }
        self.refresh_files()?;
        if self.files.iter().any(|f| f == filename) {
            Ok(())
        } else {
            Err(EngineError::UnknownPlan(filename.to_string()))
        }
    }

    /// Makes `filename` the plan being edited.
    ///
    /// Unsaved edits to the current plan are written before `filename` is
    /// read. If that write fails the switch is abandoned and the current
    /// plan stays selected with its edits intact.
    pub fn select_plan_file(&mut self, filename: &str) -> Result<(), EngineError> {
        if filename == self.active.selected {
            return Ok(());
        }
        if !self.state.accepts_edits() {
            return Err(EngineError::Busy("switch plans"));
        }
        self.ensure_listed(filename)?;

        let dirty = self.has_unsaved_changes();
        self.active.timer.cancel();
        self.transition(SyncState::Switching);

        if dirty {
            self.save_active()?;
        }
        self.load_active(filename)?;
        tracing::info!("Switched to {}", filename);
        Ok(())
    }

    /// Reads `filename` into the active slot. Expects `Switching`; leaves
    /// the engine `Idle` either way.
    fn load_active(&mut self, filename: &str) -> Result<(), EngineError> {
        let plan = match read_plan(&self.store, filename, &self.layout) {
            Ok(plan) => plan,
            Err(e) => {
                self.transition(SyncState::Idle);
                return Err(e.into());
            }
        };
        self.viewed.remove(filename);
        self.active = ActivePlanState::new(filename.to_string(), plan, self.active.timer.delay());
        self.transition(SyncState::Idle);
        Ok(())
    }

    /// Creates an empty plan file for today and selects it.
    pub fn create_new_plan(&mut self) -> Result<String, EngineError> {
        if !self.state.accepts_edits() {
            return Err(EngineError::Busy("create a plan"));
        }
        self.flush()?;
        self.refresh_files()?;

        let name = next_available(&self.files, &today(self.clock.as_ref()));
        write_plan(&self.store, &name, &PlanRecord::empty(&self.layout))?;
        tracing::info!("Created {}", name);

        self.refresh_files()?;
        self.select_plan_file(&name)?;
        Ok(name)
    }

    /// Deletes a plan file.
    ///
    /// Deleting the active plan discards its unsaved edits and selects the
    /// newest remaining file, or a fresh plan for today if none remain.
    /// Deleting another file first writes the active plan's pending edits.
    /// A file that is already gone is reported as
    /// [`StorageError::NotFound`] after the selection has been repaired.
    /// Names that are not plan files are refused with
    /// [`EngineError::UnknownPlan`] and nothing is touched.
    pub fn delete_plan_file(
        &mut self,
        filename: &str,
        _confirmed: DeleteConfirmed,
    ) -> Result<(), EngineError> {
        if !is_plan_filename(filename) {
            return Err(EngineError::UnknownPlan(filename.to_string()));
        }
        if !self.state.accepts_edits() {
            return Err(EngineError::Busy("delete a plan"));
        }
        let deleting_active = filename == self.active.selected;
        if deleting_active {
            if self.active.timer.cancel() {
                self.transition(SyncState::Idle);
            }
        } else {
            self.flush()?;
        }

        let missing = match self.store.delete(filename) {
            Ok(()) => false,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!("{} was already gone", filename);
                true
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Deleted {}", filename);
        self.viewed.remove(filename);
        self.refresh_files()?;

        if deleting_active {
            self.select_after_delete()?;
        }

        if missing {
            return Err(StorageError::NotFound(filename.to_string()).into());
        }
        Ok(())
    }

    fn select_after_delete(&mut self) -> Result<(), EngineError> {
        let next = match self.files.first() {
            Some(newest) => newest.clone(),
            None => {
                let name = next_available(&self.files, &today(self.clock.as_ref()));
                write_plan(&self.store, &name, &PlanRecord::empty(&self.layout))?;
                tracing::info!("Last plan deleted, created {}", name);
                self.refresh_files()?;
                name
            }
        };

        self.transition(SyncState::Switching);
        self.load_active(&next)?;
        tracing::info!("Switched to {}", next);
        Ok(())
    }

    /// Loads another plan for read-only display. The engine keeps it, so
    /// later calls return the held copy and catalog changes refresh it.
    pub fn view_plan_file(&mut self, filename: &str) -> Result<&PlanRecord, EngineError> {
        if filename == self.active.selected {
            return Ok(&self.active.plan);
        }
        if !self.viewed.contains_key(filename) {
            self.ensure_listed(filename)?;
            let plan = read_plan(&self.store, filename, &self.layout)?;
            self.viewed.insert(filename.to_string(), plan);
        }
        Ok(&self.viewed[filename])
    }

    /// Replaces the catalog and refreshes recipe copies in every plan held
    /// in memory. A refreshed active plan is saved like any other edit;
    /// viewed plans are only updated in memory.
    pub fn on_recipes_saved(&mut self, catalog: RecipeCatalog) -> ReconcileReport {
        self.catalog = catalog;

        let report = reconcile(&mut self.active.plan, &self.catalog);
        for (name, plan) in self.viewed.iter_mut() {
            let viewed = reconcile(plan, &self.catalog);
            if viewed.changed() {
                tracing::debug!("Refreshed {} slot(s) in {}", viewed.refreshed, name);
            }
        }

        if report.changed() && self.state.accepts_edits() {
            self.schedule_save();
        }
        report
    }

    /// Writes `catalog` as today's recipe snapshot, then reconciles.
    pub fn save_recipes(
        &mut self,
        catalog: RecipeCatalog,
    ) -> Result<(String, ReconcileReport), EngineError> {
        let name = catalog.save(&self.store, self.clock.today())?;
        let report = self.on_recipes_saved(catalog);
        Ok((name, report))
    }

    /// Auto-fills empty slots of the active plan from the catalog.
    pub fn run_auto_fill(&mut self, filters: &FilterState) -> Vec<(Day, String)> {
        self.run_auto_fill_with(filters, &mut rand::rng())
    }

    pub fn run_auto_fill_with<R: Rng + ?Sized>(
        &mut self,
        filters: &FilterState,
        rng: &mut R,
    ) -> Vec<(Day, String)> {
        if !self.state.accepts_edits() {
            return Vec::new();
        }
        let filled = auto_fill(&mut self.active.plan, &self.catalog, filters, rng);
        if !filled.is_empty() {
            tracing::info!("Auto-filled {} slot(s)", filled.len());
            self.schedule_save();
        }
        filled
    }
}

impl<S: BlobStore> Drop for PlanEngine<S> {
    fn drop(&mut self) {
        if self.has_unsaved_changes() {
            tracing::warn!(
                "Session ended with unsaved changes to {}",
                self.active.selected
            );
        }
    }
}

fn read_plan<S: BlobStore + ?Sized>(
    store: &S,
    filename: &str,
    layout: &PlanLayout,
) -> Result<PlanRecord, StorageError> {
    Ok(normalize(store.read(filename)?.as_ref(), layout))
}

fn write_plan<S: BlobStore + ?Sized>(
    store: &S,
    filename: &str,
    plan: &PlanRecord,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(plan).map_err(|source| StorageError::Serialize {
        name: filename.to_string(),
        source,
    })?;
    store.write(filename, &value)
}
