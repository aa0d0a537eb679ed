//! Wizard Controller.
//!
//! Composes the Field Store, Step Navigator, Step Content Selector and
//! Submission Controller. The generic "submit step" signal either advances
//! the navigator or, on the terminal step, starts the single submission.
//!
//! The controller is split into synchronous transitions ([`Wizard::submit_step`],
//! [`Wizard::finish_submission`]) and an async convenience
//! ([`Wizard::on_next`]) that runs both around the persistence call. Servers
//! that share a wizard behind a lock use the synchronous halves so the lock is
//! never held while the request is outstanding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::counter;
use crate::core::error::WizardError;
use crate::core::fields::{FieldChange, FieldStore};
use crate::core::navigator::{Advance, Navigator};
use crate::core::steps::{Fragment, STEP_COUNT, Step, render_step};
use crate::core::types::{FieldKind, FieldName, FieldValue, SubmissionResult};
use crate::io::config::{ListingConfig, MessagesConfig};
use crate::io::notify::{Notifier, RefreshSignal};
use crate::io::store::ListingStore;
use crate::submission::{self, CompletedSubmission, PendingSubmission, SubmitFlag};

pub const WIZARD_TITLE: &str = "Airbnb your home";

/// Behaviour knobs taken from the project config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardSettings {
    pub strict_step_gating: bool,
    pub messages: MessagesConfig,
}

impl From<&ListingConfig> for WizardSettings {
    fn from(config: &ListingConfig) -> Self {
        Self {
            strict_step_gating: config.wizard.strict_step_gating,
            messages: config.messages.clone(),
        }
    }
}

/// Current step, field values and submitting flag.
#[derive(Debug, Default)]
pub struct WizardState {
    navigator: Navigator,
    fields: FieldStore,
    submit_flag: SubmitFlag,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> Step {
        self.navigator.current()
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    pub fn is_submitting(&self) -> bool {
        self.submit_flag.is_set()
    }

    /// Back to defaults. The submitting flag is left to its guard.
    fn reset(&mut self) {
        self.navigator.reset();
        self.fields = FieldStore::new();
    }
}

impl PartialEq for WizardState {
    fn eq(&self, other: &Self) -> bool {
        self.navigator == other.navigator
            && self.fields == other.fields
            && self.is_submitting() == other.is_submitting()
    }
}

/// Direction of a counter control press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterDelta {
    Increment,
    Decrement,
}

/// Synchronous answer to the "submit step" signal.
#[derive(Debug)]
pub enum StepSignal {
    /// Moved forward to the given step.
    Advanced(Step),
    /// Invalid fields on the current step; nothing changed.
    Blocked(Vec<FieldName>),
    /// Terminal step: the flag is claimed and the caller must run the request.
    Submit(PendingSubmission),
    /// A submission is already outstanding; the signal is dropped.
    Busy,
}

/// Result of [`Wizard::on_next`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Advanced(Step),
    Blocked(Vec<FieldName>),
    Busy,
    Submitted(SubmissionResult),
}

/// Persistence and feedback collaborators used by a submission.
pub struct Collaborators<'a, S, N, R> {
    pub store: &'a S,
    pub owner_id: &'a str,
    pub notifier: &'a N,
    pub refresh: &'a R,
}

/// Snapshot of everything a host needs to draw the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub title: &'static str,
    pub open: bool,
    pub step: Step,
    pub step_index: usize,
    pub step_count: usize,
    pub action_label: &'static str,
    pub secondary_action_label: Option<&'static str>,
    pub is_submitting: bool,
    pub revision: u64,
    pub fragment: Fragment,
    pub errors: BTreeMap<FieldName, String>,
}

#[derive(Debug)]
pub struct Wizard {
    state: WizardState,
    open: bool,
    settings: WizardSettings,
}

impl Wizard {
    /// Open a fresh wizard: step 0, every field at its default.
    pub fn open(settings: WizardSettings) -> Self {
        debug!(strict = settings.strict_step_gating, "wizard opened");
        Self {
            state: WizardState::new(),
            open: true,
            settings,
        }
    }

    pub fn close(&mut self) {
        debug!(step = %self.state.current_step(), "wizard closed");
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn get_field(&self, name: FieldName) -> &FieldValue {
        self.state.fields.get(name)
    }

    /// Write a field through the Field Store.
    ///
    /// Returns `Ok(None)` without writing while a submission is outstanding,
    /// so the snapshot being persisted stays the one the user sees.
    pub fn set_field(
        &mut self,
        name: FieldName,
        value: FieldValue,
    ) -> Result<Option<FieldChange>, WizardError> {
        if self.is_submitting() {
            debug!(field = %name, "field write ignored while submitting");
            return Ok(None);
        }
        let change = self.state.fields.set(name, value)?;
        debug!(field = %name, revision = change.revision, "field set");
        Ok(Some(change))
    }

    /// [`set_field`](Self::set_field) with a name taken from a payload key.
    pub fn set_field_by_key(
        &mut self,
        key: &str,
        value: FieldValue,
    ) -> Result<Option<FieldChange>, WizardError> {
        let name: FieldName = key.parse()?;
        self.set_field(name, value)
    }

    /// Press a counter control on a numeric field. Decrementing stops at 1.
    pub fn adjust_counter(
        &mut self,
        name: FieldName,
        delta: CounterDelta,
    ) -> Result<Option<FieldChange>, WizardError> {
        let FieldValue::Number(current) = *self.get_field(name) else {
            return Err(WizardError::ValueKindMismatch {
                field: name.to_string(),
                expected: FieldKind::Number,
            });
        };
        let next = match delta {
            CounterDelta::Increment => counter::increment(current),
            CounterDelta::Decrement => counter::decrement(current),
        };
        self.set_field(name, FieldValue::Number(next))
    }

    /// Move back one step. Disabled on the first step and while submitting.
    pub fn on_back(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        let moved = self.state.navigator.on_back();
        if moved {
            debug!(step = %self.current_step(), "wizard moved back");
        }
        moved
    }

    /// Handle the generic "submit step" signal.
    pub fn submit_step(&mut self) -> StepSignal {
        if self.is_submitting() {
            debug!("submit dropped, submission outstanding");
            return StepSignal::Busy;
        }
        let step = self.current_step();
        if step.is_terminal() || self.settings.strict_step_gating {
            let failed = self.state.fields.validate(step.fields());
            if !failed.is_empty() {
                debug!(step = %step, invalid = failed.len(), "step blocked by validation");
                return StepSignal::Blocked(failed);
            }
        }
        match self.state.navigator.on_next() {
            Advance::Moved(next) => {
                debug!(step = %next, "wizard advanced");
                StepSignal::Advanced(next)
            }
            Advance::Submit => match self.state.submit_flag.try_acquire() {
                Some(guard) => StepSignal::Submit(PendingSubmission::new(
                    self.state.fields.draft(),
                    guard,
                )),
                None => StepSignal::Busy,
            },
        }
    }

    /// Apply a finished submission, then release the submitting flag.
    ///
    /// Success resets the state and closes the wizard; failure keeps fields and
    /// step. A submission claimed by a different wizard instance is only
    /// announced.
    pub fn finish_submission<N: Notifier, R: RefreshSignal>(
        &mut self,
        completed: CompletedSubmission,
        notifier: &N,
        refresh: &R,
    ) -> SubmissionResult {
        submission::announce(
            completed.result(),
            &self.settings.messages,
            notifier,
            refresh,
        );
        if completed.belongs_to(&self.state.submit_flag) && completed.result().is_success() {
            self.state.reset();
            self.open = false;
        }
        completed.release()
    }

    /// Full "submit step" round: advance, or submit and await the outcome.
    pub async fn on_next<S, N, R>(&mut self, with: &Collaborators<'_, S, N, R>) -> StepOutcome
    where
        S: ListingStore,
        N: Notifier,
        R: RefreshSignal,
    {
        match self.submit_step() {
            StepSignal::Advanced(step) => StepOutcome::Advanced(step),
            StepSignal::Blocked(fields) => StepOutcome::Blocked(fields),
            StepSignal::Busy => StepOutcome::Busy,
            StepSignal::Submit(pending) => {
                let completed = submission::perform(with.store, with.owner_id, pending).await;
                StepOutcome::Submitted(self.finish_submission(
                    completed,
                    with.notifier,
                    with.refresh,
                ))
            }
        }
    }

    /// Content for the current step.
    pub fn fragment(&self) -> Fragment {
        let mut fragment = render_step(self.current_step(), &self.state.fields);
        if self.is_submitting() {
            fragment.disable_inputs();
        }
        fragment
    }

    pub fn view(&self) -> WizardView {
        let navigator = &self.state.navigator;
        let submitting = self.is_submitting();
        WizardView {
            title: WIZARD_TITLE,
            open: self.open,
            step: self.current_step(),
            step_index: self.current_step().index(),
            step_count: STEP_COUNT,
            action_label: navigator.action_label(),
            secondary_action_label: navigator.secondary_action_label(),
            is_submitting: submitting,
            revision: self.state.fields.revision(),
            fragment: self.fragment(),
            errors: self
                .state
                .fields
                .errors()
                .iter()
                .map(|(name, err)| (*name, err.message()))
                .collect(),
        }
    }
}
