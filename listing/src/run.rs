//! Scripted wizard run: walk every step with answers from a TOML file.
//!
//! Each step's answers are written through the wizard before its fragment is
//! rendered, then the "submit step" signal is sent. The run ends when the
//! wizard submits at the terminal step or a step is blocked by validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::categories;
use crate::core::types::{FieldName, FieldValue, SubmissionResult};
use crate::io::notify::{Notifier, RefreshSignal};
use crate::io::store::ListingStore;
use crate::render::FragmentRenderer;
use crate::wizard::{Collaborators, StepOutcome, Wizard, WizardSettings};

/// Field answers keyed by payload name (`guestCount`, `imageSrc`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Answers {
    pub fields: BTreeMap<String, FieldValue>,
}

impl Answers {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("parse answers toml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("load answers {}", path.display()))
    }

    /// Resolve keys to field names. Unknown keys and unknown categories fail.
    fn resolve(&self) -> Result<BTreeMap<FieldName, FieldValue>> {
        let mut resolved = BTreeMap::new();
        for (key, value) in &self.fields {
            let name: FieldName = key.parse()?;
            if name == FieldName::Category {
                if let FieldValue::Text(label) = value {
                    if categories::find(label).is_none() {
                        bail!("unknown category '{}'", label);
                    }
                }
            }
            resolved.insert(name, value.clone());
        }
        Ok(resolved)
    }
}

/// How a scripted run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Submitted(SubmissionResult),
    Blocked(Vec<FieldName>),
}

/// Drive a fresh wizard through every step, emitting each rendered step.
#[instrument(skip_all, fields(owner_id = %with.owner_id))]
pub async fn run_wizard<S, N, R>(
    answers: &Answers,
    settings: WizardSettings,
    with: &Collaborators<'_, S, N, R>,
    mut emit: impl FnMut(String),
) -> Result<RunOutcome>
where
    S: ListingStore,
    N: Notifier,
    R: RefreshSignal,
{
    let mut pending = answers.resolve()?;
    let renderer = FragmentRenderer::new()?;
    let mut wizard = Wizard::open(settings);

    loop {
        let step = wizard.current_step();
        for name in step.fields() {
            if let Some(value) = pending.remove(name) {
                wizard.set_field(*name, value)?;
            }
        }
        emit(renderer.render(&wizard.view())?);

        match wizard.on_next(with).await {
            StepOutcome::Advanced(next) => debug!(step = %next, "scripted run advanced"),
            StepOutcome::Blocked(fields) => return Ok(RunOutcome::Blocked(fields)),
            StepOutcome::Submitted(result) => return Ok(RunOutcome::Submitted(result)),
            StepOutcome::Busy => bail!("wizard reported an outstanding submission"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::WizardError;
    use crate::test_support::{RecordingNotifier, RecordingRefresh, ScriptedStore};

    const ANSWERS: &str = r#"
[fields]
category = "Beach"
guestCount = 4
imageSrc = "https://images.example/cabin.png"
title = "Cabin"
description = "Quiet cabin by the dunes"
price = 100

[fields.location]
value = "NL"
label = "Netherlands"
flag = "NL"
latlng = [52.5, 5.75]
region = "Europe"
"#;

    #[tokio::test]
    async fn full_answers_submit_once() {
        let store = ScriptedStore::succeeding();
        let notifier = RecordingNotifier::default();
        let refresh = RecordingRefresh::default();
        let with = Collaborators {
            store: &store,
            owner_id: "u1",
            notifier: &notifier,
            refresh: &refresh,
        };
        let mut rendered = Vec::new();

        let outcome = run_wizard(
            &Answers::parse(ANSWERS).expect("answers"),
            WizardSettings::default(),
            &with,
            |text| rendered.push(text),
        )
        .await
        .expect("run");

        let RunOutcome::Submitted(SubmissionResult::Success(listing)) = outcome else {
            panic!("expected successful submission");
        };
        assert_eq!(listing.draft.title, "Cabin");
        assert_eq!(listing.draft.guest_count, 4);
        assert_eq!(listing.draft.room_count, 1);
        assert_eq!(
            listing.draft.location.as_ref().map(|l| l.value.as_str()),
            Some("NL")
        );
        assert_eq!(rendered.len(), 6);
        assert_eq!(store.calls(), 1);
        assert_eq!(refresh.count(), 1);
    }

    #[tokio::test]
    async fn strict_gating_stops_at_first_invalid_step() {
        let store = ScriptedStore::succeeding();
        let notifier = RecordingNotifier::default();
        let refresh = RecordingRefresh::default();
        let with = Collaborators {
            store: &store,
            owner_id: "u1",
            notifier: &notifier,
            refresh: &refresh,
        };
        let settings = WizardSettings {
            strict_step_gating: true,
            ..WizardSettings::default()
        };

        let outcome = run_wizard(
            &Answers::parse("[fields]\ntitle = \"Cabin\"\n").expect("answers"),
            settings,
            &with,
            |_| {},
        )
        .await
        .expect("run");

        assert_eq!(outcome, RunOutcome::Blocked(vec![FieldName::Description]));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn unknown_keys_and_categories_fail_fast() {
        let err = Answers::parse("[fields]\nbedrooms = 3\n")
            .expect("answers")
            .resolve()
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<WizardError>(),
            Some(&WizardError::UnknownField("bedrooms".to_string()))
        );

        let err = Answers::parse("[fields]\ncategory = \"Volcano\"\n")
            .expect("answers")
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }
}
