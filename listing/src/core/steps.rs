//! Step catalog and the Step Content Selector.
//!
//! Each step owns a fixed subset of fields and renders to exactly one
//! [`Fragment`] variant. [`select_step`] is a total mapping over
//! `[0, STEP_COUNT)`; it only reads the Field Store.

use std::fmt;

use serde::Serialize;

use crate::core::categories::CATEGORIES;
use crate::core::error::WizardError;
use crate::core::fields::{FieldStore, descriptor};
use crate::core::types::{CountrySelection, FieldName, FieldValue, FormatHint};

pub const STEP_COUNT: usize = 6;

/// Ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Category,
    Location,
    Info,
    Images,
    Description,
    Price,
}

impl Step {
    pub const ALL: [Step; STEP_COUNT] = [
        Step::Category,
        Step::Location,
        Step::Info,
        Step::Images,
        Step::Description,
        Step::Price,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Result<Step, WizardError> {
        Step::ALL
            .get(index)
            .copied()
            .ok_or(WizardError::InvalidStepIndex {
                index,
                count: STEP_COUNT,
            })
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(&self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }

    /// Forward navigation from the terminal step submits instead of advancing.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Fields edited on this step.
    pub fn fields(&self) -> &'static [FieldName] {
        match self {
            Self::Category => &[FieldName::Category],
            Self::Location => &[FieldName::Location],
            Self::Info => &[
                FieldName::GuestCount,
                FieldName::RoomCount,
                FieldName::BathroomCount,
            ],
            Self::Images => &[FieldName::ImageSrc],
            Self::Description => &[FieldName::Title, FieldName::Description],
            Self::Price => &[FieldName::Price],
        }
    }

    pub fn heading(&self) -> Heading {
        let (title, subtitle) = match self {
            Self::Category => ("Which of these best describes your place?", "Pick a category"),
            Self::Location => ("Where's your place located?", "Help guests find you"),
            Self::Info => (
                "Share some details about your place",
                "What amenities can guests expect?",
            ),
            Self::Images => (
                "Add a photo of your place",
                "Show guests what your place looks like!",
            ),
            Self::Description => ("Describe your place to guests", "Write a short summary"),
            Self::Price => ("How much do you want to charge?", "Set a price"),
        };
        Heading { title, subtitle }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Location => "Location",
            Self::Info => "Info",
            Self::Images => "Images",
            Self::Description => "Description",
            Self::Price => "Price",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub title: &'static str,
    pub subtitle: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub label: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterControl {
    pub field: FieldName,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputControl {
    pub field: FieldName,
    pub label: &'static str,
    pub value: FieldValue,
    pub required: bool,
    pub format: FormatHint,
    pub error: Option<String>,
    pub disabled: bool,
}

/// View content for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Fragment {
    Category {
        heading: Heading,
        options: Vec<CategoryOption>,
    },
    Location {
        heading: Heading,
        location: Option<CountrySelection>,
        map_center: Option<(f64, f64)>,
    },
    Info {
        heading: Heading,
        counters: Vec<CounterControl>,
    },
    Images {
        heading: Heading,
        image_src: Option<String>,
    },
    Description {
        heading: Heading,
        inputs: Vec<InputControl>,
    },
    Price {
        heading: Heading,
        input: InputControl,
    },
}

impl Fragment {
    pub fn heading(&self) -> &Heading {
        match self {
            Self::Category { heading, .. }
            | Self::Location { heading, .. }
            | Self::Info { heading, .. }
            | Self::Images { heading, .. }
            | Self::Description { heading, .. }
            | Self::Price { heading, .. } => heading,
        }
    }

    /// Mark text inputs read-only while a submission is outstanding.
    pub fn disable_inputs(&mut self) {
        match self {
            Self::Description { inputs, .. } => {
                for input in inputs {
                    input.disabled = true;
                }
            }
            Self::Price { input, .. } => input.disabled = true,
            _ => {}
        }
    }
}

/// Build the fragment for `index` from the current field values.
pub fn select_step(index: usize, fields: &FieldStore) -> Result<Fragment, WizardError> {
    let step = Step::from_index(index)?;
    Ok(render_step(step, fields))
}

/// Build the fragment for a step that is already known to be in range.
pub fn render_step(step: Step, fields: &FieldStore) -> Fragment {
    let heading = step.heading();
    match step {
        Step::Category => {
            let current = fields.text(FieldName::Category);
            let options = CATEGORIES
                .iter()
                .map(|c| CategoryOption {
                    label: c.label,
                    description: c.description,
                    selected: c.label == current,
                })
                .collect();
            Fragment::Category { heading, options }
        }
        Step::Location => {
            let location = fields.location().cloned();
            let map_center = location.as_ref().map(|l| l.latlng);
            Fragment::Location {
                heading,
                location,
                map_center,
            }
        }
        Step::Info => Fragment::Info {
            heading,
            counters: vec![
                counter(
                    fields,
                    FieldName::GuestCount,
                    "Guests",
                    "How many guests can your place accommodate?",
                ),
                counter(
                    fields,
                    FieldName::RoomCount,
                    "Rooms",
                    "How many rooms can guests use?",
                ),
                counter(
                    fields,
                    FieldName::BathroomCount,
                    "Bathrooms",
                    "How many bathrooms can guests use?",
                ),
            ],
        },
        Step::Images => {
            let src = fields.text(FieldName::ImageSrc);
            Fragment::Images {
                heading,
                image_src: (!src.is_empty()).then(|| src.to_string()),
            }
        }
        Step::Description => Fragment::Description {
            heading,
            inputs: vec![
                input(fields, FieldName::Title, "Title"),
                input(fields, FieldName::Description, "Description"),
            ],
        },
        Step::Price => Fragment::Price {
            heading,
            input: input(fields, FieldName::Price, "Price"),
        },
    }
}

fn counter(
    fields: &FieldStore,
    field: FieldName,
    title: &'static str,
    subtitle: &'static str,
) -> CounterControl {
    CounterControl {
        field,
        title,
        subtitle,
        value: fields.number(field),
    }
}

fn input(fields: &FieldStore, field: FieldName, label: &'static str) -> InputControl {
    let desc = descriptor(field);
    InputControl {
        field,
        label,
        value: fields.get(field).clone(),
        required: desc.required,
        format: desc.format_hint,
        error: fields.error(field).map(|e| e.message()),
        disabled: false,
    }
}
