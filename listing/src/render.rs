//! Plain-text rendering of wizard views for the CLI.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::wizard::WizardView;

const STEP_TEMPLATE: &str = include_str!("templates/step.txt");

/// Template engine wrapper around minijinja.
pub struct FragmentRenderer {
    env: Environment<'static>,
}

impl FragmentRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("step", STEP_TEMPLATE)
            .context("load step template")?;
        Ok(Self { env })
    }

    /// Render the current step of `view`: heading, step controls, action labels.
    pub fn render(&self, view: &WizardView) -> Result<String> {
        let template = self.env.get_template("step")?;
        let rendered = template
            .render(context! {
                view => view,
                fragment => &view.fragment,
            })
            .with_context(|| format!("render step {}", view.step))?;
        Ok(rendered)
    }
}
