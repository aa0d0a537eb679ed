//! Step Navigator: the wizard's linear state machine.
//!
//! States are the six [`Step`]s. `on_next` moves forward by one except on the
//! terminal step, where it reports [`Advance::Submit`] and leaves the step
//! unchanged. `on_back` moves back by one and is a no-op on the first step.

use crate::core::steps::Step;

pub const NEXT_LABEL: &str = "Next";
pub const CREATE_LABEL: &str = "Create";
pub const BACK_LABEL: &str = "Back";

/// Result of a forward navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given step.
    Moved(Step),
    /// Already on the terminal step; the caller must submit instead.
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigator {
    current: Step,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn on_next(&mut self) -> Advance {
        match self.current.next() {
            Some(next) => {
                self.current = next;
                Advance::Moved(next)
            }
            None => Advance::Submit,
        }
    }

    /// Returns false when already on the first step.
    pub fn on_back(&mut self) -> bool {
        match self.current.prev() {
            Some(prev) => {
                self.current = prev;
                true
            }
            None => false,
        }
    }

    /// Label of the single forward control.
    pub fn action_label(&self) -> &'static str {
        if self.current.is_terminal() {
            CREATE_LABEL
        } else {
            NEXT_LABEL
        }
    }

    /// Label of the back control; absent on the first step.
    pub fn secondary_action_label(&self) -> Option<&'static str> {
        self.current.prev().map(|_| BACK_LABEL)
    }

    pub fn reset(&mut self) {
        self.current = Step::default();
    }
}
