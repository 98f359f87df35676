//! Tutorial progress as seen by the core.
//!
//! The onboarding flow itself lives outside the core. The core only feeds it
//! action events and reads back whether it is running or finished, which
//! drives the `tutorial` action guard and the `tutorial-finished` sync effect.

use crate::action::ActionEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialState {
    active: bool,
    finished: bool,
    observed: Vec<ActionEvent>,
}

impl TutorialState {
    /// A tutorial that is currently running.
    pub fn started() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Events delivered while the tutorial was running, oldest first.
    pub fn observed(&self) -> &[ActionEvent] {
        &self.observed
    }

    /// Delivers one action event. Ignored while inactive.
    pub fn action(&self, event: &ActionEvent) -> Self {
        if !self.active {
            return self.clone();
        }
        let mut next = self.clone();
        next.observed.push(event.clone());
        next
    }

    /// Restarts the tutorial from the beginning.
    pub fn reset(&self) -> Self {
        Self::started()
    }

    /// Ends the tutorial and marks it finished.
    pub fn finish(&self) -> Self {
        Self {
            active: false,
            finished: true,
            observed: self.observed.clone(),
        }
    }
}
