//! Wizard step machine.
//!
//! `SelectSubject -> SelectItem -> Result`. Advancing is gated on the
//! selection for the current step being present; a rejected transition
//! leaves the step unchanged.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::image::{ImageRef, StoredImage};
use crate::model::{HistoryItem, ItemType, SubjectCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WizardStep {
    #[default]
    SelectSubject,
    SelectItem,
    Result,
}

impl WizardStep {
    /// 1-based position shown in the step indicator.
    pub fn number(self) -> u8 {
        match self {
            Self::SelectSubject => 1,
            Self::SelectItem => 2,
            Self::Result => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("select a subject before continuing")]
    MissingSubject,
    #[error("select an item before continuing")]
    MissingItem,
    #[error("cannot go {direction} from step '{step}'")]
    NoSuchStep {
        step: WizardStep,
        direction: &'static str,
    },
}

/// Current step plus everything the wizard has selected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    step: WizardStep,
    selected_subject: Option<StoredImage>,
    selected_item: Option<StoredImage>,
    selected_item_type: ItemType,
    selected_category: SubjectCategory,
    last_result: Option<ImageRef>,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selected_subject(&self) -> Option<&StoredImage> {
        self.selected_subject.as_ref()
    }

    pub fn selected_item(&self) -> Option<&StoredImage> {
        self.selected_item.as_ref()
    }

    pub fn selected_item_type(&self) -> ItemType {
        self.selected_item_type
    }

    pub fn selected_category(&self) -> SubjectCategory {
        self.selected_category
    }

    pub fn last_result(&self) -> Option<&ImageRef> {
        self.last_result.as_ref()
    }

    pub fn set_subject(&mut self, subject: StoredImage) {
        self.selected_subject = Some(subject);
    }

    pub fn set_item(&mut self, item: StoredImage, item_type: ItemType) {
        self.selected_item = Some(item);
        self.selected_item_type = item_type;
    }

    pub fn clear_subject(&mut self) {
        self.selected_subject = None;
    }

    pub fn clear_item(&mut self) {
        self.selected_item = None;
    }

    pub fn set_category(&mut self, category: SubjectCategory) {
        self.selected_category = category;
    }

    pub fn set_last_result(&mut self, result: ImageRef) {
        self.last_result = Some(result);
    }

    /// Whether `advance` would currently succeed.
    pub fn can_advance(&self) -> bool {
        self.check_advance().is_ok()
    }

    fn check_advance(&self) -> Result<WizardStep, TransitionError> {
        match self.step {
            WizardStep::SelectSubject if self.selected_subject.is_some() => {
                Ok(WizardStep::SelectItem)
            }
            WizardStep::SelectSubject => Err(TransitionError::MissingSubject),
            WizardStep::SelectItem if self.selected_item.is_some() => Ok(WizardStep::Result),
            WizardStep::SelectItem => Err(TransitionError::MissingItem),
            WizardStep::Result => Err(TransitionError::NoSuchStep {
                step: self.step,
                direction: "forward",
            }),
        }
    }

    /// Moves to the next step if its required selection is present.
    pub fn advance(&mut self) -> Result<WizardStep, TransitionError> {
        let next = self.check_advance()?;
        self.step = next;
        Ok(next)
    }

    /// Moves one step back. Leaving the result step drops the shown result.
    pub fn back(&mut self) -> Result<WizardStep, TransitionError> {
        self.step = match self.step {
            WizardStep::SelectSubject => {
                return Err(TransitionError::NoSuchStep {
                    step: self.step,
                    direction: "back",
                });
            }
            WizardStep::SelectItem => WizardStep::SelectSubject,
            WizardStep::Result => {
                self.last_result = None;
                WizardStep::SelectItem
            }
        };
        Ok(self.step)
    }

    /// Returns to the first step, clearing subject, item and result.
    pub fn reset(&mut self) {
        self.step = WizardStep::SelectSubject;
        self.selected_subject = None;
        self.selected_item = None;
        self.last_result = None;
    }

    /// Jumps straight to the result step showing a history record.
    pub fn restore(&mut self, subject: StoredImage, item: StoredImage, record: &HistoryItem) {
        self.selected_subject = Some(subject);
        self.selected_item = Some(item);
        self.selected_item_type = record.item_type;
        self.selected_category = record.category;
        self.last_result = Some(record.result_image.clone());
        self.step = WizardStep::Result;
    }
}
