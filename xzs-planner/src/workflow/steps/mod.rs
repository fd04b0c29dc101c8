//! Step components
//!
//! Every step is rebuilt from the topic and the accumulated [`StepData`]
//! when it becomes current, so returning to a step restores the output it
//! saved earlier. A step hands the session exactly one output through
//! `next()`; `next()` fails with `PlannerError::Validation` while the
//! step's gate is closed.
//!
//! [`StepData`]: crate::workflow::StepData

pub mod confirm;
pub mod cooking;
pub mod draft;
pub mod materials;
pub mod publish;

pub use confirm::ConfirmStep;
pub use cooking::CookingStep;
pub use draft::DraftStep;
pub use materials::MaterialsStep;
pub use publish::PublishStep;
