//! Diagnosis phase: visit-start clue selection and the in-visit session.

pub mod selection;
pub mod session;

pub use selection::{select_clues, select_clues_with_config, ClueSelectionResult, SelectionConfig};
pub use session::{
    toxicity_stage, DiagnosedState, DiagnosisRecord, DiagnosisSession, ToxicityStage, TruthState,
};
