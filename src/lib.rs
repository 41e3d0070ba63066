//! Clinic - Patient Diagnosis and Treatment Simulation Engine
//!
//! Simulates a traditional clinic: patients arrive with hidden needs and an
//! elemental constitution, the practitioner gathers clues through the four
//! examination methods, and remedies are scored for toxicity and patient
//! satisfaction under the five-element cycles.

pub mod build_info;
pub mod catalog;
pub mod constants;
pub mod diagnosis;
pub mod elements;
pub mod error;
pub mod patient;
pub mod save_manager;
pub mod treatment;
pub mod visit;

pub use catalog::{Clue, DiagnosisMethod, NeedCode, NeedDefinition};
pub use diagnosis::{
    select_clues, select_clues_with_config, ClueSelectionResult, DiagnosisRecord,
    DiagnosisSession, SelectionConfig, ToxicityStage,
};
pub use elements::Element;
pub use error::ClinicError;
pub use patient::{Need, Patient, PatientSnapshot, Satisfaction};
pub use save_manager::SaveManager;
pub use treatment::{collect_complete, QualityGrade, Remedy, RemedyDraft, TreatmentOutcome};
pub use visit::{ClinicSession, VisitReport, VisitState};
