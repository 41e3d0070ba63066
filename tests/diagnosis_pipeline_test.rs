//! Integration test: Diagnosis pipeline
//!
//! Drives the full path from CSV catalogs through clue selection, the
//! examination session, the recorded verdict, and treatment scoring.

use clinic::catalog::{parse_clues, parse_needs, DiagnosisMethod, NeedCode};
use clinic::patient::NAME_POOL;
use clinic::{
    select_clues, ClinicSession, DiagnosisSession, Patient, QualityGrade, Remedy, Satisfaction,
    ToxicityStage, VisitState,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const NEEDS_CSV: &str = "\
NeedName,GreetingText
A調和,大夫，近來總覺不適。
B安神,大夫，夜裡難以入眠。
C固本,大夫，身子虛得很。
D清熱,大夫，口乾舌燥。
E養血,大夫，面色總是蒼白。
";

const CLUES_CSV: &str = "\
ClueID,DiagnosisMethod,ClueText,ConfA,ConfB,ConfC,ConfD,ConfE
W01,望,面色萎黃,40,0,10,0,30
W02,望,舌苔厚膩,10,0,40,30,0
W03,望,目光無神,0,30,0,0,40
L01,聞,語聲低微,30,10,30,0,0
L02,聞,呼吸急促,0,0,10,40,10
Q01,問,夜寐不安,10,50,0,0,0
Q02,問,食慾不振,40,0,30,0,0
Q03,問,頭暈目眩,0,20,0,10,40
Q04,問,畏寒肢冷,20,0,40,0,10
P01,切,脈象沉細,30,20,10,20,20
P02,切,脈象浮數,0,10,20,50,0
";

fn load_catalogs() -> (Vec<clinic::NeedDefinition>, Vec<clinic::Clue>) {
    (parse_needs(NEEDS_CSV), parse_clues(CLUES_CSV))
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_csv_catalogs_parse() {
    let (needs, clues) = load_catalogs();

    assert_eq!(needs.len(), 5);
    assert_eq!(needs[0].code, NeedCode('A'));
    assert!(needs[0].greeting_text.contains("不適"));

    assert_eq!(clues.len(), 11);
    let w01 = clues.iter().find(|c| c.id == "W01").unwrap();
    assert_eq!(w01.method, DiagnosisMethod::Observation);
    assert_eq!(w01.weight_for(NeedCode('A')), 40);
    // Zero-weight columns are omitted from the map.
    assert_eq!(w01.weight_for(NeedCode('B')), 0);
}

// =============================================================================
// Selection Property Tests
// =============================================================================

#[test]
fn test_selection_covers_present_needs_or_warns() {
    let (needs, clues) = load_catalogs();

    for seed in 0..25 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut patient = Patient::new();
        patient.assign_identity(&NAME_POOL, &mut rng);
        patient.initialize_needs(&needs, &mut rng).unwrap();

        let result = select_clues(&patient, &clues, &needs, &mut rng);

        for need in patient.needs() {
            let total = result.confidences.get(&need.code).copied().unwrap_or(0);
            if total < 100 {
                // An under-threshold present need must be warned about.
                let code = need.code;
                assert!(
                    result.warnings.iter().any(|w| w.contains(&code.to_string())),
                    "seed {}: need {} at {} with no warning",
                    seed,
                    code,
                    total
                );
            }
        }
    }
}

#[test]
fn test_selection_is_deterministic_for_a_seed() {
    let (needs, clues) = load_catalogs();

    let run = || {
        let mut rng = ChaCha8Rng::seed_from_u64(4242);
        let mut patient = Patient::new();
        patient.assign_identity(&NAME_POOL, &mut rng);
        patient.initialize_needs(&needs, &mut rng).unwrap();
        select_clues(&patient, &clues, &needs, &mut rng)
    };

    assert_eq!(run(), run());
}

// =============================================================================
// End-to-End Pipeline Tests
// =============================================================================

#[test]
fn test_examine_diagnose_and_treat() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (needs, clues) = load_catalogs();
    let mut session = ClinicSession::new();

    let report = session
        .begin_visit(&needs, &clues, &NAME_POOL, &mut rng)
        .unwrap();
    assert!(report.first_visit);
    let constitution = session.assign_constitution(&mut rng).unwrap();

    let selection = session.take_selection().unwrap();
    let mut exam = DiagnosisSession::new(selection, &needs);

    // Collect every scattered clue, then drain the question pool.
    let scattered: Vec<String> = exam.scattered_clues().map(|c| c.id.clone()).collect();
    for id in scattered {
        exam.collect_clue(&id).unwrap();
    }
    while exam.ask_question(&mut rng).is_some() {}

    let stage = exam.take_pulse(session.patient());
    assert_ne!(stage, ToxicityStage::Undetermined);

    let record = exam.finish(session.patient());
    assert_eq!(record.diagnosed.constitution, Some(constitution));
    assert_eq!(record.truth.needs, session.patient().needs().to_vec());

    // Treat the diagnosed needs with a benign remedy.
    let remedy = Remedy {
        addressed_needs: record.diagnosed.needs.iter().map(|n| n.code).collect(),
        toxicity: 1.0,
        affinity: Some(constitution.benefited_by()),
        quality: QualityGrade::S,
    };
    session.record_diagnosis(record).unwrap();
    let outcome = session.treat(&[remedy]).unwrap();
    assert!(!outcome.fatal);
    assert!(outcome.satisfaction.is_some());

    session.end_visit().unwrap();
    assert_eq!(session.state(), VisitState::NoVisit);
}

#[test]
fn test_misdiagnosis_yields_low_satisfaction() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let (needs, clues) = load_catalogs();
    let mut session = ClinicSession::new();

    session
        .begin_visit(&needs, &clues, &NAME_POOL, &mut rng)
        .unwrap();
    session.assign_constitution(&mut rng).unwrap();

    let selection = session.take_selection().unwrap();
    let exam = DiagnosisSession::new(selection, &needs);

    // Deliberately pick a verdict that misses every real need.
    let real: Vec<NeedCode> = session.patient().needs().iter().map(|n| n.code).collect();
    let wrong = ['A', 'B', 'C', 'D', 'E']
        .iter()
        .map(|&c| NeedCode(c))
        .find(|code| !real.contains(code))
        .expect("at most three of five codes are present");

    let record = exam
        .finish_with_selection(session.patient(), wrong, &[])
        .unwrap();
    let remedy = Remedy {
        addressed_needs: record.diagnosed.needs.iter().map(|n| n.code).collect(),
        toxicity: 1.0,
        affinity: None,
        quality: QualityGrade::U,
    };
    session.record_diagnosis(record).unwrap();

    let outcome = session.treat(&[remedy]).unwrap();
    assert_eq!(outcome.satisfaction, Some(Satisfaction::Low));
}

#[test]
fn test_exported_record_is_valid_json() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let (needs, clues) = load_catalogs();
    let mut session = ClinicSession::new();

    session
        .begin_visit(&needs, &clues, &NAME_POOL, &mut rng)
        .unwrap();
    session.assign_constitution(&mut rng).unwrap();
    let selection = session.take_selection().unwrap();
    let mut exam = DiagnosisSession::new(selection, &needs);
    exam.take_pulse(session.patient());
    let record = exam.finish(session.patient());

    let json = record.export_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed["version"].is_string());
    assert!(parsed["diagnosis"]["truth"]["needs"].is_array());
    assert!(parsed["diagnosis"]["diagnosed"]["toxicity"].is_string());
}
