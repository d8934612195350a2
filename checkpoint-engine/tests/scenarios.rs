use checkpoint_engine::{
    BaselineBpm, BiometricPolicy, CheckpointEngine, ConsequenceKind, Decision, Encounter,
    EngineConfig, MissedInformation, ProtocolAction, SubjectRoster,
    generate_ambiguous_biometrics, generate_dossier_gaps,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn engine(config: EngineConfig) -> CheckpointEngine<SubjectRoster> {
    CheckpointEngine::new(SubjectRoster::builtin().unwrap(), config).unwrap()
}

fn perform_all(encounter: &mut Encounter, actions: &[ProtocolAction]) {
    for &action in actions {
        encounter.perform(action).unwrap();
    }
}

const BASELINE: [ProtocolAction; 3] = [
    ProtocolAction::CompleteScan,
    ProtocolAction::ViewCredential,
    ProtocolAction::QueryDatabase,
];

#[test]
fn full_reliability_scanner_never_faults() {
    let baseline = BaselineBpm::from(78);
    let mut rng = ChaCha20Rng::seed_from_u64(0xA11CE);
    for _ in 0..2_000 {
        assert!(!generate_ambiguous_biometrics(&baseline, 100, &mut rng).is_error);
    }

    let engine = engine(EngineConfig::default().with_reliability(100));
    for seed in 0..200 {
        let mut encounter = engine.begin_encounter("S1-01", seed).unwrap();
        encounter.perform(ProtocolAction::ScanHealth).unwrap();
        assert!(!encounter.biometrics().unwrap().is_error);
        assert!(!encounter.scan_quality().equipment_failure);
    }
}

#[test]
fn approving_unchecked_warrant_is_serious() {
    let engine = engine(EngineConfig::default());
    let mut encounter = engine.begin_encounter("S1-02", 1).unwrap();
    perform_all(&mut encounter, &BASELINE);
    assert!(encounter.approve_enabled());
    assert!(!encounter.status().warrant_checked);

    let record = encounter.commit(Decision::Approve).unwrap();
    assert_eq!(record.consequence.kind, ConsequenceKind::SeriousInfraction);
    assert!(
        record
            .consequence
            .missed_information
            .contains(&MissedInformation::Warrant)
    );
    assert!(record.consequence.credits_penalty >= 50);
    assert_eq!(record.consequence.infraction_count, 2);
}

#[test]
fn clean_subject_full_protocol_has_no_consequence() {
    let engine = engine(EngineConfig::default());
    let mut encounter = engine.begin_encounter("S1-01", 1).unwrap();
    perform_all(&mut encounter, &ProtocolAction::ALL);
    let record = encounter.commit(Decision::Approve).unwrap();
    assert_eq!(record.consequence.kind, ConsequenceKind::None);
    assert_eq!(record.consequence.credits_penalty, 0);
    assert_eq!(record.consequence.infraction_count, 0);
    assert!(record.consequence.missed_information.is_empty());
}

#[test]
fn dossier_gaps_repeat_for_the_same_subject() {
    let first = generate_dossier_gaps("S1-02");
    let second = generate_dossier_gaps("S1-02");
    assert_eq!(first, second);

    let engine = engine(EngineConfig::default());
    let a = engine.begin_encounter("S1-02", 1).unwrap();
    let b = engine.begin_encounter("S1-02", 2).unwrap();
    assert_eq!(a.dossier_gaps(), &first);
    assert_eq!(b.dossier_gaps(), &first);
}

#[test]
fn warrant_required_blocks_approval_until_checked() {
    let engine = engine(EngineConfig::default());
    let mut encounter = engine.begin_encounter("S1-07", 3).unwrap();
    perform_all(&mut encounter, &BASELINE);
    assert!(encounter.deny_enabled());
    assert!(!encounter.approve_enabled());
    encounter.perform(ProtocolAction::CheckWarrant).unwrap();
    assert!(!encounter.approve_enabled());
    encounter.perform(ProtocolAction::VerifyCredential).unwrap();
    assert!(encounter.approve_enabled());

    let record = encounter.commit(Decision::Approve).unwrap();
    assert_eq!(record.consequence.kind, ConsequenceKind::SeriousInfraction);
    assert!(
        !record
            .consequence
            .missed_information
            .contains(&MissedInformation::Warrant)
    );
}

#[test]
fn wrong_call_with_nothing_missed_is_a_citation() {
    let engine = engine(EngineConfig::default());
    let mut encounter = engine.begin_encounter("S1-01", 4).unwrap();
    perform_all(&mut encounter, &ProtocolAction::ALL);
    let record = encounter.commit(Decision::Deny).unwrap();
    assert_eq!(record.consequence.kind, ConsequenceKind::Citation);
    assert_eq!(record.consequence.credits_penalty, 20);
}

#[test]
fn skipped_interrogation_is_only_a_warning() {
    let engine = engine(EngineConfig::default());
    let mut encounter = engine.begin_encounter("S1-06", 4).unwrap();
    perform_all(&mut encounter, &BASELINE);
    let record = encounter.commit(Decision::Approve).unwrap();
    assert_eq!(record.consequence.kind, ConsequenceKind::Warning);
    assert_eq!(
        record.consequence.missed_information.as_slice(),
        &[MissedInformation::Interrogation]
    );
    assert_eq!(record.consequence.credits_penalty, 5);
}

#[test]
fn seeded_policy_fixes_reading_per_subject() {
    let engine = engine(EngineConfig::default().with_policy(BiometricPolicy::Seeded));
    let readings: Vec<_> = (0..5)
        .map(|seed| {
            let mut encounter = engine.begin_encounter("S1-04", seed).unwrap();
            encounter.perform(ProtocolAction::ScanHealth).unwrap();
            *encounter.biometrics().unwrap()
        })
        .collect();
    assert!(readings.windows(2).all(|pair| pair[0] == pair[1]));
}
