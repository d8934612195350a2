use std::collections::BTreeSet;

use checkpoint_engine::{
    Consequence, ConsequenceKind, Decision, DecisionRecord, DossierAnomaly, EngineConfig,
    IdentityField, MissedInformation, MissedSet, ProtocolStatus, ScanRecord, SubjectCatalog,
    SubjectFacts, SubjectRoster, compute_consequence,
};
use serde_json::Value;

#[test]
fn builtin_roster_is_well_formed() {
    let roster = SubjectRoster::builtin().unwrap();
    assert_eq!(roster.len(), 8);
    let mut anomalies = BTreeSet::new();
    for subject in roster.iter() {
        let facts = SubjectFacts::from_subject(subject)
            .unwrap_or_else(|err| panic!("{} is malformed: {err}", subject.id));
        anomalies.insert(format!("{:?}", facts.anomaly));
        for field in IdentityField::ALL {
            assert!(
                subject.identity.value(field).is_some(),
                "{} lacks {field}",
                subject.id
            );
        }
        assert!(subject.baseline_bpm.is_some(), "{} lacks a baseline", subject.id);
        assert!((40..=200).contains(&subject.baseline()));
        if facts.harmful_if_approved {
            assert_eq!(facts.correct_decision, Decision::Deny, "{}", subject.id);
        }
        if subject.protocol.warrant_check {
            assert!(facts.has_active_warrant, "{}", subject.id);
        }
    }
    for anomaly in [
        DossierAnomaly::None,
        DossierAnomaly::IdentityMismatch,
        DossierAnomaly::HealthIrregularity,
        DossierAnomaly::TransitDiscrepancy,
        DossierAnomaly::ConcealedTestimony,
    ] {
        assert!(anomalies.contains(&format!("{anomaly:?}")), "no {anomaly:?} subject");
    }
    assert_eq!(roster.subject_ids().first(), Some(&"S1-01"));
}

#[test]
fn fully_worked_correct_calls_score_clean() {
    let roster = SubjectRoster::builtin().unwrap();
    let table = EngineConfig::default().penalties;
    let status = ProtocolStatus {
        scan_complete: true,
        credential_viewed: true,
        credential_verification_required: true,
        credential_verified: true,
        database_queried: true,
        warrant_check_required: true,
        warrant_checked: true,
    };
    let scans = ScanRecord {
        identity_scanned: true,
        health_scanned: true,
        interrogated: true,
        equipment_failure: false,
    };
    for subject in roster.iter() {
        let facts = SubjectFacts::from_subject(subject).unwrap();
        let outcome =
            compute_consequence(facts.correct_decision, &status, &scans, &facts, &table);
        assert_eq!(outcome.kind, ConsequenceKind::None, "{}", subject.id);
    }
}

#[test]
fn decision_record_json_shape() {
    let record = DecisionRecord {
        subject_id: "S1-02".to_string(),
        decision: Decision::Approve,
        protocol: ProtocolStatus::default(),
        scans: ScanRecord::default(),
        consequence: Consequence {
            kind: ConsequenceKind::SeriousInfraction,
            missed_information: MissedSet::from_slice(&[MissedInformation::Warrant]),
            credits_penalty: 50,
            infraction_count: 2,
        },
        content_fallback: false,
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["decision"], Value::from("approve"));
    assert_eq!(value["consequence"]["kind"], Value::from("SERIOUS_INFRACTION"));
    assert_eq!(
        value["consequence"]["missed_information"],
        serde_json::json!(["WARRANT"])
    );
    assert_eq!(value["protocol"]["warrant_checked"], Value::Bool(false));
    let restored: DecisionRecord = serde_json::from_value(value).unwrap();
    assert_eq!(restored, record);
}
