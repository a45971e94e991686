//! End-to-end override flow: generate a draft, analyze a human override,
//! record the divergence evidence, and walk the governed transitions.

use std::sync::Arc;

use serde_json::json;

use verdant_counterfactual::{
    build_breakdown, divergence_score, ConflictInput, ConflictVector, CounterfactualEngine,
    CounterfactualInput, DisWeights, ExplainInput, OverrideRiskAnalyzer, RiskInput,
    SimulationMode,
};
use verdant_draft::{
    ActorRole, DeterministicGenerator, DraftState, GenerationParams, IntegrityGate,
    OperationTemplate,
};
use verdant_governance::{
    DivergenceEvidence, DivergenceLedger, DraftStateMachine, GovernanceContext, GovernanceError,
    InMemoryDivergenceStore,
};

fn generation_params() -> GenerationParams {
    GenerationParams {
        strategy_id: "strat-winter-wheat".into(),
        strategy_version: 2,
        crop_id: "wheat".into(),
        season_id: "season-2025".into(),
        field_id: "field-7".into(),
        tenant_id: "tenant-acme".into(),
        harvest_plan_id: "plan-2025".into(),
        region_id: None,
        soil_type: Some("loam".into()),
        moisture: Some(0.4),
        precursor: Some("rapeseed".into()),
        explicit_seed: None,
    }
}

fn templates() -> Vec<OperationTemplate> {
    vec![
        OperationTemplate {
            name: "plow".into(),
            description: None,
            sequence: 1,
            stage_name: "tillage".into(),
            stage_sequence: 1,
            duration_hours: Some(6.0),
            required_machinery_type: Some("tractor".into()),
            resources: vec![],
        },
        OperationTemplate {
            name: "sow".into(),
            description: None,
            sequence: 1,
            stage_name: "sowing".into(),
            stage_sequence: 2,
            duration_hours: Some(4.0),
            required_machinery_type: Some("seeder".into()),
            resources: vec![],
        },
    ]
}

#[test]
fn override_flow_from_generation_to_confirmed_draft() {
    // 1. Generate the draft and prove its integrity.
    let generator = DeterministicGenerator::new("verdant-core", "v2.1.0");
    let output = generator
        .generate(&generation_params(), &templates(), &[], 1)
        .unwrap();
    IntegrityGate::new()
        .validate_generated(&output.draft, &output.canonical_payload)
        .unwrap();
    assert_eq!(output.draft.state, DraftState::GeneratedDraft);

    // 2. Counterfactual simulation of the human override.
    let snapshot = json!({
        "yield_target": 50.0,
        "cost_estimate": 30000.0,
        "operations": [
            { "name": "plow", "efficiency": 1.0 },
            { "name": "sow", "efficiency": 0.98 },
        ],
    });
    let human_action = json!({ "yield_target": 44.0 });
    let weights = DisWeights::default();

    let simulation = CounterfactualEngine::new()
        .run(&CounterfactualInput {
            snapshot: snapshot.clone(),
            human_action: human_action.clone(),
            weights,
            policy_version: "gov-v1".into(),
            mode: SimulationMode::Deterministic,
            sweep_runs: None,
        })
        .unwrap();

    // 3. Risk delta between the two trajectories.
    let assessment = OverrideRiskAnalyzer::new("gov-v1", SimulationMode::Deterministic)
        .analyze(
            &RiskInput {
                expected_yield: 50.0,
                actual_yield: simulation.ai.expected_yield,
                expected_cost: 30000.0,
                actual_cost: simulation.ai.expected_cost,
                compliance_score: 1.0,
            },
            &RiskInput {
                expected_yield: 50.0,
                actual_yield: simulation.human.expected_yield,
                expected_cost: 30000.0,
                actual_cost: simulation.human.expected_cost,
                compliance_score: 0.9,
            },
        )
        .unwrap();
    assert!(!assessment.is_system_fallback);

    // 4. Divergence score and explanation.
    let vector = ConflictVector::build(&ConflictInput {
        ai_yield: simulation.ai.expected_yield,
        human_yield: simulation.human.expected_yield,
        ai_cost: simulation.ai.expected_cost,
        human_cost: simulation.human.expected_cost,
        delta_risk: assessment.delta_risk,
        ai_operation_count: output.draft.operation_count(),
        human_operation_count: output.draft.operation_count(),
    });
    let dis_score = divergence_score(&vector, &weights);
    assert!((0.0..=1.0).contains(&dis_score));

    let breakdown = build_breakdown(&ExplainInput {
        dis_score,
        delta_risk: assessment.delta_risk,
        vector,
        weights,
        regret: simulation.regret,
        mode: SimulationMode::Deterministic,
        is_system_fallback: false,
    });
    assert!(!breakdown.summary.trim().is_empty());

    // 5. The governed transition is denied before any evidence exists.
    let fsm = DraftStateMachine::new();
    fsm.validate(
        DraftState::GeneratedDraft,
        DraftState::Draft,
        ActorRole::Agronomist,
        None,
    )
    .unwrap();
    fsm.validate(
        DraftState::Draft,
        DraftState::OverrideAnalysis,
        ActorRole::Agronomist,
        None,
    )
    .unwrap();
    assert!(matches!(
        fsm.validate(
            DraftState::OverrideAnalysis,
            DraftState::Draft,
            ActorRole::Agronomist,
            None,
        ),
        Err(GovernanceError::DivergenceRecordRequired { .. })
    ));

    // 6. Record the evidence; the receipt unlocks the transition.
    let ledger = DivergenceLedger::new(Arc::new(InMemoryDivergenceStore::new()));
    let receipt = ledger
        .record(DivergenceEvidence {
            tenant_id: generation_params().tenant_id,
            draft_id: "draft-7".into(),
            draft_version: output.draft.version,
            config_version: "dis-v1".into(),
            weights_snapshot: weights,
            dis_score,
            simulation_hash: assessment.simulation_hash.clone(),
            delta_risk: assessment.delta_risk,
            conflict_vector: vector,
            human_action: human_action.clone(),
            explanation: breakdown.summary.clone(),
            simulation_mode: SimulationMode::Deterministic,
            policy_version: Some("gov-v1".into()),
        })
        .unwrap();
    assert!(receipt.created);

    let stored = ledger.find_by_id(receipt.record_id).unwrap().unwrap();
    assert!(ledger.verify(&stored).unwrap());

    let context = GovernanceContext {
        divergence_record_id: Some(receipt.record_id.to_string()),
        dis_score: Some(dis_score),
        justification: None,
    };
    fsm.validate(
        DraftState::OverrideAnalysis,
        DraftState::Draft,
        ActorRole::Agronomist,
        Some(&context),
    )
    .unwrap();

    // 7. Replaying the same evidence never creates a second entry.
    let replay = ledger
        .record(stored.evidence.clone())
        .unwrap();
    assert!(!replay.created);
    assert_eq!(replay.record_id, receipt.record_id);
}

#[test]
fn whole_pipeline_is_reproducible() {
    let generator = DeterministicGenerator::new("verdant-core", "v2.1.0");
    let engine = CounterfactualEngine::new();
    let analyzer = OverrideRiskAnalyzer::new("gov-v1", SimulationMode::MonteCarlo);

    let simulation_input = CounterfactualInput {
        snapshot: json!({ "yield_target": 42.0, "cost_estimate": 25000.0, "operations": [] }),
        human_action: json!({ "cost_estimate": 27000.0 }),
        weights: DisWeights::default(),
        policy_version: "gov-v1".into(),
        mode: SimulationMode::MonteCarlo,
        sweep_runs: Some(50),
    };
    let risk_input = RiskInput {
        expected_yield: 42.0,
        actual_yield: 40.0,
        expected_cost: 25000.0,
        actual_cost: 27000.0,
        compliance_score: 0.95,
    };

    let draft_hash = generator
        .generate(&generation_params(), &templates(), &[], 1)
        .unwrap()
        .draft
        .metadata
        .hash;
    let simulation_hash = engine.run(&simulation_input).unwrap().simulation_hash;
    let risk_hash = analyzer
        .analyze(&risk_input, &risk_input)
        .unwrap()
        .simulation_hash;

    for _ in 0..100 {
        assert_eq!(
            generator
                .generate(&generation_params(), &templates(), &[], 1)
                .unwrap()
                .draft
                .metadata
                .hash,
            draft_hash
        );
        assert_eq!(
            engine.run(&simulation_input).unwrap().simulation_hash,
            simulation_hash
        );
        assert_eq!(
            analyzer.analyze(&risk_input, &risk_input).unwrap().simulation_hash,
            risk_hash
        );
    }
}
