//! The deterministic draft generation pipeline.
//!
//! Every run walks the same fixed sequence: validate input, canonicalize the
//! seed-relevant parameters, resolve the seed, freeze the clock, build
//! metadata, assemble the draft, propagate constraints, then recompute the
//! generation hash and compare it to the declared one. A failure at any step
//! aborts the run with no partial draft.

use tracing::{debug, info};

use verdant_deterministic::{
    assert_idempotent, canonicalize, generation_hash, to_canonical_value, DeterministicContext,
    Seed,
};

use crate::constraints;
use crate::error::GenerationError;
use crate::factory;
use crate::types::{
    GeneratedDraft, GenerationMetadata, GenerationParams, OperationTemplate, StrategyConstraint,
};

/// Result of a successful generation: the draft and the canonical payload its
/// hash was computed over. Callers persisting the draft keep both.
#[derive(Clone, Debug)]
pub struct GenerationOutput {
    pub draft: GeneratedDraft,
    pub canonical_payload: String,
}

/// Generates plan drafts deterministically for one model identity.
#[derive(Clone, Debug)]
pub struct DeterministicGenerator {
    model_id: String,
    model_version: String,
}

impl DeterministicGenerator {
    pub fn new(model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
        }
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Runs the full pipeline. Identical `params`, `constraints`, and
    /// `version` with the same model identity always yield a byte-identical
    /// draft; `templates` shape the draft body but never the seed or hash.
    pub fn generate(
        &self,
        params: &GenerationParams,
        templates: &[OperationTemplate],
        constraints: &[StrategyConstraint],
        version: u32,
    ) -> Result<GenerationOutput, GenerationError> {
        validate_input(params)?;

        let canonical_payload = seed_payload(params)?;
        assert_idempotent(&canonical_payload)?;

        let seed = Seed::resolve(&canonical_payload, params.explicit_seed.as_deref())?;
        let ctx = DeterministicContext::for_seed(&seed);
        debug!(seed = %seed, "seed resolved");

        let hash = generation_hash(&canonical_payload, &self.model_version, &seed.to_string());
        let metadata = GenerationMetadata {
            model_id: self.model_id.clone(),
            model_version: self.model_version.clone(),
            generated_at: ctx.now(),
            seed: seed.to_string(),
            hash: hash.clone(),
        };

        let mut draft = factory::assemble(params, templates, metadata, version);
        constraints::propagate(&mut draft, constraints)?;

        let recomputed = generation_hash(
            &canonical_payload,
            &self.model_version,
            &draft.metadata.seed,
        );
        if recomputed != draft.metadata.hash {
            return Err(GenerationError::Integrity {
                declared: draft.metadata.hash,
                recomputed,
            });
        }

        info!(
            strategy_id = %params.strategy_id,
            seed = %draft.metadata.seed,
            hash = %draft.metadata.hash,
            operations = draft.operation_count(),
            "draft generated"
        );
        Ok(GenerationOutput {
            draft,
            canonical_payload,
        })
    }
}

/// Builds the canonical payload the seed and hash are derived from: every
/// generation parameter except the explicit seed itself.
fn seed_payload(params: &GenerationParams) -> Result<String, GenerationError> {
    let mut seed_relevant = params.clone();
    seed_relevant.explicit_seed = None;
    let value = to_canonical_value(&seed_relevant)?;
    Ok(canonicalize(&value)?)
}

fn validate_input(params: &GenerationParams) -> Result<(), GenerationError> {
    let mut problems = Vec::new();
    let required = [
        ("strategy_id", &params.strategy_id),
        ("crop_id", &params.crop_id),
        ("season_id", &params.season_id),
        ("field_id", &params.field_id),
        ("tenant_id", &params.tenant_id),
        ("harvest_plan_id", &params.harvest_plan_id),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            problems.push(format!("{name} must not be blank"));
        }
    }
    if params.strategy_version == 0 {
        problems.push("strategy_version must be positive".to_string());
    }
    if let Some(moisture) = params.moisture {
        if !moisture.is_finite() || !(0.0..=1.0).contains(&moisture) {
            problems.push(format!("moisture {moisture} is outside [0, 1]"));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(GenerationError::InvalidInput { problems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstraintOp, ResourceTemplate};
    use serde_json::json;

    fn params() -> GenerationParams {
        GenerationParams {
            strategy_id: "strat-wheat-winter".into(),
            strategy_version: 3,
            crop_id: "wheat".into(),
            season_id: "season-2025".into(),
            field_id: "field-17".into(),
            tenant_id: "tenant-acme".into(),
            harvest_plan_id: "plan-2025-wheat".into(),
            region_id: Some("north".into()),
            soil_type: Some("loam".into()),
            moisture: Some(0.35),
            precursor: Some("rapeseed".into()),
            explicit_seed: None,
        }
    }

    fn templates() -> Vec<OperationTemplate> {
        vec![
            OperationTemplate {
                name: "plow".into(),
                description: Some("primary tillage".into()),
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
                resources: vec![ResourceTemplate {
                    kind: "seed".into(),
                    name: "winter wheat".into(),
                    amount: 180.0,
                    unit: "kg/ha".into(),
                    cost_per_unit: Some(0.6),
                }],
            },
        ]
    }

    fn generator() -> DeterministicGenerator {
        DeterministicGenerator::new("verdant-deterministic", "v2.1.0")
    }

    #[test]
    fn repeated_generation_is_byte_identical() {
        let gen = generator();
        let reference = gen.generate(&params(), &templates(), &[], 1).unwrap();
        let reference_json = serde_json::to_string(&reference.draft).unwrap();

        for _ in 0..1000 {
            let run = gen.generate(&params(), &templates(), &[], 1).unwrap();
            assert_eq!(run.draft.metadata.hash, reference.draft.metadata.hash);
            assert_eq!(run.canonical_payload, reference.canonical_payload);
            assert_eq!(serde_json::to_string(&run.draft).unwrap(), reference_json);
        }
    }

    #[test]
    fn explicit_seed_is_respected() {
        let gen = generator();
        let mut with_seed = params();
        with_seed.explicit_seed = Some("31337".into());

        let output = gen.generate(&with_seed, &templates(), &[], 1).unwrap();
        assert_eq!(output.draft.metadata.seed, "31337");

        let derived = gen.generate(&params(), &templates(), &[], 1).unwrap();
        assert_ne!(output.draft.metadata.hash, derived.draft.metadata.hash);
    }

    #[test]
    fn explicit_seed_does_not_change_canonical_payload() {
        let gen = generator();
        let mut with_seed = params();
        with_seed.explicit_seed = Some("7".into());

        let a = gen.generate(&params(), &templates(), &[], 1).unwrap();
        let b = gen.generate(&with_seed, &templates(), &[], 1).unwrap();
        assert_eq!(a.canonical_payload, b.canonical_payload);
    }

    #[test]
    fn templates_do_not_affect_seed_or_hash() {
        let gen = generator();
        let with_templates = gen.generate(&params(), &templates(), &[], 1).unwrap();
        let without = gen.generate(&params(), &[], &[], 1).unwrap();
        assert_eq!(
            with_templates.draft.metadata.hash,
            without.draft.metadata.hash
        );
        assert_eq!(
            with_templates.draft.metadata.seed,
            without.draft.metadata.seed
        );
    }

    #[test]
    fn template_permutation_does_not_change_the_draft() {
        let gen = generator();
        let mut reordered = templates();
        reordered.reverse();

        let a = gen.generate(&params(), &templates(), &[], 1).unwrap();
        let b = gen.generate(&params(), &reordered, &[], 1).unwrap();
        assert_eq!(
            serde_json::to_string(&a.draft).unwrap(),
            serde_json::to_string(&b.draft).unwrap()
        );
    }

    #[test]
    fn model_version_changes_the_hash() {
        let a = DeterministicGenerator::new("m", "v1")
            .generate(&params(), &[], &[], 1)
            .unwrap();
        let b = DeterministicGenerator::new("m", "v2")
            .generate(&params(), &[], &[], 1)
            .unwrap();
        assert_ne!(a.draft.metadata.hash, b.draft.metadata.hash);
        assert_eq!(a.draft.metadata.seed, b.draft.metadata.seed);
    }

    #[test]
    fn generated_at_comes_from_the_seed_not_the_clock() {
        let gen = generator();
        let mut with_seed = params();
        with_seed.explicit_seed = Some("60".into());
        let output = gen.generate(&with_seed, &[], &[], 1).unwrap();
        assert_eq!(
            output.draft.metadata.generated_at.to_rfc3339(),
            "2025-01-01T00:01:00+00:00"
        );
    }

    #[test]
    fn invalid_input_collects_every_problem() {
        let gen = generator();
        let mut bad = params();
        bad.strategy_id = "  ".into();
        bad.crop_id = String::new();
        bad.moisture = Some(1.5);

        match gen.generate(&bad, &[], &[], 1).unwrap_err() {
            GenerationError::InvalidInput { problems } => {
                assert_eq!(problems.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_explicit_seed_aborts() {
        let gen = generator();
        let mut bad = params();
        bad.explicit_seed = Some("not-a-seed".into());
        assert!(matches!(
            gen.generate(&bad, &[], &[], 1).unwrap_err(),
            GenerationError::Seed(_)
        ));
    }

    #[test]
    fn constraint_violation_yields_no_draft() {
        let gen = generator();
        let constraints = vec![StrategyConstraint {
            kind: "soil".into(),
            field: "soil_type".into(),
            op: ConstraintOp::Eq,
            value: json!("sand"),
            message: "strategy requires sandy soil".into(),
        }];
        assert!(matches!(
            gen.generate(&params(), &templates(), &constraints, 1)
                .unwrap_err(),
            GenerationError::ConstraintViolations { .. }
        ));
    }
}
