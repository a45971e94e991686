//! Assembles a draft skeleton from strategy templates.
//!
//! Assembly is order-insensitive: templates are grouped and sorted by their
//! declared sequences, so permuting the input slice never changes the result.

use std::collections::BTreeMap;

use crate::types::{
    DraftState, GeneratedDraft, GeneratedOperation, GeneratedResource, GeneratedStage,
    GenerationMetadata, GenerationParams, OperationTemplate,
};

/// Builds the draft structure from operation templates. Stages are ordered by
/// their declared sequence and renumbered contiguously from 1; operations
/// inside a stage are ordered by their own sequence.
pub fn assemble(
    params: &GenerationParams,
    templates: &[OperationTemplate],
    metadata: GenerationMetadata,
    version: u32,
) -> GeneratedDraft {
    let mut grouped: BTreeMap<(u32, String), Vec<&OperationTemplate>> = BTreeMap::new();
    for template in templates {
        grouped
            .entry((template.stage_sequence, template.stage_name.clone()))
            .or_default()
            .push(template);
    }

    let stages = grouped
        .into_iter()
        .enumerate()
        .map(|(index, ((_, stage_name), mut ops))| {
            ops.sort_by_key(|op| op.sequence);
            GeneratedStage {
                name: stage_name,
                sequence: index as u32 + 1,
                operations: ops.into_iter().map(build_operation).collect(),
            }
        })
        .collect();

    GeneratedDraft {
        season_id: params.season_id.clone(),
        harvest_plan_id: params.harvest_plan_id.clone(),
        tenant_id: params.tenant_id.clone(),
        field_id: params.field_id.clone(),
        crop: params.crop_id.clone(),
        soil_type: params.soil_type.clone(),
        moisture: params.moisture,
        precursor: params.precursor.clone(),
        state: DraftState::GeneratedDraft,
        version,
        metadata,
        stages,
        propagated_constraints: Vec::new(),
    }
}

fn build_operation(template: &OperationTemplate) -> GeneratedOperation {
    GeneratedOperation {
        name: template.name.clone(),
        description: template.description.clone(),
        sequence: template.sequence,
        duration_hours: template.duration_hours,
        required_machinery_type: template.required_machinery_type.clone(),
        resources: template
            .resources
            .iter()
            .map(|resource| GeneratedResource {
                kind: resource.kind.clone(),
                name: resource.name.clone(),
                amount: resource.amount,
                unit: resource.unit.clone(),
                cost_per_unit: resource.cost_per_unit,
            })
            .collect(),
    }
}
