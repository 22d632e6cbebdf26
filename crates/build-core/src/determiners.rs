use crate::{
    crds::{Build, Condition},
    models::{BuildPhase, CONDITION_FALSE, CONDITION_TRUE, SUCCEEDED_CONDITION},
};

pub fn find_succeeded_condition(conditions: &[Condition]) -> Option<&Condition> {
    conditions.iter().find(|c| c.r#type == SUCCEEDED_CONDITION)
}

pub fn determine_build_phase(build: Option<&Build>) -> BuildPhase {
    let Some(build) = build else {
        return BuildPhase::Pending;
    };

    let conditions = build
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    match find_succeeded_condition(conditions).map(|c| c.status.as_str()) {
        Some(CONDITION_TRUE) => BuildPhase::Succeeded,
        Some(CONDITION_FALSE) => BuildPhase::Failed,
        _ => BuildPhase::Created,
    }
}
