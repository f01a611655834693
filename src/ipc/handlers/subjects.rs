use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Subject;
use serde_json::json;

fn get_u32(params: &serde_json::Value, key: &str) -> Result<u32, HandlerErr> {
    match params.get(key) {
        None => Ok(0),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key))),
    }
}

fn subject_json(subject: &Subject) -> serde_json::Value {
    serde_json::to_value(subject).unwrap_or_else(|_| json!({}))
}

fn subjects_upsert(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let subject = Subject {
        name: get_required_str(params, "name")?,
        schedule: get_required_str(params, "schedule")?,
        total_classes: get_u32(params, "totalClasses")?,
        max_absences: get_u32(params, "maxAbsences")?,
    };
    let result = subject_json(&subject);
    state.store.upsert_subject(subject);
    Ok(result)
}

fn subjects_list(state: &mut AppState) -> serde_json::Value {
    let mut subjects: Vec<&Subject> = state.store.subjects().collect();
    subjects.sort_by(|a, b| a.name.cmp(&b.name));
    json!({ "subjects": subjects.into_iter().map(subject_json).collect::<Vec<_>>() })
}

fn handle_subjects_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    match subjects_upsert(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = subjects_list(state);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.upsert" => Some(handle_subjects_upsert(state, req)),
        "subjects.list" => Some(handle_subjects_list(state, req)),
        _ => None,
    }
}
