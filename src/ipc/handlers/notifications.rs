use crate::ipc::error::ok;
use crate::ipc::helpers::{get_date_or_today, get_required_i64, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_student_ids(params: &serde_json::Value) -> Result<Vec<i64>, HandlerErr> {
    let Some(raw) = params.get("studentIds").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing studentIds"));
    };
    raw.iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| HandlerErr::bad_params("studentIds must be integers"))
        })
        .collect()
}

/// Flag students absent for the pending late-arrival acknowledgment flow.
/// Purely in-memory; there is no delivery beyond the shared store.
fn notify_absent(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let students = parse_student_ids(params)?;
    state.store.notify_absent(date, &subject, &students);
    Ok(json!({ "notified": students.len() }))
}

fn for_student(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_required_i64(params, "studentId")?;
    let notices: Vec<serde_json::Value> = state
        .store
        .notices_for_student(student)
        .iter()
        .map(|n| json!({ "date": n.date, "subject": n.subject }))
        .collect();
    Ok(json!({ "studentId": student, "notices": notices }))
}

fn clear(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_required_i64(params, "studentId")?;
    let cleared = state.store.clear_notifications(student);
    Ok(json!({ "studentId": student, "cleared": cleared }))
}

fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notifications.notifyAbsent" => Some(respond(req, notify_absent(state, &req.params))),
        "notifications.forStudent" => Some(respond(req, for_student(state, &req.params))),
        "notifications.clear" => Some(respond(req, clear(state, &req.params))),
        _ => None,
    }
}
