use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_date_or_today, get_required_date, get_required_i64, get_required_str, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use crate::schedule;
use chrono::{Datelike, NaiveDate};
use serde_json::json;
use std::collections::HashMap;

fn parse_marks(params: &serde_json::Value) -> Result<HashMap<i64, AttendanceStatus>, HandlerErr> {
    let Some(marks) = params.get("marks").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("missing marks"));
    };
    let mut out = HashMap::with_capacity(marks.len());
    for (student, status) in marks {
        let student: i64 = student
            .parse()
            .map_err(|_| HandlerErr::bad_params(format!("bad student id: {}", student)))?;
        let status: AttendanceStatus = serde_json::from_value(status.clone()).map_err(|_| {
            HandlerErr::bad_params("status must be present|absent|late|justified|unmarked")
        })?;
        out.insert(student, status);
    }
    Ok(out)
}

fn marks_json(marks: &HashMap<i64, AttendanceStatus>) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (student, status) in marks {
        out.insert(
            student.to_string(),
            serde_json::to_value(status).unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(out)
}

fn reasons_json(reasons: &HashMap<i64, String>) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (student, reason) in reasons {
        out.insert(student.to_string(), json!(reason));
    }
    serde_json::Value::Object(out)
}

fn attendance_set(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let marks = parse_marks(params)?;
    state.store.set_attendance(date, &subject, marks);
    let current = state.store.attendance(date, &subject);
    Ok(json!({
        "date": date,
        "subject": subject,
        "marks": marks_json(&current),
    }))
}

fn attendance_get(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let marks = state.store.attendance(date, &subject);
    Ok(json!({
        "date": date,
        "subject": subject,
        "marks": marks_json(&marks),
    }))
}

/// The attendance period calculator: class occurrences between two dates,
/// minus holidays, institutional suspensions and the winter break. National
/// holidays are read from the cache for every year the range touches.
fn attendance_class_totals(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "subject")?;
    let start: NaiveDate = get_required_date(params, "startDate")?;
    let end: NaiveDate = get_required_date(params, "endDate")?;

    let Some(subject) = state.store.subject(&name).cloned() else {
        return Err(HandlerErr::not_found(format!("unknown subject: {}", name)));
    };

    let excluded = state.store.excluded_dates(start.year()..=end.year());
    let totals = schedule::class_totals(&subject, start, end, &excluded, state.store.school_year());
    let mut result = serde_json::to_value(totals)
        .map_err(|_| HandlerErr::bad_params("unserializable totals"))?;
    result["subject"] = json!(name);
    Ok(result)
}

fn late_reason_set(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let student = get_required_i64(params, "studentId")?;
    let reason = get_required_str(params, "reason")?;
    state.store.set_late_reason(date, &subject, student, reason);
    Ok(json!({ "ok": true }))
}

fn late_reason_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let reasons = state.store.late_reasons(date, &subject);
    Ok(json!({
        "date": date,
        "subject": subject,
        "reasons": reasons_json(&reasons),
    }))
}

fn late_reason_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let student = get_required_i64(params, "studentId")?;
    let removed = state.store.delete_late_reason(date, &subject, student);
    Ok(json!({ "removed": removed }))
}

fn register_close(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    state.store.close_register(date, &subject);
    Ok(json!({ "date": date, "subject": subject, "closed": true }))
}

fn register_status(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_or_today(params)?;
    let subject = get_required_str(params, "subject")?;
    let closed = state.store.is_register_closed(date, &subject);
    Ok(json!({ "date": date, "subject": subject, "closed": closed }))
}

fn respond(
    req: &Request,
    result: Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.set" => Some(respond(req, attendance_set(state, &req.params))),
        "attendance.get" => Some(respond(req, attendance_get(state, &req.params))),
        "attendance.classTotals" => Some(respond(req, attendance_class_totals(state, &req.params))),
        "lateReason.set" => Some(respond(req, late_reason_set(state, &req.params))),
        "lateReason.list" => Some(respond(req, late_reason_list(state, &req.params))),
        "lateReason.delete" => Some(respond(req, late_reason_delete(state, &req.params))),
        "register.close" => Some(respond(req, register_close(state, &req.params))),
        "register.status" => Some(respond(req, register_status(state, &req.params))),
        _ => None,
    }
}
