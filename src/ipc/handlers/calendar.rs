use crate::holidays;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_date, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{CalendarEvent, EventKind};
use serde_json::json;

fn parse_kind(raw: &str) -> Result<EventKind, HandlerErr> {
    serde_json::from_value(json!(raw))
        .map_err(|_| HandlerErr::bad_params("kind must be class|holiday|institutional|exam"))
}

fn event_json(event: &CalendarEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or_else(|_| json!({}))
}

fn calendar_add_event(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(&get_required_str(params, "kind")?)?;
    let date = get_required_date(params, "date")?;
    let title = get_required_str(params, "title")?;
    let event = CalendarEvent { kind, date, title };
    state.store.add_event(event.clone());
    Ok(event_json(&event))
}

fn calendar_list(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = match params.get("kind").and_then(|v| v.as_str()) {
        Some(raw) => Some(parse_kind(raw)?),
        None => None,
    };
    let events: Vec<serde_json::Value> = state
        .store
        .events()
        .iter()
        .filter(|e| kind.map(|k| e.kind == k).unwrap_or(true))
        .map(event_json)
        .collect();
    Ok(json!({ "events": events }))
}

/// Cache-through lookup of the national holidays for one year. A failed
/// upstream fetch is not an error response: the result degrades to an empty
/// list tagged `unavailable`.
fn holidays_fetch(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let year = params
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params("missing year"))?;
    let year = i32::try_from(year).map_err(|_| HandlerErr::bad_params("year out of range"))?;

    let (events, source) =
        holidays::fetch_national_holidays(&mut state.store, state.holidays.as_ref(), year);
    let holidays: Vec<serde_json::Value> = events.iter().map(event_json).collect();
    Ok(json!({
        "year": year,
        "holidays": holidays,
        "source": source,
    }))
}

fn handle_calendar_add_event(state: &mut AppState, req: &Request) -> serde_json::Value {
    match calendar_add_event(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_calendar_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match calendar_list(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_holidays_fetch(state: &mut AppState, req: &Request) -> serde_json::Value {
    match holidays_fetch(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.addEvent" => Some(handle_calendar_add_event(state, req)),
        "calendar.list" => Some(handle_calendar_list(state, req)),
        "holidays.fetch" => Some(handle_holidays_fetch(state, req)),
        _ => None,
    }
}
