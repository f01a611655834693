use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_date, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::SchoolYearConfig;
use serde_json::json;

fn school_year_json(config: &SchoolYearConfig) -> serde_json::Value {
    // serde would do this too, but the wire contract wants explicit nulls
    // for unset fields.
    json!({
        "startDate": config.start_date,
        "endDate": config.end_date,
        "winterBreakStartDate": config.winter_break_start_date,
        "winterBreakEndDate": config.winter_break_end_date,
    })
}

/// Overwrites the whole record; omitted winter fields become null. Ordering
/// of the dates is deliberately not checked.
fn school_year_set(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let config = SchoolYearConfig {
        start_date: get_opt_date(params, "startDate")?,
        end_date: get_opt_date(params, "endDate")?,
        winter_break_start_date: get_opt_date(params, "winterBreakStartDate")?,
        winter_break_end_date: get_opt_date(params, "winterBreakEndDate")?,
    };
    state.store.set_school_year(config);
    Ok(school_year_json(state.store.school_year()))
}

fn handle_school_year_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    match school_year_set(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_school_year_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, school_year_json(state.store.school_year()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schoolYear.set" => Some(handle_school_year_set(state, req)),
        "schoolYear.get" => Some(handle_school_year_get(state, req)),
        _ => None,
    }
}
