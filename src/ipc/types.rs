use serde::Deserialize;

use crate::holidays::HolidaySource;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: Store,
    pub holidays: Box<dyn HolidaySource>,
}

impl AppState {
    pub fn new(holidays: Box<dyn HolidaySource>) -> Self {
        Self {
            store: Store::new(),
            holidays,
        }
    }
}
