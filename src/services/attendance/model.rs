use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockIn {
    pub at: DateTime<FixedOffset>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Where the uploaded selfie ended up, the upload itself happens elsewhere
    pub selfie_url: Option<String>,
}

pub type ClockOut = ClockIn;

#[derive(Debug, Serialize, Deserialize)]
pub struct RecapOverview {
    pub year: i32,
    pub month: u32,
    pub recaps: Vec<EmployeeRecap>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmployeeRecap {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub summary: RecapSummary,
}
