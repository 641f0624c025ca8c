use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timetable::models::{ClockTime, CourseEntry, Day};

/// Answer of every endpoint that (re)builds or reads a timetable
#[derive(Debug, Deserialize)]
pub struct TimetableResponse {
    pub timetable: Vec<CourseEntry>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Version created by the request, if any
    pub version: Option<u32>,
    /// Version a restore started from
    pub restored_from: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomVacancy {
    pub room: String,
    pub day: Day,
    pub free_slots: Vec<FreeSlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancySummary {
    /// Used time over available time, per room
    #[serde(default)]
    pub utilization_rate_by_room: BTreeMap<String, f64>,
    #[serde(default)]
    pub overall_utilization_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct VacancyResponse {
    #[serde(default)]
    pub vacancies: Vec<RoomVacancy>,
    #[serde(default)]
    pub summary: VacancySummary,
}

/// A course known by the service, scheduled or not
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub id: u32,
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub credits: u32,
    /// Number of enrolled students
    #[serde(default)]
    pub enrollment: u32,
}

impl CourseInfo {
    /// How the course is named in selections, i.e.: `CS101 - 운영체제 (김교수)`
    pub fn selection(&self) -> String {
        format!("{} - {} ({})", self.course_code, self.course_name, self.instructor)
    }
}

#[derive(Debug, Deserialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseInfo>,
}

/// Body of a course addition, field names are the ones the service expects
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CourseAddRequest {
    pub process: String,
    pub department: String,
    pub course_code: String,
    pub course_name: String,
    /// Always 0, the service doesn't use it
    pub grade: u32,
    pub area: String,
    pub enrollment: u32,
    pub main_instructor: String,
    pub instructor: String,
    pub weeks: u32,
    pub credits: u32,
    pub is_lab: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: u32,
    pub version_number: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub course_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub versions: Vec<VersionInfo>,
}

/// Body of an error response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}
