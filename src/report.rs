use std::io::Write;

use chrono::NaiveDateTime;
use maud::{html, Markup};

use crate::api::models::{CourseInfo, RoomVacancy, VacancyResponse, VersionInfo};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::timetable::{self, models::CourseEntry, Container};
use crate::utils;

/// Outcome of a command, shown above what it fetched
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Success(String),
    Failure(String),
    Info(String),
}

impl Status {
    /// How a failed request is reported to the user
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Http(_) => Self::Failure(format!("❌ {}", err.user_message())),
            _ => Self::Failure(format!("❌ 오류: {}", err.user_message())),
        }
    }

    /// Like `from_error`, but a refused request is reported as `refusal`
    pub fn from_refusal(err: &Error, refusal: &str) -> Self {
        match err {
            Error::Api { .. } => Self::Failure(format!("❌ {refusal}")),
            _ => Self::from_error(err),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) | Self::Info(text) => text,
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Self::Success(_) => "result-box success",
            Self::Failure(_) => "result-box error",
            Self::Info(_) => "result-box",
        }
    }

    pub fn to_markup(&self) -> Markup {
        html! {
            div class=(self.class()) {
                @for (i, line) in self.text().lines().enumerate() {
                    @if i > 0 { br; }
                    (line)
                }
            }
        }
    }
}

/// Where the results of a command go: the terminal, or a page exported at the end
pub enum Report<W: Write> {
    Terminal { out: W, cell_length: usize },
    Page(Page),
}

impl<W: Write> Report<W> {
    pub fn status(&mut self, status: &Status) -> Result<()> {
        match self {
            Self::Terminal { out, .. } => writeln!(out, "{}", status.text())?,
            Self::Page(page) => page.section("status").replace(status.to_markup()),
        }

        Ok(())
    }

    /// Weekly calendar of `entries`, in the section `id` of a page
    pub fn calendar(&mut self, id: &str, entries: &[CourseEntry]) -> Result<()> {
        match self {
            Self::Terminal { out, cell_length } => timetable::preview(entries, out, *cell_length),
            Self::Page(page) => timetable::render(entries, page.section(id)),
        }
    }

    pub fn courses(&mut self, courses: &[CourseInfo]) -> Result<()> {
        match self {
            Self::Terminal { out, .. } => {
                let rows: Vec<Vec<String>> = courses.iter().map(course_row).collect();
                utils::write_table(out, &COURSE_HEADERS, &rows)?;
            }
            Self::Page(page) => page.section("courses").replace(courses_table(courses)),
        }

        Ok(())
    }

    pub fn vacancy(&mut self, vacancy: &VacancyResponse) -> Result<()> {
        match self {
            Self::Terminal { out, .. } => {
                let summary = &vacancy.summary;
                writeln!(out, "공실 분석 결과")?;
                writeln!(
                    out,
                    "전체 활용률: {}",
                    utils::percent(summary.overall_utilization_rate)
                )?;
                writeln!(out, "강의실별 활용률")?;
                for (room, rate) in &summary.utilization_rate_by_room {
                    writeln!(out, "  {room}: {}", utils::percent(*rate))?;
                }
                if !vacancy.vacancies.is_empty() {
                    writeln!(out, "공실 시간대")?;
                    for free in &vacancy.vacancies {
                        writeln!(out, "  {} {}: {}", free.room, free.day, free_slots(free))?;
                    }
                }
            }
            Self::Page(page) => page.section("vacancy").replace(vacancy_summary(vacancy)),
        }

        Ok(())
    }

    pub fn versions(&mut self, versions: &[VersionInfo]) -> Result<()> {
        match self {
            Self::Terminal { out, .. } => {
                let rows: Vec<Vec<String>> = versions.iter().map(version_row).collect();
                utils::write_table(out, &VERSION_HEADERS, &rows)?;
            }
            Self::Page(page) => page.section("versions").replace(versions_table(versions)),
        }

        Ok(())
    }
}

const COURSE_HEADERS: [&str; 7] = ["ID", "과목코드", "과목명", "교수", "학과", "학점", "수강인원"];

const VERSION_HEADERS: [&str; 6] = ["ID", "버전", "생성 시간", "과목 수", "활성", "설명"];

fn course_row(course: &CourseInfo) -> Vec<String> {
    vec![
        course.id.to_string(),
        course.course_code.clone(),
        course.course_name.clone(),
        course.instructor.clone(),
        course.department.clone(),
        course.credits.to_string(),
        course.enrollment.to_string(),
    ]
}

fn version_row(version: &VersionInfo) -> Vec<String> {
    vec![
        version.id.to_string(),
        version.version_number.to_string(),
        timestamp(&version.created_at),
        version.course_count.to_string(),
        if version.is_active { "✔" } else { "" }.to_owned(),
        version.description.clone(),
    ]
}

/// ISO timestamp of the service, shortened to the minute
pub fn timestamp(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_or_else(|_| raw.to_owned(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

fn courses_table(courses: &[CourseInfo]) -> Markup {
    html! {
        table.courses {
            thead {
                tr {
                    @for header in COURSE_HEADERS { th { (header) } }
                }
            }
            tbody {
                @for course in courses {
                    tr {
                        @for cell in course_row(course) { td { (cell) } }
                    }
                }
            }
        }
    }
}

/// Free periods of a room on a day, i.e.: `12:00-15:00, 16:00-18:00`
fn free_slots(vacancy: &RoomVacancy) -> String {
    vacancy
        .free_slots
        .iter()
        .map(|slot| format!("{}-{}", slot.start_time, slot.end_time))
        .collect::<Vec<_>>()
        .join(", ")
}

fn vacancy_summary(vacancy: &VacancyResponse) -> Markup {
    let summary = &vacancy.summary;

    html! {
        h3 { "공실 분석 결과" }
        p { strong { "전체 활용률: " (utils::percent(summary.overall_utilization_rate)) } }
        h4 { "강의실별 활용률" }
        ul {
            @for (room, rate) in &summary.utilization_rate_by_room {
                li { (room) ": " (utils::percent(*rate)) }
            }
        }
        @if !vacancy.vacancies.is_empty() {
            h4 { "공실 시간대" }
            ul.free-slots {
                @for free in &vacancy.vacancies {
                    li { (free.room) " " (free.day) ": " (free_slots(free)) }
                }
            }
        }
    }
}

fn versions_table(versions: &[VersionInfo]) -> Markup {
    html! {
        table.versions {
            thead {
                tr {
                    @for header in VERSION_HEADERS { th { (header) } }
                }
            }
            tbody {
                @for version in versions {
                    tr.active[version.is_active] {
                        @for cell in version_row(version) { td { (cell) } }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    fn course(id: u32, name: &str) -> CourseInfo {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "courseCode": format!("CS{id:03}"),
            "courseName": name,
            "instructor": "김교수",
            "department": "컴퓨터공학과",
            "credits": 3,
            "enrollment": 40
        }))
        .unwrap()
    }

    fn vacancy() -> VacancyResponse {
        serde_json::from_value(serde_json::json!({
            "vacancies": [{
                "room": "1215",
                "day": "금",
                "freeSlots": [
                    {"startTime": "09:00", "endTime": "12:00"},
                    {"startTime": "15:00", "endTime": "18:00"}
                ]
            }],
            "summary": {
                "utilizationRateByRoom": {"1216": 0.5, "1215": 0.25},
                "overallUtilizationRate": 0.375
            }
        }))
        .unwrap()
    }

    fn terminal() -> Report<Vec<u8>> {
        Report::Terminal {
            out: Vec::new(),
            cell_length: 12,
        }
    }

    fn printed(report: Report<Vec<u8>>) -> String {
        match report {
            Report::Terminal { out, .. } => String::from_utf8(out).unwrap(),
            Report::Page(_) => unreachable!(),
        }
    }

    fn section(report: &mut Report<Vec<u8>>, id: &str) -> Html {
        match report {
            Report::Page(page) => Html::parse_fragment(page.section(id).content()),
            Report::Terminal { .. } => unreachable!(),
        }
    }

    #[test]
    fn transport_and_api_failures() {
        let api = Error::Api {
            status: 404,
            detail: Some("강의를 찾을 수 없습니다.".to_owned()),
        };
        assert_eq!(
            Status::from_error(&api),
            Status::Failure("❌ 오류: 강의를 찾을 수 없습니다.".to_owned())
        );

        let io = Error::Io(std::io::Error::other("disk full"));
        assert_eq!(Status::from_error(&io).text(), "❌ 오류: disk full");

        let silent = Error::Api {
            status: 500,
            detail: None,
        };
        assert_eq!(Status::from_error(&silent).text(), "❌ 오류: 알 수 없는 오류");
    }

    #[test]
    fn refusals_have_their_own_message() {
        let api = Error::Api {
            status: 500,
            detail: Some("internal".to_owned()),
        };
        assert_eq!(
            Status::from_refusal(&api, "분석 실패"),
            Status::Failure("❌ 분석 실패".to_owned())
        );

        let io = Error::Io(std::io::Error::other("disk full"));
        assert_eq!(Status::from_refusal(&io, "분석 실패").text(), "❌ 오류: disk full");
    }

    #[test]
    fn status_box_keeps_lines() {
        let status = Status::Success("강의 ID 1: ✅\n강의 ID 2: ✅".to_owned());
        let document = Html::parse_fragment(&status.to_markup().into_string());
        let boxed = document
            .select(&Selector::parse("div.result-box.success").unwrap())
            .next()
            .unwrap();

        assert_eq!(boxed.text().collect::<Vec<_>>(), ["강의 ID 1: ✅", "강의 ID 2: ✅"]);
        assert_eq!(boxed.select(&Selector::parse("br").unwrap()).count(), 1);
    }

    #[test]
    fn courses_in_terminal() {
        let mut report = terminal();
        report.courses(&[course(1, "운영체제"), course(2, "DB")]).unwrap();
        let text = printed(report);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("ID 과목코드 과목명"));
        assert!(lines[2].starts_with("1  CS001    운영체제 김교수"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn courses_in_page() {
        let mut report = Report::Page(Page::new("강의 목록"));
        report.courses(&[course(7, "<script>")]).unwrap();
        let document = section(&mut report, "courses");

        let cells: Vec<String> = document
            .select(&Selector::parse("tbody td").unwrap())
            .map(|td| td.text().collect())
            .collect();
        assert_eq!(cells, ["7", "CS007", "<script>", "김교수", "컴퓨터공학과", "3", "40"]);
    }

    #[test]
    fn vacancy_in_terminal() {
        let mut report = terminal();
        report.vacancy(&vacancy()).unwrap();

        assert_eq!(
            printed(report),
            "공실 분석 결과\n전체 활용률: 37.5%\n강의실별 활용률\n  1215: 25.0%\n  1216: 50.0%\n\
             공실 시간대\n  1215 금: 09:00-12:00, 15:00-18:00\n"
        );
    }

    #[test]
    fn vacancy_in_page() {
        let mut report = Report::Page(Page::new("공실 분석"));
        report.vacancy(&vacancy()).unwrap();
        let document = section(&mut report, "vacancy");

        let items: Vec<String> = document
            .select(&Selector::parse("li").unwrap())
            .map(|li| li.text().collect())
            .collect();
        assert_eq!(
            items,
            ["1215: 25.0%", "1216: 50.0%", "1215 금: 09:00-12:00, 15:00-18:00"]
        );
    }

    #[test]
    fn calendar_goes_to_its_section() {
        let mut report = Report::Page(Page::new("시간표"));
        report.calendar("calendar", &[]).unwrap();
        let document = section(&mut report, "calendar");

        let text: String = document.root_element().text().collect();
        assert_eq!(text, timetable::EMPTY_MESSAGE);
    }

    #[test]
    fn versions_rows() {
        let version: VersionInfo = serde_json::from_value(serde_json::json!({
            "id": 3,
            "versionNumber": 2,
            "createdAt": "2024-06-01T14:05:09.123456",
            "description": "강의 추가: 운영체제",
            "isActive": true,
            "courseCount": 12
        }))
        .unwrap();

        assert_eq!(
            version_row(&version),
            ["3", "2", "2024-06-01 14:05", "12", "✔", "강의 추가: 운영체제"]
        );
    }

    #[test]
    fn timestamps_fall_back_to_raw() {
        assert_eq!(timestamp("2024-06-01T14:05:09"), "2024-06-01 14:05");
        assert_eq!(timestamp(""), "");
        assert_eq!(timestamp("yesterday"), "yesterday");
    }
}
