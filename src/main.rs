use std::{
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod filter;
mod page;
mod report;
mod timetable;
mod utils;

use api::models::CourseAddRequest;
use page::Page;
use report::{Report, Status};

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Config file, default to <config dir>/roomcal/config.toml
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address of the scheduling service, i.e.: http://127.0.0.1:8000
    #[clap(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Export to an HTML page instead of printing
    #[clap(short, long, global = true, value_name = "FILE NAME")]
    export: Option<String>,

    /// Width of a day in the terminal calendar
    #[clap(long, global = true, default_value_t = 20, value_name = "COLUMNS")]
    cell_length: usize,

    /// More logs, repeat for even more
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less logs
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a CSV of courses and build a new timetable
    Build {
        /// CSV file of the courses
        #[clap(value_parser)]
        csv: Option<PathBuf>,
    },

    /// Show the current timetable
    View {
        /// Only show one room
        #[clap(short, long, default_value = filter::ALL_ROOMS)]
        room: String,
    },

    /// Analyse the rooms usage
    Vacancy,

    /// Add a course, the timetable is built again
    Add(AddArgs),

    /// List the courses
    List,

    /// Delete courses, the timetable is built again
    Delete {
        /// Ids of the courses, asked interactively if none
        ids: Vec<u32>,
    },

    /// List the saved versions of the timetable
    Versions {
        /// Show the timetable of a version
        #[clap(long, value_name = "ID", conflicts_with = "restore")]
        show: Option<u32>,

        /// Make a version the current timetable
        #[clap(long, value_name = "ID")]
        restore: Option<u32>,
    },
}

#[derive(clap::Args)]
struct AddArgs {
    /// i.e.: 학부
    #[clap(long)]
    process: String,
    #[clap(long)]
    department: String,
    #[clap(long)]
    course_code: String,
    #[clap(long)]
    course_name: String,
    /// i.e.: 전공
    #[clap(long)]
    area: String,
    #[clap(long)]
    enrollment: u32,
    #[clap(long)]
    main_instructor: String,
    #[clap(long)]
    instructor: String,
    #[clap(long, default_value_t = 15)]
    weeks: u32,
    #[clap(long)]
    credits: u32,
    /// Lab session
    #[clap(long)]
    is_lab: bool,
}

impl From<AddArgs> for CourseAddRequest {
    fn from(args: AddArgs) -> Self {
        Self {
            process: args.process,
            department: args.department,
            course_code: args.course_code,
            course_name: args.course_name,
            grade: 0,
            area: args.area,
            enrollment: args.enrollment,
            main_instructor: args.main_instructor,
            instructor: args.instructor,
            weeks: args.weeks,
            credits: args.credits,
            is_lab: args.is_lab,
        }
    }
}

fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) | (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        (0, _) => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the command, `false` if the service refused it
async fn run(args: Args) -> anyhow::Result<bool> {
    init_tracing(args.verbose, args.quiet)?;

    let config = config::Config::load(args.config.as_deref(), args.api_url.as_deref())
        .context("loading configuration")?;
    info!(api = %config.api_url, "using scheduling service");
    let client = api::Client::new(&config).context("creating HTTP client")?;

    let mut report = match &args.export {
        Some(_) => Report::Page(Page::new(title(&args.command))),
        None => Report::Terminal {
            out: io::stdout().lock(),
            cell_length: args.cell_length,
        },
    };

    let succeeded = match args.command {
        Command::Build { csv } => build(&client, csv.as_deref(), &mut report).await?,
        Command::View { room } => view(&client, &room, &mut report).await?,
        Command::Vacancy => vacancy(&client, &mut report).await?,
        Command::Add(course) => add(&client, &course.into(), &mut report).await?,
        Command::List => list(&client, &mut report).await?,
        Command::Delete { ids } => delete(&client, ids, &mut report).await?,
        Command::Versions { show, restore } => {
            versions(&client, show, restore, &mut report).await?
        }
    };

    match (report, args.export) {
        (Report::Page(page), Some(mut filename)) => {
            page.export(&mut filename)
                .with_context(|| format!("writing {filename}"))?;
            println!("HTML 파일 생성 완료 => {filename}");
        }
        (Report::Terminal { mut out, .. }, _) => out.flush()?,
        _ => (),
    }

    Ok(succeeded)
}

fn title(command: &Command) -> &'static str {
    match command {
        Command::Build { .. } => "시간표 배정",
        Command::View { .. } => "시간표 조회",
        Command::Vacancy => "공실 분석",
        Command::Add(_) => "강의 추가",
        Command::List => "강의 목록",
        Command::Delete { .. } => "강의 삭제",
        Command::Versions { .. } => "시간표 버전",
    }
}

/// Show a failed request, keep going with `false`
fn failed<W: Write>(report: &mut Report<W>, err: &error::Error) -> anyhow::Result<bool> {
    warn!(error = %err, "request failed");
    report.status(&Status::from_error(err))?;

    Ok(false)
}

/// Same as `failed`, with the command's own message when the service refused
fn refused<W: Write>(
    report: &mut Report<W>,
    err: &error::Error,
    refusal: &str,
) -> anyhow::Result<bool> {
    warn!(error = %err, "request failed");
    report.status(&Status::from_refusal(err, refusal))?;

    Ok(false)
}

async fn build<W: Write>(
    client: &api::Client,
    csv: Option<&Path>,
    report: &mut Report<W>,
) -> anyhow::Result<bool> {
    let Some(csv) = csv.filter(|path| path.is_file()) else {
        report.status(&Status::Failure("❌ CSV 파일을 선택해주세요.".to_owned()))?;
        return Ok(false);
    };

    match client.build_schedule(csv).await {
        Ok(response) => {
            let count = response.timetable.len();
            report.status(&Status::Success(format!("✅ {count}개 과목 배정 완료!")))?;
            report.calendar("calendar", &response.timetable)?;
            Ok(true)
        }
        Err(err) => failed(report, &err),
    }
}

async fn view<W: Write>(
    client: &api::Client,
    room: &str,
    report: &mut Report<W>,
) -> anyhow::Result<bool> {
    match client.schedule().await {
        Ok(response) => {
            let timetable = filter::by_room(response.timetable, room);
            report.status(&Status::Info(filter::summary(room, timetable.len())))?;
            report.calendar("calendar", &timetable)?;
            Ok(true)
        }
        Err(err) => refused(report, &err, "시간표를 불러올 수 없습니다."),
    }
}

async fn vacancy<W: Write>(client: &api::Client, report: &mut Report<W>) -> anyhow::Result<bool> {
    match client.vacancy().await {
        Ok(response) => {
            report.vacancy(&response)?;
            Ok(true)
        }
        Err(err) => refused(report, &err, "분석 실패"),
    }
}

async fn add<W: Write>(
    client: &api::Client,
    course: &CourseAddRequest,
    report: &mut Report<W>,
) -> anyhow::Result<bool> {
    match client.add_course(course).await {
        Ok(response) => {
            let count = response.timetable.len();
            report.status(&Status::Success(format!(
                "✅ 강의 추가 완료! 총 {count}개 과목 배정됨"
            )))?;
            list(client, report).await
        }
        Err(err) => failed(report, &err),
    }
}

async fn list<W: Write>(client: &api::Client, report: &mut Report<W>) -> anyhow::Result<bool> {
    match client.courses().await {
        Ok(response) => {
            report.courses(&response.courses)?;
            Ok(true)
        }
        Err(err) => refused(report, &err, "목록을 불러올 수 없습니다."),
    }
}

async fn delete<W: Write>(
    client: &api::Client,
    ids: Vec<u32>,
    report: &mut Report<W>,
) -> anyhow::Result<bool> {
    let ids = if ids.is_empty() {
        let courses = match client.courses().await {
            Ok(response) => response.courses,
            Err(err) => return failed(report, &err),
        };
        filter::courses_to_delete(&courses).context("selecting courses")?
    } else {
        ids
    };

    if ids.is_empty() {
        report.status(&Status::Failure("❌ 삭제할 강의를 선택해주세요.".to_owned()))?;
        return Ok(false);
    }

    // One at a time, a failure doesn't stop the others
    let mut results = Vec::with_capacity(ids.len());
    let mut all_deleted = true;
    for id in ids {
        match client.delete_course(id).await {
            Ok(response) => results.push(format!(
                "강의 ID {id}: ✅ 삭제 완료 (총 {}개 과목 배정됨)",
                response.timetable.len()
            )),
            Err(err) => {
                warn!(id, error = %err, "deletion failed");
                all_deleted = false;
                let reason = match err {
                    error::Error::Http(_) => "서버 연결 실패".to_owned(),
                    error::Error::Api { detail, .. } => {
                        detail.unwrap_or_else(|| "삭제 실패".to_owned())
                    }
                    other => other.user_message(),
                };
                results.push(format!("강의 ID {id}: ❌ {reason}"));
            }
        }
    }

    let text = results.join("\n");
    report.status(&if all_deleted {
        Status::Success(text)
    } else {
        Status::Info(text)
    })?;

    list(client, report).await.map(|listed| listed && all_deleted)
}

async fn versions<W: Write>(
    client: &api::Client,
    show: Option<u32>,
    restore: Option<u32>,
    report: &mut Report<W>,
) -> anyhow::Result<bool> {
    if let Some(id) = restore {
        return match client.restore_version(id).await {
            Ok(response) => {
                let from = response.metadata.restored_from.unwrap_or(id);
                let message = match response.metadata.version {
                    Some(version) => format!("✅ {from}번 버전 복원 완료! (새 버전 {version})"),
                    None => format!("✅ {from}번 버전 복원 완료!"),
                };
                report.status(&Status::Success(message))?;
                report.calendar("calendar", &response.timetable)?;
                Ok(true)
            }
            Err(err) => failed(report, &err),
        };
    }

    if let Some(id) = show {
        return match client.version_schedule(id).await {
            Ok(response) => {
                let count = response.timetable.len();
                report.status(&Status::Info(format!("버전 ID {id}: {count}개 과목")))?;
                report.calendar("calendar", &response.timetable)?;
                Ok(true)
            }
            Err(err) => failed(report, &err),
        };
    }

    match client.versions().await {
        Ok(response) => {
            report.versions(&response.versions)?;
            Ok(true)
        }
        Err(err) => failed(report, &err),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::api::stub;

    fn terminal() -> Report<Vec<u8>> {
        Report::Terminal {
            out: Vec::new(),
            cell_length: 10,
        }
    }

    fn printed(report: Report<Vec<u8>>) -> String {
        let Report::Terminal { out, .. } = report else {
            unreachable!()
        };
        String::from_utf8(out).unwrap()
    }

    const COURSES: stub::Route = (
        "GET /api/courses ",
        200,
        r#"{"courses": [{"id": 3, "courseCode": "CS103", "courseName": "알고리즘", "instructor": "박교수"}]}"#,
    );

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn view_defaults_to_every_room() {
        let args = Args::parse_from(["roomcal", "view"]);

        assert!(matches!(args.command, Command::View { room } if room == filter::ALL_ROOMS));
        assert_eq!(args.cell_length, 20);
    }

    #[test]
    fn global_flags_after_the_command() {
        let args = Args::parse_from(["roomcal", "list", "--export", "courses", "-vv"]);

        assert_eq!(args.export.as_deref(), Some("courses"));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn add_arguments_become_a_request() {
        let args = Args::parse_from([
            "roomcal",
            "add",
            "--process",
            "학부",
            "--department",
            "컴퓨터공학과",
            "--course-code",
            "CS999",
            "--course-name",
            "캡스톤디자인",
            "--area",
            "전공",
            "--enrollment",
            "25",
            "--main-instructor",
            "이교수",
            "--instructor",
            "이교수",
            "--credits",
            "3",
            "--is-lab",
        ]);
        let Command::Add(course) = args.command else {
            panic!("expected the add command");
        };
        let request = CourseAddRequest::from(course);

        assert_eq!(request.course_code, "CS999");
        assert_eq!(request.weeks, 15);
        assert_eq!(request.grade, 0);
        assert!(request.is_lab);
    }

    #[test]
    fn show_and_restore_conflict() {
        let parsed = Args::try_parse_from(["roomcal", "versions", "--show", "1", "--restore", "2"]);

        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn build_without_file_is_refused() {
        let client = api::Client::new(&config::Config::default()).unwrap();
        let mut report = terminal();

        let ok = build(&client, Some(Path::new("/nonexistent.csv")), &mut report)
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(printed(report), "❌ CSV 파일을 선택해주세요.\n");
    }

    #[tokio::test]
    async fn view_reports_a_malformed_schedule() {
        let client = stub::service(&[(
            "GET /api/schedule ",
            200,
            r#"{"timetable": [{"day": "월", "startTime": "9h", "endTime": "10:00",
                "room": "1215", "courseName": "DB", "instructor": "P"}]}"#,
        )])
        .await;
        let mut report = terminal();

        let ok = view(&client, filter::ALL_ROOMS, &mut report).await.unwrap();

        assert!(!ok);
        let output = printed(report);
        assert!(output.starts_with("❌ 오류: "));
        assert!(output.contains("9h"));
        assert!(!output.contains("서버에 연결할 수 없습니다."));
    }

    #[tokio::test]
    async fn refused_commands_use_their_message() {
        let client = stub::service(&[
            ("GET /api/schedule ", 500, r#"{"detail": "db down"}"#),
            ("GET /api/vacancy ", 500, "{}"),
            ("GET /api/courses ", 500, "{}"),
        ])
        .await;

        let mut report = terminal();
        assert!(!view(&client, "1215", &mut report).await.unwrap());
        assert!(!vacancy(&client, &mut report).await.unwrap());
        assert!(!list(&client, &mut report).await.unwrap());

        assert_eq!(
            printed(report),
            "❌ 시간표를 불러올 수 없습니다.\n❌ 분석 실패\n❌ 목록을 불러올 수 없습니다.\n"
        );
    }

    #[tokio::test]
    async fn deletion_goes_on_after_a_failure() {
        let client = stub::service(&[
            ("DELETE /api/courses/1 ", 404, r#"{"detail": "강의를 찾을 수 없습니다."}"#),
            ("DELETE /api/courses/2 ", 200, r#"{"timetable": []}"#),
            ("DELETE /api/courses/4 ", 500, "{}"),
            COURSES,
        ])
        .await;
        let mut report = Report::<Vec<u8>>::Page(Page::new("강의 삭제"));

        let ok = delete(&client, vec![1, 2, 4], &mut report).await.unwrap();

        assert!(!ok);
        let Report::Page(mut page) = report else {
            unreachable!()
        };
        let status = page.section("status").content().to_owned();
        assert!(status.contains(r#"<div class="result-box">"#));
        assert!(status.contains("강의 ID 1: ❌ 강의를 찾을 수 없습니다."));
        assert!(status.contains("강의 ID 2: ✅ 삭제 완료 (총 0개 과목 배정됨)"));
        assert!(status.contains("강의 ID 4: ❌ 삭제 실패"));
        // The list is refreshed afterwards
        assert!(page.section("courses").content().contains("알고리즘"));
    }

    #[tokio::test]
    async fn added_course_refreshes_the_list() {
        let client = stub::service(&[
            (
                "POST /api/courses/add ",
                200,
                r#"{"timetable": [{"day": "화", "startTime": "13:00", "endTime": "15:00",
                    "room": "1216", "courseName": "캡스톤디자인", "instructor": "이교수"}],
                    "metadata": {"version": 2}}"#,
            ),
            COURSES,
        ])
        .await;
        let course = CourseAddRequest {
            process: "학부".into(),
            department: "컴퓨터공학과".into(),
            course_code: "CS999".into(),
            course_name: "캡스톤디자인".into(),
            grade: 0,
            area: "전공".into(),
            enrollment: 25,
            main_instructor: "이교수".into(),
            instructor: "이교수".into(),
            weeks: 15,
            credits: 3,
            is_lab: true,
        };
        let mut report = terminal();

        assert!(add(&client, &course, &mut report).await.unwrap());

        let output = printed(report);
        assert!(output.starts_with("✅ 강의 추가 완료! 총 1개 과목 배정됨\n"));
        assert!(output.contains("CS103"));
    }

    #[tokio::test]
    async fn restored_version_names_both_versions() {
        let client = stub::service(&[(
            "POST /api/versions/1/restore ",
            200,
            r#"{"timetable": [], "metadata": {"version": 5, "restoredFrom": 1}}"#,
        )])
        .await;
        let mut report = terminal();

        assert!(versions(&client, None, Some(1), &mut report).await.unwrap());

        assert_eq!(
            printed(report),
            format!("✅ 1번 버전 복원 완료! (새 버전 5)\n{}\n", timetable::EMPTY_MESSAGE)
        );
    }
}
