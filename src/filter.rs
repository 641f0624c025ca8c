use dialoguer::MultiSelect;

use crate::api::models::CourseInfo;
use crate::error::Result;
use crate::timetable::models::CourseEntry;

/// Room choice meaning "every room"
pub const ALL_ROOMS: &str = "전체";

const DISCLAIMER: &str = "(선택은 SPACE, 확인은 ENTER)";

/// Keep only the courses of `room`, or all of them for `전체`
pub fn by_room(timetable: Vec<CourseEntry>, room: &str) -> Vec<CourseEntry> {
    if room == ALL_ROOMS {
        return timetable;
    }

    let mut my_timetable = timetable;
    my_timetable.retain(|course| course.room == room);

    my_timetable
}

/// Line summing up what the view shows
pub fn summary(room: &str, count: usize) -> String {
    if room == ALL_ROOMS {
        format!("전체: 총 {count}개 과목이 배정되었습니다.")
    } else {
        format!("{room} 강의실: {count}개 과목이 배정되었습니다.")
    }
}

/// Let the user tick the courses to delete, returns their ids
pub fn courses_to_delete(courses: &[CourseInfo]) -> Result<Vec<u32>> {
    let items: Vec<String> = courses.iter().map(CourseInfo::selection).collect();

    let defaults = vec![false; items.len()];
    let selections = MultiSelect::new()
        .with_prompt(format!("삭제할 강의를 고르세요 {DISCLAIMER}"))
        .items(&items[..])
        .defaults(&defaults[..])
        .interact()?;

    Ok(selections.into_iter().map(|i| courses[i].id).collect())
}
