use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// First hour shown in the grid
pub const FIRST_HOUR: u16 = 9;

/// Number of hourly slots, from 09:00 to 19:00
pub const SLOT_COUNT: usize = 10;

/// Height of one hour in the calendar, in pixels
pub const PX_PER_HOUR: u32 = 60;

/// Vertical space kept between two stacked blocks, in pixels
pub const GUTTER_PX: u32 = 4;

/// Horizontal shift between blocks drawn in the same cell, in pixels
pub const STAGGER_PX: u32 = 3;

/// Stack order of the first block of a cell
pub const BASE_Z_INDEX: u32 = 100;

/// Course names longer than this are shortened in the grid
pub const NAME_LIMIT: usize = 18;

/// Colors given to the rooms, in order
pub const PALETTE: [&str; 6] = [
    "#FFB6C1", "#87CEEB", "#98FB98", "#FFD700", "#FFA500", "#DDA0DD",
];

/// Color used when the whole schedule lives in a single room
pub const SINGLE_ROOM_COLOR: &str = "#87CEEB";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// Columns of the calendar, in order
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Label used by the service and shown in the header
    pub fn label(self) -> &'static str {
        match self {
            Self::Monday => "월",
            Self::Tuesday => "화",
            Self::Wednesday => "수",
            Self::Thursday => "목",
            Self::Friday => "금",
        }
    }

    /// Column of the day in the grid
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|day| day.label() == s.trim())
            .ok_or_else(|| Error::UnknownDay(s.to_owned()))
    }
}

impl TryFrom<String> for Day {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Day> for String {
    fn from(day: Day) -> Self {
        day.label().to_owned()
    }
}

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // h => hours | m => minutes
    Regex::new(r"^(?P<h>\d{1,2}):(?P<m>\d{2})$").expect("time pattern is valid")
});

/// Wall-clock time of the day, stored as minutes since midnight
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        (hours < 24 && minutes < 60).then_some(Self(hours * 60 + minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Minutes elapsed since the start of the hour
    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimeFormat(s.to_owned());

        let captures = TIME_RE.captures(s.trim()).ok_or_else(invalid)?;
        let hours = captures["h"].parse().map_err(|_| invalid())?;
        let minutes = captures["m"].parse().map_err(|_| invalid())?;

        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// Start of the hourly slot at `index` in the grid
#[allow(clippy::cast_possible_truncation)]
pub fn slot_start(index: usize) -> ClockTime {
    ClockTime((FIRST_HOUR + index as u16) * 60)
}

/// Index of the hourly slot containing `time`, if it is inside the grid
pub fn slot_of(time: ClockTime) -> Option<usize> {
    let index = usize::from(time.hour().checked_sub(FIRST_HOUR)?);
    (index < SLOT_COUNT).then_some(index)
}

/// One scheduled course occurrence, as sent by the service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEntry {
    /// Day of the week
    pub day: Day,

    /// Time the course starts
    pub start_time: ClockTime,

    /// Time the course ends, the same day
    pub end_time: ClockTime,

    /// Room where the course takes place
    pub room: String,

    /// Course's name
    pub course_name: String,

    /// Professor's name
    pub instructor: String,
}

impl CourseEntry {
    /// Length of the course, `None` when it doesn't end after it starts
    pub fn duration_minutes(&self) -> Option<u16> {
        self.end_time
            .minutes()
            .checked_sub(self.start_time.minutes())
            .filter(|d| *d > 0)
    }

    /// Reject entries whose end isn't strictly after their start
    pub fn check_interval(&self) -> Result<()> {
        match self.duration_minutes() {
            Some(_) => Ok(()),
            None => Err(Error::InvalidInterval {
                course: self.course_name.clone(),
                start: self.start_time.to_string(),
                end: self.end_time.to_string(),
            }),
        }
    }

    /// True if the course runs during part of `[from, from + minutes)`
    pub fn overlaps(&self, from: ClockTime, minutes: u16) -> bool {
        self.start_time.minutes() < from.minutes() + minutes
            && self.end_time.minutes() > from.minutes()
    }
}

/// Color of each room, rooms sorted by name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomColors(BTreeMap<String, &'static str>);

impl RoomColors {
    pub fn new<'a, I>(rooms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut colors: BTreeMap<String, &'static str> =
            rooms.into_iter().map(|room| (room.to_owned(), "")).collect();

        let single = colors.len() == 1;
        for (i, color) in colors.values_mut().enumerate() {
            *color = if single {
                SINGLE_ROOM_COLOR
            } else {
                PALETTE[i % PALETTE.len()]
            };
        }

        Self(colors)
    }

    pub fn get(&self, room: &str) -> Option<&'static str> {
        self.0.get(room).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.0.iter().map(|(room, color)| (room.as_str(), *color))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
