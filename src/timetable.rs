use std::io::{self, Write};

use maud::{html, Markup};
use tracing::{debug, warn};

use crate::error::Result;
use crate::utils::{self, models::Position};

use self::models::{
    slot_of, slot_start, CourseEntry, Day, RoomColors, BASE_Z_INDEX, GUTTER_PX, NAME_LIMIT,
    PALETTE, PX_PER_HOUR, SLOT_COUNT, STAGGER_PX,
};

pub mod models;

/// Message shown instead of the grid when nothing is scheduled
pub const EMPTY_MESSAGE: &str = "시간표가 없습니다.";

/// Somewhere markup can be written to, replacing what was there before
pub trait Container {
    fn replace(&mut self, markup: Markup);
}

impl Container for String {
    fn replace(&mut self, markup: Markup) {
        *self = markup.into_string();
    }
}

/// A course as drawn in its starting cell
#[derive(Debug)]
pub struct Block<'a> {
    pub entry: &'a CourseEntry,

    /// Course's name, shortened if too long
    pub label: String,

    /// Color of the course's room
    pub color: &'static str,

    /// Distance from the top of the cell, in pixels
    pub top: u32,

    /// Height of the block, in pixels
    pub height: u32,

    /// Horizontal shift from the cell borders, in pixels
    pub inset: u32,

    pub z_index: u32,

    /// Number of hourly rows the course goes through, counting its first one
    pub rows: usize,
}

#[derive(Debug)]
pub struct Row<'a> {
    /// Start of the hourly slot
    pub start: models::ClockTime,
    /// Blocks starting in this slot, one list per day
    pub cells: [Vec<Block<'a>>; 5],
}

impl Row<'_> {
    /// Hour shown at the left of the row, i.e.: 9시
    pub fn label(&self) -> String {
        format!("{}시", self.start.hour())
    }
}

#[derive(Debug)]
pub struct Layout<'a> {
    pub colors: RoomColors,
    pub rows: Vec<Row<'a>>,
}

/// Place every course in the cell of the day and hour it starts
pub fn layout(entries: &[CourseEntry]) -> Result<Layout<'_>> {
    for entry in entries {
        entry.check_interval()?;
    }

    let colors = RoomColors::new(entries.iter().map(|entry| entry.room.as_str()));

    let rows = (0..SLOT_COUNT)
        .map(|idx| {
            let start = slot_start(idx);
            let cells = std::array::from_fn(|col| {
                entries
                    .iter()
                    .filter(|entry| entry.day.index() == col && entry.overlaps(start, 60))
                    // Only drawn once, where it starts
                    .filter(|entry| slot_of(entry.start_time) == Some(idx))
                    .enumerate()
                    .map(|(i, entry)| block(entry, i, idx, &colors))
                    .collect()
            });

            Row { start, cells }
        })
        .collect();

    for entry in entries {
        if slot_of(entry.start_time).is_none() {
            warn!(
                course = %entry.course_name,
                day = %entry.day,
                start = %entry.start_time,
                "course starts outside of the calendar, not drawn"
            );
        }
    }

    debug!(courses = entries.len(), rooms = colors.len(), "calendar laid out");

    Ok(Layout { colors, rows })
}

/// Build the `stack`-th block of a cell of the row `row`
fn block<'a>(entry: &'a CourseEntry, stack: usize, row: usize, colors: &RoomColors) -> Block<'a> {
    let duration = u32::from(entry.duration_minutes().unwrap_or_default());
    let minute = u32::from(entry.start_time.minute());
    // Few blocks ever share a cell
    #[allow(clippy::cast_possible_truncation)]
    let stack = stack as u32;

    let spanned = (minute + duration).div_ceil(60) as usize;

    Block {
        entry,
        label: utils::etc_str(&entry.course_name, NAME_LIMIT),
        color: colors.get(&entry.room).unwrap_or(PALETTE[0]),
        top: 2 + minute,
        height: (duration * PX_PER_HOUR / 60).saturating_sub(GUTTER_PX),
        inset: 2 + stack * STAGGER_PX,
        z_index: BASE_Z_INDEX + stack,
        rows: spanned.clamp(1, SLOT_COUNT - row),
    }
}

/// Render the weekly calendar of `entries` into `target`, replacing its content.
///
/// Nothing is written if an entry doesn't end after it starts.
pub fn render<C: Container + ?Sized>(entries: &[CourseEntry], target: &mut C) -> Result<()> {
    if entries.is_empty() {
        target.replace(html! { p.empty { (EMPTY_MESSAGE) } });
        return Ok(());
    }

    let layout = layout(entries)?;
    target.replace(calendar(&layout));

    Ok(())
}

/// Grid followed by the legend of the rooms
pub fn calendar(layout: &Layout) -> Markup {
    html! {
        table.timetable-container {
            tr {
                td.time-cell {}
                @for day in Day::ALL {
                    td.timetable-header { (day.label()) }
                }
            }
            @for row in &layout.rows {
                tr {
                    td.time-cell { (row.label()) }
                    @for cell in &row.cells {
                        td.timetable-cell style="position: relative;" {
                            @for block in cell {
                                (course_block(block))
                            }
                        }
                    }
                }
            }
        }
        (legend(&layout.colors))
    }
}

fn course_block(block: &Block) -> Markup {
    let style = format!(
        "background-color: {}; top: {}px; left: {inset}px; right: {inset}px; height: {}px; z-index: {};",
        block.color,
        block.top,
        block.height,
        block.z_index,
        inset = block.inset,
    );

    html! {
        div.course-block style=(style) {
            div.course-name { (block.label) }
            div.course-room { (block.entry.room) br; (block.entry.instructor) }
        }
    }
}

fn legend(colors: &RoomColors) -> Markup {
    html! {
        div.legend style="margin-top: 20px; padding: 10px; background-color: #f9f9f9; border-radius: 5px;" {
            strong { "강의실별 색상:" }
            br;
            @for (room, color) in colors.iter() {
                span.swatch style=(format!(
                    "display: inline-block; width: 20px; height: 20px; background-color: {color}; \
                     margin: 5px; border: 1px solid #ddd; vertical-align: middle;"
                )) {}
                span.room style="margin-right: 15px;" { (room) }
            }
        }
    }
}

/// Print the calendar of `entries` in the terminal
pub fn preview<W: Write>(entries: &[CourseEntry], out: &mut W, cell_length: usize) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "{EMPTY_MESSAGE}")?;
        return Ok(());
    }

    let layout = layout(entries)?;
    display(&layout, out, cell_length)?;

    Ok(())
}

/// Display the timetable
pub fn display<W: Write>(layout: &Layout, out: &mut W, cell_length: usize) -> io::Result<()> {
    // Cell length for hours
    let clh = 6;
    let widths: Vec<usize> = std::iter::once(clh)
        .chain(std::iter::repeat(cell_length).take(Day::ALL.len()))
        .collect();
    let sep = utils::models::TabChar::Bv.val();

    // Which block covers each slot of each day, and how far into it we are
    let mut covered: Vec<[Option<(&Block, usize)>; 5]> = vec![[None; 5]; layout.rows.len()];
    for (i, row) in layout.rows.iter().enumerate() {
        for (j, cell) in row.cells.iter().enumerate() {
            for block in cell {
                for k in 0..block.rows {
                    // The block running the longest keeps the slot
                    let slot = &mut covered[i + k][j];
                    if !matches!(*slot, Some((other, at)) if other.rows - at >= block.rows - k) {
                        *slot = Some((block, k));
                    }
                }
            }
        }
    }

    // Top of the tab
    utils::line_table(out, &widths, Position::Top, &[])?;

    // Print day's of the week, after the empty corner
    let mut line = format!("{sep}{}", utils::center("", clh));
    for day in Day::ALL {
        line.push(sep);
        line.push_str(&utils::center(day.label(), cell_length));
    }
    writeln!(out, "{line}{sep}")?;

    let mut open = vec![false; widths.len()];
    for (i, row) in layout.rows.iter().enumerate() {
        utils::line_table(out, &widths, Position::Middle, &open)?;

        let mut line = format!("{sep}{}", utils::center(&row.label(), clh));
        for (j, cell) in row.cells.iter().enumerate() {
            let text = match (cell.first(), covered[i][j]) {
                (Some(first), _) if cell.len() > 1 => {
                    format!("{} (+{})", first.label, cell.len() - 1)
                }
                (Some(first), _) => first.label.clone(),
                (None, Some((block, 1))) => block.entry.room.clone(),
                _ => String::new(),
            };
            line.push(sep);
            line.push_str(&utils::center(&utils::fit_width(&text, cell_length), cell_length));

            open[j + 1] = matches!(covered[i][j], Some((block, k)) if k + 1 < block.rows);
        }
        writeln!(out, "{line}{sep}")?;
    }

    // Bottom of the table
    utils::line_table(out, &widths, Position::Bottom, &[])?;

    if layout.colors.is_empty() {
        return Ok(());
    }

    let legend: Vec<String> = layout
        .colors
        .iter()
        .map(|(room, color)| format!("{room} ({color})"))
        .collect();
    writeln!(out, "강의실별 색상: {}", legend.join(", "))
}
