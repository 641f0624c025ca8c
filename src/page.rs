use std::{fs, io};

use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use tracing::info;

use crate::timetable::Container;
use crate::utils;

const CSS: &str = r"
body { font-family: sans-serif; margin: 20px; color: #333; }
h1 { font-size: 1.5em; }
section { margin-bottom: 30px; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 6px 10px; }
.result-box { padding: 10px; border-radius: 5px; background-color: #f1f1f1; }
.result-box.success { background-color: #e6f4ea; color: #1e7e34; }
.result-box.error { background-color: #fdecea; color: #b00020; }
.timetable-container { table-layout: fixed; width: 100%; }
.timetable-container td { height: 60px; padding: 0; vertical-align: top; }
.time-cell { width: 50px; text-align: center; vertical-align: middle !important; }
.timetable-header { text-align: center; font-weight: bold; height: 30px !important; vertical-align: middle !important; }
.course-block { position: absolute; border-radius: 4px; padding: 4px; overflow: hidden; font-size: 12px; box-shadow: 0 1px 2px rgba(0, 0, 0, 0.2); }
.course-name { font-weight: bold; }
.course-room { font-size: 11px; }
footer { font-size: 0.8em; color: #888; }
";

/// Named part of a page
#[derive(Debug)]
pub struct Section {
    id: String,
    content: String,
}

impl Section {
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Container for Section {
    fn replace(&mut self, markup: Markup) {
        self.content = markup.into_string();
    }
}

/// Standalone HTML document, sections in the order they were first asked for
#[derive(Debug)]
pub struct Page {
    title: String,
    sections: Vec<Section>,
}

impl Page {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            sections: Vec::new(),
        }
    }

    /// Section named `id`, created empty at the end of the page if unknown
    pub fn section(&mut self, id: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.id == id) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section {
                    id: id.to_owned(),
                    content: String::new(),
                });
                self.sections.len() - 1
            }
        };

        &mut self.sections[idx]
    }

    pub fn to_markup(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="ko" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (self.title) }
                    style { (PreEscaped(CSS)) }
                }
                body {
                    h1 { (self.title) }
                    @for part in &self.sections {
                        section id=(part.id) {
                            (PreEscaped(part.content()))
                        }
                    }
                    footer {
                        "생성: " (Local::now().format("%Y-%m-%d %H:%M"))
                    }
                }
            }
        }
    }

    /// Write the page, `.html` is appended to `filename` when missing
    pub fn export(&self, filename: &mut String) -> io::Result<()> {
        utils::html_file_name(filename);
        fs::write(&*filename, self.to_markup().into_string())?;
        info!(file = %filename, sections = self.sections.len(), "page exported");

        Ok(())
    }
}
