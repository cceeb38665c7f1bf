//! Server-rendered HTML pages.
//!
//! Templates are compiled into the binary and parsed once at startup. Template names end in
//! `.html`, so minijinja auto-escapes every interpolated value.

use minijinja::{Environment, context};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

const FILES_TEMPLATE: &str = "files.html";

/// Everything except RFC 3986 unreserved characters, so a key always fits in one path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encode `name` for use as a single URL path segment.
pub fn encode_path_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

#[derive(Debug, Serialize)]
struct FileLink<'a> {
    name: &'a str,
    path: String,
}

impl<'a> FileLink<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            path: encode_path_segment(name),
        }
    }
}

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(FILES_TEMPLATE, include_str!("templates/files.html"))?;
        Ok(Self { env })
    }

    /// Upload form followed by a link to every stored file.
    pub fn file_listing(&self, files: &[String]) -> Result<String, minijinja::Error> {
        let files: Vec<FileLink<'_>> = files.iter().map(|name| FileLink::new(name)).collect();
        self.env.get_template(FILES_TEMPLATE)?.render(context! { files => files })
    }
}
