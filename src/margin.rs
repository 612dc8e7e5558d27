//! Margin policies and their per-page evaluation
//!
//! A [`MarginPolicy`] decides which [`MarginQuad`] applies to which page.
//! Evaluation is pure: [`MarginPolicy::plan`] takes the current page
//! rectangles and returns the rectangle each page should end up with, or
//! `None` for pages the policy leaves alone.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default margins for every margin field of the upload form
pub const DEFAULT_MARGINS: &str = "20,20,20,20";

/// Page boundary rectangle in document units
///
/// Coordinates are kept in the order they appear in the page's box array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Grow the rectangle by the quad on each edge (negative values shrink it)
    ///
    /// No normalisation is done, so large negative margins can produce an
    /// inverted rectangle.
    pub fn expand(&self, margins: &MarginQuad) -> Self {
        Self {
            x0: self.x0 - f64::from(margins.left),
            y0: self.y0 - f64::from(margins.top),
            x1: self.x1 + f64::from(margins.right),
            y1: self.y1 + f64::from(margins.bottom),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl fmt::Display for PageRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {} {}]", self.x0, self.y0, self.x1, self.y1)
    }
}

/// Margins for the left, top, right and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarginQuad {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl MarginQuad {
    pub const ZERO: MarginQuad = MarginQuad::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Same margin on all four edges
    pub const fn uniform(margin: i32) -> Self {
        Self::new(margin, margin, margin, margin)
    }
}

impl FromStr for MarginQuad {
    type Err = Error;

    /// Parse `"l,t,r,b"`; whitespace around each value is allowed
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidMargins(s.to_string()))?;

        match values.as_slice() {
            [left, top, right, bottom] => Ok(Self::new(*left, *top, *right, *bottom)),
            _ => Err(Error::InvalidMargins(s.to_string())),
        }
    }
}

impl fmt::Display for MarginQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// Inclusive range of 1-indexed pages with the margins to apply to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGroup {
    pub start: u32,
    pub end: u32,
    pub margins: MarginQuad,
}

impl PageGroup {
    pub fn contains(&self, page: u32) -> bool {
        self.start <= page && page <= self.end
    }
}

impl FromStr for PageGroup {
    type Err = Error;

    /// Parse `"start-end:l,t,r,b"`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidGroup(s.to_string());

        let (range, margins) = s.split_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse::<u32>().map_err(|_| invalid())?;
        let end = end.trim().parse::<u32>().map_err(|_| invalid())?;
        let margins = margins.parse::<MarginQuad>().map_err(|_| invalid())?;

        Ok(Self { start, end, margins })
    }
}

/// Parse a comma-separated list of 1-indexed page numbers
///
/// An empty (or all-whitespace) string yields an empty set. Every entry must
/// be an integer; numbers that cannot name a page (zero, negative) are dropped.
pub fn parse_page_list(s: &str) -> Result<BTreeSet<u32>> {
    if s.trim().is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut pages = BTreeSet::new();
    for part in s.split(',') {
        let number = part
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidPageList(s.to_string()))?;
        if let Ok(page) = u32::try_from(number) {
            if page >= 1 {
                pages.insert(page);
            }
        }
    }
    Ok(pages)
}

/// Parse `;`-separated group tokens, keeping their order
///
/// Blank tokens (such as one left by a trailing `;`) are skipped.
pub fn parse_groups(s: &str) -> Result<Vec<PageGroup>> {
    s.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::parse::<PageGroup>)
        .collect()
}

/// Rule deciding which margins apply to which page
#[derive(Debug, Clone, PartialEq)]
pub enum MarginPolicy {
    /// Same margins on every page
    Uniform(MarginQuad),
    /// Odd pages (1, 3, ...) and even pages get their own margins
    OddEven { odd: MarginQuad, even: MarginQuad },
    /// Only the listed pages are changed
    Selected { pages: BTreeSet<u32>, margins: MarginQuad },
    /// Every group containing a page is applied to it, in order
    Groups(Vec<PageGroup>),
}

impl MarginPolicy {
    /// Whether the policy rewrites the page at 1-indexed `page`
    pub fn selects(&self, page: u32) -> bool {
        match self {
            MarginPolicy::Uniform(_) | MarginPolicy::OddEven { .. } => true,
            MarginPolicy::Selected { pages, .. } => pages.contains(&page),
            MarginPolicy::Groups(groups) => groups.iter().any(|g| g.contains(page)),
        }
    }

    /// New rectangle for the page at 1-indexed `page`, or `None` to leave it untouched
    pub fn page_rect(&self, page: u32, rect: PageRect) -> Option<PageRect> {
        match self {
            MarginPolicy::Uniform(margins) => Some(rect.expand(margins)),
            MarginPolicy::OddEven { odd, even } => {
                let margins = if page % 2 == 1 { odd } else { even };
                Some(rect.expand(margins))
            }
            MarginPolicy::Selected { pages, margins } => {
                pages.contains(&page).then(|| rect.expand(margins))
            }
            MarginPolicy::Groups(groups) => {
                let mut matching = groups.iter().filter(|g| g.contains(page)).peekable();
                matching.peek()?;
                Some(matching.fold(rect, |current, group| current.expand(&group.margins)))
            }
        }
    }

    /// Evaluate the policy over pages given in document order
    ///
    /// The result has one entry per input rectangle.
    pub fn plan(&self, rects: &[PageRect]) -> Vec<Option<PageRect>> {
        rects
            .iter()
            .enumerate()
            .map(|(index, rect)| self.page_rect(index as u32 + 1, *rect))
            .collect()
    }
}

/// Policy selector as sent in the `mode` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    OddEven,
    Selected,
    Groups,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "all" => Ok(Mode::All),
            "odd_even" => Ok(Mode::OddEven),
            "selected" => Ok(Mode::Selected),
            "groups" => Ok(Mode::Groups),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::All => "all",
            Mode::OddEven => "odd_even",
            Mode::Selected => "selected",
            Mode::Groups => "groups",
        })
    }
}

/// Raw policy fields, as received from the upload form or the command line
#[derive(Debug, Clone)]
pub struct PolicyForm {
    pub mode: String,
    pub margins: String,
    pub margins_odd: String,
    pub margins_even: String,
    pub selected_pages: String,
    pub group_margins: String,
}

impl Default for PolicyForm {
    fn default() -> Self {
        Self {
            mode: String::new(),
            margins: DEFAULT_MARGINS.to_string(),
            margins_odd: DEFAULT_MARGINS.to_string(),
            margins_even: DEFAULT_MARGINS.to_string(),
            selected_pages: String::new(),
            group_margins: String::new(),
        }
    }
}

impl PolicyForm {
    /// Build the policy, parsing only the fields the mode uses
    pub fn to_policy(&self) -> Result<MarginPolicy> {
        let policy = match self.mode.parse::<Mode>()? {
            Mode::All => MarginPolicy::Uniform(self.margins.parse()?),
            Mode::OddEven => MarginPolicy::OddEven {
                odd: self.margins_odd.parse()?,
                even: self.margins_even.parse()?,
            },
            Mode::Selected => MarginPolicy::Selected {
                pages: parse_page_list(&self.selected_pages)?,
                margins: self.margins.parse()?,
            },
            Mode::Groups => MarginPolicy::Groups(parse_groups(&self.group_margins)?),
        };
        Ok(policy)
    }
}
