//! Naming and ordering of dated files.
//!
//! Plan files are named `MP_<YYYY-MM-DD>[_<N>].json` where `N` is a positive
//! counter separating plans created on the same day. Recipe catalog snapshots
//! are named `recipes_<YYYY-MM-DD>.json`.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::clock::Clock;

pub const PLAN_PREFIX: &str = "MP_";
pub const RECIPES_PREFIX: &str = "recipes_";
pub const JSON_EXTENSION: &str = ".json";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `MP_YYYY-MM-DD` for `date`.
pub fn date_stem(date: NaiveDate) -> String {
    format!("{}{}", PLAN_PREFIX, date.format(DATE_FORMAT))
}

/// The date stem for the clock's current day.
pub fn today(clock: &dyn Clock) -> String {
    date_stem(clock.today())
}

/// Picks a plan filename for `stem` that collides with nothing in `existing`.
///
/// With no file for the stem yet this is `<stem>.json`. Otherwise the
/// unsuffixed file counts as 0 and the result is one past the highest
/// counter seen, so counters only ever grow within a day.
pub fn next_available<'a, I>(existing: I, stem: &str) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let highest = existing
        .into_iter()
        .filter_map(|name| counter_for_stem(name, stem))
        .max();

    match highest {
        None => format!("{}{}", stem, JSON_EXTENSION),
        Some(m) => format!("{}_{}{}", stem, m.saturating_add(1), JSON_EXTENSION),
    }
}

/// Counter of `name` if it is `<stem>.json` (0) or `<stem>_<digits>.json`.
fn counter_for_stem(name: &str, stem: &str) -> Option<u64> {
    let rest = name.strip_prefix(stem)?.strip_suffix(JSON_EXTENSION)?;
    if rest.is_empty() {
        return Some(0);
    }
    parse_digits(rest.strip_prefix('_')?)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // chrono accepts unpadded fields; file names never have them.
    let well_formed = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Date and counter (0 when unsuffixed) of a plan filename.
pub fn parse_plan_filename(name: &str) -> Option<(NaiveDate, u64)> {
    let body = name
        .strip_prefix(PLAN_PREFIX)?
        .strip_suffix(JSON_EXTENSION)?;
    let (date, counter) = match body.split_once('_') {
        Some((date, counter)) => (date, parse_digits(counter).filter(|n| *n > 0)?),
        None => (body, 0),
    };
    Some((parse_date(date)?, counter))
}

pub fn is_plan_filename(name: &str) -> bool {
    parse_plan_filename(name).is_some()
}

pub fn recipes_filename(date: NaiveDate) -> String {
    format!(
        "{}{}{}",
        RECIPES_PREFIX,
        date.format(DATE_FORMAT),
        JSON_EXTENSION
    )
}

pub fn is_recipes_filename(name: &str) -> bool {
    name.strip_prefix(RECIPES_PREFIX)
        .and_then(|rest| rest.strip_suffix(JSON_EXTENSION))
        .and_then(parse_date)
        .is_some()
}

/// Human-readable label for a plan filename, e.g. `Wed 1 Jan 2025 (#2)`.
/// Names that are not plan filenames come back unchanged.
pub fn format_label(name: &str) -> String {
    match parse_plan_filename(name) {
        Some((date, 0)) => date.format("%a %-d %b %Y").to_string(),
        Some((date, counter)) => format!("{} (#{})", date.format("%a %-d %b %Y"), counter),
        None => name.to_string(),
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Unrecognized(&'a str),
    Dated(NaiveDate, u64),
}

fn sort_key(name: &str) -> SortKey<'_> {
    match parse_plan_filename(name) {
        Some((date, counter)) => SortKey::Dated(date, counter),
        None => SortKey::Unrecognized(name),
    }
}

fn newest_first(a: &str, b: &str) -> Ordering {
    sort_key(b).cmp(&sort_key(a))
}

/// Sorts newest first: by date, then by counter, descending.
///
/// For counters below 10 this is plain descending lexicographic order;
/// comparing the parsed counter keeps `_10` ahead of `_9`. Names that do
/// not parse sort after all plan files. The sort is stable.
pub fn sort_newest_first<I, T>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
    names.sort_by(|a, b| newest_first(a, b));
    names
}
