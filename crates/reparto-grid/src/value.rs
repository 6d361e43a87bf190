// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::Date;
use time::macros::format_description;

/// A single cell's stored value. Records expose every field through this
/// type so the filtering, editing and sorting engines stay generic over
/// the concrete record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Money(i64),
    Date(Date),
    Bool(bool),
    IdList(Vec<i64>),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Money(cents) => format_cents(*cents),
            Self::Date(value) => format_day(*value),
            Self::Bool(true) => "yes".to_owned(),
            Self::Bool(false) => "no".to_owned(),
            Self::IdList(ids) => ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<String>>()
                .join(","),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text participating in free-text search. Arrays and booleans are not
    /// scalars and never match; null contributes nothing.
    pub fn search_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(_) | Self::IdList(_) => None,
            Self::Text(value) => Some(value.clone()),
            Self::Integer(_) | Self::Money(_) | Self::Date(_) => Some(self.display()),
        }
    }

    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (Self::Money(left), Self::Money(right)) => left.cmp(right),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => {
                left.to_ascii_lowercase().cmp(&right.to_ascii_lowercase())
            }
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            _ => self
                .display()
                .to_ascii_lowercase()
                .cmp(&other.display().to_ascii_lowercase()),
        }
    }
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = if cents < 0 {
        ("-", cents.unsigned_abs())
    } else {
        ("", cents.unsigned_abs())
    };
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

pub fn format_day(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .expect("date format is valid")
}

pub fn parse_day(input: &str) -> Option<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

pub fn parse_cents(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (sign, trimmed) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed),
    };
    let cleaned = trimmed
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }

    let (dollars, fraction) = match cleaned.split_once('.') {
        Some((dollars, fraction)) => (dollars, fraction),
        None => (cleaned.as_str(), ""),
    };
    let dollars: i64 = if dollars.is_empty() {
        0
    } else {
        dollars.parse().ok()?
    };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        2 => fraction.parse().ok()?,
        _ => return None,
    };
    Some(sign * (dollars * 100 + cents))
}
