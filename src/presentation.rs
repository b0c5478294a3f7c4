//! Display rules for the message list: which side a bubble sits on and
//! when a bubble gets a clock label above it.

use chrono::{DateTime, Local, TimeDelta, TimeZone};

use crate::timeline::Message;

/// Messages closer together than this from the same author share a label.
pub const TIMESTAMP_GAP: TimeDelta = TimeDelta::seconds(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
}

pub fn alignment(message: &Message) -> Alignment {
    if message.author.is_local() { Alignment::End } else { Alignment::Start }
}

pub fn shows_timestamp(message: &Message, previous: Option<&Message>) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    if message.author.id != previous.author.id {
        return true;
    }
    message.created_at - previous.created_at > TIMESTAMP_GAP
}

/// 12-hour clock, e.g. `9:05 PM`.
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M %p").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble<'a> {
    pub message: &'a Message,
    pub alignment: Alignment,
    pub timestamp: Option<String>,
}

/// Lays out the timeline in order, labels rendered in local time.
pub fn bubbles(messages: &[Message]) -> Vec<Bubble<'_>> {
    messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let previous = i.checked_sub(1).map(|p| &messages[p]);
            Bubble {
                message,
                alignment: alignment(message),
                timestamp: shows_timestamp(message, previous)
                    .then(|| format_clock(&message.created_at.with_timezone(&Local))),
            }
        })
        .collect()
}
