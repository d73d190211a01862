//! Mapping between tasks and calendar events.

use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::{EventStatus, EventTime, ExternalEvent};
use crate::dates::{date_key, parse_clock, parse_date_key, shift};
use crate::task::{RepeatPattern, Task, TaskDraft, TimeSlot};

const UNTITLED: &str = "(No title)";

/// Event colour palette, indexed by the provider's `colorId`.
const PALETTE: &[(&str, &str)] = &[
    ("1", "#7986cb"),
    ("2", "#33b679"),
    ("3", "#8e24aa"),
    ("4", "#e67c73"),
    ("5", "#f6bf26"),
    ("6", "#f4511e"),
    ("7", "#039be5"),
    ("8", "#616161"),
    ("9", "#3f51b5"),
    ("10", "#0b8043"),
    ("11", "#d50000"),
];

pub fn id_for_color(color: &str) -> Option<String> {
    PALETTE
        .iter()
        .find(|(_, hex)| hex.eq_ignore_ascii_case(color))
        .map(|(id, _)| id.to_string())
}

pub fn color_for_id(color_id: &str) -> Option<String> {
    PALETTE
        .iter()
        .find(|(id, _)| *id == color_id)
        .map(|(_, hex)| hex.to_string())
}

fn recurrence_for(pattern: RepeatPattern) -> Vec<String> {
    let freq = match pattern {
        RepeatPattern::None => return Vec::new(),
        RepeatPattern::Daily => "DAILY",
        RepeatPattern::Weekly => "WEEKLY",
        RepeatPattern::Monthly => "MONTHLY",
        RepeatPattern::Yearly => "YEARLY",
    };
    vec![format!("RRULE:FREQ={}", freq)]
}

fn pattern_for(recurrence: &[String]) -> RepeatPattern {
    recurrence
        .iter()
        .filter_map(|line| line.strip_prefix("RRULE:"))
        .flat_map(|rule| rule.split(';'))
        .find_map(|part| part.strip_prefix("FREQ="))
        .map(RepeatPattern::parse)
        .unwrap_or_default()
}

/// Build the event for a dated task. Returns `None` for inbox tasks or
/// tasks whose date cannot be parsed.
///
/// Tasks with a time slot become timed events; the rest are all-day events
/// spanning `date..=end_date`.
pub fn task_to_event(task: &Task, time_zone: Option<&str>) -> Option<ExternalEvent> {
    let date = parse_date_key(task.date.as_deref()?).ok()?;
    let last_day = task
        .end_date
        .as_deref()
        .and_then(|d| parse_date_key(d).ok())
        .filter(|d| *d >= date)
        .unwrap_or(date);

    // A timed task spanning days ends at the slot's end clock on `end_date`.
    let timed = task.time_slot.as_ref().and_then(|slot| {
        let start = parse_clock(&slot.start).ok()?;
        let end = parse_clock(&slot.end).ok()?;
        Some((date.and_time(start), last_day.and_time(end)))
    });

    let (start, end) = match timed {
        Some((start, end)) => (
            EventTime::DateTime {
                local: start,
                time_zone: time_zone.map(str::to_string),
            },
            EventTime::DateTime {
                local: end,
                time_zone: time_zone.map(str::to_string),
            },
        ),
        None => (EventTime::Date(date), EventTime::Date(shift(last_day, 1))),
    };

    Some(ExternalEvent {
        id: task.external_event_id.clone().unwrap_or_default(),
        summary: outbound_title(&task.title),
        description: task.notes.clone(),
        start,
        end,
        recurrence: recurrence_for(task.repeat_pattern),
        color_id: task.color.as_deref().and_then(id_for_color),
        status: EventStatus::Confirmed,
    })
}

/// Tasks imported from untitled events carry the placeholder title; the
/// event keeps its empty summary.
fn outbound_title(title: &str) -> String {
    if title == UNTITLED {
        String::new()
    } else {
        title.to_string()
    }
}

fn event_title(event: &ExternalEvent) -> String {
    let title = event.summary.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

fn end_of_span(event: &ExternalEvent) -> Option<NaiveDate> {
    let start = event.start.date();
    let last = match &event.end {
        EventTime::Date(end) => shift(*end, -1),
        EventTime::DateTime { local, .. } => local.date(),
    };
    (last > start).then_some(last)
}

/// Slot for a timed event. An event ending on a later day keeps its real
/// end clock; the day itself goes to the draft's `end_date`.
fn slot_for(start: &NaiveDateTime, end: &EventTime) -> TimeSlot {
    let end_clock = match end {
        EventTime::DateTime { local, .. } => crate::dates::clock(local.time()),
        EventTime::Date(_) => "23:59".to_string(),
    };
    TimeSlot {
        start: crate::dates::clock(start.time()),
        end: end_clock,
    }
}

/// Build a task draft for an imported event, tagged with `project_id`.
pub fn event_to_draft(event: &ExternalEvent, project_id: Option<&str>) -> TaskDraft {
    let time_slot = match &event.start {
        EventTime::DateTime { local, .. } => Some(slot_for(local, &event.end)),
        EventTime::Date(_) => None,
    };

    TaskDraft {
        title: event_title(event),
        completed: false,
        date: Some(date_key(event.start.date())),
        end_date: end_of_span(event).map(date_key),
        order: None,
        time_slot,
        project_id: project_id.map(str::to_string),
        external_event_id: Some(event.id.clone()),
        subtasks: Vec::new(),
        repeat_pattern: pattern_for(&event.recurrence),
        notes: event.description.clone(),
        color: event.color_id.as_deref().and_then(color_for_id),
    }
}

/// Content identity used to match imported events to existing tasks that
/// lost (or never had) their event link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    pub date: String,
    pub start: Option<String>,
}

impl DedupKey {
    pub fn for_task(task: &Task) -> Option<Self> {
        Some(DedupKey {
            title: task.title.trim().to_string(),
            date: task.date.clone()?,
            start: task.time_slot.as_ref().map(|s| s.start.clone()),
        })
    }

    pub fn for_event(event: &ExternalEvent) -> Self {
        DedupKey {
            title: event_title(event),
            date: date_key(event.start.date()),
            start: event.start.clock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_task;

    #[test]
    fn test_timed_task_becomes_timed_event() {
        let mut task = sample_task("Standup", Some("2024-06-03"), 0.0);
        task.time_slot = Some(TimeSlot::new("09:00", "09:15").unwrap());
        task.repeat_pattern = RepeatPattern::Weekly;
        task.color = Some("#039BE5".into());

        let event = task_to_event(&task, Some("Europe/Berlin")).unwrap();
        assert_eq!(event.id, "");
        assert_eq!(event.start.clock().as_deref(), Some("09:00"));
        assert_eq!(event.end.clock().as_deref(), Some("09:15"));
        assert_eq!(event.recurrence, vec!["RRULE:FREQ=WEEKLY".to_string()]);
        assert_eq!(event.color_id.as_deref(), Some("7"));
        match event.start {
            EventTime::DateTime { time_zone, .. } => assert_eq!(time_zone.as_deref(), Some("Europe/Berlin")),
            other => panic!("expected timed start, got {other:?}"),
        }
    }

    #[test]
    fn test_untimed_task_is_all_day_with_exclusive_end() {
        let mut task = sample_task("Conference", Some("2024-06-03"), 0.0);
        task.end_date = Some("2024-06-05".into());

        let event = task_to_event(&task, None).unwrap();
        assert_eq!(event.start, EventTime::Date(parse_date_key("2024-06-03").unwrap()));
        assert_eq!(event.end, EventTime::Date(parse_date_key("2024-06-06").unwrap()));
    }

    #[test]
    fn test_overnight_event_keeps_its_end() {
        let start = parse_date_key("2024-06-11").unwrap();
        let event = ExternalEvent {
            id: "late".into(),
            summary: "".into(),
            description: None,
            start: EventTime::DateTime {
                local: start.and_time(parse_clock("22:00").unwrap()),
                time_zone: None,
            },
            end: EventTime::DateTime {
                local: shift(start, 1).and_time(parse_clock("02:00").unwrap()),
                time_zone: None,
            },
            recurrence: Vec::new(),
            color_id: None,
            status: EventStatus::Confirmed,
        };

        let draft = event_to_draft(&event, None);
        let slot = draft.time_slot.clone().unwrap();
        assert_eq!((slot.start.as_str(), slot.end.as_str()), ("22:00", "02:00"));
        assert_eq!(draft.end_date.as_deref(), Some("2024-06-12"));
        assert_eq!(draft.title, UNTITLED);

        let mut task = sample_task(&draft.title, draft.date.as_deref(), 0.0);
        task.end_date = draft.end_date;
        task.time_slot = draft.time_slot;
        task.external_event_id = draft.external_event_id;
        assert_eq!(task_to_event(&task, None), Some(event));
    }

    #[test]
    fn test_inbox_task_has_no_event() {
        let task = sample_task("Someday", None, 0.0);
        assert!(task_to_event(&task, None).is_none());
    }

    #[test]
    fn test_event_roundtrips_to_draft() {
        let mut task = sample_task("Conference", Some("2024-06-03"), 0.0);
        task.end_date = Some("2024-06-05".into());
        task.notes = Some("Hall B".into());
        let mut event = task_to_event(&task, None).unwrap();
        event.id = "evt-1".into();

        let draft = event_to_draft(&event, Some("work"));
        assert_eq!(draft.title, "Conference");
        assert_eq!(draft.date.as_deref(), Some("2024-06-03"));
        assert_eq!(draft.end_date.as_deref(), Some("2024-06-05"));
        assert_eq!(draft.external_event_id.as_deref(), Some("evt-1"));
        assert_eq!(draft.project_id.as_deref(), Some("work"));
        assert_eq!(draft.notes.as_deref(), Some("Hall B"));
        assert_eq!(draft.time_slot, None);
    }

    #[test]
    fn test_dedup_keys_match_between_task_and_event() {
        let mut task = sample_task("  Dentist ", Some("2024-06-03"), 0.0);
        task.time_slot = Some(TimeSlot::new("14:00", "15:00").unwrap());
        let event = task_to_event(&task, None).unwrap();

        assert_eq!(DedupKey::for_task(&task), Some(DedupKey::for_event(&event)));
    }

    #[test]
    fn test_untitled_event_and_recurrence() {
        let event = ExternalEvent {
            id: "e".into(),
            summary: "   ".into(),
            description: None,
            start: EventTime::Date(parse_date_key("2024-06-03").unwrap()),
            end: EventTime::Date(parse_date_key("2024-06-04").unwrap()),
            recurrence: vec!["RRULE:FREQ=MONTHLY;BYMONTHDAY=3".into()],
            color_id: Some("11".into()),
            status: EventStatus::Confirmed,
        };
        let draft = event_to_draft(&event, None);
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.end_date, None);
        assert_eq!(draft.repeat_pattern, RepeatPattern::Monthly);
        assert_eq!(draft.color.as_deref(), Some("#d50000"));
    }
}
