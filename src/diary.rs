// ABOUTME: Turns a raw diary payload into a display-ready DiarySummary
// ABOUTME: Pure and deterministic; optional fields degrade to None

use crate::model::{Average, DiarySummary, LessonMark, LessonSummary, RawLessonEntry};

/// Build the summary for one student's day.
///
/// `student` and `date` are passed through as given. Lessons are ordered by
/// `lesson_order` (missing counts as 0) with ties kept in input order. Only
/// the first theme and the first mark of each lesson are read. A mark whose
/// value is not an integer (e.g. a pass/fail letter) is kept on the lesson
/// but left out of `marks` and the average.
pub fn parse_diary(entries: &[RawLessonEntry], student: &str, date: &str) -> DiarySummary {
    let mut ordered: Vec<&RawLessonEntry> = entries.iter().collect();
    // sort_by_key is stable
    ordered.sort_by_key(|entry| entry.lesson_order.unwrap_or(0));

    let mut lessons = Vec::with_capacity(ordered.len());
    let mut marks = Vec::new();

    for entry in ordered {
        let theme = entry.themes.first();
        let mark = first_mark(entry);

        if let Some(value) = mark.as_ref().and_then(|m| parse_mark(&m.value)) {
            marks.push(value);
        }

        lessons.push(LessonSummary {
            lesson: entry.lesson_order,
            subject: entry.subject.as_ref().and_then(|s| s.name.clone()),
            topic: theme.and_then(|t| t.title.clone()),
            homework: theme.and_then(|t| t.notes.clone()),
            mark,
        });
    }

    let average = average(&marks);

    DiarySummary {
        date: date.to_string(),
        student: student.to_string(),
        lesson_count: lessons.len(),
        lessons,
        marks_count: marks.len(),
        marks,
        average,
    }
}

fn first_mark(entry: &RawLessonEntry) -> Option<LessonMark> {
    let mark = entry.marks.first()?;
    let value = mark.value.as_ref()?.to_string();
    if value.is_empty() {
        return None;
    }

    let reason = match &mark.reason {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Some(LessonMark { value, reason })
}

fn parse_mark(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn average(marks: &[i64]) -> Average {
    if marks.is_empty() {
        return Average::NoMarks;
    }

    let mean = marks.iter().sum::<i64>() as f64 / marks.len() as f64;
    // Decimal formatting rounds the exact binary value half-to-even
    let rounded = format!("{:.1}", mean).parse().unwrap_or(mean);
    Average::Mean(rounded)
}
