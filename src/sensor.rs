// ABOUTME: Renders a DiarySummary as observable sensor states
// ABOUTME: "Average Mark" and "School Day" views per student

use crate::model::DiarySummary;
use serde::Serialize;
use serde_json::{json, Value};

const SOURCE: &str = "profimaktab";
const ATTRIBUTION: &str = "Data provided by profiMaktab.uz";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: &'static str,
    pub icon: &'static str,
    pub state: Option<Value>,
    pub attributes: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    AverageMark,
    SchoolDay,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::AverageMark, SensorKind::SchoolDay];

    fn suffix(self) -> &'static str {
        match self {
            SensorKind::AverageMark => "average_mark",
            SensorKind::SchoolDay => "school_day",
        }
    }

    fn name(self) -> &'static str {
        match self {
            SensorKind::AverageMark => "Average Mark",
            SensorKind::SchoolDay => "School Day",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            SensorKind::AverageMark => "mdi:calculator-variant",
            SensorKind::SchoolDay => "mdi:school",
        }
    }

    /// State for `student_id`; both value and attributes are None until a
    /// first summary has been published.
    pub fn render(self, student_id: u64, summary: Option<&DiarySummary>) -> SensorState {
        let (state, attributes) = match summary {
            None => (None, None),
            Some(s) => match self {
                SensorKind::AverageMark => (
                    Some(json!(s.average)),
                    Some(json!({
                        "source": SOURCE,
                        "student": s.student,
                        "marks": s.marks,
                        "marks_count": s.marks_count,
                        "date": s.date,
                        "attribution": ATTRIBUTION,
                    })),
                ),
                SensorKind::SchoolDay => (
                    Some(json!(s.date)),
                    Some(json!({
                        "source": SOURCE,
                        "student": s.student,
                        "lesson_count": s.lesson_count,
                        "lessons": s.lessons,
                        "attribution": ATTRIBUTION,
                    })),
                ),
            },
        };

        SensorState {
            unique_id: format!("{}_{}", student_id, self.suffix()),
            name: self.name(),
            icon: self.icon(),
            state,
            attributes,
        }
    }
}

pub fn render_all(student_id: u64, summary: Option<&DiarySummary>) -> Vec<SensorState> {
    SensorKind::ALL
        .iter()
        .map(|kind| kind.render(student_id, summary))
        .collect()
}
