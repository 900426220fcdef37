// ABOUTME: Serde data models for profiMaktab API responses and diary summaries
// ABOUTME: Tolerant parsing with optional fields and loosely typed mark values

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// One lesson as returned by `GET /dairy/`.
///
/// Every field is optional and a malformed one (explicit `null`, wrong
/// type) is read as absent rather than failing the whole day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLessonEntry {
    #[serde(default, deserialize_with = "lenient_order")]
    pub lesson_order: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub subject: Option<Subject>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub themes: Vec<Theme>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub marks: Vec<Mark>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

// Accepts 3 and "3"
fn lenient_order<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mark {
    #[serde(default)]
    pub value: Option<MarkValue>,
    #[serde(default)]
    pub reason: Option<serde_json::Value>,
}

/// Grades arrive as numbers (`5`), numeric strings (`"5"`) or letters (`"A"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkValue {
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl fmt::Display for MarkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkValue::Number(n) => write!(f, "{}", n),
            MarkValue::Text(s) => f.write_str(s),
            // True/False, not true/false
            MarkValue::Other(Value::Bool(true)) => f.write_str("True"),
            MarkValue::Other(Value::Bool(false)) => f.write_str("False"),
            MarkValue::Other(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod raw_tests {
    use super::*;

    #[test]
    fn test_raw_lesson_deserialize_minimal() {
        let entry: RawLessonEntry = serde_json::from_str("{}").unwrap();
        assert!(entry.lesson_order.is_none());
        assert!(entry.subject.is_none());
        assert!(entry.themes.is_empty());
        assert!(entry.marks.is_empty());
    }

    #[test]
    fn test_raw_lesson_deserialize_full() {
        let json = r#"{
            "id": 991,
            "lesson_order": 3,
            "subject": {"id": 7, "name": "Physics"},
            "themes": [{"title": "Optics", "notes": "Read ch. 4"}, {"title": "Ignored"}],
            "marks": [{"value": "5", "reason": "oral"}, {"value": 2}],
            "extra_field": "ignored"
        }"#;
        let entry: RawLessonEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.lesson_order, Some(3));
        assert_eq!(entry.subject.unwrap().name.as_deref(), Some("Physics"));
        assert_eq!(entry.themes.len(), 2);
        assert_eq!(entry.themes[0].notes.as_deref(), Some("Read ch. 4"));
        assert_eq!(entry.marks[0].value, Some(MarkValue::Text("5".into())));
    }

    #[test]
    fn test_raw_lesson_null_collections_read_as_empty() {
        let json = r#"[{"lesson_order": 1, "subject": {"name": "Art"}, "themes": null, "marks": null}]"#;
        let entries: Vec<RawLessonEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].themes.is_empty());
        assert!(entries[0].marks.is_empty());
        assert_eq!(entries[0].subject.as_ref().unwrap().name.as_deref(), Some("Art"));
    }

    #[test]
    fn test_raw_lesson_malformed_fields_read_as_absent() {
        let json = r#"[
            {"lesson_order": "2", "subject": "Art", "themes": "none", "marks": {}},
            {"lesson_order": "first", "subject": null},
            {"lesson_order": null}
        ]"#;
        let entries: Vec<RawLessonEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].lesson_order, Some(2));
        assert!(entries[0].subject.is_none());
        assert!(entries[0].themes.is_empty());
        assert!(entries[0].marks.is_empty());
        assert_eq!(entries[1].lesson_order, None);
        assert!(entries[1].subject.is_none());
        assert_eq!(entries[2].lesson_order, None);
    }

    #[test]
    fn test_mark_value_display() {
        let marks: Vec<Mark> = serde_json::from_str(
            r#"[{"value": 5}, {"value": 4.5}, {"value": "A"}, {"value": true}, {"value": null}]"#,
        )
        .unwrap();
        let rendered: Vec<Option<String>> = marks
            .iter()
            .map(|m| m.value.as_ref().map(|v| v.to_string()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                Some("5".to_string()),
                Some("4.5".to_string()),
                Some("A".to_string()),
                Some("True".to_string()),
                None,
            ]
        );
    }
}

/// `GET /profile/`. Only the contact link is interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub additional_data: Option<AdditionalData>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default)]
    pub contact_id: Option<u64>,
}

/// `GET /student_contacts/{contact_id}/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentContacts {
    #[serde(default)]
    pub students: Vec<ContactStudent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactStudent {
    pub id: u64,
    #[serde(default)]
    pub user: Option<ContactUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUser {
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod profile_tests {
    use super::*;

    #[test]
    fn test_profile_contact_id() {
        let json = r#"{"id": 1, "username": "parent", "additional_data": {"contact_id": 77}}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.additional_data.unwrap().contact_id, Some(77));
        assert_eq!(profile.extra["username"], "parent");
    }

    #[test]
    fn test_profile_without_additional_data() {
        let profile: Profile = serde_json::from_str(r#"{"additional_data": null}"#).unwrap();
        assert!(profile.additional_data.is_none());
    }

    #[test]
    fn test_student_contacts() {
        let json = r#"{"students": [{"id": 42, "user": {"name": "Alice"}}, {"id": 43}]}"#;
        let contacts: StudentContacts = serde_json::from_str(json).unwrap();
        assert_eq!(contacts.students.len(), 2);
        assert!(contacts.students[1].user.is_none());
    }
}

/// Normalized lesson, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonSummary {
    pub lesson: Option<i64>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub homework: Option<String>,
    pub mark: Option<LessonMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonMark {
    pub value: String,
    pub reason: Option<String>,
}

/// Mean of the day's numeric marks. Serializes as the integer `0` when
/// there were none, otherwise as a one-decimal float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Average {
    NoMarks,
    Mean(f64),
}

impl Average {
    pub fn value(&self) -> f64 {
        match self {
            Average::NoMarks => 0.0,
            Average::Mean(v) => *v,
        }
    }
}

impl Serialize for Average {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Average::NoMarks => serializer.serialize_u8(0),
            Average::Mean(v) => serializer.serialize_f64(*v),
        }
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Average::NoMarks => f.write_str("0"),
            Average::Mean(v) => write!(f, "{:.1}", v),
        }
    }
}

/// One student's day. Rebuilt from scratch on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiarySummary {
    pub date: String,
    pub student: String,
    pub lessons: Vec<LessonSummary>,
    pub lesson_count: usize,
    pub marks: Vec<i64>,
    pub marks_count: usize,
    pub average: Average,
}
