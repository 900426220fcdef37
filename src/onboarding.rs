// ABOUTME: Discovers which students a parent login can see
// ABOUTME: profile → contact id → student contacts → choices

use crate::api::ApiClient;
use crate::{Error, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentChoice {
    pub student_id: u64,
    pub student_name: String,
}

/// List the students linked to the client's login.
///
/// `Error::Auth` means the credentials were rejected; any other API error
/// means the portal could not be reached. Both pass through untouched.
pub async fn discover_students(client: &ApiClient) -> Result<Vec<StudentChoice>> {
    let profile = client.get_profile().await?;

    let contact_id = profile
        .additional_data
        .and_then(|data| data.contact_id)
        .ok_or_else(|| Error::Onboarding("no contact linked to this profile".into()))?;
    debug!(contact_id, "resolved profile contact");

    let contacts = client.get_student_contacts(contact_id).await?;
    let choices: Vec<StudentChoice> = contacts
        .students
        .into_iter()
        .map(|student| StudentChoice {
            student_id: student.id,
            student_name: student
                .user
                .and_then(|u| u.name)
                .unwrap_or_else(|| format!("Student {}", student.id)),
        })
        .collect();

    if choices.is_empty() {
        return Err(Error::Onboarding(
            "no students linked to this contact".into(),
        ));
    }

    Ok(choices)
}
