// ABOUTME: Tracked students, their clients and their latest summaries
// ABOUTME: Fetch → parse → publish on a per-student watch channel

use crate::api::ApiClient;
use crate::auth::Credentials;
use crate::config::{Config, StudentEntry};
use crate::diary::parse_diary;
use crate::model::DiarySummary;
use crate::util::{iso_date, today};
use crate::{Error, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info};

/// How every per-student client is built.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub timeout: Duration,
    /// Pause range in ms after each response; `(0, 0)` disables it.
    pub throttle_ms: (u64, u64),
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        ClientSettings {
            api_base: config.api_base.clone(),
            timeout: config.timeout,
            throttle_ms: (100, 300),
        }
    }

    pub fn build(&self, credentials: Credentials) -> Result<ApiClient> {
        let (min, max) = self.throttle_ms;
        let client = ApiClient::new(credentials, Some(self.api_base.clone()))?
            .with_timeout(self.timeout);
        Ok(if max == 0 {
            client.disable_throttle()
        } else {
            client.with_throttle(min, max)
        })
    }
}

/// The "update all students" trigger. Exactly one exists per registry.
#[derive(Debug, Default)]
pub struct UpdateTrigger {
    notify: Notify,
}

impl UpdateTrigger {
    pub fn press(&self) {
        self.notify.notify_one();
    }

    pub async fn pressed(&self) {
        self.notify.notified().await;
    }
}

pub struct RegisteredStudent {
    pub entry: StudentEntry,
    client: ApiClient,
    slot: watch::Sender<Option<DiarySummary>>,
}

impl RegisteredStudent {
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn latest(&self) -> Option<DiarySummary> {
        self.slot.borrow().clone()
    }
}

#[derive(Debug)]
pub struct StudentFailure {
    pub student_id: u64,
    pub student_name: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<StudentFailure>,
}

pub struct Registry {
    settings: ClientSettings,
    students: Vec<RegisteredStudent>,
    update_trigger: OnceLock<Arc<UpdateTrigger>>,
}

impl Registry {
    pub fn new(settings: ClientSettings) -> Self {
        Registry {
            settings,
            students: Vec::new(),
            update_trigger: OnceLock::new(),
        }
    }

    /// Track a student with a client of its own. The first registration
    /// also creates the shared update trigger.
    pub fn register(&mut self, entry: StudentEntry) -> Result<()> {
        if self.find(entry.student_id).is_some() {
            return Err(Error::Config(format!(
                "student {} is already configured",
                entry.student_id
            )));
        }

        let client = self.settings.build(Credentials::new(
            entry.username.clone(),
            entry.password.clone(),
        ))?;
        let (slot, _) = watch::channel(None);

        self.update_trigger.get_or_init(|| {
            debug!("creating update trigger");
            Arc::new(UpdateTrigger::default())
        });

        info!(student_id = entry.student_id, student = %entry.display_name(), "registered student");
        self.students.push(RegisteredStudent {
            entry,
            client,
            slot,
        });
        Ok(())
    }

    pub fn update_trigger(&self) -> Option<Arc<UpdateTrigger>> {
        self.update_trigger.get().cloned()
    }

    pub fn students(&self) -> &[RegisteredStudent] {
        &self.students
    }

    pub fn find(&self, student_id: u64) -> Option<&RegisteredStudent> {
        self.students
            .iter()
            .find(|s| s.entry.student_id == student_id)
    }

    pub fn subscribe(&self, student_id: u64) -> Option<watch::Receiver<Option<DiarySummary>>> {
        self.find(student_id).map(|s| s.slot.subscribe())
    }

    /// Refresh every student concurrently. One student's failure is logged
    /// and counted; it does not stop the others.
    pub async fn update_all(&self, date: Option<NaiveDate>) -> BatchReport {
        let date = date.unwrap_or_else(today);
        let results = join_all(
            self.students
                .iter()
                .map(|student| async move { (student, update_student(student, date).await) }),
        )
        .await;

        let mut report = BatchReport::default();
        for (student, result) in results {
            match result {
                Ok(_) => report.updated += 1,
                Err(error) => {
                    error!(
                        student = %student.entry.display_name(),
                        student_id = student.entry.student_id,
                        error = %error,
                        "update failed"
                    );
                    report.failed += 1;
                    report.failures.push(StudentFailure {
                        student_id: student.entry.student_id,
                        student_name: student.entry.display_name(),
                        error,
                    });
                }
            }
        }

        info!(
            updated = report.updated,
            failed = report.failed,
            "update complete"
        );
        report
    }

    /// Refresh everyone on every `interval` tick (the first one fires at
    /// once) and whenever the update trigger is pressed, until `shutdown`
    /// completes. Shutdown is honored mid-update too.
    pub async fn run_until<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let trigger = self.update_trigger();
        let mut ticker = tokio::time::interval(interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = manual_press(&trigger) => info!("manual update requested"),
                _ = &mut shutdown => break,
            }
            tokio::select! {
                _ = self.update_all(None) => {}
                _ = &mut shutdown => break,
            }
        }
        info!("stopping");
    }
}

async fn manual_press(trigger: &Option<Arc<UpdateTrigger>>) {
    match trigger {
        Some(t) => t.pressed().await,
        None => std::future::pending().await,
    }
}

/// Fetch and parse one student's day, then replace their published summary.
/// Nothing is published when the fetch fails.
pub async fn update_student(student: &RegisteredStudent, date: NaiveDate) -> Result<DiarySummary> {
    let name = student.entry.display_name();
    debug!(student = %name, student_id = student.entry.student_id, "updating diary");

    let raw = student
        .client
        .get_diary(student.entry.student_id, Some(date))
        .await?;

    let summary = parse_diary(&raw, &name, &iso_date(date));
    student.slot.send_replace(Some(summary.clone()));

    info!(student = %name, lessons = summary.lesson_count, "data updated");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ClientSettings {
        ClientSettings {
            api_base: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
            throttle_ms: (0, 0),
        }
    }

    fn entry(id: u64) -> StudentEntry {
        StudentEntry {
            username: "parent".into(),
            password: "secret".into(),
            student_id: id,
            student_name: None,
        }
    }

    #[test]
    fn test_trigger_created_once() {
        let mut registry = Registry::new(settings());
        assert!(registry.update_trigger().is_none());

        registry.register(entry(1)).unwrap();
        let first = registry.update_trigger().unwrap();
        registry.register(entry(2)).unwrap();
        let second = registry.update_trigger().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.students().len(), 2);
    }

    #[test]
    fn test_duplicate_student_rejected() {
        let mut registry = Registry::new(settings());
        registry.register(entry(7)).unwrap();
        assert!(matches!(registry.register(entry(7)), Err(Error::Config(_))));
    }

    #[test]
    fn test_new_slot_is_empty() {
        let mut registry = Registry::new(settings());
        registry.register(entry(3)).unwrap();

        let rx = registry.subscribe(3).unwrap();
        assert!(rx.borrow().is_none());
        assert!(registry.find(3).unwrap().latest().is_none());
        assert!(registry.subscribe(4).is_none());
    }

    #[tokio::test]
    async fn test_trigger_press_wakes_waiter() {
        let trigger = UpdateTrigger::default();
        trigger.press();
        // permit is stored until someone waits
        tokio::time::timeout(Duration::from_secs(1), trigger.pressed())
            .await
            .unwrap();
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_student_logged_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut registry = Registry::new(settings());
        registry.register(entry(5)).unwrap();
        let report = registry.update_all(None).await;
        assert_eq!(report.failed, 1);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let failure_lines: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("student_id=5") && line.contains("ERROR"))
            .collect();
        assert_eq!(failure_lines.len(), 1, "log output:\n{}", output);
        assert!(failure_lines[0].contains("update failed"));
    }
}
