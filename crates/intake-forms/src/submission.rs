//! Submission handling.
//!
//! A [`PersonRecord`] is the immutable snapshot handed to a
//! [`SubmissionSink`] when the gate is open and the user submits. The form
//! performs no validation of its own at this point; it trusts the gate.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use intake_core::{IntakeError, IntakeResult};

use crate::fields::{FormValues, Gender};

/// The values submitted by the form, as sent to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub first_name: String,
    pub surname: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Vec<Gender>,
    pub email: String,
}

impl PersonRecord {
    /// Serializes the record as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> IntakeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&FormValues> for PersonRecord {
    /// Copies the values verbatim; nothing is trimmed or normalized.
    fn from(values: &FormValues) -> Self {
        Self {
            first_name: values.first_name.clone(),
            surname: values.surname.clone(),
            birth_date: values.birth_date,
            gender: values.gender.iter().copied().collect(),
            email: values.email.clone(),
        }
    }
}

/// Receives submitted records.
///
/// Implementations must be `Send + Sync` so one sink can serve several
/// forms.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Delivers one record. An error leaves the form's values in place.
    async fn submit(&self, record: &PersonRecord) -> IntakeResult<()>;
}

/// A sink that logs each record as JSON at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl SubmissionSink for LogSink {
    async fn submit(&self, record: &PersonRecord) -> IntakeResult<()> {
        let json = serde_json::to_string(record)?;
        tracing::info!(record = %json, "Person submitted");
        Ok(())
    }
}

/// A sink that writes each record as pretty JSON to a writer.
#[derive(Debug)]
pub struct JsonWriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonWriterSink<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> IntakeResult<W> {
        self.writer
            .into_inner()
            .map_err(|_| IntakeError::Submission("writer lock poisoned".into()))
    }
}

#[async_trait]
impl<W: Write + Send> SubmissionSink for JsonWriterSink<W> {
    async fn submit(&self, record: &PersonRecord) -> IntakeResult<()> {
        let json = record.to_json_pretty()?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| IntakeError::Submission("writer lock poisoned".into()))?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PersonRecord {
        let values = FormValues {
            first_name: "John".into(),
            surname: "Smith".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17),
            gender: [Gender::Other, Gender::Male].into_iter().collect(),
            email: "john@gmail.com".into(),
        };
        PersonRecord::from(&values)
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "firstName": "John",
                "surname": "Smith",
                "birthDate": "1990-05-17",
                "gender": ["male", "other"],
                "email": "john@gmail.com",
            })
        );
    }

    #[test]
    fn test_record_is_verbatim_snapshot() {
        let values = FormValues {
            first_name: "  John ".into(),
            ..FormValues::default()
        };
        let record = PersonRecord::from(&values);
        assert_eq!(record.first_name, "  John ");
        assert_eq!(record.birth_date, None);
        assert!(record.gender.is_empty());
    }

    #[tokio::test]
    async fn test_log_sink_accepts_record() {
        assert!(LogSink.submit(&record()).await.is_ok());
    }

    #[tokio::test]
    async fn test_json_writer_sink_writes_pretty_json() {
        let sink = JsonWriterSink::new(Vec::new());
        sink.submit(&record()).await.unwrap();
        sink.submit(&record()).await.unwrap();
        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(output.matches("\"firstName\": \"John\"").count(), 2);
        let first_block = output.split("}\n").next().unwrap();
        let parsed: PersonRecord = serde_json::from_str(&format!("{first_block}}}")).unwrap();
        assert_eq!(parsed, record());
    }
}
