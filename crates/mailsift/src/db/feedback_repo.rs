//! Feedback repository: append-only priority correctness signals.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::model::{Feedback, Priority, UnknownLabel};

fn feedback_from_row(row: &Row<'_>) -> Result<Feedback, rusqlite::Error> {
    let asserted: String = row.get("asserted_priority")?;
    let recorded_at: String = row.get("recorded_at")?;

    let asserted_priority = Priority::parse_label(&asserted).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(UnknownLabel(asserted)))
    })?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Feedback {
        id: row.get("id")?,
        message_id: row.get("message_id")?,
        asserted_priority,
        is_correct: row.get("is_correct")?,
        recorded_at,
    })
}

/// Appends a feedback row stamped with the current time.
pub fn record(
    db: &Database,
    message_id: &str,
    asserted_priority: Priority,
    is_correct: bool,
) -> Result<Feedback, DatabaseError> {
    let recorded_at = Utc::now();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO feedback (message_id, asserted_priority, is_correct, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                message_id,
                asserted_priority.label(),
                is_correct,
                recorded_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
            ],
        )?;
        Ok(Feedback {
            id: conn.last_insert_rowid(),
            message_id: message_id.to_string(),
            asserted_priority,
            is_correct,
            recorded_at,
        })
    })
}

/// All feedback, newest first.
pub fn list_all(db: &Database) -> Result<Vec<Feedback>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, message_id, asserted_priority, is_correct, recorded_at
             FROM feedback ORDER BY recorded_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], feedback_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Aggregate accuracy of stored priorities as judged by feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total: u64,
    pub correct: u64,
    /// Percentage of correct judgments, two decimals. `0.0` with no feedback.
    pub accuracy: f64,
    /// Feedback count per asserted priority label.
    pub by_priority: BTreeMap<String, u64>,
}

pub fn stats(db: &Database) -> Result<FeedbackStats, DatabaseError> {
    db.with_conn(|conn| {
        let (total, correct): (u64, u64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_correct), 0) FROM feedback",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT asserted_priority, COUNT(*) FROM feedback
             GROUP BY asserted_priority ORDER BY asserted_priority",
        )?;
        let by_priority = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let accuracy = if total == 0 {
            0.0
        } else {
            ((correct as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
        };

        Ok(FeedbackStats {
            total,
            correct,
            accuracy,
            by_priority,
        })
    })
}
