//! Message repository: the `messages` and `attachments` tables.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};
use crate::model::{Attachment, Category, Message, Priority, UnknownLabel};
use crate::threading::{self, ThreadGroup};

const MESSAGE_COLUMNS: &str = "message_id, owner, sender, subject, body_excerpt, summary,
     provider_thread_id, computed_thread_id, category, priority, received_at";

fn conversion_error(
    index: usize,
    source: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(source))
}

fn message_from_row(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let category: String = row.get("category")?;
    let priority: String = row.get("priority")?;
    let received_at: String = row.get("received_at")?;

    let category = Category::parse_label(&category)
        .ok_or_else(|| conversion_error(8, UnknownLabel(category)))?;
    let priority = Priority::parse_label(&priority)
        .ok_or_else(|| conversion_error(9, UnknownLabel(priority)))?;
    let received_at = DateTime::parse_from_rfc3339(&received_at)
        .map_err(|e| conversion_error(10, e))?
        .with_timezone(&Utc);

    Ok(Message {
        message_id: row.get("message_id")?,
        owner: row.get("owner")?,
        sender: row.get("sender")?,
        subject: row.get("subject")?,
        body_excerpt: row.get("body_excerpt")?,
        summary: row.get("summary")?,
        provider_thread_id: row.get("provider_thread_id")?,
        computed_thread_id: row.get("computed_thread_id")?,
        category,
        priority,
        attachments: Vec::new(),
        received_at,
    })
}

fn attachment_from_row(row: &Row<'_>) -> Result<(String, Attachment), rusqlite::Error> {
    let size: i64 = row.get("size_bytes")?;
    Ok((
        row.get("message_id")?,
        Attachment {
            filename: row.get("filename")?,
            mime_type: row.get("mime_type")?,
            size_bytes: u64::try_from(size).unwrap_or(0),
            provider_ref: row.get("provider_ref")?,
        },
    ))
}

/// Loads the attachments of every message of `owner`, keyed by message id.
fn attachments_for_owner(
    conn: &Connection,
    owner: &str,
) -> Result<HashMap<String, Vec<Attachment>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.message_id, a.filename, a.mime_type, a.size_bytes, a.provider_ref
         FROM attachments a JOIN messages m ON m.message_id = a.message_id
         WHERE m.owner = ?1
         ORDER BY a.message_id, a.position",
    )?;
    let mut by_message: HashMap<String, Vec<Attachment>> = HashMap::new();
    for row in stmt.query_map(params![owner], attachment_from_row)? {
        let (message_id, attachment) = row?;
        by_message.entry(message_id).or_default().push(attachment);
    }
    Ok(by_message)
}

fn attach_all(messages: &mut [Message], mut attachments: HashMap<String, Vec<Attachment>>) {
    for message in messages {
        if let Some(list) = attachments.remove(&message.message_id) {
            message.attachments = list;
        }
    }
}

/// Returns true if a message with this id has been stored, for any owner.
pub fn exists(db: &Database, message_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE message_id = ?1)",
            params![message_id],
            |r| r.get(0),
        )?;
        Ok(found)
    })
}

/// Writes a message and its attachments in one transaction.
///
/// Create-if-absent: returns `false` and writes nothing when the id is
/// already present.
pub fn insert_if_absent(db: &Database, message: &Message) -> Result<bool, DatabaseError> {
    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO messages (message_id, owner, sender, subject, body_excerpt,
             summary, provider_thread_id, computed_thread_id, category, priority, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                message.message_id,
                message.owner,
                message.sender,
                message.subject,
                message.body_excerpt,
                message.summary,
                message.provider_thread_id,
                message.computed_thread_id,
                message.category.label(),
                message.priority.label(),
                message
                    .received_at
                    .to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;

        if inserted == 0 {
            log::debug!("Message {} already stored, skipping", message.message_id);
            return Ok(false);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO attachments (message_id, position, filename, mime_type, size_bytes, provider_ref)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, attachment) in message.attachments.iter().enumerate() {
                stmt.execute(params![
                    message.message_id,
                    position as i64,
                    attachment.filename,
                    attachment.mime_type,
                    i64::try_from(attachment.size_bytes).unwrap_or(i64::MAX),
                    attachment.provider_ref,
                ])?;
            }
        }

        tx.commit()?;
        Ok(true)
    })
}

/// All messages of an owner in ingestion order, with attachments.
pub fn find_by_owner(db: &Database, owner: &str) -> Result<Vec<Message>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT {} FROM messages WHERE owner = ?1 ORDER BY seq",
            MESSAGE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut messages = stmt
            .query_map(params![owner], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        attach_all(&mut messages, attachments_for_owner(conn, owner)?);
        Ok(messages)
    })
}

pub fn find_by_id(db: &Database, message_id: &str) -> Result<Option<Message>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT {} FROM messages WHERE message_id = ?1",
            MESSAGE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![message_id], message_from_row)?;
        let mut message = match rows.next() {
            Some(Ok(message)) => message,
            Some(Err(e)) => return Err(DatabaseError::Sqlite(e)),
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            "SELECT message_id, filename, mime_type, size_bytes, provider_ref
             FROM attachments WHERE message_id = ?1 ORDER BY position",
        )?;
        message.attachments = stmt
            .query_map(params![message_id], attachment_from_row)?
            .map(|r| r.map(|(_, attachment)| attachment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(message))
    })
}

/// Sets the priority of one message of `owner`. Returns whether a row changed.
pub fn update_priority(
    db: &Database,
    owner: &str,
    message_id: &str,
    priority: Priority,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE messages SET priority = ?3 WHERE owner = ?1 AND message_id = ?2",
            params![owner, message_id, priority.label()],
        )?;
        Ok(updated > 0)
    })
}

/// Applies several priority updates for one owner atomically.
/// Returns the number of rows changed.
pub fn update_priorities(
    db: &Database,
    owner: &str,
    updates: &[(String, Priority)],
) -> Result<u64, DatabaseError> {
    if updates.is_empty() {
        return Ok(0);
    }

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let mut changed = 0u64;
        {
            let mut stmt = tx.prepare(
                "UPDATE messages SET priority = ?3 WHERE owner = ?1 AND message_id = ?2",
            )?;
            for (message_id, priority) in updates {
                changed += stmt.execute(params![owner, message_id, priority.label()])? as u64;
            }
        }
        tx.commit()?;
        Ok(changed)
    })
}

/// Messages of an owner grouped by computed cluster id.
pub fn smart_threads(db: &Database, owner: &str) -> Result<Vec<ThreadGroup>, DatabaseError> {
    Ok(threading::group_by_computed_thread(find_by_owner(db, owner)?))
}

/// Messages of an owner grouped by the provider's thread id.
pub fn provider_threads(db: &Database, owner: &str) -> Result<Vec<ThreadGroup>, DatabaseError> {
    Ok(threading::group_by_provider_thread(find_by_owner(db, owner)?))
}

/// Case-insensitive substring search over subject, sender, body, summary and
/// priority. Case folding is Unicode-aware. An empty query returns every
/// message of the owner.
pub fn search(db: &Database, owner: &str, query: &str) -> Result<Vec<Message>, DatabaseError> {
    let needle = query.trim().to_lowercase();
    let mut messages = find_by_owner(db, owner)?;
    messages.retain(|m| {
        [
            m.subject.as_str(),
            m.sender.as_str(),
            m.body_excerpt.as_str(),
            m.summary.as_str(),
            m.priority.label(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    });
    Ok(messages)
}

/// Distinct owners with at least one stored message, sorted.
pub fn list_owners(db: &Database) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT DISTINCT owner FROM messages ORDER BY owner")?;
        let owners = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    })
}

pub fn count_by_owner(db: &Database, owner: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE owner = ?1",
            params![owner],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_message(owner: &str, id: &str, subject: &str, thread: &str) -> Message {
        Message {
            message_id: id.to_string(),
            owner: owner.to_string(),
            sender: "Alice <alice@example.com>".to_string(),
            subject: subject.to_string(),
            body_excerpt: "Please review the attached plan".to_string(),
            summary: "Please review the attached plan".to_string(),
            provider_thread_id: Some("prov-1".to_string()),
            computed_thread_id: thread.to_string(),
            category: Category::Work,
            priority: Priority::Medium,
            attachments: vec![],
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let db = test_db();
        let mut message = sample_message("me", "m1", "Plan", "smart-a");
        message.attachments = vec![
            Attachment {
                filename: "plan.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size_bytes: 2048,
                provider_ref: Some("att-1".to_string()),
            },
            Attachment {
                filename: "notes.txt".to_string(),
                mime_type: "text/plain".to_string(),
                size_bytes: 12,
                provider_ref: None,
            },
        ];

        assert!(insert_if_absent(&db, &message).unwrap());
        let found = find_by_id(&db, "m1").unwrap().unwrap();
        assert_eq!(found, message);
    }

    #[test]
    fn test_insert_if_absent_is_a_no_op_for_known_ids() {
        let db = test_db();
        let first = sample_message("me", "m1", "Original", "smart-a");
        let mut second = sample_message("me", "m1", "Changed", "smart-b");
        second.attachments.push(Attachment {
            filename: "x.bin".to_string(),
            mime_type: "application/octet-stream".to_string(),
            size_bytes: 1,
            provider_ref: None,
        });

        assert!(insert_if_absent(&db, &first).unwrap());
        assert!(!insert_if_absent(&db, &second).unwrap());

        let stored = find_by_id(&db, "m1").unwrap().unwrap();
        assert_eq!(stored.subject, "Original");
        assert_eq!(stored.computed_thread_id, "smart-a");
        assert!(stored.attachments.is_empty());
    }

    #[test]
    fn test_exists() {
        let db = test_db();
        assert!(!exists(&db, "m1").unwrap());
        insert_if_absent(&db, &sample_message("me", "m1", "Hi", "smart-a")).unwrap();
        assert!(exists(&db, "m1").unwrap());
    }

    #[test]
    fn test_find_by_owner_keeps_insertion_order_and_scopes_owner() {
        let db = test_db();
        insert_if_absent(&db, &sample_message("me", "z-last-id", "First", "smart-a")).unwrap();
        insert_if_absent(&db, &sample_message("other", "o1", "Theirs", "smart-o")).unwrap();
        insert_if_absent(&db, &sample_message("me", "a-first-id", "Second", "smart-b")).unwrap();

        let mine = find_by_owner(&db, "me").unwrap();
        let subjects: Vec<&str> = mine.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["First", "Second"]);
        assert_eq!(count_by_owner(&db, "me").unwrap(), 2);
        assert_eq!(count_by_owner(&db, "other").unwrap(), 1);
    }

    #[test]
    fn test_update_priority_is_scoped_to_owner() {
        let db = test_db();
        insert_if_absent(&db, &sample_message("me", "m1", "Hi", "smart-a")).unwrap();

        assert!(!update_priority(&db, "someone-else", "m1", Priority::High).unwrap());
        assert!(update_priority(&db, "me", "m1", Priority::High).unwrap());
        assert_eq!(
            find_by_id(&db, "m1").unwrap().unwrap().priority,
            Priority::High
        );
    }

    #[test]
    fn test_update_priorities_batch() {
        let db = test_db();
        insert_if_absent(&db, &sample_message("me", "m1", "A", "smart-a")).unwrap();
        insert_if_absent(&db, &sample_message("me", "m2", "B", "smart-b")).unwrap();

        let changed = update_priorities(
            &db,
            "me",
            &[
                ("m1".to_string(), Priority::High),
                ("m2".to_string(), Priority::Low),
                ("missing".to_string(), Priority::Low),
            ],
        )
        .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(find_by_id(&db, "m2").unwrap().unwrap().priority, Priority::Low);
        assert_eq!(update_priorities(&db, "me", &[]).unwrap(), 0);
    }

    #[test]
    fn test_thread_views() {
        let db = test_db();
        let mut a = sample_message("me", "m1", "Alpha", "smart-a");
        a.provider_thread_id = Some("p1".to_string());
        let mut b = sample_message("me", "m2", "Beta", "smart-b");
        b.provider_thread_id = Some("p1".to_string());
        let mut c = sample_message("me", "m3", "Re: Alpha", "smart-a");
        c.provider_thread_id = None;
        for m in [&a, &b, &c] {
            insert_if_absent(&db, m).unwrap();
        }

        let smart = smart_threads(&db, "me").unwrap();
        assert_eq!(smart.len(), 2);
        assert_eq!(smart[0].thread_id, "smart-a");
        assert_eq!(smart[0].messages.len(), 2);

        let provider = provider_threads(&db, "me").unwrap();
        assert_eq!(provider.len(), 2);
        assert_eq!(provider[0].thread_id, "p1");
        assert_eq!(provider[0].messages.len(), 2);
        assert_eq!(provider[1].thread_id, "");
    }

    #[test]
    fn test_search_matches_fields_case_insensitively() {
        let db = test_db();
        let mut invoice = sample_message("me", "m1", "March INVOICE", "smart-a");
        invoice.body_excerpt = "Amount due".to_string();
        let mut trip = sample_message("me", "m2", "Trip", "smart-b");
        trip.sender = "bookings@travel.example".to_string();
        trip.priority = Priority::High;
        insert_if_absent(&db, &invoice).unwrap();
        insert_if_absent(&db, &trip).unwrap();
        insert_if_absent(&db, &sample_message("other", "o1", "invoice", "smart-o")).unwrap();

        let hits = search(&db, "me", "invoice").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message_id, "m1");

        assert_eq!(search(&db, "me", "TRAVEL").unwrap().len(), 1);
        assert_eq!(search(&db, "me", "high").unwrap()[0].message_id, "m2");
        assert_eq!(search(&db, "me", "").unwrap().len(), 2);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let db = test_db();
        insert_if_absent(&db, &sample_message("me", "m1", "100% done", "smart-a")).unwrap();
        insert_if_absent(&db, &sample_message("me", "m2", "1000 done", "smart-b")).unwrap();

        let hits = search(&db, "me", "100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message_id, "m1");
        assert!(search(&db, "me", "_done").unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let db = test_db();
        let mut report = sample_message("me", "m1", "Rapport des données", "smart-a");
        report.sender = "Équipe <equipe@example.fr>".to_string();
        insert_if_absent(&db, &report).unwrap();

        assert_eq!(search(&db, "me", "DONNÉES").unwrap().len(), 1);
        assert_eq!(search(&db, "me", "équipe").unwrap().len(), 1);
        assert!(search(&db, "me", "donnees").unwrap().is_empty());
    }

    #[test]
    fn test_list_owners() {
        let db = test_db();
        assert!(list_owners(&db).unwrap().is_empty());
        insert_if_absent(&db, &sample_message("zed", "m1", "A", "smart-a")).unwrap();
        insert_if_absent(&db, &sample_message("amy", "m2", "B", "smart-b")).unwrap();
        insert_if_absent(&db, &sample_message("zed", "m3", "C", "smart-c")).unwrap();
        assert_eq!(list_owners(&db).unwrap(), vec!["amy", "zed"]);
    }

    #[test]
    fn test_corrupt_category_is_reported() {
        let db = test_db();
        insert_if_absent(&db, &sample_message("me", "m1", "A", "smart-a")).unwrap();
        db.with_conn(|conn| {
            conn.execute("UPDATE messages SET category = 'Groceries'", [])?;
            Ok(())
        })
        .unwrap();
        assert!(matches!(
            find_by_owner(&db, "me"),
            Err(DatabaseError::Sqlite(_))
        ));
    }
}
