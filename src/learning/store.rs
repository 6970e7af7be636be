//! Learned-pattern store.
//!
//! Persists aggregate accept/reject/modify statistics per matching context
//! and yields a learned confidence and suggested label back to the blender.
//! Updated only by explicit feedback after a household save; read-only
//! during suggestion generation.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::matching::normalize;
use crate::registry::records::Classification;
use crate::types::errors::SuggestResult;
use crate::types::requests::FeedbackSubmission;
use crate::types::responses::{LearningStats, MatchType, MatchTypeStat};

/// Composite key of one learned aggregate. Name parts are normalized so the
/// same family seen through different casings lands on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    pub head_family_name: String,
    pub spouse_family_name: Option<String>,
    pub candidate_family_name: String,
    pub candidate_middle_name: String,
    pub candidate_classification: Classification,
    pub match_type: MatchType,
}

impl PatternKey {
    pub fn new(
        head_family_name: &str,
        spouse_family_name: Option<&str>,
        candidate_family_name: &str,
        candidate_middle_name: &str,
        candidate_classification: Classification,
        match_type: MatchType,
    ) -> Self {
        Self {
            head_family_name: normalize::normalize(head_family_name),
            spouse_family_name: spouse_family_name
                .map(normalize::normalize)
                .filter(|s| !s.is_empty()),
            candidate_family_name: normalize::normalize(candidate_family_name),
            candidate_middle_name: normalize::normalize(candidate_middle_name),
            candidate_classification,
            match_type,
        }
    }

    /// Absent spouse is stored as an empty string so the unique index
    /// treats it as one key (sqlite considers NULLs distinct).
    fn spouse_column(&self) -> &str {
        self.spouse_family_name.as_deref().unwrap_or("")
    }
}

/// Learned hint for one matching context.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedHint {
    pub label: Option<String>,
    pub confidence: f64,
    pub reason: String,
}

/// Outcome of recording one feedback submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub patterns_updated: usize,
    pub patterns_created: usize,
}

/// SQLite-backed store of learned suggestion patterns.
pub struct LearnedPatternStore {
    conn: Connection,
    significance_floor: u32,
}

impl LearnedPatternStore {
    /// Opens or creates the store.
    pub fn open<P: AsRef<Path>>(path: P, significance_floor: u32) -> SuggestResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, significance_floor)
    }

    /// In-memory store (tests).
    pub fn open_in_memory(significance_floor: u32) -> SuggestResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, significance_floor)
    }

    fn with_connection(conn: Connection, significance_floor: u32) -> SuggestResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS learned_patterns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                head_family_name TEXT NOT NULL,
                spouse_family_name TEXT NOT NULL DEFAULT '',
                candidate_family_name TEXT NOT NULL,
                candidate_middle_name TEXT NOT NULL DEFAULT '',
                candidate_classification TEXT NOT NULL,
                match_type TEXT NOT NULL,
                times_shown INTEGER NOT NULL DEFAULT 0,
                times_accepted INTEGER NOT NULL DEFAULT 0,
                times_modified INTEGER NOT NULL DEFAULT 0,
                derived_label TEXT,
                confidence REAL NOT NULL DEFAULT 0.0,
                last_seen TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(head_family_name, spouse_family_name, candidate_family_name,
                       candidate_middle_name, candidate_classification, match_type)
            );

            CREATE TABLE IF NOT EXISTS feedback_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                submission_id TEXT NOT NULL,
                head_family_name TEXT NOT NULL,
                member_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_patterns_head
                ON learned_patterns(head_family_name);
            CREATE INDEX IF NOT EXISTS idx_patterns_match_type
                ON learned_patterns(match_type);
        "#,
        )?;

        Ok(Self {
            conn,
            significance_floor,
        })
    }

    /// Looks up the learned hint for a matching context.
    ///
    /// Returns None when no aggregate exists or when the sample is below
    /// the significance floor; a single early accept must never steer
    /// labels.
    pub fn lookup(&self, key: &PatternKey) -> SuggestResult<Option<LearnedHint>> {
        let row = self
            .conn
            .query_row(
                "SELECT derived_label, confidence, times_shown, times_accepted
                 FROM learned_patterns
                 WHERE head_family_name = ? AND spouse_family_name = ?
                   AND candidate_family_name = ? AND candidate_middle_name = ?
                   AND candidate_classification = ? AND match_type = ?",
                params![
                    key.head_family_name,
                    key.spouse_column(),
                    key.candidate_family_name,
                    key.candidate_middle_name,
                    key.candidate_classification.to_string(),
                    key.match_type.to_string(),
                ],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((label, confidence, shown, accepted)) = row else {
            return Ok(None);
        };

        if shown < self.significance_floor {
            return Ok(None);
        }

        Ok(Some(LearnedHint {
            label,
            confidence,
            reason: format!("accepted {} of {} similar suggestions", accepted, shown),
        }))
    }

    /// Records one feedback submission from the household-save path.
    ///
    /// At-least-once delivery is tolerated; counters are additive. Callers
    /// on the save path must treat failures as fire-and-forget.
    pub fn record(&mut self, feedback: &FeedbackSubmission) -> SuggestResult<RecordOutcome> {
        let now = Utc::now().to_rfc3339();
        let head_family = normalize::normalize(&feedback.head.last_name);
        let spouse_family = feedback
            .spouse
            .as_ref()
            .map(|s| s.last_name.as_str())
            .filter(|s| !s.trim().is_empty());

        let mut outcome = RecordOutcome::default();

        for shown in &feedback.shown {
            let key = PatternKey::new(
                &feedback.head.last_name,
                spouse_family,
                &shown.candidate_family_name,
                &shown.candidate_middle_name,
                shown.classification,
                shown.match_type,
            );

            let was_modified = feedback
                .modified
                .iter()
                .any(|m| m.source == shown.source && m.person_id == shown.person_id);
            // A relabeled suggestion still joined the household.
            let was_accepted = was_modified
                || feedback
                    .accepted
                    .iter()
                    .any(|a| a.source == shown.source && a.person_id == shown.person_id);

            let final_label = if was_accepted {
                self.final_label_for(feedback, shown.source, shown.person_id)
                    .or_else(|| shown.suggested_label.clone())
            } else {
                None
            };

            let created = self.upsert_pattern(&key, was_accepted, was_modified, final_label, &now)?;
            if created {
                outcome.patterns_created += 1;
            } else {
                outcome.patterns_updated += 1;
            }
        }

        self.conn.execute(
            "INSERT INTO feedback_submissions (submission_id, head_family_name,
                                               member_count, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                feedback.submission_id,
                head_family,
                feedback.final_members.len() as i64,
                now
            ],
        )?;

        Ok(outcome)
    }

    fn final_label_for(
        &self,
        feedback: &FeedbackSubmission,
        source: crate::registry::records::RegistrySource,
        person_id: i64,
    ) -> Option<String> {
        if let Some(modified) = feedback
            .modified
            .iter()
            .find(|m| m.source == source && m.person_id == person_id)
        {
            return Some(modified.final_label.clone());
        }
        feedback
            .final_members
            .iter()
            .find(|m| m.source == source && m.person_id == person_id)
            .map(|m| m.relationship_label.clone())
    }

    fn upsert_pattern(
        &mut self,
        key: &PatternKey,
        accepted: bool,
        modified: bool,
        final_label: Option<String>,
        now: &str,
    ) -> SuggestResult<bool> {
        let acc = if accepted { 1 } else { 0 };
        let modi = if modified { 1 } else { 0 };

        let updated = self.conn.execute(
            "UPDATE learned_patterns
             SET times_shown = times_shown + 1,
                 times_accepted = times_accepted + ?1,
                 times_modified = times_modified + ?2,
                 derived_label = COALESCE(?3, derived_label),
                 confidence = CAST(times_accepted + ?1 AS REAL) / (times_shown + 1),
                 last_seen = ?4
             WHERE head_family_name = ?5 AND spouse_family_name = ?6
               AND candidate_family_name = ?7 AND candidate_middle_name = ?8
               AND candidate_classification = ?9 AND match_type = ?10",
            params![
                acc,
                modi,
                final_label,
                now,
                key.head_family_name,
                key.spouse_column(),
                key.candidate_family_name,
                key.candidate_middle_name,
                key.candidate_classification.to_string(),
                key.match_type.to_string(),
            ],
        )?;

        if updated == 0 {
            self.conn.execute(
                "INSERT INTO learned_patterns (head_family_name, spouse_family_name,
                     candidate_family_name, candidate_middle_name,
                     candidate_classification, match_type,
                     times_shown, times_accepted, times_modified,
                     derived_label, confidence, last_seen, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?)",
                params![
                    key.head_family_name,
                    key.spouse_column(),
                    key.candidate_family_name,
                    key.candidate_middle_name,
                    key.candidate_classification.to_string(),
                    key.match_type.to_string(),
                    acc,
                    modi,
                    final_label,
                    acc as f64,
                    now,
                    now,
                ],
            )?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Read-only aggregate exposed for transparency; never used for ranking.
    pub fn statistics(&self) -> SuggestResult<LearningStats> {
        let (total_families, total_members): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(member_count), 0) FROM feedback_submissions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let (total_shown, total_accepted): (u64, u64) = self.conn.query_row(
            "SELECT COALESCE(SUM(times_shown), 0), COALESCE(SUM(times_accepted), 0)
             FROM learned_patterns",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let overall_accuracy = if total_shown > 0 {
            total_accepted as f64 / total_shown as f64
        } else {
            0.0
        };

        let mut stmt = self.conn.prepare(
            "SELECT match_type, SUM(times_shown) AS shown,
                    CAST(SUM(times_accepted) AS REAL) / SUM(times_shown)
             FROM learned_patterns
             GROUP BY match_type
             HAVING shown > 0
             ORDER BY shown DESC, match_type ASC
             LIMIT 5",
        )?;

        let top_match_types: Vec<MatchTypeStat> = stmt
            .query_map([], |row| {
                Ok(MatchTypeStat {
                    match_type: row.get(0)?,
                    times_shown: row.get(1)?,
                    accuracy: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        let derived_rule_count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM learned_patterns WHERE times_shown >= ?",
            params![self.significance_floor],
            |row| row.get(0),
        )?;

        Ok(LearningStats {
            total_families,
            total_members,
            overall_accuracy,
            total_shown,
            total_accepted,
            top_match_types,
            derived_rule_count,
        })
    }
}
