//! Registry reader.
//!
//! Fetches candidate person records from the three independent registries,
//! the union registry and the household links, scoped by the caller's
//! jurisdiction. Name fields come back encrypted and are decrypted per field
//! through the [`FieldCipher`] collaborator; records whose matching names
//! cannot be decrypted are skipped, not surfaced as errors.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use crate::registry::decrypt::{essential_field, nullable_field, optional_field, FieldCipher};
use crate::registry::records::{
    ChildRecord, Classification, JurisdictionFilter, Location, PersonRecord, RegistrySource,
};
use crate::types::errors::SuggestResult;

/// Candidate pool drawn from the three registries for one request.
#[derive(Debug, Default)]
pub struct CandidatePool {
    pub adults: Vec<PersonRecord>,
    pub children_a: Vec<ChildRecord>,
    pub children_b: Vec<ChildRecord>,
}

/// Read-only view over the registry database.
pub struct RegistryReader {
    conn: Connection,
    cipher: Arc<dyn FieldCipher>,
}

impl RegistryReader {
    /// Opens the registry database.
    pub fn open<P: AsRef<Path>>(path: P, cipher: Arc<dyn FieldCipher>) -> SuggestResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn, cipher })
    }

    /// Opens an in-memory database (tests and init).
    pub fn open_in_memory(cipher: Arc<dyn FieldCipher>) -> SuggestResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, cipher })
    }

    /// Creates the registry tables if they do not exist.
    ///
    /// The two dependent registries are optional in deployments; readers
    /// must work whether or not these tables are present.
    pub fn create_schema(&self) -> SuggestResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS adults (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                middle_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL,
                registry_number TEXT NOT NULL DEFAULT '',
                classification TEXT NOT NULL,
                jurisdiction_key TEXT NOT NULL,
                area TEXT,
                sub_area TEXT
            );

            CREATE TABLE IF NOT EXISTS children_a (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                middle_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL,
                registry_number TEXT NOT NULL DEFAULT '',
                classification TEXT NOT NULL DEFAULT 'minor_dependent',
                jurisdiction_key TEXT NOT NULL,
                area TEXT,
                sub_area TEXT,
                father_first_name TEXT,
                father_last_name TEXT,
                mother_first_name TEXT,
                mother_maiden_name TEXT,
                mother_married_name TEXT
            );

            CREATE TABLE IF NOT EXISTS children_b (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                middle_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL,
                registry_number TEXT NOT NULL DEFAULT '',
                classification TEXT NOT NULL DEFAULT 'minor_dependent',
                jurisdiction_key TEXT NOT NULL,
                area TEXT,
                sub_area TEXT,
                father_first_name TEXT,
                father_last_name TEXT,
                mother_first_name TEXT,
                mother_maiden_name TEXT,
                mother_married_name TEXT
            );

            CREATE TABLE IF NOT EXISTS household_links (
                household_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                person_id INTEGER NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS unions (
                id INTEGER PRIMARY KEY,
                husband_id INTEGER NOT NULL,
                wife_id INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_links_person ON household_links(source, person_id);
            CREATE INDEX IF NOT EXISTS idx_unions_husband ON unions(husband_id);
            CREATE INDEX IF NOT EXISTS idx_unions_wife ON unions(wife_id);
        "#,
        )?;
        Ok(())
    }

    /// Loads one adult record by id.
    pub fn load_person(&self, id: i64) -> SuggestResult<Option<PersonRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, first_name, middle_name, last_name, registry_number,
                        classification, jurisdiction_key, area, sub_area
                 FROM adults WHERE id = ?",
                params![id],
                |row| RawAdult::from_row(row),
            )
            .optional()?;

        Ok(row.and_then(|raw| raw.into_record(self.cipher.as_ref())))
    }

    /// Loads the candidate pool within the caller's jurisdiction.
    pub fn load_candidates(&self, filter: &JurisdictionFilter) -> SuggestResult<CandidatePool> {
        let adults = self.load_adults(filter)?;
        let children_a = self.load_children(RegistrySource::ChildrenA, filter)?;
        let children_b = self.load_children(RegistrySource::ChildrenB, filter)?;

        tracing::debug!(
            adults = adults.len(),
            children_a = children_a.len(),
            children_b = children_b.len(),
            "candidate pool loaded"
        );

        Ok(CandidatePool {
            adults,
            children_a,
            children_b,
        })
    }

    /// Persons already claimed by any non-deleted household link.
    pub fn load_exclusion_set(&self) -> SuggestResult<HashSet<(RegistrySource, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, person_id FROM household_links WHERE deleted = 0")?;

        let set = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(source, id)| Some((parse_source(&source)?, id)))
            .collect();

        Ok(set)
    }

    /// Partner of the head in the union registry, if any.
    pub fn load_union_partner(&self, head_id: i64) -> SuggestResult<Option<i64>> {
        let partner = self
            .conn
            .query_row(
                "SELECT CASE WHEN husband_id = ?1 THEN wife_id ELSE husband_id END
                 FROM unions WHERE husband_id = ?1 OR wife_id = ?1",
                params![head_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(partner)
    }

    fn load_adults(&self, filter: &JurisdictionFilter) -> SuggestResult<Vec<PersonRecord>> {
        let (clause, param) = jurisdiction_clause(filter);
        let sql = format!(
            "SELECT id, first_name, middle_name, last_name, registry_number,
                    classification, jurisdiction_key, area, sub_area
             FROM adults{} ORDER BY id",
            clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<RawAdult> = match &param {
            Some(value) => stmt.query_map(params![value], RawAdult::from_row)?,
            None => stmt.query_map([], RawAdult::from_row)?,
        }
        .filter_map(|r| r.ok())
        .collect();

        Ok(rows
            .into_iter()
            .filter_map(|raw| raw.into_record(self.cipher.as_ref()))
            .collect())
    }

    fn load_children(
        &self,
        source: RegistrySource,
        filter: &JurisdictionFilter,
    ) -> SuggestResult<Vec<ChildRecord>> {
        let table = match source {
            RegistrySource::ChildrenA => "children_a",
            RegistrySource::ChildrenB => "children_b",
            RegistrySource::Adults => return Ok(Vec::new()),
        };

        let (clause, param) = jurisdiction_clause(filter);
        let sql = format!(
            "SELECT id, first_name, middle_name, last_name, registry_number,
                    classification, jurisdiction_key,
                    father_first_name, father_last_name,
                    mother_first_name, mother_maiden_name, mother_married_name
             FROM {}{} ORDER BY id",
            table, clause
        );

        let mut stmt = match self.conn.prepare(&sql) {
            Ok(stmt) => stmt,
            // An absent dependent registry is an empty result set, not an error.
            Err(e) if is_missing_table(&e) => {
                tracing::debug!(table, "dependent registry absent, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let rows: Vec<RawChild> = match &param {
            Some(value) => stmt.query_map(params![value], RawChild::from_row)?,
            None => stmt.query_map([], RawChild::from_row)?,
        }
        .filter_map(|r| r.ok())
        .collect();

        Ok(rows
            .into_iter()
            .filter_map(|raw| raw.into_record(source, self.cipher.as_ref()))
            .collect())
    }
}

fn jurisdiction_clause(filter: &JurisdictionFilter) -> (&'static str, Option<String>) {
    match filter {
        JurisdictionFilter::Global => ("", None),
        JurisdictionFilter::Area(area) => (" WHERE area = ?", Some(area.clone())),
        JurisdictionFilter::SubArea(sub_area) => (" WHERE sub_area = ?", Some(sub_area.clone())),
    }
}

fn is_missing_table(e: &rusqlite::Error) -> bool {
    e.to_string().contains("no such table")
}

fn parse_source(tag: &str) -> Option<RegistrySource> {
    match tag {
        "adults" => Some(RegistrySource::Adults),
        "children_a" => Some(RegistrySource::ChildrenA),
        "children_b" => Some(RegistrySource::ChildrenB),
        _ => None,
    }
}

/// Adult row before decryption.
struct RawAdult {
    id: i64,
    first_name: String,
    middle_name: String,
    last_name: String,
    registry_number: String,
    classification: String,
    jurisdiction_key: String,
    area: Option<String>,
    sub_area: Option<String>,
}

impl RawAdult {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            middle_name: row.get(2)?,
            last_name: row.get(3)?,
            registry_number: row.get(4)?,
            classification: row.get(5)?,
            jurisdiction_key: row.get(6)?,
            area: row.get(7)?,
            sub_area: row.get(8)?,
        })
    }

    fn into_record(self, cipher: &dyn FieldCipher) -> Option<PersonRecord> {
        let key = &self.jurisdiction_key;

        let first_name = match essential_field(cipher, "first_name", &self.first_name, key) {
            Ok(name) => name,
            Err(reason) => {
                tracing::warn!(id = self.id, ?reason, "skipping adult record");
                return None;
            }
        };
        let last_name = match essential_field(cipher, "last_name", &self.last_name, key) {
            Ok(name) => name,
            Err(reason) => {
                tracing::warn!(id = self.id, ?reason, "skipping adult record");
                return None;
            }
        };

        let middle_name = optional_field(cipher, "middle_name", &self.middle_name, key);
        let registry_number = optional_field(cipher, "registry_number", &self.registry_number, key);

        let location = match (self.area, self.sub_area) {
            (Some(area), Some(sub_area)) => Some(Location { area, sub_area }),
            _ => None,
        };

        Some(PersonRecord {
            id: self.id,
            first_name,
            middle_name,
            last_name,
            registry_number,
            classification: Classification::from_tag(&self.classification),
            jurisdiction_key: self.jurisdiction_key,
            location,
        })
    }
}

/// Dependent row before decryption.
struct RawChild {
    id: i64,
    first_name: String,
    middle_name: String,
    last_name: String,
    registry_number: String,
    classification: String,
    jurisdiction_key: String,
    father_first_name: Option<String>,
    father_last_name: Option<String>,
    mother_first_name: Option<String>,
    mother_maiden_name: Option<String>,
    mother_married_name: Option<String>,
}

impl RawChild {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            middle_name: row.get(2)?,
            last_name: row.get(3)?,
            registry_number: row.get(4)?,
            classification: row.get(5)?,
            jurisdiction_key: row.get(6)?,
            father_first_name: row.get(7)?,
            father_last_name: row.get(8)?,
            mother_first_name: row.get(9)?,
            mother_maiden_name: row.get(10)?,
            mother_married_name: row.get(11)?,
        })
    }

    fn into_record(self, source: RegistrySource, cipher: &dyn FieldCipher) -> Option<ChildRecord> {
        let key = &self.jurisdiction_key;

        let first_name = match essential_field(cipher, "first_name", &self.first_name, key) {
            Ok(name) => name,
            Err(reason) => {
                tracing::warn!(id = self.id, %source, ?reason, "skipping dependent record");
                return None;
            }
        };
        let last_name = match essential_field(cipher, "last_name", &self.last_name, key) {
            Ok(name) => name,
            Err(reason) => {
                tracing::warn!(id = self.id, %source, ?reason, "skipping dependent record");
                return None;
            }
        };

        Some(ChildRecord {
            id: self.id,
            source,
            first_name,
            last_name,
            middle_name: optional_field(cipher, "middle_name", &self.middle_name, key),
            registry_number: optional_field(cipher, "registry_number", &self.registry_number, key),
            classification: Classification::from_tag(&self.classification),
            father_first_name: nullable_field(cipher, self.father_first_name.as_deref(), key),
            father_last_name: nullable_field(cipher, self.father_last_name.as_deref(), key),
            mother_first_name: nullable_field(cipher, self.mother_first_name.as_deref(), key),
            mother_maiden_name: nullable_field(cipher, self.mother_maiden_name.as_deref(), key),
            mother_married_name: nullable_field(cipher, self.mother_married_name.as_deref(), key),
            jurisdiction_key: self.jurisdiction_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::decrypt::{DecryptionError, PlainCipher};

    fn test_reader() -> RegistryReader {
        let reader = RegistryReader::open_in_memory(Arc::new(PlainCipher)).unwrap();
        reader.create_schema().unwrap();
        reader
    }

    fn insert_adult(reader: &RegistryReader, id: i64, first: &str, last: &str, area: &str) {
        reader
            .conn
            .execute(
                "INSERT INTO adults (id, first_name, middle_name, last_name, registry_number,
                                     classification, jurisdiction_key, area, sub_area)
                 VALUES (?, ?, '', ?, '', 'adult_independent', 'd1', ?, 'z1')",
                params![id, first, last, area],
            )
            .unwrap();
    }

    #[test]
    fn test_load_person_absent() {
        let reader = test_reader();
        assert!(reader.load_person(99).unwrap().is_none());
    }

    #[test]
    fn test_jurisdiction_area_filter() {
        let reader = test_reader();
        insert_adult(&reader, 1, "Pedro", "Santos", "a1");
        insert_adult(&reader, 2, "Juan", "Cruz", "a2");

        let pool = reader
            .load_candidates(&JurisdictionFilter::Area("a1".to_string()))
            .unwrap();
        assert_eq!(pool.adults.len(), 1);
        assert_eq!(pool.adults[0].id, 1);

        let all = reader.load_candidates(&JurisdictionFilter::Global).unwrap();
        assert_eq!(all.adults.len(), 2);
    }

    #[test]
    fn test_missing_dependent_registry_is_empty() {
        let reader = RegistryReader::open_in_memory(Arc::new(PlainCipher)).unwrap();
        // Only the adult registry exists in this deployment.
        reader
            .conn
            .execute_batch(
                "CREATE TABLE adults (
                    id INTEGER PRIMARY KEY, first_name TEXT NOT NULL,
                    middle_name TEXT NOT NULL DEFAULT '', last_name TEXT NOT NULL,
                    registry_number TEXT NOT NULL DEFAULT '',
                    classification TEXT NOT NULL, jurisdiction_key TEXT NOT NULL,
                    area TEXT, sub_area TEXT
                 );",
            )
            .unwrap();

        let pool = reader.load_candidates(&JurisdictionFilter::Global).unwrap();
        assert!(pool.children_a.is_empty());
        assert!(pool.children_b.is_empty());
    }

    #[test]
    fn test_exclusion_set_skips_deleted_links() {
        let reader = test_reader();
        reader
            .conn
            .execute_batch(
                "INSERT INTO household_links (household_id, source, person_id, deleted)
                 VALUES (1, 'adults', 10, 0), (1, 'children_a', 20, 0), (2, 'adults', 30, 1);",
            )
            .unwrap();

        let set = reader.load_exclusion_set().unwrap();
        assert!(set.contains(&(RegistrySource::Adults, 10)));
        assert!(set.contains(&(RegistrySource::ChildrenA, 20)));
        assert!(!set.contains(&(RegistrySource::Adults, 30)));
    }

    #[test]
    fn test_union_partner_either_side() {
        let reader = test_reader();
        reader
            .conn
            .execute(
                "INSERT INTO unions (id, husband_id, wife_id) VALUES (1, 5, 6)",
                [],
            )
            .unwrap();

        assert_eq!(reader.load_union_partner(5).unwrap(), Some(6));
        assert_eq!(reader.load_union_partner(6).unwrap(), Some(5));
        assert_eq!(reader.load_union_partner(7).unwrap(), None);
    }

    /// Cipher failing on a marker prefix.
    struct MarkerCipher;

    impl FieldCipher for MarkerCipher {
        fn decrypt(&self, ciphertext: &str, _key: &str) -> Result<String, DecryptionError> {
            if ciphertext.starts_with("!!") {
                Err(DecryptionError::new("marked"))
            } else {
                Ok(ciphertext.to_string())
            }
        }
    }

    #[test]
    fn test_unreadable_matching_name_skips_record() {
        let reader = RegistryReader::open_in_memory(Arc::new(MarkerCipher)).unwrap();
        reader.create_schema().unwrap();
        insert_adult(&reader, 1, "Pedro", "!!garbled", "a1");
        insert_adult(&reader, 2, "Juan", "Cruz", "a1");

        let pool = reader.load_candidates(&JurisdictionFilter::Global).unwrap();
        assert_eq!(pool.adults.len(), 1);
        assert_eq!(pool.adults[0].id, 2);
    }

    #[test]
    fn test_unreadable_display_field_renders_empty() {
        let reader = RegistryReader::open_in_memory(Arc::new(MarkerCipher)).unwrap();
        reader.create_schema().unwrap();
        reader
            .conn
            .execute(
                "INSERT INTO adults (id, first_name, middle_name, last_name, registry_number,
                                     classification, jurisdiction_key, area, sub_area)
                 VALUES (1, 'Pedro', '!!x', 'Santos', '!!y', 'adult_independent', 'd1', 'a1', 'z1')",
                [],
            )
            .unwrap();

        let person = reader.load_person(1).unwrap().unwrap();
        assert_eq!(person.middle_name, "");
        assert_eq!(person.registry_number, "");
        assert_eq!(person.last_name, "Santos");
    }
}
