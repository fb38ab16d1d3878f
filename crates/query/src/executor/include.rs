//! Include resolution.
//!
//! Joins a base record set to the records related through named relations.
//! Each join is a hash join with the base ids as the build side: the target
//! table (or junction table) is scanned once and matching rows are grouped
//! under the base id they point at. Tables are scanned in id order, so every
//! group is ordered by target id.

use crate::context::ExecutionContext;
use crate::result::Included;
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use cairn_core::schema::{Cardinality, Relation, RelationKind, Table};
use cairn_core::{Error, Record, Result, Value};
use hashbrown::{HashMap, HashSet};

/// Related records of one include, grouped by base record id.
#[derive(Clone, Debug)]
pub struct IncludeResult {
    name: String,
    kind: RelationKind,
    target_table: String,
    groups: HashMap<Value, Vec<Rc<Record>>>,
}

impl IncludeResult {
    /// Returns the include name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the relation kind.
    #[inline]
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Returns the table the related records live in.
    #[inline]
    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    /// Returns whether this include attaches one record or a list.
    #[inline]
    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }

    /// Records related to one base record, in target id order.
    pub fn related(&self, base_id: &Value) -> &[Rc<Record>] {
        self.groups.get(base_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of the records related to one base record.
    pub fn related_ids(&self, base_id: &Value) -> Vec<&Value> {
        self.related(base_id)
            .iter()
            .filter_map(|record| record.id())
            .collect()
    }

    /// Shapes the related records of one base record.
    ///
    /// Singular includes take the first match, which is the one with the
    /// lowest id when several records match.
    pub fn attach(&self, base_id: Option<&Value>) -> Included {
        let related = base_id.map(|id| self.related(id)).unwrap_or(&[]);
        match self.cardinality() {
            Cardinality::Singular => Included::One(related.first().cloned()),
            Cardinality::Plural => Included::Many(related.to_vec()),
        }
    }
}

/// Resolves every requested include of `table` for the base records.
///
/// Fails with [`Error::UnknownRelation`] if a name is not declared on the
/// table, even when there are no base records.
pub fn resolve_includes(
    ctx: &ExecutionContext<'_>,
    table: &Table,
    base: &[Rc<Record>],
    names: &[String],
) -> Result<Vec<IncludeResult>> {
    let base_ids: HashSet<&Value> = base.iter().filter_map(|r| r.id()).collect();
    let mut results = Vec::with_capacity(names.len());

    for name in names {
        let relation = table
            .get_relation(name)
            .ok_or_else(|| Error::unknown_relation(table.name(), name.as_str()))?;
        ctx.table(relation.target())?;

        let groups = match relation {
            Relation::BelongsTo { foreign_key, .. } => {
                join_belongs_to(ctx, relation.target(), base, foreign_key)?
            }
            Relation::HasOne { foreign_key, .. } | Relation::HasMany { foreign_key, .. } => {
                join_foreign_key(ctx, relation.target(), &base_ids, foreign_key)?
            }
            Relation::ManyToMany {
                through,
                local_key,
                remote_key,
                ..
            } => join_through(ctx, relation.target(), &base_ids, through, local_key, remote_key)?,
        };

        tracing::trace!(
            table = table.name(),
            include = name.as_str(),
            kind = %relation.kind(),
            matched = groups.len(),
            "include resolved"
        );

        results.push(IncludeResult {
            name: name.clone(),
            kind: relation.kind(),
            target_table: String::from(relation.target()),
            groups,
        });
    }

    Ok(results)
}

/// The base record holds the key: look each one up in the target table.
fn join_belongs_to(
    ctx: &ExecutionContext<'_>,
    target: &str,
    base: &[Rc<Record>],
    foreign_key: &str,
) -> Result<HashMap<Value, Vec<Rc<Record>>>> {
    ctx.store().with_table(target, |state| {
        let mut groups: HashMap<Value, Vec<Rc<Record>>> = HashMap::new();
        for record in base {
            let (Some(id), Some(key)) = (record.id(), record.get(foreign_key)) else {
                continue;
            };
            if let Some(related) = state.get(key) {
                groups.entry(id.clone()).or_default().push(related.clone());
            }
        }
        groups
    })
}

/// The target records hold the key: scan them once and probe the base ids.
fn join_foreign_key(
    ctx: &ExecutionContext<'_>,
    target: &str,
    base_ids: &HashSet<&Value>,
    foreign_key: &str,
) -> Result<HashMap<Value, Vec<Rc<Record>>>> {
    ctx.store().with_table(target, |state| {
        let mut groups: HashMap<Value, Vec<Rc<Record>>> = HashMap::new();
        if base_ids.is_empty() {
            return groups;
        }
        for related in state.iter() {
            if let Some(key) = related.get(foreign_key) {
                if base_ids.contains(key) {
                    groups.entry(key.clone()).or_default().push(related.clone());
                }
            }
        }
        groups
    })
}

/// Scan the junction for links out of the base ids, then resolve the
/// remote ids against the target table. Duplicate links collapse and
/// links to missing target records are skipped.
fn join_through(
    ctx: &ExecutionContext<'_>,
    target: &str,
    base_ids: &HashSet<&Value>,
    through: &str,
    local_key: &str,
    remote_key: &str,
) -> Result<HashMap<Value, Vec<Rc<Record>>>> {
    let links = ctx.store().with_table(through, |junction| {
        let mut links: HashMap<Value, BTreeSet<Value>> = HashMap::new();
        if base_ids.is_empty() {
            return links;
        }
        for row in junction.iter() {
            let (Some(local), Some(remote)) = (row.get(local_key), row.get(remote_key)) else {
                continue;
            };
            if base_ids.contains(local) && remote.is_valid_id() {
                links.entry(local.clone()).or_default().insert(remote.clone());
            }
        }
        links
    })?;

    ctx.store().with_table(target, |state| {
        links
            .into_iter()
            .map(|(local, remotes)| {
                let related: Vec<Rc<Record>> = remotes
                    .iter()
                    .filter_map(|remote| state.get(remote).cloned())
                    .collect();
                (local, related)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::schema::{Catalog, Schema, TableBuilder};
    use cairn_core::ColumnType;
    use alloc::vec;
    use cairn_storage::Store;

    fn catalog() -> Catalog {
        let masters = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_relation(Relation::many_to_many(
                "viewports",
                "Viewports",
                "MasterViewportJunction",
                "masterId",
                "viewportId",
            ))
            .unwrap()
            .add_relation(Relation::has_many("notes", "Notes", "masterId"))
            .unwrap()
            .add_relation(Relation::has_one("note", "Notes", "masterId"))
            .unwrap()
            .build()
            .unwrap();
        let viewports = TableBuilder::new("Viewports")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        let notes = TableBuilder::new("Notes")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("masterId", ColumnType::String)
            .unwrap()
            .add_relation(Relation::belongs_to("master", "Masters", "masterId"))
            .unwrap()
            .build()
            .unwrap();
        Catalog::new(Schema::new("app").table(masters).table(viewports).table(notes)).unwrap()
    }

    fn put(store: &Store, table: &str, record: Record) {
        store.write_record(table, record).unwrap();
    }

    fn link(store: &Store, master: &str, viewport: &str) {
        let id = alloc::format!("{}.{}", master, viewport);
        put(
            store,
            "MasterViewportJunction",
            Record::new()
                .with("id", id)
                .with("masterId", master)
                .with("viewportId", viewport),
        );
    }

    #[test]
    fn test_many_to_many() {
        let catalog = catalog();
        let store = Store::from_catalog(&catalog);
        put(&store, "Masters", Record::new().with("id", "m1"));
        put(&store, "Viewports", Record::new().with("id", "v2"));
        put(&store, "Viewports", Record::new().with("id", "v1"));
        link(&store, "m1", "v2");
        link(&store, "m1", "v1");
        link(&store, "m1", "missing");

        let ctx = ExecutionContext::new(&catalog, &store);
        let base = store.records("Masters").unwrap();
        let table = catalog.table("Masters").unwrap();
        let results = resolve_includes(&ctx, table, &base, &vec!["viewports".into()]).unwrap();

        let m1 = Value::from("m1");
        assert_eq!(results[0].target_table(), "Viewports");
        assert_eq!(results[0].kind(), RelationKind::ManyToMany);
        assert_eq!(
            results[0].related_ids(&m1),
            [&Value::from("v1"), &Value::from("v2")]
        );
    }

    #[test]
    fn test_has_many_and_has_one() {
        let catalog = catalog();
        let store = Store::from_catalog(&catalog);
        put(&store, "Masters", Record::new().with("id", "m1"));
        put(&store, "Masters", Record::new().with("id", "m2"));
        for (id, master) in [("n3", "m1"), ("n1", "m1"), ("n2", "m2")] {
            put(&store, "Notes", Record::new().with("id", id).with("masterId", master));
        }

        let ctx = ExecutionContext::new(&catalog, &store);
        let base = store.records("Masters").unwrap();
        let table = catalog.table("Masters").unwrap();
        let results =
            resolve_includes(&ctx, table, &base, &vec!["notes".into(), "note".into()]).unwrap();

        let m1 = Value::from("m1");
        assert_eq!(
            results[0].related_ids(&m1),
            [&Value::from("n1"), &Value::from("n3")]
        );
        match results[1].attach(Some(&m1)) {
            Included::One(Some(note)) => assert_eq!(note.id(), Some(&Value::from("n1"))),
            other => panic!("unexpected include {:?}", other),
        }
    }

    #[test]
    fn test_belongs_to() {
        let catalog = catalog();
        let store = Store::from_catalog(&catalog);
        put(&store, "Masters", Record::new().with("id", "m1"));
        put(&store, "Notes", Record::new().with("id", "n1").with("masterId", "m1"));
        put(&store, "Notes", Record::new().with("id", "n2").with("masterId", "gone"));

        let ctx = ExecutionContext::new(&catalog, &store);
        let base = store.records("Notes").unwrap();
        let table = catalog.table("Notes").unwrap();
        let results = resolve_includes(&ctx, table, &base, &vec!["master".into()]).unwrap();

        assert_eq!(
            results[0].attach(Some(&Value::from("n1"))).one().and_then(|r| r.id()),
            Some(&Value::from("m1"))
        );
        assert_eq!(results[0].attach(Some(&Value::from("n2"))), Included::One(None));
    }

    #[test]
    fn test_unknown_relation_with_empty_base() {
        let catalog = catalog();
        let store = Store::from_catalog(&catalog);
        let ctx = ExecutionContext::new(&catalog, &store);
        let table = catalog.table("Viewports").unwrap();
        let err = resolve_includes(&ctx, table, &[], &vec!["masters".into()]).unwrap_err();
        assert_eq!(err, Error::unknown_relation("Viewports", "masters"));
    }
}
