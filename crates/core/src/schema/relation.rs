//! Relation declarations between tables.
//!
//! Relations name their target by table name only; the catalog resolves the
//! name at query time, so tables may reference each other in cycles.

use alloc::string::String;
use core::fmt;

/// The four relationship kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Local record holds a foreign key pointing to one target record.
    BelongsTo,
    /// Exactly one target record holds a foreign key pointing back.
    HasOne,
    /// Zero or more target records hold a foreign key pointing back.
    HasMany,
    /// Association through a junction table.
    ManyToMany,
}

impl RelationKind {
    /// Returns the short schema keyword (`BT`, `H1`, `HM`, `MTM`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "BT",
            RelationKind::HasOne => "H1",
            RelationKind::HasMany => "HM",
            RelationKind::ManyToMany => "MTM",
        }
    }

    /// Parses a short schema keyword.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "BT" => Some(RelationKind::BelongsTo),
            "H1" => Some(RelationKind::HasOne),
            "HM" => Some(RelationKind::HasMany),
            "MTM" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }

    /// Returns whether an include of this kind yields one record or a list.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationKind::BelongsTo | RelationKind::HasOne => Cardinality::Singular,
            RelationKind::HasMany | RelationKind::ManyToMany => Cardinality::Plural,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of an included relation in a result row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one related record.
    Singular,
    /// A list of related records.
    Plural,
}

/// A relation declaration on a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    /// `foreign_key` is a column of the owning table.
    BelongsTo {
        name: String,
        table: String,
        foreign_key: String,
    },
    /// `foreign_key` is a column of the target table.
    HasOne {
        name: String,
        table: String,
        foreign_key: String,
    },
    /// `foreign_key` is a column of the target table.
    HasMany {
        name: String,
        table: String,
        foreign_key: String,
    },
    /// `local_key` and `remote_key` are columns of the `through` table.
    ManyToMany {
        name: String,
        table: String,
        through: String,
        local_key: String,
        remote_key: String,
    },
}

impl Relation {
    /// Declares a belongs-to relation.
    pub fn belongs_to(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Relation::BelongsTo {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Declares a has-one relation.
    pub fn has_one(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Relation::HasOne {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Declares a has-many relation.
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Relation::HasMany {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Declares a many-to-many relation through a junction table.
    pub fn many_to_many(
        name: impl Into<String>,
        table: impl Into<String>,
        through: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Relation::ManyToMany {
            name: name.into(),
            table: table.into(),
            through: through.into(),
            local_key: local_key.into(),
            remote_key: remote_key.into(),
        }
    }

    /// Returns the include alias.
    pub fn name(&self) -> &str {
        match self {
            Relation::BelongsTo { name, .. }
            | Relation::HasOne { name, .. }
            | Relation::HasMany { name, .. }
            | Relation::ManyToMany { name, .. } => name,
        }
    }

    /// Returns the target table name.
    pub fn target(&self) -> &str {
        match self {
            Relation::BelongsTo { table, .. }
            | Relation::HasOne { table, .. }
            | Relation::HasMany { table, .. }
            | Relation::ManyToMany { table, .. } => table,
        }
    }

    /// Returns the relation kind.
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::BelongsTo { .. } => RelationKind::BelongsTo,
            Relation::HasOne { .. } => RelationKind::HasOne,
            Relation::HasMany { .. } => RelationKind::HasMany,
            Relation::ManyToMany { .. } => RelationKind::ManyToMany,
        }
    }

    /// Returns the junction table for many-to-many relations.
    pub fn junction(&self) -> Option<&str> {
        match self {
            Relation::ManyToMany { through, .. } => Some(through),
            _ => None,
        }
    }

    /// Returns the cardinality of an include over this relation.
    #[inline]
    pub fn cardinality(&self) -> Cardinality {
        self.kind().cardinality()
    }
}
