//! Relation metadata between tables.
//!
//! Every foreign key produces a pair of relations: a [`RelationOne`] on the
//! referencing ("many") table and its reciprocal [`RelationMany`] on the
//! referenced ("one") table. Link tables additionally produce a
//! [`RelationManyMany`] shortcut on each of their two endpoints.
//!
//! All table references are real table names. Instances are linked by
//! index inside a query result, never through these structs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Many-to-one: many `invoice` rows belong to one `salesreps` row.
    ManyToOne,
    /// One-to-many: one `salesreps` row has many `invoice` rows.
    OneToMany,
    /// Many-to-many: `clients` have many `cars` via a link table.
    ManyToMany,
}

impl RelationKind {
    /// Cardinality marker used in join comments.
    pub const fn marker(self) -> &'static str {
        match self {
            RelationKind::ManyToOne => "N:1",
            RelationKind::OneToMany => "1:N",
            RelationKind::ManyToMany => "N:M",
        }
    }
}

/// Many-to-one relation, held by the table owning the foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOne {
    /// Final attribute name on the owning table.
    pub attribute_name: String,
    /// Attribute name of the reciprocal [`RelationMany`] on `to_table`.
    pub other_attribute_name: String,
    /// Candidate names, shortest first; the last one is the canonical name.
    pub candidates: Vec<String>,
    /// Foreign key column on the owning table.
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub join_comment: String,
}

/// One-to-many relation, held by the referenced table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMany {
    pub attribute_name: String,
    pub candidates: Vec<String>,
    /// Foreign key column on `to_table` referencing the owning table.
    pub from_column: String,
    /// The referencing ("many") table.
    pub to_table: String,
    pub join_comment: String,
}

/// Many-to-many shortcut through a link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationManyMany {
    pub attribute_name: String,
    pub candidates: Vec<String>,
    /// Link table column referencing the owning table.
    pub from_column: String,
    pub to_table: String,
    /// Link table column referencing `to_table`.
    pub to_column: String,
    pub link_table: String,
    pub join_comment: String,
}

/// Borrowed view over any relation variant.
#[derive(Debug, Clone, Copy)]
pub enum RelationRef<'a> {
    One(&'a RelationOne),
    Many(&'a RelationMany),
    ManyMany(&'a RelationManyMany),
}

impl<'a> RelationRef<'a> {
    pub fn kind(self) -> RelationKind {
        match self {
            RelationRef::One(_) => RelationKind::ManyToOne,
            RelationRef::Many(_) => RelationKind::OneToMany,
            RelationRef::ManyMany(_) => RelationKind::ManyToMany,
        }
    }

    pub fn attribute_name(self) -> &'a str {
        match self {
            RelationRef::One(r) => &r.attribute_name,
            RelationRef::Many(r) => &r.attribute_name,
            RelationRef::ManyMany(r) => &r.attribute_name,
        }
    }

    pub fn candidates(self) -> &'a [String] {
        match self {
            RelationRef::One(r) => &r.candidates,
            RelationRef::Many(r) => &r.candidates,
            RelationRef::ManyMany(r) => &r.candidates,
        }
    }

    /// The longest candidate, used as the rename key.
    pub fn canonical_name(self) -> &'a str {
        self.candidates().last().map_or("", String::as_str)
    }

    /// Table the relation points to.
    pub fn to_table(self) -> &'a str {
        match self {
            RelationRef::One(r) => &r.to_table,
            RelationRef::Many(r) => &r.to_table,
            RelationRef::ManyMany(r) => &r.to_table,
        }
    }

    pub fn join_comment(self) -> &'a str {
        match self {
            RelationRef::One(r) => &r.join_comment,
            RelationRef::Many(r) => &r.join_comment,
            RelationRef::ManyMany(r) => &r.join_comment,
        }
    }
}

impl fmt::Display for RelationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.attribute_name(), self.to_table())
    }
}

/// Collapse duplicates keeping the first occurrence and drop names that
/// collide with a column of the owning table.
pub(crate) fn clean_candidates(names: Vec<String>, columns: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if columns.contains(&name.as_str()) || out.contains(&name) {
            continue;
        }
        out.push(name);
    }
    out
}

/// `N:1 - JOIN one ON many.local = one.target`
pub(crate) fn join_comment_one(many: &str, local: &str, one: &str, target: &str) -> String {
    format!(
        "{} - JOIN {one} ON {many}.{local} = {one}.{target}",
        RelationKind::ManyToOne.marker()
    )
}

/// `1:N - JOIN many ON many.local = one.target`
pub(crate) fn join_comment_many(many: &str, local: &str, one: &str, target: &str) -> String {
    format!(
        "{} - JOIN {many} ON {many}.{local} = {one}.{target}",
        RelationKind::OneToMany.marker()
    )
}

/// `N:M - JOIN link ON self.pk = link.fk JOIN other ON link.fk = other.pk`
pub(crate) fn join_comment_many_many(
    this: &str,
    this_target: &str,
    link: &str,
    this_fk: &str,
    other_fk: &str,
    other: &str,
    other_target: &str,
) -> String {
    format!(
        "{} - JOIN {link} ON {this}.{this_target} = {link}.{this_fk} \
         JOIN {other} ON {link}.{other_fk} = {other}.{other_target}",
        RelationKind::ManyToMany.marker()
    )
}
