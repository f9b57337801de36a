//! Relation inference engine.
//!
//! Turns raw foreign keys into a uniquely named relation graph:
//!
//! 1. Every table gets singular, plural and CamelCase names and exactly one
//!    primary key.
//! 2. Every foreign key yields a many-to-one relation on the referencing
//!    table and a one-to-many relation on the referenced table, each with a
//!    list of candidate attribute names ordered from shortest to longest.
//! 3. Link tables yield a many-to-many shortcut on both endpoints.
//! 4. Each relation takes its shortest candidate that is unique among all
//!    candidates of its table and is not a column name, unless the rename
//!    map assigns a name to its longest (canonical) candidate.

use crate::config::InferenceConfig;
use crate::descriptor::{ColumnDescriptor, TableDescriptor, field_priority};
use crate::graph::RelationGraph;
use crate::introspect::{
    DatabaseSchema, ForeignKeyDef, SchemaIntrospector, TableDef, introspect_all,
};
use crate::relation::{
    RelationMany, RelationManyMany, RelationOne, clean_candidates, join_comment_many,
    join_comment_many_many, join_comment_one,
};
use crate::types::ScalarType;
use std::collections::{BTreeMap, BTreeSet};
use uniquery_core::inflect::{to_camel_case, to_plural, to_singular};
use uniquery_core::{Error, Result, SchemaError, SchemaErrorKind};

type Tables = BTreeMap<String, TableDescriptor>;

fn schema_error(kind: SchemaErrorKind, table: &str, message: String) -> Error {
    Error::Schema(SchemaError::new(kind, message).with_table(table))
}

/// Introspect a database and infer its relation graph.
pub fn infer_relations(
    introspector: &dyn SchemaIntrospector,
    config: &InferenceConfig,
) -> Result<RelationGraph> {
    let schema = introspect_all(introspector)?;
    infer_from_schema(&schema, config)
}

/// Infer the relation graph of an already introspected schema.
#[tracing::instrument(level = "debug", skip_all, fields(dialect = %schema.dialect))]
pub fn infer_from_schema(schema: &DatabaseSchema, config: &InferenceConfig) -> Result<RelationGraph> {
    tracing::info!(
        tables = schema.tables.len(),
        renames = config.rename_attributes.len(),
        "Inferring relations"
    );

    let mut order: Vec<(String, &TableDef)> = schema
        .tables
        .values()
        .map(|t| (to_singular(&t.name, config.singular_rules()), t))
        .collect();
    order.sort_by(|a, b| a.0.cmp(&b.0));

    let mut tables = Tables::new();
    for (singular, def) in &order {
        tables.insert(def.name.clone(), describe_table(def, singular, config)?);
    }

    for (_, def) in &order {
        add_foreign_key_relations(&mut tables, def, config)?;
    }

    let mut renamed = BTreeMap::new();
    for descriptor in tables.values_mut() {
        assign_attribute_names(descriptor, config, &mut renamed)?;
    }
    check_renames(config, &renamed)?;
    link_reciprocals(&mut tables);
    for descriptor in tables.values() {
        check_collisions(descriptor)?;
    }

    let (mut one, mut many, mut many_many) = (0, 0, 0);
    for t in tables.values() {
        one += t.relations_one.values().map(Vec::len).sum::<usize>();
        many += t.relations_many.values().map(Vec::len).sum::<usize>();
        many_many += t.relations_many_many.values().map(Vec::len).sum::<usize>();
    }
    tracing::info!(
        tables = tables.len(),
        relations_one = one,
        relations_many = many,
        relations_many_many = many_many,
        "Relation inference complete"
    );

    Ok(RelationGraph::new(schema.dialect, tables))
}

fn describe_table(def: &TableDef, singular: &str, config: &InferenceConfig) -> Result<TableDescriptor> {
    let primary_keys: Vec<&str> = def
        .columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| c.name.as_str())
        .collect();

    let primary_key = match primary_keys.as_slice() {
        [pk] => (*pk).to_string(),
        [] => {
            return Err(schema_error(
                SchemaErrorKind::MissingPrimaryKey,
                &def.name,
                format!("Table {} has no primary keys.", def.name),
            ));
        }
        _ => {
            return Err(schema_error(
                SchemaErrorKind::MultiplePrimaryKeys,
                &def.name,
                format!(
                    "Table {} has multiple primary keys: {:?}.",
                    def.name, primary_keys
                ),
            ));
        }
    };

    let columns: Vec<ColumnDescriptor> = def
        .columns
        .iter()
        .map(|c| ColumnDescriptor {
            name: c.name.clone(),
            sql_type: c.sql_type.clone(),
            scalar_type: ScalarType::from_sql_type(&c.sql_type),
        })
        .collect();

    Ok(TableDescriptor {
        table_name: def.name.clone(),
        singular: singular.to_string(),
        plural: to_plural(singular, config.plural_rules()),
        camel: to_camel_case(singular),
        field_priority: field_priority(&columns, &primary_key),
        primary_key,
        columns,
        relations_one: BTreeMap::new(),
        relations_many: BTreeMap::new(),
        relations_many_many: BTreeMap::new(),
    })
}

fn lookup<'a>(tables: &'a Tables, name: &str) -> Result<&'a TableDescriptor> {
    tables.get(name).ok_or_else(|| {
        schema_error(
            SchemaErrorKind::TableNotFound,
            name,
            format!("Table \"{name}\" does not exist"),
        )
    })
}

fn add_foreign_key_relations(
    tables: &mut Tables,
    def: &TableDef,
    config: &InferenceConfig,
) -> Result<()> {
    let is_link = config
        .link_tables
        .is_link_table(&def.name, def.foreign_keys.len(), def.columns.len());
    if is_link {
        tracing::debug!(table = %def.name, "Detected link table");
    }

    for fk in &def.foreign_keys {
        if !tables.contains_key(&fk.target_table) {
            return Err(schema_error(
                SchemaErrorKind::TableNotFound,
                &def.name,
                format!(
                    "Foreign key {}.{} references unknown table \"{}\"",
                    def.name, fk.local_column, fk.target_table
                ),
            ));
        }
        let many = lookup(tables, &def.name)?;
        let one = lookup(tables, &fk.target_table)?;
        let (relation_one, relation_many) = foreign_key_relations(many, one, fk, is_link, config);

        if let Some(many) = tables.get_mut(&def.name) {
            many.relations_one
                .entry(fk.target_table.clone())
                .or_default()
                .push(relation_one);
        }
        if let Some(one) = tables.get_mut(&fk.target_table) {
            one.relations_many
                .entry(def.name.clone())
                .or_default()
                .push(relation_many);
        }
    }

    if is_link {
        add_many_many_relations(tables, def, config)?;
    }
    Ok(())
}

/// Relations produced by `many.local -> one.target`.
fn foreign_key_relations(
    many: &TableDescriptor,
    one: &TableDescriptor,
    fk: &ForeignKeyDef,
    is_link: bool,
    config: &InferenceConfig,
) -> (RelationOne, RelationMany) {
    let local = fk.local_column.as_str();
    let target = fk.target_column.as_str();
    let stripped = local
        .strip_suffix(&format!("_{}", one.primary_key))
        .unwrap_or(local);
    let local_plural = to_plural(local, config.plural_rules());
    let link_prefix = if is_link { "links_to_" } else { "" };

    let many_columns: Vec<&str> = many.column_names().collect();
    let one_columns: Vec<&str> = one.column_names().collect();

    let one_candidates = clean_candidates(
        vec![
            stripped.to_string(),
            local.to_string(),
            one.singular.clone(),
            format!("{}__{local}", one.singular),
            format!("{}__{local}__{target}", one.singular),
            format!("{}__{local}__{}__{target}", many.table_name, one.table_name),
        ],
        &many_columns,
    );
    let many_candidates = clean_candidates(
        vec![
            many.plural.clone(),
            local_plural.clone(),
            format!("{link_prefix}{}", many.plural),
            format!("{}__{local_plural}", many.singular),
            format!("{}__{target}", many.singular),
            format!("{}__{target}__{local}", many.singular),
            format!("{}__{target}__{}__{local}", one.table_name, many.table_name),
        ],
        &one_columns,
    );

    let relation_one = RelationOne {
        attribute_name: String::new(),
        other_attribute_name: String::new(),
        candidates: one_candidates,
        from_column: local.to_string(),
        to_table: one.table_name.clone(),
        to_column: target.to_string(),
        join_comment: join_comment_one(&many.table_name, local, &one.table_name, target),
    };
    let relation_many = RelationMany {
        attribute_name: String::new(),
        candidates: many_candidates,
        from_column: local.to_string(),
        to_table: many.table_name.clone(),
        join_comment: join_comment_many(&many.table_name, local, &one.table_name, target),
    };
    (relation_one, relation_many)
}

fn add_many_many_relations(
    tables: &mut Tables,
    link: &TableDef,
    config: &InferenceConfig,
) -> Result<()> {
    let [first, second] = link.foreign_keys.as_slice() else {
        return Ok(());
    };
    let link_plural = lookup(tables, &link.name)?.plural.clone();

    for (fk_self, fk_other) in [(first, second), (second, first)] {
        let relation = {
            let this = lookup(tables, &fk_self.target_table)?;
            let other = lookup(tables, &fk_other.target_table)?;
            let self_plural = to_plural(&fk_self.local_column, config.plural_rules());
            let other_plural = to_plural(&fk_other.local_column, config.plural_rules());
            let this_columns: Vec<&str> = this.column_names().collect();

            let candidates = clean_candidates(
                vec![
                    other.plural.clone(),
                    format!("{link_plural}__{}", other.plural),
                    format!("{link_plural}__{other_plural}"),
                    format!("{link_plural}__{self_plural}__{other_plural}"),
                    format!(
                        "{}__{}__{}__{}__{}",
                        this.table_name,
                        fk_self.local_column,
                        link.name,
                        other.table_name,
                        fk_other.local_column
                    ),
                ],
                &this_columns,
            );

            RelationManyMany {
                attribute_name: String::new(),
                candidates,
                from_column: fk_self.local_column.clone(),
                to_table: other.table_name.clone(),
                to_column: fk_other.local_column.clone(),
                link_table: link.name.clone(),
                join_comment: join_comment_many_many(
                    &this.table_name,
                    &fk_self.target_column,
                    &link.name,
                    &fk_self.local_column,
                    &fk_other.local_column,
                    &other.table_name,
                    &fk_other.target_column,
                ),
            }
        };

        if let Some(this) = tables.get_mut(&fk_self.target_table) {
            this.relations_many_many
                .entry(relation.to_table.clone())
                .or_default()
                .push(relation);
        }
    }
    Ok(())
}

struct NameResolver<'a> {
    table: String,
    all_candidates: Vec<String>,
    columns: Vec<String>,
    config: &'a InferenceConfig,
}

impl NameResolver<'_> {
    fn resolve(&self, candidates: &[String], renamed: &mut BTreeMap<String, usize>) -> Result<String> {
        let canonical = candidates.last().map_or("", String::as_str);

        if let Some(name) = self.config.rename_attributes.get(canonical) {
            *renamed.entry(canonical.to_string()).or_insert(0) += 1;
            tracing::debug!(
                table = %self.table,
                canonical,
                attribute = %name,
                "Applied attribute rename"
            );
            return Ok(name.clone());
        }

        let unique = candidates.iter().find(|name| {
            self.all_candidates.iter().filter(|c| c == name).count() == 1
                && !self.columns.contains(name)
        });
        match unique {
            Some(name) => {
                tracing::trace!(table = %self.table, attribute = %name, "Resolved attribute name");
                Ok(name.clone())
            }
            None => Err(schema_error(
                SchemaErrorKind::NoUniqueName,
                &self.table,
                format!(
                    "Unable to find a unique attribute name for relation \"{canonical}\" of table \"{}\"",
                    self.table
                ),
            )),
        }
    }
}

fn assign_attribute_names(
    descriptor: &mut TableDescriptor,
    config: &InferenceConfig,
    renamed: &mut BTreeMap<String, usize>,
) -> Result<()> {
    let resolver = NameResolver {
        table: descriptor.table_name.clone(),
        all_candidates: descriptor
            .all_candidates()
            .into_iter()
            .map(str::to_string)
            .collect(),
        columns: descriptor.column_names().map(str::to_string).collect(),
        config,
    };

    for relation in descriptor.relations_one.values_mut().flatten() {
        relation.attribute_name = resolver.resolve(&relation.candidates, renamed)?;
    }
    for relation in descriptor.relations_many.values_mut().flatten() {
        relation.attribute_name = resolver.resolve(&relation.candidates, renamed)?;
    }
    for relation in descriptor.relations_many_many.values_mut().flatten() {
        relation.attribute_name = resolver.resolve(&relation.candidates, renamed)?;
    }
    Ok(())
}

fn check_renames(config: &InferenceConfig, renamed: &BTreeMap<String, usize>) -> Result<()> {
    let missing: Vec<&str> = config
        .rename_attributes
        .keys()
        .filter(|key| !renamed.contains_key(*key))
        .map(String::as_str)
        .collect();

    match missing.as_slice() {
        [] => {}
        [key] => {
            return Err(Error::Schema(SchemaError::new(
                SchemaErrorKind::RenamedAttributeNotFound,
                format!("The attribute \"{key}\" was specified for renaming but was not found."),
            )));
        }
        keys => {
            let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
            return Err(Error::Schema(SchemaError::new(
                SchemaErrorKind::RenamedAttributeNotFound,
                format!(
                    "The following attributes were specified for renaming but were not found: {}",
                    quoted.join(", ")
                ),
            )));
        }
    }

    if let Some((key, count)) = renamed.iter().find(|(_, count)| **count > 1) {
        return Err(Error::Schema(SchemaError::new(
            SchemaErrorKind::AmbiguousRename,
            format!("The attribute \"{key}\" specified for renaming matches {count} relations"),
        )));
    }
    Ok(())
}

/// Copy each one-to-many attribute name onto its many-to-one counterpart.
///
/// Both sides of a foreign key are pushed in the same order, so the i-th
/// relation of `many.relations_one[one]` pairs with the i-th relation of
/// `one.relations_many[many]`.
fn link_reciprocals(tables: &mut Tables) {
    let mut updates = Vec::new();
    for many in tables.values() {
        for (one_table, relations) in &many.relations_one {
            let Some(reciprocals) = tables
                .get(one_table)
                .and_then(|one| one.relations_many.get(&many.table_name))
            else {
                continue;
            };
            for (i, reciprocal) in reciprocals.iter().enumerate().take(relations.len()) {
                updates.push((
                    many.table_name.clone(),
                    one_table.clone(),
                    i,
                    reciprocal.attribute_name.clone(),
                ));
            }
        }
    }

    for (many, one, i, name) in updates {
        if let Some(relation) = tables
            .get_mut(&many)
            .and_then(|t| t.relations_one.get_mut(&one))
            .and_then(|rels| rels.get_mut(i))
        {
            relation.other_attribute_name = name;
        }
    }
}

fn check_collisions(descriptor: &TableDescriptor) -> Result<()> {
    let table = &descriptor.table_name;
    let mut seen = BTreeSet::new();
    for relation in descriptor.relations() {
        let name = relation.attribute_name();
        if descriptor.has_column(name) {
            return Err(schema_error(
                SchemaErrorKind::NameCollision,
                table,
                format!("Attribute \"{name}\" of table \"{table}\" has the same name as a column"),
            ));
        }
        if !seen.insert(name) {
            return Err(schema_error(
                SchemaErrorKind::NameCollision,
                table,
                format!("Attribute \"{name}\" is defined more than once in table \"{table}\""),
            ));
        }
    }
    Ok(())
}
