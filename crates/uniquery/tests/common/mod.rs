//! Car dealership fixture shared by the integration tests.
//!
//! Rows are built the way a driver would return them for `SELECT *` over a
//! join: the full column lists of the joined tables side by side, NULL
//! where an outer join found no match.

#![allow(dead_code)]

use uniquery::prelude::*;
use uniquery::{InferenceConfig, RelationGraph, SelectedColumn};

pub const CARS: [(&str, &str, &str, i64); 5] = [
    ("Car1", "Toyota", "Camry", 2018),
    ("Car2", "Honda", "Accord", 2019),
    ("Car3", "Honda", "Accord", 2020),
    ("Car4", "Chevy", "Bolt", 2017),
    ("Car5", "Volvo", "CX60", 2015),
];

pub const CLIENTS: [(&str, &str); 3] = [
    ("Client1", "Client One"),
    ("Client2", "Client Two"),
    ("Client3", "Client Three"),
];

/// `(client_id, car_id, id)` in column order.
pub const CLIENTS_CARS: [(&str, &str, &str); 3] = [
    ("Client1", "Car1", "Client1Car1"),
    ("Client2", "Car3", "Client2Car3"),
    ("Client2", "Car5", "Client2Car5"),
];

pub const REPAIRS: [(&str, &str, &str); 4] = [
    ("Repair1", "brake repair", "Car5"),
    ("Repair2", "oil change", "Car5"),
    ("Repair3", "oil change", "Car3"),
    ("Repair4", "fix", "Car2"),
];

pub const SALESREPS: [(&str, &str); 2] = [("salesrep1", "Bob"), ("salesrep2", "Tom")];

/// `(id, amount, car_id, repair_id, salesrep_id)`.
pub const INVOICES: [(&str, f64, Option<&str>, Option<&str>, &str); 4] = [
    ("Invoice1", 30000.0, Some("Car1"), None, "salesrep1"),
    ("Invoice2", 33000.0, Some("Car2"), None, "salesrep2"),
    ("Invoice3", 200.0, None, Some("Repair1"), "salesrep2"),
    ("Invoice4", 500.0, None, Some("Repair2"), "salesrep2"),
];

pub const PARTS: [(&str, &str); 9] = [
    ("A1", "Root 1"),
    ("A2", "Root 2"),
    ("B1", "Assembly 1"),
    ("B2", "Assembly 2"),
    ("C1", "Subassembly 1"),
    ("C2", "Subassembly 2"),
    ("D1", "Part 1"),
    ("D2", "Part 2"),
    ("D3", "Part 3"),
];

/// `(id, parent, child, qty)`.
pub const BOM_LINKS: [(i64, &str, &str, i64); 12] = [
    (1, "A1", "B1", 1),
    (2, "A1", "B2", 2),
    (3, "A2", "B2", 3),
    (4, "A2", "D1", 5),
    (5, "B1", "C1", 2),
    (6, "B1", "D1", 3),
    (7, "B2", "C1", 1),
    (8, "B2", "C2", 2),
    (9, "C1", "D1", 3),
    (10, "C1", "D2", 4),
    (11, "C2", "D1", 5),
    (12, "C2", "D3", 6),
];

pub fn schema() -> StaticIntrospector {
    schema_for(Dialect::Sqlite)
}

pub fn schema_for(dialect: Dialect) -> StaticIntrospector {
    StaticIntrospector::new(dialect)
        .table(
            TableDef::new("cars")
                .primary_key("id", "TEXT")
                .column("make", "TEXT")
                .column("model", "TEXT")
                .column("year", "INTEGER"),
        )
        .table(
            TableDef::new("clients")
                .primary_key("id", "TEXT")
                .column("name", "TEXT"),
        )
        .table(
            TableDef::new("clients_cars")
                .column("client_id", "INTEGER")
                .column("car_id", "INTEGER")
                .primary_key("id", "TEXT")
                .foreign_key("client_id", "clients", "id")
                .foreign_key("car_id", "cars", "id"),
        )
        .table(
            TableDef::new("repairs")
                .primary_key("id", "TEXT")
                .column("description", "TEXT")
                .column("car_id", "INTEGER")
                .foreign_key("car_id", "cars", "id"),
        )
        .table(
            TableDef::new("salesreps")
                .primary_key("id", "TEXT")
                .column("name", "TEXT"),
        )
        .table(
            TableDef::new("invoice")
                .primary_key("id", "TEXT")
                .column("amount", "REAL")
                .column("car_id", "INTEGER")
                .column("repair_id", "INTEGER")
                .column("salesrep_id", "INTEGER")
                .foreign_key("car_id", "cars", "id")
                .foreign_key("repair_id", "repairs", "id")
                .foreign_key("salesrep_id", "salesreps", "id"),
        )
        .table(
            TableDef::new("table1")
                .primary_key("id", "INTEGER")
                .column("text", "TEXT")
                .column("int", "INTEGER"),
        )
        .table(
            TableDef::new("parts")
                .primary_key("part_number", "TEXT")
                .column("description", "TEXT"),
        )
        .table(
            TableDef::new("bom_link")
                .primary_key("id", "INTEGER")
                .column("parent", "TEXT")
                .column("child", "TEXT")
                .column("qty", "INTEGER")
                .foreign_key("parent", "parts", "part_number")
                .foreign_key("child", "parts", "part_number"),
        )
}

pub fn config() -> InferenceConfig {
    InferenceConfig::new()
        .rename("parts__part_number__bom_link__child", "parents_links")
        .rename("parts__part_number__bom_link__parent", "children_links")
        .rename(
            "cars__car_id__clients_cars__clients__client_id",
            "clients_renamed",
        )
}

pub fn graph() -> RelationGraph {
    RelationGraph::infer(&schema(), &config()).unwrap()
}

pub fn registry() -> ModelRegistry {
    ModelRegistry::from_graph(graph())
}

pub fn registry_for(dialect: Dialect) -> ModelRegistry {
    ModelRegistry::from_graph(RelationGraph::infer(&schema_for(dialect), &config()).unwrap())
}

/// Output columns of `SELECT *` over `tables`, in join order.
pub fn select_all(graph: &RelationGraph, tables: &[&str]) -> Vec<SelectedColumn> {
    let mut columns = Vec::new();
    for &table in tables {
        let descriptor = graph.table(table).unwrap();
        for column in descriptor.column_names() {
            let selected = SelectedColumn::table(table, column);
            columns.push(if column == descriptor.primary_key {
                selected.primary_key()
            } else {
                selected
            });
        }
    }
    columns
}

/// An analyzer that reports `columns` for any statement.
pub fn analyzer(
    columns: Vec<SelectedColumn>,
) -> impl Fn(&str, Dialect, &RelationGraph) -> Result<Vec<SelectedColumn>> {
    move |_sql: &str, _dialect: Dialect, _graph: &RelationGraph| Ok(columns.clone())
}

pub fn nulls(count: usize) -> Vec<Value> {
    vec![Value::Null; count]
}

pub fn car(id: &str) -> Vec<Value> {
    let (id, make, model, year) = CARS.iter().find(|c| c.0 == id).copied().unwrap();
    vec![id.into(), make.into(), model.into(), year.into()]
}

pub fn client(id: &str) -> Vec<Value> {
    let (id, name) = CLIENTS.iter().find(|c| c.0 == id).copied().unwrap();
    vec![id.into(), name.into()]
}

pub fn client_car(id: &str) -> Vec<Value> {
    let (client_id, car_id, id) = CLIENTS_CARS.iter().find(|c| c.2 == id).copied().unwrap();
    vec![client_id.into(), car_id.into(), id.into()]
}

pub fn salesrep(id: &str) -> Vec<Value> {
    let (id, name) = SALESREPS.iter().find(|s| s.0 == id).copied().unwrap();
    vec![id.into(), name.into()]
}

pub fn invoice(id: &str) -> Vec<Value> {
    let (id, amount, car_id, repair_id, salesrep_id) =
        INVOICES.iter().find(|i| i.0 == id).copied().unwrap();
    vec![
        id.into(),
        amount.into(),
        car_id.into(),
        repair_id.into(),
        salesrep_id.into(),
    ]
}

pub fn part(number: &str) -> Vec<Value> {
    let (number, description) = PARTS.iter().find(|p| p.0 == number).copied().unwrap();
    vec![number.into(), description.into()]
}

pub fn bom_link(id: i64) -> Vec<Value> {
    let (id, parent, child, qty) = BOM_LINKS.iter().find(|b| b.0 == id).copied().unwrap();
    vec![id.into(), parent.into(), child.into(), qty.into()]
}

/// Concatenate per-table column slices into one result row.
pub fn join(parts: Vec<Vec<Value>>) -> Vec<Value> {
    parts.into_iter().flatten().collect()
}

/// Text values of `column` across `instances`, in order.
pub fn texts(instances: &[&Instance], column: &str) -> Vec<String> {
    instances
        .iter()
        .map(|i| i.get::<String>(column).unwrap())
        .collect()
}
