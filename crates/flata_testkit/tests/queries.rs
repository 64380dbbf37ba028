//! Query semantics evaluated through table searches.

use flata_core::query::{field, Query};
use flata_core::Database;
use serde_json::json;
use std::sync::Arc;

fn people() -> (Database, Arc<flata_core::Table>) {
    let db = Database::open_in_memory();
    let table = db.table("people").unwrap();
    table
        .insert_multiple([
            json!({"name": "John", "age": 22, "followers": ["don", "greg"], "nick": null}),
            json!({"name": "joan", "age": 31.5, "followers": ["john"]}),
            json!({"name": "Greg", "age": "unknown", "address": {"city": "Oslo"}}),
        ])
        .unwrap();
    (db, table)
}

fn names(docs: &[flata_core::Document]) -> Vec<&str> {
    docs.iter().filter_map(|d| d["name"].as_str()).collect()
}

#[test]
fn ordering_skips_incompatible_types() {
    let (_db, table) = people();
    assert_eq!(names(&table.search(&field("age").gt(20)).unwrap()), vec!["John", "joan"]);
    assert_eq!(names(&table.search(&field("age").lt(100)).unwrap()), vec!["John", "joan"]);
    assert_eq!(names(&table.search(&field("age").le(22.0)).unwrap()), vec!["John"]);
}

#[test]
fn not_equal_includes_incompatible_types_but_not_missing_fields() {
    let (_db, table) = people();
    assert_eq!(
        names(&table.search(&field("age").ne(22)).unwrap()),
        vec!["joan", "Greg"]
    );
    assert_eq!(names(&table.search(&field("address").ne(1)).unwrap()), vec!["Greg"]);
}

#[test]
fn exists_includes_null_values() {
    let (_db, table) = people();
    assert_eq!(names(&table.search(&field("nick").exists()).unwrap()), vec!["John"]);
    assert_eq!(names(&table.search(&field("nick").eq(json!(null))).unwrap()), vec!["John"]);
}

#[test]
fn nested_paths() {
    let (_db, table) = people();
    let oslo = Query::path(["address", "city"]).eq("Oslo");
    assert_eq!(names(&table.search(&oslo).unwrap()), vec!["Greg"]);

    let missing = Query::path(["address", "city", "zip"]).exists();
    assert!(table.search(&missing).unwrap().is_empty());
}

#[test]
fn regex_tests() {
    let (_db, table) = people();
    let starts = field("name").matches("jo").unwrap();
    assert_eq!(names(&table.search(&starts).unwrap()), vec!["joan"]);

    let starts_any_case = field("name").matches_ignore_case("jo").unwrap();
    assert_eq!(names(&table.search(&starts_any_case).unwrap()), vec!["John", "joan"]);

    let contains = field("name").search("o").unwrap();
    assert_eq!(names(&table.search(&contains).unwrap()), vec!["John", "joan"]);

    let case_sensitive = field("name").search("J").unwrap();
    assert_eq!(names(&table.search(&case_sensitive).unwrap()), vec!["John"]);

    let absent = field("name").search("z").unwrap();
    assert!(table.search(&absent).unwrap().is_empty());

    let contains_any_case = field("name").search_ignore_case("g").unwrap();
    assert_eq!(names(&table.search(&contains_any_case).unwrap()), vec!["Greg"]);
}

#[test]
fn any_and_all_on_lists() {
    let (_db, table) = people();
    let any = field("followers").any(["greg", "john"]);
    assert_eq!(names(&table.search(&any).unwrap()), vec!["John", "joan"]);

    let all = field("followers").all(["don", "greg"]);
    assert_eq!(names(&table.search(&all).unwrap()), vec!["John"]);
}

#[test]
fn any_and_all_on_strings() {
    let (_db, table) = people();
    assert_eq!(names(&table.search(&field("name").any("xyzG")).unwrap()), vec!["Greg"]);
    assert_eq!(names(&table.search(&field("name").all("nao")).unwrap()), vec!["joan"]);
}

#[test]
fn combinators_nest() {
    let (_db, table) = people();
    let cond = (field("age").gt(30) | field("name").eq("Greg")) & !field("address").exists();
    assert_eq!(names(&table.search(&cond).unwrap()), vec!["joan"]);
}

#[test]
fn invalid_regex_is_a_validation_error() {
    assert!(matches!(
        field("name").search("["),
        Err(flata_core::CoreError::Validation { .. })
    ));
}
