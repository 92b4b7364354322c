//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for one introspected table.

use crate::store::{Record, Where};
use serde_json::Value;

/// Column as reported by `information_schema.columns`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// `udt_name` (e.g. "int4", "text", "timestamptz"); used for parameter casts.
    pub pg_type: String,
    pub nullable: bool,
    pub has_default: bool,
    pub is_pk: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn pk(&self) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.is_pk)
    }
}

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(table: &TableInfo) -> String {
    format!("{}.{}", quoted(&table.schema), quoted(&table.name))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Placeholder for the next parameter, cast to the column type when known.
    fn placeholder(&mut self, v: Value, column: Option<&ColumnInfo>) -> String {
        let n = self.push_param(v);
        match column {
            Some(c) if !c.pg_type.is_empty() => format!("${}::{}", n, c.pg_type),
            _ => format!("${}", n),
        }
    }
}

/// SELECT list: numeric and user-defined enum columns as text so rows decode to JSON.
fn select_column_list(table: &TableInfo) -> String {
    column_list(table.columns.iter())
}

fn column_list<'a>(columns: impl Iterator<Item = &'a ColumnInfo>) -> String {
    columns
        .map(|c| {
            let q = quoted(&c.name);
            if c.pg_type == "numeric" || c.pg_type.contains('.') {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT page ordered by primary key when the table has one.
///
/// `select` narrows the column list to known columns; with none left every column is selected.
pub fn select_list(table: &TableInfo, select: Option<&[String]>, skip: Option<u64>, take: Option<u64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let columns = match select {
        Some(names) if table.columns.iter().any(|c| names.contains(&c.name)) => {
            column_list(table.columns.iter().filter(|c| names.contains(&c.name)))
        }
        _ => select_column_list(table),
    };
    let order_clause = table
        .pk()
        .map(|c| format!(" ORDER BY {}", quoted(&c.name)))
        .unwrap_or_default();
    let limit_clause = take.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = skip.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}",
        columns,
        qualified_table(table),
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// SELECT one row where `by.field = $1`.
pub fn select_by(table: &TableInfo, by: &Where) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(by.value.clone(), table.column(&by.field));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        qualified_table(table),
        quoted(&by.field),
        ph
    );
    q
}

/// INSERT the known columns present in `data`; everything else is left to column defaults.
pub fn insert(table: &TableInfo, data: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &table.columns {
        let Some(v) = data.get(&c.name) else { continue };
        placeholders.push(q.placeholder(v.clone(), Some(c)));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(table);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", qualified_table(table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE where `by.field` matches: SET only known columns present in `data`.
/// With nothing to set this degrades to a SELECT of the same row.
pub fn update(table: &TableInfo, by: &Where, data: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &table.columns {
        let Some(v) = data.get(&c.name) else { continue };
        let rhs = q.placeholder(v.clone(), Some(c));
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    if sets.is_empty() {
        return select_by(table, by);
    }
    let id_ph = q.placeholder(by.value.clone(), table.column(&by.field));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(table),
        sets.join(", "),
        quoted(&by.field),
        id_ph,
        select_column_list(table)
    );
    q
}

/// DELETE where `by.field` matches, returning the removed row.
pub fn delete(table: &TableInfo, by: &Where) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(by.value.clone(), table.column(&by.field));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(table),
        quoted(&by.field),
        ph,
        select_column_list(table)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TableInfo {
        let col = |name: &str, pg_type: &str, is_pk: bool| ColumnInfo {
            name: name.into(),
            pg_type: pg_type.into(),
            nullable: false,
            has_default: is_pk,
            is_pk,
        };
        TableInfo {
            schema: "public".into(),
            name: "User".into(),
            columns: vec![
                col("id", "int4", true),
                col("name", "text", false),
                col("balance", "numeric", false),
            ],
        }
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn list_orders_by_pk_and_paginates() {
        let q = select_list(&users(), None, Some(5), Some(5));
        assert_eq!(
            q.sql,
            r#"SELECT "id", "name", "balance"::text AS "balance" FROM "public"."User" ORDER BY "id" LIMIT 5 OFFSET 5"#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn list_selects_only_requested_columns() {
        let select = vec!["name".to_string(), "balance".to_string(), "ghost".to_string()];
        let q = select_list(&users(), Some(&select), None, None);
        assert_eq!(
            q.sql,
            r#"SELECT "name", "balance"::text AS "balance" FROM "public"."User" ORDER BY "id""#
        );
        let q = select_list(&users(), Some(&["ghost".to_string()]), None, None);
        assert!(q.sql.starts_with(r#"SELECT "id", "name", "balance"::text"#));
    }

    #[test]
    fn insert_skips_absent_and_unknown_columns() {
        let q = insert(&users(), &record(json!({"name": "Alice", "nope": 1})));
        assert!(q.sql.starts_with(r#"INSERT INTO "public"."User" ("name") VALUES ($1::text) RETURNING"#));
        assert_eq!(q.params, vec![json!("Alice")]);
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        let q = insert(&users(), &Record::new());
        assert!(q.sql.starts_with(r#"INSERT INTO "public"."User" DEFAULT VALUES"#));
    }

    #[test]
    fn update_binds_lookup_value_last() {
        let by = Where::new("id", json!(7));
        let q = update(&users(), &by, &record(json!({"name": "Bob"})));
        assert!(q.sql.starts_with(r#"UPDATE "public"."User" SET "name" = $1::text WHERE "id" = $2::int4 RETURNING"#));
        assert_eq!(q.params, vec![json!("Bob"), json!(7)]);
    }

    #[test]
    fn empty_update_selects_row() {
        let by = Where::new("id", json!(7));
        let q = update(&users(), &by, &Record::new());
        assert!(q.sql.starts_with("SELECT "));
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn identifiers_are_quoted() {
        let mut table = users();
        table.name = "we\"ird".into();
        let q = delete(&table, &Where::new("id", json!(1)));
        assert!(q.sql.starts_with(r#"DELETE FROM "public"."we""ird" WHERE "id" = $1::int4"#));
    }
}
