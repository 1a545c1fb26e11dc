//! Destination table replacement.
//!
//! Column names are lowercased, the destination is dropped and recreated with
//! all-text columns, and rows are sent as multi-row `INSERT ... VALUES`
//! batches. Replacement is intentional: the destination always reflects
//! exactly the most recent CSV, never a merge of old and new data.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::debug;

use crate::db::DbClient;
use crate::loader::TableSnapshot;

/// SQL Server rejects more than 1000 row value constructors per INSERT.
const INSERT_BATCH_ROWS: usize = 1000;

/// Drops and recreates `schema.table` from the snapshot, then inserts every
/// row. Any failure aborts the run.
pub fn replace_table(
    client: &mut DbClient,
    schema: &str,
    table: &str,
    snapshot: &TableSnapshot,
) -> Result<()> {
    let columns = lowercase_columns(snapshot.headers())?;
    client
        .execute(&drop_table_sql(schema, table))
        .context("Dropping existing table")?;
    client
        .execute(&create_table_sql(schema, table, &columns))
        .context("Creating table")?;
    let statements = insert_statements(schema, table, &columns, snapshot.rows(), INSERT_BATCH_ROWS);
    debug!(
        "Prepared {} insert batch(es) for {}.{}",
        statements.len(),
        schema,
        table
    );
    for (index, statement) in statements.iter().enumerate() {
        client
            .execute(statement)
            .with_context(|| format!("Inserting batch {} of {}", index + 1, statements.len()))?;
    }
    Ok(())
}

/// Lowercases header names, rejecting snapshots that cannot form a valid
/// destination table.
fn lowercase_columns(headers: &[String]) -> Result<Vec<String>> {
    if headers.is_empty() {
        bail!("Source has no columns; nothing to create");
    }
    let columns: Vec<String> = headers.iter().map(|header| header.to_lowercase()).collect();
    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            bail!("Duplicate column name after lowercasing: '{column}'");
        }
    }
    Ok(columns)
}

fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn quote_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

pub(crate) fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn drop_table_sql(schema: &str, table: &str) -> String {
    let target = qualified(schema, table);
    format!(
        "IF OBJECT_ID({}, N'U') IS NOT NULL DROP TABLE {target};",
        quote_literal(&target)
    )
}

/// All columns are NVARCHAR: the snapshot carries text only, and an empty
/// CSV field is stored as an empty string, never NULL.
fn create_table_sql(schema: &str, table: &str, columns: &[String]) -> String {
    let column_defs = columns
        .iter()
        .map(|column| format!("{} NVARCHAR(MAX) NOT NULL", quote_ident(column)))
        .join(", ");
    format!("CREATE TABLE {} ({column_defs});", qualified(schema, table))
}

fn insert_statements(
    schema: &str,
    table: &str,
    columns: &[String],
    rows: &[Vec<String>],
    batch_rows: usize,
) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let target = qualified(schema, table);
    let column_list = columns.iter().map(|column| quote_ident(column)).join(", ");
    rows.chunks(batch_rows)
        .map(|chunk| {
            let values = chunk
                .iter()
                .map(|row| {
                    format!("({})", row.iter().map(|field| quote_literal(field)).join(", "))
                })
                .join(", ");
            format!("INSERT INTO {target} ({column_list}) VALUES {values};")
        })
        .collect()
}
