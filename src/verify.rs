//! Best-effort post-load sanity counts.
//!
//! Purely observational: a failed count query is logged at debug level and
//! otherwise discarded, so verification never affects the exit status.

use log::{debug, info};

use crate::db::DbClient;
use crate::writer::qualified;

pub fn report_row_counts(client: &mut DbClient, schema: &str, tables: &[&str]) {
    for table in tables {
        match client.query_count(&count_sql(schema, table)) {
            Ok(count) => info!("{table}: {count} row(s)"),
            Err(err) => debug!("Row count for {table} unavailable: {err:#}"),
        }
    }
}

fn count_sql(schema: &str, table: &str) -> String {
    format!("SELECT COUNT_BIG(*) FROM {}", qualified(schema, table))
}
