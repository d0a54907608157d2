use tracing::warn;

use crate::db::{DbError, QueryResult, SqlDatabase, SqlValue};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// Tables and their columns in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableDescriptor>,
}

pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn cell_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

impl SchemaDescriptor {
    /// Reads `information_schema.columns`, which Postgres and DuckDB both expose.
    pub async fn introspect(db: &dyn SqlDatabase, schema: &str) -> Result<Self, DbError> {
        let sql = format!(
            "SELECT table_name, column_name, data_type, is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = {} \
             ORDER BY table_name, ordinal_position",
            quote_literal(schema)
        );
        let result = db.run(&sql).await?;
        Ok(Self::from_catalog_rows(&result))
    }

    fn from_catalog_rows(result: &QueryResult) -> Self {
        let mut tables: Vec<TableDescriptor> = Vec::new();

        for row in &result.rows {
            let [table, column, data_type, nullable] = match row.as_slice() {
                [a, b, c, d] => [cell_text(a), cell_text(b), cell_text(c), cell_text(d)],
                _ => continue,
            };
            let declared_type = if nullable.eq_ignore_ascii_case("NO") {
                format!("{} NOT NULL", data_type)
            } else {
                data_type
            };
            let column = ColumnDescriptor {
                name: column,
                declared_type,
                description: None,
            };

            match tables.last_mut() {
                Some(last) if last.name == table => last.columns.push(column),
                _ => tables.push(TableDescriptor {
                    name: table,
                    columns: vec![column],
                }),
            }
        }

        Self { tables }
    }

    /// Renders one `CREATE TABLE` block per table, each optionally followed by
    /// a comment holding up to `sample_rows` example rows.
    pub async fn render_ddl(&self, db: &dyn SqlDatabase, schema: &str, sample_rows: usize) -> String {
        let mut blocks = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            let mut block = format!("CREATE TABLE {} (\n", table.name);
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| match &c.description {
                    Some(desc) => format!("\t{} {} -- {}", c.name, c.declared_type, desc),
                    None => format!("\t{} {}", c.name, c.declared_type),
                })
                .collect();
            block.push_str(&columns.join(",\n"));
            block.push_str("\n)");

            if sample_rows > 0 {
                let sql = format!(
                    "SELECT * FROM {}.{} LIMIT {}",
                    quote_ident(schema),
                    quote_ident(&table.name),
                    sample_rows
                );
                match db.run(&sql).await {
                    Ok(sample) => {
                        block.push_str(&format!(
                            "\n\n/*\n{} rows from {} table:\n{}\n",
                            sample_rows,
                            table.name,
                            sample.columns.join("\t")
                        ));
                        for row in &sample.rows {
                            let cells: Vec<String> = row.iter().map(cell_text).collect();
                            block.push_str(&cells.join("\t"));
                            block.push('\n');
                        }
                        block.push_str("*/");
                    }
                    Err(e) => warn!("Skipping sample rows for {}: {}", table.name, e),
                }
            }

            blocks.push(block);
        }

        blocks.join("\n\n")
    }
}
