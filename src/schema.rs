use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Blogs,
    Autors,
}

impl Table {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blogs => "Blogs",
            Self::Autors => "Autors",
        }
    }

    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::Blogs => "BlogId",
            Self::Autors => "AutorId",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSchema {
    /// Caller-assigned integer primary key (aliases the rowid).
    Key,
    Text { max_len: usize },
    /// Text timestamp defaulting to `CURRENT_TIMESTAMP`.
    Timestamp,
    Reference { table: String, field: String },
}

impl FieldSchema {
    fn column_sql(&self, table_name: &str, field_name: &str) -> String {
        match self {
            Self::Key => format!(
                "{field_name} INTEGER NOT NULL CONSTRAINT PK_{table_name} PRIMARY KEY"
            ),
            Self::Text { max_len } => format!(
                "{field_name} TEXT NOT NULL CHECK (length({field_name}) <= {max_len})"
            ),
            Self::Timestamp => {
                format!("{field_name} TEXT NOT NULL DEFAULT (CURRENT_TIMESTAMP)")
            }
            Self::Reference { table, field } => format!(
                "{field_name} INTEGER NOT NULL CONSTRAINT FK_{table_name}_{table}_{field_name} REFERENCES {table} ({field}) ON DELETE CASCADE"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub fields: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub fields: IndexMap<String, FieldSchema>,
    pub indices: IndexMap<String, IndexSchema>,
}

impl TableSchema {
    #[must_use]
    pub fn create_table_sql(&self, namespace: &str) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|(field_name, field_schema)| field_schema.column_sql(&self.name, field_name))
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {namespace}.{} (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }

    #[must_use]
    pub fn create_indices_sql(&self, namespace: &str) -> Vec<String> {
        self.indices
            .iter()
            .map(|(index_name, index_schema)| {
                format!(
                    "CREATE {}INDEX IF NOT EXISTS {namespace}.{index_name} ON {} ({})",
                    if index_schema.unique { "UNIQUE " } else { "" },
                    self.name,
                    index_schema.fields.join(", ")
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub namespace: String,
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.into(),
            tables: vec![blogs_table(), autors_table()],
        }
    }

    /// Statements in dependency order: referenced tables first.
    #[must_use]
    pub fn ddl(&self) -> Vec<String> {
        let mut out = vec![];
        for table in &self.tables {
            out.push(table.create_table_sql(&self.namespace));
            out.extend(table.create_indices_sql(&self.namespace));
        }
        out
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name.as_str()).collect()
    }
}

#[must_use]
pub fn blogs_table() -> TableSchema {
    TableSchema {
        name: Table::Blogs.name().into(),
        fields: IndexMap::from([
            ("BlogId".into(), FieldSchema::Key),
            ("Title".into(), FieldSchema::Text { max_len: 128 }),
            ("SubTitle".into(), FieldSchema::Text { max_len: 256 }),
            ("DateTimeAdd".into(), FieldSchema::Timestamp),
        ]),
        indices: IndexMap::from([(
            "IX_Blogs_Title".into(),
            IndexSchema {
                fields: vec!["Title".into()],
                unique: true,
            },
        )]),
    }
}

#[must_use]
pub fn autors_table() -> TableSchema {
    TableSchema {
        name: Table::Autors.name().into(),
        fields: IndexMap::from([
            ("AutorId".into(), FieldSchema::Key),
            ("Name".into(), FieldSchema::Text { max_len: 128 }),
            ("Surname".into(), FieldSchema::Text { max_len: 256 }),
            ("DateTimeAdd".into(), FieldSchema::Timestamp),
            (
                "BlogId".into(),
                FieldSchema::Reference {
                    table: Table::Blogs.name().into(),
                    field: Table::Blogs.key_field().into(),
                },
            ),
        ]),
        indices: IndexMap::from([
            (
                "IX_Autors_Name".into(),
                IndexSchema {
                    fields: vec!["Name".into()],
                    unique: true,
                },
            ),
            (
                "IX_Autors_BlogId".into(),
                IndexSchema {
                    fields: vec!["BlogId".into()],
                    unique: false,
                },
            ),
        ]),
    }
}
