use indexmap::IndexMap;
use log::{debug, info, warn};
use sqlite::{Connection, State, Statement};

use crate::{
    backend::{BulkConfig, StorageBackend},
    change_set::{Change, ChangeSet},
    common::{BenchError, Result},
    config::{is_identifier, ConnectionString, StorageLocation},
    entity::{Autor, Blog},
    schema::{DatabaseSchema, Table},
};

/// Lowest compile-time bound parameter limit of any `SQLite` build.
const MAX_BOUND_PARAMETERS: usize = 999;

const BLOG_PARAMS: usize = 4;
const AUTOR_PARAMS: usize = 5;

const BLOG_COLUMNS: &str = "BlogId, Title, SubTitle, DateTimeAdd";
const AUTOR_COLUMNS: &str = "AutorId, Name, Surname, DateTimeAdd, BlogId";
const BLOG_VALUES: &str = "(?, ?, ?, COALESCE(?, CURRENT_TIMESTAMP))";
const AUTOR_VALUES: &str = "(?, ?, ?, COALESCE(?, CURRENT_TIMESTAMP), ?)";

const MEMORY_LOCATION: &str = ":memory:";

/// Distinct row counts kept prepared per bulk statement.
const CACHED_ROW_COUNTS: usize = 4;

pub struct SqliteBackend {
    connection: Connection,
    namespace: String,
    change_set: ChangeSet,
}

impl SqliteBackend {
    /// Opens a private connection and attaches the storage location under `namespace`.
    ///
    /// # Errors
    ///
    /// On invalid namespace or path, or when the database cannot be opened.
    pub fn open(connection_string: &ConnectionString, namespace: &str) -> Result<Self> {
        if !is_identifier(namespace) {
            return Err(BenchError::InvalidConfig(format!(
                "Namespace is not a plain identifier: {namespace}"
            )));
        }

        let location = match &connection_string.location {
            StorageLocation::File(path) => path.to_str().ok_or_else(|| {
                BenchError::InvalidConfig(format!("Non UTF-8 path: {}", path.display()))
            })?,
            StorageLocation::Memory => MEMORY_LOCATION,
        };

        let connection = sqlite::open(MEMORY_LOCATION)?;
        connection.execute("PRAGMA foreign_keys = ON")?;
        {
            let mut attach = connection.prepare(format!("ATTACH DATABASE ? AS {namespace}"))?;
            attach.bind((1, location))?;
            while let State::Row = attach.next()? {}
        }

        info!("Opened {location} as namespace {namespace}");

        Ok(Self {
            connection,
            namespace: namespace.into(),
            change_set: ChangeSet::new(),
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn schema(&self) -> DatabaseSchema {
        DatabaseSchema::new(&self.namespace)
    }

    /// # Errors
    ///
    /// On query failure.
    pub fn is_table_exist(&self, table_name: &str) -> Result<bool> {
        Ok(self
            .schema_object_names("table")?
            .iter()
            .any(|name| name == table_name))
    }

    /// # Errors
    ///
    /// On query failure.
    pub fn index_names(&self) -> Result<Vec<String>> {
        self.schema_object_names("index")
    }

    fn schema_object_names(&self, object_type: &str) -> Result<Vec<String>> {
        let mut statement = self.connection.prepare(format!(
            "SELECT name FROM {}.sqlite_master WHERE type = ? AND name NOT LIKE 'sqlite_%' ORDER BY name",
            self.namespace
        ))?;
        statement.bind((1, object_type))?;

        let mut names = vec![];
        while let State::Row = statement.next()? {
            names.push(statement.read::<String, _>("name")?);
        }
        Ok(names)
    }

    fn in_transaction<T>(&self, body: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.connection.execute("BEGIN IMMEDIATE")?;

        let result = body(&self.connection).and_then(|out| {
            self.connection.execute("COMMIT")?;
            Ok(out)
        });

        if result.is_err() {
            if let Err(err) = self.connection.execute("ROLLBACK") {
                warn!("Rollback failed: {err}");
            }
        }

        result
    }
}

impl StorageBackend for SqliteBackend {
    fn ensure_schema(&mut self) -> Result<bool> {
        let schema = self.schema();

        let mut created = false;
        for table_name in schema.table_names() {
            if !self.is_table_exist(table_name)? {
                created = true;
            }
        }

        for statement in schema.ddl() {
            debug!("DDL: {statement}");
            self.connection.execute(&statement)?;
        }

        if created {
            info!("Created schema {}", self.namespace);
        }
        Ok(created)
    }

    fn stage_insert(&mut self, blog: Blog) {
        self.change_set.stage_insert(blog);
    }

    fn stage_update(&mut self, blog: Blog, mutator: &dyn Fn(&mut Blog)) {
        self.change_set.stage_update(blog, mutator);
    }

    fn pending_changes(&self) -> usize {
        self.change_set.len()
    }

    fn commit(&mut self) -> Result<usize> {
        let mut changes = self.change_set.drain();
        if changes.is_empty() {
            return Ok(0);
        }

        let applied = self.in_transaction(|connection| {
            let mut writer = RowWriter::new(connection, &self.namespace)?;
            for change in &mut changes {
                match change {
                    Change::Insert(blog) => writer.insert(blog)?,
                    Change::Update(blog) => writer.update(blog)?,
                }
            }
            Ok(changes.len())
        })?;

        debug!("Committed {applied} changes");
        Ok(applied)
    }

    fn bulk_insert(&mut self, blogs: &mut [Blog], config: &BulkConfig) -> Result<usize> {
        if blogs.is_empty() {
            return Ok(0);
        }

        let mut order: Vec<usize> = (0..blogs.len()).collect();
        if !config.preserve_insert_order {
            order.sort_by_key(|&idx| (blogs[idx].id.is_none(), blogs[idx].id));
        }

        let written = self.in_transaction(|connection| {
            let mut blog_insert = MultiRowInsert::new(
                connection,
                format!("INSERT INTO {}.Blogs ({BLOG_COLUMNS}) VALUES ", self.namespace),
                BLOG_VALUES,
            );
            let mut autor_insert = MultiRowInsert::new(
                connection,
                format!("INSERT INTO {}.Autors ({AUTOR_COLUMNS}) VALUES ", self.namespace),
                AUTOR_VALUES,
            );
            let mut row_writer = RowWriter::new(connection, &self.namespace)?;

            for chunk in order.chunks(MAX_BOUND_PARAMETERS / BLOG_PARAMS) {
                let fully_keyed = chunk.iter().all(|&idx| {
                    let blog = &blogs[idx];
                    blog.id.is_some() && blog.authors.iter().all(|autor| autor.id.is_some())
                });

                if !fully_keyed {
                    // Backend-assigned keys have to be read back row by row.
                    for &idx in chunk {
                        if config.set_output_identity {
                            row_writer.insert(&mut blogs[idx])?;
                        } else {
                            row_writer.insert(&mut blogs[idx].clone())?;
                        }
                    }
                    continue;
                }

                let chunk_blogs: Vec<&Blog> = chunk.iter().map(|&idx| &blogs[idx]).collect();
                blog_insert.execute(&chunk_blogs, |statement, offset, blog| {
                    bind_blog(statement, offset, blog)
                })?;

                let chunk_autors: Vec<(&Autor, Option<i64>)> = chunk_blogs
                    .iter()
                    .flat_map(|blog| blog.authors.iter().map(|autor| (autor, blog.id)))
                    .collect();
                for autor_chunk in chunk_autors.chunks(MAX_BOUND_PARAMETERS / AUTOR_PARAMS) {
                    autor_insert.execute(autor_chunk, |statement, offset, (autor, owner)| {
                        bind_autor(statement, offset, autor, *owner)
                    })?;
                }

                if config.set_output_identity {
                    for &idx in chunk {
                        if let Some(id) = blogs[idx].id {
                            blogs[idx].assign_id(id);
                        }
                    }
                }

                debug!("Bulk wrote {} blogs", chunk.len());
            }

            Ok(blogs.len())
        })?;

        info!("Bulk inserted {written} blogs");
        Ok(written)
    }

    fn count(&self, table: Table) -> Result<u64> {
        let mut statement = self.connection.prepare(format!(
            "SELECT COUNT(*) AS total FROM {}.{}",
            self.namespace,
            table.name()
        ))?;

        let total = match statement.next()? {
            State::Row => statement.read::<i64, _>("total")?,
            State::Done => 0,
        };
        row_count(total)
    }

    fn load_blogs(&self) -> Result<Vec<Blog>> {
        let mut statement = self.connection.prepare(format!(
            "SELECT {BLOG_COLUMNS} FROM {}.Blogs ORDER BY BlogId",
            self.namespace
        ))?;

        let mut blogs = vec![];
        while let State::Row = statement.next()? {
            blogs.push(Blog {
                id: Some(statement.read::<i64, _>("BlogId")?),
                title: statement.read::<String, _>("Title")?,
                subtitle: statement.read::<String, _>("SubTitle")?,
                created_at: Some(statement.read::<String, _>("DateTimeAdd")?),
                authors: vec![],
            });
        }
        Ok(blogs)
    }

    fn load_autors(&self) -> Result<Vec<Autor>> {
        let mut statement = self.connection.prepare(format!(
            "SELECT {AUTOR_COLUMNS} FROM {}.Autors ORDER BY AutorId",
            self.namespace
        ))?;

        let mut autors = vec![];
        while let State::Row = statement.next()? {
            autors.push(Autor {
                id: Some(statement.read::<i64, _>("AutorId")?),
                name: statement.read::<String, _>("Name")?,
                surname: statement.read::<String, _>("Surname")?,
                created_at: Some(statement.read::<String, _>("DateTimeAdd")?),
                blog_id: Some(statement.read::<i64, _>("BlogId")?),
            });
        }
        Ok(autors)
    }
}

impl Drop for SqliteBackend {
    fn drop(&mut self) {
        if !self.change_set.is_empty() {
            warn!(
                "Discarding {} uncommitted changes",
                self.change_set.len()
            );
        }
        debug!("Closing namespace {}", self.namespace);
    }
}

fn row_count(total: i64) -> Result<u64> {
    u64::try_from(total).map_err(|_| BenchError::Storage(format!("Invalid row count {total}")))
}

fn bind_blog(statement: &mut Statement<'_>, offset: usize, blog: &Blog) -> Result<()> {
    statement.bind((offset + 1, blog.id))?;
    statement.bind((offset + 2, blog.title.as_str()))?;
    statement.bind((offset + 3, blog.subtitle.as_str()))?;
    statement.bind((offset + 4, blog.created_at.as_deref()))?;
    Ok(())
}

fn bind_autor(
    statement: &mut Statement<'_>,
    offset: usize,
    autor: &Autor,
    owner: Option<i64>,
) -> Result<()> {
    statement.bind((offset + 1, autor.id))?;
    statement.bind((offset + 2, autor.name.as_str()))?;
    statement.bind((offset + 3, autor.surname.as_str()))?;
    statement.bind((offset + 4, autor.created_at.as_deref()))?;
    statement.bind((offset + 5, owner))?;
    Ok(())
}

/// Prepared single-row statements for change set commits.
struct RowWriter<'c> {
    insert_blog: Statement<'c>,
    insert_autor: Statement<'c>,
    update_blog: Statement<'c>,
}

impl<'c> RowWriter<'c> {
    fn new(connection: &'c Connection, namespace: &str) -> Result<Self> {
        Ok(Self {
            insert_blog: connection.prepare(format!(
                "INSERT INTO {namespace}.Blogs ({BLOG_COLUMNS}) VALUES {BLOG_VALUES} RETURNING BlogId"
            ))?,
            insert_autor: connection.prepare(format!(
                "INSERT INTO {namespace}.Autors ({AUTOR_COLUMNS}) VALUES {AUTOR_VALUES} RETURNING AutorId"
            ))?,
            update_blog: connection.prepare(format!(
                "UPDATE {namespace}.Blogs SET Title = ?, SubTitle = ? WHERE BlogId = ? RETURNING BlogId"
            ))?,
        })
    }

    /// Writes the blog and its authors, assigning the stored identifiers back.
    fn insert(&mut self, blog: &mut Blog) -> Result<()> {
        self.insert_blog.reset()?;
        bind_blog(&mut self.insert_blog, 0, blog)?;
        let blog_id = read_returned_key(&mut self.insert_blog, "BlogId")?;
        blog.assign_id(blog_id);

        for autor in &mut blog.authors {
            self.insert_autor.reset()?;
            bind_autor(&mut self.insert_autor, 0, autor, Some(blog_id))?;
            autor.id = Some(read_returned_key(&mut self.insert_autor, "AutorId")?);
        }

        Ok(())
    }

    fn update(&mut self, blog: &Blog) -> Result<()> {
        let Some(blog_id) = blog.id else {
            return Err(BenchError::MissingIdentity(Table::Blogs.name()));
        };

        self.update_blog.reset()?;
        self.update_blog.bind((1, blog.title.as_str()))?;
        self.update_blog.bind((2, blog.subtitle.as_str()))?;
        self.update_blog.bind((3, blog_id))?;

        match self.update_blog.next()? {
            State::Row => {
                self.update_blog.reset()?;
                Ok(())
            }
            State::Done => Err(BenchError::NotFound {
                table: Table::Blogs.name(),
                id: blog_id,
            }),
        }
    }
}

fn read_returned_key(statement: &mut Statement<'_>, column: &str) -> Result<i64> {
    match statement.next()? {
        State::Row => {
            let key = statement.read::<i64, _>(column)?;
            statement.reset()?;
            Ok(key)
        }
        State::Done => Err(BenchError::Storage(format!(
            "Insert returned no {column}"
        ))),
    }
}

/// `INSERT ... VALUES (..), (..)` with the statement cached per row count.
struct MultiRowInsert<'c> {
    connection: &'c Connection,
    head: String,
    row: &'static str,
    cached: IndexMap<usize, Statement<'c>>,
}

impl<'c> MultiRowInsert<'c> {
    fn new(connection: &'c Connection, head: String, row: &'static str) -> Self {
        Self {
            connection,
            head,
            row,
            cached: IndexMap::new(),
        }
    }

    fn execute<T>(
        &mut self,
        rows: &[T],
        bind_row: impl Fn(&mut Statement<'c>, usize, &T) -> Result<()>,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let params_per_row = self.row.matches('?').count();
        let statement = self.statement(rows.len())?;
        statement.reset()?;
        for (row_idx, row) in rows.iter().enumerate() {
            bind_row(&mut *statement, row_idx * params_per_row, row)?;
        }
        while let State::Row = statement.next()? {}

        Ok(())
    }

    fn statement(&mut self, row_count: usize) -> Result<&mut Statement<'c>> {
        if !self.cached.contains_key(&row_count) {
            if self.cached.len() >= CACHED_ROW_COUNTS {
                self.cached.shift_remove_index(0);
            }

            let sql = format!("{}{}", self.head, vec![self.row; row_count].join(", "));
            debug!("Preparing bulk statement for {row_count} rows");
            self.cached
                .insert(row_count, self.connection.prepare(sql)?);
        }

        self.cached
            .get_mut(&row_count)
            .ok_or_else(|| BenchError::Storage("No prepared bulk statement".into()))
    }

    #[cfg(test)]
    fn prepared_row_counts(&self) -> Vec<usize> {
        self.cached.keys().copied().collect()
    }
}
