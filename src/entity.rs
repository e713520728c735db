use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Option<i64>,
    pub title: String,
    pub subtitle: String,
    /// `None` takes the column default at insert time.
    pub created_at: Option<String>,
    /// Owned authors, in insertion order. Not populated on read-back.
    pub authors: Vec<Autor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autor {
    pub id: Option<i64>,
    pub name: String,
    pub surname: String,
    pub created_at: Option<String>,
    /// Owner key. Always written from the owning blog's identifier.
    pub blog_id: Option<i64>,
}

impl Blog {
    #[must_use]
    pub const fn new(id: Option<i64>, title: String, subtitle: String) -> Self {
        Self {
            id,
            title,
            subtitle,
            created_at: None,
            authors: vec![],
        }
    }

    #[must_use]
    pub fn with_author(mut self, autor: Autor) -> Self {
        self.authors.push(Autor {
            blog_id: self.id,
            ..autor
        });
        self
    }

    /// Propagates the blog identifier to the owner key of every author.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
        for autor in &mut self.authors {
            autor.blog_id = Some(id);
        }
    }
}

impl Autor {
    #[must_use]
    pub const fn new(id: Option<i64>, name: String, surname: String) -> Self {
        Self {
            id,
            name,
            surname,
            created_at: None,
            blog_id: None,
        }
    }
}
