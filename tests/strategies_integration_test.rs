use blogbench::{
    backend::{BulkConfig, StorageBackend},
    common::BenchError,
    config::ConnectionString,
    entity::{Autor, Blog},
    generator::generate_blogs,
    schema::Table,
    sqlite_backend::SqliteBackend,
    strategies::{append_title_suffix, insert_in_bulk, insert_row_by_row},
};
use rand::seq::SliceRandom;

fn memory_backend() -> SqliteBackend {
    let mut backend = SqliteBackend::open(&ConnectionString::memory(), "test").unwrap();
    assert!(backend.ensure_schema().unwrap());
    backend
}

fn assert_authors_linked(backend: &SqliteBackend, expected: usize) {
    let blogs = backend.load_blogs().unwrap();
    let autors = backend.load_autors().unwrap();

    assert_eq!(expected, blogs.len());
    assert_eq!(expected, autors.len());
    for autor in &autors {
        let owner = blogs.iter().find(|blog| blog.id == autor.blog_id);
        assert!(owner.is_some(), "Orphan author: {autor:?}");
    }
}

#[test]
fn test_row_by_row_insert_persists_everything() {
    let mut backend = memory_backend();

    let applied = insert_row_by_row(&mut backend, generate_blogs(1..=250)).unwrap();

    assert_eq!(250, applied);
    assert_eq!(0, backend.pending_changes());
    assert_eq!(250, backend.count(Table::Blogs).unwrap());
    assert_eq!(250, backend.count(Table::Autors).unwrap());
    assert_authors_linked(&backend, 250);

    // Author i belongs to blog i.
    for autor in backend.load_autors().unwrap() {
        assert_eq!(autor.id, autor.blog_id);
        assert_eq!(format!("autor {}", autor.id.unwrap()), autor.name);
    }
}

#[test]
fn test_empty_batches_persist_nothing() {
    let mut backend = memory_backend();

    assert_eq!(0, insert_row_by_row(&mut backend, vec![]).unwrap());
    assert_eq!(
        0,
        insert_in_bulk(&mut backend, &mut [], &BulkConfig::default()).unwrap()
    );
    assert_eq!(0, append_title_suffix(&mut backend, " 2").unwrap());

    assert_eq!(0, backend.count(Table::Blogs).unwrap());
    assert_eq!(0, backend.count(Table::Autors).unwrap());
}

#[test]
fn test_duplicate_title_rolls_back_commit() {
    let mut backend = memory_backend();
    insert_row_by_row(&mut backend, generate_blogs(1..=3)).unwrap();

    // Same title as blog 1, otherwise unique.
    let duplicate = Blog::new(Some(10), "Blog 1".into(), "Other".into()).with_author(Autor::new(
        Some(10),
        "autor 10".into(),
        "Surname 10".into(),
    ));
    let mut batch = generate_blogs(4..=6);
    batch.push(duplicate);

    let result = insert_row_by_row(&mut backend, batch);

    assert!(matches!(result, Err(BenchError::Constraint(_))));
    assert_eq!(0, backend.pending_changes());
    assert_eq!(3, backend.count(Table::Blogs).unwrap());
    assert_eq!(3, backend.count(Table::Autors).unwrap());
}

#[test]
fn test_duplicate_author_name_rolls_back_commit() {
    let mut backend = memory_backend();

    let mut batch = generate_blogs(1..=2);
    batch[1].authors[0].name = "autor 1".into();

    let err = insert_row_by_row(&mut backend, batch).unwrap_err();

    assert!(err.is_constraint_violation());
    assert_eq!(0, backend.count(Table::Blogs).unwrap());
    assert_eq!(0, backend.count(Table::Autors).unwrap());
}

#[test]
fn test_title_length_is_enforced() {
    let mut backend = memory_backend();

    let mut batch = generate_blogs(1..=1);
    batch[0].title = "x".repeat(129);
    assert!(insert_row_by_row(&mut backend, batch)
        .unwrap_err()
        .is_constraint_violation());

    let mut batch = generate_blogs(1..=1);
    batch[0].title = "x".repeat(128);
    assert_eq!(1, insert_row_by_row(&mut backend, batch).unwrap());
}

#[test]
fn test_title_suffix_changes_only_title() {
    let mut backend = memory_backend();
    insert_row_by_row(&mut backend, generate_blogs(1..=50)).unwrap();
    let before = backend.load_blogs().unwrap();

    let updated = append_title_suffix(&mut backend, " 2").unwrap();
    let after = backend.load_blogs().unwrap();

    assert_eq!(50, updated);
    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.id, new.id);
        assert_eq!(format!("{} 2", old.title), new.title);
        assert_eq!(old.subtitle, new.subtitle);
        assert_eq!(old.created_at, new.created_at);
    }
    assert_eq!(50, backend.count(Table::Autors).unwrap());
}

#[test]
fn test_update_of_missing_blog_fails() {
    let mut backend = memory_backend();

    backend.stage_update(generate_blogs(7..=7).remove(0), &|blog| {
        blog.title.push_str(" 2");
    });
    let result = backend.commit();
    assert!(matches!(result, Err(BenchError::NotFound { id: 7, .. })));

    let mut orphan = generate_blogs(8..=8).remove(0);
    orphan.id = None;
    backend.stage_update(orphan, &|_| {});
    assert!(matches!(
        backend.commit(),
        Err(BenchError::MissingIdentity(_))
    ));
}

#[test]
fn test_bulk_insert_preserves_submission_order() {
    let mut backend = memory_backend();
    let mut blogs = generate_blogs(1..=1000);
    let submitted: Vec<Option<i64>> = blogs.iter().map(|blog| blog.id).collect();

    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: true,
    };
    let written = insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();

    assert_eq!(1000, written);
    let scanned: Vec<Option<i64>> = backend
        .load_blogs()
        .unwrap()
        .iter()
        .map(|blog| blog.id)
        .collect();
    assert_eq!(submitted, scanned);
    assert_authors_linked(&backend, 1000);
}

#[test]
fn test_bulk_insert_unordered_input() {
    let mut backend = memory_backend();
    let mut blogs = generate_blogs(1..=600);
    blogs.shuffle(&mut rand::rng());

    let config = BulkConfig {
        preserve_insert_order: false,
        set_output_identity: false,
    };
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();

    let ids: Vec<i64> = backend
        .load_blogs()
        .unwrap()
        .iter()
        .filter_map(|blog| blog.id)
        .collect();
    assert_eq!((1..=600).collect::<Vec<i64>>(), ids);
    assert_authors_linked(&backend, 600);
}

#[test]
fn test_bulk_insert_writes_back_generated_identity() {
    let mut backend = memory_backend();
    insert_row_by_row(&mut backend, generate_blogs(1..=5)).unwrap();

    let unkeyed = || {
        (0..3)
            .map(|i| {
                Blog::new(None, format!("Fresh {i}"), "Fresh".into())
                    .with_author(Autor::new(None, format!("fresh {i}"), "Fresh".into()))
            })
            .collect::<Vec<Blog>>()
    };

    let mut blogs = unkeyed();
    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: true,
    };
    assert_eq!(3, insert_in_bulk(&mut backend, &mut blogs, &config).unwrap());

    for blog in &blogs {
        let id = blog.id.unwrap();
        assert!(id > 5);
        assert!(blog.authors[0].id.is_some());
        assert_eq!(Some(id), blog.authors[0].blog_id);
    }

    let mut blogs: Vec<Blog> = unkeyed()
        .into_iter()
        .map(|mut blog| {
            blog.title.push_str(" again");
            blog.authors[0].name.push_str(" again");
            blog
        })
        .collect();
    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: false,
    };
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();

    assert!(blogs.iter().all(|blog| blog.id.is_none()));
    assert_eq!(11, backend.count(Table::Blogs).unwrap());
    assert_authors_linked(&backend, 11);
}

#[test]
fn test_bulk_insert_duplicate_rolls_back() {
    let mut backend = memory_backend();
    let mut blogs = generate_blogs(1..=700);
    blogs[650].title = "Blog 3".into();

    let result = insert_in_bulk(&mut backend, &mut blogs, &BulkConfig::default());

    assert!(matches!(result, Err(BenchError::Constraint(_))));
    assert_eq!(0, backend.count(Table::Blogs).unwrap());
    assert_eq!(0, backend.count(Table::Autors).unwrap());
}

#[test]
fn test_bulk_insert_after_row_by_row_conflicting_key() {
    let mut backend = memory_backend();
    insert_row_by_row(&mut backend, generate_blogs(1..=10)).unwrap();

    let mut blogs = generate_blogs(10..=20);
    let err = insert_in_bulk(&mut backend, &mut blogs, &BulkConfig::default()).unwrap_err();

    assert!(err.is_constraint_violation());
    assert_eq!(10, backend.count(Table::Blogs).unwrap());
}

#[test]
fn test_bulk_insert_generated_keys_follow_submission_order() {
    let mut backend = memory_backend();

    // Titles run backwards so neither title nor key order can fake the result.
    let mut blogs: Vec<Blog> = (0..600)
        .rev()
        .map(|i| {
            Blog::new(None, format!("T{i}"), "Reversed".into()).with_author(Autor::new(
                None,
                format!("a{i}"),
                "Reversed".into(),
            ))
        })
        .collect();
    let submitted: Vec<String> = blogs.iter().map(|blog| blog.title.clone()).collect();

    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: true,
    };
    assert_eq!(600, insert_in_bulk(&mut backend, &mut blogs, &config).unwrap());

    let scanned: Vec<String> = backend
        .load_blogs()
        .unwrap()
        .into_iter()
        .map(|blog| blog.title)
        .collect();
    assert_eq!(submitted, scanned);
    assert_authors_linked(&backend, 600);
}

#[test]
fn test_bulk_insert_order_flag_decides_generated_keys() {
    let mixed = || {
        vec![
            Blog::new(None, "Unkeyed".into(), "Mixed".into()).with_author(Autor::new(
                None,
                "unkeyed".into(),
                "Mixed".into(),
            )),
            Blog::new(Some(10), "Keyed".into(), "Mixed".into()).with_author(Autor::new(
                Some(10),
                "keyed".into(),
                "Mixed".into(),
            )),
        ]
    };
    let unkeyed_id = |backend: &SqliteBackend| {
        backend
            .load_blogs()
            .unwrap()
            .into_iter()
            .find(|blog| blog.title == "Unkeyed")
            .and_then(|blog| blog.id)
    };

    // Submission order: the unkeyed blog is written first and gets key 1.
    let mut backend = memory_backend();
    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: true,
    };
    let mut blogs = mixed();
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();
    assert_eq!(Some(1), unkeyed_id(&backend));
    assert_eq!(Some(1), blogs[0].id);

    // Key order: keyed blogs first, the unkeyed one lands after key 10.
    let mut backend = memory_backend();
    let config = BulkConfig {
        preserve_insert_order: false,
        set_output_identity: true,
    };
    let mut blogs = mixed();
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();
    assert_eq!(Some(11), unkeyed_id(&backend));
    assert_eq!(Some(11), blogs[0].id);
}

#[test]
fn test_bulk_insert_keyed_rows_write_back_owner_key() {
    let keyed_without_owner = || {
        let mut blogs = generate_blogs(1..=300);
        for blog in &mut blogs {
            blog.authors[0].blog_id = None;
        }
        blogs
    };

    let mut backend = memory_backend();
    let mut blogs = keyed_without_owner();
    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: true,
    };
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();
    for blog in &blogs {
        assert_eq!(blog.id, blog.authors[0].blog_id);
    }
    assert_authors_linked(&backend, 300);

    let mut backend = memory_backend();
    let mut blogs = keyed_without_owner();
    let config = BulkConfig {
        preserve_insert_order: true,
        set_output_identity: false,
    };
    insert_in_bulk(&mut backend, &mut blogs, &config).unwrap();
    assert!(blogs.iter().all(|blog| blog.authors[0].blog_id.is_none()));
    assert_authors_linked(&backend, 300);
}
