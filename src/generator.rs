use std::ops::RangeInclusive;

use crate::entity::{Autor, Blog};

#[must_use]
pub fn blog_for_index(i: i64) -> Blog {
    Blog::new(Some(i), format!("Blog {i}"), format!("Blog {i} subtitle")).with_author(Autor::new(
        Some(i),
        format!("autor {i}"),
        format!("Surname {i}"),
    ))
}

/// One blog with a single author per index of `range`.
#[must_use]
pub fn generate_blogs(range: RangeInclusive<i64>) -> Vec<Blog> {
    range.map(blog_for_index).collect()
}
