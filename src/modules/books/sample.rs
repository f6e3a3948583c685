//! The starter collection loaded by the UI's seed button and `libris seed`.

use super::models::NewBook;

const SAMPLE: &[(&str, &str, &str, i32, i64)] = &[
    ("The Hobbit", "J.R.R. Tolkien", "Fantasy", 1937, 5),
    ("1984", "George Orwell", "Dystopian", 1949, 3),
    ("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960, 4),
    ("The Martian", "Andy Weir", "Sci-Fi", 2011, 6),
    ("Becoming", "Michelle Obama", "Biography", 2018, 2),
    ("Project Hail Mary", "Andy Weir", "Sci-Fi", 2021, 7),
    ("Atomic Habits", "James Clear", "Self-Help", 2018, 0),
];

pub fn sample_books() -> Vec<NewBook> {
    SAMPLE
        .iter()
        .map(|&(title, author, category, published_year, available_copies)| NewBook {
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            published_year,
            available_copies,
        })
        .collect()
}
