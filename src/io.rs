use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::iter::ParallelBridge;
use rayon::prelude::ParallelIterator;

use crate::data::{Item, Rating};

/// Reads an item catalog from a CSV file with an `item_id,title,attributes`
/// header. Attribute text may contain commas when quoted.
pub fn read_catalog(items_path: &str) -> Result<Vec<Item>> {
    let mut reader = csv::Reader::from_path(items_path)
        .with_context(|| format!("Cannot open catalog file {}", items_path))?;
    let mut items = Vec::new();
    for record in reader.deserialize() {
        let item: Item = record?;
        items.push(item);
    }
    Ok(items)
}

/// Reads whitespace-separated `user_id item_id rating` lines, header skipped.
/// Malformed lines are dropped.
pub fn read_ratings(ratings_path: &str) -> Result<Vec<Rating>> {
    let mut line_iterator = create_buffered_line_reader(ratings_path)
        .with_context(|| format!("Cannot open ratings file {}", ratings_path))?;
    line_iterator.next(); // skip header
    let ratings = line_iterator
        .par_bridge()
        .filter_map(|result| {
            let rawline = result.ok()?;
            let mut parts = rawline.split_whitespace();
            let user_id = parts.next()?.parse().ok()?;
            let item_id = parts.next()?.parse().ok()?;
            let value = parts.next()?.parse().ok()?;
            Some(Rating {
                user_id,
                item_id,
                value,
            })
        })
        .collect();
    Ok(ratings)
}

fn create_buffered_line_reader<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}
