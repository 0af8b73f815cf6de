pub mod config;
pub mod free;
pub mod intersect;
pub mod normalize;
pub mod show;

use anyhow::Result;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
