//! Extraction of per-city statistics tables from an agent reply
//!
//! The agent is prompted to answer in a rigid line format (`City: <name>`
//! followed by `Year: <Y>, Murder Count: <C>` lines). This module turns one
//! such free-text reply into an ordered city → rows mapping. The labels are a
//! fixed wire format; anything that does not match is dropped, never surfaced
//! as an error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker that separates city blocks in the reply.
const CITY_MARKER: &str = "City:";
/// Label carried by the year half of a data row.
const YEAR_LABEL: &str = "Year:";
/// Label carried by the count half of a data row.
const COUNT_LABEL: &str = "Murder Count:";
/// Literal a data row is split on, yielding the year and count halves.
const ROW_SEPARATOR: &str = ", Murder Count:";

/// One data row of a city table. Values are kept as raw trimmed text — the
/// upstream reply carries no numeric guarantee, so none is imposed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: String,
    pub count: String,
}

/// City name → ordered rows. Keys keep first-encounter order; a repeated city
/// name overwrites the rows but keeps its original position.
pub type CityTables = IndexMap<String, Vec<YearCount>>;

/// Extract per-city tables from a raw agent reply.
///
/// Returns an empty map for input with no `City:` marker or no valid rows.
/// Pure function of its input; never fails.
pub fn extract_city_tables(reply: &str) -> CityTables {
    let mut tables = CityTables::new();

    // Text before the first marker is not a city block.
    for block in reply.split(CITY_MARKER).skip(1) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let lines: Vec<&str> = block.lines().collect();
        if lines.len() < 2 {
            // A name with no lines after it cannot carry data rows.
            continue;
        }

        let city = lines[0].trim();
        let mut rows = Vec::new();

        for line in &lines[1..] {
            if !(line.contains(YEAR_LABEL) && line.contains(COUNT_LABEL)) {
                continue;
            }
            let parts: Vec<&str> = line.split(ROW_SEPARATOR).collect();
            if parts.len() != 2 {
                continue;
            }
            let year_part = parts[0].trim();
            let year = year_part
                .strip_prefix(YEAR_LABEL)
                .map(str::trim)
                .unwrap_or(year_part);
            rows.push(YearCount {
                year: year.to_string(),
                count: parts[1].trim().to_string(),
            });
        }

        if !rows.is_empty() {
            tables.insert(city.to_string(), rows);
        }
    }

    tables
}
