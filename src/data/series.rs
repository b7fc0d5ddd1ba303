//! Series id construction for CPI item codes.

use crate::domain::{ItemRecord, ItemTable, SeriesId};

/// CPI-U, U.S. city average, not seasonally adjusted.
pub const SERIES_PREFIX: &str = "CUUR0000";

pub fn series_id_for(item: &ItemRecord) -> SeriesId {
    SeriesId::new(format!("{SERIES_PREFIX}{}", item.item_code))
}

/// Series ids for every input row, in input order.
pub fn series_ids(table: &ItemTable) -> Vec<SeriesId> {
    table.items().iter().map(series_id_for).collect()
}

/// Recover the item code from a series id (`None` if the prefix is absent).
pub fn item_code_of(id: &SeriesId) -> Option<&str> {
    id.as_str().strip_prefix(SERIES_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str) -> ItemRecord {
        ItemRecord {
            item_code: code.to_string(),
            item_name: format!("name {code}"),
        }
    }

    #[test]
    fn ids_follow_input_rows() {
        let table: ItemTable = ["SA0", "SAF", "SA0L1E", "SA0"].into_iter().map(item).collect();
        let ids = series_ids(&table);

        assert_eq!(ids.len(), table.len());
        for (id, row) in ids.iter().zip(table.items()) {
            assert_eq!(id.as_str(), format!("CUUR0000{}", row.item_code));
            assert_eq!(item_code_of(id), Some(row.item_code.as_str()));
        }
    }

    #[test]
    fn foreign_ids_have_no_item_code() {
        assert_eq!(item_code_of(&SeriesId::new("CUSR0000SA0")), None);
        assert_eq!(item_code_of(&SeriesId::new("CUUR0000")), Some(""));
    }
}
