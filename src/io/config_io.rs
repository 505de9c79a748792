use std::fs;
use std::path::Path;

use toml_edit::{DocumentMut, Item, Table, Value};

use crate::io::recovery::atomic_write;
use crate::io::store_io::{StoreError, config_path};
use crate::model::config::Config;

/// Read config.toml as an editable document. A missing file is an empty document.
pub fn read_config_doc(store_dir: &Path) -> Result<DocumentMut, StoreError> {
    let path = config_path(store_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(StoreError::Read { path, source }),
    };
    Ok(text.parse::<DocumentMut>()?)
}

/// Write the document back, preserving comments and layout.
pub fn write_config_doc(store_dir: &Path, doc: &DocumentMut) -> Result<(), StoreError> {
    atomic_write(&config_path(store_dir), doc.to_string().as_bytes())?;
    Ok(())
}

/// Look up a dotted key such as `search.threshold`.
pub fn get_value(doc: &DocumentMut, key: &str) -> Option<String> {
    let mut item: &Item = doc.as_item();
    for part in key.split('.') {
        item = item.get(part)?;
    }
    let mut value = item.as_value()?.clone();
    value.decor_mut().clear();
    Some(value.to_string())
}

/// Set a dotted key. The raw value is typed as bool, integer, float, or
/// falls back to a string. The result must still deserialize as `Config`.
pub fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<(), String> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, tables)) = parts.split_last() else {
        return Err("empty config key".to_string());
    };
    if leaf.is_empty() || tables.iter().any(|t| t.is_empty()) {
        return Err(format!("invalid config key '{}'", key));
    }

    let mut candidate = doc.clone();
    let mut table: &mut Table = candidate.as_table_mut();
    for name in tables {
        if !table.contains_key(name) {
            table.insert(name, Item::Table(Table::new()));
        }
        table = table
            .get_mut(name)
            .and_then(Item::as_table_mut)
            .ok_or_else(|| format!("'{}' is not a table", name))?;
    }
    // Index assignment keeps the existing key and the comments attached to it
    table[*leaf] = Item::Value(typed_value(raw));

    toml::from_str::<Config>(&candidate.to_string())
        .map_err(|e| format!("invalid value for {}: {}", key, e.message()))?
        .validate()
        .map_err(|e| format!("invalid value for {}: {}", key, e))?;
    *doc = candidate;
    Ok(())
}

fn typed_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::from(b)
    } else if let Ok(n) = raw.parse::<i64>() {
        Value::from(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::from(f)
    } else {
        Value::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store_io::{CONFIG_TEMPLATE, init_store, load_config};
    use tempfile::TempDir;

    #[test]
    fn unchanged_document_round_trips() {
        let tmp = TempDir::new().unwrap();
        let store = init_store(tmp.path(), false).unwrap();
        let doc = read_config_doc(&store).unwrap();
        write_config_doc(&store, &doc).unwrap();
        assert_eq!(fs::read_to_string(config_path(&store)).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn set_keeps_comments_and_updates_value() {
        let tmp = TempDir::new().unwrap();
        let store = init_store(tmp.path(), false).unwrap();
        let mut doc = read_config_doc(&store).unwrap();
        set_value(&mut doc, "search.threshold", "0.45").unwrap();
        write_config_doc(&store, &doc).unwrap();

        let text = fs::read_to_string(config_path(&store)).unwrap();
        assert!(text.contains("# smartdo configuration"));
        assert!(text.contains("threshold = 0.45"));
        assert_eq!(load_config(&store).unwrap().search.threshold, 0.45);
    }

    #[test]
    fn set_creates_missing_table() {
        let mut doc = DocumentMut::new();
        set_value(&mut doc, "voice.command", "stt --once").unwrap();
        assert_eq!(get_value(&doc, "voice.command").as_deref(), Some("\"stt --once\""));
    }

    #[test]
    fn set_rejects_wrong_type() {
        let mut doc: DocumentMut = "[search]\nthreshold = 0.3\n".parse().unwrap();
        assert!(set_value(&mut doc, "search.distance", "far").is_err());
        assert_eq!(get_value(&doc, "search.distance"), None);
    }

    #[test]
    fn set_rejects_threshold_outside_unit_range() {
        let mut doc: DocumentMut = "[search]\nthreshold = 0.3\n".parse().unwrap();
        for bad in ["1e30", "-1.0", "2.5"] {
            let err = set_value(&mut doc, "search.threshold", bad).unwrap_err();
            assert!(err.contains("between 0.0 and 1.0"), "{}", err);
        }
        assert_eq!(get_value(&doc, "search.threshold").as_deref(), Some("0.3"));
        set_value(&mut doc, "search.threshold", "1.0").unwrap();
    }

    #[test]
    fn get_missing_key() {
        let doc: DocumentMut = "[search]\nthreshold = 0.3\n".parse().unwrap();
        assert_eq!(get_value(&doc, "search.threshold").as_deref(), Some("0.3"));
        assert_eq!(get_value(&doc, "voice.command"), None);
    }
}
