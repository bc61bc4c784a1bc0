// i18n.rs
//
// Runtime string table:
// - assets/i18n.json, format { "<lang>": { "key": "value" } }
// - searched next to the executable, then in the working dir, then the copy
//   compiled into the binary
// - Lookup: tr("key") / tr_with("key", [("name", "...")]) with {name} placeholders
// - Missing keys fall back to English, then to the key itself

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

/// (code, native name) for the Language menu.
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];

const BUILTIN_TABLE: &str = include_str!("../assets/i18n.json");

type Table = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct I18n {
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn parse_table(text: &str) -> Option<Table> {
    match serde_json::from_str(text) {
        Ok(t) => Some(t),
        Err(e) => {
            log::warn!("ignoring malformed string table: {}", e);
            None
        }
    }
}

fn find_table_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = Path::new("assets").join("i18n.json");
    p.exists().then_some(p)
}

fn load_table() -> Table {
    find_table_file()
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|text| parse_table(&text))
        .or_else(|| parse_table(BUILTIN_TABLE))
        .unwrap_or_default()
}

fn build(lang: &str, mut table: Table) -> I18n {
    if !table.contains_key(lang) {
        log::warn!("no strings for language '{}', using {}", lang, FALLBACK_LANG);
    }
    let fallback_map = table.get(FALLBACK_LANG).cloned().unwrap_or_default();
    let map = table.remove(lang).unwrap_or_default();
    I18n {
        map,
        fallback_map,
    }
}

/// Initialize global strings. Safe to call again to switch language.
pub fn init(lang: impl Into<String>) {
    let i = build(&lang.into(), load_table());

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

impl I18n {
    fn lookup(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Get localized text by key. If key missing, returns key itself.
pub fn tr(key: &str) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.lookup(key),
        None => key.to_string(),
    }
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

fn substitute(mut s: String, args: &[(&str, String)]) -> String {
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_language() {
        let table = parse_table(BUILTIN_TABLE).unwrap();
        let en = &table[FALLBACK_LANG];
        for (code, _) in LANGUAGES {
            let strings = table.get(code).unwrap_or_else(|| panic!("missing {}", code));
            for key in en.keys() {
                assert!(strings.contains_key(key), "{} lacks {}", code, key);
            }
        }
    }

    #[test]
    fn lookup_falls_back_to_english_then_key() {
        let table = parse_table(r#"{ "en": { "a": "A", "b": "B" }, "zh-Hans": { "a": "甲" } }"#).unwrap();
        let i = build("zh-Hans", table);
        assert_eq!(i.lookup("a"), "甲");
        assert_eq!(i.lookup("b"), "B");
        assert_eq!(i.lookup("c"), "c");
    }

    #[test]
    fn placeholders_are_substituted() {
        let s = substitute(
            "{path}: {w}x{h}".to_string(),
            &[("path", "moon.jpg".to_string()), ("w", "8".to_string())],
        );
        assert_eq!(s, "moon.jpg: 8x{h}");
    }
}
