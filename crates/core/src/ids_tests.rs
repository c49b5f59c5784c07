// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn gui_secret_generate_is_twenty_hex_chars() {
    let secret = GuiSecret::generate();
    assert_eq!(secret.as_str().len(), 20);
    assert!(secret.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
}

#[test]
fn gui_secret_generate_is_unique() {
    assert_ne!(GuiSecret::generate(), GuiSecret::generate());
}

#[test]
fn gui_secret_parse_accepts_valid_cookie() {
    let raw = "0123456789abcdef0123";
    assert_eq!(GuiSecret::parse(raw).unwrap().as_str(), raw);
}

#[test]
fn gui_secret_parse_lowercases() {
    let parsed = GuiSecret::parse("0123456789ABCDEF0123").unwrap();
    assert_eq!(parsed.as_str(), "0123456789abcdef0123");
}

#[test]
fn gui_secret_parse_rejects_wrong_length() {
    assert!(GuiSecret::parse("0123456789abcdef012").is_none());
    assert!(GuiSecret::parse("0123456789abcdef01234").is_none());
}

#[test]
fn gui_secret_parse_rejects_non_hex() {
    assert!(GuiSecret::parse("012345678-abcdef0123").is_none());
}

#[test]
fn gui_secret_parse_rejects_empty() {
    assert!(GuiSecret::parse("").is_none());
}

#[test]
fn db_name_generate_has_prefix_and_length() {
    let db = DbName::generate();
    assert!(db.as_str().starts_with("db_"));
    assert_eq!(db.as_str().len(), "db_".len() + 16);
}

#[test]
fn db_name_parse_roundtrips_generated_name() {
    let db = DbName::generate();
    assert_eq!(DbName::parse(db.as_str()).unwrap(), db);
}

#[test]
fn db_name_parse_rejects_missing_prefix() {
    assert!(DbName::parse("0123456789abcdef").is_none());
}

#[test]
fn db_name_parse_rejects_wrong_suffix_length() {
    assert!(DbName::parse("db_0123456789abcd").is_none());
}
