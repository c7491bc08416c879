//! Tests for the module header grammar.

use std::sync::Arc;

use indoc::indoc;
use parlance_syntax::SourceText;

use super::header::{ModuleImport, parse_header};

fn header_of(text: &str) -> super::header::ModuleHeader {
    parse_header(&Arc::new(SourceText::new("Test", text))).expect("header must parse")
}

fn header_err(text: &str) -> super::header::HeaderError {
    parse_header(&Arc::new(SourceText::new("Test", text))).expect_err("header must fail")
}

#[test]
fn minimal_header() {
    let header = header_of(r#"Module "Tiny" Body"#);
    assert_eq!(&*header.name, "Tiny");
    assert!(header.extends.is_empty());
    assert_eq!(header.body_start, 18);
}

#[test]
fn sections_in_any_order() {
    let header = header_of(indoc! {r#"
        Module "Full"
        Names "a", "b"
        Versions "1.0", "2.0"
        Pragma "method=1=_+_"
        Body
    "#});
    assert_eq!(header.versions.len(), 2);
    assert_eq!(header.names.len(), 2);
    assert_eq!(header.pragmas.len(), 1);
}

#[test]
fn imports_with_versions_and_filters() {
    let header = header_of(indoc! {r#"
        Module "Client"
        Extends "Base" ("1.0", "1.1"), "Other"
        Uses "Helper" = ("thing")
        Body
    "#});
    assert_eq!(
        header.extends,
        vec![
            ModuleImport {
                name: Arc::from("Base"),
                versions: vec![Arc::from("1.0"), Arc::from("1.1")],
                filtered_names: None,
            },
            ModuleImport {
                name: Arc::from("Other"),
                versions: vec![],
                filtered_names: None,
            },
        ]
    );
    assert_eq!(
        header.uses,
        vec![ModuleImport {
            name: Arc::from("Helper"),
            versions: vec![],
            filtered_names: Some(vec![Arc::from("thing")]),
        }]
    );
}

#[test]
fn versioned_and_filtered_import() {
    let header = header_of(indoc! {r#"
        Module "Client"
        Uses "Base" ("2.0") = ("x", "y")
        Body
    "#});
    let import = &header.uses[0];
    assert_eq!(import.versions, vec![Arc::from("2.0")]);
    assert_eq!(
        import.filtered_names,
        Some(vec![Arc::from("x"), Arc::from("y")])
    );
}

#[test]
fn comments_are_trivia_in_headers() {
    let header = header_of(indoc! {r#"
        /* provenance note */
        Module "Annotated" /* inline */ Body
    "#});
    assert_eq!(&*header.name, "Annotated");
}

#[test]
fn duplicate_sections_are_rejected() {
    let error = header_err(indoc! {r#"
        Module "Doubled"
        Names "a"
        Names "b"
        Body
    "#});
    assert!(error.message.contains("at most once"));
}

#[test]
fn missing_module_keyword() {
    let error = header_err(r#"Body"#);
    assert!(error.message.contains("Module"));
}

#[test]
fn unknown_section_is_rejected() {
    let error = header_err(r#"Module "Odd" Exports "x" Body"#);
    assert!(error.message.contains("unknown header section"));
}

#[test]
fn missing_body_is_rejected() {
    let error = header_err(r#"Module "未完" Names "a""#);
    assert!(error.message.contains("header section"));
}
