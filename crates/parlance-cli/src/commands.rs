//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use parlance_compiler::header::parse_header;
use parlance_core::Interner;
use parlance_message::MessageSplitter;
use parlance_syntax::{LexicalScanner, SourceText, TokenKind, scanner::body_registry};

pub fn split(pattern: &str) -> Result<(), String> {
    let mut interner = Interner::new();
    let splitter = MessageSplitter::split(pattern, &mut interner).map_err(|e| e.to_string())?;
    println!("message:    {}", splitter.name());
    println!("arguments:  {}", splitter.argument_count());
    println!("leaf slots: {}", splitter.underscore_count());
    if splitter.section_checkpoint_count() > 0 {
        println!("sections:   {}", splitter.section_checkpoint_count());
    }
    println!();
    print!("{}", splitter.program().dump(&interner));
    Ok(())
}

pub fn scan(path: &Path) -> Result<(), String> {
    let source = read_source(path)?;
    let scanner = LexicalScanner::new(Arc::new(source), Arc::new(body_registry()));

    let mut position = 0;
    loop {
        let candidates = scanner.candidates_at(position);
        for failure in &candidates.failures {
            eprintln!("warning: {failure}");
        }
        // Advance through the longest candidate; forks print together.
        let Some(furthest) = candidates.tokens.iter().map(|t| t.end()).max() else {
            break;
        };
        for token in &candidates.tokens {
            if token.kind() == TokenKind::End {
                return Ok(());
            }
            println!(
                "{:>5}..{:<5} {:<12} {:?}",
                token.start(),
                token.end(),
                kind_name(token.kind()),
                token.lexeme()
            );
        }
        if furthest == position {
            return Err(format!("scanner made no progress at offset {position}"));
        }
        position = furthest;
    }
    Ok(())
}

pub fn header(path: &Path) -> Result<(), String> {
    let source = read_source(path)?;
    let header = parse_header(&Arc::new(source)).map_err(|e| e.to_string())?;
    println!("module:   {}", header.name);
    if !header.versions.is_empty() {
        println!("versions: {}", join(&header.versions));
    }
    for import in header.extends.iter() {
        println!("extends:  {}", describe_import(import));
    }
    for import in header.uses.iter() {
        println!("uses:     {}", describe_import(import));
    }
    if !header.names.is_empty() {
        println!("names:    {}", join(&header.names));
    }
    for pragma in &header.pragmas {
        println!("pragma:   {pragma}");
    }
    println!("body at:  offset {}", header.body_start);
    Ok(())
}

fn read_source(path: &Path) -> Result<SourceText, String> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    SourceText::read_from(&name, &mut file).map_err(|e| format!("{}: {e}", path.display()))
}

fn kind_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::End => "end",
        TokenKind::Keyword => "keyword",
        TokenKind::Literal => "literal",
        TokenKind::Operator => "operator",
        TokenKind::Comment => "comment",
        TokenKind::Whitespace => "whitespace",
    }
}

fn join(items: &[Arc<str>]) -> String {
    items
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_import(import: &parlance_compiler::ModuleImport) -> String {
    let mut out = import.name.to_string();
    if !import.versions.is_empty() {
        out.push_str(&format!(" ({})", join(&import.versions)));
    }
    if let Some(filtered) = &import.filtered_names {
        out.push_str(&format!(" = ({})", join(filtered)));
    }
    out
}
