//! `renpy` command-line tool.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use renpy_highlight::{
    DocumentProcessor, HighlightProcessor, HighlightProcessorConfig, Interval, LineIndex,
    ProcessingEdit,
};
use renpy_lang::LanguageConfig;
use renpy_syntax::{Node, Query, QueryCursor, Tree, language};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when every file was processed but some contained syntax errors.
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => LanguageConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LanguageConfig::default(),
    };
    tracing::debug!(name = %config.name, file_types = ?config.file_types, "language config");

    match cli.command {
        Command::Parse { paths, json, quiet } => parse(&config, &paths, json, quiet),
        Command::Highlight { path } => highlight(&config, &path).map(|()| true),
        Command::Query { query, paths } => run_query(&config, &query, &paths).map(|()| true),
        Command::NodeTypes => {
            println!("{}", serde_json::to_string_pretty(&language().node_types_json())?);
            Ok(true)
        }
    }
}

/// Expand directories into the files they contain that match the configured file types.
fn collect_files(config: &LanguageConfig, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.with_context(|| format!("walking {}", path.display()))?;
            if entry.file_type().is_file() && config.matches_path(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    node.children()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn parse(config: &LanguageConfig, paths: &[PathBuf], json: bool, quiet: bool) -> Result<bool> {
    let mut clean = true;
    for path in collect_files(config, paths)? {
        let tree: Tree = renpy_syntax::parse(&read(&path)?);
        let root = tree.root_node();

        if !quiet {
            if json {
                println!("{}", serde_json::to_string_pretty(&root.to_json())?);
            } else {
                println!("{}", root.to_sexp());
            }
        }

        if let Some(node) = first_error(root) {
            clean = false;
            let what = if node.is_missing() { "MISSING" } else { "ERROR" };
            println!(
                "{}\t{what} {} [{} - {}]",
                path.display(),
                node.kind(),
                node.start_position(),
                node.end_position()
            );
        }
    }
    Ok(clean)
}

fn highlight(config: &LanguageConfig, path: &Path) -> Result<()> {
    let text = read(path)?;
    let mut processor_config = HighlightProcessorConfig::renpy();
    if let Some(query) = config.read_highlights()? {
        processor_config.highlights_query = query;
    }
    if let Some(query) = config.read_folds()? {
        processor_config = processor_config.with_folds_query(query);
    }

    let mut processor = HighlightProcessor::new(processor_config)?;
    let edits = processor.process(&text, 0)?;
    let index = processor.line_index();

    for edit in edits {
        match edit {
            ProcessingEdit::ReplaceStyleLayer { intervals, .. } => {
                for interval in intervals {
                    let (row, col) = index.char_offset_to_position(interval.start);
                    let (end_row, end_col) = index.char_offset_to_position(interval.end);
                    let capture = processor
                        .capture_name_for_style(interval.style_id)
                        .unwrap_or("?");
                    let covered = snippet(index, &text, &interval);
                    println!("{row}:{col}-{end_row}:{end_col}\t{capture}\t{covered:?}");
                }
            }
            ProcessingEdit::ReplaceFoldingRegions { regions, .. } => {
                for region in regions {
                    println!(
                        "fold\t{}-{}\t{} hidden",
                        region.start_line,
                        region.end_line,
                        region.hidden_line_count()
                    );
                }
            }
        }
    }
    Ok(())
}

/// The text an interval covers. Interval offsets are chars; slicing goes through bytes.
fn snippet<'a>(index: &LineIndex, text: &'a str, interval: &Interval) -> &'a str {
    let start = index.char_offset_to_byte_offset(interval.start);
    let end = index.char_offset_to_byte_offset(interval.end);
    text.get(start..end).unwrap_or_default()
}

fn run_query(config: &LanguageConfig, query_path: &Path, paths: &[PathBuf]) -> Result<()> {
    let source = read(query_path)?;
    let query = Query::new(language(), &source)
        .with_context(|| format!("compiling {}", query_path.display()))?;

    for path in collect_files(config, paths)? {
        let text = read(&path)?;
        let tree = renpy_syntax::parse(&text);
        println!("{}", path.display());

        let mut cursor = QueryCursor::new();
        for m in cursor.matches(&query, tree.root_node(), text.as_bytes()) {
            println!("  pattern: {}", m.pattern_index);
            for capture in &m.captures {
                let node = capture.node;
                println!(
                    "    capture: {} - {}, start: {}, end: {}, text: {:?}",
                    capture.index,
                    query.capture_names()[capture.index as usize],
                    node.start_position(),
                    node.end_position(),
                    node.text()
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_finds_missing_and_error_nodes() {
        let tree = renpy_syntax::parse("label a\n    jump b\n");
        let node = first_error(tree.root_node()).unwrap();
        assert!(node.is_missing());
        assert_eq!(node.kind(), ":");

        let tree = renpy_syntax::parse("label a:\n    jump b\n%%%\n");
        let node = first_error(tree.root_node()).unwrap();
        assert!(node.is_error());
        assert_eq!(node.start_position().row, 2);

        let tree = renpy_syntax::parse("label a:\n    jump b\n");
        assert!(first_error(tree.root_node()).is_none());
    }

    #[test]
    fn test_snippet_slices_by_char_offsets() {
        let text = "label café:\n    e \"Déjà vu\"\n";
        let index = LineIndex::from_text(text);
        let chars: Vec<char> = text.chars().collect();
        let open = chars.iter().position(|&c| c == '"').unwrap();

        let name = Interval::new(6, 10, 0);
        assert_eq!(snippet(&index, text, &name), "café");
        let string = Interval::new(open, open + 9, 0);
        assert_eq!(snippet(&index, text, &string), "\"Déjà vu\"");
        let past_end = Interval::new(chars.len() - 1, chars.len() + 5, 0);
        assert_eq!(snippet(&index, text, &past_end), "\n");
    }

    #[test]
    fn test_highlight_snippets_follow_the_processor() {
        let text = "# café\nlabel a:\n    \"Ça va\"\n    jump b\n";
        let mut processor = HighlightProcessor::new(HighlightProcessorConfig::renpy()).unwrap();
        let edits = processor.process(text, 0).unwrap();
        let index = processor.line_index();
        let mut snippets = Vec::new();
        for edit in edits {
            if let ProcessingEdit::ReplaceStyleLayer { intervals, .. } = edit {
                snippets.extend(intervals.iter().map(|i| snippet(index, text, i).to_string()));
            }
        }
        assert!(snippets.contains(&"\"Ça va\"".to_string()), "{snippets:?}");
        assert!(snippets.contains(&"# café".to_string()), "{snippets:?}");
        assert!(snippets.contains(&"b".to_string()), "{snippets:?}");
    }

    #[test]
    fn test_collect_files_filters_directories() {
        let dir = std::env::temp_dir().join(format!("renpy-cli-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("game")).unwrap();
        for name in ["game/script.rpy", "game/script.rpyc", "game/lib.rpym", "notes.txt"] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let explicit = dir.join("notes.txt");
        let files =
            collect_files(&LanguageConfig::default(), &[dir.clone(), explicit.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.join("game/lib.rpym"), dir.join("game/script.rpy"), explicit]
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
