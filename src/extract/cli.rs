use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::warn;

use super::table::{self, ColumnRule};
use super::writer::{self, OutputFormat, PageTable};
use super::{pdf, ExtractError};
use crate::input::Resolver;

/// The extraction command. The server parses Command Token Sequences with it;
/// the binary decorates it with version info and the `serve` subcommand.
pub fn build_command() -> Command {
    Command::new("pdftab")
        .about("Extract tables from PDF files")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("PDF to read: a local path, an http(s):// url, or an s3:// object key")
                .required(true),
        )
        .arg(
            Arg::new("pages")
                .short('p')
                .long("pages")
                .value_name("PAGES")
                .default_value("1")
                .help("Comma separated page numbers and ranges, or \"all\""),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("CSV")
                .help("Output format: CSV, TSV or JSON"),
        )
        .arg(
            Arg::new("columns")
                .short('c')
                .long("columns")
                .value_name("POSITIONS")
                .help("Comma separated character positions to split columns at"),
        )
        .arg(
            Arg::new("guess")
                .short('g')
                .long("guess")
                .action(ArgAction::SetTrue)
                .help("Guess column boundaries from whitespace shared by every row"),
        )
        .arg(
            Arg::new("refresh")
                .short('r')
                .long("refresh")
                .action(ArgAction::SetTrue)
                .help("Re-download a remote input even if a cached copy exists"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .value_name("PATH")
                .help("Write output to PATH instead of stdout"),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(Vec<u32>),
}

#[derive(Debug)]
pub struct ExtractOptions {
    pub input: String,
    pub pages: PageSelection,
    pub format: OutputFormat,
    pub columns: Option<Vec<usize>>,
    pub guess: bool,
    pub refresh: bool,
    pub outfile: Option<PathBuf>,
}

impl ExtractOptions {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ExtractError> {
        let input = matches
            .get_one::<String>("input")
            .cloned()
            .ok_or_else(|| ExtractError::Args("missing input file".to_string()))?;
        let pages = matches
            .get_one::<String>("pages")
            .map(String::as_str)
            .unwrap_or("1");
        let pages = parse_pages(pages).map_err(ExtractError::Args)?;
        let format = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("CSV");
        let format = OutputFormat::parse(format)
            .ok_or_else(|| ExtractError::Args(format!("unsupported output format {format:?}")))?;
        let columns = matches
            .get_one::<String>("columns")
            .map(|raw| parse_columns(raw))
            .transpose()
            .map_err(ExtractError::Args)?;

        Ok(Self {
            input,
            pages,
            format,
            columns,
            guess: matches.get_flag("guess"),
            refresh: matches.get_flag("refresh"),
            outfile: matches.get_one::<String>("outfile").map(PathBuf::from),
        })
    }
}

fn parse_pages(spec: &str) -> Result<PageSelection, String> {
    if spec.eq_ignore_ascii_case("all") {
        return Ok(PageSelection::All);
    }
    let mut pages = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo
                .trim()
                .parse()
                .map_err(|_| format!("invalid page spec {spec:?}"))?;
            let hi: u32 = hi
                .trim()
                .parse()
                .map_err(|_| format!("invalid page spec {spec:?}"))?;
            if lo == 0 || hi < lo {
                return Err(format!("invalid page range {part:?}"));
            }
            pages.extend(lo..=hi);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| format!("invalid page spec {spec:?}"))?;
            if page == 0 {
                return Err("page numbers start at 1".to_string());
            }
            pages.push(page);
        }
    }
    Ok(PageSelection::Pages(pages))
}

fn parse_columns(raw: &str) -> Result<Vec<usize>, String> {
    let mut positions = Vec::new();
    for part in raw.split(',') {
        let position: usize = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid column positions {raw:?}"))?;
        positions.push(position);
    }
    Ok(positions)
}

/// Parses a Command Token Sequence the way the command line would.
pub fn parse_tokens(tokens: &[String]) -> Result<ExtractOptions, ExtractError> {
    let matches = build_command()
        .no_binary_name(true)
        .try_get_matches_from(tokens)
        .map_err(|e| ExtractError::Args(e.to_string()))?;
    ExtractOptions::from_matches(&matches)
}

/// Extraction entry point used by the HTTP layer: tokens in, rendered text out.
pub async fn run_from_tokens(
    resolver: &Resolver,
    tokens: &[String],
) -> Result<String, ExtractError> {
    let options = parse_tokens(tokens)?;
    run(resolver, &options).await
}

/// Resolves the input, extracts the selected pages and renders the output.
pub async fn run(resolver: &Resolver, options: &ExtractOptions) -> Result<String, ExtractError> {
    let path = resolver.resolve(&options.input, options.refresh).await?;
    let tables = extract_tables(&path, options)?;
    writer::write(options.format, &tables)
}

fn extract_tables(path: &Path, options: &ExtractOptions) -> Result<Vec<PageTable>, ExtractError> {
    let rule = column_rule(options);
    match pdf::load(path) {
        Ok(doc) => {
            let available = pdf::page_numbers(&doc);
            let selected = match &options.pages {
                PageSelection::All => available,
                PageSelection::Pages(list) => {
                    for page in list {
                        if !available.contains(page) {
                            return Err(ExtractError::Pdf(format!(
                                "page {page} not in document ({} pages)",
                                available.len()
                            )));
                        }
                    }
                    list.clone()
                }
            };
            let mut tables = Vec::with_capacity(selected.len());
            for page in selected {
                let text = pdf::page_text(&doc, page)?;
                tables.push(PageTable {
                    page,
                    rows: table::extract_rows(&text, &rule),
                });
            }
            Ok(tables)
        }
        Err(e) => {
            // Some documents defeat page-addressed reading; fall back to one
            // lenient whole-document pass.
            warn!("page-addressed read failed ({e}), falling back to plain text extraction");
            let text = pdf::full_text(path)?;
            Ok(vec![PageTable {
                page: 1,
                rows: table::extract_rows(&text, &rule),
            }])
        }
    }
}

fn column_rule(options: &ExtractOptions) -> ColumnRule<'_> {
    if let Some(positions) = &options.columns {
        ColumnRule::Positions(positions)
    } else if options.guess {
        ColumnRule::Guess
    } else {
        ColumnRule::Whitespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_single_pages_ranges_and_all() {
        assert_eq!(parse_pages("1").unwrap(), PageSelection::Pages(vec![1]));
        assert_eq!(
            parse_pages("1-3,5").unwrap(),
            PageSelection::Pages(vec![1, 2, 3, 5])
        );
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages("ALL").unwrap(), PageSelection::All);
    }

    #[test]
    fn rejects_bad_page_specs() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("x").is_err());
        assert!(parse_pages("3-1").is_err());
        assert!(parse_pages("").is_err());
    }

    #[test]
    fn token_sequences_parse_like_a_command_line() {
        let options =
            parse_tokens(&tokens(&["-p", "2", "--format", "TSV", "-g", "file.pdf"])).unwrap();
        assert_eq!(options.input, "file.pdf");
        assert_eq!(options.pages, PageSelection::Pages(vec![2]));
        assert_eq!(options.format, OutputFormat::Tsv);
        assert!(options.guess);
        assert!(!options.refresh);
    }

    #[test]
    fn flag_position_does_not_matter() {
        let options = parse_tokens(&tokens(&["file.pdf", "-p", "2"])).unwrap();
        assert_eq!(options.pages, PageSelection::Pages(vec![2]));
    }

    #[test]
    fn unknown_flags_are_argument_errors() {
        match parse_tokens(&tokens(&["--bogus", "x", "file.pdf"])) {
            Err(ExtractError::Args(_)) => {}
            other => panic!("expected Args error, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_is_an_argument_error() {
        match parse_tokens(&[]) {
            Err(ExtractError::Args(_)) => {}
            other => panic!("expected Args error, got {other:?}"),
        }
    }

    #[test]
    fn bad_format_is_an_argument_error() {
        match parse_tokens(&tokens(&["-f", "XML", "file.pdf"])) {
            Err(ExtractError::Args(message)) => assert!(message.contains("XML")),
            other => panic!("expected Args error, got {other:?}"),
        }
    }

    #[test]
    fn column_positions_parse_to_usize_list() {
        let options = parse_tokens(&tokens(&["-c", "0,10,25", "file.pdf"])).unwrap();
        assert_eq!(options.columns, Some(vec![0, 10, 25]));
        assert!(parse_columns("a,b").is_err());
    }
}
