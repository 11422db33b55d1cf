extern crate clap;
extern crate xref_menu;

use std::path::PathBuf;
use std::process::exit;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{to_string, to_string_pretty};
use xref_menu::error::Result;
use xref_menu::file_format::config::{RouteContext, Settings};
use xref_menu::file_format::sym_info::SymbolIndex;
use xref_menu::logging::init_logging;
use xref_menu::menu::resolver::{SymbolActionResolver, SymbolToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    // Pretty-printed JSON.
    Pretty,
    // One line of JSON per item.
    Concise,
}

/// Resolve context menus against a tree's SYM_INFO without a browser.
#[derive(Parser)]
#[command(version, about)]
struct XrefMenuCli {
    /// SYM_INFO JSON: an object mapping each symbol to its jumpref.
    #[arg(long, value_parser)]
    sym_info: PathBuf,

    /// TOML feature toggles; everything is disabled without it.
    #[arg(long, value_parser)]
    settings: Option<PathBuf>,

    /// The tree all generated links point into.
    #[arg(long, value_parser)]
    tree: String,

    /// The source file being viewed, if any, for `--line`.
    #[arg(long, value_parser)]
    source_path: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the menu for a click on a token.
    Menu(MenuArgs),
}

#[derive(Args)]
struct MenuArgs {
    /// The clicked token's comma-separated symbols.
    #[arg(long, value_parser)]
    symbols: Option<String>,

    /// The clicked token's text, used by the sticky highlight.
    #[arg(long, value_parser, default_value = "")]
    text: String,

    /// The line number the click happened on.
    #[arg(long, value_parser)]
    line: Option<String>,

    /// The word under the caret, for the substring search.
    #[arg(long, value_parser)]
    word: Option<String>,

    #[arg(long, short, value_enum, default_value = "concise")]
    format: OutputFormat,
}

fn print_menu(resolver: &SymbolActionResolver, args: &MenuArgs) -> Result<()> {
    let token = args
        .symbols
        .as_ref()
        .map(|symbols| SymbolToken::from_attribute(symbols, &args.text));
    let clicked_line = resolver.route().clicked_line(args.line.as_deref())?;

    let items = resolver.resolve_menu(
        token.as_ref(),
        clicked_line.as_deref(),
        args.word.as_deref(),
    );
    for item in &items {
        match args.format {
            OutputFormat::Concise => println!("{}", to_string(item)?),
            OutputFormat::Pretty => println!("{}", to_string_pretty(item)?),
        }
    }
    Ok(())
}

fn run(cli: XrefMenuCli) -> Result<()> {
    let index = SymbolIndex::load(&cli.sym_info)?;
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut route = RouteContext::new(&cli.tree);
    if let Some(source_path) = &cli.source_path {
        route = route.with_source_path(source_path);
    }
    let resolver = SymbolActionResolver::new(&index, &settings, &route);

    match &cli.cmd {
        Command::Menu(args) => print_menu(&resolver, args),
    }
}

fn main() {
    init_logging();

    let cli = XrefMenuCli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{:?}", err);
        exit(1);
    }
}
