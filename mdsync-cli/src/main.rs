// Command-line interface for mdsync
//
// This binary converts Markdown documents into the native payloads of the hosted document
// services and reads those payloads back into Markdown. It never talks to a service itself:
// `render` prints the push plan (action + payload) that a transport would execute.
//
// Usage:
//  mdsync render <input>... [--batch] [--destination D] [--create] [-o FILE] [-u]
//  mdsync import <payload> --from rich|wiki [-o FILE]
//  mdsync resolve <input> [--destination D] [--create]
//
// Configuration:
//
// Settings come from mdsync-config: the embedded defaults, then ./mdsync.toml, then the file
// given with --config. Flags of the running command are applied last.
//
// Logging goes to stderr. MDSYNC_LOG takes an EnvFilter directive (e.g. "mdsync_core=debug");
// --verbose is a shortcut for "debug".

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use mdsync_config::{Loader, MdsyncConfig, PROJECT_FILE};
use mdsync_core::destination::Resolution;
use mdsync_core::formats::markdown;
use mdsync_core::sync::PushAction;
use mdsync_core::{
    assemble, plan_push, resolve, BatchSource, BatchSpec, Destination, Document, Formatter,
    NativePayload, PushRequest, SyncIntent, TargetKind, TocScope,
};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MDSYNC_LOG";

fn build_cli() -> Command {
    Command::new("mdsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown to and from hosted document services")
        .long_about(
            "mdsync converts Markdown (with front-matter and ':::' callout fences) into the\n\
            payloads of a rich-document service and a wiki, and back.\n\n\
            Commands:\n  \
            - render:  Markdown to a push plan for the resolved destination\n  \
            - import:  a fetched payload back to Markdown\n  \
            - resolve: show where a document would be pushed\n\n\
            Examples:\n  \
            mdsync render notes.md --create                  # Plan for a new document\n  \
            mdsync render a.md b.md --batch -o plan.json     # Merge two files with a TOC\n  \
            mdsync render notes.md -u                        # URL of the linked document\n  \
            mdsync import page.xhtml --from wiki -o page.md  # Wiki storage format to Markdown",
        )
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an mdsync.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug output to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("render")
                .about("Render Markdown into a push plan")
                .long_about(
                    "Resolve the destination of one document (or of a batch merged into one)\n\
                    and print the push plan as JSON: the action (create or update) and the\n\
                    rendered payload.\n\n\
                    The destination is, in order: --destination, the linkage recorded in the\n\
                    front-matter, or a new document when --create is given.",
                )
                .arg(
                    Arg::new("inputs")
                        .help("Markdown files; several need --batch")
                        .required(true)
                        .num_args(1..)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(destination_arg())
                .arg(create_arg())
                .arg(target_arg())
                .arg(
                    Arg::new("batch")
                        .long("batch")
                        .help("Merge all inputs into one document")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("file-titles")
                        .long("file-titles")
                        .help("Start each merged file with a heading named after it")
                        .action(ArgAction::SetTrue)
                        .overrides_with("no-file-titles"),
                )
                .arg(
                    Arg::new("no-file-titles")
                        .long("no-file-titles")
                        .help("Merge files without title headings")
                        .action(ArgAction::SetTrue)
                        .overrides_with("file-titles"),
                )
                .arg(
                    Arg::new("separators")
                        .long("separators")
                        .help("Put a horizontal rule between merged files")
                        .action(ArgAction::SetTrue)
                        .overrides_with("no-separators"),
                )
                .arg(
                    Arg::new("no-separators")
                        .long("no-separators")
                        .help("Merge files without horizontal rules")
                        .action(ArgAction::SetTrue)
                        .overrides_with("separators"),
                )
                .arg(
                    Arg::new("toc")
                        .long("toc")
                        .help("Generate a table of contents for the batch")
                        .action(ArgAction::SetTrue)
                        .overrides_with("no-toc"),
                )
                .arg(
                    Arg::new("no-toc")
                        .long("no-toc")
                        .help("Skip the table of contents")
                        .action(ArgAction::SetTrue)
                        .overrides_with("toc"),
                )
                .arg(
                    Arg::new("batch-title")
                        .long("batch-title")
                        .value_name("TITLE")
                        .help("Heading placed above the whole batch"),
                )
                .arg(
                    Arg::new("toc-scope")
                        .long("toc-scope")
                        .value_name("SCOPE")
                        .help("Headings listed in the table of contents: top-level or all-levels")
                        .value_parser(parse_toc_scope),
                )
                .arg(output_arg())
                .arg(
                    Arg::new("url-only")
                        .long("url-only")
                        .short('u')
                        .help("Print only the URL of the destination")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Convert a service payload back to Markdown")
                .long_about(
                    "Read a payload fetched from a service and print it as Markdown.\n\n\
                    Rich-document payloads are JSON; wiki payloads are storage-format XHTML.",
                )
                .arg(
                    Arg::new("payload")
                        .help("Payload file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("TARGET")
                        .help("Service the payload came from: rich or wiki")
                        .required(true)
                        .value_parser(parse_target),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show where a document would be pushed")
                .arg(
                    Arg::new("input")
                        .help("Markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(destination_arg())
                .arg(create_arg())
                .arg(target_arg()),
        )
}

fn destination_arg() -> Arg {
    Arg::new("destination")
        .long("destination")
        .short('d')
        .value_name("DEST")
        .help("Document URL or id, wiki page URL, or SPACE:Title")
        .value_hint(ValueHint::Url)
}

fn create_arg() -> Arg {
    Arg::new("create")
        .long("create")
        .help("Create a new document when nothing links to one")
        .action(ArgAction::SetTrue)
}

fn target_arg() -> Arg {
    Arg::new("target")
        .long("target")
        .value_name("TARGET")
        .help("Service for new documents and bare ids: rich or wiki")
        .value_parser(parse_target)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_name("FILE")
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn parse_target(raw: &str) -> Result<TargetKind, String> {
    TargetKind::from_alias(raw).ok_or_else(|| format!("unknown target '{raw}' (use rich or wiki)"))
}

fn parse_toc_scope(raw: &str) -> Result<TocScope, String> {
    match raw {
        "top-level" => Ok(TocScope::TopLevel),
        "all-levels" => Ok(TocScope::AllLevels),
        other => Err(format!("unknown scope '{other}' (use top-level or all-levels)")),
    }
}

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));

    match matches.subcommand() {
        Some(("render", sub_matches)) => {
            apply_render_overrides(&mut config, sub_matches);
            handle_render_command(sub_matches, &config);
        }
        Some(("import", sub_matches)) => handle_import_command(sub_matches, &config),
        Some(("resolve", sub_matches)) => {
            apply_target_override(&mut config, sub_matches);
            handle_resolve_command(sub_matches, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_cli_config(explicit_path: Option<&str>) -> MdsyncConfig {
    let loader = Loader::new().with_optional_file(PROJECT_FILE);
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn apply_render_overrides(config: &mut MdsyncConfig, matches: &ArgMatches) {
    let batch = &mut config.batch;
    if matches.get_flag("file-titles") {
        batch.use_file_titles_as_headers = true;
    }
    if matches.get_flag("no-file-titles") {
        batch.use_file_titles_as_headers = false;
    }
    if matches.get_flag("separators") {
        batch.insert_horizontal_separators = true;
    }
    if matches.get_flag("no-separators") {
        batch.insert_horizontal_separators = false;
    }
    if matches.get_flag("toc") {
        batch.generate_toc = true;
    }
    if matches.get_flag("no-toc") {
        batch.generate_toc = false;
    }
    if let Some(title) = matches.get_one::<String>("batch-title") {
        batch.batch_title = Some(title.clone());
    }
    if let Some(scope) = matches.get_one::<TocScope>("toc-scope") {
        batch.toc_scope = *scope;
    }
    apply_target_override(config, matches);
}

fn apply_target_override(config: &mut MdsyncConfig, matches: &ArgMatches) {
    if let Some(kind) = matches.get_one::<TargetKind>("target") {
        config.targets.default = *kind;
    }
}

/// Handle the render command
fn handle_render_command(matches: &ArgMatches, config: &MdsyncConfig) {
    let inputs: Vec<&String> = matches
        .get_many::<String>("inputs")
        .map(|values| values.collect())
        .unwrap_or_default();
    let Some(first) = inputs.first() else {
        eprintln!("Error: no input files");
        std::process::exit(1);
    };

    let batch = matches.get_flag("batch");
    if inputs.len() > 1 && !batch {
        eprintln!("Error: {} inputs given; use --batch to merge them", inputs.len());
        std::process::exit(1);
    }

    let batch_options = config.batch_options();
    let fallback_title = match (&batch_options.batch_title, batch) {
        (Some(title), true) => title.clone(),
        _ => file_stem(first),
    };
    let document = if batch {
        let sources = inputs
            .iter()
            .map(|path| BatchSource::new(file_stem(path), read_document(path)))
            .collect();
        assemble(BatchSpec {
            sources,
            options: batch_options,
        })
    } else {
        read_document(first)
    };

    let target = matches.get_one::<TargetKind>("target").copied();
    let request = PushRequest {
        explicit: explicit_destination(matches, target),
        intent: intent(matches),
        default_kind: config.targets.default,
        fallback_title: &fallback_title,
    };
    let options = config.target_options();
    let plan = plan_push(&document, request, &options).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let output = if matches.get_flag("url-only") {
        match &plan.action {
            PushAction::Update(destination) => {
                match destination.url(options.wiki.base_url.as_deref()) {
                    Some(url) => format!("{url}\n"),
                    None => {
                        eprintln!("Error: no URL for {destination}; set targets.wiki.base_url");
                        std::process::exit(1);
                    }
                }
            }
            PushAction::Create { kind, .. } => {
                eprintln!("Error: no {kind} exists yet, so there is no URL to print");
                std::process::exit(1);
            }
        }
    } else {
        let json = serde_json::to_string_pretty(&plan).unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });
        format!("{json}\n")
    };

    write_output(matches.get_one::<String>("output").map(|s| s.as_str()), &output);
}

/// Handle the import command
fn handle_import_command(matches: &ArgMatches, config: &MdsyncConfig) {
    let path = matches
        .get_one::<String>("payload")
        .expect("payload is required");
    let kind = *matches
        .get_one::<TargetKind>("from")
        .expect("from is required");

    let source = read_file(path);
    let payload = NativePayload::from_source(kind, &source).unwrap_or_else(|e| {
        eprintln!("Error reading payload '{path}': {e}");
        std::process::exit(1);
    });
    let document = Formatter::for_kind(kind, &config.target_options())
        .parse(&payload)
        .unwrap_or_else(|e| {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        });

    write_output(
        matches.get_one::<String>("output").map(|s| s.as_str()),
        &markdown::serialize(&document),
    );
}

/// Handle the resolve command
fn handle_resolve_command(matches: &ArgMatches, config: &MdsyncConfig) {
    let input = matches.get_one::<String>("input").expect("input is required");
    let document = read_document(input);
    let target = matches.get_one::<TargetKind>("target").copied();
    let explicit = explicit_destination(matches, target);

    match resolve(&document, explicit, intent(matches), config.targets.default) {
        Ok(Resolution::Existing(destination)) => {
            println!("{destination}");
            let base_url = config.target_options().wiki.base_url;
            if let Some(url) = destination.url(base_url.as_deref()) {
                println!("{url}");
            }
        }
        Ok(Resolution::Create(kind)) => println!("new {kind}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn intent(matches: &ArgMatches) -> SyncIntent {
    if matches.get_flag("create") {
        SyncIntent::Create
    } else {
        SyncIntent::Update
    }
}

/// Reads `--destination`, under `--target` when given. Unrecognizable values are fatal.
fn explicit_destination(matches: &ArgMatches, target: Option<TargetKind>) -> Option<Destination> {
    let raw = matches.get_one::<String>("destination")?;
    let destination = match target {
        Some(kind) => Destination::parse_as(kind, raw, None),
        None => Destination::parse(raw),
    };
    if destination.is_none() {
        eprintln!("Error: cannot tell what '{raw}' refers to; pass --target to disambiguate");
        std::process::exit(1);
    }
    destination
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn read_document(path: &str) -> Document {
    let (document, degradations) = markdown::parse_with_report(&read_file(path));
    for degradation in &degradations {
        warn!(file = path, "{degradation}");
    }
    debug!(file = path, blocks = document.blocks.len(), "parsed");
    document
}

fn write_output(path: Option<&str>, text: &str) {
    match path {
        Some(path) => fs::write(path, text).unwrap_or_else(|e| {
            eprintln!("Error writing file '{path}': {e}");
            std::process::exit(1);
        }),
        None => print!("{text}"),
    }
}

/// Name a file goes by in batch titles and new document titles.
fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}
