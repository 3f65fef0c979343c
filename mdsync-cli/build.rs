use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of build_cli() in src/main.rs, reduced to what completions need.
// Build scripts can't access src/ modules, so it is duplicated here.
const TARGETS: &[&str] = &["rich", "wiki"];
const TOC_SCOPES: &[&str] = &["top-level", "all-levels"];

fn input_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn flag(name: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue)
}

fn value(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let targets = clap::builder::PossibleValuesParser::new(TARGETS);
    let mut cmd = Command::new("mdsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown to and from hosted document services")
        .arg(value("config").value_hint(ValueHint::FilePath).global(true))
        .arg(flag("verbose").short('v').global(true))
        .subcommand(
            Command::new("render")
                .arg(input_arg("inputs").num_args(1..))
                .arg(value("destination").short('d').value_hint(ValueHint::Url))
                .arg(flag("create"))
                .arg(value("target").value_parser(targets.clone()))
                .arg(flag("batch"))
                .arg(flag("file-titles"))
                .arg(flag("no-file-titles"))
                .arg(flag("separators"))
                .arg(flag("no-separators"))
                .arg(flag("toc"))
                .arg(flag("no-toc"))
                .arg(value("batch-title"))
                .arg(
                    value("toc-scope")
                        .value_parser(clap::builder::PossibleValuesParser::new(TOC_SCOPES)),
                )
                .arg(value("output").short('o').value_hint(ValueHint::FilePath))
                .arg(flag("url-only").short('u')),
        )
        .subcommand(
            Command::new("import")
                .arg(input_arg("payload"))
                .arg(value("from").value_parser(targets.clone()))
                .arg(value("output").short('o').value_hint(ValueHint::FilePath)),
        )
        .subcommand(
            Command::new("resolve")
                .arg(input_arg("input"))
                .arg(value("destination").short('d').value_hint(ValueHint::Url))
                .arg(flag("create"))
                .arg(value("target").value_parser(targets)),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "mdsync", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "mdsync", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "mdsync", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
