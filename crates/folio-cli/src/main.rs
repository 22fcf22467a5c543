//! `folio` binary

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use folio_asset::DocumentId;
use folio_cli::{load_form, logging, render_error, App, Settings};
use std::path::PathBuf;
use std::process::ExitCode;

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .help("Document identifier")
}

fn form_arg() -> Arg {
    Arg::new("form")
        .long("form")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Path to a JSON form description")
}

fn cli() -> Command {
    Command::new("folio")
        .version(folio_cli::VERSION)
        .about("Reconcile media-backed documents against a blob store")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .default_value("./folio-data")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding documents and blobs"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("create")
                .about("Create a document from a form")
                .arg(form_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Reconcile a document with a form")
                .arg(id_arg())
                .arg(form_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a document and its media")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a stored document")
                .arg(id_arg()),
        )
        .subcommand(Command::new("list").about("Print every stored document, newest first"))
}

fn document_id(args: &ArgMatches) -> DocumentId {
    DocumentId::new(args.get_one::<String>("id").cloned().unwrap_or_default())
}

async fn run(matches: &ArgMatches) -> Result<serde_json::Value> {
    let data_dir = matches
        .get_one::<PathBuf>("data-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("./folio-data"));
    let settings = Settings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)).await?;
    let app = App::open(&data_dir, &settings).await?;

    match matches.subcommand() {
        Some(("create", args)) => {
            let form = load_form(required_path(args, "form")?).await?;
            app.create(&form).await
        }
        Some(("update", args)) => {
            let form = load_form(required_path(args, "form")?).await?;
            app.update(&document_id(args), &form).await
        }
        Some(("delete", args)) => app.delete(&document_id(args)).await,
        Some(("show", args)) => app.show(&document_id(args)).await,
        Some(("list", _)) => app.list().await,
        _ => anyhow::bail!("unknown subcommand"),
    }
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a std::path::Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| anyhow::anyhow!("--{name} is required"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("json-logs"));

    match run(&matches).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("{}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}
