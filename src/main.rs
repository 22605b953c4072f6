use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use postmeta::{MetadataAggregator, PostMetadata, SaveOutcome};
use settings::Settings;

mod settings;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_datetime(value: &str) -> anyhow::Result<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .with_context(|| format!("Invalid date: {value:?}"))
}

fn cli() -> Command {
    let text_arg = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).help(help).value_name("TEXT")
    };

    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("show")
                .about("Print the header block of a post as JSON")
                .arg(
                    Arg::new("file")
                        .help("Post to read")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Print tags, categories and authors known in a content directory")
                .arg(
                    Arg::new("dir")
                        .help("Content directory. Defaults to $POSTMETA_CONTENT_DIR or `content`")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("write")
                .about("Write a header block to a post")
                .args([
                    Arg::new("file")
                        .help("Post to write. Created when missing.")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                    text_arg("title", "Post title").required(true),
                    text_arg("slug", "Post slug"),
                    text_arg("date", "Creation date, e.g. `2017-02-01 12:00`. Defaults to now."),
                    text_arg("modified", "Modification date"),
                    text_arg("category", "Post category"),
                    text_arg("tag", "Tag, may be repeated").action(ArgAction::Append),
                    text_arg("author", "Author. Defaults to $POSTMETA_AUTHOR"),
                    text_arg("summary", "Short summary"),
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Replace an existing header block")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("prepend"),
                    Arg::new("prepend")
                        .long("prepend")
                        .help("Put the new header block above an existing one")
                        .action(ArgAction::SetTrue),
                    Arg::new("dry_run")
                        .long("dry-run")
                        .help("Only print the header block")
                        .action(ArgAction::SetTrue),
                ]),
        )
}

fn post_from_matches(matches: &ArgMatches, settings: &Settings) -> anyhow::Result<PostMetadata> {
    let text = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();

    let mut post = PostMetadata::new();
    post.set_title(text("title"));
    post.set_slug(text("slug"));
    post.set_category(text("category"));
    post.set_summary(text("summary"));
    post.set_author(&settings.author(matches));
    for tag in matches.get_many::<String>("tag").into_iter().flatten() {
        post.add_tag(tag.as_str());
    }

    post.set_date(match matches.get_one::<String>("date") {
        Some(date) => parse_datetime(date)?,
        None => Local::now().naive_local(),
    });
    post.set_modified(
        matches
            .get_one::<String>("modified")
            .map(|m| parse_datetime(m))
            .transpose()?,
    );

    Ok(post)
}

fn write(matches: &ArgMatches, settings: &Settings) -> anyhow::Result<()> {
    let path: &PathBuf = matches.get_one("file").context("file is required")?;
    let post = post_from_matches(matches, settings)?;

    if matches.get_flag("dry_run") {
        print!("{}", post.as_header_text());
        return Ok(());
    }

    if matches.get_flag("overwrite") {
        post.save_overwrite(path)
            .with_context(|| format!("while writing {path:?}"))?;
    } else if matches.get_flag("prepend") {
        post.save_prepend(path)
            .with_context(|| format!("while writing {path:?}"))?;
    } else if post
        .save(path)
        .with_context(|| format!("while writing {path:?}"))?
        == SaveOutcome::HasHeaders
    {
        bail!("{path:?} already has headers. Pass --overwrite or --prepend.");
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::from_env();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("show", sub)) => {
            let path: &PathBuf = sub.get_one("file").context("file is required")?;
            let block = postmeta::parse(path).with_context(|| format!("while reading {path:?}"))?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Some(("scan", sub)) => {
            let dir = settings.scan_dir(sub);
            if !dir.is_dir() {
                bail!("{dir:?} must be a directory.");
            }
            let aggregator = MetadataAggregator::from_path(&dir);
            println!("{}", serde_json::to_string_pretty(aggregator.known())?);
        }
        Some(("write", sub)) => write(sub, &settings)?,
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
