//!
//! vertocraft admin CLI
//! --------------------
//! Talks to a running vertocraft server. `login` saves a session file that later
//! commands pick up; `logout` removes it.

use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use vertocraft::admin::{AdminClient, ImageUpload, PortfolioUpload, SessionFile};
use vertocraft::config::{arg_value, has_flag};
use vertocraft::model::ContactForm;

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} login [--url <base>] --user <u> --password <p>\n  {program} logout\n  {program} status\n  {program} portfolio list [--category <slug>] [--url <base>]\n  {program} portfolio get <id> [--url <base>]\n  {program} portfolio add --title <t> --category <slug> --categories <list> --row-span <20-50> --image <path>\n  {program} portfolio delete <id>\n  {program} contacts\n  {program} contact submit --name <n> --email <e> --subject <s> --message <m> [--service <s>]... [--url <base>]\n\nFlags:\n  --session <path>   Session file (env: VERTOCRAFT_SESSION_FILE, default .vertocraft_session.json)\n  --url <base>       Server base URL for login and public commands (default {DEFAULT_URL})\n  -h, --help         Show this help"
    );
}

fn required(args: &[String], flag: &str) -> Result<String> {
    arg_value(args, flag).ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn positional_id(args: &[String]) -> Result<i64> {
    let raw = args.first().ok_or_else(|| anyhow!("missing item id"))?;
    raw.parse::<i64>().map_err(|_| anyhow!("invalid item id '{}'", raw))
}

fn all_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2).filter(|w| w[0] == flag).map(|w| w[1].clone()).collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Client bound to the saved session, for admin commands.
fn session_client(sessions: &SessionFile) -> Result<AdminClient> {
    let session = sessions
        .load()?
        .ok_or_else(|| anyhow!("not logged in; run `login` first"))?;
    Ok(AdminClient::from_session(session)?)
}

/// Client for public commands: explicit `--url`, else the saved session, else the default.
fn public_client(args: &[String], sessions: &SessionFile) -> Result<AdminClient> {
    if let Some(url) = arg_value(args, "--url") {
        return Ok(AdminClient::new(&url)?);
    }
    match sessions.load()? {
        Some(s) => Ok(AdminClient::from_session(s)?),
        None => Ok(AdminClient::new(DEFAULT_URL)?),
    }
}

/// Remove `flag <value>` from the argument list, returning the value.
fn take_flag(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let i = args.iter().position(|a| a == flag)?;
    if i + 1 >= args.len() {
        return None;
    }
    let v = args.remove(i + 1);
    args.remove(i);
    Some(v)
}

async fn run(program: &str, mut args: Vec<String>) -> Result<()> {
    let sessions = match take_flag(&mut args, "--session") {
        Some(p) => SessionFile::new(p),
        None => SessionFile::default_location(),
    };
    let args = args.as_slice();
    let cmd = args.first().map(String::as_str).unwrap_or("");
    let rest = args.get(1..).unwrap_or_default();

    match cmd {
        "login" => {
            let url = arg_value(rest, "--url").unwrap_or_else(|| DEFAULT_URL.to_string());
            let client = AdminClient::new(&url)?;
            let session = client.login(&required(rest, "--user")?, &required(rest, "--password")?).await?;
            sessions.save(&session)?;
            println!("logged in as '{}' at {}", session.username, session.base_url);
        }
        "logout" => {
            if sessions.clear()? {
                println!("logged out");
            } else {
                println!("no saved session");
            }
        }
        "status" => match sessions.load()? {
            Some(s) => println!("logged in as '{}' at {} (session {})", s.username, s.base_url, sessions.path().display()),
            None => println!("not logged in"),
        },
        "portfolio" => {
            let sub = rest.first().map(String::as_str).unwrap_or("");
            let sub_args = rest.get(1..).unwrap_or_default();
            match sub {
                "list" => {
                    let client = public_client(sub_args, &sessions)?;
                    let category = arg_value(sub_args, "--category");
                    print_json(&client.list_portfolio(category.as_deref()).await?)?;
                }
                "get" => {
                    let client = public_client(sub_args, &sessions)?;
                    print_json(&client.get_portfolio(positional_id(sub_args)?).await?)?;
                }
                "add" => {
                    let client = session_client(&sessions)?;
                    let row_span = required(sub_args, "--row-span")?;
                    let fields = PortfolioUpload {
                        title: required(sub_args, "--title")?,
                        category: required(sub_args, "--category")?,
                        categories: arg_value(sub_args, "--categories").unwrap_or_default(),
                        row_span: row_span.parse().map_err(|_| anyhow!("invalid --row-span '{}'", row_span))?,
                    };
                    let image_path = required(sub_args, "--image")?;
                    let image = ImageUpload::from_path(Path::new(&image_path))
                        .with_context(|| format!("reading image '{}'", image_path))?;
                    print_json(&client.create_portfolio(&fields, image).await?)?;
                }
                "delete" => {
                    let client = session_client(&sessions)?;
                    let id = positional_id(sub_args)?;
                    client.delete_portfolio(id).await?;
                    println!("deleted portfolio item {}", id);
                }
                _ => {
                    print_usage(program);
                    std::process::exit(2);
                }
            }
        }
        "contacts" => {
            let client = session_client(&sessions)?;
            print_json(&client.list_contacts().await?)?;
        }
        "contact" if rest.first().map(String::as_str) == Some("submit") => {
            let sub_args = &rest[1..];
            let client = public_client(sub_args, &sessions)?;
            let form = ContactForm {
                name: required(sub_args, "--name")?,
                email: required(sub_args, "--email")?,
                subject: required(sub_args, "--subject")?,
                message: required(sub_args, "--message")?,
                services: all_values(sub_args, "--service"),
            };
            print_json(&client.submit_contact(&form).await?)?;
        }
        _ => {
            print_usage(program);
            std::process::exit(2);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    if args.is_empty() || has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage(&program);
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    run(&program, args).await
}
