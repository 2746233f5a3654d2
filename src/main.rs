use std::env;
use std::io::{self, Read};
use std::process;

use mei_address::config::Config;
use mei_address::{Axis, Error};
use tracing_subscriber::EnvFilter;

/// Get STDIN as a string.
fn get_stdin() -> String {
    let mut buffer = String::new();

    if let Err(err) = io::stdin().read_to_string(&mut buffer) {
        eprintln!("Can't read input: {}", err);
        process::exit(1);
    }

    buffer
}

/// Each kind of failure gets its own exit status.
fn exit_code(err: &Error) -> i32 {
    match err {
        &Error::MalformedAddress { .. } => 2,
        &Error::OutOfRange { .. } => 3,
        &Error::StructuralError(_) => 4,
        &Error::UnsupportedEncoding(_) => 5,
        &Error::Xml(_) => 6,
    }
}

fn fail(err: Error) -> ! {
    eprintln!("{}", err);
    process::exit(exit_code(&err));
}

fn print_json(json: serde_json::Result<String>) {
    match json {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("Can't write JSON: {}", err);
            process::exit(1);
        }
    }
}

/// Describe an MEI document, from STDIN to STDOUT.
fn main_info() {
    let text = get_stdin();

    let info = mei_address::MeiDocument::parse(&text)
        .and_then(|document| mei_address::document_info(&document));

    match info {
        Ok(info) => print_json(info.to_json()),
        Err(err) => fail(err),
    }
}

/// Resolve an address against an MEI document from STDIN.
fn main_address(args: &[String], config: &Config) {
    if args.len() < 3 || args.len() > 4 {
        main_unrecognised();
        return;
    }

    let completeness = match args.get(3) {
        Some(value) => value.as_str(),
        None => config.default_completeness.as_str(),
    };

    let text = get_stdin();

    match mei_address::select(&text, &args[0], &args[1], &args[2], Some(completeness)) {
        Ok(plan) => print_json(plan.to_json()),
        Err(err) => fail(err),
    }
}

/// Check one axis of an address and print it normalized.
fn main_parse(args: &[String]) {
    if args.len() != 2 {
        main_unrecognised();
        return;
    }

    let axis = match Axis::from_name(&args[0]) {
        Some(axis) => axis,
        None => {
            eprintln!("Unrecognised axis {:?}. Try measures, staves or beats.", args[0]);
            process::exit(1);
        }
    };

    match mei_address::parse_address(axis, &args[1]) {
        Ok(selector) => println!("{}", selector.to_address(axis)),
        Err(err) => fail(err),
    }
}

fn main_unrecognised() {
    eprintln!(
        "Unrecognised command. Try:
 - info < file.mei
 - address MEASURES STAVES BEATS [raw|signature|nospace|cut] < file.mei
 - parse measures|staves|beats ADDRESS"
    );
}

fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let rest = args.get(2..).unwrap_or(&[]);

    match args.get(1).map(|first| first.as_str()) {
        Some("info") => main_info(),
        Some("address") => main_address(rest, &config),
        Some("parse") => main_parse(rest),
        _ => main_unrecognised(),
    }
}
