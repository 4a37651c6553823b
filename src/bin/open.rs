use std::cmp::min;
use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use lossless_xml::{parser, writer};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn pretty_error(xml: &str, position: usize) -> String {
    let s = xml.get(position..).unwrap_or("");
    let l = s.chars().count();
    s.chars().take(min(l, 15)).collect()
}

fn process_input<R>(input: R, assignment: Option<(&str, &str)>) -> Result<(), String>
    where R: Read
{
    let mut input = input;
    let mut data = String::new();

    input.read_to_string(&mut data)
        .map_err(|e| format!("Can't read: {}", e))?;

    let mut doc = parser::parse(&data).map_err(|e| {
        format!("Unable to parse: {} near {:?}", e, pretty_error(&data, e.location()))
    })?;

    if let Some((name, value)) = assignment {
        let root = doc.root_element_mut().map_err(|e| e.to_string())?;
        debug!(element = %root.tag_name, name, value, "setting attribute");
        root.set_attribute_value(name, value);
    }

    let mut out = io::stdout().lock();
    writer::format_document(&doc, &mut out)
        .and_then(|_| out.flush())
        .map_err(|e| format!("I can't output: {}", e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<_> = env::args().skip(1).collect();

    let filename = match args.first() {
        Some(f) => f,
        None => {
            eprintln!("usage: open <file|-> [name=value]");
            return ExitCode::from(2);
        }
    };

    let assignment = match args.get(1) {
        Some(a) => match a.split_once('=') {
            Some(pair) => Some(pair),
            None => {
                eprintln!("Expected name=value, got {:?}", a);
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let result = if filename == "-" {
        process_input(io::stdin(), assignment)
    } else {
        File::open(filename)
            .map_err(|e| format!("Can't open {}: {}", filename, e))
            .and_then(|file| process_input(file, assignment))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
