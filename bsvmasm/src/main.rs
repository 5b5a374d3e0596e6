#[macro_use]
extern crate clap;

use clap::{App, Arg};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let matches = App::new("bsvmasm")
        .version(crate_version!())
        .about("A simple assembler for the BS Virtual Machine")
        .arg(
            Arg::with_name("FILE")
                .help("Sets the file(s) to process")
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the output file to write to"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Be verbose"),
        )
        .arg(
            Arg::with_name("extra_verbose")
                .long("extra-verbose")
                .help("Be extra verbose"),
        )
        .get_matches();

    let files: Vec<&str> = matches.values_of("FILE").unwrap().collect();

    let verbosity = if matches.is_present("extra_verbose") {
        2
    } else if matches.is_present("verbose") {
        1
    } else {
        0
    };

    // Collect source -> output jobs.
    let jobs: Vec<(PathBuf, PathBuf)> = match matches.value_of("output") {
        Some(output) => {
            if files.len() != 1 {
                eprintln!("Error: Only a single source file must be specified together with -o.");
                process::exit(1);
            }
            vec![(PathBuf::from(files[0]), PathBuf::from(output))]
        }
        None => files
            .iter()
            .map(|file| {
                let source = PathBuf::from(file);
                let output = source.with_extension("bin");
                (source, output)
            })
            .collect(),
    };

    for (source, output) in &jobs {
        if let Err(message) = assemble_job(source, output, verbosity) {
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

fn assemble_job(source: &Path, output: &Path, verbosity: u8) -> Result<(), String> {
    let code = bsvmasm::assemble_file(source, verbosity)
        .map_err(|err| format!("{}:{}: ERROR: {}", source.display(), err.line, err.message))?;

    // Only written on success; a failed assembly leaves no partial output.
    fs::write(output, &code)
        .map_err(|err| format!("Writing output file \"{}\" failed: {}", output.display(), err))
}
