#[macro_use]
extern crate clap;

use clap::{App, Arg};
use std::fs;
use std::process;

fn main() {
    let matches = App::new("bin2str")
        .version(crate_version!())
        .about("Convert a binary file to a packed string")
        .arg(
            Arg::with_name("hex")
                .long("hex")
                .help("Use hex format"),
        )
        .arg(
            Arg::with_name("INFILE")
                .help("Sets the input file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUTFILE")
                .help("Sets the output file")
                .required(true)
                .index(2),
        )
        .get_matches();

    let infile = matches.value_of("INFILE").unwrap();
    let outfile = matches.value_of("OUTFILE").unwrap();

    let data = match fs::read(infile) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("bin2str: cannot read {}: {}", infile, err);
            process::exit(1);
        }
    };

    let text = if matches.is_present("hex") {
        bin2str::pack_hex(&data)
    } else {
        bin2str::pack(&data)
    };

    if let Err(err) = fs::write(outfile, text) {
        eprintln!("bin2str: cannot write {}: {}", outfile, err);
        process::exit(1);
    }
}
