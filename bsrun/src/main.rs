#[macro_use]
extern crate clap;

use clap::{App, Arg, ArgGroup};
use std::fs;
use std::path::Path;
use std::process;

use bsvm::{constants, Exit, Memory, Processor, StdHost};

fn main() {
    let matches = App::new("bsrun")
        .version(crate_version!())
        .about("Runs a program on the BS Virtual Machine")
        .arg(
            Arg::with_name("PROGRAM")
                .help("Sets the bytecode image file to run")
                .index(1),
        )
        .arg(
            Arg::with_name("assembly")
                .short("a")
                .long("assembly")
                .takes_value(true)
                .value_name("ASSEMBLY")
                .help("Assembles and runs the given source file"),
        )
        .arg(
            Arg::with_name("packed")
                .short("p")
                .long("packed")
                .takes_value(true)
                .value_name("PACKED")
                .help("Runs the packed-string image in the given file"),
        )
        .arg(
            Arg::with_name("hex")
                .long("hex")
                .help("Treats the packed input as hex format"),
        )
        .arg(
            Arg::with_name("trace")
                .short("t")
                .long("trace")
                .help("Prints a debug trace of every executed instruction"),
        )
        .group(
            ArgGroup::with_name("input")
                .args(&["PROGRAM", "assembly", "packed"])
                .required(true),
        )
        .get_matches();

    let image = match load_image(&matches) {
        Ok(image) => image,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    let mut memory = Memory::new();
    if memory.load(constants::RESET_PC, &image).is_err() {
        eprintln!("bsrun: program does not fit into VM memory");
        process::exit(1);
    }

    let mut processor = Processor::new();
    processor.set_trace(matches.is_present("trace"));

    let exit = processor.run(&mut memory, &mut StdHost);
    match exit {
        Exit::Exited(code) => process::exit(code),
        trap => {
            eprintln!("bsrun: {}", trap);
            process::exit(trap.code());
        }
    }
}

fn load_image(matches: &clap::ArgMatches) -> Result<Vec<u8>, String> {
    if let Some(program) = matches.value_of("PROGRAM") {
        fs::read(program).map_err(|err| format!("bsrun: cannot read {}: {}", program, err))
    } else if let Some(packed) = matches.value_of("packed") {
        let text = fs::read_to_string(packed)
            .map_err(|err| format!("bsrun: cannot read {}: {}", packed, err))?;
        let text = text.trim();
        let image = if matches.is_present("hex") {
            bin2str::unpack_hex(text)
        } else {
            bin2str::unpack(text)
        };
        image.map_err(|err| format!("bsrun: {}: {}", packed, err))
    } else {
        let assembly = matches.value_of("assembly").unwrap();
        bsvmasm::assemble_file(Path::new(assembly), 0)
            .map_err(|err| format!("{}:{}: ERROR: {}", assembly, err.line, err.message))
    }
}
