extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use cssc::assembler::{self, disasm, Program};
use cssc::compiler::CompilationSession;
use cssc::error::Error;

use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tMnemonics Only: {}\n\tAssemble Only: {}\n\tDisassemble: {}\n\tOutfile: {}\n\tInfile: {}",
        level_for(args.occurrences_of("verbose")),
        args.is_present("mnemonics"),
        args.is_present("assemble"),
        args.is_present("disassemble"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    if let Err(err) = run(&args) {
        error!("fatal: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    // INPUT is required, clap has already rejected a missing one.
    let ipath = Path::new(args.value_of("INPUT").unwrap_or_default());
    let show = args.is_present("print-debug");

    if args.is_present("disassemble") {
        let bytes = fs::read(ipath).map_err(|err| {
            error!("unable to read input file `{}`", ipath.display());
            err
        })?;
        print_disassembly(&disasm::disassemble(&bytes)?);
        return Ok(());
    }

    let text = fs::read_to_string(ipath).map_err(|err| {
        error!("unable to read input file `{}`", ipath.display());
        err
    })?;

    let mnemonics = if args.is_present("assemble") {
        text
    } else {
        let mut session = CompilationSession::new();
        session.compile(&text)?;
        if show {
            print_symbols(&session);
        }
        session.into_mnemonics()
    };

    if args.is_present("mnemonics") {
        let opath = output_path(args, ipath, "ssma");
        write_output(&opath, mnemonics.as_bytes())?;
        info!("wrote mnemonics to `{}`", opath.display());
        return Ok(());
    }

    let program = assembler::assemble(&mnemonics)?;
    if show {
        print_listing(&program);
    }

    let opath = output_path(args, ipath, "bin");
    write_output(&opath, &program.bytes)?;
    info!("wrote {} byte(s) to `{}`", program.bytes.len(), opath.display());
    Ok(())
}

fn output_path(args: &ArgMatches, ipath: &Path, extension: &str) -> PathBuf {
    match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension(extension),
    }
}

fn write_output(opath: &Path, bytes: &[u8]) -> Result<(), Error> {
    fs::write(opath, bytes).map_err(|err| {
        error!("unable to write to output file `{}`", opath.display());
        Error::from(err)
    })
}

fn new_grid() -> Grid {
    Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    })
}

fn print_symbols(session: &CompilationSession) {
    let mut grid = new_grid();
    for (name, offset) in session.symbols.entries() {
        grid.add(Cell::from(name.to_string()));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(format!("$RSB+{}", offset)));
    }
    println!("{} variable(s), {} byte frame", session.symbols.len(), session.symbols.frame_size());
    println!("{}", grid.fit_into_columns(3));
}

fn print_listing(program: &Program) {
    let mut grid = new_grid();
    for entry in program.listing.iter() {
        let bytes: Vec<String> = program.bytes_of(entry).iter().map(|b| format!("{:02X}", b)).collect();
        grid.add(Cell::from(format!("0x{:04X}:", entry.offset)));
        grid.add(Cell::from(format!("{:>4}", entry.line)));
        grid.add(Cell::from(entry.text.clone()));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(bytes.join(" ")));
    }
    println!("{}", grid.fit_into_columns(5));

    let mut labels = new_grid();
    for (name, offset) in program.labels.entries() {
        labels.add(Cell::from(name.to_string()));
        labels.add(Cell::from(format!("0x{:04X}", offset)));
    }
    println!("{}", labels.fit_into_columns(2));
}

fn print_disassembly(decoded: &[disasm::Decoded]) {
    let mut grid = new_grid();
    for ins in decoded.iter() {
        grid.add(Cell::from(format!("0x{:04X}:", ins.offset)));
        grid.add(Cell::from(format!("{}", ins)));
    }
    println!("{}", grid.fit_into_columns(2));
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("cssc"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile"))
        .arg(Arg::with_name("mnemonics")
            .short("S")
            .takes_value(false)
            .conflicts_with_all(&["assemble", "disassemble"])
            .help("compile only, write SSMA mnemonics"))
        .arg(Arg::with_name("assemble")
            .short("a")
            .takes_value(false)
            .conflicts_with("disassemble")
            .help("the input is SSMA mnemonics, assemble only"))
        .arg(Arg::with_name("disassemble")
            .short("D")
            .takes_value(false)
            .help("the input is an assembled module, print its disassembly"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .takes_value(false)
            .help("prints the symbol table and assembly listing to STDOUT"))
        .get_matches()
}

fn level_for(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_for(verbosity))
        .chain(std::io::stdout())
        .apply().ok();
}
