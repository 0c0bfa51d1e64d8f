use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};
use log::{error, info};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use geolabel::commands::{CommandFactory, GeoLabelCommandFactory};
use geolabel::config::Config;
use geolabel::utils::logger::Logger;

/// Exit status of a batch that completed with failed units
const EXIT_UNITS_FAILED: i32 = 2;

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .required(true)
}

fn compression_arg() -> Arg {
    Arg::new("compression")
        .long("compression")
        .help("Compression of written GeoTIFFs (none, deflate, zstd)")
        .value_name("NAME")
        .default_value("none")
}

fn nodata_arg() -> Arg {
    Arg::new("nodata-threshold")
        .long("nodata-threshold")
        .help("Samples at or below this value count as nodata")
        .value_name("VALUE")
        .allow_negative_numbers(true)
        .value_parser(value_parser!(f64))
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("geolabel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between GeoTIFF/GeoJSON geometry and normalized detection annotations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write one line per processed unit to this file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .help("Write the batch report as JSON to this file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print warnings and errors, hide progress bars")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Process units one at a time")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            ClapCommand::new("info")
                .about("Describe a GeoTIFF")
                .arg(path_arg("input", "Input GeoTIFF")),
        )
        .subcommand(
            ClapCommand::new("normalize")
                .about("Stretch rasters to 8-bit RGB PNG images")
                .arg(path_arg("input", "GeoTIFF file or directory"))
                .arg(path_arg("output", "PNG file or output directory"))
                .arg(nodata_arg()),
        )
        .subcommand(
            ClapCommand::new("annotate")
                .about("Export normalized images and label files from rasters and vector features")
                .arg(path_arg("raster", "GeoTIFF file or directory"))
                .arg(path_arg("vector", "GeoJSON file or directory, paired with rasters by file stem"))
                .arg(path_arg("images", "Output directory for PNG images"))
                .arg(path_arg("labels", "Output directory for label files"))
                .arg(
                    Arg::new("class-field")
                        .long("class-field")
                        .help("Feature attribute holding the class id")
                        .value_name("FIELD"),
                )
                .arg(
                    Arg::new("clamp")
                        .long("clamp")
                        .help("Clip annotations to the image bounds")
                        .action(ArgAction::SetTrue),
                )
                .arg(nodata_arg()),
        )
        .subcommand(
            ClapCommand::new("detections")
                .about("Convert label files into GeoJSON boxes in the raster CRS")
                .arg(path_arg("raster", "GeoTIFF file or directory"))
                .arg(path_arg("labels", "Label file or directory, paired with rasters by file stem"))
                .arg(path_arg("output", "GeoJSON file or output directory")),
        )
        .subcommand(
            ClapCommand::new("clip")
                .about("Clip rasters by every polygon of a GeoJSON file")
                .arg(path_arg("raster", "GeoTIFF file or directory"))
                .arg(path_arg("polygons", "GeoJSON with clip polygons"))
                .arg(path_arg("features", "GeoJSON filtered against each polygon").required(false))
                .arg(path_arg("output", "Output directory"))
                .arg(compression_arg()),
        )
        .subcommand(
            ClapCommand::new("tile")
                .about("Cut images or GeoTIFFs into square tiles")
                .arg(path_arg("input", "Image/GeoTIFF file or directory"))
                .arg(path_arg("output", "Output directory"))
                .arg(
                    Arg::new("size")
                        .long("size")
                        .help("Tile edge length in pixels")
                        .value_name("PIXELS")
                        .value_parser(value_parser!(u32).range(1..)),
                )
                .arg(compression_arg()),
        )
        .subcommand(
            ClapCommand::new("draw")
                .about("Draw label boxes onto their images")
                .arg(path_arg("images", "Image file or directory"))
                .arg(path_arg("labels", "Label file or directory, paired with images by file stem"))
                .arg(path_arg("output", "Output directory")),
        )
        .subcommand(
            ClapCommand::new("group")
                .about("Dissolve features into one bounding box per attribute value")
                .arg(path_arg("input", "Input GeoJSON"))
                .arg(
                    Arg::new("field")
                        .long("field")
                        .help("Attribute to group by")
                        .value_name("FIELD")
                        .required(true),
                )
                .arg(path_arg("output", "Output GeoJSON")),
        )
}

/// Matches holding the global flags, wherever they were given
fn global_matches(matches: &ArgMatches) -> &ArgMatches {
    matches.subcommand().map(|(_, sub)| sub).unwrap_or(matches)
}

fn fail(message: &str) -> ! {
    error!("{}", message);
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn main() {
    let matches = build_cli().get_matches();
    let globals = global_matches(&matches);

    let verbose = globals.get_flag("verbose");
    let quiet = globals.get_flag("quiet");
    Logger::init_global_logger(verbose, quiet);

    let config = match Config::load_or_default(globals.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(c) => c,
        Err(e) => fail(&e.to_string()),
    };

    let logger = match globals.get_one::<PathBuf>("log-file") {
        Some(path) => match Logger::new(path) {
            Ok(l) => l,
            Err(e) => fail(&format!("cannot create log file {}: {}", path.display(), e)),
        },
        None => Logger::disabled(),
    };

    let report_path = globals
        .get_one::<PathBuf>("report")
        .cloned()
        .or_else(|| config.batch.report.clone());

    let show_progress = !quiet && std::io::stderr().is_terminal();
    let factory = GeoLabelCommandFactory::new(config).show_progress(show_progress);

    let command = match factory.create_command(&matches, &logger) {
        Ok(command) => command,
        Err(e) => fail(&format!("Failed to create command: {}", e)),
    };

    let report = match command.execute() {
        Ok(report) => report,
        Err(e) => fail(&e.to_string()),
    };

    if let Err(e) = logger.log(&report.summary()) {
        error!("Cannot write run log: {}", e);
    }
    if let Some(path) = report_path {
        if let Err(e) = report.write_json(&path) {
            fail(&e.to_string());
        }
        info!("Report written to {}", path.display());
    }

    if report.skipped() > 0 || report.has_failures() {
        eprint!("{}", report);
    } else {
        info!("{}", report.summary());
    }

    if report.has_failures() {
        process::exit(EXIT_UNITS_FAILED);
    }
}
