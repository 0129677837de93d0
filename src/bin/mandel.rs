// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;
use std::net::TcpListener;
use std::str::FromStr;
use std::time::Instant;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use failure::{format_err, Error};
use log::info;
use num::Complex;

use mandelbands::{delivery, output, render, render_mirrored, ComplexPlane, RenderConfig};

// "3x4" or "-0.5,1.25": two values of the same type around `separator`.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let mut halves = s.splitn(2, separator);
    let first = halves.next()?.trim().parse().ok()?;
    let second = halves.next()?.trim().parse().ok()?;
    Some((first, second))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex::new(re, im))
}

fn check_pair<T: FromStr>(s: &str, separator: char, what: &str) -> Result<(), String> {
    parse_pair::<T>(s, separator)
        .map(|_| ())
        .ok_or_else(|| format!("Could not parse {}", what))
}

// Counts on the command line run from 1 to `max` inclusive.
fn check_count(s: &str, max: u32, what: &str) -> Result<(), String> {
    match s.parse::<u32>() {
        Ok(n) if n >= 1 && n <= max => Ok(()),
        Ok(_) => Err(format!("{} must be between 1 and {}", what, max)),
        Err(_) => Err(format!("Could not parse {}", what.to_lowercase())),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const MIRROR: &str = "mirror";
const LISTEN: &str = "listen";
const CONNECT: &str = "connect";

const MAX_THREADS: u32 = 65_536;
const MAX_ITERATIONS: u32 = 1_000_000;

fn size_arg<'a, 'b>(default: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(SIZE)
        .long(SIZE)
        .short("s")
        .takes_value(true)
        .default_value(default)
        .validator(|s| check_pair::<u32>(&s, 'x', "output image size"))
        .help("Size of output image, WIDTHxHEIGHT")
}

fn leftlower_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(LEFTLOWER)
        .long(LEFTLOWER)
        .short("l")
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value("-3.0,-1.265625")
        .validator(|s| check_pair::<f64>(&s, ',', "left lower corner"))
        .help("Left lower corner of the region, RE,IM")
}

fn rightupper_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(RIGHTUPPER)
        .long(RIGHTUPPER)
        .short("r")
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value("1.5,1.265625")
        .validator(|s| check_pair::<f64>(&s, ',', "right upper corner"))
        .help("Right upper corner of the region, RE,IM")
}

fn threads_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(THREADS)
        .long(THREADS)
        .short("t")
        .takes_value(true)
        .validator(|s| check_count(&s, MAX_THREADS, "Thread count"))
        .help("Number of row bands rendered in parallel [default: one per CPU]")
}

fn iterations_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(ITERATIONS)
        .long(ITERATIONS)
        .short("i")
        .takes_value(true)
        .default_value("1000")
        .validator(|s| check_count(&s, MAX_ITERATIONS, "Iteration count"))
        .help("Maximum number of iterations per pixel")
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parallel Mandelbrot renderer")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("render")
                .about("Render the Mandelbrot set to a PNG file")
                .arg(
                    Arg::with_name(OUTPUT)
                        .long(OUTPUT)
                        .short("o")
                        .takes_value(true)
                        .help("Output file [default: named after the render]"),
                )
                .arg(size_arg("1920x1080"))
                .arg(leftlower_arg())
                .arg(rightupper_arg())
                .arg(threads_arg())
                .arg(iterations_arg())
                .arg(
                    Arg::with_name(MIRROR)
                        .long(MIRROR)
                        .help("Render the top half only and mirror it"),
                ),
        )
        .subcommand(
            SubCommand::with_name("serve")
                .about("Render images on request for network clients")
                .arg(
                    Arg::with_name(LISTEN)
                        .long(LISTEN)
                        .takes_value(true)
                        .default_value("127.0.0.1:8080")
                        .help("Address to listen on"),
                )
                .arg(size_arg("1000x1000"))
                .arg(threads_arg())
                .arg(iterations_arg()),
        )
        .subcommand(
            SubCommand::with_name("fetch")
                .about("Ask a server for an image of a region")
                .arg(
                    Arg::with_name(CONNECT)
                        .long(CONNECT)
                        .takes_value(true)
                        .default_value("127.0.0.1:8080")
                        .help("Address of the server"),
                )
                .arg(leftlower_arg())
                .arg(rightupper_arg())
                .arg(
                    Arg::with_name(OUTPUT)
                        .long(OUTPUT)
                        .short("o")
                        .takes_value(true)
                        .default_value("received_image.png")
                        .help("Where to save the image"),
                ),
        )
        .get_matches()
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| format_err!("Missing value for --{}", name))
}

fn plane(matches: &ArgMatches) -> Result<ComplexPlane, Error> {
    let leftlower = parse_complex(value(matches, LEFTLOWER)?)
        .ok_or_else(|| format_err!("Error parsing left lower point"))?;
    let rightupper = parse_complex(value(matches, RIGHTUPPER)?)
        .ok_or_else(|| format_err!("Error parsing right upper point"))?;
    Ok(ComplexPlane(leftlower, rightupper))
}

fn config(matches: &ArgMatches, plane: ComplexPlane) -> Result<RenderConfig, Error> {
    let (width, height) = parse_pair(value(matches, SIZE)?, 'x')
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let iterations = u32::from_str(value(matches, ITERATIONS)?)?;
    let threads = match matches.value_of(THREADS) {
        Some(threads) => u32::from_str(threads)?,
        None => num_cpus::get() as u32,
    };
    Ok(RenderConfig::new(width, height, plane.0, plane.1, iterations, threads)?)
}

fn render_command(matches: &ArgMatches) -> Result<(), Error> {
    let config = config(matches, plane(matches)?)?;
    let mirrored = matches.is_present(MIRROR);

    let start = Instant::now();
    let grid = if mirrored {
        render_mirrored(&config)?
    } else {
        render(&config)?
    };
    let elapsed = start.elapsed();
    info!(
        "rendered {}x{} with {} workers in {:?}",
        config.width, config.height, config.workers, elapsed
    );

    let path = match matches.value_of(OUTPUT) {
        Some(path) => path.to_string(),
        None => output::file_name(&config, elapsed, mirrored),
    };
    output::write_png(&grid, &path)?;
    println!(
        "Time taken to generate Mandelbrot set: {:.2} seconds",
        elapsed.as_secs_f64()
    );
    println!("Mandelbrot set image saved as {}", path);
    Ok(())
}

fn serve_command(matches: &ArgMatches) -> Result<(), Error> {
    let template = config(matches, RenderConfig::default().plane)?;
    let listener = TcpListener::bind(value(matches, LISTEN)?)?;
    println!("Server is listening on {}", listener.local_addr()?);
    delivery::serve(listener, template)?;
    Ok(())
}

fn fetch_command(matches: &ArgMatches) -> Result<(), Error> {
    let plane = plane(matches)?;
    plane.validate()?;
    let image = delivery::fetch(value(matches, CONNECT)?, &plane)?;
    let path = value(matches, OUTPUT)?;
    fs::write(path, &image)?;
    println!("Image received and saved as '{}'", path);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    match matches.subcommand() {
        ("render", Some(sub)) => render_command(sub),
        ("serve", Some(sub)) => serve_command(sub),
        ("fetch", Some(sub)) => fetch_command(sub),
        (other, _) => Err(format_err!("Unknown command {:?}", other)),
    }
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        for cause in e.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
