// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shipping rendered images over a byte stream.
//!
//! The protocol is line oriented.  The server prompts for a command;
//! `send image` makes it prompt for the four bounds of the region,
//! render it, and send the PNG back in one of two framings:
//!
//! * base64: `IMAGE_SIZE:<n>`, `START_IMAGE`, the base64 text in
//!   newline-terminated chunks of at most 1024 bytes, `END_IMAGE`.
//!   `n` counts bytes of base64 text, not bytes of image.
//! * raw: `START_IMAGE` followed by the PNG bytes until the stream
//!   ends.
//!
//! `end` closes the session.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::thread;

use failure::Fail;
use log::{debug, info, warn};

use crate::config::RenderConfig;
use crate::engine;
use crate::error::RenderError;
use crate::output;
use crate::planes::ComplexPlane;

/// Announces the length of the base64 text that follows.
pub const SIZE_PREFIX: &str = "IMAGE_SIZE:";
/// Opens an image payload.
pub const START_IMAGE: &str = "START_IMAGE";
/// Closes a base64 payload.
pub const END_IMAGE: &str = "END_IMAGE";
/// Longest line of base64 text the sender writes.
pub const CHUNK_SIZE: usize = 1024;
/// The server's command prompt.
pub const COMMAND_PROMPT: &str =
    "Enter a command (type 'end' to quit, 'send image' to get the image): ";

const SEND_IMAGE: &str = "send image";
const END: &str = "end";
const BOUND_NAMES: [&str; 4] = ["Xmin", "Xmax", "Ymin", "Ymax"];

/// Failures on either side of a session.
#[derive(Debug, Fail)]
pub enum DeliveryError {
    /// The underlying stream failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),

    /// The requested render could not be produced.
    #[fail(display = "Render failed: {}", _0)]
    Render(#[cause] RenderError),

    /// The payload was not valid base64.
    #[fail(display = "Could not decode the image payload: {}", _0)]
    Decode(#[cause] base64::DecodeError),

    /// A framing marker was missing.
    #[fail(display = "Expected {:?}, got {:?}", expected, found)]
    UnexpectedLine {
        /// The marker the protocol calls for.
        expected: String,
        /// What arrived instead.
        found: String,
    },

    /// An `IMAGE_SIZE:` line without a usable number.
    #[fail(display = "Could not parse an image size from {:?}", _0)]
    BadSize(String),

    /// The stream ended inside a payload.
    #[fail(display = "Stream ended after {} of {} payload bytes", received, expected)]
    Truncated {
        /// Bytes of base64 text received.
        received: usize,
        /// Bytes of base64 text announced.
        expected: usize,
    },

    /// The peer hung up mid-conversation.
    #[fail(display = "Connection closed by peer")]
    Closed,

    /// The server refused the request.
    #[fail(display = "Server rejected the request: {}", _0)]
    Rejected(String),
}

impl From<io::Error> for DeliveryError {
    fn from(e: io::Error) -> Self {
        DeliveryError::Io(e)
    }
}

impl From<RenderError> for DeliveryError {
    fn from(e: RenderError) -> Self {
        DeliveryError::Render(e)
    }
}

impl From<base64::DecodeError> for DeliveryError {
    fn from(e: base64::DecodeError) -> Self {
        DeliveryError::Decode(e)
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

// Next line with surrounding whitespace removed, or None at end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn expect_line<R: BufRead>(reader: &mut R, expected: &str) -> Result<(), DeliveryError> {
    match read_line(reader)? {
        Some(ref line) if line == expected => Ok(()),
        found => Err(DeliveryError::UnexpectedLine {
            expected: expected.to_string(),
            found: found.unwrap_or_default(),
        }),
    }
}

/// Extracts the payload length from an `IMAGE_SIZE:` line.  `None` if
/// the line is something else entirely.
pub fn parse_size(line: &str) -> Option<Result<usize, DeliveryError>> {
    let line = line.trim();
    if !line.starts_with(SIZE_PREFIX) {
        return None;
    }
    Some(
        line[SIZE_PREFIX.len()..]
            .trim()
            .parse()
            .map_err(|_| DeliveryError::BadSize(line.to_string())),
    )
}

/// Sends `image` in the base64 framing.
pub fn send_image<W: Write>(writer: &mut W, image: &[u8]) -> io::Result<()> {
    let payload = base64::encode(image);
    write_line(writer, &format!("{}{}", SIZE_PREFIX, payload.len()))?;
    write_line(writer, START_IMAGE)?;
    for chunk in payload.as_bytes().chunks(CHUNK_SIZE) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    write_line(writer, END_IMAGE)
}

/// Receives a base64-framed image whose `IMAGE_SIZE:` line announced
/// `size` bytes of text.  Chunk lines are accumulated until that much
/// text has arrived, however the sender split it.
pub fn receive_image<R: BufRead>(reader: &mut R, size: usize) -> Result<Vec<u8>, DeliveryError> {
    expect_line(reader, START_IMAGE)?;
    // The size comes from the peer; reserve no more than a few chunks up
    // front and let the string grow as text actually arrives.
    let mut payload = String::with_capacity(size.min(CHUNK_SIZE * 64));
    while payload.len() < size {
        match read_line(reader)? {
            Some(chunk) => payload.push_str(&chunk),
            None => {
                return Err(DeliveryError::Truncated {
                    received: payload.len(),
                    expected: size,
                })
            }
        }
    }
    expect_line(reader, END_IMAGE)?;
    Ok(base64::decode(&payload)?)
}

/// Sends `image` in the raw framing.  The receiver reads to the end of
/// the stream, so nothing may follow on this connection.
pub fn send_raw_image<W: Write>(writer: &mut W, image: &[u8]) -> io::Result<()> {
    write_line(writer, START_IMAGE)?;
    writer.write_all(image)?;
    writer.flush()
}

/// Receives a raw-framed image: everything after `START_IMAGE` until
/// the stream ends.
pub fn receive_raw_image<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, DeliveryError> {
    expect_line(reader, START_IMAGE)?;
    let mut image = Vec::new();
    reader.read_to_end(&mut image)?;
    Ok(image)
}

/// Runs the server side of one session until the client sends `end`
/// or hangs up.  Every render uses `template` for its size, iteration
/// budget and worker count; the client only chooses the region.
pub fn serve_session<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    template: &RenderConfig,
) -> Result<(), DeliveryError> {
    loop {
        write_line(writer, COMMAND_PROMPT)?;
        let command = match read_line(reader)? {
            Some(command) => command,
            None => return Ok(()),
        };
        match command.as_str() {
            END => return Ok(()),
            SEND_IMAGE => send_requested_image(reader, writer, template)?,
            _ => write_line(writer, "Unknown command. Try again.")?,
        }
    }
}

fn send_requested_image<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    template: &RenderConfig,
) -> Result<(), DeliveryError> {
    let mut bounds = [0.0_f64; 4];
    for (bound, name) in bounds.iter_mut().zip(BOUND_NAMES.iter()) {
        write_line(writer, &format!("Enter {}: ", name))?;
        let answer = read_line(reader)?.ok_or(DeliveryError::Closed)?;
        match answer.parse() {
            Ok(value) => *bound = value,
            Err(_) => {
                write_line(
                    writer,
                    &format!("Invalid input for {}. Please try again.", name),
                )?;
                return Ok(());
            }
        }
    }

    let [xmin, xmax, ymin, ymax] = bounds;
    let config = template.with_plane(ComplexPlane::from_bounds(xmin, xmax, ymin, ymax));
    if let Err(e) = config.validate() {
        write_line(writer, &format!("Invalid region: {}", e))?;
        return Ok(());
    }
    write_line(
        writer,
        &format!(
            "generating mandelbrot with xmin={:.2}, xmax={:.2}, ymin={:.2}, ymax={:.2}",
            xmin, xmax, ymin, ymax
        ),
    )?;

    let grid = engine::render(&config)?;
    let image = output::encode_png(&grid)?;
    write_line(writer, "Image generation triggered successfully.")?;
    send_image(writer, &image)?;
    debug!("sent a {} byte image of {:?}", image.len(), config.plane);
    Ok(())
}

fn bound_for(prompt: &str, plane: &ComplexPlane) -> Option<f64> {
    match prompt {
        "Enter Xmin:" => Some(plane.0.re),
        "Enter Xmax:" => Some(plane.1.re),
        "Enter Ymin:" => Some(plane.0.im),
        "Enter Ymax:" => Some(plane.1.im),
        _ => None,
    }
}

/// Runs the client side of a session: asks for one image of `plane`,
/// answers the server's prompts, and ends the session once the image
/// has arrived.
pub fn request_image<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    plane: &ComplexPlane,
) -> Result<Vec<u8>, DeliveryError> {
    let mut image = None;
    loop {
        let line = read_line(reader)?.ok_or(DeliveryError::Closed)?;
        if line == COMMAND_PROMPT.trim() {
            match image.take() {
                Some(image) => {
                    write_line(writer, END)?;
                    return Ok(image);
                }
                None => write_line(writer, SEND_IMAGE)?,
            }
        } else if let Some(value) = bound_for(&line, plane) {
            write_line(writer, &value.to_string())?;
        } else if let Some(size) = parse_size(&line) {
            image = Some(receive_image(reader, size?)?);
        } else if line.starts_with("Invalid") || line.starts_with("Unknown") {
            return Err(DeliveryError::Rejected(line));
        } else {
            info!("server: {}", line);
        }
    }
}

fn handle_connection(stream: TcpStream, template: &RenderConfig) -> Result<(), DeliveryError> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    serve_session(&mut reader, &mut writer, template)
}

/// Accepts clients forever, one thread per connection.
pub fn serve(listener: TcpListener, template: RenderConfig) -> io::Result<()> {
    info!("listening on {}", listener.local_addr()?);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("could not accept a connection: {}", e);
                continue;
            }
        };
        thread::spawn(move || {
            let peer = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown peer".to_string());
            info!("client connected: {}", peer);
            match handle_connection(stream, &template) {
                Ok(()) => info!("client disconnected: {}", peer),
                Err(e) => warn!("session with {} failed: {}", peer, e),
            }
        });
    }
    Ok(())
}

/// Connects to a server and fetches one PNG of `plane`.
pub fn fetch<A: ToSocketAddrs>(addr: A, plane: &ComplexPlane) -> Result<Vec<u8>, DeliveryError> {
    let stream = TcpStream::connect(addr)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    request_image(&mut reader, &mut writer, plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn template() -> RenderConfig {
        RenderConfig {
            width: 10,
            height: 8,
            plane: ComplexPlane::from_bounds(-2.0, 1.0, -1.0, 1.0),
            max_iterations: 20,
            workers: 2,
        }
    }

    fn session(input: &str) -> (Result<(), DeliveryError>, String) {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut writer = Vec::new();
        let result = serve_session(&mut reader, &mut writer, &template());
        (result, String::from_utf8(writer).unwrap())
    }

    #[test]
    fn framed_image_survives_the_trip() {
        let image: Vec<u8> = (0..5000).map(|i| (i * 7 % 256) as u8).collect();
        let mut wire = Vec::new();
        send_image(&mut wire, &image).unwrap();

        let mut reader = Cursor::new(wire);
        let header = read_line(&mut reader).unwrap().unwrap();
        let size = parse_size(&header).unwrap().unwrap();
        assert_eq!(size, base64::encode(&image).len());
        assert_eq!(receive_image(&mut reader, size).unwrap(), image);
        assert_eq!(read_line(&mut reader).unwrap(), None);
    }

    #[test]
    fn chunks_never_exceed_the_limit() {
        let mut wire = Vec::new();
        send_image(&mut wire, &[42u8; 3000]).unwrap();
        let text = String::from_utf8(wire).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "IMAGE_SIZE:4000");
        assert_eq!(lines[1], START_IMAGE);
        assert_eq!(lines[2].len(), CHUNK_SIZE);
        assert_eq!(lines[5].len(), 4000 - 3 * CHUNK_SIZE);
        assert_eq!(lines[6], END_IMAGE);
    }

    #[test]
    fn unchunked_payloads_are_accepted() {
        let payload = base64::encode(b"mandelbrot");
        let wire = format!("START_IMAGE\n{}\nEND_IMAGE\n", payload);
        let mut reader = Cursor::new(wire.into_bytes());
        assert_eq!(
            receive_image(&mut reader, payload.len()).unwrap(),
            b"mandelbrot".to_vec()
        );
    }

    #[test]
    fn truncated_payload_is_reported() {
        let wire = "START_IMAGE\nQUJD\n";
        let mut reader = Cursor::new(wire.as_bytes().to_vec());
        match receive_image(&mut reader, 8) {
            Err(DeliveryError::Truncated { received, expected }) => {
                assert_eq!((received, expected), (4, 8))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn absurd_sizes_are_reported_as_truncated() {
        let mut reader = Cursor::new(b"START_IMAGE\nQUJD\nEND_IMAGE\n".to_vec());
        match receive_image(&mut reader, usize::MAX) {
            Err(DeliveryError::Truncated { received, expected }) => {
                assert_eq!(received, 4 + END_IMAGE.len());
                assert_eq!(expected, usize::MAX);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn client_survives_a_lying_size_line() {
        let script = format!(
            "{}\n{}{}\n{}\nQUJD\n{}\n",
            COMMAND_PROMPT.trim(),
            SIZE_PREFIX,
            usize::MAX,
            START_IMAGE,
            END_IMAGE
        );
        let mut reader = Cursor::new(script.into_bytes());
        let plane = ComplexPlane::from_bounds(-2.0, 0.5, -1.25, 1.25);
        match request_image(&mut reader, &mut Vec::new(), &plane) {
            Err(DeliveryError::Truncated { expected, .. }) => assert_eq!(expected, usize::MAX),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_start_marker_is_reported() {
        let mut reader = Cursor::new(b"QUJD\n".to_vec());
        match receive_image(&mut reader, 4) {
            Err(DeliveryError::UnexpectedLine { expected, found }) => {
                assert_eq!(expected, START_IMAGE);
                assert_eq!(found, "QUJD");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn size_lines_are_recognised() {
        assert!(parse_size("hello").is_none());
        assert_eq!(parse_size("IMAGE_SIZE:128\n").unwrap().unwrap(), 128);
        assert!(parse_size("IMAGE_SIZE:lots").unwrap().is_err());
    }

    #[test]
    fn raw_framing_reads_to_the_end() {
        let mut wire = Vec::new();
        send_raw_image(&mut wire, &[0, 10, 13, 255, 10]).unwrap();
        let mut reader = Cursor::new(wire);
        assert_eq!(receive_raw_image(&mut reader).unwrap(), vec![0, 10, 13, 255, 10]);
    }

    #[test]
    fn end_closes_the_session() {
        let (result, output) = session("end\n");
        assert!(result.is_ok());
        assert_eq!(output, format!("{}\n", COMMAND_PROMPT));
    }

    #[test]
    fn hanging_up_closes_the_session() {
        let (result, _) = session("");
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_commands_are_answered() {
        let (result, output) = session("dance\nend\n");
        assert!(result.is_ok());
        assert!(output.contains("Unknown command. Try again.\n"));
        assert_eq!(output.matches(COMMAND_PROMPT).count(), 2);
    }

    #[test]
    fn bad_bounds_restart_the_command_loop() {
        let (result, output) = session("send image\n-2\nwide\nend\n");
        assert!(result.is_ok());
        assert!(output.contains("Enter Xmax: \n"));
        assert!(output.contains("Invalid input for Xmax. Please try again.\n"));
        assert!(!output.contains(SIZE_PREFIX));
    }

    #[test]
    fn inverted_regions_are_refused() {
        let (result, output) = session("send image\n1\n-2\n-1\n1\nend\n");
        assert!(result.is_ok());
        assert!(output.contains("Invalid region: "));
        assert!(!output.contains(SIZE_PREFIX));
    }

    #[test]
    fn send_image_delivers_a_png_of_the_template_size() {
        let (result, output) = session("send image\n-2\n1\n-1.5\n1.5\nend\n");
        assert!(result.is_ok());
        assert!(output.contains("generating mandelbrot with xmin=-2.00, xmax=1.00"));

        let mut reader = Cursor::new(output.into_bytes());
        let size = loop {
            let line = read_line(&mut reader).unwrap().unwrap();
            if let Some(size) = parse_size(&line) {
                break size.unwrap();
            }
        };
        let png = receive_image(&mut reader, size).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba();
        assert_eq!(decoded.dimensions(), (10, 8));
        assert_eq!(read_line(&mut reader).unwrap().unwrap(), COMMAND_PROMPT.trim());
    }

    #[test]
    fn client_answers_prompts_and_ends_the_session() {
        let mut script = Vec::new();
        for line in &[
            COMMAND_PROMPT,
            "Enter Xmin: ",
            "Enter Xmax: ",
            "Enter Ymin: ",
            "Enter Ymax: ",
            "generating mandelbrot with xmin=-2.00, xmax=0.50, ymin=-1.25, ymax=1.25",
            "Image generation triggered successfully.",
        ] {
            write_line(&mut script, line).unwrap();
        }
        send_image(&mut script, b"not really a png").unwrap();
        write_line(&mut script, COMMAND_PROMPT).unwrap();

        let mut reader = Cursor::new(script);
        let mut writer = Vec::new();
        let plane = ComplexPlane::from_bounds(-2.0, 0.5, -1.25, 1.25);
        let image = request_image(&mut reader, &mut writer, &plane).unwrap();
        assert_eq!(image, b"not really a png".to_vec());
        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "send image\n-2\n0.5\n-1.25\n1.25\nend\n"
        );
    }

    #[test]
    fn client_reports_refusals() {
        let mut script = Vec::new();
        write_line(&mut script, COMMAND_PROMPT).unwrap();
        write_line(&mut script, "Invalid region: nope").unwrap();
        let mut reader = Cursor::new(script);
        let plane = ComplexPlane::from_bounds(-2.0, 0.5, -1.25, 1.25);
        match request_image(&mut reader, &mut Vec::new(), &plane) {
            Err(DeliveryError::Rejected(line)) => assert_eq!(line, "Invalid region: nope"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
