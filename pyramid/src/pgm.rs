//! PGM (portable graymap) image files.
//!
//! Reads binary (`P5`, 8 or 16 bit) and ASCII (`P2`) graymaps into a
//! [`Plane`] and writes planes as 8 bit binary graymaps. Samples are scaled to
//! the 0..255 range on read, so planes from files with different maximum
//! values compare on the same scale.

use log::{debug, info};
use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::plane::Plane;

/// Maximum value of written files
const MAX_VALUE: u32 = 255;

/// Error values that may be returned when reading or writing PGM files.
#[derive(Debug)]
pub enum PgmError {
    /// Underlying I/O failure.
    Io(io::Error),

    /// Invalid magic number.
    ///
    /// Only `P5` (binary) and `P2` (plain) graymaps are supported.
    InvalidMagic([u8; 2]),

    /// A header field is missing or is not a number.
    MalformedHeader { field: &'static str },

    /// The maximum sample value must be within 1..=65535.
    UnsupportedMaxValue(u64),

    /// The raster ended before `width * height` samples were read.
    Truncated { expected: usize, found: usize },
}

impl error::Error for PgmError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PgmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::InvalidMagic(magic) => {
                write!(
                    f,
                    "invalid magic number {:?}",
                    String::from_utf8_lossy(magic)
                )
            }
            Self::MalformedHeader { field } => {
                write!(f, "malformed header, invalid or missing {}", field)
            }
            Self::UnsupportedMaxValue(value) => {
                write!(f, "unsupported maximum value {}", value)
            }
            Self::Truncated { expected, found } => {
                write!(
                    f,
                    "truncated raster, expected {} samples, found {}",
                    expected, found
                )
            }
        }
    }
}

impl From<io::Error> for PgmError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Plain,
    Binary,
}

fn next_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0; 1];
    match reader.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

/// Read the next whitespace separated token, skipping `#` comments.
///
/// The single whitespace byte or comment terminating the token is consumed.
fn read_token<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut token = Vec::new();
    while let Some(byte) = next_byte(reader)? {
        if byte == b'#' {
            let mut comment = Vec::new();
            reader.read_until(b'\n', &mut comment)?;
            if token.is_empty() {
                continue;
            }
            break;
        }
        if byte.is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }
        token.push(byte);
    }
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&token).into_owned()))
}

fn read_header_field<R: BufRead>(reader: &mut R, field: &'static str) -> Result<u64, PgmError> {
    read_token(reader)?
        .and_then(|token| token.parse::<u64>().ok())
        .ok_or(PgmError::MalformedHeader { field })
}

/// Decode a PGM image.
pub fn read_pgm<R: BufRead>(reader: &mut R) -> Result<Plane, PgmError> {
    let mut magic = [0; 2];
    reader.read_exact(&mut magic)?;
    let encoding = match &magic {
        b"P2" => Encoding::Plain,
        b"P5" => Encoding::Binary,
        _ => return Err(PgmError::InvalidMagic(magic)),
    };

    let width = usize::try_from(read_header_field(reader, "width")?)
        .map_err(|_| PgmError::MalformedHeader { field: "width" })?;
    let height = usize::try_from(read_header_field(reader, "height")?)
        .map_err(|_| PgmError::MalformedHeader { field: "height" })?;
    let max_value = read_header_field(reader, "maximum value")?;
    if max_value == 0 || max_value > u16::MAX as u64 {
        return Err(PgmError::UnsupportedMaxValue(max_value));
    }
    debug!(
        "PGM header {:?} {}x{} max value {}",
        encoding, width, height, max_value
    );

    let bytes_per_sample = if max_value < 256 { 1 } else { 2 };
    let (expected, raster_len) = width
        .checked_mul(height)
        .and_then(|samples| Some((samples, samples.checked_mul(bytes_per_sample)?)))
        .ok_or(PgmError::MalformedHeader {
            field: "dimensions",
        })?;

    // The raster grows as it is read, header values are not trusted for allocation.
    let samples: Vec<u64> = match encoding {
        Encoding::Binary => {
            let mut raw = Vec::new();
            reader
                .by_ref()
                .take(raster_len as u64)
                .read_to_end(&mut raw)?;
            if raw.len() < raster_len {
                return Err(PgmError::Truncated {
                    expected,
                    found: raw.len() / bytes_per_sample,
                });
            }
            if bytes_per_sample == 1 {
                raw.iter().map(|&b| b as u64).collect()
            } else {
                raw.chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]) as u64)
                    .collect()
            }
        }
        Encoding::Plain => {
            let mut samples = Vec::new();
            for found in 0..expected {
                let sample = read_token(reader)?
                    .ok_or(PgmError::Truncated { expected, found })?
                    .parse::<u64>()
                    .map_err(|_| PgmError::MalformedHeader { field: "sample" })?;
                samples.push(sample);
            }
            samples
        }
    };

    let scale = MAX_VALUE as f64 / max_value as f64;
    let data = samples
        .into_iter()
        .map(|s| (s.min(max_value) as f64) * scale)
        .collect();
    Ok(Plane::from_data(data, width, height))
}

/// Encode a plane as a binary 8 bit PGM image.
///
/// Samples are rounded and clamped to 0..=255.
pub fn write_pgm<W: Write>(plane: &Plane, writer: &mut W) -> Result<(), PgmError> {
    write!(
        writer,
        "P5\n{} {}\n{}\n",
        plane.width(),
        plane.height(),
        MAX_VALUE
    )?;
    let raster: Vec<u8> = plane
        .data()
        .iter()
        .map(|v| v.round().clamp(0.0, MAX_VALUE as f64) as u8)
        .collect();
    writer.write_all(&raster)?;
    Ok(())
}

/// Load a PGM file from disk.
pub fn load_pgm<P: AsRef<Path>>(path: P) -> Result<Plane, PgmError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let plane = read_pgm(&mut reader)?;
    info!(
        "loaded {}x{} image from {}",
        plane.width(),
        plane.height(),
        path.display()
    );
    Ok(plane)
}

/// Save a plane to disk as a PGM file.
pub fn save_pgm<P: AsRef<Path>>(plane: &Plane, path: P) -> Result<(), PgmError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_pgm(plane, &mut writer)?;
    writer.flush()?;
    info!(
        "saved {}x{} image to {}",
        plane.width(),
        plane.height(),
        path.display()
    );
    Ok(())
}
