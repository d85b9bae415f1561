use crate::domain::{PactError, PactResult};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Line-oriented text encoding understood by the inventory engine.
///
/// Implementors write their full state in one pass and rebuild it from a
/// reader. A failed `deserialize` leaves the target unchanged.
pub trait TextSerializable {
    fn serialize(&self, writer: &mut dyn Write) -> PactResult<()>;

    fn deserialize(&mut self, reader: &mut dyn BufRead) -> PactResult<()>;
}

/// Serializes fully before touching `path`, so a refused value leaves no
/// file behind.
pub fn serialize_to_path<T: TextSerializable + ?Sized>(value: &T, path: &Path) -> PactResult<()> {
    let mut buffer = Vec::new();
    value.serialize(&mut buffer)?;

    let file = File::create(path).map_err(|source| {
        PactError::io(
            "IO.SERIALIZE_OPEN",
            format!("failed to create '{}': {}", path.display(), source),
        )
    })?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&buffer)
        .and_then(|()| writer.flush())
        .map_err(|source| {
            PactError::io(
                "IO.SERIALIZE_WRITE",
                format!("failed to write '{}': {}", path.display(), source),
            )
        })
}

pub fn deserialize_from_path<T: TextSerializable + ?Sized>(
    value: &mut T,
    path: &Path,
) -> PactResult<()> {
    let file = File::open(path).map_err(|source| {
        PactError::io(
            "IO.DESERIALIZE_OPEN",
            format!("failed to open '{}': {}", path.display(), source),
        )
    })?;
    let mut reader = BufReader::new(file);
    value.deserialize(&mut reader)
}

pub fn serialize_to_string<T: TextSerializable + ?Sized>(value: &T) -> PactResult<String> {
    let mut buffer = Vec::new();
    value.serialize(&mut buffer)?;
    String::from_utf8(buffer).map_err(|source| {
        PactError::io(
            "IO.SERIALIZE_UTF8",
            format!("serialized text is not valid UTF-8: {}", source),
        )
    })
}

pub(crate) fn write_text(writer: &mut dyn Write, text: &str) -> PactResult<()> {
    writer.write_all(text.as_bytes()).map_err(|source| {
        PactError::io(
            "IO.SERIALIZE_WRITE",
            format!("failed to write serialized text: {}", source),
        )
    })
}

pub(crate) fn read_all_lines(reader: &mut dyn BufRead) -> PactResult<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| {
            PactError::io(
                "IO.DESERIALIZE_READ",
                format!("failed to read serialized text: {}", source),
            )
        })?;
        lines.push(line);
    }
    Ok(lines)
}

/// Shortest round-trip decimal text for a float, always carrying a decimal
/// point or an exponent (`1.0`, `0.25`, `1e-5`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Parses a numeric token as written by Fortran or Python tooling.
///
/// Accepts `D` exponents (`1.0D+03`) and the exponent-without-letter form
/// Fortran emits for three-digit exponents (`1.234-100`). Non-finite values
/// are rejected.
pub fn parse_float_token(token: &str) -> Option<f64> {
    let normalized = token.trim().replace(['D', 'd'], "E");
    if normalized.is_empty() {
        return None;
    }

    if let Ok(value) = normalized.parse::<f64>() {
        return value.is_finite().then_some(value);
    }

    let split = normalized
        .char_indices()
        .skip(1)
        .filter(|(_, character)| matches!(character, '+' | '-'))
        .map(|(index, _)| index)
        .last()?;
    let preceding = normalized[..split].chars().last()?;
    if !(preceding.is_ascii_digit() || preceding == '.') {
        return None;
    }

    let repaired = format!("{}E{}", &normalized[..split], &normalized[split..]);
    repaired
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
