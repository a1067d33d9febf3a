use crate::core::models::field::{Field, Mesh};
use nalgebra::Vector3;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

const BIN8_CHECK: f64 = 123456789012345.0;
const BIN4_CHECK: f32 = 1234567.0;

/// Output precision of a magnetization snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OvfFormat {
    /// Binary, double precision.
    #[default]
    Bin8,
    /// Binary, single precision.
    Bin4,
    /// Text.
    Text,
}

impl OvfFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OvfFormat::Bin8 => "bin8",
            OvfFormat::Bin4 => "bin4",
            OvfFormat::Text => "txt",
        }
    }

    fn data_block(&self) -> &'static str {
        match self {
            OvfFormat::Bin8 => "Binary 8",
            OvfFormat::Bin4 => "Binary 4",
            OvfFormat::Text => "Text",
        }
    }
}

impl std::str::FromStr for OvfFormat {
    type Err = OvfError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "bin8" => Ok(OvfFormat::Bin8),
            "bin4" => Ok(OvfFormat::Bin4),
            "txt" => Ok(OvfFormat::Text),
            other => Err(OvfError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum OvfError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("OVF parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown OVF format tag '{0}', expected 'bin8', 'bin4' or 'txt'")]
    UnknownFormat(String),

    #[error("Unsupported OVF data block: {0}")]
    Unsupported(String),

    #[error("Inconsistent OVF data: {0}")]
    Data(String),
}

/// Interface for reading and writing magnetization field files.
///
/// Implementors handle format-specific parsing and serialization; the
/// provided `_path` methods wrap buffered file handles around the stream
/// operations.
pub trait FieldFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a field from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Field, Self::Error>;

    /// Writes a field to a writer with the requested output precision.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        field: &Field,
        format: OvfFormat,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads a field from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Field, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a field to a file path with the requested output precision.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        field: &Field,
        format: OvfFormat,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(field, format, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// OVF 2.0 magnetization snapshot files.
pub struct OvfFile;

impl FieldFile for OvfFile {
    type Error = OvfError;

    fn read_from(reader: &mut impl BufRead) -> Result<Field, Self::Error> {
        let mut header = OvfHeader::default();
        let mut line = String::new();
        let mut line_number = 0;
        let data_block = loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(OvfError::Parse {
                    line: line_number,
                    message: "unexpected end of file before data block".to_string(),
                });
            }
            line_number += 1;
            let content = line.trim_start_matches('#').trim();
            if let Some(block) = content.strip_prefix("Begin: Data") {
                break block.trim().to_string();
            }
            if let Some((key, value)) = content.split_once(':') {
                header.set(key.trim(), value.trim(), line_number)?;
            }
        };

        let mesh = header.mesh(line_number)?;
        let count = mesh.cell_count();
        let values = match data_block.as_str() {
            "Binary 8" => read_binary8(reader, count)?,
            "Binary 4" => read_binary4(reader, count)?,
            "Text" => read_text(reader, count, line_number)?,
            other => return Err(OvfError::Unsupported(other.to_string())),
        };
        Field::from_values(mesh, values).map_err(|e| OvfError::Data(e.to_string()))
    }

    fn write_to(
        field: &Field,
        format: OvfFormat,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let mesh = field.mesh();
        let p1 = mesh.p1();
        let p2 = mesh.p2();
        let [nx, ny, nz] = mesh.n();
        let cell = mesh.cell_size();
        let base = p1 + cell / 2.0;

        writeln!(writer, "# OOMMF OVF 2.0")?;
        writeln!(writer, "# Segment count: 1")?;
        writeln!(writer, "# Begin: Segment")?;
        writeln!(writer, "# Begin: Header")?;
        writeln!(writer, "# Title: m")?;
        writeln!(writer, "# meshtype: rectangular")?;
        writeln!(writer, "# meshunit: m")?;
        writeln!(writer, "# xmin: {:?}", p1.x)?;
        writeln!(writer, "# ymin: {:?}", p1.y)?;
        writeln!(writer, "# zmin: {:?}", p1.z)?;
        writeln!(writer, "# xmax: {:?}", p2.x)?;
        writeln!(writer, "# ymax: {:?}", p2.y)?;
        writeln!(writer, "# zmax: {:?}", p2.z)?;
        writeln!(writer, "# xbase: {:?}", base.x)?;
        writeln!(writer, "# ybase: {:?}", base.y)?;
        writeln!(writer, "# zbase: {:?}", base.z)?;
        writeln!(writer, "# xstepsize: {:?}", cell.x)?;
        writeln!(writer, "# ystepsize: {:?}", cell.y)?;
        writeln!(writer, "# zstepsize: {:?}", cell.z)?;
        writeln!(writer, "# xnodes: {nx}")?;
        writeln!(writer, "# ynodes: {ny}")?;
        writeln!(writer, "# znodes: {nz}")?;
        writeln!(writer, "# valuedim: 3")?;
        writeln!(writer, "# valueunits: A/m A/m A/m")?;
        writeln!(writer, "# valuelabels: m_x m_y m_z")?;
        writeln!(writer, "# End: Header")?;
        writeln!(writer, "# Begin: Data {}", format.data_block())?;
        match format {
            OvfFormat::Bin8 => {
                writer.write_all(&BIN8_CHECK.to_le_bytes())?;
                for v in field.values() {
                    for component in [v.x, v.y, v.z] {
                        writer.write_all(&component.to_le_bytes())?;
                    }
                }
                writeln!(writer)?;
            }
            OvfFormat::Bin4 => {
                writer.write_all(&BIN4_CHECK.to_le_bytes())?;
                for v in field.values() {
                    for component in [v.x, v.y, v.z] {
                        writer.write_all(&(component as f32).to_le_bytes())?;
                    }
                }
                writeln!(writer)?;
            }
            OvfFormat::Text => {
                for v in field.values() {
                    writeln!(writer, "{:.17e} {:.17e} {:.17e}", v.x, v.y, v.z)?;
                }
            }
        }
        writeln!(writer, "# End: Data {}", format.data_block())?;
        writeln!(writer, "# End: Segment")?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct OvfHeader {
    min: [Option<f64>; 3],
    max: [Option<f64>; 3],
    nodes: [Option<usize>; 3],
}

impl OvfHeader {
    fn set(&mut self, key: &str, value: &str, line: usize) -> Result<(), OvfError> {
        let axis = |k: &str| "xyz".find(&k[..1]);
        let parse_f64 = |v: &str| {
            v.parse::<f64>().map_err(|e| OvfError::Parse {
                line,
                message: format!("bad float '{v}': {e}"),
            })
        };
        match key {
            "xmin" | "ymin" | "zmin" => {
                self.min[axis(key).unwrap_or(0)] = Some(parse_f64(value)?);
            }
            "xmax" | "ymax" | "zmax" => {
                self.max[axis(key).unwrap_or(0)] = Some(parse_f64(value)?);
            }
            "xnodes" | "ynodes" | "znodes" => {
                let n = value.parse::<usize>().map_err(|e| OvfError::Parse {
                    line,
                    message: format!("bad node count '{value}': {e}"),
                })?;
                self.nodes[axis(key).unwrap_or(0)] = Some(n);
            }
            "valuedim" => {
                if value != "3" {
                    return Err(OvfError::Unsupported(format!("valuedim {value}")));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn mesh(&self, line: usize) -> Result<Mesh, OvfError> {
        let missing = |what: &str| OvfError::Parse {
            line,
            message: format!("header is missing {what}"),
        };
        let mut p1 = [0.0; 3];
        let mut p2 = [0.0; 3];
        let mut n = [0; 3];
        for axis in 0..3 {
            p1[axis] = self.min[axis].ok_or_else(|| missing("min bounds"))?;
            p2[axis] = self.max[axis].ok_or_else(|| missing("max bounds"))?;
            n[axis] = self.nodes[axis].ok_or_else(|| missing("node counts"))?;
        }
        Mesh::new(p1, p2, n).map_err(|e| OvfError::Data(e.to_string()))
    }
}

fn read_binary8(reader: &mut impl Read, count: usize) -> Result<Vec<Vector3<f64>>, OvfError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    let check = f64::from_le_bytes(buf);
    if check != BIN8_CHECK {
        return Err(OvfError::Data(format!(
            "binary 8 check value mismatch: {check:?}"
        )));
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let mut components = [0.0; 3];
        for component in &mut components {
            reader.read_exact(&mut buf)?;
            *component = f64::from_le_bytes(buf);
        }
        values.push(Vector3::from(components));
    }
    Ok(values)
}

fn read_binary4(reader: &mut impl Read, count: usize) -> Result<Vec<Vector3<f64>>, OvfError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let check = f32::from_le_bytes(buf);
    if check != BIN4_CHECK {
        return Err(OvfError::Data(format!(
            "binary 4 check value mismatch: {check:?}"
        )));
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let mut components = [0.0; 3];
        for component in &mut components {
            reader.read_exact(&mut buf)?;
            *component = f32::from_le_bytes(buf) as f64;
        }
        values.push(Vector3::from(components));
    }
    Ok(values)
}

fn read_text(
    reader: &mut impl BufRead,
    count: usize,
    start_line: usize,
) -> Result<Vec<Vector3<f64>>, OvfError> {
    let mut values = Vec::with_capacity(count);
    let mut line = String::new();
    let mut line_number = start_line;
    while values.len() < count {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(OvfError::Parse {
                line: line_number,
                message: format!("expected {count} data rows, got {}", values.len()),
            });
        }
        line_number += 1;
        let row: Result<Vec<f64>, _> = line.split_whitespace().map(str::parse).collect();
        let row = row.map_err(|e| OvfError::Parse {
            line: line_number,
            message: format!("bad data row: {e}"),
        })?;
        if row.len() != 3 {
            return Err(OvfError::Parse {
                line: line_number,
                message: format!("expected 3 components per row, got {}", row.len()),
            });
        }
        values.push(Vector3::new(row[0], row[1], row[2]));
    }
    Ok(values)
}
