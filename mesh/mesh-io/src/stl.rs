//! Binary STL codec.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (free ASCII text, ignored on read)
//! UINT32       – Number of triangles (little-endian)
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (written as 0, ignored on read)
//! end
//! ```
//!
//! A well-formed stream is exactly `84 + 50 * count` bytes long; shorter
//! streams are rejected with [`IoError::Truncated`] naming the offset at
//! which data ran out. Trailing bytes after the last record are ignored.
//!
//! # Streaming
//!
//! [`StlReader`] and [`StlWriter`] move one 50-byte record at a time, so
//! files with tens of millions of triangles can be classified and split
//! without holding the mesh in memory. [`decode`] and [`encode`] are the
//! whole-mesh conveniences built on top of them.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, MeshTopology, Point3, Triangle, Vector3, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// STL binary header size in bytes.
pub const HEADER_SIZE: usize = 80;

/// Header plus the little-endian triangle count.
pub const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;

/// Size of one triangle record (normal + 3 vertices + attribute).
pub const TRIANGLE_SIZE: usize = 50;

/// Header text used when the caller has nothing better to say.
pub const DEFAULT_HEADER: &str = "Binary STL written by mesh-io";

/// Upper bound on up-front allocation when the stream length is unknown.
const MAX_PREALLOCATED_TRIANGLES: usize = 1 << 20;

/// Total byte length of a binary STL holding `triangle_count` triangles.
///
/// # Example
///
/// ```
/// use mesh_io::encoded_len;
///
/// assert_eq!(encoded_len(0), 84);
/// assert_eq!(encoded_len(2), 184);
/// ```
#[must_use]
pub fn encoded_len(triangle_count: u32) -> u64 {
    PREAMBLE_SIZE as u64 + TRIANGLE_SIZE as u64 * u64::from(triangle_count)
}

/// Build an 80-byte header from free text.
///
/// Text is truncated to 80 bytes and padded with spaces. Characters that
/// are not printable ASCII are replaced with `?`.
#[must_use]
pub fn header_bytes(text: &str) -> [u8; HEADER_SIZE] {
    let mut header = [b' '; HEADER_SIZE];
    for (slot, ch) in header.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(ch)
            .ok()
            .filter(|b| b.is_ascii_graphic() || *b == b' ')
            .unwrap_or(b'?');
    }
    header
}

/// The 84-byte preamble of a binary STL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StlHeader {
    /// Raw header bytes.
    pub text: [u8; HEADER_SIZE],
    /// Declared number of triangle records.
    pub triangle_count: u32,
}

impl StlHeader {
    /// Header text with trailing padding removed, decoded lossily.
    #[must_use]
    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.text)
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string()
    }

    /// Byte length implied by the declared triangle count.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        encoded_len(self.triangle_count)
    }
}

/// One decoded 50-byte triangle record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StlTriangle {
    /// Stored normal (not validated; often zero or stale).
    pub normal: [f32; 3],
    /// Vertex positions in file order (winding preserved).
    pub vertices: [[f32; 3]; 3],
    /// Attribute byte count field.
    pub attribute: u16,
}

impl StlTriangle {
    /// Decode a record from its 50 raw bytes.
    #[must_use]
    pub fn from_bytes(buf: &[u8; TRIANGLE_SIZE]) -> Self {
        let scalar = |at: usize| f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let vec3 = |at: usize| [scalar(at), scalar(at + 4), scalar(at + 8)];
        Self {
            normal: vec3(0),
            vertices: [vec3(12), vec3(24), vec3(36)],
            attribute: u16::from_le_bytes([buf[48], buf[49]]),
        }
    }

    /// Encode this record into 50 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRIANGLE_SIZE] {
        let mut buf = [0u8; TRIANGLE_SIZE];
        let scalars = self.normal.iter().chain(self.vertices.iter().flatten());
        for (chunk, value) in buf[..48].chunks_exact_mut(4).zip(scalars) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        buf[48..].copy_from_slice(&self.attribute.to_le_bytes());
        buf
    }

    /// Build a record from a triangle and its normal, narrowing to `f32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: STL stores f32
    pub fn from_triangle(triangle: &Triangle, normal: Vector3<f64>) -> Self {
        let narrow = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];
        Self {
            normal: [normal.x as f32, normal.y as f32, normal.z as f32],
            vertices: [narrow(&triangle.v0), narrow(&triangle.v1), narrow(&triangle.v2)],
            attribute: 0,
        }
    }

    /// Vertex positions widened to `f64`.
    #[must_use]
    pub fn triangle(&self) -> Triangle {
        Triangle::from_f32(&self.vertices)
    }

    /// Centroid of the three vertices.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        self.triangle().centroid()
    }

    /// Stored normal widened to `f64`.
    #[must_use]
    pub fn normal_vector(&self) -> Vector3<f64> {
        Vector3::new(
            f64::from(self.normal[0]),
            f64::from(self.normal[1]),
            f64::from(self.normal[2]),
        )
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Streaming binary STL reader.
///
/// Reads the preamble on construction, then yields one record per call.
/// Reading stops after the declared count; a short read is reported as
/// [`IoError::Truncated`] and ends iteration.
///
/// # Example
///
/// ```
/// use mesh_io::{encode, StlReader};
/// use mesh_types::unit_cube;
///
/// let bytes = encode(&unit_cube(), "cube").unwrap();
/// let reader = StlReader::new(bytes.as_slice()).unwrap();
/// assert_eq!(reader.triangle_count(), 12);
///
/// let top = reader
///     .filter_map(Result::ok)
///     .filter(|t| t.centroid().z > 0.9)
///     .count();
/// assert_eq!(top, 2);
/// ```
#[derive(Debug)]
pub struct StlReader<R> {
    reader: R,
    header: StlHeader,
    read: u32,
    failed: bool,
}

impl<R: Read> StlReader<R> {
    /// Read the 84-byte preamble.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Truncated`] if fewer than 84 bytes are available,
    /// or [`IoError::Io`] on read failure.
    pub fn new(mut reader: R) -> IoResult<Self> {
        let mut preamble = [0u8; PREAMBLE_SIZE];
        let got = read_full(&mut reader, &mut preamble)?;
        if got < PREAMBLE_SIZE {
            return Err(IoError::Truncated {
                offset: got as u64,
                expected: PREAMBLE_SIZE as u64,
            });
        }

        let mut text = [0u8; HEADER_SIZE];
        text.copy_from_slice(&preamble[..HEADER_SIZE]);
        let triangle_count = u32::from_le_bytes([
            preamble[HEADER_SIZE],
            preamble[HEADER_SIZE + 1],
            preamble[HEADER_SIZE + 2],
            preamble[HEADER_SIZE + 3],
        ]);

        Ok(Self {
            reader,
            header: StlHeader {
                text,
                triangle_count,
            },
            read: 0,
            failed: false,
        })
    }

    /// The decoded preamble.
    #[must_use]
    pub const fn header(&self) -> &StlHeader {
        &self.header
    }

    /// Declared number of triangles.
    #[must_use]
    pub const fn triangle_count(&self) -> u32 {
        self.header.triangle_count
    }

    /// Index of the next record to be read.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.read
    }

    /// Records not yet read.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.header.triangle_count - self.read
    }

    /// Read the next record without decoding it.
    ///
    /// Returns `Ok(None)` once the declared count has been read.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Truncated`] if the stream ends mid-record or early.
    pub fn read_raw(&mut self) -> IoResult<Option<[u8; TRIANGLE_SIZE]>> {
        if self.failed || self.read >= self.header.triangle_count {
            return Ok(None);
        }

        let mut buf = [0u8; TRIANGLE_SIZE];
        let got = read_full(&mut self.reader, &mut buf).inspect_err(|_| self.failed = true)?;
        if got < TRIANGLE_SIZE {
            self.failed = true;
            return Err(IoError::Truncated {
                offset: encoded_len(self.read) + got as u64,
                expected: self.header.encoded_len(),
            });
        }

        self.read += 1;
        Ok(Some(buf))
    }

    /// Read and decode the next record.
    ///
    /// # Errors
    ///
    /// See [`StlReader::read_raw`].
    pub fn read_triangle(&mut self) -> IoResult<Option<StlTriangle>> {
        Ok(self.read_raw()?.map(|buf| StlTriangle::from_bytes(&buf)))
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for StlReader<R> {
    type Item = IoResult<StlTriangle>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_triangle().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, Some(self.remaining() as usize))
    }
}

/// Streaming binary STL writer.
///
/// The triangle count goes into the preamble, so it must be known up front.
/// [`StlWriter::finish`] verifies that exactly that many records were written.
///
/// # Example
///
/// ```
/// use mesh_io::{StlReader, StlTriangle, StlWriter};
///
/// let mut writer = StlWriter::new(Vec::new(), "one triangle", 1).unwrap();
/// writer.write_triangle(&StlTriangle {
///     normal: [0.0, 0.0, 1.0],
///     vertices: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     attribute: 0,
/// }).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert_eq!(bytes.len(), 134);
/// ```
#[derive(Debug)]
pub struct StlWriter<W: Write> {
    writer: W,
    declared: u32,
    written: u32,
}

impl<W: Write> StlWriter<W> {
    /// Write the preamble and prepare to accept `triangle_count` records.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] if the preamble cannot be written.
    pub fn new(mut writer: W, header_text: &str, triangle_count: u32) -> IoResult<Self> {
        writer.write_all(&header_bytes(header_text))?;
        writer.write_all(&triangle_count.to_le_bytes())?;
        Ok(Self {
            writer,
            declared: triangle_count,
            written: 0,
        })
    }

    /// Copy a raw record, forcing the attribute field to zero.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::TriangleCountMismatch`] if the declared count is
    /// already reached, or [`IoError::Io`] on write failure.
    pub fn write_raw(&mut self, record: &[u8; TRIANGLE_SIZE]) -> IoResult<()> {
        if self.written >= self.declared {
            return Err(IoError::TriangleCountMismatch {
                declared: self.declared,
                written: self.written.saturating_add(1),
            });
        }
        self.writer.write_all(&record[..TRIANGLE_SIZE - 2])?;
        self.writer.write_all(&0u16.to_le_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Encode and write one record.
    ///
    /// # Errors
    ///
    /// See [`StlWriter::write_raw`].
    pub fn write_triangle(&mut self, triangle: &StlTriangle) -> IoResult<()> {
        self.write_raw(&triangle.to_bytes())
    }

    /// Records written so far.
    #[must_use]
    pub const fn written(&self) -> u32 {
        self.written
    }

    /// Flush and return the sink.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::TriangleCountMismatch`] if fewer records were
    /// written than declared, or [`IoError::Io`] if flushing fails.
    pub fn finish(mut self) -> IoResult<W> {
        if self.written != self.declared {
            return Err(IoError::TriangleCountMismatch {
                declared: self.declared,
                written: self.written,
            });
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// How decoded triangle corners become mesh vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexMode {
    /// Corners with bit-identical coordinates share one vertex, numbered in
    /// first-seen order. Restores connectivity lost by the STL format.
    #[default]
    Merged,
    /// Every triangle gets three fresh vertices.
    Soup,
}

/// Incrementally builds an [`IndexedMesh`] from STL records.
#[derive(Debug)]
pub struct MeshBuilder {
    mode: VertexMode,
    mesh: IndexedMesh,
    index: HashMap<[u32; 3], u32>,
}

impl MeshBuilder {
    /// Create a builder expecting roughly `triangle_hint` records.
    #[must_use]
    pub fn new(mode: VertexMode, triangle_hint: usize) -> Self {
        let faces = triangle_hint.min(MAX_PREALLOCATED_TRIANGLES);
        let vertices = match mode {
            VertexMode::Merged => faces / 2 + 3,
            VertexMode::Soup => faces * 3,
        };
        let mut mesh = IndexedMesh::with_capacity(vertices, faces);
        mesh.face_normals.reserve(faces);
        Self {
            mode,
            mesh,
            index: HashMap::new(),
        }
    }

    /// Append one record, keeping its stored normal.
    pub fn push(&mut self, triangle: &StlTriangle) {
        let face = triangle.vertices.map(|corner| self.vertex_index(corner));
        self.mesh.faces.push(face);
        self.mesh.face_normals.push(triangle.normal_vector());
    }

    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
    fn vertex_index(&mut self, corner: [f32; 3]) -> u32 {
        let key = corner.map(f32::to_bits);
        if self.mode == VertexMode::Merged {
            if let Some(&existing) = self.index.get(&key) {
                return existing;
            }
        }
        let index = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(Vertex::from_f32(corner));
        if self.mode == VertexMode::Merged {
            self.index.insert(key, index);
        }
        index
    }

    /// Return the finished mesh.
    #[must_use]
    pub fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

/// Decode a binary STL held in memory, merging identical vertices.
///
/// # Errors
///
/// Returns [`IoError::Truncated`] if `bytes` is shorter than
/// `84 + 50 * count`.
///
/// # Example
///
/// ```
/// use mesh_io::{decode, encode};
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// let bytes = encode(&cube, "cube").unwrap();
/// let decoded = decode(&bytes).unwrap();
/// assert_eq!(decoded.face_count(), 12);
/// assert_eq!(decoded.vertex_count(), 8);
/// ```
pub fn decode(bytes: &[u8]) -> IoResult<IndexedMesh> {
    decode_with(bytes, VertexMode::Merged)
}

/// Decode a binary STL held in memory with an explicit [`VertexMode`].
///
/// # Errors
///
/// See [`decode`].
pub fn decode_with(bytes: &[u8], mode: VertexMode) -> IoResult<IndexedMesh> {
    let reader = StlReader::new(bytes)?;
    let expected = reader.header().encoded_len();
    let actual = bytes.len() as u64;
    if actual < expected {
        return Err(IoError::Truncated {
            offset: actual,
            expected,
        });
    }
    if actual > expected {
        debug!(extra = actual - expected, "ignoring bytes after last triangle");
    }
    read_mesh(reader, mode)
}

/// Drain a reader into an in-memory mesh.
///
/// # Errors
///
/// Propagates read errors from the reader.
pub fn read_mesh<R: Read>(mut reader: StlReader<R>, mode: VertexMode) -> IoResult<IndexedMesh> {
    let mut builder = MeshBuilder::new(mode, reader.remaining() as usize);
    while let Some(triangle) = reader.read_triangle()? {
        builder.push(&triangle);
    }
    Ok(builder.finish())
}

/// Encode a mesh as binary STL bytes.
///
/// Supplied face normals are written as-is; otherwise normals are derived
/// from winding (zero for degenerate triangles).
///
/// # Errors
///
/// Returns [`IoError::InvalidFaceIndex`] for out-of-range faces, or
/// [`IoError::TooManyTriangles`] past `u32::MAX` faces.
///
/// # Example
///
/// ```
/// use mesh_io::encode;
/// use mesh_types::IndexedMesh;
///
/// let bytes = encode(&IndexedMesh::new(), "empty").unwrap();
/// assert_eq!(bytes.len(), 84);
/// ```
pub fn encode(mesh: &IndexedMesh, header_text: &str) -> IoResult<Vec<u8>> {
    let count = checked_triangle_count(mesh)?;
    let capacity = usize::try_from(encoded_len(count)).unwrap_or(0);
    write_mesh(mesh, header_text, Vec::with_capacity(capacity))
}

/// Encode a mesh into any writer, one record at a time.
///
/// # Errors
///
/// See [`encode`]; also propagates write failures.
pub fn write_mesh<W: Write>(mesh: &IndexedMesh, header_text: &str, writer: W) -> IoResult<W> {
    let count = checked_triangle_count(mesh)?;
    let mut stl = StlWriter::new(writer, header_text, count)?;
    for face_index in 0..mesh.faces.len() {
        let triangle = mesh
            .triangle(face_index)
            .ok_or_else(|| invalid_face(mesh, face_index))?;
        let normal = mesh.face_normal(face_index).unwrap_or_else(Vector3::zeros);
        stl.write_triangle(&StlTriangle::from_triangle(&triangle, normal))?;
    }
    stl.finish()
}

fn checked_triangle_count(mesh: &IndexedMesh) -> IoResult<u32> {
    u32::try_from(mesh.faces.len()).map_err(|_| IoError::TooManyTriangles {
        count: mesh.faces.len(),
    })
}

fn invalid_face(mesh: &IndexedMesh, face: usize) -> IoError {
    let vertex_count = mesh.vertices.len();
    let index = mesh.faces[face]
        .iter()
        .copied()
        .find(|&i| i as usize >= vertex_count)
        .unwrap_or(u32::MAX);
    IoError::InvalidFaceIndex {
        face,
        index,
        vertex_count,
    }
}

/// Open a binary STL file for streaming.
///
/// The file length is checked against the declared count before any
/// record is read, so truncated files fail before partial output exists.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Truncated`], or [`IoError::Io`].
pub fn open_stl<P: AsRef<Path>>(path: P) -> IoResult<StlReader<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(e, path))?;
    let file_len = file.metadata()?.len();
    let reader = StlReader::new(BufReader::new(file))?;
    let expected = reader.header().encoded_len();
    if file_len < expected {
        return Err(IoError::Truncated {
            offset: file_len,
            expected,
        });
    }
    debug!(
        path = %path.display(),
        triangles = reader.triangle_count(),
        "opened binary STL"
    );
    Ok(reader)
}

/// Create a binary STL file that will hold `triangle_count` records.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created.
pub fn create_stl<P: AsRef<Path>>(
    path: P,
    header_text: &str,
    triangle_count: u32,
) -> IoResult<StlWriter<BufWriter<File>>> {
    let file = File::create(path)?;
    StlWriter::new(BufWriter::new(file), header_text, triangle_count)
}

/// Load a mesh from a binary STL file, merging identical vertices.
///
/// # Errors
///
/// See [`open_stl`].
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let mesh = load_stl("model.stl").unwrap();
/// println!("Loaded {} faces", mesh.faces.len());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    load_stl_with(path, VertexMode::Merged)
}

/// Load a mesh from a binary STL file with an explicit [`VertexMode`].
///
/// # Errors
///
/// See [`open_stl`].
pub fn load_stl_with<P: AsRef<Path>>(path: P, mode: VertexMode) -> IoResult<IndexedMesh> {
    read_mesh(open_stl(path)?, mode)
}

/// Save a mesh as a binary STL file.
///
/// # Errors
///
/// See [`encode`]; also returns [`IoError::Io`] on write failure.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, header_text: &str) -> IoResult<()> {
    let file = File::create(path)?;
    write_mesh(mesh, header_text, BufWriter::new(file))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn test_triangle() -> IndexedMesh {
        IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2])
    }

    #[test]
    fn empty_mesh_is_84_bytes() {
        let bytes = encode(&IndexedMesh::new(), "empty").unwrap();
        assert_eq!(bytes.len(), 84);
        assert_eq!(&bytes[80..84], &[0, 0, 0, 0]);

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.faces.is_empty());
        assert!(decoded.vertices.is_empty());
    }

    #[test]
    fn record_layout() {
        let bytes = encode(&test_triangle(), "layout").unwrap();
        assert_eq!(bytes.len(), 134);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);

        // Normal of a CCW triangle in the XY plane is +Z
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);

        // Second vertex x = 1.0
        let v1x = f32::from_le_bytes([bytes[108], bytes[109], bytes[110], bytes[111]]);
        assert_eq!(v1x, 1.0);

        // Attribute is zero
        assert_eq!(&bytes[132..134], &[0, 0]);
    }

    #[test]
    fn header_padded_and_truncated() {
        let short = header_bytes("abc");
        assert_eq!(&short[..3], b"abc");
        assert!(short[3..].iter().all(|&b| b == b' '));

        let long = "x".repeat(200);
        assert_eq!(header_bytes(&long), [b'x'; HEADER_SIZE]);

        let odd = header_bytes("région\n");
        assert_eq!(&odd[..7], b"r?gion?");
    }

    #[test]
    fn header_label_trims_padding() {
        let bytes = encode(&test_triangle(), "Region: helmet").unwrap();
        let reader = StlReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.header().label(), "Region: helmet");
    }

    #[test]
    fn truncated_stream_reports_offset() {
        let bytes = encode(&test_triangle(), "t").unwrap();
        let cut = &bytes[..120];

        match decode(cut) {
            Err(IoError::Truncated { offset, expected }) => {
                assert_eq!(offset, 120);
                assert_eq!(expected, 134);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn truncated_preamble() {
        let result = decode(&[0u8; 40]);
        assert!(matches!(
            result,
            Err(IoError::Truncated {
                offset: 40,
                expected: 84
            })
        ));
    }

    #[test]
    fn streaming_reader_reports_mid_record_truncation() {
        let bytes = encode(&test_triangle(), "t").unwrap();
        let mut reader = StlReader::new(&bytes[..100]).unwrap();
        let err = reader.read_raw().unwrap_err();
        assert!(matches!(err, IoError::Truncated { offset: 100, .. }));
        // Iteration ends after a failure
        assert!(reader.next().is_none());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode(&test_triangle(), "t").unwrap();
        bytes.extend_from_slice(&[0xAB; 7]);
        let mesh = decode(&bytes).unwrap();
        assert_eq!(mesh.faces.len(), 1);
    }

    #[test]
    fn merged_and_soup_vertex_modes() {
        let bytes = encode(&mesh_types::unit_cube(), "cube").unwrap();

        let merged = decode_with(&bytes, VertexMode::Merged).unwrap();
        assert_eq!(merged.vertices.len(), 8);

        let soup = decode_with(&bytes, VertexMode::Soup).unwrap();
        assert_eq!(soup.vertices.len(), 36);
        assert_eq!(soup.faces[1], [3, 4, 5]);
    }

    #[test]
    fn decode_keeps_stored_normals() {
        let mut mesh = test_triangle();
        mesh.face_normals.push(Vector3::new(0.0, 1.0, 0.0));
        let decoded = decode(&encode(&mesh, "n").unwrap()).unwrap();
        assert!(decoded.has_face_normals());
        assert_eq!(decoded.face_normals[0], Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn encode_rejects_bad_index() {
        let mut mesh = test_triangle();
        mesh.faces.push([0, 1, 9]);
        let err = encode(&mesh, "bad").unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidFaceIndex {
                face: 1,
                index: 9,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn record_bytes_roundtrip() {
        let record = StlTriangle {
            normal: [0.0, 0.0, -1.0],
            vertices: [[1.5, 2.5, 3.5], [-1.0, 0.0, 7.25], [9.0, 8.0, 7.0]],
            attribute: 0x1234,
        };
        assert_eq!(StlTriangle::from_bytes(&record.to_bytes()), record);
    }

    #[test]
    fn writer_zeroes_attribute_on_raw_copy() {
        let record = StlTriangle {
            normal: [0.0; 3],
            vertices: [[0.0; 3]; 3],
            attribute: 0xFFFF,
        };
        let mut writer = StlWriter::new(Vec::new(), "copy", 1).unwrap();
        writer.write_raw(&record.to_bytes()).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[132..134], &[0, 0]);
    }

    #[test]
    fn writer_enforces_declared_count() {
        let record = [0u8; TRIANGLE_SIZE];

        let short = StlWriter::new(Vec::new(), "short", 2).unwrap();
        assert!(matches!(
            short.finish(),
            Err(IoError::TriangleCountMismatch {
                declared: 2,
                written: 0
            })
        ));

        let mut over = StlWriter::new(Vec::new(), "over", 1).unwrap();
        over.write_raw(&record).unwrap();
        assert!(over.write_raw(&record).is_err());
        assert_eq!(over.written(), 1);
        assert!(over.finish().is_ok());
    }

    #[test]
    fn reader_is_an_iterator() {
        let bytes = encode(&mesh_types::unit_cube(), "cube").unwrap();
        let reader = StlReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.size_hint(), (0, Some(12)));
        let triangles: Vec<_> = reader.collect::<IoResult<_>>().unwrap();
        assert_eq!(triangles.len(), 12);
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_stl("nonexistent_file_12345.stl");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn open_rejects_truncated_file_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.stl");
        let bytes = encode(&mesh_types::unit_cube(), "cube").unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

        let err = open_stl(&path).unwrap_err();
        assert!(matches!(err, IoError::Truncated { .. }));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        let cube = mesh_types::unit_cube();
        save_stl(&cube, &path, "cube").unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), encoded_len(12));
        let loaded = load_stl(&path).unwrap();
        assert_eq!(loaded.faces, cube.faces);
        assert_eq!(loaded.vertices.len(), cube.vertices.len());
    }
}
