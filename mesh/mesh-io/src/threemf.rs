//! 3MF (3D Manufacturing Format) packaging.
//!
//! 3MF is a ZIP-based format designed for 3D printing, containing XML files
//! that describe geometry plus arbitrary attachments.
//!
//! # Package Layout
//!
//! Every package written here contains:
//! - `[Content_Types].xml` - MIME type mappings
//! - `_rels/.rels` - Relationships
//! - `3D/3dmodel.model` - Model XML with at least one buildable object
//! - any JSON attachments, conventionally `metadata/color_assignment.json`
//!
//! # Geometry Modes
//!
//! - [`ModelGeometry::Mesh`]: one object with vertices and triangles serialized as XML
//! - [`ModelGeometry::Objects`]: one named (optionally colored) object per sub-mesh
//! - [`ModelGeometry::StlReference`]: a placeholder object plus the original
//!   STL bytes stored verbatim at `3D/<name>.stl`
//!
//! # Example
//!
//! ```
//! use mesh_io::{read_entry, read_model, ModelGeometry, ThreeMfPackage, COLOR_ASSIGNMENT_PATH};
//! use mesh_types::unit_cube;
//!
//! let cube = unit_cube();
//! let bytes = ThreeMfPackage::new(ModelGeometry::mesh("cube", &cube))
//!     .with_json(COLOR_ASSIGNMENT_PATH, &serde_json::json!({ "model": "cube" }))
//!     .unwrap()
//!     .to_bytes()
//!     .unwrap();
//!
//! let objects = read_model(&bytes).unwrap();
//! assert_eq!(objects[0].mesh.faces.len(), 12);
//! assert!(read_entry(&bytes, COLOR_ASSIGNMENT_PATH).is_ok());
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Vertex, VertexColor};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{IoError, IoResult};

/// 3MF core namespace URI.
const NAMESPACE_3MF: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// Archive path of the model entry.
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Archive path of the color assignment document.
pub const COLOR_ASSIGNMENT_PATH: &str = "metadata/color_assignment.json";

/// Archive path of the painting instructions document.
pub const PAINTING_INSTRUCTIONS_PATH: &str = "metadata/painting_instructions.json";

/// Archive path of the per-region metadata records.
pub const REGION_RECORDS_PATH: &str = "metadata/regions.json";

const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
const RELS_PATH: &str = "_rels/.rels";

const CONTENT_TYPES_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
  <Default Extension="json" ContentType="application/json"/>
"#;

const CONTENT_TYPE_STL: &str =
    r#"  <Default Extension="stl" ContentType="application/vnd.ms-pki.stl"/>
"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// A named sub-mesh destined for its own model object.
#[derive(Debug, Clone)]
pub struct NamedMesh<'a> {
    /// Object name shown by slicers.
    pub name: String,
    /// Geometry.
    pub mesh: &'a IndexedMesh,
    /// Display color, written as a base material.
    pub color: Option<VertexColor>,
}

/// Geometry carried by a package.
#[derive(Debug, Clone)]
pub enum ModelGeometry<'a> {
    /// A single mesh serialized as model XML.
    Mesh {
        /// Object name.
        name: String,
        /// Geometry.
        mesh: &'a IndexedMesh,
    },
    /// One object per named sub-mesh, all placed on the build plate.
    Objects(Vec<NamedMesh<'a>>),
    /// Original binary STL bytes embedded verbatim beside a placeholder object.
    StlReference {
        /// Object name; also the attachment stem.
        name: String,
        /// Encoded binary STL.
        stl: &'a [u8],
    },
}

impl<'a> ModelGeometry<'a> {
    /// Single-mesh geometry.
    pub fn mesh(name: impl Into<String>, mesh: &'a IndexedMesh) -> Self {
        Self::Mesh {
            name: name.into(),
            mesh,
        }
    }

    /// Reference geometry embedding encoded STL bytes.
    pub fn stl_reference(name: impl Into<String>, stl: &'a [u8]) -> Self {
        Self::StlReference {
            name: name.into(),
            stl,
        }
    }

    /// Archive path of the embedded STL, if any.
    #[must_use]
    pub fn stl_path(&self) -> Option<String> {
        match self {
            Self::StlReference { name, .. } => Some(format!("3D/{}.stl", entry_stem(name))),
            _ => None,
        }
    }
}

fn entry_stem(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Builder for a 3MF archive.
#[derive(Debug, Clone)]
pub struct ThreeMfPackage<'a> {
    geometry: ModelGeometry<'a>,
    title: Option<String>,
    designer: Option<String>,
    attachments: Vec<(String, Vec<u8>)>,
}

impl<'a> ThreeMfPackage<'a> {
    /// Start a package around the given geometry.
    #[must_use]
    pub const fn new(geometry: ModelGeometry<'a>) -> Self {
        Self {
            geometry,
            title: None,
            designer: None,
            attachments: Vec::new(),
        }
    }

    /// Set the model `Title` metadata.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the model `Designer` metadata.
    #[must_use]
    pub fn with_designer(mut self, designer: impl Into<String>) -> Self {
        self.designer = Some(designer.into());
        self
    }

    /// Attach raw bytes at an archive path.
    #[must_use]
    pub fn with_attachment(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachments.push((path.into(), bytes));
        self
    }

    /// Attach a value serialized as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(
        self,
        path: impl Into<String>,
        value: &T,
    ) -> IoResult<Self> {
        let bytes = serde_json::to_vec_pretty(value)?;
        Ok(self.with_attachment(path, bytes))
    }

    /// Write the archive into a seekable sink.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Zip`] or [`IoError::Io`] on archive failures,
    /// [`IoError::InvalidContent`] if model XML cannot be generated.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> IoResult<W> {
        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut content_types = String::from(CONTENT_TYPES_HEAD);
        if self.geometry.stl_path().is_some() {
            content_types.push_str(CONTENT_TYPE_STL);
        }
        content_types.push_str("</Types>");

        zip.start_file(CONTENT_TYPES_PATH, options)?;
        zip.write_all(content_types.as_bytes())?;

        zip.start_file(RELS_PATH, options)?;
        zip.write_all(RELS_XML.as_bytes())?;

        let model = self.model_xml()?;
        zip.start_file(MODEL_PATH, options)?;
        zip.write_all(&model)?;

        if let (Some(path), ModelGeometry::StlReference { stl, .. }) =
            (self.geometry.stl_path(), &self.geometry)
        {
            zip.start_file(path, options)?;
            zip.write_all(stl)?;
        }

        for (path, bytes) in &self.attachments {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        let writer = zip.finish()?;
        debug!(
            attachments = self.attachments.len(),
            model_bytes = model.len(),
            "wrote 3MF package"
        );
        Ok(writer)
    }

    /// Serialize the archive into memory.
    ///
    /// # Errors
    ///
    /// See [`ThreeMfPackage::write_to`].
    pub fn to_bytes(&self) -> IoResult<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the archive to a file.
    ///
    /// # Errors
    ///
    /// See [`ThreeMfPackage::write_to`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let file = File::create(path)?;
        let mut writer = self.write_to(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    fn model_xml(&self) -> IoResult<Vec<u8>> {
        let mut xml = XmlOut::new();
        xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut model = BytesStart::new("model");
        model.push_attribute(("unit", "millimeter"));
        model.push_attribute(("xml:lang", "en-US"));
        model.push_attribute(("xmlns", NAMESPACE_3MF));
        xml.start(model)?;

        if let Some(title) = &self.title {
            xml.metadata("Title", title)?;
        }
        if let Some(designer) = &self.designer {
            xml.metadata("Designer", designer)?;
        }

        xml.start(BytesStart::new("resources"))?;
        let items = match &self.geometry {
            ModelGeometry::Mesh { name, mesh } => {
                xml.object(1, name, None, Some(mesh))?;
                vec![(1, name.as_str())]
            }
            ModelGeometry::StlReference { name, .. } => {
                xml.object(1, name, None, None)?;
                vec![(1, name.as_str())]
            }
            ModelGeometry::Objects(parts) => xml.objects(parts)?,
        };
        xml.end("resources")?;

        xml.start(BytesStart::new("build"))?;
        for (id, name) in items {
            let id = id.to_string();
            let mut item = BytesStart::new("item");
            item.push_attribute(("objectid", id.as_str()));
            item.push_attribute(("name", name));
            xml.event(Event::Empty(item))?;
        }
        xml.end("build")?;
        xml.end("model")?;

        Ok(xml.into_inner())
    }
}

/// Package geometry with a color assignment document at [`COLOR_ASSIGNMENT_PATH`].
///
/// # Errors
///
/// See [`ThreeMfPackage::write_to`].
pub fn pack<T: Serialize + ?Sized>(geometry: ModelGeometry<'_>, assignment: &T) -> IoResult<Vec<u8>> {
    ThreeMfPackage::new(geometry)
        .with_json(COLOR_ASSIGNMENT_PATH, assignment)?
        .to_bytes()
}

/// Thin wrapper over the quick-xml writer mapping its errors to [`IoError`].
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> IoResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| IoError::invalid_content(format!("failed to write model XML: {e}")))
    }

    fn start(&mut self, element: BytesStart<'_>) -> IoResult<()> {
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> IoResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn metadata(&mut self, name: &str, value: &str) -> IoResult<()> {
        let mut element = BytesStart::new("metadata");
        element.push_attribute(("name", name));
        self.start(element)?;
        self.event(Event::Text(BytesText::new(value)))?;
        self.end("metadata")
    }

    /// Base materials for colored parts, then one object per part.
    fn objects<'n>(&mut self, parts: &'n [NamedMesh<'_>]) -> IoResult<Vec<(usize, &'n str)>> {
        let colored = parts.iter().any(|p| p.color.is_some());
        let first_id = if colored { 2 } else { 1 };

        if colored {
            let mut materials = BytesStart::new("basematerials");
            materials.push_attribute(("id", "1"));
            self.start(materials)?;
            for part in parts {
                let color = part.color.unwrap_or_default();
                let mut base = BytesStart::new("base");
                base.push_attribute(("name", part.name.as_str()));
                base.push_attribute(("displaycolor", format!("#{}", color.to_hex()).as_str()));
                self.event(Event::Empty(base))?;
            }
            self.end("basematerials")?;
        }

        let mut items = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let id = first_id + index;
            let material = colored.then_some(index);
            self.object(id, &part.name, material, Some(part.mesh))?;
            items.push((id, part.name.as_str()));
        }
        Ok(items)
    }

    /// Write an object; `None` geometry produces an empty placeholder mesh.
    fn object(
        &mut self,
        id: usize,
        name: &str,
        material: Option<usize>,
        mesh: Option<&IndexedMesh>,
    ) -> IoResult<()> {
        let id = id.to_string();
        let mut object = BytesStart::new("object");
        object.push_attribute(("id", id.as_str()));
        object.push_attribute(("type", "model"));
        object.push_attribute(("name", name));
        if let Some(pindex) = material {
            object.push_attribute(("pid", "1"));
            object.push_attribute(("pindex", pindex.to_string().as_str()));
        }
        self.start(object)?;
        self.start(BytesStart::new("mesh"))?;

        match mesh {
            Some(mesh) => {
                self.start(BytesStart::new("vertices"))?;
                for v in &mesh.vertices {
                    let mut vertex = BytesStart::new("vertex");
                    vertex.push_attribute(("x", format!("{:.6}", v.position.x).as_str()));
                    vertex.push_attribute(("y", format!("{:.6}", v.position.y).as_str()));
                    vertex.push_attribute(("z", format!("{:.6}", v.position.z).as_str()));
                    self.event(Event::Empty(vertex))?;
                }
                self.end("vertices")?;

                self.start(BytesStart::new("triangles"))?;
                for &[v1, v2, v3] in &mesh.faces {
                    let mut triangle = BytesStart::new("triangle");
                    triangle.push_attribute(("v1", v1.to_string().as_str()));
                    triangle.push_attribute(("v2", v2.to_string().as_str()));
                    triangle.push_attribute(("v3", v3.to_string().as_str()));
                    self.event(Event::Empty(triangle))?;
                }
                self.end("triangles")?;
            }
            None => {
                self.event(Event::Empty(BytesStart::new("vertices")))?;
                self.event(Event::Empty(BytesStart::new("triangles")))?;
            }
        }

        self.end("mesh")?;
        self.end("object")
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// An object read back from a model entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelObject {
    /// Object id.
    pub id: u32,
    /// Object name, if present.
    pub name: Option<String>,
    /// Object geometry (empty for placeholder objects).
    pub mesh: IndexedMesh,
}

fn open_archive(bytes: &[u8]) -> IoResult<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IoError::invalid_content(format!("invalid ZIP archive: {e}")))
}

/// Names of all entries in an archive, in archive order.
///
/// # Errors
///
/// Returns [`IoError::InvalidContent`] if `bytes` is not a ZIP archive.
pub fn entry_names(bytes: &[u8]) -> IoResult<Vec<String>> {
    let archive = open_archive(bytes)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Read one entry from an archive.
///
/// # Errors
///
/// Returns [`IoError::InvalidContent`] if the archive is invalid or the entry is missing.
pub fn read_entry(bytes: &[u8], path: &str) -> IoResult<Vec<u8>> {
    let mut archive = open_archive(bytes)?;
    let mut file = archive
        .by_name(path)
        .map_err(|e| IoError::invalid_content(format!("missing archive entry {path}: {e}")))?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(content)
}

/// Parse every object of the model entry.
///
/// # Errors
///
/// Returns [`IoError::InvalidContent`] if the archive or model XML is malformed.
pub fn read_model(bytes: &[u8]) -> IoResult<Vec<ModelObject>> {
    let content = read_entry(bytes, MODEL_PATH)?;
    let content = std::str::from_utf8(&content)
        .map_err(|e| IoError::invalid_content(format!("model entry is not UTF-8: {e}")))?;
    parse_model(content)
}

/// Load a 3MF file, concatenating all objects into one mesh.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the path does not exist, otherwise see [`read_model`].
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_3mf;
///
/// let mesh = load_3mf("model.3mf").unwrap();
/// println!("Loaded {} vertices, {} faces", mesh.vertices.len(), mesh.faces.len());
/// ```
pub fn load_3mf<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(e, path))?;
    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes)?;

    let mut mesh = IndexedMesh::new();
    for object in read_model(&bytes)? {
        mesh.merge(&object.mesh);
    }
    Ok(mesh)
}

fn parse_model(content: &str) -> IoResult<Vec<ModelObject>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut objects = Vec::new();
    let mut current: Option<ModelObject> = None;
    let mut in_vertices = false;
    let mut in_triangles = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"object" => current = Some(parse_object_element(e)?),
                b"vertices" => in_vertices = current.is_some(),
                b"triangles" => in_triangles = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match (e.local_name().as_ref(), current.as_mut()) {
                (b"object", _) => objects.push(parse_object_element(e)?),
                (b"vertex", Some(object)) if in_vertices => {
                    object.mesh.vertices.push(parse_vertex_element(e)?);
                }
                (b"triangle", Some(object)) if in_triangles => {
                    object.mesh.faces.push(parse_triangle_element(e)?);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"object" => objects.extend(current.take()),
                b"vertices" => in_vertices = false,
                b"triangles" => in_triangles = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::invalid_content(format!(
                    "XML parse error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    for object in &objects {
        if let Some((face, index)) = object.mesh.first_invalid_index() {
            return Err(IoError::InvalidFaceIndex {
                face,
                index,
                vertex_count: object.mesh.vertices.len(),
            });
        }
    }

    Ok(objects)
}

fn attribute<T>(element: &BytesStart<'_>, key: &[u8]) -> IoResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() != key {
            continue;
        }
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| IoError::invalid_content(format!("invalid UTF-8 in attribute: {e}")))?;
        let parsed = value.parse().map_err(|e| {
            IoError::invalid_content(format!(
                "invalid {} attribute {value:?}: {e}",
                String::from_utf8_lossy(key)
            ))
        })?;
        return Ok(Some(parsed));
    }
    Ok(None)
}

fn parse_object_element(element: &BytesStart<'_>) -> IoResult<ModelObject> {
    let id = attribute(element, b"id")?
        .ok_or_else(|| IoError::invalid_content("object element without id"))?;
    let name = element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"name")
        .map(|a| {
            a.unescape_value()
                .map(std::borrow::Cow::into_owned)
                .map_err(|e| IoError::invalid_content(format!("invalid object name: {e}")))
        })
        .transpose()?;
    Ok(ModelObject {
        id,
        name,
        mesh: IndexedMesh::new(),
    })
}

fn parse_vertex_element(element: &BytesStart<'_>) -> IoResult<Vertex> {
    let x = attribute(element, b"x")?.unwrap_or(0.0);
    let y = attribute(element, b"y")?.unwrap_or(0.0);
    let z = attribute(element, b"z")?.unwrap_or(0.0);
    Ok(Vertex::from_coords(x, y, z))
}

fn parse_triangle_element(element: &BytesStart<'_>) -> IoResult<[u32; 3]> {
    let index = |key: &[u8]| -> IoResult<u32> {
        attribute(element, key)?.ok_or_else(|| {
            IoError::invalid_content(format!(
                "triangle without {} attribute",
                String::from_utf8_lossy(key)
            ))
        })
    };
    Ok([index(b"v1")?, index(b"v2")?, index(b"v3")?])
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::unnecessary_raw_string_hashes
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{unit_cube, MeshTopology};

    fn test_triangle() -> IndexedMesh {
        IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2])
    }

    #[test]
    fn mesh_mode_roundtrip() {
        let cube = unit_cube();
        let bytes = ThreeMfPackage::new(ModelGeometry::mesh("cube", &cube))
            .to_bytes()
            .unwrap();

        let objects = read_model(&bytes).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name.as_deref(), Some("cube"));
        assert_eq!(objects[0].mesh.face_count(), 12);
        assert_eq!(objects[0].mesh.faces, cube.faces);
        for (a, b) in cube.vertices.iter().zip(&objects[0].mesh.vertices) {
            assert_relative_eq!(a.position, b.position, epsilon = 1e-5);
        }
    }

    #[test]
    fn required_entries_present() {
        let cube = unit_cube();
        let bytes = pack(ModelGeometry::mesh("cube", &cube), &serde_json::json!({"groups": []}))
            .unwrap();

        let names = entry_names(&bytes).unwrap();
        for required in [CONTENT_TYPES_PATH, RELS_PATH, MODEL_PATH, COLOR_ASSIGNMENT_PATH] {
            assert!(names.iter().any(|n| n == required), "missing {required}");
        }

        let assignment: serde_json::Value =
            serde_json::from_slice(&read_entry(&bytes, COLOR_ASSIGNMENT_PATH).unwrap()).unwrap();
        assert_eq!(assignment["groups"], serde_json::json!([]));
    }

    #[test]
    fn stl_reference_embeds_bytes_verbatim() {
        let stl = crate::encode(&test_triangle(), "ref").unwrap();
        let geometry = ModelGeometry::stl_reference("armor", &stl);
        assert_eq!(geometry.stl_path().as_deref(), Some("3D/armor.stl"));

        let bytes = ThreeMfPackage::new(geometry).to_bytes().unwrap();
        assert_eq!(read_entry(&bytes, "3D/armor.stl").unwrap(), stl);

        let content_types = read_entry(&bytes, CONTENT_TYPES_PATH).unwrap();
        assert!(String::from_utf8(content_types).unwrap().contains("Extension=\"stl\""));

        // Placeholder object is buildable but empty
        let objects = read_model(&bytes).unwrap();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].mesh.faces.is_empty());
    }

    #[test]
    fn objects_mode_writes_colored_parts() {
        let cube = unit_cube();
        let tri = test_triangle();
        let parts = vec![
            NamedMesh {
                name: "helmet".into(),
                mesh: &cube,
                color: Some(VertexColor::new(0x40, 0x40, 0x40)),
            },
            NamedMesh {
                name: "accent".into(),
                mesh: &tri,
                color: Some(VertexColor::new(0xFF, 0xD7, 0x00)),
            },
        ];
        let bytes = ThreeMfPackage::new(ModelGeometry::Objects(parts))
            .with_title("armor")
            .with_designer("paint shop")
            .to_bytes()
            .unwrap();

        let model = String::from_utf8(read_entry(&bytes, MODEL_PATH).unwrap()).unwrap();
        assert!(model.contains("displaycolor=\"#FFD700\""));
        assert!(model.contains("pindex=\"1\""));
        assert!(model.contains("<metadata name=\"Title\">armor</metadata>"));
        assert!(model.contains("<metadata name=\"Designer\">paint shop</metadata>"));

        let objects = read_model(&bytes).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id, 2);
        assert_eq!(objects[1].name.as_deref(), Some("accent"));
        assert_eq!(objects[1].mesh.face_count(), 1);
    }

    #[test]
    fn parse_minimal_model() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/>
          <vertex x="1" y="0" z="0"/>
          <vertex x="0" y="1" z="0"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="1" v3="2"/>
        </triangles>
      </mesh>
    </object>
  </resources>
</model>"#;

        let objects = parse_model(xml).unwrap();
        assert_eq!(objects[0].mesh.vertex_count(), 3);
        assert_eq!(objects[0].mesh.face_count(), 1);
    }

    #[test]
    fn parse_rejects_out_of_range_triangle() {
        let xml = r#"<model><resources><object id="1"><mesh>
            <vertices><vertex x="0" y="0" z="0"/></vertices>
            <triangles><triangle v1="0" v2="0" v3="5"/></triangles>
        </mesh></object></resources></model>"#;
        assert!(matches!(
            parse_model(xml),
            Err(IoError::InvalidFaceIndex { index: 5, .. })
        ));
    }

    #[test]
    fn missing_entry_is_invalid_content() {
        let cube = unit_cube();
        let bytes = ThreeMfPackage::new(ModelGeometry::mesh("cube", &cube))
            .to_bytes()
            .unwrap();
        let err = read_entry(&bytes, "metadata/nope.json").unwrap_err();
        assert!(matches!(err, IoError::InvalidContent { .. }));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.3mf");
        let cube = unit_cube();
        ThreeMfPackage::new(ModelGeometry::mesh("cube", &cube))
            .save(&path)
            .unwrap();

        let loaded = load_3mf(&path).unwrap();
        assert_eq!(loaded.face_count(), 12);
        assert_eq!(loaded.vertex_count(), 8);
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_3mf("nonexistent_file_12345.3mf");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }
}
