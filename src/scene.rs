//! Minimal glTF 2.0 scene documents: one textured quad.
//!
//! The quad is a placeholder, not a reconstruction. It shows the first
//! capture on a flat 2x2 card so a viewer always has something to render.

use base64::Engine;
use serde::{Deserialize, Serialize};

pub const COMPONENT_FLOAT: u32 = 5126;
pub const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
pub const TARGET_ARRAY_BUFFER: u32 = 34962;
pub const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

const POSITIONS: [f32; 12] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0];
// v is flipped: image row 0 (top) lands on the upper edge of the quad.
const UVS: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const POSITIONS_LEN: usize = POSITIONS.len() * 4;
const UVS_LEN: usize = UVS.len() * 4;
const INDICES_LEN: usize = INDICES.len() * 2;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Where the quad's texture comes from.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// A file served next to the document, referenced by relative name.
    Reference(&'a str),
    /// Raw image bytes, inlined as a data URI.
    Embedded(&'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub asset: Asset,
    pub scene: u32,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub nodes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub mesh: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub attributes: Attributes,
    pub indices: u32,
    pub material: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(rename = "POSITION")]
    pub position: u32,
    #[serde(rename = "TEXCOORD_0")]
    pub texcoord_0: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    pub double_sided: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub base_color_texture: TextureRef,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub source: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub uri: String,
    pub byte_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: u32,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub target: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: u32,
    pub byte_offset: usize,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f32>>,
}

impl SceneDocument {
    pub fn vertex_count(&self) -> usize {
        self.accessor_for(|p| p.attributes.position).map_or(0, |a| a.count)
    }

    pub fn triangle_count(&self) -> usize {
        self.accessor_for(|p| p.indices).map_or(0, |a| a.count / 3)
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn accessor_for(&self, pick: impl Fn(&Primitive) -> u32) -> Option<&Accessor> {
        let primitive = self.meshes.first()?.primitives.first()?;
        self.accessors.get(pick(primitive) as usize)
    }
}

/// Positions, UVs and indices packed back to back, little endian.
pub fn quad_geometry() -> Vec<u8> {
    let mut blob = Vec::with_capacity(POSITIONS_LEN + UVS_LEN + INDICES_LEN);
    blob.extend(POSITIONS.iter().flat_map(|v| v.to_le_bytes()));
    blob.extend(UVS.iter().flat_map(|v| v.to_le_bytes()));
    blob.extend(INDICES.iter().flat_map(|i| i.to_le_bytes()));
    blob
}

/// Builds the quad document for `image`.
pub fn build(image: ImageSource<'_>) -> SceneDocument {
    let engine = base64::engine::general_purpose::STANDARD;
    let geometry = quad_geometry();
    let image_uri = match image {
        ImageSource::Reference(name) => name.to_string(),
        ImageSource::Embedded(bytes) => image_data_uri(bytes),
    };

    SceneDocument {
        asset: Asset { version: "2.0".to_string(), generator: Some(generator()) },
        scene: 0,
        scenes: vec![Scene { nodes: vec![0] }],
        nodes: vec![Node { mesh: 0 }],
        meshes: vec![Mesh {
            primitives: vec![Primitive {
                attributes: Attributes { position: 0, texcoord_0: 1 },
                indices: 2,
                material: 0,
            }],
        }],
        materials: vec![Material {
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_texture: TextureRef { index: 0 },
                metallic_factor: 0.0,
                roughness_factor: 1.0,
            },
            double_sided: true,
        }],
        textures: vec![Texture { source: 0 }],
        images: vec![Image { uri: image_uri }],
        buffers: vec![Buffer {
            uri: format!("data:application/octet-stream;base64,{}", engine.encode(&geometry)),
            byte_length: geometry.len(),
        }],
        buffer_views: vec![
            BufferView { buffer: 0, byte_offset: 0, byte_length: POSITIONS_LEN, target: TARGET_ARRAY_BUFFER },
            BufferView {
                buffer: 0,
                byte_offset: POSITIONS_LEN,
                byte_length: UVS_LEN,
                target: TARGET_ARRAY_BUFFER,
            },
            BufferView {
                buffer: 0,
                byte_offset: POSITIONS_LEN + UVS_LEN,
                byte_length: INDICES_LEN,
                target: TARGET_ELEMENT_ARRAY_BUFFER,
            },
        ],
        accessors: vec![
            Accessor {
                buffer_view: 0,
                byte_offset: 0,
                component_type: COMPONENT_FLOAT,
                count: POSITIONS.len() / 3,
                kind: "VEC3".to_string(),
                min: Some(vec![-1.0, -1.0, 0.0]),
                max: Some(vec![1.0, 1.0, 0.0]),
            },
            Accessor {
                buffer_view: 1,
                byte_offset: 0,
                component_type: COMPONENT_FLOAT,
                count: UVS.len() / 2,
                kind: "VEC2".to_string(),
                min: None,
                max: None,
            },
            Accessor {
                buffer_view: 2,
                byte_offset: 0,
                component_type: COMPONENT_UNSIGNED_SHORT,
                count: INDICES.len(),
                kind: "SCALAR".to_string(),
                min: None,
                max: None,
            },
        ],
    }
}

/// `data:` URI for an image, typed from its signature (PNG or JPEG).
pub fn image_data_uri(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", image_mime(bytes), encoded)
}

fn image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PNG_SIGNATURE) {
        "image/png"
    } else {
        "image/jpeg"
    }
}

fn generator() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
