// crates/lyt-core/src/pane.rs
use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};

use crate::archive::reader::{ByteReader, PutLe};
use crate::{Matrix34, NameRef, Result};

/// Type tag stored in the first two bytes of every pane record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PaneType {
    Null = 0,
    Type1 = 1,
    Rect = 2,
    Text = 3,
    Pane = 4,
    PaneEx = 5,
    Pane2 = 6,
    Pane2Ex = 7,
}

impl TryFrom<u16> for PaneType {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, u16> {
        match value {
            0 => Ok(PaneType::Null),
            1 => Ok(PaneType::Type1),
            2 => Ok(PaneType::Rect),
            3 => Ok(PaneType::Text),
            4 => Ok(PaneType::Pane),
            5 => Ok(PaneType::PaneEx),
            6 => Ok(PaneType::Pane2),
            7 => Ok(PaneType::Pane2Ex),
            other => Err(other),
        }
    }
}

impl PaneType {
    /// Size of the common record header (tag, declared size, name, reserved slot).
    pub const HEADER_SIZE: usize = 0xC;

    /// Full record size including the header, or `None` for kinds without a known layout.
    pub fn record_size(self) -> Option<usize> {
        match self {
            PaneType::Null => Some(0x18),
            PaneType::Type1 => Some(0x1C),
            PaneType::Rect => Some(0x20),
            PaneType::Text => Some(0x30C),
            PaneType::PaneEx => Some(0x7C),
            PaneType::Pane | PaneType::Pane2 | PaneType::Pane2Ex => None,
        }
    }
}

pub const TEXT_PAYLOAD_SIZE: usize = 0x300;

/// Arguments of an extended pane. 0x68 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneExArg {
    pub translate: Vec3,
    pub width: f32,
    pub height: f32,
    /// Degrees around X and Y.
    pub rotate: Vec2,
    pub scale: Vec2,
    pub a: u16,
    pub b: u16,
    /// Corner colors: top-left, top-right, bottom-left, bottom-right.
    pub colors: [Vec4; 4],
}

impl Default for PaneExArg {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            width: 0.0,
            height: 0.0,
            rotate: Vec2::ZERO,
            scale: Vec2::ONE,
            a: 0,
            b: 0,
            colors: [Vec4::ONE; 4],
        }
    }
}

/// Per-kind pane payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PaneData {
    Null {
        translate: Vec3,
    },
    Type1 {
        translate: Vec3,
        z_multiplier: f32,
    },
    Rect {
        translate: Vec3,
        width: f32,
        height: f32,
    },
    /// Opaque text-rendering state consumed by the font renderer.
    Text {
        payload: Box<[u8; TEXT_PAYLOAD_SIZE]>,
    },
    Ex {
        enable_translate: bool,
        arg: PaneExArg,
    },
}

impl PaneData {
    pub fn pane_type(&self) -> PaneType {
        match self {
            PaneData::Null { .. } => PaneType::Null,
            PaneData::Type1 { .. } => PaneType::Type1,
            PaneData::Rect { .. } => PaneType::Rect,
            PaneData::Text { .. } => PaneType::Text,
            PaneData::Ex { .. } => PaneType::PaneEx,
        }
    }

    /// Decode the payload that follows the record header.
    ///
    /// Callers check the tag and declared size first; tags without a
    /// layout never reach this point.
    pub(crate) fn read(pane_type: PaneType, reader: &mut ByteReader<'_>) -> Result<Option<Self>> {
        let data = match pane_type {
            PaneType::Null => PaneData::Null {
                translate: reader.read_vec3()?,
            },
            PaneType::Type1 => PaneData::Type1 {
                translate: reader.read_vec3()?,
                z_multiplier: reader.read_f32()?,
            },
            PaneType::Rect => PaneData::Rect {
                translate: reader.read_vec3()?,
                width: reader.read_f32()?,
                height: reader.read_f32()?,
            },
            PaneType::Text => {
                let mut payload = Box::new([0u8; TEXT_PAYLOAD_SIZE]);
                payload.copy_from_slice(reader.bytes(TEXT_PAYLOAD_SIZE)?);
                PaneData::Text { payload }
            }
            PaneType::PaneEx => {
                let enable_translate = reader.read_u8()? != 0;
                // Padding plus a runtime pointer slot.
                reader.skip(3 + 4)?;
                let arg = PaneExArg {
                    translate: reader.read_vec3()?,
                    width: reader.read_f32()?,
                    height: reader.read_f32()?,
                    rotate: reader.read_vec2()?,
                    scale: reader.read_vec2()?,
                    a: reader.read_u16()?,
                    b: reader.read_u16()?,
                    colors: [
                        reader.read_vec4()?,
                        reader.read_vec4()?,
                        reader.read_vec4()?,
                        reader.read_vec4()?,
                    ],
                };
                PaneData::Ex { enable_translate, arg }
            }
            PaneType::Pane | PaneType::Pane2 | PaneType::Pane2Ex => return Ok(None),
        };
        Ok(Some(data))
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        match self {
            PaneData::Null { translate } => out.put_vec3(*translate),
            PaneData::Type1 { translate, z_multiplier } => {
                out.put_vec3(*translate);
                out.put_f32(*z_multiplier);
            }
            PaneData::Rect { translate, width, height } => {
                out.put_vec3(*translate);
                out.put_f32(*width);
                out.put_f32(*height);
            }
            PaneData::Text { payload } => out.extend_from_slice(&payload[..]),
            PaneData::Ex { enable_translate, arg } => {
                out.put_u8(*enable_translate as u8);
                out.extend_from_slice(&[0; 3 + 4]);
                out.put_vec3(arg.translate);
                out.put_f32(arg.width);
                out.put_f32(arg.height);
                out.put_vec2(arg.rotate);
                out.put_vec2(arg.scale);
                out.put_u16(arg.a);
                out.put_u16(arg.b);
                for color in arg.colors {
                    out.put_vec4(color);
                }
            }
        }
    }
}

/// A decoded visual primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub name: NameRef,
    pub data: PaneData,
}

impl Pane {
    pub fn pane_type(&self) -> PaneType {
        self.data.pane_type()
    }

    /// Offset the pane applies on top of its widget's world matrix.
    pub fn local_matrix(&self) -> Matrix34 {
        match &self.data {
            PaneData::Null { translate } | PaneData::Rect { translate, .. } => {
                Matrix34::from_translation(*translate)
            }
            PaneData::Type1 { translate, z_multiplier } => {
                Matrix34::from_translation(Vec3::new(translate.x, translate.y, translate.z * z_multiplier))
            }
            PaneData::Text { .. } => Matrix34::IDENTITY,
            PaneData::Ex { enable_translate, arg } => {
                let rotation = Quat::from_euler(
                    EulerRot::XYZ,
                    arg.rotate.x.to_radians(),
                    arg.rotate.y.to_radians(),
                    0.0,
                );
                let translate = if *enable_translate { arg.translate } else { Vec3::ZERO };
                Matrix34::from_scale_rotation_translation(arg.scale.extend(1.0), rotation, translate)
            }
        }
    }

    /// Width and height for kinds that carry a size.
    pub fn size(&self) -> Option<Vec2> {
        match &self.data {
            PaneData::Rect { width, height, .. } => Some(Vec2::new(*width, *height)),
            PaneData::Ex { arg, .. } => Some(Vec2::new(arg.width, arg.height)),
            _ => None,
        }
    }
}
