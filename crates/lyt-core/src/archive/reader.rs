// crates/lyt-core/src/archive/reader.rs
use glam::{Vec2, Vec3, Vec4};

use crate::{ArchiveError, Result};

/// Bounds-checked little-endian cursor over archive bytes.
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
    what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0, what: "record" }
    }

    /// Cursor positioned at `offset`, reporting `what` when it runs out of bytes.
    pub fn at(data: &'a [u8], offset: usize, what: &'static str) -> Self {
        Self { data, position: offset, what }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.bytes(count).map(|_| ())
    }

    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(ArchiveError::OutOfBounds {
                what: self.what,
                offset: self.position,
                len: self.data.len(),
            })?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }
}

/// Little-endian writers mirroring [`ByteReader`].
pub trait PutLe {
    fn put_u8(&mut self, value: u8);
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
    fn put_f32(&mut self, value: f32);

    fn put_vec2(&mut self, value: Vec2) {
        value.to_array().into_iter().for_each(|v| self.put_f32(v));
    }

    fn put_vec3(&mut self, value: Vec3) {
        value.to_array().into_iter().for_each(|v| self.put_f32(v));
    }

    fn put_vec4(&mut self, value: Vec4) {
        value.to_array().into_iter().for_each(|v| self.put_f32(v));
    }
}

impl PutLe for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f32(&mut self, value: f32) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}
