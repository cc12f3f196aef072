// crates/lyt-core/src/widget_pos.rs
use glam::{Vec2, Vec3, Vec4};

use crate::archive::reader::{ByteReader, PutLe};
use crate::Result;

bitflags::bitflags! {
    /// Per-axis flag word shared by [`WidgetPos::touched`] and [`WidgetPos::at_default`].
    ///
    /// In `touched`, `VISIBLE` holds the current visibility rather than a
    /// "was written" marker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PosFlags: u32 {
        const VISIBLE = 0x1;

        const TRANSLATE_X = 0x100;
        const TRANSLATE_Y = 0x200;
        const TRANSLATE_Z = 0x400;

        const SCALE_X = 0x800;
        const SCALE_Y = 0x1000;
        const SCALE_Z = 0x2000;

        const ROTATE_X = 0x4000;
        const ROTATE_Y = 0x8000;
        const ROTATE_Z = 0x10000;

        const VISIBILITY = 0x20000;

        const OPACITY = 0x4000000;

        const TRANSLATE = Self::TRANSLATE_X.bits() | Self::TRANSLATE_Y.bits() | Self::TRANSLATE_Z.bits();
        const SCALE = Self::SCALE_X.bits() | Self::SCALE_Y.bits() | Self::SCALE_Z.bits();
        const ROTATE = Self::ROTATE_X.bits() | Self::ROTATE_Y.bits() | Self::ROTATE_Z.bits();
        const TRACKED = Self::TRANSLATE.bits()
            | Self::SCALE.bits()
            | Self::ROTATE.bits()
            | Self::VISIBILITY.bits()
            | Self::OPACITY.bits();
    }
}

/// Transform, color and visibility state of a single widget.
///
/// Every setter keeps `touched` and `at_default` in lockstep: writing an
/// axis marks it touched and records whether the new value equals the
/// axis default (translate 0, scale 1, rotate 0, opacity 1, visible).
/// Consumers such as animation blending read `at_default` to skip axes
/// that are provably untouched by the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetPos {
    pub translate: Vec3,
    pub scale: Vec3,
    /// Euler angles in degrees.
    pub rotate: Vec3,
    pub aux0: Vec2,
    pub aux1: Vec2,
    pub aux_scalar: f32,
    /// RGB tint with opacity in `w`.
    pub color: Vec4,
    pub touched: PosFlags,
    pub at_default: PosFlags,
}

impl WidgetPos {
    /// Size of the serialized block inside a widget record.
    pub const SIZE: usize = 0x50;

    pub fn is_visible(&self) -> bool {
        self.touched.contains(PosFlags::VISIBLE)
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.is_visible() == visible {
            return;
        }
        self.touched.set(PosFlags::VISIBLE, visible);
        self.value_changed(PosFlags::VISIBILITY, visible);
    }

    pub fn opacity(&self) -> f32 {
        self.color.w
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if self.color.w == opacity {
            return;
        }
        self.color.w = opacity;
        self.value_changed(PosFlags::OPACITY, opacity == 1.0);
    }

    /// Re-derive the translate flags after `translate` was written directly.
    pub fn translate_changed(&mut self) {
        self.value_changed(PosFlags::TRANSLATE_X, self.translate.x == 0.0);
        self.value_changed(PosFlags::TRANSLATE_Y, self.translate.y == 0.0);
        self.value_changed(PosFlags::TRANSLATE_Z, self.translate.z == 0.0);
    }

    /// Re-derive the scale flags after `scale` was written directly.
    pub fn scale_changed(&mut self) {
        self.value_changed(PosFlags::SCALE_X, self.scale.x == 1.0);
        self.value_changed(PosFlags::SCALE_Y, self.scale.y == 1.0);
        self.value_changed(PosFlags::SCALE_Z, self.scale.z == 1.0);
    }

    /// Re-derive the rotate flags after `rotate` was written directly.
    pub fn rotate_changed(&mut self) {
        self.value_changed(PosFlags::ROTATE_X, self.rotate.x == 0.0);
        self.value_changed(PosFlags::ROTATE_Y, self.rotate.y == 0.0);
        self.value_changed(PosFlags::ROTATE_Z, self.rotate.z == 0.0);
    }

    pub fn set_translate(&mut self, translate: Vec3) {
        self.translate = translate;
        self.translate_changed();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.scale_changed();
    }

    pub fn set_rotate(&mut self, rotate: Vec3) {
        self.rotate = rotate;
        self.rotate_changed();
    }

    /// True when every tracked axis is flagged as sitting at its default.
    pub fn is_at_default(&self) -> bool {
        self.at_default.contains(PosFlags::TRACKED)
    }

    fn value_changed(&mut self, flag: PosFlags, is_default: bool) {
        self.touched.insert(flag);
        self.at_default.set(flag, is_default);
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            translate: reader.read_vec3()?,
            scale: reader.read_vec3()?,
            rotate: reader.read_vec3()?,
            aux0: reader.read_vec2()?,
            aux1: reader.read_vec2()?,
            aux_scalar: reader.read_f32()?,
            color: reader.read_vec4()?,
            touched: PosFlags::from_bits_retain(reader.read_u32()?),
            at_default: PosFlags::from_bits_retain(reader.read_u32()?),
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.put_vec3(self.translate);
        out.put_vec3(self.scale);
        out.put_vec3(self.rotate);
        out.put_vec2(self.aux0);
        out.put_vec2(self.aux1);
        out.put_f32(self.aux_scalar);
        out.put_vec4(self.color);
        out.put_u32(self.touched.bits());
        out.put_u32(self.at_default.bits());
    }
}

impl Default for WidgetPos {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
            aux0: Vec2::ZERO,
            aux1: Vec2::ZERO,
            aux_scalar: 0.0,
            color: Vec4::ONE,
            touched: PosFlags::VISIBLE,
            at_default: PosFlags::TRACKED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_invariant(pos: &WidgetPos) {
        let t = pos.translate;
        let s = pos.scale;
        let r = pos.rotate;
        let expected = [
            (PosFlags::TRANSLATE_X, t.x == 0.0),
            (PosFlags::TRANSLATE_Y, t.y == 0.0),
            (PosFlags::TRANSLATE_Z, t.z == 0.0),
            (PosFlags::SCALE_X, s.x == 1.0),
            (PosFlags::SCALE_Y, s.y == 1.0),
            (PosFlags::SCALE_Z, s.z == 1.0),
            (PosFlags::ROTATE_X, r.x == 0.0),
            (PosFlags::ROTATE_Y, r.y == 0.0),
            (PosFlags::ROTATE_Z, r.z == 0.0),
            (PosFlags::OPACITY, pos.opacity() == 1.0),
            (PosFlags::VISIBILITY, pos.is_visible()),
        ];
        for (flag, is_default) in expected {
            assert_eq!(pos.at_default.contains(flag), is_default, "flag {:?} in {:?}", flag, pos);
        }
    }

    #[test]
    fn test_default_is_fully_at_default() {
        let pos = WidgetPos::default();
        assert!(pos.is_visible());
        assert!(pos.is_at_default());
        assert_eq!(pos.touched, PosFlags::VISIBLE);
        check_invariant(&pos);
    }

    #[test]
    fn test_set_visible_is_noop_when_unchanged() {
        let mut pos = WidgetPos::default();
        pos.set_visible(true);
        assert_eq!(pos, WidgetPos::default());
    }

    #[test]
    fn test_set_visible_tracks_default() {
        let mut pos = WidgetPos::default();

        pos.set_visible(false);
        assert!(!pos.is_visible());
        assert!(pos.touched.contains(PosFlags::VISIBILITY));
        assert!(!pos.at_default.contains(PosFlags::VISIBILITY));

        pos.set_visible(true);
        assert!(pos.is_visible());
        assert!(pos.touched.contains(PosFlags::VISIBILITY));
        assert!(pos.at_default.contains(PosFlags::VISIBILITY));
    }

    #[test]
    fn test_set_opacity() {
        let mut pos = WidgetPos::default();
        pos.set_opacity(1.0);
        assert!(!pos.touched.contains(PosFlags::OPACITY));

        pos.set_opacity(0.25);
        assert_eq!(pos.opacity(), 0.25);
        assert!(pos.touched.contains(PosFlags::OPACITY));
        assert!(!pos.at_default.contains(PosFlags::OPACITY));

        pos.set_opacity(1.0);
        assert!(pos.at_default.contains(PosFlags::OPACITY));
    }

    #[test]
    fn test_nan_opacity_is_never_default() {
        let mut pos = WidgetPos::default();
        pos.set_opacity(f32::NAN);
        assert!(pos.opacity().is_nan());
        assert!(!pos.at_default.contains(PosFlags::OPACITY));
    }

    #[test]
    fn test_translate_changed_per_axis() {
        let mut pos = WidgetPos::default();
        pos.translate = Vec3::new(0.0, 4.0, 0.0);
        pos.translate_changed();

        assert!(pos.touched.contains(PosFlags::TRANSLATE));
        assert!(pos.at_default.contains(PosFlags::TRANSLATE_X));
        assert!(!pos.at_default.contains(PosFlags::TRANSLATE_Y));
        assert!(pos.at_default.contains(PosFlags::TRANSLATE_Z));
        assert!(!pos.is_at_default());
    }

    #[test]
    fn test_scale_changed_per_axis() {
        let mut pos = WidgetPos::default();
        pos.scale = Vec3::new(2.0, 1.0, 0.0);
        pos.scale_changed();

        assert!(!pos.at_default.contains(PosFlags::SCALE_X));
        assert!(pos.at_default.contains(PosFlags::SCALE_Y));
        assert!(!pos.at_default.contains(PosFlags::SCALE_Z));
    }

    #[test]
    fn test_flags_follow_every_setter_sequence() {
        let opacities = [1.0, 0.5, 0.0, 1.0];
        let translates = [Vec3::ZERO, Vec3::X, Vec3::new(-0.0, 3.0, 0.0), Vec3::ZERO];
        let scales = [Vec3::ONE, Vec3::splat(2.0), Vec3::new(1.0, 0.5, 1.0)];

        let mut pos = WidgetPos::default();
        for (step, &opacity) in opacities.iter().enumerate() {
            for (i, &translate) in translates.iter().enumerate() {
                pos.set_visible((step + i) % 2 == 0);
                pos.set_opacity(opacity);
                pos.translate = translate;
                pos.translate_changed();
                pos.set_scale(scales[(step + i) % scales.len()]);
                pos.set_rotate(Vec3::new(0.0, 0.0, (i * 90) as f32));
                check_invariant(&pos);
            }
        }
    }

    #[test]
    fn test_block_round_trips_through_bytes() {
        let mut pos = WidgetPos::default();
        pos.set_translate(Vec3::new(1.0, -2.0, 3.5));
        pos.set_opacity(0.5);
        pos.aux_scalar = 7.0;

        let mut bytes = Vec::new();
        pos.write(&mut bytes);
        assert_eq!(bytes.len(), WidgetPos::SIZE);

        let mut reader = ByteReader::new(&bytes);
        let decoded = WidgetPos::read(&mut reader).unwrap();
        assert_eq!(decoded, pos);
    }
}
