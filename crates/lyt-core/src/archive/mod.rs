// crates/lyt-core/src/archive/mod.rs
//! Binary layout archive decoding.
//!
//! An archive is a 0x20-byte header followed by a pane table, a widget
//! table and a string table. Pane records are packed back to back and
//! their size is fixed by their type tag. Widget records are 0x13C-byte
//! node images whose children occupy a contiguous range of the widget
//! table.

pub mod builder;
pub mod reader;

pub use builder::*;

use std::collections::HashMap;
use std::path::Path;

use glam::Vec4;
use tracing::debug;

use crate::strings::read_name;
use crate::{
    ArchiveError, Pane, PaneData, PaneId, PaneType, Result, StringTable, Widget, WidgetId,
    WidgetPos, WidgetType,
};
use reader::{ByteReader, PutLe};

pub const MAGIC: [u8; 4] = *b"LYT1";
pub const VERSION: u16 = 1;

/// Index value meaning "none" for parent and pane references.
pub const NONE_INDEX: u32 = u32::MAX;
pub const NO_MAIN_WIDGET: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub widget_count: u32,
    pub pane_count: u32,
    pub pane_table_offset: u32,
    pub widget_table_offset: u32,
    pub string_table_offset: u32,
    pub string_table_size: u32,
}

impl ArchiveHeader {
    pub const SIZE: usize = 0x20;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(reader.bytes(4)?);
        Ok(Self {
            magic,
            version: reader.read_u16()?,
            flags: reader.read_u16()?,
            widget_count: reader.read_u32()?,
            pane_count: reader.read_u32()?,
            pane_table_offset: reader.read_u32()?,
            widget_table_offset: reader.read_u32()?,
            string_table_offset: reader.read_u32()?,
            string_table_size: reader.read_u32()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.magic);
        out.put_u16(self.version);
        out.put_u16(self.flags);
        out.put_u32(self.widget_count);
        out.put_u32(self.pane_count);
        out.put_u32(self.pane_table_offset);
        out.put_u32(self.widget_table_offset);
        out.put_u32(self.string_table_offset);
        out.put_u32(self.string_table_size);
    }
}

/// One serialized widget node, before its links are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRecord {
    pub parent: u32,
    pub name: u32,
    pub first_child: u32,
    pub child_count: u32,
    pub main_widget: u16,
    pub widget_type: u16,
    pub pane: u32,
    pub pane_vec: Vec4,
    pub pos: WidgetPos,
    pub old_pos: WidgetPos,
}

impl WidgetRecord {
    pub const SIZE: usize = 0x13C;

    // Bytes 0xDC..0x13C hold runtime caches (flags, matrices, color).
    const CACHE_SIZE: usize = Self::SIZE - 0xDC;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        // Pointer slots of the node image.
        reader.skip(0xC)?;
        let parent = reader.read_u32()?;
        let name = reader.read_u32()?;
        let first_child = reader.read_u32()?;
        let child_count = reader.read_u32()?;
        reader.skip(8)?;
        let main_widget = reader.read_u16()?;
        let widget_type = reader.read_u16()?;
        let pane = reader.read_u32()?;
        let pane_vec = reader.read_vec4()?;
        let pos = WidgetPos::read(reader)?;
        let old_pos = WidgetPos::read(reader)?;
        reader.skip(Self::CACHE_SIZE)?;
        Ok(Self {
            parent,
            name,
            first_child,
            child_count,
            main_widget,
            widget_type,
            pane,
            pane_vec,
            pos,
            old_pos,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[0; 0xC]);
        out.put_u32(self.parent);
        out.put_u32(self.name);
        out.put_u32(self.first_child);
        out.put_u32(self.child_count);
        out.extend_from_slice(&[0; 8]);
        out.put_u16(self.main_widget);
        out.put_u16(self.widget_type);
        out.put_u32(self.pane);
        out.put_vec4(self.pane_vec);
        self.pos.write(out);
        self.old_pos.write(out);
        out.extend_from_slice(&[0; Self::CACHE_SIZE]);
    }
}

/// Fully linked contents of one archive: the arena a layout is built from.
#[derive(Debug, Clone)]
pub struct LayoutArchive {
    pub header: ArchiveHeader,
    pub strings: StringTable,
    pub widgets: Vec<Widget>,
    pub panes: Vec<Pane>,
    pub root: WidgetId,
}

pub struct ArchiveParser<'a> {
    data: &'a [u8],
}

impl<'a> ArchiveParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Decode and link the whole archive. Nothing is returned unless every
    /// record and the tree shape are valid.
    pub fn parse(&self) -> Result<LayoutArchive> {
        if self.data.len() < ArchiveHeader::SIZE {
            return Err(ArchiveError::TooSmall(self.data.len()));
        }

        let header = ArchiveHeader::read(&mut ByteReader::new(self.data))?;
        if header.magic != MAGIC {
            return Err(ArchiveError::BadMagic(header.magic));
        }
        if header.version > VERSION {
            return Err(ArchiveError::UnsupportedVersion(header.version));
        }

        let raw_strings = ByteReader::at(self.data, header.string_table_offset as usize, "string table")
            .bytes(header.string_table_size as usize)?;
        let mut names = NameInterner::new(raw_strings);

        let panes = self.parse_pane_table(&header, &mut names)?;
        let records = self.parse_widget_table(&header)?;
        let root = check_tree(&records, panes.len())?;

        let mut widgets = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let widget_type = WidgetType::try_from(record.widget_type)
                .map_err(|ty| ArchiveError::UnknownWidgetType { index, ty })?;
            let mut widget = Widget::new(names.get(record.name)?, widget_type);
            widget.pane_vec = record.pane_vec;
            widget.pos = record.pos;
            widget.old_pos = record.old_pos;
            widget.set_parent((record.parent != NONE_INDEX).then_some(WidgetId(record.parent)));
            for child in record.first_child..record.first_child + record.child_count {
                widget.push_child(WidgetId(child));
            }
            widget.set_pane((record.pane != NONE_INDEX).then_some(PaneId(record.pane)));
            widget.set_main_widget((record.main_widget != NO_MAIN_WIDGET).then_some(record.main_widget));
            widgets.push(widget);
        }

        debug!(
            "Decoded layout archive: {} widgets, {} panes, {} name bytes",
            widgets.len(),
            panes.len(),
            names.table.byte_len()
        );

        Ok(LayoutArchive {
            header,
            strings: names.table,
            widgets,
            panes,
            root,
        })
    }

    fn parse_pane_table(&self, header: &ArchiveHeader, names: &mut NameInterner<'_>) -> Result<Vec<Pane>> {
        let mut reader = ByteReader::at(self.data, header.pane_table_offset as usize, "pane record");
        let count = header.pane_count as usize;
        let mut panes = Vec::with_capacity(count.min(self.data.len() / 0x18));

        for index in 0..count {
            let tag = reader.read_u16()?;
            let declared = reader.read_u16()? as usize;
            let name = reader.read_u32()?;
            reader.skip(4)?;

            let pane_type = PaneType::try_from(tag)
                .map_err(|tag| ArchiveError::UnknownPaneType { index, tag })?;
            let expected = pane_type
                .record_size()
                .ok_or(ArchiveError::UnsupportedPaneType { index, pane_type })?;
            if declared != expected {
                return Err(ArchiveError::PaneSizeMismatch {
                    index,
                    pane_type,
                    declared,
                    expected,
                });
            }

            let data = PaneData::read(pane_type, &mut reader)?
                .ok_or(ArchiveError::UnsupportedPaneType { index, pane_type })?;
            debug!("Pane {}: {:?}, 0x{:X} bytes", index, pane_type, declared);
            panes.push(Pane {
                name: names.get(name)?,
                data,
            });
        }

        Ok(panes)
    }

    fn parse_widget_table(&self, header: &ArchiveHeader) -> Result<Vec<WidgetRecord>> {
        let mut reader = ByteReader::at(self.data, header.widget_table_offset as usize, "widget record");
        let count = header.widget_count as usize;
        let mut records = Vec::with_capacity(count.min(self.data.len() / WidgetRecord::SIZE));
        for _ in 0..count {
            records.push(WidgetRecord::read(&mut reader)?);
        }
        Ok(records)
    }
}

/// Copies each distinct archive name into the layout's string arena once.
struct NameInterner<'a> {
    raw: &'a [u8],
    table: StringTable,
    seen: HashMap<u32, crate::NameRef>,
}

impl<'a> NameInterner<'a> {
    fn new(raw: &'a [u8]) -> Self {
        Self {
            raw,
            table: StringTable::new(),
            seen: HashMap::new(),
        }
    }

    fn get(&mut self, offset: u32) -> Result<crate::NameRef> {
        if let Some(name) = self.seen.get(&offset) {
            return Ok(*name);
        }
        let name = self.table.intern(read_name(self.raw, offset)?);
        self.seen.insert(offset, name);
        Ok(name)
    }
}

/// Validate indices and the single-rooted tree shape; returns the root.
fn check_tree(records: &[WidgetRecord], pane_count: usize) -> Result<WidgetId> {
    let count = records.len();
    let mut root: Option<usize> = None;
    let mut pane_owner: Vec<Option<usize>> = vec![None; pane_count];

    for (index, record) in records.iter().enumerate() {
        let out_of_range = |what, value| ArchiveError::IndexOutOfRange {
            what,
            index,
            value,
            count: if what == "pane" { pane_count } else { count },
        };

        if record.parent == NONE_INDEX {
            if let Some(first) = root {
                return Err(ArchiveError::MultipleRoots { first, second: index });
            }
            root = Some(index);
        } else if record.parent as usize >= count {
            return Err(out_of_range("parent", record.parent));
        }

        if record.pane != NONE_INDEX {
            let pane = record.pane as usize;
            if pane >= pane_count {
                return Err(out_of_range("pane", record.pane));
            }
            if let Some(first) = pane_owner[pane] {
                return Err(ArchiveError::PaneSharedByWidgets { pane, first, second: index });
            }
            pane_owner[pane] = Some(index);
        }

        let end = record
            .first_child
            .checked_add(record.child_count)
            .filter(|&end| end as usize <= count)
            .ok_or_else(|| out_of_range("child range end", record.first_child.saturating_add(record.child_count)))?;
        for child in record.first_child..end {
            if records[child as usize].parent != index as u32 {
                return Err(ArchiveError::ParentMismatch {
                    child: child as usize,
                    parent: index,
                });
            }
        }
    }

    // Every non-root widget must sit inside its parent's child range.
    for (index, record) in records.iter().enumerate() {
        if record.parent == NONE_INDEX {
            continue;
        }
        let parent = &records[record.parent as usize];
        let range = parent.first_child..parent.first_child + parent.child_count;
        if !range.contains(&(index as u32)) {
            return Err(ArchiveError::ParentMismatch {
                child: index,
                parent: record.parent as usize,
            });
        }
    }

    let root = root.ok_or(ArchiveError::NoRoot)?;

    let mut visited = vec![false; count];
    let mut queue = std::collections::VecDeque::from([root]);
    while let Some(index) = queue.pop_front() {
        if std::mem::replace(&mut visited[index], true) {
            return Err(ArchiveError::Cycle(index));
        }
        let record = &records[index];
        queue.extend((record.first_child..record.first_child + record.child_count).map(|c| c as usize));
    }
    if let Some(orphan) = visited.iter().position(|&seen| !seen) {
        return Err(ArchiveError::Unreachable(orphan));
    }

    Ok(WidgetId(root as u32))
}

pub fn decode_archive(data: &[u8]) -> Result<LayoutArchive> {
    ArchiveParser::new(data).parse()
}

pub fn load_archive_file(path: impl AsRef<Path>) -> Result<LayoutArchive> {
    let data = std::fs::read(path)?;
    decode_archive(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sample() -> Vec<u8> {
        let mut builder = ArchiveBuilder::new();
        let root = builder.add_widget("N_Root", None, WidgetType::Group);
        let icon = builder.add_widget("W_Icon", Some(root), WidgetType::Pane);
        let label = builder.add_widget("W_Label", Some(root), WidgetType::Pane);
        builder.add_widget("N_Inner", Some(icon), WidgetType::Group);
        let rect = builder.add_pane("P_Icon", PaneData::Rect { translate: Vec3::ZERO, width: 24.0, height: 24.0 });
        let text = builder.add_pane("P_Label", PaneData::Text { payload: Box::new([0; crate::TEXT_PAYLOAD_SIZE]) });
        builder.set_pane(icon, rect);
        builder.set_pane(label, text);
        builder.build()
    }

    fn header(data: &[u8]) -> ArchiveHeader {
        ArchiveHeader::read(&mut ByteReader::new(data)).unwrap()
    }

    fn patch_u32(data: &mut [u8], offset: usize, value: u32) {
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_record_sizes() {
        let mut out = Vec::new();
        ArchiveHeader {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            widget_count: 0,
            pane_count: 0,
            pane_table_offset: 0,
            widget_table_offset: 0,
            string_table_offset: 0,
            string_table_size: 0,
        }
        .write(&mut out);
        assert_eq!(out.len(), ArchiveHeader::SIZE);

        out.clear();
        WidgetRecord {
            parent: NONE_INDEX,
            name: 0,
            first_child: 0,
            child_count: 0,
            main_widget: NO_MAIN_WIDGET,
            widget_type: 0,
            pane: NONE_INDEX,
            pane_vec: Vec4::ZERO,
            pos: WidgetPos::default(),
            old_pos: WidgetPos::default(),
        }
        .write(&mut out);
        assert_eq!(out.len(), 0x13C);
    }

    #[test]
    fn test_parse_links_tree() {
        let archive = decode_archive(&sample()).unwrap();
        assert_eq!(archive.widgets.len(), 4);
        assert_eq!(archive.panes.len(), 2);

        let root = &archive.widgets[archive.root.index()];
        assert_eq!(archive.strings.get(root.name), "N_Root");
        assert_eq!(root.parent(), None);
        let names: Vec<&str> = root
            .children()
            .iter()
            .map(|c| archive.strings.get(archive.widgets[c.index()].name))
            .collect();
        assert_eq!(names, ["W_Icon", "W_Label"]);

        let icon = &archive.widgets[root.children()[0].index()];
        let pane = &archive.panes[icon.pane().unwrap().index()];
        assert_eq!(pane.pane_type(), PaneType::Rect);
        assert_eq!(archive.strings.get(pane.name), "P_Icon");
        assert_eq!(icon.children().len(), 1);
    }

    #[test]
    fn test_rejects_short_and_foreign_data() {
        assert!(matches!(decode_archive(&[0; 8]), Err(ArchiveError::TooSmall(8))));

        let mut data = sample();
        data[0] = b'X';
        assert!(matches!(decode_archive(&data), Err(ArchiveError::BadMagic(_))));

        let mut data = sample();
        data[4] = 9;
        assert!(matches!(decode_archive(&data), Err(ArchiveError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_rejects_unknown_and_unsupported_tags() {
        let mut data = sample();
        let offset = header(&data).pane_table_offset as usize;
        data[offset..offset + 2].copy_from_slice(&42u16.to_le_bytes());
        assert!(matches!(
            decode_archive(&data),
            Err(ArchiveError::UnknownPaneType { index: 0, tag: 42 })
        ));

        data[offset..offset + 2].copy_from_slice(&(PaneType::Pane2Ex as u16).to_le_bytes());
        assert!(matches!(
            decode_archive(&data),
            Err(ArchiveError::UnsupportedPaneType { index: 0, pane_type: PaneType::Pane2Ex })
        ));
    }

    #[test]
    fn test_rejects_rect_with_wrong_size() {
        let mut data = sample();
        let offset = header(&data).pane_table_offset as usize;
        data[offset + 2..offset + 4].copy_from_slice(&0x24u16.to_le_bytes());
        match decode_archive(&data) {
            Err(ArchiveError::PaneSizeMismatch { pane_type, declared, expected, .. }) => {
                assert_eq!(pane_type, PaneType::Rect);
                assert_eq!(declared, 0x24);
                assert_eq!(expected, 0x20);
            }
            other => panic!("expected PaneSizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_second_root() {
        let mut data = sample();
        let widgets = header(&data).widget_table_offset as usize;
        // Detach the last widget from its parent.
        let last = widgets + 3 * WidgetRecord::SIZE;
        patch_u32(&mut data, last + 0xC, NONE_INDEX);
        assert!(matches!(
            decode_archive(&data),
            Err(ArchiveError::MultipleRoots { .. }) | Err(ArchiveError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let mut data = sample();
        let widgets = header(&data).widget_table_offset as usize;
        patch_u32(&mut data, widgets + 0x28, 99);
        assert!(matches!(
            decode_archive(&data),
            Err(ArchiveError::IndexOutOfRange { what: "pane", value: 99, .. })
        ));

        let mut data = sample();
        patch_u32(&mut data, widgets + 0x18, 40);
        assert!(matches!(decode_archive(&data), Err(ArchiveError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_rejects_truncated_widget_table() {
        let data = sample();
        let strings = header(&data).string_table_offset as usize;
        let mut truncated = data[..strings - 4].to_vec();
        // Keep the header pointing at a string table that no longer exists.
        truncated.extend_from_slice(&[0; 4]);
        assert!(decode_archive(&truncated).is_err());
    }

    #[test]
    fn test_rejects_cycle_without_root() {
        let mut data = sample();
        let widgets = header(&data).widget_table_offset as usize;
        // Make the root its own child: it now has a parent and no widget is a root.
        patch_u32(&mut data, widgets + 0xC, 0);
        assert!(decode_archive(&data).is_err());
    }
}
