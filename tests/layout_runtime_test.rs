use glam::{Vec3, Vec4};
use lyt_core::{
    decode_archive, ArchiveBuilder, ArchiveError, PaneData, PaneExArg, PaneType, PosFlags, WidgetPos, WidgetType,
};
use lyt_runtime::{
    AnimPlayer, AnimTarget, DrawEntry, Layout, LayoutError, LayoutMgr, MainWidget, MemoryPackage, DEFAULT_SPEED,
};
use std::collections::VecDeque;

fn menu_archive() -> Vec<u8> {
    let mut builder = ArchiveBuilder::new();
    let root = builder.add_widget("N_Menu", None, WidgetType::Layout);
    let bg = builder.add_widget("N_Background", Some(root), WidgetType::Pane);
    let list = builder.add_widget("N_List", Some(root), WidgetType::Group);
    let title = builder.add_widget("N_Title", Some(root), WidgetType::Pane);
    let item0 = builder.add_widget("N_Item0", Some(list), WidgetType::Pane);
    let item1 = builder.add_widget("N_Item1", Some(list), WidgetType::Pane);
    let slot = builder.add_widget("N_Cursor", Some(list), WidgetType::MainWidget);
    builder.set_main_widget(slot, 0);

    let p = builder.add_pane("P_Background", PaneData::Rect { translate: Vec3::ZERO, width: 640.0, height: 480.0 });
    builder.set_pane(bg, p);
    let p = builder.add_pane("P_Title", PaneData::Text { payload: Box::new([0; lyt_core::TEXT_PAYLOAD_SIZE]) });
    builder.set_pane(title, p);
    let p = builder.add_pane("P_Item0", PaneData::Type1 { translate: Vec3::new(0.0, 0.0, 1.0), z_multiplier: 4.0 });
    builder.set_pane(item0, p);
    let p = builder.add_pane(
        "P_Item1",
        PaneData::Ex { enable_translate: true, arg: PaneExArg { width: 32.0, height: 32.0, ..Default::default() } },
    );
    builder.set_pane(item1, p);

    let mut pos = WidgetPos::default();
    pos.set_translate(Vec3::new(0.0, -40.0, 0.0));
    builder.set_pos(list, pos);
    let mut pos = WidgetPos::default();
    pos.set_translate(Vec3::new(0.0, 20.0, 0.0));
    builder.set_pos(item1, pos);

    builder.build()
}

fn cursor_archive() -> Vec<u8> {
    let mut builder = ArchiveBuilder::new();
    let root = builder.add_widget("N_Cursor", None, WidgetType::Layout);
    let arrow = builder.add_widget("N_Arrow", Some(root), WidgetType::Pane);
    let p = builder.add_pane("P_Arrow", PaneData::Null { translate: Vec3::X });
    builder.set_pane(arrow, p);
    builder.build()
}

#[test]
fn test_archive_round_trip() {
    let archive = decode_archive(&menu_archive()).unwrap();
    assert_eq!(archive.widgets.len(), 7);
    assert_eq!(archive.panes.len(), 4);
    assert_eq!(archive.header.widget_count, 7);

    let layout = Layout::new(archive, "menu");
    let list = layout.widget_id("N_List").unwrap();
    let children: Vec<&str> = layout
        .widget(list)
        .unwrap()
        .children()
        .iter()
        .map(|c| layout.widget_name(*c))
        .collect();
    assert_eq!(children, ["N_Item0", "N_Item1", "N_Cursor"]);
    assert_eq!(layout.widget(layout.widget_id("N_Item0").unwrap()).unwrap().parent(), Some(list));

    let tags: Vec<PaneType> = layout.panes().iter().map(|p| p.pane_type()).collect();
    assert_eq!(tags, [PaneType::Rect, PaneType::Text, PaneType::Type1, PaneType::PaneEx]);
    assert_eq!(layout.get_widget("N_Cursor").unwrap().main_widget(), Some(0));
    assert_eq!(layout.get_widget("N_List").unwrap().pos.translate, Vec3::new(0.0, -40.0, 0.0));
}

#[test]
fn test_tree_has_one_root_and_bfs_visits_all() {
    let layout = Layout::decode(&menu_archive(), "menu").unwrap();
    let roots: Vec<_> = layout.widgets().iter().filter(|w| w.parent().is_none()).collect();
    assert_eq!(roots.len(), 1);

    let mut seen = vec![false; layout.widgets().len()];
    let mut queue = VecDeque::from([layout.root_id()]);
    while let Some(id) = queue.pop_front() {
        assert!(!seen[id.index()], "widget {} visited twice", id.index());
        seen[id.index()] = true;
        queue.extend(layout.widget(id).unwrap().children().iter().copied());
    }
    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_traversal_order_follows_child_order() {
    let mut layout = Layout::decode(&menu_archive(), "menu").unwrap();
    layout.init(vec![MainWidget::new("N_Cursor")], Vec::new());
    if layout.attach_layout(0, Layout::decode(&cursor_archive(), "cursor").unwrap()).is_err() {
        panic!("slot 0 should be free");
    }
    layout.calc(DEFAULT_SPEED);

    let order: Vec<String> = layout
        .draw_list()
        .iter()
        .map(|entry| match entry {
            DrawEntry::Pane(item) => layout.widget_name(item.widget).to_string(),
            DrawEntry::Nested(slot) => format!("slot{}", slot),
        })
        .collect();
    // Depth-first: the list subtree is finished before the title.
    assert_eq!(order, ["N_Background", "N_Item0", "N_Item1", "slot0", "N_Title"]);

    let item0 = layout.get_widget("N_Item0").unwrap();
    assert_eq!(Vec3::from(item0.pane_mtx().translation), Vec3::new(0.0, -40.0, 4.0));
    let item1 = layout.get_widget("N_Item1").unwrap();
    assert_eq!(Vec3::from(item1.mtx().translation), Vec3::new(0.0, -20.0, 0.0));

    let nested = layout.main_widgets()[0].layout().unwrap();
    let arrow = nested.get_widget("N_Arrow").unwrap();
    assert_eq!(Vec3::from(arrow.pane_mtx().translation), Vec3::new(1.0, -40.0, 0.0));
    assert_eq!(layout.draw_constants().len(), 5);
}

#[test]
fn test_calc_twice_gives_identical_results() {
    let mut layout = Layout::decode(&menu_archive(), "menu").unwrap();
    layout.get_widget_mut("N_List").unwrap().pos.set_rotate(Vec3::new(10.0, 20.0, 30.0));
    layout.get_widget_mut("N_Item1").unwrap().pos.set_scale(Vec3::new(1.5, 0.5, 1.0));

    layout.calc(DEFAULT_SPEED);
    let first: Vec<_> = layout.widgets().iter().map(|w| *w.frame()).collect();
    let first_draw = layout.draw_list().to_vec();
    layout.calc(DEFAULT_SPEED);
    let second: Vec<_> = layout.widgets().iter().map(|w| *w.frame()).collect();

    assert_eq!(first, second);
    assert_eq!(first_draw, layout.draw_list());
}

struct Blink {
    frames: u32,
}

impl AnimPlayer for Blink {
    fn name(&self) -> &str {
        "blink"
    }

    fn apply(&mut self, target: &mut AnimTarget<'_>, _speed: f32) {
        self.frames += 1;
        let visible = self.frames % 2 == 0;
        if let Some(pos) = target.pos_mut("N_Title") {
            pos.set_visible(visible);
        }
    }
}

#[test]
fn test_player_drives_visibility() {
    let mut layout = Layout::decode(&menu_archive(), "menu").unwrap();
    layout.init(Vec::new(), vec![Box::new(Blink { frames: 0 })]);
    assert_eq!(layout.players().map(|p| p.name()).collect::<Vec<_>>(), ["blink"]);

    layout.calc(DEFAULT_SPEED);
    let title = layout.get_widget("N_Title").unwrap();
    assert!(title.old_pos.is_visible());
    assert!(!title.pos.is_visible());
    assert_eq!(title.color().w, 0.0);
    assert!(title.pos.touched.contains(PosFlags::VISIBILITY));
    assert!(!title.pos.at_default.contains(PosFlags::VISIBILITY));

    layout.calc(DEFAULT_SPEED);
    let title = layout.get_widget("N_Title").unwrap();
    assert!(title.pos.is_visible());
    assert!(title.pos.at_default.contains(PosFlags::VISIBILITY));
    assert_eq!(title.color(), Vec4::ONE);
}

#[test]
fn test_rect_with_wrong_declared_size_is_rejected() {
    let mut data = menu_archive();
    // The first pane record is the Rect; its declared size sits right after the tag.
    let pane_table = u32::from_le_bytes(data[0x10..0x14].try_into().unwrap()) as usize;
    assert_eq!(u16::from_le_bytes([data[pane_table], data[pane_table + 1]]), PaneType::Rect as u16);
    data[pane_table + 2..pane_table + 4].copy_from_slice(&0x24u16.to_le_bytes());

    assert!(matches!(
        decode_archive(&data),
        Err(ArchiveError::PaneSizeMismatch { index: 0, declared: 0x24, expected: 0x20, .. })
    ));
    assert!(matches!(Layout::decode(&data, "bad"), Err(LayoutError::Archive(_))));
}

#[test]
fn test_registry_lifecycle() {
    let mut package = MemoryPackage::new();
    package.add_layout("menu", menu_archive());
    package.add_layout("cursor", cursor_archive());
    let mut mgr = LayoutMgr::new(package);

    let menu = mgr.make_layout_by_name("menu").unwrap();
    let cursor = mgr.make_layout_by_name("cursor").unwrap();
    mgr.get_mut(menu).unwrap().init(vec![MainWidget::new("N_Cursor")], Vec::new());
    mgr.attach(menu, 0, cursor).unwrap();
    assert!(matches!(mgr.free_layout(cursor), Err(LayoutError::UnknownLayout(_))));
    mgr.calc_all();

    mgr.free_layout(menu).unwrap();
    assert!(mgr.is_empty());
    assert!(mgr.get(menu).is_none());
    assert!(matches!(mgr.free_layout(menu), Err(LayoutError::UnknownLayout(h)) if h == menu));
}
