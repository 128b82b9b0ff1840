use ordeal_core::{ItemKind, PathItem, SEPARATOR};

#[test]
fn folder_prefix_is_empty_or_separator_terminated() {
    for pathname in ["", "/", "/a", "/a/", "rel/dir", r"C:\x\y", "C:"] {
        let item = PathItem::folder(pathname);
        let prefix = item.folder_path();
        assert!(
            prefix.is_empty() || prefix.ends_with(SEPARATOR),
            "folder prefix {prefix:?} for {pathname:?} does not end with the separator"
        );
    }
}

#[test]
fn file_render_round_trips_for_names_with_extensions() {
    for pathname in ["/a/b.rs", "a.b.c", "/deep/er/x.test.ts", "/n/Makefile", "/r/.env"] {
        let item = PathItem::file(pathname);
        assert_eq!(item.render(), pathname, "render mismatch for {pathname:?}");
    }
}

#[test]
fn file_folder_prefix_matches_parent_folder_item() {
    let file = PathItem::file("/suite/math/add.rs");
    let parent = PathItem::folder("/suite/math");
    assert_eq!(file.folder_path(), parent.folder_path());
    assert!(matches!(file.kind(), ItemKind::File { name, .. } if name == "add"));
}

#[cfg(feature = "serde")]
#[test]
fn items_serialize_with_a_type_tag() {
    let json = serde_json::to_value(PathItem::file("/s/a.rs")).unwrap();
    assert_eq!(json["type"], "file");
    assert_eq!(json["name"], "a");
    assert_eq!(json["extension"], "rs");
    assert_eq!(json["folder_path"], "/s/");

    let json = serde_json::to_value(PathItem::folder("/s")).unwrap();
    assert_eq!(json["type"], "folder");
    assert_eq!(json["is_absolute"], true);
}
