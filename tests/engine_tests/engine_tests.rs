//! Tests for Engine
//!
//! These tests verify:
//! - Format and open (memory and file-backed)
//! - Attributes and listings
//! - Create, remove and rename semantics
//! - File content: resize, offset reads and writes
//! - Failed operations leave the inode table untouched
//! - Identifier exhaustion and error codes

use logfs::config::Config;
use logfs::disk::{IMAGE_SIZE, MAX_CHILDREN, MAX_FILE_SIZE, MAX_INODES};
use logfs::engine::{Engine, FIXED_PERMISSIONS};
use logfs::{InodeId, InodeKind, LogFsError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine {
    Engine::in_memory().unwrap()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .image_path(temp_dir.path().join("disk.img"))
        .sync_on_rollover(true)
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn table_snapshot(engine: &Engine) -> Vec<u8> {
    engine.log().table().encode()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_formats_root() {
    let engine = setup_engine();

    let attrs = engine.get_attributes("/").unwrap();

    assert_eq!(attrs.id, InodeId::ROOT);
    assert_eq!(attrs.kind, InodeKind::Directory);
    assert_eq!(attrs.size, 0);
    assert!(engine.list_children("/").unwrap().is_empty());
    assert_eq!(engine.stats().unwrap().live_inodes, 1);
}

#[test]
fn test_open_creates_image_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("disk.img");

    let engine = Engine::open_path(&path).unwrap();

    assert!(path.exists());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), IMAGE_SIZE as u64);
    assert_eq!(engine.config().image_path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_open_overwrites_previous_image() {
    let (temp_dir, mut engine) = setup_temp_engine();
    engine.create_entry("/old", InodeKind::File).unwrap();
    engine.close().unwrap();

    let engine = Engine::open_path(&temp_dir.path().join("disk.img")).unwrap();

    assert!(engine.list_children("/").unwrap().is_empty());
}

// =============================================================================
// Attribute Tests
// =============================================================================

#[test]
fn test_get_attributes_is_idempotent() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"abc").unwrap();
    let written = engine.stats().unwrap().blocks_written;

    let first = engine.get_attributes("/f").unwrap();
    let second = engine.get_attributes("/f").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.size, 3);
    assert_eq!(engine.stats().unwrap().blocks_written, written);
}

#[test]
fn test_mode_bits() {
    let mut engine = setup_engine();
    engine.create_entry("/d", InodeKind::Directory).unwrap();
    engine.create_entry("/f", InodeKind::File).unwrap();

    let dir_mode = engine.get_attributes("/d").unwrap().mode();
    let file_mode = engine.get_attributes("/f").unwrap().mode();

    assert_eq!(dir_mode & 0o777, FIXED_PERMISSIONS);
    assert_eq!(dir_mode & libc::S_IFMT as u32, libc::S_IFDIR as u32);
    assert_eq!(file_mode & libc::S_IFMT as u32, libc::S_IFREG as u32);
}

#[test]
fn test_update_times() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();

    engine.update_times("/f", Some(12345)).unwrap();
    let attrs = engine.get_attributes("/f").unwrap();
    assert_eq!(attrs.accessed, 12345);
    assert!(attrs.modified > 12345);

    engine.update_times("/f", None).unwrap();
    let attrs = engine.get_attributes("/f").unwrap();
    assert_eq!(attrs.accessed, attrs.modified);
}

#[test]
fn test_get_attributes_missing() {
    let engine = setup_engine();

    let err = engine.get_attributes("/missing").unwrap_err();

    assert!(matches!(err, LogFsError::NotFound(_)));
    assert_eq!(err.errno(), libc::ENOENT);
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_and_list() {
    let mut engine = setup_engine();

    engine.create_entry("/d", InodeKind::Directory).unwrap();
    engine.create_entry("/d/f", InodeKind::File).unwrap();
    engine.create_entry("/d/g", InodeKind::File).unwrap();

    assert_eq!(engine.list_children("/").unwrap(), vec!["d"]);
    assert_eq!(engine.list_children("/d").unwrap(), vec!["f", "g"]);
}

#[test]
fn test_create_allocates_lowest_free_id() {
    let mut engine = setup_engine();
    let a = engine.create_entry("/a", InodeKind::File).unwrap();
    let b = engine.create_entry("/b", InodeKind::File).unwrap();
    engine.remove_entry("/a").unwrap();

    let c = engine.create_entry("/c", InodeKind::File).unwrap();

    assert_eq!(a.raw(), 1);
    assert_eq!(b.raw(), 2);
    assert_eq!(c, a);
}

#[test]
fn test_create_touches_parent() {
    let mut engine = setup_engine();
    engine.create_entry("/d", InodeKind::Directory).unwrap();
    let id = engine.resolve("/d").unwrap();
    let before = engine.log().table().lookup(id).unwrap();

    engine.create_entry("/d/f", InodeKind::File).unwrap();

    assert_ne!(engine.log().table().lookup(id).unwrap(), before);
}

#[test]
fn test_create_errors_leave_table_untouched() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    let snapshot = table_snapshot(&engine);

    assert!(matches!(
        engine.create_entry("/missing/x", InodeKind::File),
        Err(LogFsError::NotFound(_))
    ));
    assert!(matches!(
        engine.create_entry("/f/x", InodeKind::File),
        Err(LogFsError::NotADirectory(_))
    ));
    assert!(matches!(
        engine.create_entry("/", InodeKind::Directory),
        Err(LogFsError::InvalidPath(_))
    ));
    assert!(matches!(
        engine.create_entry("/a/..", InodeKind::File),
        Err(LogFsError::InvalidName(_))
    ));

    assert_eq!(table_snapshot(&engine), snapshot);
}

#[test]
fn test_full_directory_rejects_entries() {
    let mut engine = setup_engine();
    engine.create_entry("/d", InodeKind::Directory).unwrap();
    for i in 0..MAX_CHILDREN {
        engine
            .create_entry(&format!("/d/f{}", i), InodeKind::File)
            .unwrap();
    }
    let snapshot = table_snapshot(&engine);

    let err = engine.create_entry("/d/extra", InodeKind::File).unwrap_err();

    assert!(matches!(err, LogFsError::OutOfSpace(_)));
    assert_eq!(err.errno(), libc::ENOSPC);
    assert_eq!(table_snapshot(&engine), snapshot);
    assert_eq!(engine.list_children("/d").unwrap().len(), MAX_CHILDREN);
}

#[test]
fn test_duplicate_names_first_wins() {
    let mut engine = setup_engine();
    let first = engine.create_entry("/dup", InodeKind::File).unwrap();
    let second = engine.create_entry("/dup", InodeKind::Directory).unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.resolve("/dup").unwrap(), first);
    assert_eq!(engine.list_children("/").unwrap(), vec!["dup", "dup"]);
}

#[test]
fn test_out_of_inodes() {
    let mut engine = setup_engine();

    // Spread entries over directories to stay under the per-directory limit
    let mut created = 0;
    let mut dir = 0;
    while created < MAX_INODES - 1 {
        let dir_path = format!("/d{}", dir);
        engine
            .create_entry(&dir_path, InodeKind::Directory)
            .unwrap();
        created += 1;
        for i in 0..MAX_CHILDREN {
            if created == MAX_INODES - 1 {
                break;
            }
            engine
                .create_entry(&format!("{}/f{}", dir_path, i), InodeKind::File)
                .unwrap();
            created += 1;
        }
        dir += 1;
    }
    let snapshot = table_snapshot(&engine);

    let err = engine.create_entry("/one-more", InodeKind::File).unwrap_err();

    assert!(matches!(err, LogFsError::OutOfInodes));
    assert_eq!(err.errno(), libc::ENOMEM);
    assert_eq!(table_snapshot(&engine), snapshot);
    assert_eq!(engine.stats().unwrap().live_inodes, MAX_INODES);
    assert!(engine.verify().unwrap().is_clean());
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_file() {
    let mut engine = setup_engine();
    let id = engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"data").unwrap();

    engine.remove_entry("/f").unwrap();

    assert!(engine.list_children("/").unwrap().is_empty());
    assert!(matches!(engine.resolve("/f"), Err(LogFsError::NotFound(_))));
    assert_eq!(engine.log().table().lookup(id), None);
}

#[test]
fn test_remove_from_indirect_slot() {
    let mut engine = setup_engine();
    for i in 0..10 {
        engine
            .create_entry(&format!("/f{}", i), InodeKind::File)
            .unwrap();
    }

    engine.remove_entry("/f9").unwrap();
    engine.remove_entry("/f2").unwrap();

    let names = engine.list_children("/").unwrap();
    assert_eq!(names.len(), 8);
    assert!(!names.contains(&"f9".to_string()));
    assert!(!names.contains(&"f2".to_string()));
    assert!(engine.verify().unwrap().is_clean());
}

#[test]
fn test_remove_non_empty_directory() {
    let mut engine = setup_engine();
    engine.create_entry("/d", InodeKind::Directory).unwrap();
    engine.create_entry("/d/f", InodeKind::File).unwrap();

    let err = engine.remove_entry("/d").unwrap_err();

    assert!(matches!(err, LogFsError::NotEmpty(_)));
    assert_eq!(err.errno(), libc::ENOTEMPTY);

    engine.remove_entry("/d/f").unwrap();
    engine.remove_entry("/d").unwrap();
    assert!(engine.list_children("/").unwrap().is_empty());
}

#[test]
fn test_remove_root_and_missing() {
    let mut engine = setup_engine();

    assert!(matches!(
        engine.remove_entry("/"),
        Err(LogFsError::InvalidPath(_))
    ));
    assert!(matches!(
        engine.remove_entry("/missing"),
        Err(LogFsError::NotFound(_))
    ));
}

// =============================================================================
// Rename Tests
// =============================================================================

#[test]
fn test_rename_in_place() {
    let mut engine = setup_engine();
    let id = engine.create_entry("/old", InodeKind::File).unwrap();
    engine.write_bytes("/old", b"content").unwrap();

    engine.rename_entry("/old", "/new").unwrap();

    assert_eq!(engine.resolve("/new").unwrap(), id);
    assert!(engine.resolve("/old").is_err());
    assert_eq!(engine.read_all("/new").unwrap(), b"content");
    assert_eq!(engine.list_children("/").unwrap(), vec!["new"]);
}

#[test]
fn test_rename_moves_between_directories() {
    let mut engine = setup_engine();
    engine.create_entry("/a", InodeKind::Directory).unwrap();
    engine.create_entry("/b", InodeKind::Directory).unwrap();
    let id = engine.create_entry("/a/f", InodeKind::File).unwrap();

    engine.rename_entry("/a/f", "/b/g").unwrap();

    assert!(engine.list_children("/a").unwrap().is_empty());
    assert_eq!(engine.list_children("/b").unwrap(), vec!["g"]);
    assert_eq!(engine.resolve("/b/g").unwrap(), id);
    assert!(engine.verify().unwrap().is_clean());
}

#[test]
fn test_rename_directory_keeps_subtree() {
    let mut engine = setup_engine();
    engine.create_entry("/a", InodeKind::Directory).unwrap();
    engine.create_entry("/a/inner", InodeKind::File).unwrap();
    engine.create_entry("/b", InodeKind::Directory).unwrap();

    engine.rename_entry("/a", "/b/moved").unwrap();

    assert!(engine.resolve("/b/moved/inner").is_ok());
    assert_eq!(engine.list_children("/").unwrap(), vec!["b"]);
}

#[test]
fn test_rename_replaces_existing_file() {
    let mut engine = setup_engine();
    let src = engine.create_entry("/src", InodeKind::File).unwrap();
    let dst = engine.create_entry("/dst", InodeKind::File).unwrap();
    engine.write_bytes("/src", b"source").unwrap();
    engine.write_bytes("/dst", b"target").unwrap();

    engine.rename_entry("/src", "/dst").unwrap();

    assert_eq!(engine.resolve("/dst").unwrap(), src);
    assert_eq!(engine.read_all("/dst").unwrap(), b"source");
    assert_eq!(engine.log().table().lookup(dst), None);
    assert_eq!(engine.list_children("/").unwrap(), vec!["dst"]);
    assert!(engine.verify().unwrap().is_clean());
}

#[test]
fn test_rename_replace_errors() {
    let mut engine = setup_engine();
    engine.create_entry("/file", InodeKind::File).unwrap();
    engine.create_entry("/dir", InodeKind::Directory).unwrap();
    engine.create_entry("/full", InodeKind::Directory).unwrap();
    engine.create_entry("/full/x", InodeKind::File).unwrap();
    engine.create_entry("/empty", InodeKind::Directory).unwrap();
    let snapshot = table_snapshot(&engine);

    assert!(matches!(
        engine.rename_entry("/file", "/dir"),
        Err(LogFsError::IsADirectory(_))
    ));
    assert!(matches!(
        engine.rename_entry("/dir", "/file"),
        Err(LogFsError::NotADirectory(_))
    ));
    assert!(matches!(
        engine.rename_entry("/empty", "/full"),
        Err(LogFsError::NotEmpty(_))
    ));
    assert_eq!(table_snapshot(&engine), snapshot);

    // The renamed entry keeps its own slot; the replaced one's slot is freed
    engine.rename_entry("/dir", "/empty").unwrap();
    assert_eq!(engine.list_children("/").unwrap(), vec!["file", "empty", "full"]);
}

#[test]
fn test_rename_invalid_paths() {
    let mut engine = setup_engine();
    engine.create_entry("/a", InodeKind::Directory).unwrap();
    engine.create_entry("/a/b", InodeKind::Directory).unwrap();

    assert!(matches!(
        engine.rename_entry("/a", "/a/b/c"),
        Err(LogFsError::InvalidPath(_))
    ));
    assert!(matches!(
        engine.rename_entry("/", "/x"),
        Err(LogFsError::InvalidPath(_))
    ));
    assert!(matches!(
        engine.rename_entry("/a", "/"),
        Err(LogFsError::InvalidPath(_))
    ));
    assert!(matches!(
        engine.rename_entry("/missing", "/x"),
        Err(LogFsError::NotFound(_))
    ));
    assert!(matches!(
        engine.rename_entry("/a", "/missing/x"),
        Err(LogFsError::NotFound(_))
    ));
}

#[test]
fn test_rename_to_same_path() {
    let mut engine = setup_engine();
    let id = engine.create_entry("/same", InodeKind::File).unwrap();

    engine.rename_entry("/same", "/same").unwrap();

    assert_eq!(engine.resolve("/same").unwrap(), id);
    assert_eq!(engine.list_children("/").unwrap(), vec!["same"]);
}

// =============================================================================
// Content Tests
// =============================================================================

#[test]
fn test_write_and_read() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    let data: Vec<u8> = (0..5000).map(|i| (i % 256) as u8).collect();

    assert_eq!(engine.write_bytes("/f", &data).unwrap(), 5000);

    let mut buf = vec![0u8; 8000];
    let n = engine.read_bytes("/f", &mut buf).unwrap();
    assert_eq!(n, 5000);
    assert_eq!(&buf[..n], &data[..]);

    let mut small = [0u8; 10];
    assert_eq!(engine.read_bytes("/f", &mut small).unwrap(), 10);
    assert_eq!(&small, &data[..10]);
}

#[test]
fn test_write_replaces_content() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", &[1u8; 3000]).unwrap();

    engine.write_bytes("/f", b"short").unwrap();

    assert_eq!(engine.read_all("/f").unwrap(), b"short");
    assert_eq!(engine.get_attributes("/f").unwrap().size, 5);
}

#[test]
fn test_write_too_large() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"keep").unwrap();
    let snapshot = table_snapshot(&engine);

    let err = engine
        .write_bytes("/f", &vec![0u8; MAX_FILE_SIZE as usize + 1])
        .unwrap_err();

    assert!(matches!(err, LogFsError::OutOfSpace(_)));
    assert_eq!(table_snapshot(&engine), snapshot);
    assert_eq!(engine.read_all("/f").unwrap(), b"keep");
}

#[test]
fn test_content_on_directory() {
    let mut engine = setup_engine();
    engine.create_entry("/d", InodeKind::Directory).unwrap();
    let mut buf = [0u8; 4];

    assert!(matches!(
        engine.write_bytes("/d", b"x"),
        Err(LogFsError::IsADirectory(_))
    ));
    assert!(matches!(
        engine.read_bytes("/d", &mut buf),
        Err(LogFsError::IsADirectory(_))
    ));
    assert!(matches!(
        engine.resize("/d", 10),
        Err(LogFsError::IsADirectory(_))
    ));
    assert!(matches!(
        engine.list_children("/missing"),
        Err(LogFsError::NotFound(_))
    ));
}

#[test]
fn test_list_children_of_file() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();

    let err = engine.list_children("/f").unwrap_err();

    assert!(matches!(err, LogFsError::NotADirectory(_)));
    assert_eq!(err.errno(), libc::ENOTDIR);
}

#[test]
fn test_resize_extends_with_zeros() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"abc").unwrap();

    engine.resize("/f", 2050).unwrap();

    let content = engine.read_all("/f").unwrap();
    assert_eq!(content.len(), 2050);
    assert_eq!(&content[..3], b"abc");
    assert!(content[3..].iter().all(|&b| b == 0));
}

#[test]
fn test_resize_cuts_content() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", &[7u8; 9000]).unwrap();

    engine.resize("/f", 100).unwrap();
    assert_eq!(engine.read_all("/f").unwrap(), vec![7u8; 100]);

    engine.resize("/f", 0).unwrap();
    assert!(engine.read_all("/f").unwrap().is_empty());
    let id = engine.resolve("/f").unwrap();
    let inode = engine.log().load_inode(id).unwrap();
    assert!(inode.direct.iter().all(Option::is_none));
    assert!(inode.indirect.is_none());
}

#[test]
fn test_resize_beyond_limit() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();

    assert!(matches!(
        engine.resize("/f", MAX_FILE_SIZE + 1),
        Err(LogFsError::OutOfSpace(_))
    ));
}

#[test]
fn test_read_at_offset() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"hello world").unwrap();

    let mut buf = [0u8; 5];
    assert_eq!(engine.read_at("/f", 6, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"world");

    assert_eq!(engine.read_at("/f", 9, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"ld");

    assert_eq!(engine.read_at("/f", 11, &mut buf).unwrap(), 0);
    assert_eq!(engine.read_at("/f", 500, &mut buf).unwrap(), 0);
}

#[test]
fn test_write_at_offset() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"hello world").unwrap();

    assert_eq!(engine.write_at("/f", 6, b"there").unwrap(), 5);
    assert_eq!(engine.read_all("/f").unwrap(), b"hello there");

    engine.write_at("/f", 14, b"!").unwrap();
    assert_eq!(engine.read_all("/f").unwrap(), b"hello there\0\0\0!");

    assert!(matches!(
        engine.write_at("/f", MAX_FILE_SIZE, b"x"),
        Err(LogFsError::OutOfSpace(_))
    ));
}

#[test]
fn test_write_at_overflowing_offset() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"keep").unwrap();
    let snapshot = table_snapshot(&engine);

    let err = engine.write_at("/f", u64::MAX, b"x").unwrap_err();

    assert!(matches!(err, LogFsError::OutOfSpace(_)));
    assert!(matches!(
        engine.write_at("/f", u64::MAX - 1, b"xyz"),
        Err(LogFsError::OutOfSpace(_))
    ));
    assert_eq!(table_snapshot(&engine), snapshot);
    assert_eq!(engine.read_all("/f").unwrap(), b"keep");
}

#[test]
fn test_write_across_block_boundary() {
    let mut engine = setup_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", &vec![b'a'; 8 * 1024]).unwrap();

    engine.write_at("/f", 8 * 1024 - 2, b"XYZW").unwrap();

    let content = engine.read_all("/f").unwrap();
    assert_eq!(content.len(), 8 * 1024 + 2);
    assert_eq!(&content[8 * 1024 - 2..], b"XYZW");
    let id = engine.resolve("/f").unwrap();
    assert!(engine.log().load_inode(id).unwrap().indirect.is_some());
}

// =============================================================================
// Maintenance Tests
// =============================================================================

#[test]
fn test_verify_fresh_engine() {
    let engine = setup_engine();

    let report = engine.verify().unwrap();

    assert!(report.is_clean());
    assert_eq!(report.inodes_checked, 1);
    assert_eq!(report.blocks_referenced, 1);
}

#[test]
fn test_sync_writes_image_file() {
    let (temp_dir, mut engine) = setup_temp_engine();
    engine.create_entry("/f", InodeKind::File).unwrap();
    engine.write_bytes("/f", b"persisted bytes").unwrap();

    engine.sync().unwrap();

    let image = std::fs::read(temp_dir.path().join("disk.img")).unwrap();
    assert_eq!(image.len(), IMAGE_SIZE);
    assert!(image
        .windows(b"persisted bytes".len())
        .any(|w| w == b"persisted bytes"));
}
