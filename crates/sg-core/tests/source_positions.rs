use pretty_assertions::assert_eq;
use sg_core::source_map::{
    resolve_position, InMemorySourceProvider, LineColumn, SourceCache, SourceProvider,
};
use sg_core::span::{SYNTHETIC_OFFSET, UNDEFINED_OFFSET};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn grid_of_leading_blank_lines_and_spaces() {
    for y in 0..9usize {
        for x in 0..9usize {
            let text = format!("{}{}class Foo {{}}\n", "\n".repeat(y), " ".repeat(x));
            let lines: Vec<&str> = text.lines().collect();
            let offset = (y + x) as i32;
            let resolved = resolve_position(&lines, offset, offset + 5);
            assert_eq!(resolved, LineColumn::new(y + 1, x + 1), "x = {x}, y = {y}");
            assert_eq!(resolve_position(&lines, offset, offset + 5), resolved);
        }
    }
}

struct CountingProvider {
    calls: AtomicUsize,
    inner: InMemorySourceProvider,
}

impl SourceProvider for CountingProvider {
    fn lines(&self, path: &Path) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lines(path)
    }
}

#[test]
fn sentinel_offsets_never_read_source() {
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
        inner: InMemorySourceProvider::new().with_file("a.kt", "fun a() {}"),
    });
    let cache = SourceCache::new(provider.clone());

    let synthetic = cache.resolve(Path::new("a.kt"), SYNTHETIC_OFFSET, SYNTHETIC_OFFSET);
    let undefined = cache.resolve(Path::new("a.kt"), UNDEFINED_OFFSET, UNDEFINED_OFFSET);
    assert_eq!(synthetic, LineColumn::SYNTHETIC);
    assert_eq!(undefined, LineColumn::UNDEFINED);
    assert_eq!((synthetic.line(), synthetic.column()), (-2, -2));
    assert_eq!((undefined.line(), undefined.column()), (-1, -1));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    assert_eq!(cache.resolve(Path::new("a.kt"), 4, 5), LineColumn::new(1, 5));
    assert_eq!(cache.resolve(Path::new("a.kt"), 0, 1), LineColumn::new(1, 1));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_files_resolve_to_unknown() {
    let cache = SourceCache::from_provider(InMemorySourceProvider::new());
    assert!(cache.lines(Path::new("nowhere.kt")).is_empty());
    assert_eq!(
        cache.resolve(Path::new("nowhere.kt"), 3, 4),
        LineColumn::UNKNOWN
    );
}
