// ── cachebackend.rs ─────────────────────────────────────────────────────────

use std::cell::RefCell;

use uuid::Uuid;

/// 以 revision 判斷失效的單格 cache。
///
/// 格子只屬於最後一次看到的 revision。以其他 revision 查詢時會丟掉舊值並重建，
/// 即使新輸入的內容與舊的相同也一樣。
pub trait CacheBackend<V: Clone> {
    fn get_or_build(&self, revision: Uuid, build: impl FnOnce() -> V) -> V;

    /// 目前為止重建的次數。
    fn builds(&self) -> usize;

    fn invalidate(&self);
}

// ── 單執行緒：RefCell ────────────────────────────────────────────────

struct CacheInner<V> {
    revision: Option<Uuid>,
    value: Option<V>,
    builds: usize,
}

pub struct RefCellBackend<V> {
    inner: RefCell<CacheInner<V>>,
}

impl<V> RefCellBackend<V> {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(CacheInner {
                revision: None,
                value: None,
                builds: 0,
            }),
        }
    }
}

impl<V> Default for RefCellBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> CacheBackend<V> for RefCellBackend<V> {
    fn get_or_build(&self, revision: Uuid, build: impl FnOnce() -> V) -> V {
        {
            let inner = self.inner.borrow();
            if inner.revision == Some(revision) {
                if let Some(value) = inner.value.as_ref() {
                    return value.clone();
                }
            }
        }

        // `build` 可能會查其他 cache，執行期間不持有 borrow
        let value = build();
        let mut inner = self.inner.borrow_mut();
        inner.revision = Some(revision);
        inner.value = Some(value.clone());
        inner.builds += 1;
        value
    }

    fn builds(&self) -> usize {
        self.inner.borrow().builds
    }

    fn invalidate(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.revision = None;
        inner.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_revision_builds_once() {
        let backend: RefCellBackend<u32> = RefCellBackend::new();
        let rev = Uuid::new_v4();
        assert_eq!(backend.get_or_build(rev, || 7), 7);
        assert_eq!(backend.get_or_build(rev, || 9), 7);
        assert_eq!(backend.builds(), 1);
    }

    #[test]
    fn new_revision_rebuilds() {
        let backend: RefCellBackend<u32> = RefCellBackend::new();
        backend.get_or_build(Uuid::new_v4(), || 1);
        assert_eq!(backend.get_or_build(Uuid::new_v4(), || 2), 2);
        assert_eq!(backend.builds(), 2);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let backend: RefCellBackend<u32> = RefCellBackend::new();
        let rev = Uuid::new_v4();
        backend.get_or_build(rev, || 1);
        backend.invalidate();
        assert_eq!(backend.get_or_build(rev, || 3), 3);
    }
}
