//! # Registry 模块
//!
//! 宠物实例注册表。
//!
//! 宿主进程用它把窗口与宠物实例关联起来：
//! ```rust,ignore
//! let id = registry.create(runtime);
//! registry.get_mut(id).map(|pet| pet.tick());
//! let runtime = registry.remove(id);
//! ```
//!
//! 注册表由宿主持有，按引用传给需要它的组件。

use std::collections::HashMap;

/// 宠物实例 ID
///
/// 由注册表分配，移除后不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PetId(u64);

impl PetId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pet#{}", self.0)
    }
}

/// 宠物实例注册表
pub struct PetRegistry<T> {
    entries: HashMap<PetId, T>,
    next_id: u64,
}

impl<T> Default for PetRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PetRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetRegistry")
            .field("entries", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T> PetRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// 登记实例并分配 ID
    pub fn create(&mut self, pet: T) -> PetId {
        let id = PetId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, pet);
        id
    }

    pub fn get(&self, id: PetId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: PetId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// 按条件查找第一个实例
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<PetId> {
        let mut ids: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, pet)| predicate(pet))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids.first().copied()
    }

    /// 移除实例，返回其所有权（由调用方负责停止）
    pub fn remove(&mut self, id: PetId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: PetId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按 ID 顺序列出所有实例
    pub fn ids(&self) -> Vec<PetId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PetId, &mut T)> {
        self.entries.iter_mut().map(|(id, pet)| (*id, pet))
    }

    /// 移除全部实例
    pub fn drain(&mut self) -> Vec<(PetId, T)> {
        let mut drained: Vec<_> = self.entries.drain().collect();
        drained.sort_by_key(|(id, _)| *id);
        drained
    }
}
