use crate::domain::model::PackageBuildRecord;

/// 外部框架實際會用的建置並行數
///
/// Without a cap every available CPU is used; with one the smaller of the two
/// wins. Never less than 1.
pub fn effective_parallelism(maxparallel: Option<u32>, available: usize) -> usize {
    let available = available.max(1);
    match maxparallel {
        Some(cap) => available.min(cap.max(1) as usize),
        None => available,
    }
}

impl PackageBuildRecord {
    pub fn effective_parallelism(&self, available: usize) -> usize {
        effective_parallelism(self.maxparallel(), available)
    }
}
