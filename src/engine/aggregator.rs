// ==========================================
// 待打包订单发运系统 - 参考号合并引擎
// ==========================================
// 规则:
// - 分组键 = referencia（区分大小写，精确匹配）
// - 分组顺序 = 参考号首次出现顺序
// - 标量字段取首行；UCC 按暂存顺序全部收集，不去重
// - 超出容量时不截断，标记 overflow 交由发运层拒绝
// ==========================================

use crate::domain::{ImportRow, ShipmentGroup};
use std::collections::HashMap;
use tracing::{debug, warn};

/// 单个分组的 UCC 容量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemCapacity {
    #[default]
    Unbounded,
    Max(usize),
}

impl ItemCapacity {
    pub fn from_option(max: Option<usize>) -> Self {
        match max {
            Some(n) if n > 0 => ItemCapacity::Max(n),
            _ => ItemCapacity::Unbounded,
        }
    }

    fn exceeded_by(&self, count: usize) -> bool {
        matches!(self, ItemCapacity::Max(max) if count > *max)
    }
}

/// 按参考号合并暂存行
pub fn group_by_reference(rows: &[ImportRow], capacity: ItemCapacity) -> Vec<ShipmentGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ShipmentGroup> = Vec::new();

    for row in rows {
        match index.get(row.referencia.as_str()) {
            Some(&pos) => {
                let group = &mut groups[pos];
                group.uccs.push(row.pk.clone());
                group.row_numbers.push(row.row_number);
            }
            None => {
                index.insert(row.referencia.as_str(), groups.len());
                groups.push(ShipmentGroup {
                    referencia: row.referencia.clone(),
                    first_row: row.clone(),
                    uccs: vec![row.pk.clone()],
                    row_numbers: vec![row.row_number],
                    overflow: None,
                });
            }
        }
    }

    for group in &mut groups {
        if capacity.exceeded_by(group.uccs.len()) {
            warn!(
                referencia = %group.referencia,
                items = group.uccs.len(),
                capacity = ?capacity,
                "分组 UCC 数超出容量"
            );
            group.overflow = Some(group.uccs.len());
        }
    }

    debug!(rows = rows.len(), groups = groups.len(), "参考号合并完成");
    groups
}
