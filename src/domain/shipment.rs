// ==========================================
// 待打包订单发运系统 - 发运领域模型
// ==========================================
// ImportRow: Excel 一行（一个托盘/UCC）
// ShipmentGroup: 同一参考号合并后的发运单元
// StagedBatch: 一次导入的不可变暂存批次
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// ImportRow - 导入行
// ==========================================
// 用途: 导入层写入，暂存层持有，合并引擎只读
// 约束: 全空行在导入阶段丢弃，不会出现在这里
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    // ===== 元信息 =====
    pub row_number: usize, // 源表行号（表头为第 1 行）

    // ===== 货物 =====
    pub quantity: i32, // 件数（Cantidad）
    pub pk: String,    // 托盘/单元标识（UCC）

    // ===== 分组键 =====
    pub referencia: String, // 发运参考号（区分大小写）

    // ===== 收货方 =====
    pub razon_social: String,
    pub direccion1: String,
    pub direccion2: String,
    pub colonia: String,
    pub poblacion: String,
    pub codigo_postal: String, // 发运时再转整数
    pub telefono: String,      // 原样保留，发运时规范化
    pub contacto: String,

    // ===== 运输 =====
    pub tipo_guia: String, // 服务/面单类型
    pub vehiculo: String,
    pub currier: String,
    pub tienda: String,   // 门店编码
    pub receptor: String, // 收货人
}

// ==========================================
// ShipmentGroup - 发运分组
// ==========================================
// 标量字段取该参考号首行；uccs 收集全部行（不去重，保持暂存顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentGroup {
    pub referencia: String,
    pub first_row: ImportRow,
    pub uccs: Vec<String>,
    pub row_numbers: Vec<usize>,
    /// 超出配置容量时的实际件数（None 表示未超限）
    pub overflow: Option<usize>,
}

impl ShipmentGroup {
    pub fn item_count(&self) -> usize {
        self.uccs.len()
    }
}

// ==========================================
// StagedBatch - 暂存批次
// ==========================================
// 一次导入生成一个新批次；替换是整体替换，不做合并
// 仅存于内存，对外输出的是 rows 副本
#[derive(Debug, Clone)]
pub struct StagedBatch {
    pub batch_id: Uuid,
    pub session_id: String,
    pub file_name: String,
    pub imported_at: DateTime<Utc>,
    pub rows: Arc<[ImportRow]>,
}

impl StagedBatch {
    pub fn new(session_id: &str, file_name: &str, rows: Vec<ImportRow>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            file_name: file_name.to_string(),
            imported_at: Utc::now(),
            rows: rows.into(),
        }
    }

    /// 派生一个只保留部分行的批次（沿用原 batch_id 与导入时间）
    pub fn retain_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&ImportRow) -> bool,
    {
        let rows: Vec<ImportRow> = self.rows.iter().filter(|r| keep(r)).cloned().collect();
        Self {
            batch_id: self.batch_id,
            session_id: self.session_id.clone(),
            file_name: self.file_name.clone(),
            imported_at: self.imported_at,
            rows: rows.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
