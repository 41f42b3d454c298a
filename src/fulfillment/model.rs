// ==========================================
// 待打包订单发运系统 - 补货完成模型
// ==========================================
// 输入: 订单头 + 补货流程商品行 + 操作员录入的实际数量
// 输出: InformacionOrden（字段名与补货完成服务契约一致，PascalCase）
// ==========================================

use serde::{Deserialize, Serialize};

// ===== 输入 =====

/// 待完成的补货订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyOrder {
    pub order_no: i64,
    pub ue_no: String,
    pub store: i32,
    pub picker_id: i64,
    pub picker_name: String,
}

/// 补货流程中的商品行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyProductLine {
    pub order_no: i64,
    pub sku: i64,
    pub ean: String,
    pub descripcion: String,
    pub precio: f64,
    #[serde(default)]
    pub observaciones: String,
    #[serde(default)]
    pub unidad_medida: String,
}

/// 操作员录入的实际数量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapturedQuantity {
    pub product_id: i64,
    pub new_quantity: f64,
}

// ===== 服务报文 =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InformacionOrden {
    pub orden: InformacionDetalleOrden,
    pub surtidor: InformacionSurtidor,
    pub productos_suministrados: Vec<InformacionProductoSuministrado>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InformacionDetalleOrden {
    pub numero_orden: String,
    pub es_picking_manual: bool,
    pub estatus_unidad_ejecucion: String,
    pub numero_unidad_ejecucion: String,
    pub numero_tienda: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformacionSurtidor {
    #[serde(rename = "SurtidorID")]
    pub surtidor_id: i64,
    #[serde(rename = "NombreSurtidor")]
    pub nombre_surtidor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InformacionProductoSuministrado {
    pub identificador_producto: String,
    pub codigo_barra: String,
    pub descripcion_articulo: String,
    pub cantidad: f64,
    pub precio: f64,
    pub observaciones: String,
    pub unidad_medida: String,
    pub numero_orden: String,
}

/// 补货完成服务响应（code = "00" 表示成功）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
