// ==========================================
// 待打包订单发运系统 - 承运商报文组装
// ==========================================
// 输入: ShipmentGroup（首行标量 + 全部 UCC）
// 输出: EmbarqueRequest（字段名与承运商契约一致，camelCase）
// 映射:
// - cantidad       ← 首行 Cantidad
// - direccion      ← Direccion1 [+ ", " + Direccion2]
// - servicio       ← TipoGuia
// - referencia2..6 ← Referencia / Tienda / Receptor / Vehiculo / Currier
// - referencia7    ← 幂等键
// ==========================================

use crate::dispatch::error::PayloadError;
use crate::domain::ShipmentGroup;
use crate::engine::ItemCapacity;
use crate::importer::DataCleaner;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbarqueRequest {
    pub siglas_cliente: String,
    pub embarques: Embarques,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embarques {
    pub embarque: Embarque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embarque {
    pub cantidad: i32,
    pub codigo_postal: i32,
    pub colonia: String,
    pub contacto: String,
    pub direccion: String,
    pub monto_asegurado: i32,
    pub poblacion: String,
    pub razon_social: String,
    pub referencia2: String,
    pub referencia3: String,
    pub referencia4: String,
    pub referencia5: String,
    pub referencia6: String,
    pub referencia7: String,
    pub servicio: String,
    pub telefono: String,
    pub ucc_list: Vec<String>,
}

/// 由发运分组组装承运商请求
///
/// # 参数
/// - group: 发运分组
/// - client_code: 客户简称（siglasCliente）
/// - idempotency_key: 幂等键，写入 referencia7
/// - capacity: 单票 UCC 容量
///
/// # 返回
/// - Err(PayloadError): 邮编/电话非法或 UCC 超量，分组直接拒绝
pub fn build_request(
    group: &ShipmentGroup,
    client_code: &str,
    idempotency_key: &str,
    capacity: ItemCapacity,
) -> Result<EmbarqueRequest, PayloadError> {
    if let ItemCapacity::Max(max) = capacity {
        let items = group.overflow.unwrap_or_else(|| group.item_count());
        if items > max {
            return Err(PayloadError::TooManyItems { items, max });
        }
    }

    let cleaner = DataCleaner;
    let row = &group.first_row;

    let codigo_postal = cleaner.parse_postal_code(&row.codigo_postal)?;
    let telefono = cleaner.normalize_phone(&row.telefono)?;

    Ok(EmbarqueRequest {
        siglas_cliente: client_code.to_string(),
        embarques: Embarques {
            embarque: Embarque {
                cantidad: row.quantity,
                codigo_postal,
                colonia: row.colonia.clone(),
                contacto: row.contacto.clone(),
                direccion: join_address(&row.direccion1, &row.direccion2),
                monto_asegurado: 0,
                poblacion: row.poblacion.clone(),
                razon_social: row.razon_social.clone(),
                referencia2: group.referencia.clone(),
                referencia3: row.tienda.clone(),
                referencia4: row.receptor.clone(),
                referencia5: row.vehiculo.clone(),
                referencia6: row.currier.clone(),
                referencia7: idempotency_key.to_string(),
                servicio: row.tipo_guia.clone(),
                telefono,
                ucc_list: group.uccs.clone(),
            },
        },
    })
}

fn join_address(line1: &str, line2: &str) -> String {
    let line2 = line2.trim();
    if line2.is_empty() || line2 == line1.trim() {
        line1.trim().to_string()
    } else {
        format!("{}, {}", line1.trim(), line2)
    }
}
