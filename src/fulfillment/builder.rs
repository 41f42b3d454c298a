// ==========================================
// 待打包订单发运系统 - 补货完成报文组装
// ==========================================
// 规则:
// - 每个录入数量按 SKU 匹配补货流程商品行
// - 未匹配的商品全部收集后一次性报错（不部分提交）
// - 数量取录入值；空计量单位写 " "
// ==========================================

use crate::fulfillment::error::{FulfillmentError, FulfillmentResult};
use crate::fulfillment::model::{
    CapturedQuantity, InformacionDetalleOrden, InformacionOrden, InformacionProductoSuministrado,
    InformacionSurtidor, SupplyOrder, SupplyProductLine,
};
use std::collections::HashMap;

/// 组装补货完成请求
///
/// # 参数
/// - order: 订单头
/// - lines: 补货流程商品行
/// - captured: 录入数量（顺序即报文顺序）
///
/// # 返回
/// - Err(MissingProducts): 有录入商品在商品行中找不到
pub fn build_completion(
    order: &SupplyOrder,
    lines: &[SupplyProductLine],
    captured: &[CapturedQuantity],
) -> FulfillmentResult<InformacionOrden> {
    if captured.is_empty() {
        return Err(FulfillmentError::EmptyCapture);
    }

    // 同一 SKU 多行时取第一行
    let mut by_sku: HashMap<i64, &SupplyProductLine> = HashMap::with_capacity(lines.len());
    for line in lines {
        by_sku.entry(line.sku).or_insert(line);
    }

    let mut products = Vec::with_capacity(captured.len());
    let mut missing = Vec::new();
    for item in captured {
        if !item.new_quantity.is_finite() || item.new_quantity < 0.0 {
            return Err(FulfillmentError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.new_quantity,
            });
        }

        match by_sku.get(&item.product_id) {
            Some(line) => products.push(InformacionProductoSuministrado {
                identificador_producto: line.sku.to_string(),
                codigo_barra: line.ean.clone(),
                descripcion_articulo: line.descripcion.clone(),
                cantidad: item.new_quantity,
                precio: line.precio,
                observaciones: line.observaciones.clone(),
                unidad_medida: if line.unidad_medida.is_empty() {
                    " ".to_string()
                } else {
                    line.unidad_medida.clone()
                },
                numero_orden: line.order_no.to_string(),
            }),
            None => missing.push(item.product_id),
        }
    }

    if !missing.is_empty() {
        return Err(FulfillmentError::MissingProducts(missing));
    }

    Ok(InformacionOrden {
        orden: InformacionDetalleOrden {
            numero_orden: order.order_no.to_string(),
            es_picking_manual: false,
            estatus_unidad_ejecucion: "0".to_string(),
            numero_unidad_ejecucion: order.ue_no.clone(),
            numero_tienda: order.store,
        },
        surtidor: InformacionSurtidor {
            surtidor_id: order.picker_id,
            nombre_surtidor: order.picker_name.clone(),
        },
        productos_suministrados: products,
    })
}
