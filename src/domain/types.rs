// ==========================================
// 待打包订单发运系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 列定位模式 (Column Mode)
// ==========================================
// HEADER: 按表头名称（含别名）定位，缺列即失败
// POSITIONAL: 旧版固定列序 0-15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnMode {
    #[default]
    Header,
    Positional,
}

impl ColumnMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "HEADER" => Some(ColumnMode::Header),
            "POSITIONAL" => Some(ColumnMode::Positional),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMode::Header => write!(f, "HEADER"),
            ColumnMode::Positional => write!(f, "POSITIONAL"),
        }
    }
}

// ==========================================
// 导入字段 (Import Field)
// ==========================================
// 声明顺序即旧版固定列序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    Cantidad,
    Pk,
    Referencia,
    RazonSocial,
    Direccion1,
    Direccion2,
    Colonia,
    Poblacion,
    CodigoPostal,
    Telefono,
    Contacto,
    TipoGuia,
    Vehiculo,
    Currier,
    Tienda,
    Receptor,
}

impl ImportField {
    pub const ALL: [ImportField; 16] = [
        ImportField::Cantidad,
        ImportField::Pk,
        ImportField::Referencia,
        ImportField::RazonSocial,
        ImportField::Direccion1,
        ImportField::Direccion2,
        ImportField::Colonia,
        ImportField::Poblacion,
        ImportField::CodigoPostal,
        ImportField::Telefono,
        ImportField::Contacto,
        ImportField::TipoGuia,
        ImportField::Vehiculo,
        ImportField::Currier,
        ImportField::Tienda,
        ImportField::Receptor,
    ];

    /// 旧版固定列号
    pub fn legacy_index(&self) -> usize {
        *self as usize
    }

    /// 表头别名（已规范化：小写、去重音、去空格与符号）
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ImportField::Cantidad => &["cantidad", "cant", "piezas", "qty", "quantity"],
            ImportField::Pk => &["pk", "ucc", "pallet", "tarima", "etiqueta"],
            ImportField::Referencia => &["referencia", "ref", "reference", "embarque"],
            ImportField::RazonSocial => &["razonsocial", "consignatario", "destinatario"],
            ImportField::Direccion1 => &["direccion1", "direccion", "calle", "domicilio"],
            ImportField::Direccion2 => &["direccion2", "entrecalles", "referenciadomicilio"],
            ImportField::Colonia => &["colonia"],
            ImportField::Poblacion => &["poblacion", "ciudad", "municipio", "localidad"],
            ImportField::CodigoPostal => &["cp", "codigopostal", "codpostal"],
            ImportField::Telefono => &["telefono", "tel", "celular"],
            ImportField::Contacto => &["contacto"],
            ImportField::TipoGuia => &["tipoguia", "tipodeguia", "servicio"],
            ImportField::Vehiculo => &["vehiculo", "unidad"],
            ImportField::Currier => &["currier", "courier", "paqueteria", "transportista"],
            ImportField::Tienda => &["tienda", "store", "sucursal"],
            ImportField::Receptor => &["receptor", "recibe"],
        }
    }

    /// HEADER 模式下是否必须存在
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            ImportField::Direccion2
                | ImportField::Vehiculo
                | ImportField::Currier
                | ImportField::Tienda
                | ImportField::Receptor
        )
    }

    /// 用于错误提示的列名
    pub fn label(&self) -> &'static str {
        self.aliases()[0]
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_index_follows_declaration_order() {
        for (idx, field) in ImportField::ALL.iter().enumerate() {
            assert_eq!(field.legacy_index(), idx);
        }
        assert_eq!(ImportField::Receptor.legacy_index(), 15);
    }

    #[test]
    fn test_column_mode_parse() {
        assert_eq!(ColumnMode::parse(" header "), Some(ColumnMode::Header));
        assert_eq!(ColumnMode::parse("POSITIONAL"), Some(ColumnMode::Positional));
        assert_eq!(ColumnMode::parse("other"), None);
    }
}
