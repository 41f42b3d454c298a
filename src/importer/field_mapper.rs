// ==========================================
// 待打包订单发运系统 - 字段映射器实现
// ==========================================
// 职责: 列定位（表头别名 / 旧版固定列序）+ 类型转换
// ==========================================

use crate::domain::{ColumnMode, ImportField, ImportRow};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FieldMapper as FieldMapperTrait, RawRow};
use std::collections::HashMap;

// ==========================================
// ColumnLayout - 字段 → 列号
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    mode: ColumnMode,
    columns: HashMap<ImportField, usize>,
}

impl ColumnLayout {
    /// 旧版固定列序 0-15
    pub fn positional() -> Self {
        let columns = ImportField::ALL
            .iter()
            .map(|f| (*f, f.legacy_index()))
            .collect();
        Self {
            mode: ColumnMode::Positional,
            columns,
        }
    }

    /// 按表头别名定位；必需列缺失时一次性列出全部缺失项
    pub fn from_headers(headers: &[String]) -> ImportResult<Self> {
        let cleaner = DataCleaner;
        let normalized: Vec<String> = headers.iter().map(|h| cleaner.normalize_header(h)).collect();

        let mut columns = HashMap::new();
        let mut missing = Vec::new();

        for field in ImportField::ALL {
            // 同名列取第一个出现的
            let found = field
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));

            match found {
                Some(idx) => {
                    columns.insert(field, idx);
                }
                None if field.is_required() => missing.push(field.label().to_string()),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        Ok(Self {
            mode: ColumnMode::Header,
            columns,
        })
    }

    pub fn mode(&self) -> ColumnMode {
        self.mode
    }

    pub fn column_of(&self, field: ImportField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// 取单元格文本；列不存在或越界时为空串
    fn cell<'a>(&self, row: &'a RawRow, field: ImportField) -> &'a str {
        self.column_of(field)
            .and_then(|idx| row.cells.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn resolve_layout(&self, headers: &[String], mode: ColumnMode) -> ImportResult<ColumnLayout> {
        match mode {
            ColumnMode::Header => ColumnLayout::from_headers(headers),
            ColumnMode::Positional => Ok(ColumnLayout::positional()),
        }
    }

    fn map_row(&self, layout: &ColumnLayout, row: &RawRow) -> ImportResult<ImportRow> {
        let cleaner = DataCleaner;
        let text = |field: ImportField| cleaner.clean_text(layout.cell(row, field));

        let quantity = cleaner.parse_quantity(
            layout.cell(row, ImportField::Cantidad),
            row.row_number,
            ImportField::Cantidad.label(),
        )?;

        let pk = self.required(text(ImportField::Pk), row.row_number, ImportField::Pk)?;
        let referencia = self.required(
            text(ImportField::Referencia),
            row.row_number,
            ImportField::Referencia,
        )?;

        Ok(ImportRow {
            row_number: row.row_number,
            quantity,
            pk,
            referencia,
            razon_social: text(ImportField::RazonSocial),
            direccion1: text(ImportField::Direccion1),
            direccion2: text(ImportField::Direccion2),
            colonia: text(ImportField::Colonia),
            poblacion: text(ImportField::Poblacion),
            codigo_postal: text(ImportField::CodigoPostal),
            telefono: text(ImportField::Telefono),
            contacto: text(ImportField::Contacto),
            tipo_guia: text(ImportField::TipoGuia),
            vehiculo: text(ImportField::Vehiculo),
            currier: text(ImportField::Currier),
            tienda: text(ImportField::Tienda),
            receptor: text(ImportField::Receptor),
        })
    }
}

impl FieldMapper {
    fn required(&self, value: String, row: usize, field: ImportField) -> ImportResult<String> {
        if value.is_empty() {
            return Err(ImportError::RequiredFieldMissing {
                row,
                field: field.label().to_string(),
            });
        }
        Ok(value)
    }
}
