// ==========================================
// 建筑工作室 S 曲线引擎 - 指标库字段映射器
// ==========================================
// 职责: 源列名 → 标准字段映射 + 类型转换
// 支持中英文列名别名，英文列名不区分大小写
// ==========================================

use crate::domain::catalog::CatalogEntry;
use crate::domain::types::BuildingClass;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use std::collections::HashMap;

// ==========================================
// 标准字段与列名别名
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    BuildingClass,
    Code,
    ParentCode,
    Title,
    RatePerArea,
    SortOrder,
}

impl CatalogField {
    pub fn name(&self) -> &'static str {
        match self {
            CatalogField::BuildingClass => "building_class",
            CatalogField::Code => "code",
            CatalogField::ParentCode => "parent_code",
            CatalogField::Title => "title",
            CatalogField::RatePerArea => "rate_per_area",
            CatalogField::SortOrder => "sort_order",
        }
    }

    /// 可接受的列名（已归一化：去空白、小写）
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            CatalogField::BuildingClass => &["building_class", "buildingclass", "class", "建筑类别", "类别"],
            CatalogField::Code => &["code", "编码", "科目编码", "项目编码"],
            CatalogField::ParentCode => &["parent_code", "parentcode", "parent", "上级编码", "父级编码"],
            CatalogField::Title => &["title", "name", "名称", "科目名称", "项目名称"],
            CatalogField::RatePerArea => &[
                "rate_per_area",
                "rate",
                "单方造价",
                "单方指标",
                "指标(元/㎡)",
                "指标（元/㎡）",
            ],
            CatalogField::SortOrder => &["sort_order", "sortorder", "order", "排序", "序号"],
        }
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

// ==========================================
// CatalogFieldMapper
// ==========================================
pub struct CatalogFieldMapper;

impl CatalogFieldMapper {
    /// 校验表头是否包含必需列（编码、名称；未指定类别时还需建筑类别）
    pub fn check_headers<'a>(
        &self,
        headers: impl IntoIterator<Item = &'a String>,
        building_class_override: Option<BuildingClass>,
    ) -> ImportResult<()> {
        let normalized: Vec<String> = headers.into_iter().map(|h| normalize_header(h)).collect();
        let has = |field: CatalogField| {
            field
                .aliases()
                .iter()
                .any(|alias| normalized.iter().any(|h| h == alias))
        };

        let mut required = vec![CatalogField::Code, CatalogField::Title];
        if building_class_override.is_none() {
            required.push(CatalogField::BuildingClass);
        }

        for field in required {
            if !has(field) {
                return Err(ImportError::MissingColumn(field.name().to_string()));
            }
        }
        Ok(())
    }

    /// 将原始行映射为指标条目
    ///
    /// # 规则
    /// - 单方造价为空时记 0（分组行）
    /// - 排序为空时取行号
    /// - 指定类别时忽略行内类别列
    pub fn map_to_entry(
        &self,
        record: &RawRecord,
        building_class_override: Option<BuildingClass>,
    ) -> ImportResult<CatalogEntry> {
        let row = record.row;
        let fields = &record.fields;

        let code = self
            .get_string(fields, CatalogField::Code)
            .ok_or_else(|| ImportError::FieldMappingError {
                row,
                message: "编码为空".to_string(),
            })?;

        let title = self
            .get_string(fields, CatalogField::Title)
            .ok_or_else(|| ImportError::FieldMappingError {
                row,
                message: format!("编码 {} 的名称为空", code),
            })?;

        let building_class = match building_class_override {
            Some(class) => class,
            None => {
                let raw = self
                    .get_string(fields, CatalogField::BuildingClass)
                    .ok_or_else(|| ImportError::FieldMappingError {
                        row,
                        message: "建筑类别为空".to_string(),
                    })?;
                BuildingClass::from_db_str(&raw).ok_or_else(|| ImportError::TypeConversionError {
                    row,
                    field: CatalogField::BuildingClass.name().to_string(),
                    message: format!("无法识别的建筑类别: {}", raw),
                })?
            }
        };

        let rate_per_area = self
            .parse_f64(fields, CatalogField::RatePerArea, row)?
            .unwrap_or(0.0);

        let sort_order = self
            .parse_i32(fields, CatalogField::SortOrder, row)?
            .unwrap_or(row as i32);

        Ok(CatalogEntry {
            building_class,
            code,
            parent_code: self.get_string(fields, CatalogField::ParentCode),
            title,
            rate_per_area,
            sort_order,
        })
    }

    /// 提取字符串字段（按别名匹配，空值视为缺失）
    fn get_string(&self, fields: &HashMap<String, String>, field: CatalogField) -> Option<String> {
        let aliases = field.aliases();
        fields
            .iter()
            .filter(|(header, _)| aliases.contains(&normalize_header(header).as_str()))
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析浮点数（允许千分位逗号）
    fn parse_f64(
        &self,
        fields: &HashMap<String, String>,
        field: CatalogField,
        row: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(fields, field) {
            None => Ok(None),
            Some(value) => {
                let cleaned = value.replace(',', "");
                match cleaned.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(Some(v)),
                    _ => Err(ImportError::TypeConversionError {
                        row,
                        field: field.name().to_string(),
                        message: format!("无法解析为数值: {}", value),
                    }),
                }
            }
        }
    }

    /// 解析整数（Excel 中的 "3.0" 亦可接受）
    fn parse_i32(
        &self,
        fields: &HashMap<String, String>,
        field: CatalogField,
        row: usize,
    ) -> ImportResult<Option<i32>> {
        match self.get_string(fields, field) {
            None => Ok(None),
            Some(value) => value
                .parse::<i32>()
                .ok()
                .or_else(|| {
                    value
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                        .map(|f| f as i32)
                })
                .map(Some)
                .ok_or_else(|| ImportError::TypeConversionError {
                    row,
                    field: field.name().to_string(),
                    message: format!("无法解析为整数: {}", value),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            row,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_map_chinese_headers() {
        let rec = record(
            2,
            &[
                ("建筑类别", "住宅"),
                ("编码", "01.01"),
                ("上级编码", "01"),
                ("名称", "基础"),
                ("单方造价", "1,200.5"),
                ("排序", "3.0"),
            ],
        );
        let entry = CatalogFieldMapper.map_to_entry(&rec, None).unwrap();

        assert_eq!(entry.building_class, BuildingClass::Residential);
        assert_eq!(entry.parent_code.as_deref(), Some("01"));
        assert_eq!(entry.rate_per_area, 1200.5);
        assert_eq!(entry.sort_order, 3);
    }

    #[test]
    fn test_map_english_headers_with_override_and_defaults() {
        let rec = record(5, &[("Code", "02"), ("Title", "MEP"), ("Parent_Code", "")]);
        let entry = CatalogFieldMapper
            .map_to_entry(&rec, Some(BuildingClass::Office))
            .unwrap();

        assert_eq!(entry.building_class, BuildingClass::Office);
        assert_eq!(entry.parent_code, None);
        assert_eq!(entry.rate_per_area, 0.0);
        assert_eq!(entry.sort_order, 5);
    }

    #[test]
    fn test_map_reports_bad_values() {
        let rec = record(4, &[("code", "03"), ("title", "装饰"), ("class", "船坞")]);
        assert!(matches!(
            CatalogFieldMapper.map_to_entry(&rec, None),
            Err(ImportError::TypeConversionError { row: 4, .. })
        ));

        let rec = record(7, &[("code", ""), ("title", "x"), ("class", "OFFICE")]);
        assert!(matches!(
            CatalogFieldMapper.map_to_entry(&rec, None),
            Err(ImportError::FieldMappingError { row: 7, .. })
        ));

        let rec = record(8, &[("code", "X"), ("title", "x"), ("class", "OFFICE"), ("rate", "abc")]);
        assert!(matches!(
            CatalogFieldMapper.map_to_entry(&rec, None),
            Err(ImportError::TypeConversionError { row: 8, .. })
        ));
    }

    #[test]
    fn test_check_headers() {
        let headers = vec!["编码".to_string(), "名称".to_string()];
        assert!(CatalogFieldMapper.check_headers(&headers, Some(BuildingClass::Residential)).is_ok());
        assert!(matches!(
            CatalogFieldMapper.check_headers(&headers, None),
            Err(ImportError::MissingColumn(col)) if col == "building_class"
        ));
    }
}
