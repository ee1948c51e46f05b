use crate::models::record::{Record, RecordSet};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

const CITY_COLUMNS: [&str; 2] = ["Destination City", "Cidade"];
const BACKLOG_COLUMNS: [&str; 2] = ["Backlog", "Backlog time(Station)"];

/// 单元格：表格导出时数字列可能是整数或浮点
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Text(s) => s,
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// TOML 表格文件
///
/// ```toml
/// columns = ["Waybill No", "Destination City", "Backlog"]
/// rows = [
///     ["BR001", "SAO PAULO", 3],
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut sheet: Sheet = toml::from_str(content)?;
        // 列名两侧常带空格
        for column in sheet.columns.iter_mut() {
            *column = column.trim().to_string();
        }
        Ok(sheet)
    }

    fn column(&self, candidates: &[&str]) -> Option<(usize, String)> {
        candidates.iter().find_map(|name| {
            self.columns
                .iter()
                .position(|c| c == name)
                .map(|pos| (pos, name.to_string()))
        })
    }
}

/// 记录过滤条件（城市 + Backlog）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// 已规范化（去空格、大写）的城市列表
    pub cities: Vec<String>,
    pub backlog: Option<String>,
}

impl RecordFilter {
    pub fn new(city_filter: &str, backlog_filter: &str) -> Self {
        let cities = city_filter
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        let backlog = Some(backlog_filter.trim())
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        Self { cities, backlog }
    }

    /// 对表格应用过滤，返回剩余行（文本形式）
    pub fn apply(&self, sheet: Sheet) -> Vec<Vec<String>> {
        let city_col = if self.cities.is_empty() {
            None
        } else {
            match sheet.column(&CITY_COLUMNS) {
                Some(found) => Some(found),
                None => {
                    warn!("⚠️ 找不到城市列 {:?}，忽略城市过滤", CITY_COLUMNS);
                    None
                }
            }
        };

        let backlog = self.backlog_target(&sheet);

        let rows: Vec<Vec<String>> = sheet
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Cell::into_text).collect::<Vec<_>>())
            .filter(|row| match &city_col {
                Some((pos, _)) => row
                    .get(*pos)
                    .map(|v| self.cities.contains(&v.trim().to_uppercase()))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|row| match &backlog {
                Some((pos, target)) => row
                    .get(*pos)
                    .and_then(|v| parse_number(v))
                    .map(|v| v == *target as f64)
                    .unwrap_or(false),
                None => true,
            })
            .collect();

        if let Some((_, name)) = &city_col {
            info!("ℹ️ 城市过滤已应用 (列 '{}'): 剩余 {} 条", name, rows.len());
        }
        if let Some((_, target)) = &backlog {
            info!("ℹ️ Backlog 过滤 ({}) 已应用: 剩余 {} 条", target, rows.len());
        }

        rows
    }

    /// Backlog 过滤的列位置与目标值；列缺失或值非整数时忽略过滤
    fn backlog_target(&self, sheet: &Sheet) -> Option<(usize, i64)> {
        let raw = self.backlog.as_deref()?;
        let target = match raw.parse::<i64>() {
            Ok(v) => v,
            Err(e) => {
                warn!("❌ Backlog 过滤值 '{}' 无效: {}，忽略过滤", raw, e);
                return None;
            }
        };
        match sheet.column(&BACKLOG_COLUMNS) {
            Some((pos, _)) => Some((pos, target)),
            None => {
                warn!(
                    "⚠️ 找不到 Backlog 列 (查找: {:?})，检测到的列: {}",
                    BACKLOG_COLUMNS,
                    sheet.columns.join(", ")
                );
                None
            }
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// 读取表格文件并按过滤条件生成记录集合
pub async fn load_records(path: &Path, filter: &RecordFilter) -> Result<RecordSet> {
    if !path.exists() {
        anyhow::bail!("文件不存在: {}", path.display());
    }

    info!("正在读取文件 '{}'...", path.display());
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取表格文件: {}", path.display()))?;

    let sheet = Sheet::parse(&content)
        .with_context(|| format!("无法解析表格文件: {}", path.display()))?;

    let columns = sheet.columns.clone();
    let rows = filter.apply(sheet);

    let records: Vec<Record> = rows
        .iter()
        .filter_map(|row| Record::from_row(&columns, row))
        .collect();

    if records.is_empty() {
        warn!("⚠️ 过滤后没有需要处理的记录");
    } else {
        info!("✅ 共 {} 条记录待处理", records.len());
    }

    Ok(RecordSet::new(records))
}
