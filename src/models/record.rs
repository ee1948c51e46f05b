//! 记录模型
//!
//! 一条记录对应数据表中的一行，录入时只关心它的“标识值”

/// 标识列的优先级，找不到时退回第一列
pub const VALUE_COLUMNS: [&str; 2] = ["Waybill No", "Motorista ID"];

/// 待录入的一条记录（读取后不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    value: String,
}

impl Record {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// 按列名优先级从一行数据中解析标识值
    ///
    /// 空行返回 `None`
    pub fn from_row(columns: &[String], cells: &[String]) -> Option<Self> {
        for name in VALUE_COLUMNS {
            if let Some(pos) = columns.iter().position(|c| c == name) {
                if let Some(cell) = cells.get(pos) {
                    return Some(Self::new(cell.clone()));
                }
            }
        }
        cells.first().map(|cell| Self::new(cell.clone()))
    }

    /// 要粘贴的值
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// 有序记录集合
///
/// 引擎只通过 [`RecordSource`] 消费它
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RecordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Record::new).collect())
    }
}

/// 数据源适配器
pub trait RecordSource: Send + Sync {
    /// 记录总数
    fn count(&self) -> usize;

    /// 第 `index` 条记录（从 0 开始）
    fn record(&self, index: usize) -> Option<Record>;
}

impl RecordSource for RecordSet {
    fn count(&self) -> usize {
        self.records.len()
    }

    fn record(&self, index: usize) -> Option<Record> {
        self.records.get(index).cloned()
    }
}
