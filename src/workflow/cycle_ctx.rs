//! 单条记录处理上下文
//!
//! 封装"我正在处理第几条、值是什么"这一信息

use std::fmt::Display;

/// 单条记录处理上下文
#[derive(Debug, Clone)]
pub struct CycleCtx {
    /// 记录索引（从0开始）
    pub index: usize,

    /// 记录总数
    pub total: usize,

    /// 要提交的值
    pub value: String,
}

impl CycleCtx {
    pub fn new(index: usize, total: usize, value: impl Into<String>) -> Self {
        Self {
            index,
            total,
            value: value.into(),
        }
    }

    /// 从1开始的序号（仅用于显示）
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

impl Display for CycleCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} {}]", self.number(), self.total, self.value)
    }
}
