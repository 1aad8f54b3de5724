//! 分卷处理上下文
//!
//! 封装"我正在处理第几个分卷"这一信息

use std::fmt::Display;

use crate::models::WorkItem;

/// 分卷处理上下文
#[derive(Debug, Clone, Copy)]
pub struct ItemCtx<'a> {
    pub item: &'a WorkItem,

    /// 在本次运行中的序号（从 1 开始，仅用于日志显示）
    pub index: usize,

    pub total: usize,
}

impl<'a> ItemCtx<'a> {
    pub fn new(item: &'a WorkItem, index: usize, total: usize) -> Self {
        Self { item, index, total }
    }

    pub fn key(&self) -> &str {
        self.item.key()
    }
}

impl Display for ItemCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[分卷 {}/{} {}]", self.index, self.total, self.item.key())
    }
}
