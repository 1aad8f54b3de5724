//! 表单会话 - 业务能力层
//!
//! 封装下载页面上的三级下拉框（地区 / 子地区 / 分卷）与下载按钮。
//! 只负责"读选项、选中选项、点击下载"，不关心进度与决策。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::BrowserError;
use crate::infrastructure::JsExecutor;
use crate::models::ScopeEntry;

/// 一个下拉框及其候选元素 ID
#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub label: &'static str,
    pub ids: &'static [&'static str],
}

pub const REGION_FIELD: FormField = FormField {
    label: "地区",
    ids: &["ddlDistrict", "district"],
};

pub const SUB_REGION_FIELD: FormField = FormField {
    label: "子地区",
    ids: &["ddlAC", "ac"],
};

pub const PART_FIELD: FormField = FormField {
    label: "分卷",
    ids: &["ddlPart", "part", "ddlPartNo"],
};

/// 选中选项的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Changed,
    Unchanged,
    MissingField,
    MissingOption,
}

impl SelectOutcome {
    fn parse(raw: &str) -> Self {
        match raw {
            "changed" => SelectOutcome::Changed,
            "unchanged" => SelectOutcome::Unchanged,
            "missing_option" => SelectOutcome::MissingOption,
            _ => SelectOutcome::MissingField,
        }
    }
}

/// 表单会话
#[derive(Clone)]
pub struct FormSession {
    executor: JsExecutor,
    entry_text: String,
    settle: Duration,
    field_timeout: Duration,
}

impl FormSession {
    pub fn new(executor: JsExecutor, entry_text: impl Into<String>, settle: Duration) -> Self {
        Self {
            executor,
            entry_text: entry_text.into(),
            settle,
            field_timeout: Duration::from_secs(10),
        }
    }

    /// 如果表单尚未显示，点击入口按钮打开表单
    pub async fn open(&self) -> Result<(), BrowserError> {
        let visible: bool = self.executor.eval_as(field_ready_js(&REGION_FIELD)).await?;
        if visible {
            return Ok(());
        }

        let clicked: bool = self.executor.eval_as(open_form_js(&self.entry_text)).await?;
        if clicked {
            debug!("已点击表单入口按钮: {}", self.entry_text);
        } else {
            warn!("⚠️ 未找到表单入口按钮: {}", self.entry_text);
        }

        self.wait_ready(&REGION_FIELD).await?;
        Ok(())
    }

    /// 等待下拉框出现并加载出选项
    pub async fn wait_ready(&self, field: &FormField) -> Result<bool, BrowserError> {
        self.executor
            .wait_until(
                &field_ready_js(field),
                self.field_timeout,
                Duration::from_millis(250),
            )
            .await
    }

    /// 读取下拉框中的有效选项（已去掉"请选择"之类的占位项）
    ///
    /// # 返回
    /// 找不到下拉框时返回 `None`
    pub async fn read_options(
        &self,
        field: &FormField,
    ) -> Result<Option<Vec<ScopeEntry>>, BrowserError> {
        let options: Option<Vec<ScopeEntry>> =
            self.executor.eval_as(read_options_js(field)).await?;
        Ok(options.map(clean_options))
    }

    /// 选中某个选项；值发生变化时等待页面联动刷新
    pub async fn select(
        &self,
        field: &FormField,
        entry: &ScopeEntry,
    ) -> Result<SelectOutcome, BrowserError> {
        let raw: String = self
            .executor
            .eval_as(select_option_js(field, &entry.value))
            .await?;
        let outcome = SelectOutcome::parse(&raw);

        if outcome == SelectOutcome::Changed {
            debug!("已选择{}: {}", field.label, entry.name);
            sleep(self.settle).await;
        }
        Ok(outcome)
    }

    /// 点击下载控件
    ///
    /// # 返回
    /// 命中的查找方式；找不到任何下载控件时返回 `None`
    pub async fn click_download(&self) -> Result<Option<String>, BrowserError> {
        self.executor.eval_as(click_download_js()).await
    }
}

/// 占位选项：空值或 "0"，或形如 "Select" / "Select ..." / "-- Select District --" 的提示文字
///
/// 以 "Select" 开头的真实名称（如 "Selectpur"）不算占位。
pub fn is_placeholder(entry: &ScopeEntry) -> bool {
    let value = entry.value.trim();
    if value.is_empty() || value == "0" {
        return true;
    }

    let name = entry.name.trim().to_lowercase();
    let core = name.trim_matches(|c: char| c == '-' || c == '.' || c == ':' || c.is_whitespace());
    core == "select"
        || (name.starts_with("--") && core.starts_with("select "))
        || (core.starts_with("select ") && (name.ends_with("--") || name.ends_with("...")))
}

pub fn clean_options(options: Vec<ScopeEntry>) -> Vec<ScopeEntry> {
    options
        .into_iter()
        .map(|o| ScopeEntry::new(o.value.trim(), o.name.trim()))
        .filter(|o| !is_placeholder(o))
        .collect()
}

// ========== JS 片段 ==========

fn find_select_js(field: &FormField) -> String {
    let ids = serde_json::to_string(field.ids).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{ids}.map(id => document.getElementById(id)).find(el => el && el.tagName === 'SELECT')"
    )
}

fn field_ready_js(field: &FormField) -> String {
    format!(
        r#"(() => {{
            const el = {find};
            return !!el && Array.from(el.options).some(o => o.value.trim() !== '' && o.value.trim() !== '0');
        }})()"#,
        find = find_select_js(field)
    )
}

fn read_options_js(field: &FormField) -> String {
    format!(
        r#"(() => {{
            const el = {find};
            if (!el) return null;
            return Array.from(el.options).map(o => ({{ value: o.value, name: o.text }}));
        }})()"#,
        find = find_select_js(field)
    )
}

fn select_option_js(field: &FormField, value: &str) -> String {
    let value = serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
            const el = {find};
            if (!el) return 'missing_field';
            const value = {value};
            if (!Array.from(el.options).some(o => o.value === value)) return 'missing_option';
            if (el.value === value) return 'unchanged';
            el.value = value;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'changed';
        }})()"#,
        find = find_select_js(field),
    )
}

fn open_form_js(entry_text: &str) -> String {
    let text = serde_json::to_string(entry_text).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
            const text = {text};
            const button = Array.from(document.querySelectorAll('button, a'))
                .find(el => el.textContent && el.textContent.includes(text));
            if (!button) return false;
            button.click();
            return true;
        }})()"#
    )
}

fn click_download_js() -> &'static str {
    r#"(() => {
        const byId = document.getElementById('btnDownload');
        if (byId) { byId.click(); return 'id'; }
        const byText = Array.from(document.querySelectorAll('button'))
            .find(el => /download/i.test(el.textContent || ''));
        if (byText) { byText.click(); return 'text'; }
        const byLink = Array.from(document.querySelectorAll('a'))
            .find(el => (el.getAttribute('href') || '').toLowerCase().includes('.pdf')
                || /download/i.test(el.textContent || ''));
        if (byLink) { byLink.click(); return 'link'; }
        return null;
    })()"#
}
