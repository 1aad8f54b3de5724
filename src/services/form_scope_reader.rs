//! 浏览器范围读取 - 业务能力层
//!
//! 通过页面上的三级下拉框实现 [`ScopeProvider`]

use async_trait::async_trait;

use crate::error::{BrowserError, ScopeError};
use crate::models::ScopeEntry;
use crate::services::form_session::{
    FormField, FormSession, SelectOutcome, PART_FIELD, REGION_FIELD, SUB_REGION_FIELD,
};
use crate::services::scope_provider::ScopeProvider;

/// 从下载页面的下拉框读取范围
pub struct FormScopeReader {
    form: FormSession,
}

impl FormScopeReader {
    pub fn new(form: FormSession) -> Self {
        Self { form }
    }

    async fn read(&self, parent: &str, field: &FormField) -> Result<Vec<ScopeEntry>, ScopeError> {
        if !self.form.wait_ready(field).await.map_err(unavailable(parent))? {
            return Err(ScopeError::enumeration_unavailable(
                parent,
                format!("{}下拉框未加载出选项", field.label),
            ));
        }

        self.form
            .read_options(field)
            .await
            .map_err(unavailable(parent))?
            .ok_or_else(|| {
                ScopeError::enumeration_unavailable(parent, format!("未找到{}下拉框", field.label))
            })
    }

    async fn choose(
        &self,
        parent: &str,
        field: &FormField,
        entry: &ScopeEntry,
    ) -> Result<(), ScopeError> {
        match self.form.select(field, entry).await.map_err(unavailable(parent))? {
            SelectOutcome::Changed | SelectOutcome::Unchanged => Ok(()),
            SelectOutcome::MissingField => Err(ScopeError::enumeration_unavailable(
                parent,
                format!("未找到{}下拉框", field.label),
            )),
            SelectOutcome::MissingOption => Err(ScopeError::enumeration_unavailable(
                parent,
                format!("{}下拉框中没有选项 {}", field.label, entry.name),
            )),
        }
    }
}

fn unavailable(parent: &str) -> impl Fn(BrowserError) -> ScopeError + '_ {
    move |e| ScopeError::enumeration_unavailable(parent, e)
}

#[async_trait]
impl ScopeProvider for FormScopeReader {
    async fn regions(&mut self) -> Result<Vec<ScopeEntry>, ScopeError> {
        self.form.open().await.map_err(unavailable("<根>"))?;
        self.read("<根>", &REGION_FIELD).await
    }

    async fn sub_regions(&mut self, region: &ScopeEntry) -> Result<Vec<ScopeEntry>, ScopeError> {
        let parent = region.name.as_str();
        self.choose(parent, &REGION_FIELD, region).await?;
        self.read(parent, &SUB_REGION_FIELD).await
    }

    async fn parts(
        &mut self,
        region: &ScopeEntry,
        sub_region: &ScopeEntry,
    ) -> Result<Vec<ScopeEntry>, ScopeError> {
        let parent = format!("{}/{}", region.name, sub_region.name);
        self.choose(&parent, &REGION_FIELD, region).await?;
        self.choose(&parent, &SUB_REGION_FIELD, sub_region).await?;
        self.read(&parent, &PART_FIELD).await
    }
}
